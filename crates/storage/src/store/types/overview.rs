#![forbid(unsafe_code)]

use gm_core::model::ComponentKind;

/// One row of the codebase overview: how many components of a kind exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindCount {
    pub kind: ComponentKind,
    pub count: i64,
}
