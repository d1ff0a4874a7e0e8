#![forbid(unsafe_code)]

use super::*;
use gm_core::model::ComponentKind;

impl GraphStore {
    /// Component counts per kind within one codebase, highest count first.
    pub fn get_codebase_overview(&mut self, codebase: &str) -> Result<Vec<KindCount>, StoreError> {
        if codebase.trim().is_empty() {
            return Err(StoreError::InvalidInput("codebase must not be empty"));
        }
        let tx = self.conn.transaction()?;
        let rows = count_component_kinds_tx(&tx, codebase)?;
        tx.commit()?;
        let mut out = Vec::with_capacity(rows.len());
        for (kind, count) in rows {
            out.push(KindCount {
                kind: ComponentKind::parse(&kind)?,
                count,
            });
        }
        Ok(out)
    }
}
