#![forbid(unsafe_code)]

use gm_core::model::ComponentKind;
use gm_storage::{ComponentInput, GraphStore};
use std::path::PathBuf;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("gm_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn seed(store: &mut GraphStore, kind: ComponentKind, name: &str, codebase: &str) {
    store
        .create_component(ComponentInput {
            kind: Some(kind),
            name: name.to_string(),
            codebase: Some(codebase.to_string()),
            ..Default::default()
        })
        .expect("seed component");
}

#[test]
fn overview_counts_kinds_within_one_codebase_descending() {
    let mut store = GraphStore::open(temp_dir("overview")).expect("open store");

    for index in 0..3 {
        seed(&mut store, ComponentKind::File, &format!("f{index}"), "alpha");
    }
    seed(&mut store, ComponentKind::Class, "K", "alpha");
    seed(&mut store, ComponentKind::Class, "L", "alpha");
    seed(&mut store, ComponentKind::Function, "g", "alpha");
    // Another codebase must not leak in.
    seed(&mut store, ComponentKind::System, "other", "beta");

    let overview = store.get_codebase_overview("alpha").expect("overview");
    assert_eq!(overview.len(), 3);
    assert_eq!(overview[0].kind, ComponentKind::File);
    assert_eq!(overview[0].count, 3);
    assert_eq!(overview[1].kind, ComponentKind::Class);
    assert_eq!(overview[1].count, 2);
    assert_eq!(overview[2].kind, ComponentKind::Function);
    assert_eq!(overview[2].count, 1);

    assert!(store.get_codebase_overview("empty").expect("empty").is_empty());
    assert_eq!(
        store.get_codebase_overview("  ").expect_err("blank").kind(),
        "VALIDATION"
    );
}
