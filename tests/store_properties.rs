// tests/store_properties.rs

use std::path::PathBuf;

use proptest::prelude::*;

use adwatch::fs::mock::MockFileSystem;
use adwatch::store::{SetKind, SetPaths, SetStore};

fn paths() -> SetPaths {
    SetPaths {
        ignored: PathBuf::from("/state/ignore_list.txt"),
        in_flight: PathBuf::from("/state/processing.txt"),
        done: PathBuf::from("/state/processed.txt"),
    }
}

// Identities look like recording paths or bare names, possibly with
// leading or trailing blanks; never newlines.
fn identity_strategy() -> impl Strategy<Value = String> {
    "[ ]{0,2}(/rec/)?[a-z]{1,6}( [a-z]{1,4})?\\.ts[ ]{0,2}"
}

proptest! {
    #[test]
    fn remove_drops_exactly_the_target_and_keeps_order(
        ids in proptest::collection::vec(identity_strategy(), 0..12),
        target_idx in any::<prop::sample::Index>(),
    ) {
        let fs = MockFileSystem::new();
        let store = SetStore::new(&fs, paths());
        for id in &ids {
            store.add(SetKind::Done, id).unwrap();
        }

        let target = if ids.is_empty() {
            "/rec/absent.ts".to_string()
        } else {
            ids[target_idx.index(ids.len())].clone()
        };

        let removed = store.remove(SetKind::Done, &target).unwrap();
        let expected: Vec<String> = ids.iter().filter(|id| **id != target).cloned().collect();

        prop_assert_eq!(removed, ids.len() - expected.len());
        prop_assert_eq!(store.load(SetKind::Done).unwrap(), expected.clone());

        // Removing again changes nothing.
        prop_assert_eq!(store.remove(SetKind::Done, &target).unwrap(), 0);
        prop_assert_eq!(store.load(SetKind::Done).unwrap(), expected);
    }

    #[test]
    fn add_then_load_preserves_every_entry(
        ids in proptest::collection::vec(identity_strategy(), 0..12),
    ) {
        let fs = MockFileSystem::new();
        let store = SetStore::new(&fs, paths());
        for id in &ids {
            store.add(SetKind::InFlight, id).unwrap();
        }

        prop_assert_eq!(store.load(SetKind::InFlight).unwrap(), ids);
        prop_assert!(store.load(SetKind::Done).unwrap().is_empty());
    }

    #[test]
    fn reconcile_keeps_only_recordings_still_on_disk(
        present in proptest::collection::btree_set("[a-z]{1,6}", 0..6),
        gone in proptest::collection::btree_set("[A-Z]{1,6}", 0..6),
    ) {
        let fs = MockFileSystem::new();
        let store = SetStore::new(&fs, paths());

        for name in &present {
            let path = format!("/rec/{name}.ts");
            fs.add_sized_file(&path, 1);
            store.add(SetKind::Done, &path).unwrap();
        }
        for name in &gone {
            store.add(SetKind::Done, &format!("/rec/{name}.ts")).unwrap();
        }

        let dropped = store
            .reconcile_done(&[PathBuf::from("/rec")], adwatch::types::IdentityMode::Path)
            .unwrap();

        prop_assert_eq!(dropped.len(), gone.len());
        let kept: Vec<String> = present.iter().map(|n| format!("/rec/{n}.ts")).collect();
        prop_assert_eq!(store.load(SetKind::Done).unwrap(), kept);
    }
}
