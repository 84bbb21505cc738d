//! Tests for merging directories and the conflict protocol

use std::sync::Arc;

use treefs::domain::{
    ConflictResolution, DomainError, ManualClock, MergeReport, NamespaceTree, NodeId,
};
use treefs::util::testing;

fn tree() -> NamespaceTree {
    testing::init_test_setup();
    NamespaceTree::with_clock(Arc::new(ManualClock::new(1_000)))
}

fn names(tree: &NamespaceTree, dir: NodeId) -> Vec<String> {
    tree.children(dir)
        .map(|id| tree.node(id).unwrap().name().to_string())
        .collect()
}

fn content(tree: &NamespaceTree, dir: NodeId, name: &str) -> Option<String> {
    let id = tree.find(dir, name, None)?;
    tree.node(id).unwrap().content().map(str::to_string)
}

/// `dest` and `src` under the root, each with a `note.txt` of its own.
fn two_notes() -> (NamespaceTree, NodeId, NodeId) {
    let mut tree = tree();
    let root = tree.root();
    let dest = tree.make_directory(root, "dest").unwrap();
    let src = tree.make_directory(root, "src").unwrap();
    let old = tree.make_file(dest, "note.txt").unwrap();
    tree.edit_content(old, "dest version").unwrap();
    let new = tree.make_file(src, "note.txt").unwrap();
    tree.edit_content(new, "src version").unwrap();
    (tree, dest, src)
}

#[test]
fn given_conflicting_note_when_merged_with_overwrite_then_src_version_wins() {
    let (mut tree, dest, src) = two_notes();

    let report = tree
        .merge(dest, src, |_| Some(ConflictResolution::Overwrite))
        .unwrap();

    assert_eq!(content(&tree, dest, "note.txt").as_deref(), Some("src version"));
    assert!(tree.find(src, "note.txt", None).is_none());
    assert_eq!(report.overwritten, vec!["note.txt"]);
    assert_eq!(tree.node(dest).unwrap().item_count(), 1);
    assert_eq!(tree.node(src).unwrap().item_count(), 0);
    tree.verify().unwrap();
}

#[test]
fn given_conflict_when_merged_with_skip_then_child_stays_in_src() {
    let (mut tree, dest, src) = two_notes();
    let root = tree.root();
    tree.make_file(src, "fresh.txt").unwrap();

    let report = tree
        .merge(dest, src, |_| Some(ConflictResolution::Skip))
        .unwrap();

    assert_eq!(
        report,
        MergeReport {
            moved: vec!["fresh.txt".to_string()],
            skipped: vec!["note.txt".to_string()],
            ..MergeReport::default()
        }
    );
    assert_eq!(content(&tree, dest, "note.txt").as_deref(), Some("dest version"));
    assert_eq!(content(&tree, src, "note.txt").as_deref(), Some("src version"));
    assert_eq!(names(&tree, dest), vec!["note.txt", "fresh.txt"]);
    assert_eq!(tree.count_files(root), 3);
    tree.verify().unwrap();
}

#[test]
fn given_conflict_when_merged_with_rename_then_moved_under_new_name() {
    let (mut tree, dest, src) = two_notes();

    let report = tree
        .merge(dest, src, |_| {
            Some(ConflictResolution::Rename("note-2.txt".to_string()))
        })
        .unwrap();

    assert_eq!(
        report.renamed,
        vec![("note.txt".to_string(), "note-2.txt".to_string())]
    );
    assert_eq!(names(&tree, dest), vec!["note.txt", "note-2.txt"]);
    assert_eq!(content(&tree, dest, "note-2.txt").as_deref(), Some("src version"));
    assert_eq!(tree.node(src).unwrap().item_count(), 0);
    tree.verify().unwrap();
}

#[test]
fn given_rename_that_collides_again_when_merging_then_already_exists_and_child_stays() {
    let (mut tree, dest, src) = two_notes();
    tree.make_file(dest, "taken.txt").unwrap();

    let err = tree
        .merge(dest, src, |_| {
            Some(ConflictResolution::Rename("taken.txt".to_string()))
        })
        .unwrap_err();

    assert_eq!(err, DomainError::AlreadyExists("taken.txt".to_string()));
    assert_eq!(content(&tree, src, "note.txt").as_deref(), Some("src version"));
    tree.verify().unwrap();
}

#[test]
fn given_unrecognized_answer_when_merging_then_stops_and_keeps_earlier_moves() {
    let mut tree = tree();
    let root = tree.root();
    let dest = tree.make_directory(root, "dest").unwrap();
    let src = tree.make_directory(root, "src").unwrap();
    tree.make_file(dest, "b").unwrap();
    for name in ["a", "b", "c"] {
        tree.make_file(src, name).unwrap();
    }
    let mut asked = Vec::new();

    let report = tree
        .merge(dest, src, |name| {
            asked.push(name.to_string());
            None
        })
        .unwrap();

    assert_eq!(asked, vec!["b"]);
    assert_eq!(report.moved, vec!["a"]);
    assert_eq!(report.aborted_at.as_deref(), Some("b"));
    assert!(!report.is_complete());
    assert_eq!(names(&tree, dest), vec!["b", "a"]);
    assert_eq!(names(&tree, src), vec!["b", "c"]);
    tree.verify().unwrap();
}

#[test]
fn given_directory_overwritten_when_merging_then_whole_subtree_is_freed() {
    let mut tree = tree();
    let root = tree.root();
    let dest = tree.make_directory(root, "dest").unwrap();
    let src = tree.make_directory(root, "src").unwrap();
    let old = tree.make_directory(dest, "data").unwrap();
    let nested = tree.make_directory(old, "nested").unwrap();
    tree.make_file(nested, "deep.txt").unwrap();
    tree.make_file(old, "top.txt").unwrap();
    tree.make_file(src, "data").unwrap();
    let len_before = tree.len();

    tree.merge(dest, src, |_| Some(ConflictResolution::Overwrite))
        .unwrap();

    // data/, nested/, deep.txt and top.txt are gone
    assert_eq!(tree.len(), len_before - 4);
    assert!(tree.get_node(old).is_none());
    assert!(tree.get_node(nested).is_none());
    let data = tree.lookup(dest, "data").unwrap();
    assert!(tree.node(data).unwrap().is_file());
    tree.verify().unwrap();
}

#[test]
fn given_empty_src_when_merging_then_nothing_happens() {
    let mut tree = tree();
    let root = tree.root();
    let dest = tree.make_directory(root, "dest").unwrap();
    let src = tree.make_directory(root, "src").unwrap();

    let report = tree.merge(dest, src, |_| None).unwrap();

    assert_eq!(report, MergeReport::default());
    assert!(report.is_complete());
}

#[test]
fn given_same_or_nested_directories_when_merging_then_invalid_target() {
    let mut tree = tree();
    let root = tree.root();
    let outer = tree.make_directory(root, "outer").unwrap();
    let inner = tree.make_directory(outer, "inner").unwrap();

    assert!(matches!(
        tree.merge(outer, outer, |_| None),
        Err(DomainError::InvalidTarget(_))
    ));
    assert!(matches!(
        tree.merge(inner, outer, |_| None),
        Err(DomainError::InvalidTarget(_))
    ));
    assert_eq!(names(&tree, outer), vec!["inner"]);
}

#[test]
fn given_file_operand_when_merging_then_wrong_kind() {
    let mut tree = tree();
    let root = tree.root();
    let dir = tree.make_directory(root, "dir").unwrap();
    let file = tree.make_file(root, "file").unwrap();

    assert!(matches!(
        tree.merge(dir, file, |_| None),
        Err(DomainError::WrongKind { .. })
    ));
    assert!(matches!(
        tree.merge(file, dir, |_| None),
        Err(DomainError::WrongKind { .. })
    ));
}
