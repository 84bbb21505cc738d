//! Tests for SnapshotService and session save / load

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use treefs::application::services::{ShellService, SnapshotService};
use treefs::application::ApplicationError;
use treefs::cli::CliError;
use treefs::config::Settings;
use treefs::domain::{DomainError, ManualClock, NamespaceTree};
use treefs::infrastructure::traits::RealFileSystem;
use treefs::infrastructure::ServiceContainer;
use treefs::util::testing::{self, ScriptedPrompter};

fn shell_with(settings: Settings) -> ShellService {
    testing::init_test_setup();
    ServiceContainer::with_deps(
        settings,
        Arc::new(RealFileSystem),
        Arc::new(ScriptedPrompter::new()),
        Arc::new(ManualClock::new(1_000)),
    )
    .shell_service()
}

fn populated_shell() -> ShellService {
    let mut shell = shell_with(Settings::default());
    shell.mkdir("docs").unwrap();
    shell.cd("docs").unwrap();
    shell.touch("a.txt").unwrap();
    shell.edit("a.txt", Some("hello")).unwrap();
    shell.symlink("a.txt", "latest").unwrap();
    shell.cd_up();
    shell.mkdir("empty").unwrap();
    shell
}

#[test]
fn given_saved_session_when_loaded_into_new_session_then_tree_is_restored() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("snap.txt");
    let original = populated_shell();

    original.save(&path).unwrap();
    let mut restored = shell_with(Settings::default());
    restored.load(&path).unwrap();

    assert_eq!(restored.tree().len(), original.tree().len());
    assert_eq!(restored.count_files(), 1);
    restored.cd("docs").unwrap();
    assert_eq!(restored.cat("latest").unwrap(), "hello");
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "1 docs 0 1000\n0 a.txt 5 1000\nCONTENT:hello\nEND\n2 latest 0 1000\nTARGET:a.txt\nEND\nEND\n1 empty 0 1000\nEND\nEND\n"
    );
}

#[test]
fn given_session_inside_directory_when_loading_then_cwd_resets_to_root() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("snap.txt");
    let mut shell = populated_shell();
    shell.save(&path).unwrap();
    shell.cd("docs").unwrap();

    shell.load(&path).unwrap();

    assert_eq!(shell.pwd().unwrap(), "/");
}

#[test]
fn given_corrupt_snapshot_when_loading_then_session_tree_is_untouched() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.txt");
    fs::write(&path, "1 docs 0 1\n0 a.txt 9 1\nCONTENT:short\nEND\nEND\nEND\n").unwrap();
    let mut shell = populated_shell();
    shell.cd("docs").unwrap();
    let len_before = shell.tree().len();

    let err = shell.load(&path).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CorruptData { line: 2, .. })
    ));
    assert_eq!(shell.tree().len(), len_before);
    assert_eq!(shell.pwd().unwrap(), "/docs");
}

#[test]
fn given_snapshot_with_invalid_utf8_when_loading_then_corrupt_data_with_dataerr_exit() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("binary.txt");
    fs::write(&path, b"1 docs 0 1\n0 a 1 0\nCONTENT:\xff\nEND\nEND\nEND\n").unwrap();
    let service = SnapshotService::new(Arc::new(RealFileSystem));

    let err = service.load(&NamespaceTree::new(), &path).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CorruptData { line: 3, .. })
    ));
    assert_eq!(CliError::from(err).exit_code(), treefs::exitcode::DATAERR);
}

#[test]
fn given_missing_file_when_loading_then_operation_failed_names_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nope.txt");
    let service = SnapshotService::new(Arc::new(RealFileSystem));

    let err = service.load(&NamespaceTree::new(), &path).unwrap_err();

    match err {
        ApplicationError::OperationFailed { context, .. } => {
            assert!(context.contains("nope.txt"), "{context}");
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[test]
fn given_nested_target_path_when_saving_then_parent_directories_are_created() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("deep").join("er").join("snap.txt");
    let service = SnapshotService::new(Arc::new(RealFileSystem));

    service.save(&NamespaceTree::new(), &path).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "END\n");
}

#[test]
fn given_autosave_configured_when_session_ends_then_snapshot_is_written() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("auto.txt");
    let mut shell = shell_with(Settings {
        autosave: Some(path.clone()),
        ..Settings::default()
    });
    shell.touch("kept.txt").unwrap();

    let written = shell.autosave().unwrap();

    assert_eq!(written, Some(path.as_path()));
    assert_eq!(fs::read_to_string(&path).unwrap(), "0 kept.txt 0 1000\nEND\nEND\n");
}

#[test]
fn given_no_autosave_when_session_ends_then_nothing_is_written() {
    let shell = shell_with(Settings::default());

    assert_eq!(shell.autosave().unwrap(), None);
}
