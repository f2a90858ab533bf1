use super::*;
use crate::url_model::{GroupId, RemotePath};
use std::fs;

fn task(path: &str) -> DownloadTask {
    DownloadTask::new(RemotePath::parse(path).unwrap(), GroupId::parse("org.foo").unwrap())
}

fn entry(group: &str, depth: u32) -> GroupEntry {
    GroupEntry {
        group: GroupId::parse(group).unwrap(),
        depth,
    }
}

#[test]
fn fresh_root_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let loaded = store.load(true).unwrap();
    assert_eq!(loaded.state.completed_len(), 0);
    assert!(loaded.resumed_tasks.is_empty());
    assert!(!loaded.resumed);
    assert!(!store.dir().exists(), "new/load must not create the state dir");
}

#[test]
fn completions_survive_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store.record_completion("org/foo/a/1.0/a-1.0.jar").unwrap();
    store.record_completion("org/foo/a/1.0/a-1.0.pom").unwrap();
    drop(store);

    let loaded = StateStore::new(dir.path()).load(true).unwrap();
    assert!(loaded.state.is_completed("org/foo/a/1.0/a-1.0.jar"));
    assert!(loaded.state.is_completed("org/foo/a/1.0/a-1.0.pom"));
    assert_eq!(loaded.state.completed_len(), 2);
}

#[test]
fn snapshot_round_trip_drops_completed_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let seed = GroupId::parse("org.foo").unwrap();
    let tasks = vec![task("org/foo/a/1.0/a.jar"), task("org/foo/a/1.0/a.pom")];
    let snap = PendingSnapshot::new(Some(&seed), &tasks, &[entry("com.bar", 1)]);
    assert!(store.flush_pending(&snap).unwrap());
    store.record_completion("org/foo/a/1.0/a.pom").unwrap();

    let loaded = StateStore::new(dir.path()).load(true).unwrap();
    assert!(loaded.resumed);
    assert_eq!(loaded.resumed_tasks, vec![task("org/foo/a/1.0/a.jar")]);
    assert_eq!(loaded.frontier, vec![entry("com.bar", 1)]);
}

#[test]
fn flush_pending_writes_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let first = PendingSnapshot::new(None, &[task("org/foo/a.jar")], &[]);
    let second = PendingSnapshot::new(None, &[task("org/foo/b.jar")], &[]);
    assert!(store.flush_pending(&first).unwrap());
    assert!(!store.flush_pending(&second).unwrap());

    let text = fs::read_to_string(store.pending_path()).unwrap();
    let on_disk: PendingSnapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(on_disk, first);
}

#[test]
fn declined_resume_ignores_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store
        .flush_pending(&PendingSnapshot::new(None, &[task("org/foo/a.jar")], &[]))
        .unwrap();
    let loaded = StateStore::new(dir.path()).load(false).unwrap();
    assert!(!loaded.resumed);
    assert!(loaded.snapshot_ignored);
    assert!(loaded.resumed_tasks.is_empty());
}

#[test]
fn clear_removes_snapshot_and_tolerates_absence() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store.clear().unwrap();
    store
        .flush_pending(&PendingSnapshot::new(None, &[task("org/foo/a.jar")], &[]))
        .unwrap();
    assert!(store.has_snapshot());
    store.clear().unwrap();
    assert!(!store.has_snapshot());
}

#[test]
fn corrupt_snapshot_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.pending_path(), b"{ not json").unwrap();
    let err = store.load(true).unwrap_err();
    assert!(matches!(err, StateError::CorruptSnapshot { .. }));
    assert!(err.to_string().contains("--fresh"));
}

#[test]
fn snapshot_with_traversal_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    fs::create_dir_all(store.dir()).unwrap();
    let json = r#"{"version":2,"tasks":[{"remote":"org/../../etc/passwd","destination":"org/../../etc/passwd","group":"org"}]}"#;
    fs::write(store.pending_path(), json).unwrap();
    assert!(matches!(
        store.load(true).unwrap_err(),
        StateError::CorruptSnapshot { .. }
    ));
}

#[test]
fn unknown_snapshot_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.pending_path(), r#"{"version":99,"tasks":[]}"#).unwrap();
    assert!(matches!(
        store.load(true).unwrap_err(),
        StateError::CorruptSnapshot { .. }
    ));
}

#[test]
fn corrupt_completed_record_names_line() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.completed_path(), "org/foo/a.jar\norg/../x\n").unwrap();
    match store.load(true).unwrap_err() {
        StateError::CorruptRecord { line, .. } => assert_eq!(line, 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn summary_counts_without_loading_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    store.record_completion("org/foo/a.jar").unwrap();
    let s = store.summary().unwrap();
    assert_eq!(s.completed, 1);
    assert!(!s.has_snapshot);

    let seed = GroupId::parse("org.foo").unwrap();
    store
        .flush_pending(&PendingSnapshot::new(
            Some(&seed),
            &[task("org/foo/a.jar"), task("org/foo/b.jar")],
            &[entry("com.bar", 2)],
        ))
        .unwrap();
    let s = store.summary().unwrap();
    assert!(s.has_snapshot);
    assert_eq!(s.pending_tasks, 1);
    assert_eq!(s.seed.as_deref(), Some("org.foo"));
    assert_eq!(s.frontier, vec![entry("com.bar", 2)]);
}

#[test]
fn dotted_segments_survive_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    let group = GroupId::parse("org/foo.bar/").unwrap();
    let task = DownloadTask::new(RemotePath::parse("org/foo.bar/a/1.0/a-1.0.jar").unwrap(), group.clone());
    let frontier = [GroupEntry {
        group: group.clone(),
        depth: 1,
    }];
    store
        .flush_pending(&PendingSnapshot::new(Some(&group), &[task.clone()], &frontier))
        .unwrap();

    let loaded = StateStore::new(dir.path()).load(true).unwrap();
    assert_eq!(loaded.resumed_tasks, vec![task]);
    assert_eq!(loaded.frontier, frontier);
    assert_eq!(loaded.frontier[0].group.path().tokens().len(), 2);
}

#[test]
fn torn_last_record_line_is_dropped_and_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    fs::create_dir_all(store.dir()).unwrap();
    fs::write(store.completed_path(), "org/foo/a.jar\norg/foo/b.j").unwrap();

    let loaded = store.load(true).unwrap();
    assert!(loaded.state.is_completed("org/foo/a.jar"));
    assert_eq!(loaded.state.completed_len(), 1);

    store.record_completion("org/foo/c.jar").unwrap();
    let text = fs::read_to_string(store.completed_path()).unwrap();
    assert_eq!(text, "org/foo/a.jar\norg/foo/c.jar\n");
}

#[test]
fn summary_rejects_corrupt_frontier() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path());
    fs::create_dir_all(store.dir()).unwrap();
    let json = r#"{"version":2,"tasks":[],"frontier":[{"group":"org/../etc","depth":0}]}"#;
    fs::write(store.pending_path(), json).unwrap();
    assert!(matches!(
        store.summary().unwrap_err(),
        StateError::CorruptSnapshot { .. }
    ));
}
