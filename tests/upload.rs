mod common;

use common::MemoryStore;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use trafficcam::drive::folder_resolver::FolderResolver;
use trafficcam::drive::uploader::{RetryPolicy, UploadOutcome, Uploader};

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(2),
        max_total_backoff: Duration::from_secs(1),
    }
}

fn uploader_for(store: &Arc<MemoryStore>, local_root: &Path, retry: RetryPolicy, skip_existing: bool) -> Uploader {
    let resolver = Arc::new(FolderResolver::new(store.clone()));
    Uploader::new(store.clone(), resolver, local_root, retry, skip_existing)
}

fn write_run_file(root: &Path, name: &str) -> std::path::PathBuf {
    let dir = root.join("2025-01-01").join("10-00");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, b"image-bytes").unwrap();
    path
}

#[tokio::test]
async fn upload_mirrors_local_partition_remotely() {
    let local = tempfile::tempdir().unwrap();
    let file = write_run_file(local.path(), "cam1.jpg");
    let store = Arc::new(MemoryStore::new());
    let uploader = uploader_for(&store, local.path(), fast_retry(3), false);

    let outcome = uploader.upload(&file, "root").await;

    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(outcome, UploadOutcome::Uploaded(files[0].id.clone()));
    assert_eq!(files[0].name, "cam1.jpg");
    assert_eq!(files[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(files[0].content, b"image-bytes");

    let time_folder = store.folders().into_iter().find(|f| f.name == "10-00").unwrap();
    assert_eq!(files[0].parent, time_folder.id);
}

#[tokio::test]
async fn upload_retries_transient_failures() {
    let local = tempfile::tempdir().unwrap();
    let file = write_run_file(local.path(), "cam1.jpg");
    let store = Arc::new(MemoryStore::failing_creates(2));
    let uploader = uploader_for(&store, local.path(), fast_retry(3), false);

    let outcome = uploader.upload(&file, "root").await;

    assert!(matches!(outcome, UploadOutcome::Uploaded(_)));
    assert_eq!(MemoryStore::calls(&store.create_file_calls), 3);
    assert_eq!(store.files().len(), 1);
}

#[tokio::test]
async fn upload_gives_up_after_max_attempts() {
    let local = tempfile::tempdir().unwrap();
    let file = write_run_file(local.path(), "cam1.jpg");
    let store = Arc::new(MemoryStore::failing_creates(usize::MAX));
    let uploader = uploader_for(&store, local.path(), fast_retry(3), false);

    let outcome = uploader.upload(&file, "root").await;

    assert!(matches!(outcome, UploadOutcome::Failed(ref reason) if reason.contains("exhausted")));
    assert_eq!(MemoryStore::calls(&store.create_file_calls), 3);
    assert!(store.files().is_empty());
}

#[tokio::test]
async fn upload_tree_skips_non_image_files() {
    let local = tempfile::tempdir().unwrap();
    for name in ["a.jpg", "b.png", "c.txt"] {
        write_run_file(local.path(), name);
    }
    let store = Arc::new(MemoryStore::new());
    let uploader = uploader_for(&store, local.path(), fast_retry(3), false);

    let run_dir = local.path().join("2025-01-01").join("10-00");
    let results = uploader.upload_tree(&run_dir, "root").await;

    assert_eq!(results.len(), 2);
    assert_eq!(MemoryStore::calls(&store.create_file_calls), 2);
    let mut names: Vec<String> = store.files().into_iter().map(|f| f.name).collect();
    names.sort();
    assert_eq!(names, vec!["a.jpg", "b.png"]);
    let png = store.files().into_iter().find(|f| f.name == "b.png").unwrap();
    assert_eq!(png.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn existing_remote_file_is_skipped_when_enabled() {
    let local = tempfile::tempdir().unwrap();
    let file = write_run_file(local.path(), "cam1.jpg");
    let store = Arc::new(MemoryStore::new());
    let uploader = uploader_for(&store, local.path(), fast_retry(3), true);

    let first = uploader.upload(&file, "root").await;
    let second = uploader.upload(&file, "root").await;

    let UploadOutcome::Uploaded(id) = first else { panic!("first upload should succeed: {:?}", first) };
    assert_eq!(second, UploadOutcome::Skipped(id));
    assert_eq!(MemoryStore::calls(&store.create_file_calls), 1);
}

#[tokio::test]
async fn without_skip_a_rerun_uploads_again() {
    let local = tempfile::tempdir().unwrap();
    let file = write_run_file(local.path(), "cam1.jpg");
    let store = Arc::new(MemoryStore::new());
    let uploader = uploader_for(&store, local.path(), fast_retry(3), false);

    uploader.upload(&file, "root").await;
    uploader.upload(&file, "root").await;

    assert_eq!(store.files().len(), 2);
    assert_eq!(MemoryStore::calls(&store.find_file_calls), 0);
}

#[tokio::test]
async fn log_file_is_created_then_replaced() {
    let local = tempfile::tempdir().unwrap();
    let logs = local.path().join("logs");
    fs::create_dir_all(&logs).unwrap();
    let log_path = logs.join("fetch_log_2025-01-01.log");
    fs::write(&log_path, b"first run\n").unwrap();
    let store = Arc::new(MemoryStore::new());
    let uploader = uploader_for(&store, local.path(), fast_retry(3), true);

    let first = uploader.upload_log_file(&log_path, "root").await;
    fs::write(&log_path, b"first run\nsecond run\n").unwrap();
    let second = uploader.upload_log_file(&log_path, "root").await;

    assert_eq!(first, second);
    let files = store.files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].content, b"first run\nsecond run\n");
    assert_eq!(files[0].content_type.as_deref(), Some("text/plain"));
    assert_eq!(MemoryStore::calls(&store.update_file_calls), 1);

    let logs_folder = store.folders().into_iter().find(|f| f.name == "logs").unwrap();
    assert_eq!(logs_folder.parent, "root");
    assert_eq!(files[0].parent, logs_folder.id);
}

#[tokio::test]
async fn file_outside_local_root_fails_without_remote_calls() {
    let local = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let stray = write_run_file(elsewhere.path(), "cam9.jpg");
    let store = Arc::new(MemoryStore::new());
    let uploader = uploader_for(&store, local.path(), fast_retry(3), false);

    let outcome = uploader.upload(&stray, "root").await;

    assert!(matches!(outcome, UploadOutcome::Failed(_)));
    assert_eq!(MemoryStore::calls(&store.find_folder_calls), 0);
    assert_eq!(MemoryStore::calls(&store.create_file_calls), 0);
}
