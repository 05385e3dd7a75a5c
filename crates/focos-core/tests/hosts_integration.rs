//! Integration tests for the hosts block manager.
//!
//! Drives apply/clear against a real file in a temp directory, committing
//! through the unprivileged direct-copy strategy.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use focos_core::elevation::{DirectCopy, ElevationStrategy};
use focos_core::hosts::marker::{MARKER_END, MARKER_START};
use focos_core::{BlockError, BlockResponse, HostsBlockManager};

const BASE: &str = "127.0.0.1 localhost\n::1 localhost\n";

fn manager(dir: &Path, initial: &str) -> (HostsBlockManager, PathBuf) {
    let hosts = dir.join("hosts");
    std::fs::write(&hosts, initial).unwrap();
    let manager = HostsBlockManager::new(hosts.clone(), Box::new(DirectCopy::new(dir.to_path_buf())));
    (manager, hosts)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_block_then_unblock_restores_original() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, hosts) = manager(dir.path(), BASE);

    manager
        .apply(&["https://Reddit.com/r/rust", "x.com"])
        .await
        .unwrap();
    let blocked = read(&hosts);
    assert!(blocked.starts_with(BASE));
    assert_eq!(blocked.matches(MARKER_START).count(), 1);
    for line in [
        "127.0.0.1 reddit.com",
        "127.0.0.1 www.reddit.com",
        "::1 reddit.com",
        "::1 www.reddit.com",
        "127.0.0.1 x.com",
        "::1 www.x.com",
    ] {
        assert!(blocked.lines().any(|l| l == line), "missing {line}");
    }
    assert!(blocked.trim_end().ends_with(MARKER_END));

    manager.clear().await.unwrap();
    assert_eq!(read(&hosts), BASE);
}

#[tokio::test]
async fn test_reapply_replaces_previous_block() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, hosts) = manager(dir.path(), BASE);

    manager.apply(&["a.com", "b.com"]).await.unwrap();
    manager.apply(&["c.com"]).await.unwrap();

    let content = read(&hosts);
    assert_eq!(content.matches(MARKER_START).count(), 1);
    assert!(!content.contains("a.com"));
    assert!(content.contains("127.0.0.1 c.com"));
    assert_eq!(manager.current_block().await.unwrap(), Some(vec!["c.com".to_string()]));
}

#[tokio::test]
async fn test_foreign_lines_around_block_survive() {
    let dir = tempfile::tempdir().unwrap();
    let initial = format!(
        "{BASE}{MARKER_START}\n127.0.0.1 old.com\n{MARKER_END}\n10.0.0.5 printer.lan\n"
    );
    let (manager, hosts) = manager(dir.path(), &initial);

    manager.clear().await.unwrap();
    assert_eq!(read(&hosts), format!("{BASE}10.0.0.5 printer.lan\n"));
}

#[tokio::test]
async fn test_clear_without_block_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, hosts) = manager(dir.path(), BASE);
    let before = std::fs::metadata(&hosts).unwrap().modified().unwrap();

    manager.clear().await.unwrap();
    manager.clear().await.unwrap();
    assert_eq!(read(&hosts), BASE);
    assert_eq!(std::fs::metadata(&hosts).unwrap().modified().unwrap(), before);
}

#[tokio::test]
async fn test_unusable_input_is_rejected_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, hosts) = manager(dir.path(), BASE);

    let err = manager.apply(&["", "   ", "https://"]).await.unwrap_err();
    assert!(matches!(err, BlockError::EmptyInput));
    assert_eq!(read(&hosts), BASE);

    let response = BlockResponse::from(Err(err));
    assert!(!response.success);
}

#[tokio::test]
async fn test_corrupt_block_is_reported_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let initial = format!("{BASE}{MARKER_START}\n127.0.0.1 half.com\n");
    let (manager, hosts) = manager(dir.path(), &initial);

    assert!(matches!(
        manager.apply(&["a.com"]).await,
        Err(BlockError::CorruptMarkerBlock { .. })
    ));
    assert!(matches!(
        manager.clear().await,
        Err(BlockError::CorruptMarkerBlock { .. })
    ));
    assert_eq!(read(&hosts), initial);
}

#[derive(Debug)]
struct Denied;

#[async_trait::async_trait]
impl ElevationStrategy for Denied {
    fn name(&self) -> &'static str {
        "denied"
    }

    async fn commit(&self, _target: &Path, _content: &str) -> Result<(), BlockError> {
        Err(BlockError::ElevationDenied("The operation was canceled by the user.".into()))
    }
}

#[tokio::test]
async fn test_denied_elevation_leaves_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let hosts = dir.path().join("hosts");
    std::fs::write(&hosts, BASE).unwrap();
    let manager = HostsBlockManager::new(hosts.clone(), Box::new(Denied));

    let response = BlockResponse::from(manager.apply(&["a.com"]).await);
    assert!(!response.success);
    assert!(response.error.unwrap().contains("canceled"));
    assert_eq!(read(&hosts), BASE);
}

#[tokio::test]
async fn test_concurrent_requests_never_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let (manager, hosts) = manager(dir.path(), BASE);
    let manager = Arc::new(manager);

    let mut tasks = Vec::new();
    for i in 0..8 {
        let m = manager.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                m.apply(&[format!("site{i}.com")]).await
            } else {
                m.clear().await
            }
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let content = read(&hosts);
    assert!(content.starts_with(BASE));
    assert!(content.matches(MARKER_START).count() <= 1);
    assert_eq!(
        content.matches(MARKER_START).count(),
        content.matches(MARKER_END).count()
    );
}
