#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub use scriptci_test_utils::init_tracing;

/// Run a future with a 30-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(30), f)
        .await
        .expect("Test timed out after 30 seconds")
}

/// Write `code` to `dir/name` and return the path.
pub fn write_script(dir: &Path, name: &str, code: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, code).expect("write script");
    path
}

/// Read a log file into its lines.
pub fn log_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read log")
        .lines()
        .map(str::to_string)
        .collect()
}
