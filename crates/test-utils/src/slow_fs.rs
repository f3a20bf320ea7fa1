use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use scriptci::fs::FileSystem;
use scriptci::fs::mock::MockFileSystem;

/// [`MockFileSystem`] whose mutating calls block the calling thread for
/// `delay`, like a write followed by an fsync on a slow disk.
#[derive(Debug, Clone)]
pub struct SlowFileSystem {
    inner: MockFileSystem,
    delay: Duration,
}

impl SlowFileSystem {
    pub fn new(inner: MockFileSystem, delay: Duration) -> Self {
        Self { inner, delay }
    }

    fn stall(&self) {
        std::thread::sleep(self.delay);
    }
}

impl FileSystem for SlowFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.stall();
        self.inner.write(path, contents)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.stall();
        self.inner.write_atomic(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.stall();
        self.inner.remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.create_dir_all(path)
    }

    fn clear_dir(&self, path: &Path) -> Result<()> {
        self.stall();
        self.inner.clear_dir(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }
}
