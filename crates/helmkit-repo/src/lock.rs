//! Cross-process file lock guarding the repositories file

use std::fs::{File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{RepoError, Result};

/// How long to wait for the lock
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between lock attempts
pub const LOCK_RETRY: Duration = Duration::from_secs(1);

/// Exclusive lock on a lock file, released on drop
///
/// The lock file itself is left in place.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Lock path used for a file: its extension replaced by `.lock`
    pub fn path_for(file: &Path) -> PathBuf {
        file.with_extension("lock")
    }

    /// Acquire the lock with the default timeout and retry interval
    pub async fn acquire(path: &Path) -> Result<Self> {
        Self::acquire_with(path, LOCK_TIMEOUT, LOCK_RETRY).await
    }

    pub async fn acquire_with(path: &Path, timeout: Duration, retry: Duration) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock() {
                Ok(()) => {
                    debug!(path = %path.display(), "acquired lock");
                    return Ok(Self {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(TryLockError::WouldBlock) => {}
                Err(TryLockError::Error(e)) => return Err(e.into()),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(RepoError::LockTimeout {
                    path: path.to_path_buf(),
                    seconds: timeout.as_secs(),
                });
            }
            tokio::time::sleep(retry.min(deadline - now)).await;
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
