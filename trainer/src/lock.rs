//! Exclusive session lock. One training session per data directory.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::{debug, info};

use crate::error::Result;

/// An exclusive advisory lock on the session lock file, held for the
/// process lifetime. Dropping the guard releases the lock, so an abnormal
/// exit can never leave it held.
pub struct SessionLock {
    file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Acquires the lock, blocking indefinitely while another session holds
    /// it. Never proceeds without the lock.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)?;
        debug!("waiting for session lock at {}", path.display());
        file.lock_exclusive()?;
        info!("acquired session lock at {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the lock explicitly.
    pub fn release(self) {
        // Unlocking happens in Drop.
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("released session lock at {}", self.path.display());
    }
}
