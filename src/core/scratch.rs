//! Scratch directory for in-flight downloads.
//!
//! Every request gets its own `{root}/{uuid}` directory, so concurrent
//! downloads never share a path. The root is created lazily, at most once.

use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::core::error::AppError;

/// Shared scratch root. Cheap to share behind an `Arc`.
pub struct ScratchArea {
    root: PathBuf,
    ready: OnceCell<()>,
}

impl ScratchArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ready: OnceCell::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory once; concurrent first callers wait on the same init.
    pub async fn ensure_root(&self) -> Result<(), AppError> {
        self.ready
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.root).await?;
                log::info!("Scratch directory ready at {}", self.root.display());
                Ok::<(), AppError>(())
            })
            .await?;
        Ok(())
    }

    /// Allocate a fresh, collision-free directory for one request.
    ///
    /// Recreates the root as well if something removed it after startup.
    pub async fn allocate(&self) -> Result<ScratchDir, AppError> {
        self.ensure_root().await?;
        let path = self.root.join(Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir_all(&path).await?;
        Ok(ScratchDir { path, armed: true })
    }
}

/// A per-request directory, removed on `cleanup()` or, as a last resort, on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    armed: bool,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `file` lives inside this directory.
    pub fn owns(&self, file: &Path) -> bool {
        file.starts_with(&self.path)
    }

    /// Remove the directory and everything in it.
    pub async fn cleanup(mut self) {
        self.armed = false;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => log::debug!("Removed scratch dir {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch dir {}: {}", self.path.display(), e),
        }
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove scratch dir {} on drop: {}", self.path.display(), e);
                }
            }
        }
    }
}
