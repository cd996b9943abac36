use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::context::AnalysisContext;
use crate::error::AcquisitionError;

/// What the caller asked to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquireRequest {
    pub location: String,
    pub branch: Option<String>,
}

impl AcquireRequest {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// A fully materialized, read-only view of a repository.
///
/// When the snapshot owns temporary storage (a fresh clone) that storage is
/// removed when the snapshot is dropped, on success, error and unwind alike.
#[derive(Debug)]
pub struct RepositorySnapshot {
    location: String,
    root: PathBuf,
    branch: String,
    storage: Option<TempDir>,
}

impl RepositorySnapshot {
    /// A snapshot over a directory the analyzer does not own.
    pub fn borrowed(location: impl Into<String>, root: PathBuf, branch: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            root,
            branch: branch.into(),
            storage: None,
        }
    }

    /// A snapshot rooted inside `storage`, which is released on drop.
    pub fn owned(
        location: impl Into<String>,
        storage: TempDir,
        root: PathBuf,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            root,
            branch: branch.into(),
            storage: Some(storage),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn owns_storage(&self) -> bool {
        self.storage.is_some()
    }
}

impl Drop for RepositorySnapshot {
    fn drop(&mut self) {
        let Some(storage) = self.storage.take() else {
            return;
        };
        let path = storage.path().to_path_buf();
        match storage.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "released repository snapshot"),
            Err(e) => tracing::warn!(path = %path.display(), "failed to remove snapshot: {e}"),
        }
    }
}

/// Resolves a repository location to a local snapshot.
pub trait RepositoryProvider: Send + Sync {
    /// Provider name for logs (e.g., "git", "local")
    fn name(&self) -> &'static str;

    /// Produce a fully materialized snapshot, or fail without leaving storage behind.
    fn acquire(
        &self,
        request: &AcquireRequest,
        ctx: &AnalysisContext,
    ) -> Result<RepositorySnapshot, AcquisitionError>;
}
