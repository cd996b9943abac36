use git2::Repository;
use tracing::debug;

use sweepy_core::context::AnalysisContext;
use sweepy_core::error::AcquisitionError;
use sweepy_core::location::{normalize, Location};
use sweepy_core::provider::{AcquireRequest, RepositoryProvider, RepositorySnapshot};

use crate::head_branch;

/// Analyzes an existing directory in place. Nothing is copied or removed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalProvider;

impl RepositoryProvider for LocalProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn acquire(
        &self,
        request: &AcquireRequest,
        ctx: &AnalysisContext,
    ) -> Result<RepositorySnapshot, AcquisitionError> {
        if ctx.is_cancelled() {
            return Err(AcquisitionError::Cancelled);
        }

        let root = match normalize(&request.location)? {
            Location::Local(path) if path.is_dir() => path,
            _ => return Err(AcquisitionError::InvalidLocation(request.location.clone())),
        };

        let branch = match Repository::discover(&root) {
            Ok(repo) => head_branch(&repo),
            Err(e) => {
                debug!(root = %root.display(), "not inside a git work tree: {}", e.message());
                "HEAD".to_string()
            }
        };

        Ok(RepositorySnapshot::borrowed(
            request.location.trim(),
            root,
            branch,
        ))
    }
}
