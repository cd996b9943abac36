//! Repository acquisition: local checkouts are analyzed in place, everything
//! else is cloned into scoped temporary storage.

mod local;
mod remote;

pub use local::LocalProvider;
pub use remote::GitProvider;

use sweepy_core::location::{normalize, Location};
use sweepy_core::provider::{AcquireRequest, RepositoryProvider};

/// Pick the provider for a request.
///
/// An existing directory without a branch override is read in place. A branch
/// override on a local repository, or any remote location, goes through a
/// clone. Invalid locations are left to the provider to reject.
pub fn provider_for(request: &AcquireRequest) -> Box<dyn RepositoryProvider> {
    match normalize(&request.location) {
        Ok(Location::Local(_)) if request.branch.is_none() => Box::new(LocalProvider),
        _ => Box::new(GitProvider::new()),
    }
}

/// Short name of the branch HEAD points at, `"HEAD"` when detached or unborn.
pub(crate) fn head_branch(repo: &git2::Repository) -> String {
    repo.head()
        .ok()
        .and_then(|head| head.shorthand().map(str::to_string))
        .unwrap_or_else(|| "HEAD".to_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_directory_without_branch_is_read_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let request = AcquireRequest::new(dir.path().to_string_lossy());
        assert_eq!(provider_for(&request).name(), "local");
    }

    #[test]
    fn test_branch_override_forces_clone() {
        let dir = tempfile::tempdir().unwrap();
        let request = AcquireRequest::new(dir.path().to_string_lossy()).with_branch("dev");
        assert_eq!(provider_for(&request).name(), "git");
    }

    #[test]
    fn test_remote_locations_are_cloned() {
        assert_eq!(provider_for(&AcquireRequest::new("acme/tools")).name(), "git");
        assert_eq!(
            provider_for(&AcquireRequest::new("https://gitlab.com/acme/tools.git")).name(),
            "git"
        );
    }
}
