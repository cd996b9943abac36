//! Classification of user-supplied repository locations.

use std::path::{Path, PathBuf};

use crate::error::AcquisitionError;

/// Where a repository lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// An existing directory on this machine.
    Local(PathBuf),
    /// Anything git can clone: URL, scp-style address, `file://` URL.
    Remote(String),
}

const URL_SCHEMES: &[&str] = &["http://", "https://", "git://", "ssh://", "file://"];
const KNOWN_HOSTS: &[&str] = &["github.com/", "gitlab.com/", "bitbucket.org/"];

/// Normalize a raw location string.
///
/// Accepts URLs, scp-style `user@host:path`, bare `github.com/owner/repo`,
/// existing local paths and `owner/repo` GitHub shorthand (only when no such
/// local path exists).
pub fn normalize(raw: &str) -> Result<Location, AcquisitionError> {
    let location = raw.trim();
    if location.is_empty() {
        return Err(AcquisitionError::InvalidLocation(raw.to_string()));
    }

    if URL_SCHEMES.iter().any(|s| location.starts_with(s)) || is_scp_like(location) {
        return Ok(Location::Remote(location.to_string()));
    }

    if KNOWN_HOSTS.iter().any(|h| location.starts_with(h)) {
        return Ok(Location::Remote(format!("https://{location}")));
    }

    let path = Path::new(location);
    if path.exists() {
        return Ok(Location::Local(path.to_path_buf()));
    }

    if is_github_shorthand(location) {
        let repo = location.trim_end_matches(".git");
        return Ok(Location::Remote(format!("https://github.com/{repo}.git")));
    }

    Err(AcquisitionError::InvalidLocation(raw.to_string()))
}

/// `git@github.com:owner/repo.git`
fn is_scp_like(location: &str) -> bool {
    let Some((user_host, path)) = location.split_once(':') else {
        return false;
    };
    !path.is_empty()
        && !path.starts_with("//")
        && user_host
            .split_once('@')
            .is_some_and(|(user, host)| !user.is_empty() && !host.is_empty() && !host.contains('/'))
}

fn is_github_shorthand(location: &str) -> bool {
    let mut parts = location.split('/');
    let (Some(owner), Some(repo), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let valid = |s: &str| {
        !s.is_empty()
            && !s.starts_with('.')
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    valid(owner) && valid(repo)
}
