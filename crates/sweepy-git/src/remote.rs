use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use git2::build::RepoBuilder;
use git2::{ErrorClass, ErrorCode, FetchOptions, RemoteCallbacks, Repository};
use tracing::{debug, info, warn};

use sweepy_core::context::AnalysisContext;
use sweepy_core::error::AcquisitionError;
use sweepy_core::location::{normalize, Location};
use sweepy_core::provider::{AcquireRequest, RepositoryProvider, RepositorySnapshot};

use crate::head_branch;

const CLONE_DIR: &str = "repo";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Clones a repository into a temporary directory owned by the snapshot.
///
/// The clone runs on its own thread. `acquire` waits for it while watching the
/// acquisition deadline and the cancellation token, so a server that stops
/// responding mid-handshake cannot hold the caller past the deadline.
#[derive(Debug, Clone)]
pub struct GitProvider {
    temp_prefix: String,
    temp_root: Option<PathBuf>,
}

impl GitProvider {
    pub fn new() -> Self {
        Self {
            temp_prefix: "sweepy-".to_string(),
            temp_root: None,
        }
    }

    /// Create clone storage under `root` instead of the system temp directory.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }
}

impl Default for GitProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Abort {
    Cancelled,
    Deadline,
}

#[derive(Debug)]
enum CloneFailure {
    Aborted(Abort),
    Git(git2::Error),
    Spawn(std::io::Error),
}

impl RepositoryProvider for GitProvider {
    fn name(&self) -> &'static str {
        "git"
    }

    fn acquire(
        &self,
        request: &AcquireRequest,
        ctx: &AnalysisContext,
    ) -> Result<RepositorySnapshot, AcquisitionError> {
        if ctx.is_cancelled() {
            return Err(AcquisitionError::Cancelled);
        }

        let url = match normalize(&request.location)? {
            Location::Remote(url) => url,
            Location::Local(path) => path.to_string_lossy().into_owned(),
        };

        // Dropping `storage` on any early return removes the partial clone.
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.temp_prefix);
        let storage = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        let dest = storage.path().join(CLONE_DIR);

        info!(url = %url, branch = ?request.branch, "cloning repository");
        let started = Instant::now();
        let timeout = || AcquisitionError::Timeout {
            location: request.location.clone(),
            secs: ctx.config().acquisition.timeout_secs,
        };

        let repo = clone_with_deadline(&url, &dest, request.branch.as_deref(), ctx).map_err(
            |failure| match failure {
                CloneFailure::Aborted(Abort::Cancelled) => AcquisitionError::Cancelled,
                CloneFailure::Aborted(Abort::Deadline) => timeout(),
                CloneFailure::Git(e) => map_clone_error(e, request),
                CloneFailure::Spawn(e) => AcquisitionError::Io(e),
            },
        )?;

        // The result may land just after the deadline passed.
        if ctx.is_cancelled() {
            return Err(AcquisitionError::Cancelled);
        }
        if ctx
            .acquisition_deadline()
            .is_some_and(|deadline| started.elapsed() > deadline)
        {
            return Err(timeout());
        }

        let branch = head_branch(&repo);
        debug!(
            path = %dest.display(),
            branch = %branch,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "clone complete"
        );

        Ok(RepositorySnapshot::owned(
            request.location.trim(),
            storage,
            dest,
            branch,
        ))
    }
}

/// Run the clone on a worker thread and wait for it, giving up when the
/// context is cancelled or the acquisition deadline passes.
///
/// A worker that is given up on keeps running detached until libgit2 returns;
/// its `stop` flag makes the transfer callback abort as soon as data arrives.
fn clone_with_deadline(
    url: &str,
    dest: &Path,
    branch: Option<&str>,
    ctx: &AnalysisContext,
) -> Result<Repository, CloneFailure> {
    let deadline = ctx.acquisition_deadline();
    let started = Instant::now();
    let stop = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();

    {
        let url = url.to_string();
        let dest = dest.to_path_buf();
        let branch = branch.map(str::to_string);
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("sweepy-clone".to_string())
            .spawn(move || {
                let result = clone_repository(&url, &dest, branch.as_deref(), &stop);
                // the receiver is gone when the caller gave up
                let _ = tx.send(result);
            })
            .map_err(CloneFailure::Spawn)?;
    }

    loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(result) => return result.map_err(CloneFailure::Git),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(CloneFailure::Git(git2::Error::from_str(
                    "clone worker exited without a result",
                )));
            }
        }

        let abort = if ctx.is_cancelled() {
            Some(Abort::Cancelled)
        } else if deadline.is_some_and(|d| started.elapsed() > d) {
            Some(Abort::Deadline)
        } else {
            None
        };
        if let Some(abort) = abort {
            stop.store(true, Ordering::SeqCst);
            warn!(
                url = %url,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "abandoning clone: {abort:?}"
            );
            return Err(CloneFailure::Aborted(abort));
        }
    }
}

fn clone_repository(
    url: &str,
    dest: &Path,
    branch: Option<&str>,
    stop: &AtomicBool,
) -> Result<Repository, git2::Error> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.transfer_progress(|_progress| !stop.load(Ordering::SeqCst));

    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch);
    if let Some(branch) = branch {
        builder.branch(branch);
    }
    builder.clone(url, dest)
}

fn map_clone_error(e: git2::Error, request: &AcquireRequest) -> AcquisitionError {
    let location = request.location.clone();
    if let Some(branch) = &request.branch {
        if e.code() == ErrorCode::NotFound && e.class() == ErrorClass::Reference {
            return AcquisitionError::BranchNotFound {
                location,
                branch: branch.clone(),
            };
        }
    }

    let message = e.message().to_string();
    let lower = message.to_lowercase();
    if e.code() == ErrorCode::NotFound || lower.contains("404") || lower.contains("not found") {
        return AcquisitionError::NotFound(location);
    }
    AcquisitionError::Clone { location, message }
}
