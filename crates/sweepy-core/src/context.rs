use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

/// Shared flag that aborts an in-flight analysis.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration and cancellation state for one analysis request.
///
/// Passed explicitly through every stage; nothing in the analyzer reads
/// ambient or global settings.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    config: Config,
    cancel: CancellationToken,
}

impl AnalysisContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(config: Config, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn acquisition_deadline(&self) -> Option<Duration> {
        self.config.acquisition.deadline()
    }

    pub fn parse_timeout(&self) -> Option<Duration> {
        self.config.analysis.parse_timeout()
    }
}
