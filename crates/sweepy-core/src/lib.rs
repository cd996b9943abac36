pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod location;
pub mod pipeline;
pub mod provider;
pub mod resolver;
pub mod selector;
pub mod types;

pub use aggregator::{Aggregator, FileOutcome};
pub use analyzer::{LanguageAnalyzer, ParsedFile};
pub use config::Config;
pub use context::{AnalysisContext, CancellationToken};
pub use error::{AcquisitionError, FileError, InvariantError, SweepyError, SweepyResult};
pub use pipeline::AnalysisPipeline;
pub use provider::{AcquireRequest, RepositoryProvider, RepositorySnapshot};
pub use selector::FileSelector;
pub use types::*;
