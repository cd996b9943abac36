use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::aggregator::{Aggregator, FileOutcome};
use crate::analyzer::LanguageAnalyzer;
use crate::classifier::classify;
use crate::context::AnalysisContext;
use crate::error::{FileError, SweepyError, SweepyResult};
use crate::provider::{AcquireRequest, RepositoryProvider, RepositorySnapshot};
use crate::resolver::Resolver;
use crate::selector::{FileSelector, SelectedEntry, SourceFile};
use crate::types::{AnalysisResult, Diagnostic};

/// Provider -> selector -> extractor -> resolver -> classifier -> aggregator.
///
/// Per-file work runs on a dedicated rayon pool; the aggregator restores
/// selection order so output never depends on scheduling.
pub struct AnalysisPipeline {
    analyzer: Box<dyn LanguageAnalyzer>,
    context: AnalysisContext,
}

impl AnalysisPipeline {
    pub fn new(analyzer: Box<dyn LanguageAnalyzer>, context: AnalysisContext) -> Self {
        Self { analyzer, context }
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    /// Acquire the repository and analyze it.
    ///
    /// The snapshot is dropped before this returns, which releases any clone
    /// the provider made, whether the analysis succeeded or not.
    pub fn run(
        &self,
        provider: &dyn RepositoryProvider,
        request: &AcquireRequest,
    ) -> SweepyResult<AnalysisResult> {
        self.check_cancelled()?;
        info!(
            location = %request.location,
            branch = ?request.branch,
            provider = provider.name(),
            "acquiring repository"
        );
        let snapshot = provider.acquire(request, &self.context)?;
        info!(
            root = %snapshot.root().display(),
            branch = snapshot.branch(),
            "repository acquired"
        );
        self.analyze_snapshot(&snapshot)
    }

    /// Analyze an already acquired snapshot.
    pub fn analyze_snapshot(&self, snapshot: &RepositorySnapshot) -> SweepyResult<AnalysisResult> {
        let config = self.context.config();
        let selector = FileSelector::new(&config.project)?
            .with_default_extensions(self.analyzer.file_extensions());

        let mut aggregator = Aggregator::new(snapshot);
        let mut files = Vec::new();
        for entry in selector.select(snapshot) {
            match entry {
                SelectedEntry::File(file) => files.push(file),
                SelectedEntry::Skipped(diagnostic) => aggregator.note(diagnostic),
            }
        }
        debug!(count = files.len(), "selected source files");

        let resolver = Resolver::new(config.analysis.respect_noqa);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.analysis.threads)
            .thread_name(|i| format!("sweepy-worker-{i}"))
            .build()?;

        let outcomes: Vec<(usize, FileOutcome)> = pool.install(|| {
            files
                .par_iter()
                .enumerate()
                .map(|(index, file)| {
                    self.check_cancelled()?;
                    self.analyze_file(file, &resolver)
                        .map(|outcome| (index, outcome))
                })
                .collect::<SweepyResult<Vec<_>>>()
        })?;

        self.check_cancelled()?;
        for (index, outcome) in outcomes {
            aggregator.push(index, outcome);
        }

        let result = aggregator.finish();
        info!(
            files_analyzed = result.files_analyzed,
            unused_imports = result.unused_imports.len(),
            "analysis complete"
        );
        Ok(result)
    }

    fn analyze_file(&self, file: &SourceFile, resolver: &Resolver) -> SweepyResult<FileOutcome> {
        let content = match std::fs::read_to_string(&file.path) {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %file.rel_path, "failed to read: {e}");
                return Ok(FileOutcome::Failed(FileError::Read {
                    file: file.rel_path.clone(),
                    message: e.to_string(),
                }));
            }
        };

        let parsed = match self.analyzer.parse_file(
            &file.rel_path,
            &content,
            &self.context.config().analysis,
        ) {
            Ok(p) => p,
            Err(e) => {
                warn!(file = %file.rel_path, "{e}");
                return Ok(FileOutcome::Failed(e));
            }
        };

        let extraction = self.analyzer.extract(&parsed);
        let unused = resolver.resolve(&extraction)?;
        let findings = classify(&unused);
        let diagnostics = extraction
            .dynamic_imports
            .iter()
            .map(|d| Diagnostic::dynamic_import(&file.rel_path, d))
            .collect();

        debug!(
            file = %file.rel_path,
            imports = extraction.imports.len(),
            references = extraction.references.len(),
            unused = findings.len(),
            "analyzed file"
        );

        Ok(FileOutcome::Analyzed {
            findings,
            diagnostics,
        })
    }

    fn check_cancelled(&self) -> SweepyResult<()> {
        if self.context.is_cancelled() {
            Err(SweepyError::Cancelled)
        } else {
            Ok(())
        }
    }
}
