use crate::error::FileError;
use crate::provider::RepositorySnapshot;
use crate::types::{AnalysisResult, Diagnostic, Finding};

/// What happened to one selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Analyzed {
        findings: Vec<Finding>,
        diagnostics: Vec<Diagnostic>,
    },
    Failed(FileError),
}

/// Deterministic fold of per-file outcomes into one [`AnalysisResult`].
///
/// Outcomes may arrive in any order; they are keyed by the file's index in
/// selection order and merged in that order.
#[derive(Debug)]
pub struct Aggregator {
    repo: String,
    branch: String,
    outcomes: Vec<(usize, FileOutcome)>,
    walk_diagnostics: Vec<Diagnostic>,
}

impl Aggregator {
    pub fn new(snapshot: &RepositorySnapshot) -> Self {
        Self::for_repo(snapshot.location(), snapshot.branch())
    }

    pub fn for_repo(repo: &str, branch: &str) -> Self {
        Self {
            repo: repo.to_string(),
            branch: branch.to_string(),
            outcomes: Vec::new(),
            walk_diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, index: usize, outcome: FileOutcome) {
        self.outcomes.push((index, outcome));
    }

    /// Record a diagnostic that is not tied to an analyzed file (walk errors).
    pub fn note(&mut self, diagnostic: Diagnostic) {
        self.walk_diagnostics.push(diagnostic);
    }

    pub fn finish(mut self) -> AnalysisResult {
        self.outcomes.sort_by_key(|(index, _)| *index);

        let mut files_analyzed = 0usize;
        let mut unused_imports = Vec::new();
        let mut diagnostics = self.walk_diagnostics;

        for (_, outcome) in self.outcomes {
            match outcome {
                FileOutcome::Analyzed {
                    mut findings,
                    diagnostics: file_diagnostics,
                } => {
                    files_analyzed += 1;
                    findings.sort_by_key(|f| f.line);
                    unused_imports.extend(findings);
                    diagnostics.extend(file_diagnostics);
                }
                FileOutcome::Failed(err) => diagnostics.push(err.to_diagnostic()),
            }
        }

        AnalysisResult {
            repo: self.repo,
            branch: self.branch,
            files_analyzed,
            unused_imports,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DiagnosticKind;

    fn finding(file: &str, line: usize, module: &str) -> Finding {
        Finding {
            file: file.to_string(),
            line,
            module: module.to_string(),
        }
    }

    fn analyzed(findings: Vec<Finding>) -> FileOutcome {
        FileOutcome::Analyzed {
            findings,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_merges_in_file_index_order_regardless_of_arrival() {
        let mut agg = Aggregator::for_repo("acme/tools", "main");
        agg.push(2, analyzed(vec![finding("c.py", 1, "re")]));
        agg.push(0, analyzed(vec![finding("a.py", 7, "json"), finding("a.py", 3, "os")]));
        agg.push(1, analyzed(Vec::new()));

        let result = agg.finish();
        assert_eq!(result.files_analyzed, 3);
        assert_eq!(
            result.unused_imports,
            vec![
                finding("a.py", 3, "os"),
                finding("a.py", 7, "json"),
                finding("c.py", 1, "re"),
            ]
        );
        assert_eq!(result.repo, "acme/tools");
        assert_eq!(result.branch, "main");
    }

    #[test]
    fn test_failed_files_are_not_counted() {
        let mut agg = Aggregator::for_repo("repo", "main");
        agg.push(0, analyzed(vec![finding("ok.py", 1, "os")]));
        agg.push(
            1,
            FileOutcome::Failed(FileError::Parse {
                file: "bad.py".to_string(),
                line: 2,
            }),
        );

        let result = agg.finish();
        assert_eq!(result.files_analyzed, 1);
        assert_eq!(result.unused_imports.len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::ParseError);
    }

    #[test]
    fn test_walk_diagnostics_come_first() {
        let mut agg = Aggregator::for_repo("repo", "main");
        agg.push(
            0,
            FileOutcome::Failed(FileError::Timeout {
                file: "slow.py".to_string(),
                timeout_ms: 10,
            }),
        );
        agg.note(Diagnostic {
            kind: DiagnosticKind::WalkError,
            file: Some("locked".to_string()),
            line: None,
            message: "permission denied".to_string(),
        });

        let kinds: Vec<_> = agg.finish().diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::WalkError, DiagnosticKind::Timeout]);
    }

    #[test]
    fn test_empty_repository() {
        let result = Aggregator::for_repo("repo", "main").finish();
        assert_eq!(result.files_analyzed, 0);
        assert!(result.unused_imports.is_empty());
    }
}
