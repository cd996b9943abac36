use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Syntactic form of an import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import a.b` / `import a.b as c`
    Import,
    /// `from m import x` / `from m import x as y` / `from m import *`
    From,
}

/// A local name bound by an import: `(local alias, original name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    /// Name the import introduces into the module namespace.
    pub local_name: String,
    /// Name as written in the source module (`a.b` for `import a.b`).
    pub original_name: String,
    /// Whether the statement used an explicit `as` clause.
    pub aliased: bool,
}

impl Binding {
    pub fn new(local_name: &str, original_name: &str, aliased: bool) -> Self {
        Self {
            local_name: local_name.to_string(),
            original_name: original_name.to_string(),
            aliased,
        }
    }
}

/// One import as seen by the extractor.
///
/// Multi-name statements expand to one record per bound name, all sharing the
/// statement's line. A wildcard import is a single record with no bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub file: String,
    /// 1-based line of the import statement.
    pub line: usize,
    /// Module path as written, relative dots preserved (`..pkg`).
    pub module: String,
    pub kind: ImportKind,
    pub bindings: Vec<Binding>,
    pub wildcard: bool,
    /// Inside a `try` block or a `TYPE_CHECKING` branch.
    pub conditional: bool,
    /// Carries an inline `# noqa` that covers unused imports.
    pub suppressed: bool,
}

/// A call that imports a module by runtime value, e.g. `importlib.import_module(name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicImport {
    pub line: usize,
    /// Target module when given as a string literal.
    pub target: Option<String>,
}

/// Identifiers referenced in one file outside of import statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet(HashSet<String>);

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Everything the extractor learns about a single file.
#[derive(Debug, Clone, Default)]
pub struct FileExtraction {
    pub imports: Vec<ImportRecord>,
    pub references: ReferenceSet,
    pub dynamic_imports: Vec<DynamicImport>,
}

/// One reported unused import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub file: String,
    pub line: usize,
    pub module: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.module)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ReadError,
    ParseError,
    Timeout,
    WalkError,
    DynamicImport,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::ReadError => write!(f, "read-error"),
            DiagnosticKind::ParseError => write!(f, "parse-error"),
            DiagnosticKind::Timeout => write!(f, "timeout"),
            DiagnosticKind::WalkError => write!(f, "walk-error"),
            DiagnosticKind::DynamicImport => write!(f, "dynamic-import"),
        }
    }
}

/// Non-fatal observation made during an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    /// An import whose target cannot be determined statically.
    pub fn dynamic_import(file: &str, import: &DynamicImport) -> Self {
        let message = match &import.target {
            Some(target) => format!("dynamic import of '{target}' has unknown usage"),
            None => "dynamic import has unknown usage".to_string(),
        };
        Self {
            kind: DiagnosticKind::DynamicImport,
            file: Some(file.to_string()),
            line: Some(import.line),
            message,
        }
    }
}

/// Final output of one analysis request.
///
/// Serializes as `{repo, branch, files_analyzed, unused_imports}`;
/// `diagnostics` is not part of that shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub repo: String,
    pub branch: String,
    pub files_analyzed: usize,
    pub unused_imports: Vec<Finding>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_result_wire_shape() {
        let result = AnalysisResult {
            repo: "https://github.com/acme/tools.git".to_string(),
            branch: "main".to_string(),
            files_analyzed: 1,
            unused_imports: vec![Finding {
                file: "util.py".to_string(),
                line: 1,
                module: "os".to_string(),
            }],
            diagnostics: vec![Diagnostic {
                kind: DiagnosticKind::ParseError,
                file: Some("broken.py".to_string()),
                line: Some(3),
                message: "syntax error".to_string(),
            }],
        };

        let value = serde_json::to_value(&result).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, ["branch", "files_analyzed", "repo", "unused_imports"]);
        assert_eq!(value["unused_imports"][0]["file"], "util.py");
        assert_eq!(value["unused_imports"][0]["line"], 1);
        assert_eq!(value["unused_imports"][0]["module"], "os");
    }

    #[test]
    fn test_reference_set_from_iter() {
        let refs: ReferenceSet = ["os", "sys", "os"].into_iter().collect();
        assert_eq!(refs.len(), 2);
        assert!(refs.contains("sys"));
        assert!(!refs.contains("json"));
    }

    #[test]
    fn test_dynamic_import_diagnostic_message() {
        let diag = Diagnostic::dynamic_import(
            "plugins.py",
            &DynamicImport {
                line: 4,
                target: Some("plugins.extra".to_string()),
            },
        );
        assert_eq!(diag.kind, DiagnosticKind::DynamicImport);
        assert!(diag.message.contains("plugins.extra"));
        assert_eq!(diag.line, Some(4));
    }
}
