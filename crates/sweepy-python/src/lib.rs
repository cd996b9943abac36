mod extract;

use anyhow::{Context, Result};
use regex::Regex;
use tree_sitter::{Language, Node, Parser};

use sweepy_core::analyzer::{LanguageAnalyzer, ParsedFile};
use sweepy_core::config::AnalysisConfig;
use sweepy_core::error::FileError;
use sweepy_core::types::FileExtraction;

use extract::Patterns;

/// Python import extractor using tree-sitter.
pub struct PythonAnalyzer {
    language: Language,
    patterns: Patterns,
}

impl PythonAnalyzer {
    pub fn new() -> Result<Self> {
        let language: Language = tree_sitter_python::LANGUAGE.into();

        let noqa = Regex::new(r"(?i)#\s*noqa\b(?:\s*:\s*(?P<codes>[a-z0-9]+(?:[\s,]+[a-z0-9]+)*))?")
            .context("failed to compile noqa pattern")?;
        let identifier =
            Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").context("failed to compile identifier pattern")?;

        Ok(Self {
            language,
            patterns: Patterns { noqa, identifier },
        })
    }
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn language(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn parse_file(
        &self,
        file: &str,
        content: &str,
        config: &AnalysisConfig,
    ) -> Result<ParsedFile, FileError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| FileError::Language {
                file: file.to_string(),
                message: e.to_string(),
            })?;
        if let Some(timeout) = config.parse_timeout() {
            parser.set_timeout_micros(timeout.as_micros().try_into().unwrap_or(u64::MAX));
        }

        // With a language set, the parser only gives up when the timeout fires.
        let tree = parser.parse(content, None).ok_or_else(|| FileError::Timeout {
            file: file.to_string(),
            timeout_ms: config.parse_timeout_ms,
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(FileError::Parse {
                file: file.to_string(),
                line: first_error_line(root),
            });
        }

        Ok(ParsedFile {
            file: file.to_string(),
            tree,
            content: content.to_string(),
        })
    }

    fn extract(&self, parsed: &ParsedFile) -> FileExtraction {
        extract::extract(parsed, &self.patterns)
    }
}

/// 1-based line of the first ERROR or MISSING node.
fn first_error_line(root: Node<'_>) -> usize {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row + 1;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).filter(|c| c.has_error()).collect();
        stack.extend(children.into_iter().rev());
    }
    root.start_position().row + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweepy_core::classifier::classify;
    use sweepy_core::resolver::Resolver;
    use sweepy_core::types::ImportKind;

    fn analyze(source: &str) -> FileExtraction {
        let analyzer = PythonAnalyzer::new().unwrap();
        let parsed = analyzer
            .parse_file("test.py", source, &AnalysisConfig::default())
            .unwrap();
        analyzer.extract(&parsed)
    }

    /// (line, module) of every finding for `source`.
    fn unused(source: &str) -> Vec<(usize, String)> {
        let extraction = analyze(source);
        let unused = Resolver::default().resolve(&extraction).unwrap();
        classify(&unused)
            .into_iter()
            .map(|f| (f.line, f.module))
            .collect()
    }

    fn modules(findings: &[(usize, String)]) -> Vec<&str> {
        findings.iter().map(|(_, m)| m.as_str()).collect()
    }

    #[test]
    fn test_plain_imports_one_unused() {
        let src = "import os\nimport sys\n\nprint(sys.argv)\n";
        assert_eq!(unused(src), vec![(1, "os".to_string())]);
    }

    #[test]
    fn test_from_import_only_quoted_annotation_use() {
        let src = r#"from typing import List, Dict

def first(items: "List[int]") -> int:
    return items[0]
"#;
        assert_eq!(unused(src), vec![(1, "typing.Dict".to_string())]);
    }

    #[test]
    fn test_wildcard_suppresses_file() {
        let src = "from module import *\nimport json\n";
        assert!(unused(src).is_empty());
        let extraction = analyze(src);
        assert!(extraction.imports[0].wildcard);
        assert!(extraction.imports[0].bindings.is_empty());
        assert_eq!(extraction.imports[0].module, "module");
    }

    #[test]
    fn test_file_without_imports() {
        let src = "def add(a, b):\n    return a + b\n";
        let extraction = analyze(src);
        assert!(extraction.imports.is_empty());
        assert!(extraction.references.contains("a"));
        assert!(!extraction.references.contains("add"));
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_multi_name_statement_expands_per_name() {
        let src = "import os, sys as system, json\nprint(json.dumps({}))\n";
        let extraction = analyze(src);
        assert_eq!(extraction.imports.len(), 3);
        assert!(extraction.imports.iter().all(|r| r.line == 1));
        assert_eq!(
            unused(src),
            vec![(1, "os".to_string()), (1, "sys as system".to_string())]
        );
    }

    #[test]
    fn test_dotted_import_binds_head() {
        let src = "import os.path\nimport xml.etree.ElementTree as ET\n\nos.getcwd()\n";
        let extraction = analyze(src);
        assert_eq!(extraction.imports[0].bindings[0].local_name, "os");
        assert_eq!(extraction.imports[0].bindings[0].original_name, "os.path");
        assert_eq!(extraction.imports[1].bindings[0].local_name, "ET");
        assert_eq!(
            unused(src),
            vec![(2, "xml.etree.ElementTree as ET".to_string())]
        );
    }

    #[test]
    fn test_relative_imports() {
        let src = "from . import models\nfrom ..core import Base as CoreBase\nfrom .utils import helper\n\nhelper()\n";
        let extraction = analyze(src);
        assert_eq!(extraction.imports[0].module, ".");
        assert_eq!(extraction.imports[1].module, "..core");
        assert_eq!(extraction.imports[2].kind, ImportKind::From);
        assert_eq!(
            modules(&unused(src)),
            vec![".models", "..core.Base as CoreBase"]
        );
    }

    #[test]
    fn test_parenthesized_multiline_from_import_shares_line() {
        let src = "x = 1\nfrom collections import (\n    OrderedDict,\n    defaultdict,\n)\n\nd = defaultdict(list)\n";
        assert_eq!(unused(src), vec![(2, "collections.OrderedDict".to_string())]);
    }

    #[test]
    fn test_future_import_is_ignored() {
        let src = "from __future__ import annotations\n";
        assert!(analyze(src).imports.is_empty());
    }

    #[test]
    fn test_reexport_list_counts_as_use() {
        let src = r#"from .models import User, Group, Role
from .views import index

__all__ = ["User"]
__all__ += ("Group",)
__all__.append("index")
"#;
        assert_eq!(modules(&unused(src)), vec![".models.Role"]);
    }

    #[test]
    fn test_reexport_extend() {
        let src = "from .a import x, y\n__all__ = []\n__all__.extend(['x', 'y'])\n";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_import_used_only_by_another_import_is_unused() {
        let src = "import os\nfrom os import path\n";
        assert_eq!(modules(&unused(src)), vec!["os", "os.path"]);
    }

    #[test]
    fn test_attribute_member_is_not_a_reference() {
        let src = "import path\nimport os\nos.path.join('a')\n";
        assert_eq!(modules(&unused(src)), vec!["path"]);
    }

    #[test]
    fn test_keyword_argument_name_is_not_a_reference() {
        let src = "from json import indent\nprint(dict(indent=2))\n";
        assert_eq!(modules(&unused(src)), vec!["json.indent"]);
    }

    #[test]
    fn test_decorator_counts_as_use() {
        let src = "import functools\n\n@functools.lru_cache(maxsize=None)\ndef f():\n    return 1\n";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_nested_imports_are_recorded() {
        let src = "def load():\n    import json\n    import yaml\n    return json.loads('{}')\n";
        assert_eq!(unused(src), vec![(3, "yaml".to_string())]);
    }

    #[test]
    fn test_try_except_import_is_conditional() {
        let src = r#"try:
    import ujson as json
except ImportError:
    import json

print(json.dumps(1))
"#;
        let extraction = analyze(src);
        assert_eq!(extraction.imports.len(), 2);
        assert!(extraction.imports.iter().all(|r| r.conditional));
        // both bindings of `json` are satisfied by the same use
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_type_checking_block_is_conditional_but_checked() {
        let src = r#"from typing import TYPE_CHECKING

if TYPE_CHECKING:
    from .models import User
    from .models import Group

def get(user: "User") -> None:
    pass
"#;
        let extraction = analyze(src);
        assert!(!extraction.imports[0].conditional);
        assert!(extraction.imports[1].conditional);
        assert!(extraction.imports[2].conditional);
        assert_eq!(unused(src), vec![(5, ".models.Group".to_string())]);
    }

    #[test]
    fn test_elif_type_checking_branch_is_conditional() {
        let src = r#"import sys

if sys.version_info > (3,):
    pass
elif TYPE_CHECKING:
    import json
"#;
        let extraction = analyze(src);
        assert!(!extraction.imports[0].conditional);
        assert!(extraction.imports[1].conditional);
        assert_eq!(unused(src), vec![(6, "json".to_string())]);
    }

    #[test]
    fn test_def_and_class_names_are_not_uses() {
        let src = "import os\nfrom models import User\n\ndef os():\n    pass\n\nclass User:\n    pass\n";
        assert_eq!(modules(&unused(src)), vec!["os", "models.User"]);
    }

    #[test]
    fn test_shadowing_def_still_sees_later_reads() {
        let src = "import os\n\ndef helper():\n    return os.sep\n";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_string_annotations_in_variables_and_returns() {
        let src = r#"from decimal import Decimal
from typing import Optional
from pathlib import Path

total: "Decimal" = 0

def find() -> Optional["Path"]:
    return None
"#;
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_plain_string_is_not_a_reference() {
        let src = "import os\nprint('os')\n";
        assert_eq!(modules(&unused(src)), vec!["os"]);
    }

    #[test]
    fn test_fstring_interpolation_is_a_reference() {
        let src = "import os\nprint(f\"{os.sep}\")\n";
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_noqa_suppresses_import() {
        let src = "import os  # noqa\nimport re  # noqa: F401\nimport sys  # noqa: E501\nimport json  # NOQA:E402,F401\n";
        let extraction = analyze(src);
        let flags: Vec<_> = extraction.imports.iter().map(|r| r.suppressed).collect();
        assert_eq!(flags, vec![true, true, false, true]);
        assert_eq!(modules(&unused(src)), vec!["sys"]);
    }

    #[test]
    fn test_dynamic_imports_are_tagged() {
        let src = r#"import importlib

plugin = importlib.import_module("plugins.extra")
other = __import__(name)
"#;
        let extraction = analyze(src);
        assert_eq!(extraction.dynamic_imports.len(), 2);
        assert_eq!(extraction.dynamic_imports[0].line, 3);
        assert_eq!(
            extraction.dynamic_imports[0].target.as_deref(),
            Some("plugins.extra")
        );
        assert_eq!(extraction.dynamic_imports[1].target, None);
        assert!(unused(src).is_empty());
    }

    #[test]
    fn test_line_numbers_follow_statements() {
        let src = "\n\n# header\nimport os\n\n\nx = 1\nimport re\n";
        assert_eq!(
            unused(src),
            vec![(4, "os".to_string()), (8, "re".to_string())]
        );
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let analyzer = PythonAnalyzer::new().unwrap();
        let src = "import os\n\ndef broken(:\n    pass\n";
        let err = analyzer
            .parse_file("bad.py", src, &AnalysisConfig::default())
            .err()
            .unwrap();
        match err {
            FileError::Parse { file, line } => {
                assert_eq!(file, "bad.py");
                assert_eq!(line, 3);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let src = "import a\nimport b\nfrom c import d, e\nprint(a, d)\n";
        assert_eq!(analyze(src).imports, analyze(src).imports);
        assert_eq!(unused(src), unused(src));
    }
}
