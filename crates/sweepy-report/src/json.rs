use serde::Serialize;

use sweepy_core::types::{AnalysisResult, Diagnostic};

/// Format an analysis result as the `{repo, branch, files_analyzed,
/// unused_imports}` object.
pub fn format_report(result: &AnalysisResult, compact: bool) -> serde_json::Result<String> {
    render(result, compact)
}

/// The report object with an extra `diagnostics` array.
#[derive(Debug, Serialize)]
pub struct DetailedOutput<'a> {
    #[serde(flatten)]
    pub result: &'a AnalysisResult,
    pub diagnostics: &'a [Diagnostic],
}

pub fn format_detailed(result: &AnalysisResult, compact: bool) -> serde_json::Result<String> {
    let output = DetailedOutput {
        result,
        diagnostics: &result.diagnostics,
    };
    render(&output, compact)
}

/// `{"error": message}`
pub fn format_error(message: &str, compact: bool) -> String {
    let value = serde_json::json!({ "error": message });
    if compact {
        value.to_string()
    } else {
        format!("{value:#}")
    }
}

fn render<T: Serialize>(value: &T, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
}
