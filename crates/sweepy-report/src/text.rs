use colored::Colorize;

use sweepy_core::types::AnalysisResult;

/// Format an analysis result for terminal output, grouped by file.
pub fn format_report(result: &AnalysisResult, show_diagnostics: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "Sweepy - Unused Import Analysis".bold()));
    out.push_str(&format!("{}\n\n", "=".repeat(40)));

    out.push_str(&format!("{}: {}\n", "Repository".bold(), result.repo));
    out.push_str(&format!("{}: {}\n", "Branch".bold(), result.branch));
    out.push_str(&format!(
        "{}: {}\n",
        "Files analyzed".bold(),
        result.files_analyzed
    ));

    if result.unused_imports.is_empty() {
        out.push_str(&format!("\n{}\n", "No unused imports found!".green().bold()));
    } else {
        out.push_str(&format!(
            "\n{} ({} found)\n{}\n",
            "Unused imports".yellow().bold(),
            result.unused_imports.len(),
            "-".repeat(40),
        ));

        // findings are already grouped by file
        let mut current: Option<&str> = None;
        for finding in &result.unused_imports {
            if current != Some(finding.file.as_str()) {
                out.push_str(&format!("\n  {}\n", finding.file.cyan()));
                current = Some(&finding.file);
            }
            out.push_str(&format!("    {:>5}  {}\n", finding.line, finding.module));
        }
    }

    if show_diagnostics && !result.diagnostics.is_empty() {
        out.push_str(&format!(
            "\n{} ({})\n{}\n",
            "Diagnostics".bold(),
            result.diagnostics.len(),
            "-".repeat(40),
        ));
        for diag in &result.diagnostics {
            let location = match (&diag.file, diag.line) {
                (Some(file), Some(line)) => format!("{file}:{line}"),
                (Some(file), None) => file.clone(),
                _ => "-".to_string(),
            };
            out.push_str(&format!(
                "  {} [{}] {}\n",
                "WARN".yellow().bold(),
                diag.kind,
                location
            ));
            out.push_str(&format!("    {}\n", diag.message));
        }
    } else if !result.diagnostics.is_empty() {
        out.push_str(&format!(
            "\n{} file(s) or imports skipped; rerun with --diagnostics for details\n",
            result.diagnostics.len()
        ));
    }

    out.push('\n');
    out
}

/// Format a check result for CI use. Returns (text, passed).
pub fn format_check(result: &AnalysisResult, show_diagnostics: bool) -> (String, bool) {
    let passed = result.unused_imports.is_empty();
    let mut out = format_report(result, show_diagnostics);

    if passed {
        out.push_str(&format!("{}\n", "CHECK PASSED".green().bold()));
    } else {
        out.push_str(&format!(
            "{}: {} unused import(s)\n",
            "CHECK FAILED".red().bold(),
            result.unused_imports.len(),
        ));
    }

    (out, passed)
}
