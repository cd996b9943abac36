use crate::resolver::UnusedBinding;
use crate::types::{Binding, Finding, ImportKind, ImportRecord};

/// Turn unused bindings into findings, one per binding, ordered by line.
pub fn classify(unused: &[UnusedBinding<'_>]) -> Vec<Finding> {
    let mut findings: Vec<Finding> = unused
        .iter()
        .map(|u| Finding {
            file: u.record.file.clone(),
            line: u.record.line,
            module: render_module(u.record, u.binding),
        })
        .collect();
    // stable: same-line bindings keep statement order
    findings.sort_by_key(|f| f.line);
    findings
}

/// Display name traceable to the source text.
///
/// `import a.b` -> `a.b`, `import a.b as c` -> `a.b as c`,
/// `from m import x` -> `m.x`, `from . import x as y` -> `.x as y`.
pub fn render_module(record: &ImportRecord, binding: &Binding) -> String {
    let path = match record.kind {
        ImportKind::Import => binding.original_name.clone(),
        ImportKind::From if record.module.ends_with('.') => {
            format!("{}{}", record.module, binding.original_name)
        }
        ImportKind::From => format!("{}.{}", record.module, binding.original_name),
    };

    if binding.aliased && binding.local_name != binding.original_name {
        format!("{path} as {}", binding.local_name)
    } else {
        path
    }
}
