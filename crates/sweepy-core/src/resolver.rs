//! Decides which import bindings are never referenced.

use crate::error::InvariantError;
use crate::types::{Binding, FileExtraction, ImportRecord};

/// A binding with no matching reference in its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnusedBinding<'a> {
    pub record: &'a ImportRecord,
    pub binding: &'a Binding,
}

/// Usage resolution for a single file.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    respect_noqa: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self { respect_noqa: true }
    }
}

impl Resolver {
    pub fn new(respect_noqa: bool) -> Self {
        Self { respect_noqa }
    }

    /// Return every unused binding of the file, in record order.
    ///
    /// A wildcard import anywhere in the file suppresses all results, since the
    /// names it binds cannot be enumerated. An alias used once covers every
    /// import that binds it.
    pub fn resolve<'a>(
        &self,
        extraction: &'a FileExtraction,
    ) -> Result<Vec<UnusedBinding<'a>>, InvariantError> {
        validate(&extraction.imports)?;

        if extraction.imports.iter().any(|r| r.wildcard) {
            return Ok(Vec::new());
        }

        let unused = extraction
            .imports
            .iter()
            .filter(|record| !(self.respect_noqa && record.suppressed))
            .flat_map(|record| {
                record
                    .bindings
                    .iter()
                    .map(move |binding| UnusedBinding { record, binding })
            })
            .filter(|u| !extraction.references.contains(&u.binding.local_name))
            .collect();

        Ok(unused)
    }
}

fn validate(records: &[ImportRecord]) -> Result<(), InvariantError> {
    match records.iter().find(|r| r.bindings.is_empty() && !r.wildcard) {
        Some(bad) => Err(InvariantError {
            file: bad.file.clone(),
            line: bad.line,
        }),
        None => Ok(()),
    }
}
