use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

use crate::config::ProjectConfig;
use crate::provider::RepositorySnapshot;
use crate::types::{Diagnostic, DiagnosticKind};

/// A candidate source file inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the snapshot root, `/`-separated.
    pub rel_path: String,
}

/// One step of a selection walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedEntry {
    File(SourceFile),
    /// An unreadable subtree; the walk continues past it.
    Skipped(Diagnostic),
}

/// Walks a snapshot and yields candidate source files in a fixed order.
///
/// Siblings are visited sorted by file name, depth first, which is the
/// component-wise lexical order of the relative paths.
#[derive(Debug, Clone)]
pub struct FileSelector {
    extensions: Vec<String>,
    exclude_dirs: HashSet<String>,
    exclude: GlobSet,
    include_hidden: bool,
}

impl FileSelector {
    pub fn new(project: &ProjectConfig) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &project.exclude_patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            extensions: project.extensions.clone(),
            exclude_dirs: project.exclude_dirs.iter().cloned().collect(),
            exclude: builder.build()?,
            include_hidden: project.include_hidden,
        })
    }

    /// Use `extensions` when the configuration does not list any.
    pub fn with_default_extensions(mut self, extensions: &[&str]) -> Self {
        if self.extensions.is_empty() {
            self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        }
        self
    }

    /// Lazily walk the snapshot. Calling this again restarts the walk and
    /// yields the same sequence.
    pub fn select<'a>(
        &'a self,
        snapshot: &'a RepositorySnapshot,
    ) -> impl Iterator<Item = SelectedEntry> + 'a {
        let root = snapshot.root();
        WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| e.depth() == 0 || !self.is_pruned_dir(e))
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
                        return None;
                    }
                    let rel_path = relative_path(root, entry.path());
                    if self.exclude.is_match(&rel_path) {
                        return None;
                    }
                    Some(SelectedEntry::File(SourceFile {
                        path: entry.into_path(),
                        rel_path,
                    }))
                }
                Err(e) => {
                    let file = e.path().map(|p| relative_path(root, p));
                    tracing::warn!(path = ?file, "skipping unreadable entry: {e}");
                    Some(SelectedEntry::Skipped(Diagnostic {
                        kind: DiagnosticKind::WalkError,
                        file,
                        line: None,
                        message: e.to_string(),
                    }))
                }
            })
    }

    fn is_pruned_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.exclude_dirs.contains(name.as_ref()) || (!self.include_hidden && name.starts_with('.'))
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
