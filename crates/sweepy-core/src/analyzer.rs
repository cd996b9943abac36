use tree_sitter::Tree;

use crate::config::AnalysisConfig;
use crate::error::FileError;
use crate::types::FileExtraction;

/// A parsed source file with its tree-sitter AST and original content.
pub struct ParsedFile {
    /// Repository-relative path, `/`-separated.
    pub file: String,
    pub tree: Tree,
    pub content: String,
}

/// Trait that each language analyzer must implement.
pub trait LanguageAnalyzer: Send + Sync {
    /// Language name (e.g., "python")
    fn language(&self) -> &'static str;

    /// File extensions this analyzer handles (e.g., &["py"])
    fn file_extensions(&self) -> &[&str];

    /// Parse a source file. A tree with syntax errors is a [`FileError::Parse`].
    fn parse_file(
        &self,
        file: &str,
        content: &str,
        config: &AnalysisConfig,
    ) -> Result<ParsedFile, FileError>;

    /// Extract import records, the reference set and dynamic imports.
    fn extract(&self, parsed: &ParsedFile) -> FileExtraction;
}
