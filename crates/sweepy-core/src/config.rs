use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = ".sweepy.toml";

/// Top-level configuration from `.sweepy.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
}

/// Which files of a snapshot are analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Source extensions without the leading dot. Empty means "whatever the
    /// language analyzer handles".
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Directory names pruned anywhere in the tree.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against repository-relative file paths.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub include_hidden: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_exclude_dirs() -> Vec<String> {
    [
        ".git",
        ".hg",
        ".svn",
        "__pycache__",
        "node_modules",
        "venv",
        ".venv",
        "env",
        "site-packages",
        "vendor",
        ".tox",
        ".mypy_cache",
        ".pytest_cache",
        "build",
        "dist",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
            exclude_patterns: Vec::new(),
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_true")]
    pub respect_noqa: bool,
    /// Per-file parse budget in milliseconds; 0 disables the limit.
    #[serde(default = "default_parse_timeout_ms")]
    pub parse_timeout_ms: u64,
    /// Worker threads; 0 uses the available parallelism.
    #[serde(default)]
    pub threads: usize,
}

fn default_true() -> bool {
    true
}

fn default_parse_timeout_ms() -> u64 {
    5_000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            respect_noqa: true,
            parse_timeout_ms: default_parse_timeout_ms(),
            threads: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn parse_timeout(&self) -> Option<Duration> {
        (self.parse_timeout_ms > 0).then(|| Duration::from_millis(self.parse_timeout_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Deadline for cloning a remote repository; 0 disables it.
    #[serde(default = "default_acquisition_timeout")]
    pub timeout_secs: u64,
}

fn default_acquisition_timeout() -> u64 {
    300
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_acquisition_timeout(),
        }
    }
}

impl AcquisitionConfig {
    pub fn deadline(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Config {
    /// Load configuration from a `.sweepy.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content).with_context(|| {
            format!(
                "failed to parse '{}'. Run `sweepy init` to create a valid config file",
                path.display()
            )
        })?;
        Ok(config)
    }

    /// Load from `.sweepy.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            "failed to load config: {e:#}. Using defaults."
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Generate default TOML content for `sweepy init`.
    pub fn default_toml() -> String {
        r#"# Sweepy - Unused Import Analysis Configuration

[project]
# Source file extensions to analyze
extensions = ["py"]
# Directory names skipped anywhere in the tree (hidden directories are always skipped
# unless include_hidden = true)
exclude_dirs = [".git", ".hg", ".svn", "__pycache__", "node_modules", "venv", ".venv", "env", "site-packages", "vendor", ".tox", ".mypy_cache", ".pytest_cache", "build", "dist"]
# Glob patterns for files to skip, relative to the repository root
# exclude_patterns = ["migrations/**", "**/conftest.py"]
include_hidden = false

[analysis]
# Honour `# noqa` and `# noqa: F401` on import lines
respect_noqa = true
# Per-file parse budget in milliseconds (0 = unlimited)
parse_timeout_ms = 5000
# Worker threads (0 = number of CPUs)
threads = 0

[acquisition]
# Clone deadline in seconds (0 = unlimited)
timeout_secs = 300
"#
        .to_string()
    }
}
