use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sweepy_core::config::{Config, CONFIG_FILE};
use sweepy_core::context::AnalysisContext;
use sweepy_core::pipeline::AnalysisPipeline;
use sweepy_core::provider::AcquireRequest;
use sweepy_core::types::AnalysisResult;
use sweepy_python::PythonAnalyzer;
use sweepy_report::{json, text, OutputFormat};

const LOG_ENV: &str = "SWEEPY_LOG";

#[derive(Parser)]
#[command(name = "sweepy")]
#[command(about = "Find unused imports across a Python repository")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); SWEEPY_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a repository and print every unused import
    Analyze(AnalyzeArgs),
    /// Analyze and exit with code 0 (clean) or 1 (unused imports found)
    Check(AnalyzeArgs),
    /// Create a default .sweepy.toml configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Local path, git URL, or GitHub owner/repo shorthand
    location: String,
    /// Branch to analyze (forces a clone)
    #[arg(short, long)]
    branch: Option<String>,
    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
    /// Include per-file diagnostics (skipped files, dynamic imports)
    #[arg(long)]
    diagnostics: bool,
    /// Config file path (defaults to .sweepy.toml discovered upwards)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Worker threads (0 = number of CPUs)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (result, error_format) = match &cli.command {
        Commands::Analyze(args) => (cmd_analyze(args, false), Some(args)),
        Commands::Check(args) => (cmd_analyze(args, true), Some(args)),
        Commands::Init { force } => (cmd_init(*force).map(|()| 0), None),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            match error_format {
                Some(args) if args.format == OutputFormat::Json => {
                    println!("{}", json::format_error(&format!("{e:#}"), args.compact));
                }
                _ => eprintln!("Error: {e:#}"),
            }
            process::exit(2);
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns the process exit code.
fn cmd_analyze(args: &AnalyzeArgs, check: bool) -> Result<i32> {
    let result = run_analysis(args)?;
    let clean = result.unused_imports.is_empty();

    let report = match args.format {
        OutputFormat::Json => {
            let rendered = if args.diagnostics {
                json::format_detailed(&result, args.compact)
            } else {
                json::format_report(&result, args.compact)
            };
            let mut report = rendered.context("failed to serialize report")?;
            report.push('\n');
            report
        }
        OutputFormat::Text if check => text::format_check(&result, args.diagnostics).0,
        OutputFormat::Text => text::format_report(&result, args.diagnostics),
    };
    print!("{report}");

    Ok(if check && !clean { 1 } else { 0 })
}

fn cmd_init(force: bool) -> Result<()> {
    let target = PathBuf::from(CONFIG_FILE);
    if target.exists() && !force {
        anyhow::bail!("{CONFIG_FILE} already exists. Use --force to overwrite.");
    }
    std::fs::write(&target, Config::default_toml())
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    println!("Created {CONFIG_FILE} with default configuration.");
    Ok(())
}

/// `--config` wins; otherwise discover upwards from a local repository, or
/// from the working directory for remote ones.
fn load_config(location: &str, config_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_path {
        return Config::load(path);
    }
    let local = Path::new(location.trim());
    let start = if local.is_dir() {
        local.to_path_buf()
    } else {
        std::env::current_dir().context("failed to read working directory")?
    };
    Ok(Config::load_or_default(&start))
}

fn run_analysis(args: &AnalyzeArgs) -> Result<AnalysisResult> {
    let mut config = load_config(&args.location, args.config.as_deref())?;
    if let Some(threads) = args.threads {
        config.analysis.threads = threads;
    }

    let analyzer = PythonAnalyzer::new().context("failed to initialize Python analyzer")?;
    let pipeline = AnalysisPipeline::new(Box::new(analyzer), AnalysisContext::new(config));

    let mut request = AcquireRequest::new(args.location.as_str());
    if let Some(branch) = &args.branch {
        request = request.with_branch(branch.as_str());
    }
    let provider = sweepy_git::provider_for(&request);
    tracing::debug!(provider = provider.name(), "selected repository provider");

    Ok(pipeline.run(provider.as_ref(), &request)?)
}
