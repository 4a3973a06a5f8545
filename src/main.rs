//! # histmap - CLI Entry Point
//!
//! Commands:
//! - `scan`        - Classify a history file and render the report
//! - `refresh`     - Force a re-fetch of the ATT&CK dataset into the cache
//! - `init-config` - Generate a default configuration file

use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use histmap::classify::{self, Aggregator};
use histmap::history::HistoryWalker;
use histmap::report::{self, ReportFormat, RunReport};
use histmap::rules::{fetch, RuleStore};
use histmap::{HistmapConfig, HistmapError, HistmapResult};

/// histmap - maps shell command history to MITRE ATT&CK techniques.
///
/// Reads a shell history file, classifies each command against technique
/// match patterns, and renders a per-technique report.
#[derive(Parser, Debug)]
#[command(name = "histmap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "histmap.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a history file and render the report.
    Scan {
        /// Path to the shell history file.
        #[arg(short, long)]
        file: PathBuf,

        /// Output file for the report. Format is inferred from the
        /// extension (.md, .json, anything else is plain text) unless set
        /// in the config. Without this flag the report goes to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Force a re-fetch of the ATT&CK dataset into the cache.
    Refresh,

    /// Generate a default configuration file.
    InitConfig,
}

fn main() -> HistmapResult<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { file, output } => cmd_scan(&cli.config, &file, output.as_deref()),
        Commands::Refresh => cmd_refresh(&cli.config),
        Commands::InitConfig => cmd_init_config(&cli.config),
    }
}

/// Run the pipeline: walk the history file, classify each command,
/// aggregate, render.
fn cmd_scan(config_path: &Path, file: &Path, output: Option<&Path>) -> HistmapResult<()> {
    let config = load_config(config_path)?;

    // Rule store is built once and passed by reference from here on.
    let bundle = fetch::ensure_dataset(&config.dataset)?;
    let rules = RuleStore::from_bundle_str(&bundle)?;
    info!("Rule store loaded ({} techniques)", rules.len());

    let mut walker = HistoryWalker::open(file)?;
    info!("Scanning {}", file.display());

    let mut aggregator = Aggregator::new(&rules, config.classify.example_bound);
    let mut total_commands: u64 = 0;
    let mut matched_commands: u64 = 0;

    for line in walker.by_ref() {
        let line = line?;
        total_commands += 1;

        let matches = classify::classify(&line, &rules);
        if !matches.is_empty() {
            matched_commands += 1;
        }
        aggregator.ingest(&matches)?;
    }

    info!(
        "Scanned {} lines, {} commands, {} matched, {} techniques",
        walker.raw_line_count(),
        total_commands,
        matched_commands,
        aggregator.technique_count(),
    );

    let run_report = RunReport {
        source_file: file.display().to_string(),
        generated_at: chrono::Utc::now(),
        total_lines: walker.raw_line_count(),
        total_commands,
        matched_commands,
        summaries: aggregator.finalize(),
    };

    match output {
        Some(path) => {
            let format = config
                .report
                .format
                .unwrap_or_else(|| ReportFormat::from_path(path));
            report::write_report(&run_report, path, format)?;
            println!("Report written to {}", path.display());
        }
        None => {
            print!("{}", report::render(&run_report, ReportFormat::Text)?);
        }
    }

    Ok(())
}

/// Force a dataset re-fetch, then verify it loads.
fn cmd_refresh(config_path: &Path) -> HistmapResult<()> {
    let config = load_config(config_path)?;
    let bundle = fetch::refresh_dataset(&config.dataset)?;
    let rules = RuleStore::from_bundle_str(&bundle)?;
    println!(
        "Dataset refreshed: {} techniques cached at {}",
        rules.len(),
        config.dataset.cache_path.display(),
    );
    Ok(())
}

/// Generate a default configuration file.
fn cmd_init_config(config_path: &Path) -> HistmapResult<()> {
    if config_path.exists() {
        return Err(HistmapError::Config(format!(
            "Configuration file already exists: {}. Remove it first or use a different path.",
            config_path.display()
        )));
    }

    HistmapConfig::write_default(config_path)?;
    println!("Default configuration written to: {}", config_path.display());
    println!("Key settings to configure:");
    println!("  [dataset]  - Bundle URL, cache path, expiration, offline mode");
    println!("  [classify] - example_bound: example commands kept per technique");
    println!("  [report]   - format: text, markdown, or json (default: infer)");

    Ok(())
}

fn load_config(config_path: &Path) -> HistmapResult<HistmapConfig> {
    if config_path.exists() {
        info!("Loading configuration from: {}", config_path.display());
        HistmapConfig::from_file(config_path)
    } else {
        info!("No config file found, using defaults. Run 'init-config' to generate one.");
        Ok(HistmapConfig::default())
    }
}
