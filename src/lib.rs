//! # histmap - Core Library
//!
//! Classifies shell command history against MITRE ATT&CK techniques.
//!
//! histmap reads a shell history file line by line, tests each command
//! against a rule set of technique match patterns, groups the matches into
//! per-technique summaries, and renders a report.
//!
//! ## Design Philosophy
//! - **Read, Classify, Aggregate, Report.** Nothing else.
//! - The classification core is pure: same line, same rules, same result.
//! - An unmatched command is a normal outcome, not an error.
//! - A malformed rule dataset is fatal; histmap never runs with a silently
//!   smaller rule set.

pub mod classify;
pub mod history;
pub mod report;
pub mod rules;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for histmap.
#[derive(Error, Debug)]
pub enum HistmapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset format error: {0}")]
    DataFormat(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Dataset fetch failed: {0}")]
    Fetch(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

impl HistmapError {
    /// Attach the offending path to an IO error. Every fatal IO failure is
    /// reported to the user with the file it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type HistmapResult<T> = Result<T, HistmapError>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Top-level configuration for histmap.
///
/// Loaded from `histmap.toml` in the working directory or a path supplied
/// via CLI flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistmapConfig {
    /// ATT&CK dataset fetch and cache settings.
    pub dataset: DatasetConfig,

    /// Classification tuning knobs.
    pub classify: ClassifyConfig,

    /// Report output settings.
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// URL of the MITRE ATT&CK enterprise bundle.
    pub url: String,

    /// Where the downloaded bundle is cached on disk.
    pub cache_path: PathBuf,

    /// Cache age in days after which the bundle is re-fetched.
    pub expiration_days: i64,

    /// Never touch the network; use the cached bundle or fail.
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Maximum example commands kept per technique summary.
    /// Counts keep incrementing after the bound is reached.
    pub example_bound: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format. When absent, the format is inferred from the output
    /// file extension (falling back to plain text).
    pub format: Option<report::ReportFormat>,
}

impl Default for HistmapConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig {
                url: "https://github.com/mitre/cti/raw/master/enterprise-attack/enterprise-attack.json"
                    .to_string(),
                cache_path: PathBuf::from("./histmap-data/enterprise-attack.json"),
                expiration_days: 90,
                offline: false,
            },
            classify: ClassifyConfig { example_bound: 5 },
            report: ReportConfig { format: None },
        }
    }
}

impl HistmapConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> HistmapResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HistmapError::io(path, e))?;
        let config: HistmapConfig = toml::from_str(&content)?;
        if config.classify.example_bound == 0 {
            return Err(HistmapError::Config(
                "classify.example_bound must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Write the default configuration to a TOML file.
    pub fn write_default(path: &std::path::Path) -> HistmapResult<()> {
        let config = Self::default();
        let content =
            toml::to_string_pretty(&config).map_err(|e| HistmapError::Config(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| HistmapError::io(path, e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Core Types
// ---------------------------------------------------------------------------

/// One command from the history file.
///
/// Produced lazily by the `history` walker. A physical history line holding
/// several `;`-separated commands yields one `HistoryLine` per command, all
/// sharing the physical line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    /// The command text, trimmed of the trailing newline.
    pub raw: String,

    /// 1-based physical line number in the source file.
    pub number: u64,
}

/// One (rule, line) match produced by the classifier.
///
/// A line may produce zero, one, or many of these; techniques are not
/// mutually exclusive. At most one `Match` exists per rule per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// ATT&CK technique identifier, e.g. "T1059.004".
    pub technique_id: String,

    /// Physical line number of the matched command.
    pub line_number: u64,

    /// The first pattern (in the rule's declared order) that matched.
    pub matched_pattern: String,

    /// The raw command text, carried along for example collection.
    pub command: String,
}

/// Per-technique aggregation result.
///
/// Owned by the `Aggregator` until `finalize`, read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechniqueSummary {
    /// ATT&CK technique identifier.
    pub technique_id: String,

    /// Technique name, e.g. "Command and Scripting Interpreter".
    pub name: String,

    /// Tactic the technique belongs to, e.g. "Execution".
    pub tactic: String,

    /// Technique description from the ATT&CK dataset.
    pub description: String,

    /// How many commands matched this technique.
    pub occurrence_count: u64,

    /// First-seen matching commands, bounded by `classify.example_bound`.
    pub example_commands: Vec<String>,
}
