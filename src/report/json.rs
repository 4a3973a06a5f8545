//! JSON rendering.

use super::RunReport;
use crate::HistmapResult;

pub fn render(report: &RunReport) -> HistmapResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
