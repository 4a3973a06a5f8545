//! Markdown rendering.

use super::RunReport;

pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("# MITRE ATT&CK Mapping Report\n\n");
    out.push_str(&format!("- Source file: `{}`\n", report.source_file));
    out.push_str(&format!(
        "- Generated at: {}\n",
        report.generated_at.to_rfc3339()
    ));
    out.push_str(&format!("- Total lines: {}\n", report.total_lines));
    out.push_str(&format!("- Total commands: {}\n", report.total_commands));
    out.push_str(&format!(
        "- Matched commands: {}\n\n",
        report.matched_commands
    ));

    if report.summaries.is_empty() {
        out.push_str("No techniques detected.\n");
        return out;
    }

    out.push_str("| Technique | Name | Tactic | Count | Examples |\n");
    out.push_str("|---|---|---|---:|---|\n");

    for summary in &report.summaries {
        let examples = summary
            .example_commands
            .iter()
            .map(|c| format!("`{}`", c.replace('|', "\\|")))
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            summary.technique_id,
            summary.name.replace('|', "\\|"),
            summary.tactic,
            summary.occurrence_count,
            examples,
        ));
    }

    out
}
