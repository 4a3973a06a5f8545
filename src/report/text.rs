//! Plain-text rendering, also used for terminal output.

use super::RunReport;

pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    out.push_str("MITRE ATT&CK Mapping Report\n");
    out.push_str("===========================\n\n");
    out.push_str(&format!("Source file:      {}\n", report.source_file));
    out.push_str(&format!(
        "Generated at:     {}\n",
        report.generated_at.to_rfc3339()
    ));
    out.push_str(&format!("Total lines:      {}\n", report.total_lines));
    out.push_str(&format!("Total commands:   {}\n", report.total_commands));
    out.push_str(&format!("Matched commands: {}\n\n", report.matched_commands));

    if report.summaries.is_empty() {
        out.push_str("No techniques detected.\n");
        return out;
    }

    for summary in &report.summaries {
        out.push_str(&format!(
            "{} - {} [{}] ({} occurrence{})\n",
            summary.technique_id,
            summary.name,
            summary.tactic,
            summary.occurrence_count,
            if summary.occurrence_count == 1 { "" } else { "s" },
        ));
        out.push_str(&format!("  {}\n", first_sentence(&summary.description)));
        for command in &summary.example_commands {
            out.push_str(&format!("  * {}\n", command));
        }
        out.push('\n');
    }

    out
}

/// Descriptions in the ATT&CK bundle run to paragraphs; the text report
/// keeps only the first sentence.
fn first_sentence(description: &str) -> &str {
    let trimmed = description.trim();
    match trimmed.find(". ") {
        Some(end) => &trimmed[..=end],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::sample_report;

    #[test]
    fn test_render_contains_metadata_and_summaries() {
        let out = render(&sample_report());
        assert!(out.contains(".bash_history"));
        assert!(out.contains("Matched commands: 2"));
        assert!(out.contains("T1003.008"));
        assert!(out.contains("* cat /etc/shadow"));
    }

    #[test]
    fn test_empty_report_says_so() {
        let mut report = sample_report();
        report.summaries.clear();
        assert!(render(&report).contains("No techniques detected."));
    }

    #[test]
    fn test_first_sentence() {
        assert_eq!(first_sentence("One. Two. Three."), "One.");
        assert_eq!(first_sentence("No split here"), "No split here");
    }
}
