//! Rule store: the mapping from match signatures to ATT&CK techniques.
//!
//! Built once at startup by merging two inputs:
//! - the MITRE ATT&CK enterprise bundle (technique ids, names, tactics,
//!   descriptions), decoded and validated by [`dataset`];
//! - this tool's own match-pattern annotations ([`patterns`]), since
//!   upstream ATT&CK data carries no command-pattern field.
//!
//! Loading fails with `DataFormat` on any malformed entry. It never
//! produces a silently smaller rule set; a false "no techniques detected"
//! report is worse than no report.

pub mod dataset;
pub mod fetch;
pub mod patterns;

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{HistmapError, HistmapResult};
use dataset::TechniqueCatalog;

/// ATT&CK identifier format: `T####` or `T####.###`.
static RE_TECHNIQUE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T\d{4}(\.\d{3})?$").expect("regex"));

/// Returns true if `id` is a well-formed ATT&CK technique identifier.
pub fn is_valid_technique_id(id: &str) -> bool {
    RE_TECHNIQUE_ID.is_match(id)
}

// ---------------------------------------------------------------------------
// Patterns and rules
// ---------------------------------------------------------------------------

/// How a pattern's text is tested against a command line.
#[derive(Debug, Clone)]
enum PatternMatcher {
    /// Case-insensitive substring. Holds the lowercased pattern text.
    Literal(String),

    /// Regex compiled case-insensitive, matched anywhere in the line.
    Regex(Regex),
}

/// One match signature within a rule.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    /// The pattern text as declared in the annotation table.
    text: String,
    matcher: PatternMatcher,
}

impl MatchPattern {
    fn literal(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matcher: PatternMatcher::Literal(text.to_lowercase()),
        }
    }

    fn regex(text: &str) -> HistmapResult<Self> {
        let compiled = RegexBuilder::new(text)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                HistmapError::DataFormat(format!("invalid match pattern regex {:?}: {}", text, e))
            })?;
        Ok(Self {
            text: text.to_string(),
            matcher: PatternMatcher::Regex(compiled),
        })
    }

    /// The pattern text as declared, recorded in `Match::matched_pattern`.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Test this pattern against a line. `line_lower` must be the
    /// lowercased `line`; the caller lowers once per line, not per pattern.
    pub fn matches(&self, line: &str, line_lower: &str) -> bool {
        match &self.matcher {
            PatternMatcher::Literal(needle) => line_lower.contains(needle.as_str()),
            PatternMatcher::Regex(re) => re.is_match(line),
        }
    }
}

/// A technique with its ordered match signatures. Immutable after load.
#[derive(Debug, Clone)]
pub struct TechniqueRule {
    /// ATT&CK identifier, validated against `T####` / `T####.###`.
    pub technique_id: String,

    /// Technique name from the ATT&CK bundle.
    pub name: String,

    /// Tactic the technique belongs to.
    pub tactic: String,

    /// Description from the ATT&CK bundle.
    pub description: String,

    /// Patterns in declared order. Order is the tie-break: the first
    /// pattern that matches a line is the one recorded.
    pub patterns: Vec<MatchPattern>,
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// Pattern text plus how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSpec {
    Literal(String),
    Regex(String),
}

/// Hand-authored match patterns for one technique, merged with the ATT&CK
/// bundle at load time. Declaration order across annotations is the rule
/// evaluation order.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub technique_id: String,
    pub patterns: Vec<PatternSpec>,
}

impl Annotation {
    pub fn new(technique_id: &str, patterns: Vec<PatternSpec>) -> Self {
        Self {
            technique_id: technique_id.to_string(),
            patterns,
        }
    }
}

// ---------------------------------------------------------------------------
// RuleStore
// ---------------------------------------------------------------------------

/// The loaded, immutable rule set.
#[derive(Debug)]
pub struct RuleStore {
    rules: Vec<TechniqueRule>,
    by_id: HashMap<String, usize>,
}

impl RuleStore {
    /// Build the rule store from a raw ATT&CK bundle and the built-in
    /// pattern annotation table.
    pub fn from_bundle_str(bundle_json: &str) -> HistmapResult<Self> {
        let catalog = dataset::parse_bundle(bundle_json)?;
        Self::load(&catalog, &patterns::builtin_annotations())
    }

    /// Merge a technique catalog with pattern annotations into rules.
    ///
    /// Fails with `DataFormat` when an annotation carries a malformed
    /// technique id, an empty pattern list, or an uncompilable regex, or
    /// when the merge yields no rules at all. An annotation whose id is
    /// absent from the catalog still yields a rule with placeholder
    /// metadata, so hand-authored patterns keep working when the bundle
    /// lags behind them.
    pub fn load(catalog: &TechniqueCatalog, annotations: &[Annotation]) -> HistmapResult<Self> {
        let mut rules = Vec::with_capacity(annotations.len());
        let mut by_id = HashMap::with_capacity(annotations.len());

        for annotation in annotations {
            if !is_valid_technique_id(&annotation.technique_id) {
                return Err(HistmapError::DataFormat(format!(
                    "annotation has malformed technique id {:?}",
                    annotation.technique_id
                )));
            }
            if annotation.patterns.is_empty() {
                return Err(HistmapError::DataFormat(format!(
                    "annotation for {} has no match patterns",
                    annotation.technique_id
                )));
            }
            if by_id.contains_key(&annotation.technique_id) {
                return Err(HistmapError::DataFormat(format!(
                    "duplicate annotation for technique {}",
                    annotation.technique_id
                )));
            }

            let mut compiled = Vec::with_capacity(annotation.patterns.len());
            for spec in &annotation.patterns {
                compiled.push(match spec {
                    PatternSpec::Literal(text) => MatchPattern::literal(text),
                    PatternSpec::Regex(text) => MatchPattern::regex(text)?,
                });
            }

            let rule = match catalog.get(&annotation.technique_id) {
                Some(meta) => TechniqueRule {
                    technique_id: annotation.technique_id.clone(),
                    name: meta.name.clone(),
                    tactic: meta.tactic.clone(),
                    description: meta.description.clone(),
                    patterns: compiled,
                },
                None => {
                    log::warn!(
                        "Technique {} has patterns but no bundle entry, using placeholders",
                        annotation.technique_id,
                    );
                    TechniqueRule {
                        technique_id: annotation.technique_id.clone(),
                        name: "Unknown Technique".to_string(),
                        tactic: "Unknown".to_string(),
                        description: "No description available.".to_string(),
                        patterns: compiled,
                    }
                }
            };

            by_id.insert(rule.technique_id.clone(), rules.len());
            rules.push(rule);
        }

        if rules.is_empty() {
            return Err(HistmapError::DataFormat(
                "rule set is empty after merge; refusing to classify with no rules".to_string(),
            ));
        }

        Ok(Self { rules, by_id })
    }

    /// All rules in declaration order. The classifier tests every rule
    /// against every line; the set is small enough that no index is needed.
    pub fn rules(&self) -> &[TechniqueRule] {
        &self.rules
    }

    /// Look up a rule by technique id (for summary metadata).
    pub fn get(&self, technique_id: &str) -> Option<&TechniqueRule> {
        self.by_id.get(technique_id).map(|&i| &self.rules[i])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
