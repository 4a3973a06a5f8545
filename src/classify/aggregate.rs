//! # Aggregator
//!
//! Folds per-line matches into per-technique summaries: an occurrence
//! count and a bounded list of example commands, created lazily on first
//! occurrence with metadata looked up from the rule store.
//!
//! `finalize` consumes the aggregator, so "finalize twice" and "ingest
//! after finalize" are compile errors rather than runtime states. The one
//! misuse ownership cannot catch - a match whose technique id the store
//! does not know - fails with `InvalidState`.

use std::collections::HashMap;

use crate::rules::RuleStore;
use crate::{HistmapError, HistmapResult, Match, TechniqueSummary};

pub struct Aggregator<'a> {
    store: &'a RuleStore,
    summaries: HashMap<String, TechniqueSummary>,
    example_bound: usize,
}

impl<'a> Aggregator<'a> {
    /// # Arguments
    /// * `store` - Rule store for tactic/description lookup.
    /// * `example_bound` - Maximum example commands kept per technique.
    pub fn new(store: &'a RuleStore, example_bound: usize) -> Self {
        Self {
            store,
            summaries: HashMap::new(),
            example_bound,
        }
    }

    /// Ingest one line's match set.
    ///
    /// Each match increments its technique's occurrence count. The command
    /// text is appended to the examples only while the bound has room;
    /// after that, examples are dropped silently and only the count moves.
    pub fn ingest(&mut self, matches: &[Match]) -> HistmapResult<()> {
        for m in matches {
            let rule = self.store.get(&m.technique_id).ok_or_else(|| {
                HistmapError::InvalidState(format!(
                    "ingested match for technique {} unknown to the rule store",
                    m.technique_id
                ))
            })?;

            let summary = self
                .summaries
                .entry(m.technique_id.clone())
                .or_insert_with(|| TechniqueSummary {
                    technique_id: rule.technique_id.clone(),
                    name: rule.name.clone(),
                    tactic: rule.tactic.clone(),
                    description: rule.description.clone(),
                    occurrence_count: 0,
                    example_commands: Vec::new(),
                });

            summary.occurrence_count += 1;
            if summary.example_commands.len() < self.example_bound {
                summary.example_commands.push(m.command.clone());
            }
        }
        Ok(())
    }

    /// Number of distinct techniques seen so far.
    pub fn technique_count(&self) -> usize {
        self.summaries.len()
    }

    /// Produce the final summaries, ordered by descending occurrence
    /// count, ties broken by ascending technique id.
    pub fn finalize(self) -> Vec<TechniqueSummary> {
        let mut summaries: Vec<TechniqueSummary> = self.summaries.into_values().collect();
        summaries.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then_with(|| a.technique_id.cmp(&b.technique_id))
        });
        summaries
    }
}
