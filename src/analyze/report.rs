// src/analyze/report.rs
//! Final report shape handed to renderers and the batch packer.

use serde::Serialize;

use super::matcher::matches;
use super::mode::{ReportMode, ScopeInput};
use super::stats::{title_display, StatEntry, TitleDisplay};
use crate::config::WordGroups;

/// New titles of one source, already filtered through the word groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTitlesSection {
    pub source_id: String,
    pub source_name: String,
    pub titles: Vec<TitleDisplay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReportData {
    pub stats: Vec<StatEntry>,
    pub failed_ids: Vec<String>,
    pub new_titles: Vec<NewTitlesSection>,
    pub total_new_count: usize,
}

impl ReportData {
    /// Nothing to list at all; the packer falls back to a placeholder.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty() && self.new_titles.is_empty() && self.failed_ids.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.stats.iter().map(|s| s.count).sum()
    }

    /// Whether this report is worth sending in the given mode.
    pub fn has_valid_content(&self, mode: ReportMode) -> bool {
        let has_matched = self.stats.iter().any(|s| s.count > 0);
        match mode {
            ReportMode::Incremental | ReportMode::Current => has_matched,
            ReportMode::Daily => has_matched || self.total_new_count > 0,
        }
    }
}

/// Assemble the report. In incremental mode everything listed is already new,
/// so the separate new-titles section is left out.
pub fn prepare_report(
    mode: ReportMode,
    input: &ScopeInput<'_>,
    stats: Vec<StatEntry>,
    failed_ids: &[String],
    groups: &WordGroups,
    rank_threshold: u32,
) -> ReportData {
    let stats: Vec<StatEntry> = stats.into_iter().filter(|s| s.count > 0).collect();

    let mut new_titles = Vec::new();
    if mode != ReportMode::Incremental {
        for (source_id, titles) in input.new_titles.sources.iter() {
            let rows: Vec<TitleDisplay> = titles
                .iter()
                .filter(|(title, _)| matches(title, &groups.groups, &groups.filter_words))
                .map(|(title, data)| title_display(input, source_id, title, data, rank_threshold, true))
                .collect();
            if !rows.is_empty() {
                new_titles.push(NewTitlesSection {
                    source_id: source_id.to_string(),
                    source_name: input.day.source_name(source_id).to_string(),
                    titles: rows,
                });
            }
        }
    }
    let total_new_count = new_titles.iter().map(|s| s.titles.len()).sum();

    ReportData {
        stats,
        failed_ids: failed_ids.to_vec(),
        new_titles,
        total_new_count,
    }
}
