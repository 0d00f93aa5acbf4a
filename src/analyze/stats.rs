// src/analyze/stats.rs
//! Per-group statistics over the titles a report mode selects.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use super::matcher::first_matching_group;
use super::mode::{ReportMode, ScopeInput};
use crate::clock::format_time_display;
use crate::config::{WordGroup, WordGroups};
use crate::ordered::OrderedMap;

/// Group label used when no word groups are configured.
pub const ALL_NEWS_KEY: &str = "All news";

/// Rank assigned to titles whose data carries no rank.
pub const MISSING_RANK: u32 = 99;

/// One rendered line's worth of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleDisplay {
    pub title: String,
    pub source_id: String,
    pub source_name: String,
    pub first_time: String,
    pub last_time: String,
    pub time_display: String,
    pub count: u32,
    pub ranks: Vec<u32>,
    pub rank_threshold: u32,
    pub url: String,
    pub mobile_url: String,
    pub is_new: bool,
}

impl TitleDisplay {
    pub fn min_rank(&self) -> u32 {
        self.ranks.iter().copied().min().unwrap_or(MISSING_RANK)
    }

    pub fn max_rank(&self) -> u32 {
        self.ranks.iter().copied().max().unwrap_or(MISSING_RANK)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatEntry {
    /// Group key.
    pub word: String,
    pub count: usize,
    pub titles: Vec<TitleDisplay>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsResult {
    /// Groups with at least one title, most populated first.
    pub stats: Vec<StatEntry>,
    /// Number of titles in the mode's scope, matched or not.
    pub total_titles: usize,
}

/// Build a display row from the ledger, falling back to the scope's own data.
pub(crate) fn title_display(
    input: &ScopeInput<'_>,
    source_id: &str,
    title: &str,
    fallback: &crate::snapshot::TitleData,
    rank_threshold: u32,
    is_new: bool,
) -> TitleDisplay {
    let entry = input.day.ledger.get(source_id, title);
    let (first_time, last_time, count) = entry
        .map(|e| (e.first_time.clone(), e.last_time.clone(), e.count))
        .unwrap_or_default();
    let mut ranks = match entry {
        Some(e) if !e.ranks.is_empty() => e.ranks.clone(),
        _ => fallback.ranks.clone(),
    };
    if ranks.is_empty() {
        ranks.push(MISSING_RANK);
    }
    let (url, mobile_url) = match entry {
        Some(e) => (e.url.clone(), e.mobile_url.clone()),
        None => (fallback.url.clone(), fallback.mobile_url.clone()),
    };

    TitleDisplay {
        title: title.to_string(),
        source_id: source_id.to_string(),
        source_name: input.day.source_name(source_id).to_string(),
        time_display: format_time_display(&first_time, &last_time),
        first_time,
        last_time,
        count: count.max(1),
        ranks,
        rank_threshold,
        url,
        mobile_url,
        is_new,
    }
}

/// Classify the mode's scope into groups. Each (source, title) is counted once,
/// under the first group it matches.
pub fn compute_stats(
    mode: ReportMode,
    input: &ScopeInput<'_>,
    groups: &WordGroups,
    rank_threshold: u32,
) -> StatsResult {
    // no groups: one catch-all group and no filtering
    let all_news = vec![WordGroup {
        group_key: ALL_NEWS_KEY.to_string(),
        ..WordGroup::default()
    }];
    let (group_list, filter_words): (&[WordGroup], &[String]) = if groups.is_empty() {
        (all_news.as_slice(), &[])
    } else {
        (groups.groups.as_slice(), groups.filter_words.as_slice())
    };

    // per group: titles bucketed by source in first-seen order
    let mut buckets: Vec<(usize, OrderedMap<Vec<TitleDisplay>>)> =
        group_list.iter().map(|_| (0, OrderedMap::new())).collect();
    let mut processed: HashSet<(&str, &str)> = HashSet::new();

    let scope = mode.scope(input);
    let total_titles = scope.len();

    for item in &scope {
        if !processed.insert((item.source_id, item.title)) {
            continue;
        }
        let Some(idx) = first_matching_group(item.title, group_list, filter_words) else {
            continue;
        };
        let row = title_display(
            input,
            item.source_id,
            item.title,
            item.data,
            rank_threshold,
            item.is_new,
        );
        let (count, by_source) = &mut buckets[idx];
        *count += 1;
        by_source
            .get_or_insert_with(item.source_id, Vec::new)
            .push(row);
    }

    let mut stats: Vec<StatEntry> = group_list
        .iter()
        .zip(buckets)
        .filter(|(_, (count, _))| *count > 0)
        .map(|(group, (count, by_source))| {
            let mut titles: Vec<TitleDisplay> = by_source
                .values()
                .flat_map(|rows| rows.iter().cloned())
                .collect();
            titles.sort_by(|a, b| {
                b.is_new
                    .cmp(&a.is_new)
                    .then_with(|| a.min_rank().cmp(&b.min_rank()))
                    .then_with(|| a.last_time.cmp(&b.last_time))
            });
            StatEntry {
                word: group.group_key.clone(),
                count,
                titles,
            }
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));

    debug!(
        mode = %mode,
        scope = total_titles,
        groups = stats.len(),
        matched = stats.iter().map(|s| s.count).sum::<usize>(),
        "computed word group stats"
    );
    StatsResult {
        stats,
        total_titles,
    }
}
