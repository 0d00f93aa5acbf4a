// src/analyze/mode.rs
//! Report modes and the title scope each one processes.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::change_detector::NewTitles;
use crate::ledger::MergedDay;
use crate::snapshot::TitleData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Only what is new since the previous snapshot.
    Incremental,
    /// Titles present in the newest snapshot, with full-day history.
    Current,
    /// Every title seen today.
    #[default]
    Daily,
}

impl ReportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportMode::Incremental => "incremental",
            ReportMode::Current => "current",
            ReportMode::Daily => "daily",
        }
    }

    /// Label stored in the push record and shown in message headers.
    pub fn report_type(self) -> &'static str {
        match self {
            ReportMode::Incremental => "Incremental update",
            ReportMode::Current => "Current ranking",
            ReportMode::Daily => "Daily summary",
        }
    }

    /// Shown when a report has nothing to list.
    pub fn empty_placeholder(self) -> &'static str {
        match self {
            ReportMode::Incremental => "Incremental mode: no matching hot topics yet",
            ReportMode::Current => "Current mode: no matching hot topics yet",
            ReportMode::Daily => "No matching hot topics yet",
        }
    }

    /// Titles this mode processes, in encounter order.
    pub fn scope<'a>(self, input: &ScopeInput<'a>) -> Vec<ScopedTitle<'a>> {
        match self {
            ReportMode::Incremental => scope_incremental(input),
            ReportMode::Current => scope_current(input),
            ReportMode::Daily => scope_daily(input),
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incremental" => Ok(ReportMode::Incremental),
            "current" => Ok(ReportMode::Current),
            "daily" => Ok(ReportMode::Daily),
            other => Err(anyhow!("unknown report mode `{other}`")),
        }
    }
}

/// Everything the scope functions read.
#[derive(Debug, Clone, Copy)]
pub struct ScopeInput<'a> {
    pub day: &'a MergedDay,
    pub new_titles: &'a NewTitles,
    /// At most one snapshot exists for today.
    pub first_snapshot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopedTitle<'a> {
    pub source_id: &'a str,
    pub title: &'a str,
    /// Data used when the ledger has no entry for this title.
    pub data: &'a TitleData,
    pub is_new: bool,
}

fn whole_day<'a>(input: &ScopeInput<'a>, all_new: bool) -> Vec<ScopedTitle<'a>> {
    let new_titles = input.new_titles;
    input
        .day
        .titles
        .iter()
        .flat_map(move |(source_id, titles)| {
            titles.iter().map(move |(title, data)| ScopedTitle {
                source_id,
                title,
                data,
                is_new: all_new || new_titles.contains(source_id, title),
            })
        })
        .collect()
}

pub fn scope_incremental<'a>(input: &ScopeInput<'a>) -> Vec<ScopedTitle<'a>> {
    if input.first_snapshot {
        return whole_day(input, true);
    }
    input
        .new_titles
        .sources
        .iter()
        .flat_map(move |(source_id, titles)| {
            titles.iter().map(move |(title, data)| ScopedTitle {
                source_id,
                title,
                data,
                is_new: true,
            })
        })
        .collect()
}

/// Sources whose latest fetch failed have no entry at the newest time and drop out.
pub fn scope_current<'a>(input: &ScopeInput<'a>) -> Vec<ScopedTitle<'a>> {
    let ledger = &input.day.ledger;
    let Some(latest) = ledger.max_last_time() else {
        return whole_day(input, false);
    };
    whole_day(input, false)
        .into_iter()
        .filter(|t| {
            ledger
                .get(t.source_id, t.title)
                .is_some_and(|e| e.last_time == latest)
        })
        .collect()
}

pub fn scope_daily<'a>(input: &ScopeInput<'a>) -> Vec<ScopedTitle<'a>> {
    whole_day(input, false)
}
