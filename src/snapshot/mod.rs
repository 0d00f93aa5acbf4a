//! Timed crawl snapshots: the plain-text files the fetch layer writes once per run.
//!
//! ```text
//! <output>/
//! └── 2025-09-06/
//!     └── txt/
//!         ├── 08h00.txt
//!         └── 09h00.txt
//! ```

pub mod parse;
pub mod store;

use crate::ordered::{OrderedMap, SourceMap};

pub use parse::{clean_title, parse_snapshot, render_snapshot, FAILED_SENTINEL};
pub use store::SnapshotStore;

/// Per-title payload of one snapshot (or of the merged day view).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitleData {
    pub ranks: Vec<u32>,
    pub url: String,
    pub mobile_url: String,
}

impl TitleData {
    pub fn new(ranks: Vec<u32>, url: impl Into<String>, mobile_url: impl Into<String>) -> Self {
        Self {
            ranks,
            url: url.into(),
            mobile_url: mobile_url.into(),
        }
    }
}

/// One crawl run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Zero-padded time-of-day id (file stem); lexical order is chronological.
    pub time: String,
    pub titles: SourceMap<TitleData>,
    pub names: OrderedMap<String>,
    pub failed_ids: Vec<String>,
}

impl Snapshot {
    pub fn new(time: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            ..Self::default()
        }
    }
}

/// `None` allows every source.
pub(crate) fn is_allowed(allow: Option<&[String]>, source_id: &str) -> bool {
    allow.map_or(true, |ids| ids.iter().any(|id| id == source_id))
}
