//! Detects titles that appeared for the first time in the latest snapshot.
//!
//! The latest snapshot is compared against the union of every earlier snapshot
//! of the same day, per source, by exact title.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::ordered::{OrderedMap, SourceMap};
use crate::snapshot::{is_allowed, Snapshot, TitleData};

/// New titles keyed by source, carrying the latest snapshot's data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTitles {
    pub sources: SourceMap<TitleData>,
}

impl NewTitles {
    pub fn is_empty(&self) -> bool {
        self.sources.values().all(OrderedMap::is_empty)
    }

    pub fn total(&self) -> usize {
        self.sources.values().map(OrderedMap::len).sum()
    }

    pub fn contains(&self, source_id: &str, title: &str) -> bool {
        self.sources
            .get(source_id)
            .is_some_and(|titles| titles.contains_key(title))
    }
}

/// Fewer than two snapshots means nothing can be called new yet.
pub fn detect_new_titles(snapshots: &[Snapshot], allow: Option<&[String]>) -> NewTitles {
    let Some((latest, history)) = snapshots.split_last() else {
        return NewTitles::default();
    };
    if history.is_empty() {
        return NewTitles::default();
    }

    let mut seen: HashMap<&str, HashSet<&str>> = HashMap::new();
    for snap in history {
        for (source_id, titles) in snap.titles.iter() {
            if !is_allowed(allow, source_id) {
                continue;
            }
            seen.entry(source_id).or_default().extend(titles.keys());
        }
    }

    let mut out = NewTitles::default();
    for (source_id, titles) in latest.titles.iter() {
        if !is_allowed(allow, source_id) {
            continue;
        }
        let known = seen.get(source_id);
        let fresh: OrderedMap<TitleData> = titles
            .iter()
            .filter(|(title, _)| !known.is_some_and(|set| set.contains(title)))
            .map(|(title, data)| (title.to_string(), data.clone()))
            .collect();
        if !fresh.is_empty() {
            out.sources.insert(source_id, fresh);
        }
    }

    debug!(latest = %latest.time, new_titles = out.total(), "new-title detection finished");
    out
}
