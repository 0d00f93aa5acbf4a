//! ledger.rs — folds a day's snapshots into per-source, per-title history.
//!
//! The ledger is never persisted; it is rebuilt from the snapshot files on
//! every run, so the merge must be a pure function of snapshot content and order.

use tracing::debug;

use crate::ordered::{OrderedMap, SourceMap};
use crate::snapshot::{is_allowed, Snapshot, TitleData};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub first_time: String,
    pub last_time: String,
    /// Number of snapshots the title appeared in.
    pub count: u32,
    /// Distinct ranks in first-seen order.
    pub ranks: Vec<u32>,
    pub url: String,
    pub mobile_url: String,
}

impl LedgerEntry {
    fn first_seen(time: &str, data: &TitleData) -> Self {
        let mut ranks = Vec::with_capacity(data.ranks.len());
        push_unseen(&mut ranks, &data.ranks);
        Self {
            first_time: time.to_string(),
            last_time: time.to_string(),
            count: 1,
            ranks,
            url: data.url.clone(),
            mobile_url: data.mobile_url.clone(),
        }
    }

    fn seen_again(&mut self, time: &str, data: &TitleData) {
        push_unseen(&mut self.ranks, &data.ranks);
        self.last_time = time.to_string();
        self.count += 1;
        if self.url.is_empty() {
            self.url = data.url.clone();
        }
        if self.mobile_url.is_empty() {
            self.mobile_url = data.mobile_url.clone();
        }
    }

    pub fn title_data(&self) -> TitleData {
        TitleData::new(self.ranks.clone(), self.url.clone(), self.mobile_url.clone())
    }
}

fn push_unseen(into: &mut Vec<u32>, ranks: &[u32]) {
    for r in ranks {
        if !into.contains(r) {
            into.push(*r);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ledger {
    pub sources: SourceMap<LedgerEntry>,
}

impl Ledger {
    pub fn is_empty(&self) -> bool {
        self.sources.values().all(OrderedMap::is_empty)
    }

    pub fn get(&self, source_id: &str, title: &str) -> Option<&LedgerEntry> {
        self.sources.get(source_id)?.get(title)
    }

    pub fn title_count(&self) -> usize {
        self.sources.values().map(OrderedMap::len).sum()
    }

    /// Latest `last_time` over every entry, i.e. the newest snapshot that touched anything.
    pub fn max_last_time(&self) -> Option<&str> {
        self.sources
            .values()
            .flat_map(|titles| titles.values())
            .map(|e| e.last_time.as_str())
            .max()
    }
}

/// Everything the merge produces for one day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedDay {
    pub ledger: Ledger,
    /// Display names, last write wins across snapshots.
    pub id_to_name: OrderedMap<String>,
    /// Per-source merged title data (ranks union, first non-empty links).
    pub titles: SourceMap<TitleData>,
    pub snapshot_count: usize,
}

impl MergedDay {
    pub fn source_name<'a>(&'a self, source_id: &'a str) -> &'a str {
        self.id_to_name
            .get(source_id)
            .map(String::as_str)
            .unwrap_or(source_id)
    }
}

/// Fold snapshots (oldest first) into a ledger, keeping only allowed sources.
pub fn merge_snapshots(snapshots: &[Snapshot], allow: Option<&[String]>) -> MergedDay {
    let mut day = MergedDay {
        snapshot_count: snapshots.len(),
        ..MergedDay::default()
    };

    for snap in snapshots {
        for (source_id, name) in snap.names.iter() {
            if is_allowed(allow, source_id) {
                day.id_to_name.insert(source_id, name.clone());
            }
        }

        for (source_id, titles) in snap.titles.iter() {
            if !is_allowed(allow, source_id) {
                continue;
            }
            let entries = day
                .ledger
                .sources
                .get_or_insert_with(source_id, OrderedMap::new);
            for (title, data) in titles.iter() {
                match entries.get_mut(title) {
                    Some(entry) => entry.seen_again(&snap.time, data),
                    None => {
                        entries.insert(title, LedgerEntry::first_seen(&snap.time, data));
                    }
                }
            }
        }
    }

    for (source_id, entries) in day.ledger.sources.iter() {
        let merged = entries
            .iter()
            .map(|(title, e)| (title.to_string(), e.title_data()))
            .collect();
        day.titles.insert(source_id, merged);
    }

    debug!(
        snapshots = day.snapshot_count,
        sources = day.ledger.sources.len(),
        titles = day.ledger.title_count(),
        "merged day snapshots"
    );
    day
}
