//! Day-partitioned snapshot files on the local filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{parse_snapshot, render_snapshot, Snapshot, TitleData};
use crate::ordered::{OrderedMap, SourceMap};

const SNAPSHOT_EXT: &str = "txt";

/// Reads and writes `<root>/<day>/txt/<time>.txt`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn day_dir(&self, day: &str) -> PathBuf {
        self.root.join(day).join(SNAPSHOT_EXT)
    }

    /// Snapshot files of a day in chronological order. A missing or unreadable
    /// directory yields an empty list.
    pub fn list_day(&self, day: &str) -> Vec<PathBuf> {
        let dir = self.day_dir(day);
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "no snapshot directory for day");
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some(SNAPSHOT_EXT))
            .collect();
        files.sort();
        files
    }

    /// Load every snapshot of a day, oldest first. Unreadable files are skipped.
    pub fn load_day(&self, day: &str) -> Vec<Snapshot> {
        self.list_day(day)
            .into_iter()
            .filter_map(|path| {
                let time = path.file_stem()?.to_str()?.to_string();
                match fs::read_to_string(&path) {
                    Ok(content) => Some(parse_snapshot(&time, &content)),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable snapshot");
                        None
                    }
                }
            })
            .collect()
    }

    /// True when the day has at most one snapshot on disk.
    pub fn is_first_snapshot(&self, day: &str) -> bool {
        self.list_day(day).len() <= 1
    }

    /// Persist one crawl run and return the written path.
    pub fn write_snapshot(
        &self,
        day: &str,
        time: &str,
        results: &SourceMap<TitleData>,
        id_to_name: &OrderedMap<String>,
        failed_ids: &[String],
    ) -> Result<PathBuf> {
        let dir = self.day_dir(day);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("{time}.{SNAPSHOT_EXT}"));
        let body = render_snapshot(results, id_to_name, failed_ids);
        fs::write(&path, body).with_context(|| format!("writing snapshot {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_source(title: &str, rank: u32) -> SourceMap<TitleData> {
        let mut titles = OrderedMap::new();
        titles.insert(title, TitleData::new(vec![rank], "", ""));
        let mut results = OrderedMap::new();
        results.insert("src", titles);
        results
    }

    #[test]
    fn missing_day_is_empty_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path());
        assert!(store.load_day("2025-01-01").is_empty());
        assert!(store.is_first_snapshot("2025-01-01"));
    }

    #[test]
    fn load_day_is_chronological() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(tmp.path());
        let names = OrderedMap::new();
        store
            .write_snapshot("2025-01-01", "10h00", &one_source("late", 1), &names, &[])
            .unwrap();
        store
            .write_snapshot("2025-01-01", "08h00", &one_source("early", 2), &names, &[])
            .unwrap();
        // unrelated files are ignored
        std::fs::write(store.day_dir("2025-01-01").join("notes.md"), "x").unwrap();

        let snaps = store.load_day("2025-01-01");
        let times: Vec<&str> = snaps.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["08h00", "10h00"]);
        assert!(!store.is_first_snapshot("2025-01-01"));
    }
}
