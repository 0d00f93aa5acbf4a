// src/analyze/mod.rs
//! Classification of the merged day against interest groups.
//!
//! Flow: [`ReportMode::scope`] picks the titles, [`compute_stats`] buckets them
//! into groups, [`prepare_report`] adds the new-titles and failure sections.

pub mod matcher;
pub mod mode;
pub mod report;
pub mod stats;

pub use matcher::{first_matching_group, matches};
pub use mode::{ReportMode, ScopeInput, ScopedTitle};
pub use report::{prepare_report, NewTitlesSection, ReportData};
pub use stats::{compute_stats, StatEntry, StatsResult, TitleDisplay, ALL_NEWS_KEY};
