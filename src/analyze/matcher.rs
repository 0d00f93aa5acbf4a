// src/analyze/matcher.rs
//! Word-group matching. Case-insensitive substring tests; first matching group wins.

use crate::config::WordGroup;

fn group_matches(title_lower: &str, group: &WordGroup) -> bool {
    let required_ok = group
        .required
        .iter()
        .all(|w| title_lower.contains(&w.to_lowercase()));
    if !required_ok {
        return false;
    }
    group.normal.is_empty()
        || group
            .normal
            .iter()
            .any(|w| title_lower.contains(&w.to_lowercase()))
}

/// Index of the first group the title belongs to. Filter words veto every group.
pub fn first_matching_group(title: &str, groups: &[WordGroup], filter_words: &[String]) -> Option<usize> {
    let title_lower = title.to_lowercase();
    if filter_words
        .iter()
        .any(|f| !f.is_empty() && title_lower.contains(&f.to_lowercase()))
    {
        return None;
    }
    groups.iter().position(|g| group_matches(&title_lower, g))
}

/// With no groups configured every title matches.
pub fn matches(title: &str, groups: &[WordGroup], filter_words: &[String]) -> bool {
    groups.is_empty() || first_matching_group(title, groups, filter_words).is_some()
}
