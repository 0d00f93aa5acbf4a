//! Interest word groups.
//!
//! File format, one group per line:
//!
//! ```text
//! # comment
//! gold, oil | fed+ | rumor!
//! ```
//!
//! `|` separates categories and `,` separates words within a category. A
//! trailing `+` marks a required word, a trailing `!` a filter word, anything
//! else is a normal word. Lines without required or normal words only add
//! their filter words to the global filter list.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordGroup {
    pub required: Vec<String>,
    pub normal: Vec<String>,
    pub filter_words: Vec<String>,
    /// Label the group is reported under.
    pub group_key: String,
}

impl WordGroup {
    pub fn new(required: &[&str], normal: &[&str]) -> Self {
        let required: Vec<String> = required.iter().map(|s| s.to_string()).collect();
        let normal: Vec<String> = normal.iter().map(|s| s.to_string()).collect();
        let group_key = group_key_for(&required, &normal);
        Self {
            required,
            normal,
            filter_words: Vec::new(),
            group_key,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordGroups {
    pub groups: Vec<WordGroup>,
    /// Union of every line's filter words, first-seen order, no duplicates.
    pub filter_words: Vec<String>,
}

impl WordGroups {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn group_key_for(required: &[String], normal: &[String]) -> String {
    if normal.is_empty() {
        required.join(" ")
    } else {
        normal.join(" ")
    }
}

pub fn parse_word_groups(content: &str) -> WordGroups {
    let mut out = WordGroups::default();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut group = WordGroup::default();
        let words = line
            .split('|')
            .flat_map(|part| part.split(','))
            .map(str::trim)
            .filter(|w| !w.is_empty());
        for word in words {
            if let Some(w) = word.strip_suffix('+') {
                group.required.push(w.trim().to_string());
            } else if let Some(w) = word.strip_suffix('!') {
                group.filter_words.push(w.trim().to_string());
            } else {
                group.normal.push(word.to_string());
            }
        }
        group.required.retain(|w| !w.is_empty());
        group.filter_words.retain(|w| !w.is_empty());

        for w in &group.filter_words {
            if !out.filter_words.contains(w) {
                out.filter_words.push(w.clone());
            }
        }
        if group.required.is_empty() && group.normal.is_empty() {
            continue;
        }
        group.group_key = group_key_for(&group.required, &group.normal);
        out.groups.push(group);
    }

    out
}

/// A missing file yields no groups, which means "report everything".
pub fn load_word_groups<P: AsRef<Path>>(path: P) -> Result<WordGroups> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "word group file missing; reporting all titles");
            return Ok(WordGroups::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading word groups at {}", path.display()))
        }
    };
    let groups = parse_word_groups(&content);
    debug!(
        path = %path.display(),
        groups = groups.groups.len(),
        filter_words = groups.filter_words.len(),
        "loaded word groups"
    );
    Ok(groups)
}
