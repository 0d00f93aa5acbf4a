// src/version.rs
//! Update notice for the message footer.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `major.minor.patch`; anything else compares as `0.0.0`.
pub fn parse_version(raw: &str) -> (u32, u32, u32) {
    let parts: Vec<&str> = raw.trim().split('.').collect();
    let [major, minor, patch] = parts.as_slice() else {
        return (0, 0, 0);
    };
    match (
        major.parse::<u32>(),
        minor.parse::<u32>(),
        patch.parse::<u32>(),
    ) {
        (Ok(a), Ok(b), Ok(c)) => (a, b, c),
        _ => (0, 0, 0),
    }
}

/// Footer line announcing `remote`, only when it is strictly newer than `current`.
pub fn update_notice(current: &str, remote: &str) -> Option<String> {
    if parse_version(current) < parse_version(remote) {
        Some(format!(
            "headline-digest {} is available (running {})",
            remote.trim(),
            current.trim()
        ))
    } else {
        None
    }
}

async fn fetch_remote_version(client: &Client, url: &str) -> Result<String> {
    let body = client
        .get(url)
        .timeout(Duration::from_secs(10))
        .header(reqwest::header::CACHE_CONTROL, "no-cache")
        .send()
        .await
        .context("version check request")?
        .error_for_status()
        .context("version check status")?
        .text()
        .await
        .context("version check body")?;
    Ok(body.trim().to_string())
}

/// Fetch the published version from `url`. Failures are logged and yield no notice.
pub async fn check_for_update(url: &str) -> Option<String> {
    match fetch_remote_version(&Client::new(), url).await {
        Ok(remote) => {
            info!(current = CURRENT_VERSION, remote = %remote, "version check");
            update_notice(CURRENT_VERSION, &remote)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "version check failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_versions_only() {
        assert_eq!(parse_version(" 1.12.3\n"), (1, 12, 3));
        assert_eq!(parse_version("1.2"), (0, 0, 0));
        assert_eq!(parse_version("1.2.x"), (0, 0, 0));
        assert_eq!(parse_version("<html>"), (0, 0, 0));
    }

    #[test]
    fn notice_only_for_newer_remote() {
        assert_eq!(
            update_notice("0.1.0", "0.2.0").as_deref(),
            Some("headline-digest 0.2.0 is available (running 0.1.0)")
        );
        assert!(update_notice("0.10.0", "0.9.9").is_none());
        assert!(update_notice("1.0.0", "1.0.0").is_none());
        assert!(update_notice("1.0.0", "garbage").is_none());
        // an unparsable local version never blocks a real release
        assert!(update_notice("dev", "0.0.1").is_some());
    }
}
