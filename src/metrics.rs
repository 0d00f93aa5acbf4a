// src/metrics.rs
//! Run counters. Without an installed recorder these are no-ops.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

/// One-time metrics registration.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_runs_total", "Pipeline runs, labelled by outcome.");
        describe_counter!(
            "digest_batches_total",
            "Messages delivered, labelled by channel."
        );
        describe_counter!(
            "digest_push_denied_total",
            "Runs with content that the push gate held back."
        );
        describe_counter!(
            "digest_channel_errors_total",
            "Report deliveries that failed, labelled by channel."
        );
    });
}

pub fn run_finished(outcome: &'static str) {
    counter!("digest_runs_total", "outcome" => outcome).increment(1);
}

pub fn batches_sent(channel: &str, n: usize) {
    counter!("digest_batches_total", "channel" => channel.to_string()).increment(n as u64);
}

pub fn push_denied() {
    counter!("digest_push_denied_total").increment(1);
}

pub fn channel_error(channel: &str) {
    counter!("digest_channel_errors_total", "channel" => channel.to_string()).increment(1);
}
