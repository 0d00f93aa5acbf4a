// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod clock;
pub mod config;
pub mod metrics;
pub mod ordered;

// Snapshot files -> day ledger -> new-title diff
pub mod change_detector;
pub mod ledger;
pub mod snapshot;

// Classification and report shaping
pub mod analyze;

// Delivery: rendering, batching, push gate, channels
pub mod notify;

pub mod pipeline;
pub mod version;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{ReportData, ReportMode};
pub use crate::config::AppConfig;
pub use crate::notify::{Notifier, NotifierMux, PushGate};
pub use crate::pipeline::{run_once, RunOutcome, RunSummary};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "HEADLINE_LOG_JSON";

/// Install the global subscriber. `RUST_LOG` wins over the default filter;
/// `HEADLINE_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("headline_digest=info,warn"));
    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialised: {e}");
    }
}
