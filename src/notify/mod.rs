// src/notify/mod.rs
//! Delivery: title rendering, batch packing, the push gate and the channels.

pub mod batch;
pub mod email;
pub mod push_gate;
pub mod render;
pub mod telegram;

use anyhow::Result;
use tracing::{info, warn};

use crate::analyze::{ReportData, ReportMode};
use crate::config::NotificationConfig;
use crate::metrics;

pub use batch::{split_into_batches, BatchFrame};
pub use email::EmailNotifier;
pub use push_gate::{GateDecision, PushGate, PushRecord};
pub use render::{format_rank_display, PlainFormatter, TelegramFormatter, TitleFormatter};
pub use telegram::TelegramNotifier;

/// One outbound channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Line formatting used when packing batches for this channel.
    fn formatter(&self) -> &dyn TitleFormatter;

    /// Maximum UTF-8 bytes per message.
    fn byte_budget(&self) -> usize;

    /// Deliver the batches in order. `subject` is used by channels that have one.
    async fn send_batches(&self, subject: &str, batches: &[String]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: String,
    pub batches: usize,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fans a report out to every configured channel. A failing channel does not
/// stop the others.
#[derive(Default)]
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Box<dyn Notifier>) -> Self {
        self.channels.push(channel);
        self
    }

    /// Channels whose settings are present in the config.
    pub fn from_config(cfg: &NotificationConfig) -> Result<Self> {
        let mut mux = Self::new();
        if let Some(tg) = &cfg.telegram {
            mux = mux.with(Box::new(TelegramNotifier::new(
                tg,
                cfg.message_batch_size,
                cfg.batch_send_interval_ms,
            )));
        }
        if let Some(email) = &cfg.email {
            mux = mux.with(Box::new(EmailNotifier::new(email)?));
        }
        Ok(mux)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub async fn dispatch(
        &self,
        report: &ReportData,
        mode: ReportMode,
        frame: &BatchFrame,
        subject: &str,
    ) -> Vec<ChannelOutcome> {
        metrics::ensure_described();
        let mut outcomes = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let batches = split_into_batches(
                report,
                mode,
                channel.formatter(),
                channel.byte_budget(),
                frame,
            );
            let name = channel.name().to_string();
            let error = match channel.send_batches(subject, &batches).await {
                Ok(()) => {
                    metrics::batches_sent(&name, batches.len());
                    info!(channel = %name, batches = batches.len(), "report delivered");
                    None
                }
                Err(e) => {
                    metrics::channel_error(&name);
                    warn!(channel = %name, error = %format!("{e:#}"), "report delivery failed");
                    Some(format!("{e:#}"))
                }
            };
            outcomes.push(ChannelOutcome {
                channel: name,
                batches: batches.len(),
                error,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct Recorder {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Notifier for Recorder {
        fn name(&self) -> &str {
            if self.fail {
                "broken"
            } else {
                "recorder"
            }
        }
        fn formatter(&self) -> &dyn TitleFormatter {
            &PlainFormatter
        }
        fn byte_budget(&self) -> usize {
            4000
        }
        async fn send_batches(&self, _subject: &str, batches: &[String]) -> Result<()> {
            if self.fail {
                return Err(anyhow!("boom"));
            }
            self.sent.lock().unwrap().extend(batches.iter().cloned());
            Ok(())
        }
    }

    #[tokio::test]
    async fn failing_channel_does_not_block_others() {
        let mux = NotifierMux::new()
            .with(Box::new(Recorder { fail: true, sent: Mutex::new(vec![]) }))
            .with(Box::new(Recorder { fail: false, sent: Mutex::new(vec![]) }));
        let frame = BatchFrame {
            generated_at: "2025-09-06 10:00:00".into(),
            notice: None,
        };
        let out = mux
            .dispatch(&ReportData::default(), ReportMode::Daily, &frame, "subject")
            .await;
        assert_eq!(out.len(), 2);
        assert!(!out[0].is_ok());
        assert_eq!(out[0].error.as_deref(), Some("boom"));
        assert!(out[1].is_ok());
        assert_eq!(out[1].batches, 1);
    }
}
