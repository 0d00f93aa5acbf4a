// src/notify/telegram.rs
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::render::{TelegramFormatter, TitleFormatter};
use super::Notifier;
use crate::config::TelegramConfig;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
/// Room kept free for the `[i/n]` label.
const LABEL_RESERVE: usize = 32;
/// Backoff stops doubling after this many steps (32s).
const MAX_BACKOFF_SHIFT: u8 = 6;

#[derive(Clone)]
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    api_base: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
    budget: usize,
    interval: Duration,
    formatter: TelegramFormatter,
}

impl TelegramNotifier {
    pub fn new(cfg: &TelegramConfig, budget: usize, interval_ms: u64) -> Self {
        Self {
            token: cfg.bot_token.clone(),
            chat_id: cfg.chat_id.clone(),
            api_base: DEFAULT_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            budget,
            interval: Duration::from_millis(interval_ms),
            formatter: TelegramFormatter,
        }
    }

    /// Point at a different Bot API host (self-hosted server or a test double).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    async fn send_one(&self, text: String) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let url = self.endpoint();

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            let failure = match res {
                Ok(rsp) => match rsp.error_for_status() {
                    Ok(rsp) => match rsp.json::<ApiReply>().await {
                        Ok(reply) if reply.ok => return Ok(()),
                        Ok(reply) => anyhow!(
                            "Telegram API rejected message: {}",
                            reply.description.unwrap_or_default()
                        ),
                        Err(e) => anyhow!("Telegram reply unreadable: {e}"),
                    },
                    Err(e) => anyhow!("Telegram HTTP error: {e}"),
                },
                Err(e) => anyhow!("Telegram request failed: {e}"),
            };

            if attempt < self.max_retries {
                debug!(attempt, error = %failure, "retrying Telegram send");
                tokio::time::sleep(backoff(attempt)).await;
                continue;
            }
            return Err(failure);
        }
    }
}

/// Delay before retrying after failed attempt number `attempt` (1-based).
fn backoff(attempt: u8) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    Duration::from_millis(500u64 << shift)
}

/// `[i/n]` marker prepended when a report spans several messages.
pub fn label_batch(index: usize, total: usize, body: &str) -> String {
    if total <= 1 {
        body.to_string()
    } else {
        format!("<b>[{}/{total}]</b>\n\n{body}", index + 1)
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn formatter(&self) -> &dyn TitleFormatter {
        &self.formatter
    }

    fn byte_budget(&self) -> usize {
        self.budget.saturating_sub(LABEL_RESERVE)
    }

    async fn send_batches(&self, _subject: &str, batches: &[String]) -> Result<()> {
        let total = batches.len();
        for (i, body) in batches.iter().enumerate() {
            if i > 0 && !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
            self.send_one(label_batch(i, total, body))
                .await
                .map_err(|e| e.context(format!("batch {}/{total}", i + 1)))?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}
