// src/notify/email.rs
use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::render::{TelegramFormatter, TitleFormatter};
use super::Notifier;
use crate::config::EmailConfig;

/// Port that expects TLS from the first byte; everything else upgrades via STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// One HTML mail per report; the whole report goes in a single batch.
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
    formatter: TelegramFormatter,
}

impl EmailNotifier {
    pub fn new(cfg: &EmailConfig) -> Result<Self> {
        let user = if cfg.username.trim().is_empty() {
            cfg.from.clone()
        } else {
            cfg.username.clone()
        };
        let creds = Credentials::new(user, cfg.password.clone());

        let relay = if cfg.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
        };
        let builder = relay
            .with_context(|| format!("invalid SMTP host {}", cfg.smtp_host))?;
        let mailer = builder.port(cfg.smtp_port).credentials(creds).build();

        let from = cfg
            .from
            .parse()
            .with_context(|| format!("invalid sender address {}", cfg.from))?;
        let to = parse_recipients(&cfg.to)?;

        Ok(Self {
            mailer,
            from,
            to,
            formatter: TelegramFormatter,
        })
    }
}

/// Comma-separated list; at least one address is required.
pub fn parse_recipients(raw: &str) -> Result<Vec<Mailbox>> {
    let to = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Mailbox>()
                .with_context(|| format!("invalid recipient address {s}"))
        })
        .collect::<Result<Vec<_>>>()?;
    anyhow::ensure!(!to.is_empty(), "no e-mail recipients configured");
    Ok(to)
}

/// Batches are already HTML fragments; line breaks become `<br>`.
pub fn html_body(batches: &[String]) -> String {
    let mut body = String::from("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body>\n");
    for (i, batch) in batches.iter().enumerate() {
        if i > 0 {
            body.push_str("<hr>\n");
        }
        body.push_str(&batch.replace('\n', "<br>\n"));
    }
    body.push_str("\n</body></html>\n");
    body
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    fn formatter(&self) -> &dyn TitleFormatter {
        &self.formatter
    }

    fn byte_budget(&self) -> usize {
        usize::MAX
    }

    async fn send_batches(&self, subject: &str, batches: &[String]) -> Result<()> {
        let mut msg = Message::builder().from(self.from.clone());
        for to in &self.to {
            msg = msg.to(to.clone());
        }
        let msg = msg
            .subject(subject)
            .header(header::ContentType::TEXT_HTML)
            .body(html_body(batches))
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipients_are_split_and_validated() {
        let to = parse_recipients("a@example.com, b@example.com").unwrap();
        assert_eq!(to.len(), 2);
        assert!(parse_recipients(" , ").is_err());
        assert!(parse_recipients("not an address").is_err());
    }

    #[test]
    fn body_joins_batches() {
        let body = html_body(&["one\ntwo".to_string(), "three".to_string()]);
        assert!(body.contains("one<br>\ntwo<hr>\nthree"));
    }
}
