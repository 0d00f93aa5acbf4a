// src/notify/render.rs
//! Per-channel title formatting.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::analyze::TitleDisplay;
use crate::snapshot::clean_title;

/// Renders one title line for a channel. Implemented by closures as well, which
/// keeps packer tests independent of any markup.
pub trait TitleFormatter: Send + Sync {
    fn format(&self, title: &TitleDisplay, show_source: bool) -> String;

    /// Escape free text (group keys, source names) embedded in section headers.
    fn escape(&self, text: &str) -> String {
        text.to_string()
    }
}

impl<F> TitleFormatter for F
where
    F: Fn(&TitleDisplay, bool) -> String + Send + Sync,
{
    fn format(&self, title: &TitleDisplay, show_source: bool) -> String {
        self(title, show_source)
    }
}

/// `[min]` or `[min - max]`, wrapped in `open`/`close` when the best rank is
/// within the threshold.
pub fn format_rank_display(ranks: &[u32], rank_threshold: u32, open: &str, close: &str) -> String {
    let (Some(min), Some(max)) = (ranks.iter().min(), ranks.iter().max()) else {
        return String::new();
    };
    let badge = if min == max {
        format!("[{min}]")
    } else {
        format!("[{min} - {max}]")
    };
    if *min <= rank_threshold {
        format!("{open}{badge}{close}")
    } else {
        badge
    }
}

/// Telegram HTML parse mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramFormatter;

impl TitleFormatter for TelegramFormatter {
    fn format(&self, t: &TitleDisplay, show_source: bool) -> String {
        let title = encode_text(&clean_title(&t.title)).into_owned();
        let link = if t.mobile_url.is_empty() { &t.url } else { &t.mobile_url };
        let linked = if link.is_empty() {
            title
        } else {
            format!("<a href=\"{}\">{title}</a>", encode_double_quoted_attribute(link))
        };

        let mut out = String::new();
        if show_source {
            out.push_str(&format!("[{}] ", encode_text(&t.source_name)));
        }
        if t.is_new {
            out.push_str("🆕 ");
        }
        out.push_str(&linked);

        let rank = format_rank_display(&t.ranks, t.rank_threshold, "<b>", "</b>");
        if !rank.is_empty() {
            out.push(' ');
            out.push_str(&rank);
        }
        if !t.time_display.is_empty() {
            out.push_str(&format!(" <code>- {}</code>", t.time_display));
        }
        if t.count > 1 {
            out.push_str(&format!(" <code>({} times)</code>", t.count));
        }
        out
    }

    fn escape(&self, text: &str) -> String {
        encode_text(text).into_owned()
    }
}

/// Markdown-ish plain text, used for e-mail bodies and logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl TitleFormatter for PlainFormatter {
    fn format(&self, t: &TitleDisplay, show_source: bool) -> String {
        let title = clean_title(&t.title);
        let link = if t.mobile_url.is_empty() { &t.url } else { &t.mobile_url };

        let mut out = String::new();
        if show_source {
            out.push_str(&format!("[{}] ", t.source_name));
        }
        if t.is_new {
            out.push_str("🆕 ");
        }
        if link.is_empty() {
            out.push_str(&title);
        } else {
            out.push_str(&format!("[{title}]({link})"));
        }

        let rank = format_rank_display(&t.ranks, t.rank_threshold, "**", "**");
        if !rank.is_empty() {
            out.push(' ');
            out.push_str(&rank);
        }
        if !t.time_display.is_empty() {
            out.push_str(&format!(" - {}", t.time_display));
        }
        if t.count > 1 {
            out.push_str(&format!(" ({} times)", t.count));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TitleDisplay {
        TitleDisplay {
            title: "Gold <surges>".into(),
            source_id: "vnx".into(),
            source_name: "VnExpress".into(),
            first_time: "08h00".into(),
            last_time: "10h00".into(),
            time_display: "[08h00 ~ 10h00]".into(),
            count: 3,
            ranks: vec![4, 2],
            rank_threshold: 3,
            url: "https://a/x?y=1&z=2".into(),
            mobile_url: String::new(),
            is_new: true,
        }
    }

    #[test]
    fn rank_badges() {
        assert_eq!(format_rank_display(&[], 5, "<b>", "</b>"), "");
        assert_eq!(format_rank_display(&[3], 5, "<b>", "</b>"), "<b>[3]</b>");
        assert_eq!(format_rank_display(&[9, 7], 5, "**", "**"), "[7 - 9]");
    }

    #[test]
    fn telegram_line_escapes_and_decorates() {
        let line = TelegramFormatter.format(&sample(), true);
        assert_eq!(
            line,
            "[VnExpress] 🆕 <a href=\"https://a/x?y=1&amp;z=2\">Gold &lt;surges&gt;</a> \
             <b>[2 - 4]</b> <code>- [08h00 ~ 10h00]</code> <code>(3 times)</code>"
        );
    }

    #[test]
    fn plain_line_without_source() {
        let mut t = sample();
        t.is_new = false;
        t.count = 1;
        t.url.clear();
        let line = PlainFormatter.format(&t, false);
        assert_eq!(line, "Gold <surges> **[2 - 4]** - [08h00 ~ 10h00]");
    }
}
