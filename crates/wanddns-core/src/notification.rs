//! Human-readable status messages
//!
//! Messages are rendered as the small HTML subset understood by bot-style
//! messaging APIs (`<b>` plus escaped text). Values that come from the outside
//! world (provider errors, record names) are escaped before rendering.

use crate::config::RecordType;
use crate::ip::WanIp;
use chrono::{DateTime, Local};
use std::time::Duration;

/// Timestamp layout used in every message
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A status message about the updater
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The updater process started
    Started {
        record_name: String,
        interval: Duration,
        started_at: DateTime<Local>,
    },

    /// The record could not be found, the updater will exit
    StartupFailed { record_name: String },

    /// A recoverable failure
    Error { detail: String },

    /// The DNS record now points at a new IP
    Updated {
        record_name: String,
        new_ip: WanIp,
        record_type: RecordType,
        updated_at: DateTime<Local>,
    },
}

impl Notification {
    /// Convenience constructor for [`Notification::Error`]
    pub fn error(detail: impl Into<String>) -> Self {
        Notification::Error {
            detail: detail.into(),
        }
    }

    /// Render the message body
    pub fn render(&self) -> String {
        match self {
            Notification::Started {
                record_name,
                interval,
                started_at,
            } => format!(
                "🚀 <b>Cloudflare DNS Updater Started</b>\n\n\
                 <b>Domain:</b> {}\n\
                 <b>Check Interval:</b> Every {}\n\
                 <b>Start Time:</b> {}",
                escape_html(record_name),
                describe_interval(*interval),
                started_at.format(TIMESTAMP_FORMAT)
            ),
            Notification::StartupFailed { record_name } => format!(
                "❌ <b>DNS Updater Failed to Start</b>\n\n\
                 Could not find DNS record for {}.\n\
                 Please check your Cloudflare settings.",
                escape_html(record_name)
            ),
            Notification::Error { detail } => {
                format!("⚠️ <b>DNS Updater Error</b>\n{}", escape_html(detail))
            }
            Notification::Updated {
                record_name,
                new_ip,
                record_type,
                updated_at,
            } => format!(
                "✅ <b>DNS Update Successful</b>\n\n\
                 <b>Record:</b> {}\n\
                 <b>New IP:</b> {}\n\
                 <b>Type:</b> {}\n\
                 <b>Time:</b> {}",
                escape_html(record_name),
                escape_html(new_ip.as_str()),
                record_type,
                updated_at.format(TIMESTAMP_FORMAT)
            ),
        }
    }
}

/// "5 minutes", "1 minute", "90 seconds"
fn describe_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}

/// Escape the characters that carry meaning in the HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
