// # Telegram Notifier
//
// Sends status messages through the Telegram Bot API (`sendMessage`).
//
// ## Behaviour
//
// - ✅ One POST per message, HTML parse mode
// - ✅ 10 second request timeout
// - ✅ Never fails: every problem is logged and reported as `false`
// - ❌ NO retry, NO queue
//
// ## Security Requirements
//
// - The bot token is part of the request path; it NEVER appears in logs or
//   `Debug` output

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use wanddns_core::config::TelegramConfig;
use wanddns_core::traits::Notifier;

/// Telegram Bot API base URL
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Request timeout for `sendMessage`
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Notifier posting to a Telegram chat
///
/// Built from optional credentials: without them every `send` returns
/// `false` and nothing leaves the process.
pub struct TelegramNotifier {
    credentials: Option<TelegramConfig>,
    base_url: String,
    client: Option<reqwest::Client>,
}

impl TelegramNotifier {
    /// Create a notifier for the public Bot API
    pub fn new(credentials: Option<TelegramConfig>) -> Self {
        Self::with_base_url(credentials, TELEGRAM_API_BASE)
    }

    /// Create a notifier against a different API root
    pub fn with_base_url(credentials: Option<TelegramConfig>, base_url: impl Into<String>) -> Self {
        let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!("Failed to build Telegram HTTP client: {}", e);
                None
            }
        };

        Self {
            credentials: credentials
                .filter(|c| !c.bot_token.is_empty() && !c.chat_id.is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// True when bot credentials are present
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> bool {
        let (Some(credentials), Some(client)) = (&self.credentials, &self.client) else {
            tracing::debug!("Telegram not configured, skipping notification");
            return false;
        };

        let url = format!("{}/bot{}/sendMessage", self.base_url, credentials.bot_token);
        let payload = SendMessage {
            chat_id: &credentials.chat_id,
            text: message,
            parse_mode: "HTML",
        };

        // reqwest errors can embed the URL, which carries the token
        let response = match client.post(&url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    "Error sending Telegram message: {}",
                    e.without_url()
                );
                return false;
            }
        };

        if response.status() == reqwest::StatusCode::OK {
            return true;
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Telegram API error ({}): {}", status, body);
        false
    }
}
