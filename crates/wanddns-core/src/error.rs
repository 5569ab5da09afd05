//! Failures shared by the resolvers, the record client and the poll loop
//!
//! Every fallible call in the workspace returns [`Result`]. The variants say
//! where a failure came from, so `PollLoop` can pick the message a user sees
//! (a missing DNS record reads differently from a broken connection).

use thiserror::Error;

/// Shorthand used by every crate in the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Why a WAN IP lookup, a Cloudflare call or a config check failed
#[derive(Error, Debug)]
pub enum Error {
    /// No WAN IP could be read (router login, status page, echo services)
    #[error("IP source error: {0}")]
    IpSource(String),

    /// A setting is missing or out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// A response body did not have the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request never completed, or came back with a status we don't map
    #[error("HTTP error: {0}")]
    Http(String),

    /// Cloudflare refused the email and key pair
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Cloudflare answered 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The DNS record to keep updated does not exist
    ///
    /// Startup aborts on this one.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The DNS provider reported a failure of its own
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Which provider answered, e.g. `cloudflare`
        provider: String,
        /// Its messages, ready to show to a user
        message: String,
    },
}

impl Error {
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Credentials were rejected
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// The DNS record is missing
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Failure reported by the named provider
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
