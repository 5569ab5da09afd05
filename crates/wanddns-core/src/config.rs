//! Configuration types for the WAN DDNS system
//!
//! This module defines all configuration structures used throughout the
//! workspace. Values are loaded once at startup and never change afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default WebDriver endpoint (chromedriver's default port)
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Default IP echo service returning `{"ip": "..."}`
pub const DEFAULT_ECHO_PRIMARY_URL: &str = "https://api.ipify.org?format=json";

/// Default IP echo service returning the address as plain text
pub const DEFAULT_ECHO_FALLBACK_URL: &str = "https://ident.me";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WanDdnsConfig {
    /// How the WAN IP is discovered
    pub ip_source: IpSourceConfig,

    /// DNS provider credentials
    pub provider: CloudflareConfig,

    /// The DNS record to keep up to date
    pub record: RecordConfig,

    /// Messaging credentials (notifications are skipped when absent)
    #[serde(default)]
    pub notifier: Option<TelegramConfig>,

    /// Poll loop settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl WanDdnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.ip_source.validate()?;
        self.provider.validate()?;
        self.record.validate()?;
        if let Some(notifier) = &self.notifier {
            notifier.validate()?;
        }
        self.engine.validate()?;
        Ok(())
    }
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// Log into the router's web interface and scrape its status page
    Router(RouterConfig),

    /// Ask public IP echo services
    Echo {
        /// Service answering with JSON `{"ip": "..."}`
        primary_url: String,
        /// Service answering with the address as plain text
        fallback_url: String,
    },
}

impl IpSourceConfig {
    /// Echo source pointing at the default public services
    pub fn default_echo() -> Self {
        IpSourceConfig::Echo {
            primary_url: DEFAULT_ECHO_PRIMARY_URL.to_string(),
            fallback_url: DEFAULT_ECHO_FALLBACK_URL.to_string(),
        }
    }

    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::Router(router) => router.validate(),
            IpSourceConfig::Echo {
                primary_url,
                fallback_url,
            } => {
                for url in [primary_url, fallback_url] {
                    if !url.starts_with("https://") && !url.starts_with("http://") {
                        return Err(crate::Error::config(format!(
                            "IP echo service URL must use HTTP or HTTPS: {url}"
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Short name used in logs
    pub fn type_name(&self) -> &'static str {
        match self {
            IpSourceConfig::Router(_) => "router",
            IpSourceConfig::Echo { .. } => "echo",
        }
    }
}

/// Router web interface settings
#[derive(Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Router host or IP, without scheme (e.g. "192.168.100.1")
    pub host: String,

    /// Path of the login page (e.g. "/login.asp")
    pub login_path: String,

    /// Path of the page listing the WAN IP
    pub status_path: String,

    /// Router admin user
    pub username: String,

    /// Router admin password
    pub password: String,

    /// WebDriver endpoint driving the headless browser
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

impl RouterConfig {
    /// Full URL of the login page
    pub fn login_url(&self) -> String {
        format!("http://{}{}", self.host, self.login_path)
    }

    /// Full URL of the status page
    pub fn status_url(&self) -> String {
        format!("http://{}{}", self.host, self.status_path)
    }

    /// Validate the router settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.is_empty() {
            return Err(crate::Error::config("Router host cannot be empty"));
        }
        if self.host.contains("://") {
            return Err(crate::Error::config(
                "Router host must not include a scheme",
            ));
        }
        for (name, path) in [
            ("login", &self.login_path),
            ("status", &self.status_path),
        ] {
            if !path.starts_with('/') {
                return Err(crate::Error::config(format!(
                    "Router {name} path must start with '/': {path}"
                )));
            }
        }
        if self.username.is_empty() {
            return Err(crate::Error::config("Router username cannot be empty"));
        }
        if !self.webdriver_url.starts_with("http://") && !self.webdriver_url.starts_with("https://")
        {
            return Err(crate::Error::config(format!(
                "WebDriver URL must use HTTP or HTTPS: {}",
                self.webdriver_url
            )));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the router password
impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("host", &self.host)
            .field("login_path", &self.login_path)
            .field("status_path", &self.status_path)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("webdriver_url", &self.webdriver_url)
            .finish()
    }
}

fn default_webdriver_url() -> String {
    DEFAULT_WEBDRIVER_URL.to_string()
}

/// Cloudflare API settings (global API key authentication)
#[derive(Clone, Serialize, Deserialize)]
pub struct CloudflareConfig {
    /// Zone holding the record
    pub zone_id: String,

    /// Account email sent as `X-Auth-Email`
    pub auth_email: String,

    /// Global API key sent as `X-Auth-Key`
    /// ⚠️ NEVER log this value
    pub auth_key: String,

    /// Look records up but never write them
    #[serde(default)]
    pub dry_run: bool,
}

impl CloudflareConfig {
    /// Validate the provider settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.is_empty() {
            return Err(crate::Error::config("Cloudflare zone ID cannot be empty"));
        }
        if self.auth_email.is_empty() {
            return Err(crate::Error::config("Cloudflare auth email cannot be empty"));
        }
        if self.auth_key.is_empty() {
            return Err(crate::Error::config("Cloudflare API key cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for CloudflareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareConfig")
            .field("zone_id", &self.zone_id)
            .field("auth_email", &self.auth_email)
            .field("auth_key", &"<REDACTED>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// DNS record configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// DNS record name (e.g., "home.example.com")
    pub name: String,

    /// Record type
    #[serde(default = "default_record_type")]
    pub record_type: RecordType,

    /// Time-to-live in seconds; 1 lets the provider choose
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl RecordConfig {
    /// Create a new record configuration with provider-managed TTL
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: default_record_type(),
            ttl: default_ttl(),
        }
    }

    /// Set the record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate the record settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("DNS record name cannot be empty"));
        }
        if self.name.len() > 253 {
            return Err(crate::Error::config(format!(
                "DNS record name too long: {} chars (max 253)",
                self.name.len()
            )));
        }
        if self.ttl != 1 && !(60..=86_400).contains(&self.ttl) {
            return Err(crate::Error::config(format!(
                "TTL must be 1 (automatic) or between 60 and 86400 seconds. Got: {}",
                self.ttl
            )));
        }
        Ok(())
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Wire name used by DNS providers
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::config(format!(
                "Unsupported DNS record type '{other}'. Supported types: A, AAAA"
            ))),
        }
    }
}

fn default_record_type() -> RecordType {
    RecordType::A
}

fn default_ttl() -> u32 {
    1
}

/// Telegram bot credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,

    /// Destination chat
    pub chat_id: String,
}

impl TelegramConfig {
    /// Validate the bot credentials
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.bot_token.is_empty() || self.chat_id.is_empty() {
            return Err(crate::Error::config(
                "Telegram bot token and chat ID must both be set",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds to sleep between checks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl EngineConfig {
    /// The poll interval as a `Duration`
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate the loop settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Check interval must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> RouterConfig {
        RouterConfig {
            host: "192.168.100.1".to_string(),
            login_path: "/login.asp".to_string(),
            status_path: "/html/status/waninfo.asp".to_string(),
            username: "root".to_string(),
            password: "hunter2".to_string(),
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
        }
    }

    fn config() -> WanDdnsConfig {
        WanDdnsConfig {
            ip_source: IpSourceConfig::Router(router()),
            provider: CloudflareConfig {
                zone_id: "zone".to_string(),
                auth_email: "ops@example.com".to_string(),
                auth_key: "key".to_string(),
                dry_run: false,
            },
            record: RecordConfig::new("home.example.com"),
            notifier: None,
            engine: EngineConfig::default(),
        }
    }

    #[test]
    fn router_urls_join_host_and_path() {
        let router = router();
        assert_eq!(router.login_url(), "http://192.168.100.1/login.asp");
        assert_eq!(
            router.status_url(),
            "http://192.168.100.1/html/status/waninfo.asp"
        );
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn router_host_with_scheme_is_rejected() {
        let mut cfg = config();
        let mut router = router();
        router.host = "http://192.168.100.1".to_string();
        cfg.ip_source = IpSourceConfig::Router(router);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn ttl_must_be_auto_or_in_range() {
        assert!(RecordConfig::new("a.example.com").with_ttl(1).validate().is_ok());
        assert!(RecordConfig::new("a.example.com").with_ttl(120).validate().is_ok());
        assert!(RecordConfig::new("a.example.com").with_ttl(30).validate().is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut cfg = config();
        cfg.engine.interval_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn record_type_parses_case_insensitively() {
        assert_eq!("a".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("CNAME".parse::<RecordType>().is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let cfg = config();
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<REDACTED>"));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = serde_json::json!({
            "ip_source": {
                "type": "echo",
                "primary_url": "https://a.test",
                "fallback_url": "https://b.test"
            },
            "provider": { "zone_id": "z", "auth_email": "e@x.test", "auth_key": "k" },
            "record": { "name": "home.example.com" }
        });
        let cfg: WanDdnsConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.record.record_type, RecordType::A);
        assert_eq!(cfg.record.ttl, 1);
        assert_eq!(cfg.engine.interval_secs, 300);
        assert!(cfg.notifier.is_none());
        assert_eq!(cfg.ip_source.type_name(), "echo");
    }
}
