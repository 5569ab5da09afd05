// # wanddnsd - WAN DDNS Daemon
//
// The wanddnsd daemon is a thin wiring layer. It is responsible for:
// 1. Reading configuration from environment variables (and `.env`)
// 2. Initializing logging and the runtime
// 3. Building the resolver, DNS client and notifier
// 4. Running the poll loop until a shutdown signal arrives
//
// All DDNS logic lives in wanddns-core.
//
// ## Configuration
//
// ### Router (IP_SOURCE=router)
// - `ROUTER_IP`: Router host, without scheme
// - `ROUTER_LOGIN_URL`: Login page path (e.g. `/login.asp`)
// - `ROUTER_STATUS_URL`: Status page path listing the WAN IP
// - `ROUTER_USERNAME` / `ROUTER_PASSWORD`: Router admin credentials
// - `WEBDRIVER_URL`: WebDriver endpoint (default `http://localhost:9515`)
//
// ### IP Source
// - `IP_SOURCE`: `router` (default) or `echo`
//
// ### Cloudflare
// - `ZONE_ID`: Zone holding the record
// - `EMAIL` / `API_KEY`: Global API key credentials
// - `DNS_RECORD_NAME`: Record to keep up to date
// - `DNS_RECORD_TYPE`: `A` (default) or `AAAA`
// - `TTL`: Record TTL in seconds, `1` for automatic (default)
//
// ### Loop and Notifications
// - `CHECK_INTERVAL`: Seconds between checks (default 300)
// - `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`: Optional Telegram bot
//
// ### Operation
// - `DDNS_MODE`: `live` (default) or `dry-run`
// - `LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export ROUTER_IP=192.168.100.1
// export ROUTER_LOGIN_URL=/login.asp
// export ROUTER_STATUS_URL=/html/bbsp/common/wan_list.asp
// export ROUTER_USERNAME=telecomadmin
// export ROUTER_PASSWORD=secret
// export ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export EMAIL=ops@example.com
// export API_KEY=your_global_api_key
// export DNS_RECORD_NAME=home.example.com
//
// wanddnsd
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use wanddns_core::config::{DEFAULT_WEBDRIVER_URL, EngineConfig};
use wanddns_core::{
    CloudflareConfig, DisabledNotifier, IpResolver, IpSourceConfig, Notifier, PollLoop,
    RecordConfig, RecordType, RouterConfig, TelegramConfig, WanDdnsConfig,
};
use wanddns_notify_telegram::TelegramNotifier;
use wanddns_provider_cloudflare::CloudflareProvider;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown, or startup aborted because the DNS record is missing
/// - 1: Configuration error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WanDdnsExitCode {
    /// Shutdown signal received
    CleanShutdown,
    /// DNS record lookup failed during startup
    StartupAborted,
    /// Configuration error
    ConfigError,
    /// Runtime error (unexpected failure)
    RuntimeError,
}

impl From<WanDdnsExitCode> for ExitCode {
    fn from(code: WanDdnsExitCode) -> Self {
        match code {
            WanDdnsExitCode::CleanShutdown | WanDdnsExitCode::StartupAborted => ExitCode::SUCCESS,
            WanDdnsExitCode::ConfigError => ExitCode::from(1),
            WanDdnsExitCode::RuntimeError => ExitCode::from(2),
        }
    }
}

/// Interval bounds for `CHECK_INTERVAL`
const MIN_INTERVAL_SECS: u64 = 10;
const MAX_INTERVAL_SECS: u64 = 86_400;

/// Application configuration, as read from the environment
struct Config {
    ip_source: String,
    router: Option<RouterConfig>,
    zone_id: String,
    email: String,
    api_key: String,
    record_name: String,
    record_type: String,
    ttl: u32,
    interval_secs: u64,
    telegram: Option<TelegramConfig>,
    mode: String,
    log_level: String,
}

impl Config {
    /// Load configuration through a variable lookup
    ///
    /// Empty values count as unset. `lookup` is `env::var` in production and
    /// a map in tests.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).with_context(|| {
                format!("{key} is required. Set it via: export {key}=... (or in .env)")
            })
        };

        let ip_source = get("IP_SOURCE").unwrap_or_else(|| "router".to_string());

        let router = if ip_source == "router" {
            Some(RouterConfig {
                host: require("ROUTER_IP")?,
                login_path: require("ROUTER_LOGIN_URL")?,
                status_path: require("ROUTER_STATUS_URL")?,
                username: require("ROUTER_USERNAME")?,
                password: require("ROUTER_PASSWORD")?,
                webdriver_url: get("WEBDRIVER_URL")
                    .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string()),
            })
        } else {
            None
        };

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        Ok(Self {
            ip_source,
            router,
            zone_id: require("ZONE_ID")?,
            email: require("EMAIL")?,
            api_key: require("API_KEY")?,
            record_name: require("DNS_RECORD_NAME")?,
            record_type: get("DNS_RECORD_TYPE").unwrap_or_else(|| "A".to_string()),
            ttl: match get("TTL") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("TTL must be a number of seconds. Got: {raw}"))?,
                None => 1,
            },
            interval_secs: match get("CHECK_INTERVAL") {
                Some(raw) => raw.parse().with_context(|| {
                    format!("CHECK_INTERVAL must be a number of seconds. Got: {raw}")
                })?,
                None => 300,
            },
            telegram,
            mode: get("DDNS_MODE").unwrap_or_else(|| "live".to_string()),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This performs validation that does not belong to the core types:
    /// - Type enumeration validation (IP source, mode, log level)
    /// - Numeric range validation
    fn validate(&self) -> Result<()> {
        match self.ip_source.as_str() {
            "router" | "echo" => {}
            _ => anyhow::bail!(
                "IP_SOURCE '{}' is not supported. Supported sources: router, echo",
                self.ip_source
            ),
        }

        match self.mode.as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&self.interval_secs) {
            anyhow::bail!(
                "CHECK_INTERVAL must be between {} and {} seconds. Got: {}",
                MIN_INTERVAL_SECS,
                MAX_INTERVAL_SECS,
                self.interval_secs
            );
        }

        parse_log_level(&self.log_level)?;
        Ok(())
    }

    /// Build and validate the core configuration
    fn to_core(&self) -> Result<WanDdnsConfig> {
        let ip_source = match &self.router {
            Some(router) => IpSourceConfig::Router(router.clone()),
            None => IpSourceConfig::default_echo(),
        };

        let record_type: RecordType = self
            .record_type
            .parse()
            .context("DNS_RECORD_TYPE is not valid")?;

        let config = WanDdnsConfig {
            ip_source,
            provider: CloudflareConfig {
                zone_id: self.zone_id.clone(),
                auth_email: self.email.clone(),
                auth_key: self.api_key.clone(),
                dry_run: self.mode == "dry-run",
            },
            record: RecordConfig::new(&self.record_name)
                .with_record_type(record_type)
                .with_ttl(self.ttl),
            notifier: self.telegram.clone(),
            engine: EngineConfig {
                interval_secs: self.interval_secs,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("ip_source", &self.ip_source)
            .field("router", &self.router)
            .field("zone_id", &self.zone_id)
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("record_name", &self.record_name)
            .field("record_type", &self.record_type)
            .field("ttl", &self.ttl)
            .field("interval_secs", &self.interval_secs)
            .field("telegram", &self.telegram)
            .field("mode", &self.mode)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Load `.env` from the working directory; a missing file is not an error
fn load_env_file() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(anyhow::anyhow!("Failed to load .env file: {err}")),
    }
}

fn main() -> ExitCode {
    if let Err(e) = load_env_file() {
        eprintln!("Configuration error: {}", e);
        return WanDdnsExitCode::ConfigError.into();
    }

    // Load configuration from environment
    let config = match Config::from_lookup(|key| env::var(key).ok()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WanDdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    let core_config = match config.validate().and_then(|()| config.to_core()) {
        Ok(core) => core,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return WanDdnsExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WanDdnsExitCode::ConfigError.into();
    }

    info!("Starting wanddnsd daemon");
    info!(
        "Configuration loaded: record={} ip_source={} mode={}",
        core_config.record.name,
        core_config.ip_source.type_name(),
        config.mode
    );

    // The loop is strictly sequential
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WanDdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(core_config)).into()
}

/// Run the daemon
async fn run_daemon(config: WanDdnsConfig) -> WanDdnsExitCode {
    let notifier: Arc<dyn Notifier> = match config.notifier {
        Some(credentials) => Arc::new(TelegramNotifier::new(Some(credentials))),
        None => {
            info!("Telegram not configured, notifications disabled");
            Arc::new(DisabledNotifier)
        }
    };

    let resolver = match build_resolver(&config.ip_source, notifier.clone()) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Failed to create IP resolver: {:#}", e);
            return WanDdnsExitCode::ConfigError;
        }
    };

    let records = match CloudflareProvider::new(&config.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create Cloudflare client: {}", e);
            return WanDdnsExitCode::ConfigError;
        }
    };

    let mut poll_loop = match PollLoop::initialize(
        resolver,
        Box::new(records),
        notifier,
        config.record,
        &config.engine,
    )
    .await
    {
        Ok(poll_loop) => poll_loop,
        Err(e) => {
            error!("Failed to start: {}", e);
            return WanDdnsExitCode::StartupAborted;
        }
    };

    info!("Daemon initialized, polling every {:?}", poll_loop.interval());

    tokio::select! {
        _ = poll_loop.run() => WanDdnsExitCode::CleanShutdown,
        signal = wait_for_shutdown() => match signal {
            Ok(name) => {
                info!("Received shutdown signal: {}", name);
                info!("Shutting down daemon");
                WanDdnsExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Shutdown error: {}", e);
                WanDdnsExitCode::RuntimeError
            }
        },
    }
}

/// Create the configured IP resolver
fn build_resolver(
    source: &IpSourceConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<Box<dyn IpResolver>> {
    match source {
        #[cfg(feature = "router")]
        IpSourceConfig::Router(router) => Ok(Box::new(
            wanddns_ip_router::RouterResolver::new(router.clone())?,
        )),
        #[cfg(feature = "echo")]
        IpSourceConfig::Echo {
            primary_url,
            fallback_url,
        } => Ok(Box::new(wanddns_ip_http::EchoServiceResolver::new(
            primary_url.clone(),
            fallback_url.clone(),
            notifier,
        )?)),
        #[allow(unreachable_patterns)]
        other => {
            let _ = notifier;
            anyhow::bail!(
                "IP source '{}' is not compiled into this build",
                other.type_name()
            )
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("ROUTER_IP", "192.168.100.1"),
            ("ROUTER_LOGIN_URL", "/login.asp"),
            ("ROUTER_STATUS_URL", "/html/bbsp/common/wan_list.asp"),
            ("ROUTER_USERNAME", "telecomadmin"),
            ("ROUTER_PASSWORD", "secret"),
            ("ZONE_ID", "023e105f4ecef8ad9ca31a8372d0c353"),
            ("EMAIL", "ops@example.com"),
            ("API_KEY", "global-api-key"),
            ("DNS_RECORD_NAME", "home.example.com"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_apply_for_optional_variables() {
        let config = load(&base_env()).unwrap();
        config.validate().unwrap();
        let core = config.to_core().unwrap();

        assert_eq!(core.ip_source.type_name(), "router");
        assert_eq!(core.record.record_type, RecordType::A);
        assert_eq!(core.record.ttl, 1);
        assert_eq!(core.engine.interval_secs, 300);
        assert!(core.notifier.is_none());
        assert!(!core.provider.dry_run);

        match core.ip_source {
            IpSourceConfig::Router(router) => {
                assert_eq!(router.webdriver_url, DEFAULT_WEBDRIVER_URL);
                assert_eq!(router.login_url(), "http://192.168.100.1/login.asp");
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn missing_required_variable_is_named() {
        let mut vars = base_env();
        vars.remove("ZONE_ID");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("ZONE_ID is required"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut vars = base_env();
        vars.insert("API_KEY", "   ");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn echo_source_does_not_need_router_settings() {
        let mut vars = base_env();
        for key in [
            "ROUTER_IP",
            "ROUTER_LOGIN_URL",
            "ROUTER_STATUS_URL",
            "ROUTER_USERNAME",
            "ROUTER_PASSWORD",
        ] {
            vars.remove(key);
        }
        vars.insert("IP_SOURCE", "echo");

        let config = load(&vars).unwrap();
        config.validate().unwrap();
        assert_eq!(config.to_core().unwrap().ip_source.type_name(), "echo");
    }

    #[test]
    fn optional_settings_are_parsed() {
        let mut vars = base_env();
        vars.insert("DNS_RECORD_TYPE", "aaaa");
        vars.insert("TTL", "120");
        vars.insert("CHECK_INTERVAL", "60");
        vars.insert("TELEGRAM_BOT_TOKEN", "123456:ABC");
        vars.insert("TELEGRAM_CHAT_ID", "42");
        vars.insert("DDNS_MODE", "dry-run");
        vars.insert("LOG_LEVEL", "DEBUG");

        let config = load(&vars).unwrap();
        config.validate().unwrap();
        let core = config.to_core().unwrap();

        assert_eq!(core.record.record_type, RecordType::Aaaa);
        assert_eq!(core.record.ttl, 120);
        assert_eq!(core.engine.interval_secs, 60);
        assert_eq!(core.notifier.unwrap().chat_id, "42");
        assert!(core.provider.dry_run);
        assert_eq!(parse_log_level(&config.log_level).unwrap(), Level::DEBUG);
    }

    #[test]
    fn telegram_needs_both_values() {
        let mut vars = base_env();
        vars.insert("TELEGRAM_BOT_TOKEN", "123456:ABC");
        assert!(load(&vars).unwrap().telegram.is_none());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for (key, value) in [
            ("CHECK_INTERVAL", "5"),
            ("CHECK_INTERVAL", "100000"),
            ("IP_SOURCE", "netlink"),
            ("DDNS_MODE", "yolo"),
            ("LOG_LEVEL", "verbose"),
        ] {
            let mut vars = base_env();
            vars.insert(key, value);
            assert!(
                load(&vars).unwrap().validate().is_err(),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_values_fail_core_validation() {
        for (key, value) in [("TTL", "30"), ("DNS_RECORD_TYPE", "CNAME")] {
            let mut vars = base_env();
            vars.insert(key, value);
            let config = load(&vars).unwrap();
            assert!(config.to_core().is_err(), "{key}={value} should be rejected");
        }
    }

    #[test]
    fn unparsable_numbers_are_config_errors() {
        let mut vars = base_env();
        vars.insert("CHECK_INTERVAL", "five minutes");
        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("CHECK_INTERVAL"));
    }

    #[test]
    fn secrets_not_exposed_in_debug() {
        let debug_str = format!("{:?}", load(&base_env()).unwrap());
        assert!(!debug_str.contains("global-api-key"));
        assert!(!debug_str.contains("secret"));
    }

    #[test]
    fn exit_codes_follow_conventions() {
        assert_eq!(ExitCode::from(WanDdnsExitCode::CleanShutdown), ExitCode::SUCCESS);
        assert_eq!(ExitCode::from(WanDdnsExitCode::StartupAborted), ExitCode::SUCCESS);
        assert_eq!(ExitCode::from(WanDdnsExitCode::ConfigError), ExitCode::from(1));
        assert_eq!(ExitCode::from(WanDdnsExitCode::RuntimeError), ExitCode::from(2));
    }
}
