// # IP Echo Service Resolver
//
// This crate provides an `IpResolver` backed by public "what is my IP"
// HTTP services.
//
// ## Purpose
//
// Alternative to the router resolver when no WebDriver is available, or
// when the router's web interface cannot be scraped. Selected by
// configuration; it is never chained automatically behind the router.
//
// ## Architecture
//
// Two services are asked in order:
// 1. A primary service answering with JSON `{"ip": "..."}`
// 2. A fallback service answering with the address as plain text
//
// Each failed service produces an error notification. No caching: every call
// asks the services again, so the poll loop always sees a fresh answer.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use wanddns_core::notification::Notification;
use wanddns_core::traits::{IpResolver, Notifier};
use wanddns_core::{Error, Result, WanIp};

/// Per-service request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned by the primary service
#[derive(Debug, Deserialize)]
struct EchoResponse {
    ip: String,
}

/// Resolver asking IP echo services for the public address
pub struct EchoServiceResolver {
    /// JSON service
    primary_url: String,

    /// Plain text service
    fallback_url: String,

    /// Receives one message per failed service
    notifier: Arc<dyn Notifier>,

    /// HTTP client
    client: reqwest::Client,
}

impl EchoServiceResolver {
    /// Create a new echo service resolver
    ///
    /// # Parameters
    ///
    /// - `primary_url`: service returning `{"ip": "..."}`
    ///   (e.g. "https://api.ipify.org?format=json")
    /// - `fallback_url`: service returning plain text (e.g. "https://ident.me")
    /// - `notifier`: channel for failure messages
    pub fn new(
        primary_url: impl Into<String>,
        fallback_url: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            primary_url: primary_url.into(),
            fallback_url: fallback_url.into(),
            notifier,
            client,
        })
    }

    /// Ask the JSON service
    async fn fetch_primary(&self) -> Result<WanIp> {
        let response = self
            .client
            .get(&self.primary_url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("Unexpected status: {}", response.status())));
        }

        let body: EchoResponse = response
            .json()
            .await
            .map_err(|e| Error::ip_source(format!("Malformed response: {e}")))?;

        non_empty(WanIp::new(body.ip))
    }

    /// Ask the plain text service
    async fn fetch_fallback(&self) -> Result<WanIp> {
        let response = self
            .client
            .get(&self.fallback_url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("Unexpected status: {}", response.status())));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {e}")))?;

        non_empty(WanIp::new(text))
    }

    async fn report(&self, detail: String) {
        tracing::warn!("{}", detail);
        if !self.notifier.send(&Notification::error(detail).render()).await {
            tracing::debug!("Failure notification was not delivered");
        }
    }
}

fn non_empty(ip: WanIp) -> Result<WanIp> {
    if ip.is_empty() {
        return Err(Error::ip_source("Service returned an empty address"));
    }
    Ok(ip)
}

#[async_trait]
impl IpResolver for EchoServiceResolver {
    async fn resolve_wan_ip(&self) -> Result<WanIp> {
        match self.fetch_primary().await {
            Ok(ip) => {
                tracing::debug!(service = %self.primary_url, "Public IP: {}", ip);
                return Ok(ip);
            }
            Err(e) => self.report(format!("Error getting public IP: {e}")).await,
        }

        match self.fetch_fallback().await {
            Ok(ip) => {
                tracing::debug!(service = %self.fallback_url, "Public IP: {}", ip);
                Ok(ip)
            }
            Err(e) => {
                self.report(format!(
                    "Error getting public IP from fallback service: {e}"
                ))
                .await;
                Err(Error::ip_source("All IP echo services failed"))
            }
        }
    }

    fn resolver_name(&self) -> &'static str {
        "echo"
    }
}
