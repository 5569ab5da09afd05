// # Cloudflare DNS Record Client
//
// This crate provides the Cloudflare implementation of `RecordClient`.
//
// ## Behaviour
//
// - ✅ One HTTP request per call (GET for lookup, PUT for update)
// - ✅ Global API key authentication (`X-Auth-Email` + `X-Auth-Key`)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401, 403, 404, 429, 5xx)
// - ✅ Provider-reported failures (`success: false`) surfaced with their messages
// - ✅ Dry-run mode for safe testing
// - ❌ NO retry logic (the poll interval is the retry)
// - ❌ NO notifications (owned by PollLoop)
// - ❌ NO caching of the record id (owned by PollLoop)
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
// - Construction fails if the key is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wanddns_core::config::{CloudflareConfig, RecordConfig};
use wanddns_core::traits::{RecordClient, RecordId};
use wanddns_core::{Error, Result, WanIp};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Envelope shared by every Cloudflare v4 response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

/// One entry of the `errors` array
#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

/// The part of a DNS record we read
#[derive(Debug, Deserialize)]
struct DnsRecord {
    id: String,
}

/// Body of the overwrite call
#[derive(Debug, Serialize)]
struct UpdatePayload<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
}

/// Cloudflare DNS record client
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the client will:
/// - Perform the record lookup
/// - Log the intended PUT payload
/// - **NOT** actually modify the record, and report success
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct CloudflareProvider {
    /// Zone holding the record
    zone_id: String,

    /// Account email (`X-Auth-Email`)
    auth_email: String,

    /// Global API key (`X-Auth-Key`)
    /// ⚠️ NEVER log this value
    auth_key: String,

    /// API root, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform the lookup but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("zone_id", &self.zone_id)
            .field("auth_email", &self.auth_email)
            .field("auth_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a client for the public Cloudflare API
    pub fn new(config: &CloudflareConfig) -> Result<Self> {
        Self::with_base_url(config, CLOUDFLARE_API_BASE)
    }

    /// Create a client against a different API root
    ///
    /// Mainly useful for pointing the client at a mock server.
    pub fn with_base_url(config: &CloudflareConfig, base_url: impl Into<String>) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        if config.dry_run {
            tracing::warn!("Cloudflare client running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            zone_id: config.zone_id.clone(),
            auth_email: config.auth_email.clone(),
            auth_key: config.auth_key.clone(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            dry_run: config.dry_run,
        })
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    /// Attach the authentication headers
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("X-Auth-Email", &self.auth_email)
            .header("X-Auth-Key", &self.auth_key)
            .header("Content-Type", "application/json")
    }
}

/// Map a non-success HTTP status to a typed error
///
/// A 404 means different things per endpoint, so the caller supplies it.
fn status_error(status: StatusCode, body: &str, missing: Error) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API key or insufficient permissions. Status: {status}"
        )),
        404 => missing,
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {status}"
        )),
        500..=599 => Error::provider(
            "cloudflare",
            format!("Cloudflare server error (transient): {status} - {body}"),
        ),
        code => Error::http(format!(
            "API request failed with status code {code}: {body}"
        )),
    }
}

/// Render the `errors` array of a failed response
fn describe_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details returned".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl RecordClient for CloudflareProvider {
    /// Look up the record id
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// X-Auth-Email: <email>
    /// X-Auth-Key: <key>
    /// ```
    async fn lookup_record_id(&self, record: &RecordConfig) -> Result<RecordId> {
        tracing::debug!(
            "Looking up record ID: {} (type: {})",
            record.name,
            record.record_type
        );

        let response = self
            .authorized(self.client.get(self.records_url()))
            .query(&[
                ("name", record.name.as_str()),
                ("type", record.record_type.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::http(format!("Record lookup request failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            // The collection endpoint only 404s when the zone itself is unknown
            let missing = Error::provider(
                "cloudflare",
                format!("Zone {} not found, check the zone ID", self.zone_id),
            );
            return Err(status_error(status, &body, missing));
        }

        let body: ApiResponse<Vec<DnsRecord>> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {e}")))?;

        if !body.success {
            return Err(Error::provider(
                "cloudflare",
                format!("Cloudflare API error: {}", describe_errors(&body.errors)),
            ));
        }

        let found = body
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::not_found(format!(
                    "DNS record not found: {} (type: {})",
                    record.name, record.record_type
                ))
            })?;

        tracing::debug!("Found record ID: {}", found.id);
        Ok(RecordId::new(found.id))
    }

    /// Overwrite the record content
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "1.2.3.4",
    ///   "ttl": 1,
    ///   "proxied": false
    /// }
    /// ```
    async fn update_record(
        &self,
        id: &RecordId,
        record: &RecordConfig,
        new_ip: &WanIp,
    ) -> Result<()> {
        let url = format!("{}/{}", self.records_url(), id);
        let payload = UpdatePayload {
            record_type: record.record_type.as_str(),
            name: &record.name,
            content: new_ip.as_str(),
            ttl: record.ttl,
            proxied: false,
        };

        tracing::info!(
            "Updating Cloudflare DNS record: {} -> {} ({}) [mode: {}]",
            record.name,
            new_ip,
            record.record_type,
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(());
        }

        let response = self
            .authorized(self.client.put(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("Error updating DNS record: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            let missing = Error::not_found(format!("DNS record {id} no longer exists"));
            return Err(status_error(status, &body, missing));
        }

        let body: ApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("Failed to parse response: {e}")))?;

        if !body.success {
            return Err(Error::provider(
                "cloudflare",
                format!("Cloudflare API error: {}", describe_errors(&body.errors)),
            ));
        }

        tracing::info!("DNS record updated successfully: {} -> {}", record.name, new_ip);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
