// # DNS Record Client Trait
//
// Defines the two provider calls the updater needs: find the record once,
// then overwrite its content whenever the WAN IP changes.
//
// ## Implementations
//
// - Cloudflare: `wanddns-provider-cloudflare` crate

use crate::config::RecordConfig;
use crate::ip::WanIp;
use async_trait::async_trait;
use std::fmt;

/// Provider-assigned identifier of a DNS record
///
/// Resolved once at startup and reused for every update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    /// Wrap a provider identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for DNS record client implementations
///
/// # Side Effects
///
/// Clients perform their API calls and nothing else. They do not notify,
/// cache, or retry; the poll loop decides what a failure means.
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// Find the identifier of the record matching `record.name` and `record.record_type`
    ///
    /// # Returns
    ///
    /// - `Ok(RecordId)`: The first matching record
    /// - `Err(Error)`: No match, or the lookup failed (transport, auth, malformed response)
    async fn lookup_record_id(&self, record: &RecordConfig) -> Result<RecordId, crate::Error>;

    /// Overwrite the record's content with `new_ip`
    ///
    /// Name, type and TTL are taken from `record`; proxying is always disabled.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider acknowledged the update
    /// - `Err(Error)`: HTTP failure, provider-reported failure, or transport error
    async fn update_record(
        &self,
        id: &RecordId,
        record: &RecordConfig,
        new_ip: &WanIp,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
