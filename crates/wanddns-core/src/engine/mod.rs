//! Core poll loop
//!
//! The PollLoop is responsible for:
//! - Announcing startup and resolving the DNS record id once
//! - Asking the IpResolver for the WAN IP on every cycle
//! - Comparing it with the last IP written to DNS
//! - Updating the record via the RecordClient when it differs
//! - Reporting outcomes through the Notifier
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────┐
//!                │   PollLoop   │── owns LastKnownIp
//!                └──────────────┘
//!                        │
//!        ┌───────────────┼───────────────┐
//!        │               │               │
//!        ▼               ▼               ▼
//! ┌─────────────┐ ┌──────────────┐ ┌─────────────┐
//! │ IpResolver  │ │ RecordClient │ │  Notifier   │
//! │ (resolve)   │ │ (update)     │ │ (report)    │
//! └─────────────┘ └──────────────┘ └─────────────┘
//! ```
//!
//! ## States
//!
//! 1. Initializing: [`PollLoop::initialize`] sends the startup message and
//!    looks the record up. A failed lookup is the only way the loop ends.
//! 2. Polling: [`PollLoop::run`] repeats [`PollLoop::run_cycle`] and sleeps
//!    for the configured interval, forever.

use crate::config::{EngineConfig, RecordConfig};
use crate::error::{Error, Result};
use crate::ip::WanIp;
use crate::notification::Notification;
use crate::state::LastKnownIp;
use crate::traits::{IpResolver, Notifier, RecordClient, RecordId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// What a single poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The IP changed and the provider accepted the new value
    Updated {
        previous_ip: Option<WanIp>,
        new_ip: WanIp,
    },

    /// The IP changed but the update was rejected or failed
    UpdateFailed { new_ip: WanIp, error: String },

    /// The IP equals the last applied one
    Unchanged { current_ip: WanIp },

    /// The resolver could not determine the IP
    Unresolved { error: String },
}

/// Core poll loop
///
/// Holds every component plus the only mutable state, the last IP that was
/// successfully written to DNS. Strictly sequential: one cycle at a time, one
/// call at a time.
pub struct PollLoop {
    /// Source of the current WAN IP
    resolver: Box<dyn IpResolver>,

    /// DNS provider client
    records: Box<dyn RecordClient>,

    /// Status message channel
    notifier: Arc<dyn Notifier>,

    /// The record being maintained
    record: RecordConfig,

    /// Identifier resolved at startup
    record_id: RecordId,

    /// Sleep between cycles
    interval: Duration,

    /// Last IP the provider acknowledged
    last_known_ip: LastKnownIp,
}

impl PollLoop {
    /// Initialize the poll loop
    ///
    /// Sends the startup notification, then resolves the record id. When the
    /// lookup fails an error notification and a "failed to start" notification
    /// are sent and the lookup error is returned; the caller is expected to exit.
    ///
    /// # Parameters
    ///
    /// - `resolver`: WAN IP resolver
    /// - `records`: DNS record client
    /// - `notifier`: Notification channel
    /// - `record`: The record to keep up to date
    /// - `engine`: Loop settings
    pub async fn initialize(
        resolver: Box<dyn IpResolver>,
        records: Box<dyn RecordClient>,
        notifier: Arc<dyn Notifier>,
        record: RecordConfig,
        engine: &EngineConfig,
    ) -> Result<Self> {
        engine.validate()?;
        record.validate()?;

        let interval = engine.interval();
        info!(
            record = %record.name,
            interval_secs = engine.interval_secs,
            resolver = resolver.resolver_name(),
            provider = records.provider_name(),
            "Starting DNS updater"
        );

        notify(
            notifier.as_ref(),
            Notification::Started {
                record_name: record.name.clone(),
                interval,
                started_at: chrono::Local::now(),
            },
        )
        .await;

        let record_id = match records.lookup_record_id(&record).await {
            Ok(id) => id,
            Err(e) => {
                error!(record = %record.name, error = %e, "Failed to look up DNS record");

                let detail = match &e {
                    Error::NotFound(_) => format!("DNS record not found for {}", record.name),
                    other => format!("Error getting DNS record ID: {other}"),
                };
                notify(notifier.as_ref(), Notification::error(detail)).await;
                notify(
                    notifier.as_ref(),
                    Notification::StartupFailed {
                        record_name: record.name.clone(),
                    },
                )
                .await;

                return Err(e);
            }
        };

        debug!(record = %record.name, record_id = %record_id, "Resolved DNS record id");

        Ok(Self {
            resolver,
            records,
            notifier,
            record,
            record_id,
            interval,
            last_known_ip: LastKnownIp::unknown(),
        })
    }

    /// Run the loop forever
    ///
    /// Each iteration runs one cycle and then sleeps for the configured
    /// interval. Failures inside a cycle are handled there; nothing ends the loop.
    pub async fn run(&mut self) {
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run a single check-compare-update cycle
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        info!("Checking IP...");

        let new_ip = match self.resolver.resolve_wan_ip().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(
                    resolver = self.resolver.resolver_name(),
                    error = %e,
                    "Could not determine public IP address"
                );
                return CycleOutcome::Unresolved {
                    error: e.to_string(),
                };
            }
        };

        if self.last_known_ip.matches(&new_ip) {
            info!("IP unchanged ({})", new_ip);
            return CycleOutcome::Unchanged { current_ip: new_ip };
        }

        info!("IP changed from {} to {}", self.last_known_ip, new_ip);

        match self
            .records
            .update_record(&self.record_id, &self.record, &new_ip)
            .await
        {
            Ok(()) => {
                info!(record = %self.record.name, "Successfully updated DNS record to {}", new_ip);
                self.notify(Notification::Updated {
                    record_name: self.record.name.clone(),
                    new_ip: new_ip.clone(),
                    record_type: self.record.record_type,
                    updated_at: chrono::Local::now(),
                })
                .await;

                let previous_ip = self.last_known_ip.get().cloned();
                self.last_known_ip.record_applied(new_ip.clone());
                CycleOutcome::Updated {
                    previous_ip,
                    new_ip,
                }
            }
            Err(e) => {
                error!(
                    record = %self.record.name,
                    provider = self.records.provider_name(),
                    error = %e,
                    "Failed to update DNS record"
                );
                self.notify(Notification::error(e.to_string())).await;
                CycleOutcome::UpdateFailed {
                    new_ip,
                    error: e.to_string(),
                }
            }
        }
    }

    /// The last IP the provider acknowledged
    pub fn last_known_ip(&self) -> &LastKnownIp {
        &self.last_known_ip
    }

    /// The record id resolved at startup
    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    /// The sleep between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn notify(&self, notification: Notification) {
        notify(self.notifier.as_ref(), notification).await;
    }
}

impl std::fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollLoop")
            .field("resolver", &self.resolver.resolver_name())
            .field("provider", &self.records.provider_name())
            .field("record", &self.record)
            .field("record_id", &self.record_id)
            .field("interval", &self.interval)
            .field("last_known_ip", &self.last_known_ip)
            .finish()
    }
}

/// Send a notification; the outcome is logged and otherwise ignored
async fn notify(notifier: &dyn Notifier, notification: Notification) {
    if !notifier.send(&notification.render()).await {
        debug!("Notification was not delivered");
    }
}
