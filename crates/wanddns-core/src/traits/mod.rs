//! Core traits for the WAN DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpResolver`]: Discover the current WAN IP
//! - [`RecordClient`]: Look up and overwrite a DNS record via a provider API
//! - [`Notifier`]: Deliver status messages

pub mod ip_resolver;
pub mod notifier;
pub mod record_client;

pub use ip_resolver::IpResolver;
pub use notifier::{DisabledNotifier, Notifier};
pub use record_client::{RecordClient, RecordId};
