// # wanddns-core
//
// Core library for the router WAN IP → DNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping one DNS record
// pointed at a router's public address:
// - **IpResolver**: Trait for discovering the current WAN IP
// - **RecordClient**: Trait for looking up and overwriting a DNS record
// - **Notifier**: Trait for best-effort status messages
// - **PollLoop**: Orchestrator owning the last known IP and the check cycle
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Sequential**: One cycle at a time, a sleep between cycles
// 3. **Explicit Results**: Components return values; the loop inspects them
// 4. **Library-First**: The daemon is a thin wiring layer over this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod ip;
pub mod notification;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{
    CloudflareConfig, EngineConfig, IpSourceConfig, RecordConfig, RecordType, RouterConfig,
    TelegramConfig, WanDdnsConfig,
};
pub use engine::{CycleOutcome, PollLoop};
pub use error::{Error, Result};
pub use ip::WanIp;
pub use notification::Notification;
pub use state::LastKnownIp;
pub use traits::{DisabledNotifier, IpResolver, Notifier, RecordClient, RecordId};
