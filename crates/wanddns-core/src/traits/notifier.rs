use async_trait::async_trait;

/// Trait for notification channels
///
/// Delivery is best effort: no retry, no queue. `send` reports whether the
/// endpoint accepted the message but never fails, and callers must not let
/// the answer change what they do next.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send an already rendered message
    ///
    /// Returns `true` only when the endpoint acknowledged delivery.
    async fn send(&self, message: &str) -> bool;
}

/// Notifier used when no messaging credentials are configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _message: &str) -> bool {
        tracing::debug!("Notifications disabled, dropping message");
        false
    }
}
