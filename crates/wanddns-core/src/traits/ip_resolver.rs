// # IP Resolver Trait
//
// Defines the capability "tell me the current public WAN IP".
//
// ## Implementations
//
// - Router web interface (headless browser): `wanddns-ip-router` crate
// - Public IP echo services: `wanddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use wanddns_core::IpResolver;
//
// let resolver = /* IpResolver implementation */;
// match resolver.resolve_wan_ip().await {
//     Ok(ip) => println!("WAN IP: {ip}"),
//     Err(e) => println!("could not resolve: {e}"),
// }
// ```

use crate::ip::WanIp;
use async_trait::async_trait;

/// Trait for public-IP resolver implementations
///
/// A call either yields the WAN IP or an error describing why it is absent.
/// The poll loop treats every error the same way ("unresolved this cycle"),
/// so implementations must not retry internally.
///
/// # Resource Scope
///
/// Anything acquired for a resolution (browser sessions, connections) must be
/// released before the call returns, on every path.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current WAN IP
    ///
    /// # Returns
    ///
    /// - `Ok(WanIp)`: The address found
    /// - `Err(Error)`: The address could not be determined this time
    async fn resolve_wan_ip(&self) -> Result<WanIp, crate::Error>;

    /// Get the resolver name (for logging)
    fn resolver_name(&self) -> &'static str;
}
