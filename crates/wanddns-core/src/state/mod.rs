// # Poll Loop State
//
// The only mutable state in the system: the WAN IP that was last written to
// DNS successfully. Held in memory by the poll loop, never persisted. After a
// restart the first resolved IP is always treated as a change.

use crate::ip::WanIp;
use std::fmt;

/// Last WAN IP successfully applied to the DNS record
///
/// Starts out unknown. Only [`LastKnownIp::record_applied`] moves it forward,
/// and the poll loop calls that only after the provider acknowledged an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastKnownIp {
    ip: Option<WanIp>,
}

impl LastKnownIp {
    /// Create the initial, unknown state
    pub fn unknown() -> Self {
        Self::default()
    }

    /// The last applied IP, if any
    pub fn get(&self) -> Option<&WanIp> {
        self.ip.as_ref()
    }

    /// True when `candidate` equals the last applied IP
    ///
    /// An unknown state never matches, so the first resolved IP counts as a change.
    pub fn matches(&self, candidate: &WanIp) -> bool {
        self.ip.as_ref() == Some(candidate)
    }

    /// Record that `ip` is now live in DNS
    pub fn record_applied(&mut self, ip: WanIp) {
        self.ip = Some(ip);
    }
}

impl fmt::Display for LastKnownIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ip {
            Some(ip) => write!(f, "{ip}"),
            None => f.write_str("unknown"),
        }
    }
}
