// # WAN IP value
//
// Router firmware renders the WAN address as free text inside a status
// table, so the value is carried as text rather than `std::net::IpAddr`.
// The only shape check is "exactly three dots"; octets are not validated.
// Dates or version strings like `1.2.3.4567` pass the check as well.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns true when `text` has the coarse shape of an IPv4 address
///
/// The check counts literal `.` characters and nothing else.
pub fn looks_like_ipv4(text: &str) -> bool {
    text.matches('.').count() == 3
}

/// A public WAN IP address as reported by a resolver
///
/// Equality is exact string equality after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WanIp(String);

impl WanIp {
    /// Wrap resolver output, trimming surrounding whitespace
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    /// Wrap `text` only if it passes [`looks_like_ipv4`]
    pub fn from_ipv4_shaped(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        looks_like_ipv4(trimmed).then(|| Self(trimmed.to_string()))
    }

    /// The address as text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the value is empty after trimming
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WanIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WanIp {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
