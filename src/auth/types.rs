//! Domain types exchanged with the portal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The authentication path used when talking to the portal.
///
/// `Auto` lets the provider probe for a working path; the other three pin one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    #[default]
    Auto,
    Net,
    Auth4,
    Auth6,
}

impl ConnectionMode {
    pub const ALL: [ConnectionMode; 4] = [
        ConnectionMode::Auto,
        ConnectionMode::Net,
        ConnectionMode::Auth4,
        ConnectionMode::Auth6,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionMode::Auto => "auto",
            ConnectionMode::Net => "net",
            ConnectionMode::Auth4 => "auth4",
            ConnectionMode::Auth6 => "auth6",
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown connection mode: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for ConnectionMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ConnectionMode::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseModeError(s.to_string()))
    }
}

/// Usage report of the authenticated session.
///
/// Produced whole by a flux query and replaced whole by the next one.
/// The default value (empty username, zero counters) means "not logged in".
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetFlux {
    pub username: String,
    pub flux_bytes: u64,
    pub online_time: Duration,
    pub balance: f64,
}

impl NetFlux {
    pub fn is_empty(&self) -> bool {
        self.username.is_empty()
    }

    /// Overlays a cheap online query, keeping the user and traffic counters.
    pub fn with_online(&self, online: &OnlineInfo) -> NetFlux {
        NetFlux {
            username: self.username.clone(),
            flux_bytes: self.flux_bytes,
            online_time: online.online_time,
            balance: online.balance,
        }
    }
}

/// Result of the lighter "online" query: only time and balance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnlineInfo {
    pub online_time: Duration,
    pub balance: f64,
}
