//! Core domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Address of a watched host (hostname or IP, without port)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostAddr(pub String);

impl HostAddr {
    /// Create a new host address
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Get the raw address string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HostAddr {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HostAddr {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Login credentials for a remote host.
///
/// The secret is redacted from `Debug` output so credentials can appear in
/// logs without leaking.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name
    pub login: String,
    /// Password
    pub secret: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Connectivity status of a watched host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    /// Host is unreachable or not yet connected
    Offline,
    /// Host has a live, verified session
    Online,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostStatus::Offline => write!(f, "offline"),
            HostStatus::Online => write!(f, "online"),
        }
    }
}

/// Point-in-time host→status mapping pushed to a subscriber.
///
/// Keyed by `HostAddr` ordering so serialized snapshots are deterministic.
pub type StatusSnapshot = BTreeMap<HostAddr, HostStatus>;

/// Opaque identifier for a subscriber connection, used only for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(uuid::Uuid);

impl SubscriberId {
    /// Generate a fresh subscriber id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HostStatus::Online).unwrap(),
            "\"online\""
        );
        assert_eq!(
            serde_json::to_string(&HostStatus::Offline).unwrap(),
            "\"offline\""
        );
    }

    #[test]
    fn test_snapshot_serializes_as_flat_map() {
        let mut snapshot = StatusSnapshot::new();
        snapshot.insert(HostAddr::from("10.0.0.2"), HostStatus::Offline);
        snapshot.insert(HostAddr::from("10.0.0.1"), HostStatus::Online);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"10.0.0.1":"online","10.0.0.2":"offline"}"#);
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials::new("root", "hunter2");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("root"));
        assert!(!debug.contains("hunter2"));
    }
}
