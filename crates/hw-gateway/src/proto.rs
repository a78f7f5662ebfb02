//! Wire protocol for the subscriber channel
//!
//! JSON messages with an `event`/`data` envelope. Shape validation is the
//! serde boundary: anything that fails to parse as a `ClientMessage` is
//! answered with an `error` event and changes no state.

use serde::{Deserialize, Serialize};

use hw_core::types::{Credentials, HostAddr, StatusSnapshot};
use hw_monitor::DesiredConfig;

/// Messages sent by a subscriber to the gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replace the subscriber's desired host set and credentials
    Configure(ConfigurePayload),
}

/// Payload of a `configure` message
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigurePayload {
    /// Hosts to watch
    pub servers: Vec<String>,
    /// Login used for every host
    pub login: String,
    /// Password used for every host
    pub password: String,
}

impl From<ConfigurePayload> for DesiredConfig {
    fn from(payload: ConfigurePayload) -> Self {
        DesiredConfig {
            hosts: payload.servers.into_iter().map(HostAddr::from).collect(),
            credentials: Credentials::new(payload.login, payload.password),
        }
    }
}

/// Messages pushed by the gateway to a subscriber
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full host→status snapshot; removed hosts are absent, not offline
    ServerStatus(StatusSnapshot),
    /// Human-readable rejection of a malformed `configure` payload
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use hw_core::types::HostStatus;

    #[test]
    fn test_configure_deserialization() {
        let json = r#"{"event":"configure","data":{"servers":["10.0.0.1","10.0.0.2"],"login":"root","password":"pw"}}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();

        let ClientMessage::Configure(payload) = message;
        assert_eq!(payload.servers, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(payload.login, "root");
        assert_eq!(payload.password, "pw");
    }

    #[test]
    fn test_configure_rejects_non_array_servers() {
        let json = r#"{"event":"configure","data":{"servers":"not-an-array","login":"root","password":"pw"}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_configure_rejects_missing_credentials() {
        let json = r#"{"event":"configure","data":{"servers":["10.0.0.1"],"login":"root"}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_configure_rejects_unknown_event() {
        let json = r#"{"event":"subscribe","data":{}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_server_status_serialization() {
        let mut snapshot = StatusSnapshot::new();
        snapshot.insert(HostAddr::from("10.0.0.1"), HostStatus::Online);
        snapshot.insert(HostAddr::from("10.0.0.2"), HostStatus::Offline);

        let json = serde_json::to_string(&ServerMessage::ServerStatus(snapshot)).unwrap();
        assert_eq!(
            json,
            r#"{"event":"server_status","data":{"10.0.0.1":"online","10.0.0.2":"offline"}}"#
        );
    }

    #[test]
    fn test_empty_snapshot_serialization() {
        let json =
            serde_json::to_string(&ServerMessage::ServerStatus(StatusSnapshot::new())).unwrap();
        assert_eq!(json, r#"{"event":"server_status","data":{}}"#);
    }

    #[test]
    fn test_error_serialization() {
        let json =
            serde_json::to_string(&ServerMessage::Error("invalid configuration".to_string()))
                .unwrap();
        assert_eq!(json, r#"{"event":"error","data":"invalid configuration"}"#);
    }

    #[test]
    fn test_payload_into_desired_config() {
        let payload = ConfigurePayload {
            servers: vec!["10.0.0.1".to_string()],
            login: "root".to_string(),
            password: "pw".to_string(),
        };

        let desired: DesiredConfig = payload.into();
        assert_eq!(desired.hosts, vec![HostAddr::from("10.0.0.1")]);
        assert_eq!(desired.credentials, Credentials::new("root", "pw"));
    }
}
