// Core types for nearby device discovery and messaging

use serde::{Deserialize, Serialize};

/// Unique identifier for a nearby device, assigned by the transport
pub type DeviceId = String;

/// Connection state of a known endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Discovered,
    Connecting,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Discovered => write!(f, "Discovered"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// A nearby endpoint known to the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: DeviceId,
    pub display_name: String,
    pub state: ConnectionState,
}

/// Events delivered to the consumer over the session's event stream.
///
/// The wire shape is a tagged map with camelCase keys, so a consumer keyed
/// on the `type` field sees `deviceFound`, `deviceLost`, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NearbyEvent {
    #[serde(rename_all = "camelCase")]
    DeviceFound {
        device_id: DeviceId,
        device_name: String,
        unique_id: String,
        is_remote_device: bool,
    },
    #[serde(rename_all = "camelCase")]
    DeviceLost { device_id: DeviceId },
    #[serde(rename_all = "camelCase")]
    ConnectionSuccess {
        device_id: DeviceId,
        device_name: String,
    },
    #[serde(rename_all = "camelCase")]
    ConnectionFailed { device_id: DeviceId, error: String },
    #[serde(rename_all = "camelCase")]
    DeviceDisconnected {
        device_id: DeviceId,
        device_name: String,
    },
    #[serde(rename_all = "camelCase")]
    MessageReceived {
        device_id: DeviceId,
        device_name: String,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    PermissionsGranted { granted: bool },
}
