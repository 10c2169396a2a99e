// Transport Adapter seam - the contract expected from the vendor proximity SDK
// The SDK owns radio scanning, encryption and link establishment; this crate
// only orchestrates it.

use crate::{DeviceId, Result};
use async_trait::async_trait;

/// Topology hint passed to the transport when advertising or discovering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    P2pStar,
    P2pCluster,
    P2pPointToPoint,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AdvertisingOptions {
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    pub strategy: Strategy,
}

/// Asynchronous primitives provided by the underlying proximity SDK.
///
/// Every method resolves to `Ok` once the request is accepted for processing
/// by the transport, or `Err` carrying the adapter's diagnostic text.
/// Connection lifecycle outcomes arrive later as [`TransportEvent`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn start_advertising(
        &self,
        local_name: &str,
        service_id: &str,
        options: AdvertisingOptions,
    ) -> Result<()>;

    async fn stop_advertising(&self) -> Result<()>;

    async fn start_discovery(&self, service_id: &str, options: DiscoveryOptions) -> Result<()>;

    async fn stop_discovery(&self) -> Result<()>;

    /// Request an outbound connection to `target_id`, identifying the local
    /// device as `local_name`
    async fn request_connection(&self, local_name: &str, target_id: &DeviceId) -> Result<()>;

    /// Accept an inbound connection proposed by a remote peer
    async fn accept_connection(&self, id: &DeviceId) -> Result<()>;

    async fn disconnect_from_endpoint(&self, id: &DeviceId) -> Result<()>;

    async fn send_payload(&self, id: &DeviceId, payload: &[u8]) -> Result<()>;
}

/// Raw events raised by the transport from its own execution context.
///
/// All discovery, lifecycle and payload callbacks are collapsed into this one
/// surface and funneled through a single channel, so the session's dispatch
/// task is the only place that reacts to them.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A nearby endpoint was spotted while discovering
    EndpointFound { id: DeviceId, raw_name: String },
    /// A previously spotted endpoint went out of range
    EndpointLost { id: DeviceId },
    /// A remote peer proposed a connection to us
    ConnectionInitiated { id: DeviceId, raw_name: String },
    /// Terminal outcome of a connection negotiation, ours or the peer's
    ConnectionResult {
        id: DeviceId,
        result: std::result::Result<(), String>,
    },
    /// An established link was dropped
    Disconnected { id: DeviceId },
    /// An opaque byte payload arrived from a connected peer
    PayloadReceived { id: DeviceId, payload: Vec<u8> },
}
