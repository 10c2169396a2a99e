// Discovery Deduplicator - collapses transport re-announcements into true
// add/remove transitions

use crate::{DeviceId, EndpointRegistry, EventEmitter, NearbyEvent};
use std::sync::Arc;
use tracing::{debug, info};

/// Filters raw discovery signals against the endpoint registry.
///
/// Proximity transports re-announce stable endpoints periodically; without
/// this filter a consumer list keyed by device id would see duplicate
/// `deviceFound` entries for the same peer.
pub struct DiscoveryFilter {
    registry: Arc<EndpointRegistry>,
    events: Arc<EventEmitter>,
}

impl DiscoveryFilter {
    pub fn new(registry: Arc<EndpointRegistry>, events: Arc<EventEmitter>) -> Self {
        Self { registry, events }
    }

    /// Handle a raw "endpoint found" signal.
    ///
    /// Suppressed entirely when the endpoint is already registered; only a
    /// true first discovery produces a `deviceFound` event.
    pub async fn on_endpoint_found(&self, id: &DeviceId, raw_name: &str) {
        if self.registry.contains(id).await {
            debug!("Endpoint already known, skipping: {}", id);
            return;
        }

        let display_name = self.registry.register(id, raw_name).await;
        info!("Endpoint found: {} ({})", id, display_name);

        self.events
            .publish(NearbyEvent::DeviceFound {
                device_id: id.clone(),
                device_name: display_name,
                unique_id: id.clone(),
                is_remote_device: true,
            })
            .await;
    }

    /// Handle a raw "endpoint lost" signal.
    ///
    /// Removal is unconditional and the event is emitted even for unknown
    /// ids; losing an endpoint is never an error.
    pub async fn on_endpoint_lost(&self, id: &DeviceId) {
        info!("Endpoint lost: {}", id);
        self.registry.remove(id).await;

        self.events
            .publish(NearbyEvent::DeviceLost {
                device_id: id.clone(),
            })
            .await;
    }
}
