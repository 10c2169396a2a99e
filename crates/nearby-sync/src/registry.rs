// Endpoint Registry - single source of truth for known nearby endpoints

use crate::{ConnectionState, DeviceId, Endpoint};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Sentinel display name for endpoints the registry has never seen
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Delimiter between an advertised name and its disambiguating suffix
pub const NAME_DELIMITER: char = '#';

/// Authoritative mapping from endpoint id to display name and state.
///
/// Mutated only through registry operations; cleared as a unit when the
/// owning session tears down.
pub struct EndpointRegistry {
    endpoints: Arc<RwLock<HashMap<DeviceId, Endpoint>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self {
            endpoints: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Strip the disambiguating suffix from an advertised name.
    ///
    /// Remote peers may advertise as `"<name>#<timestamp>"`; only the prefix
    /// is ever shown to the consumer.
    pub fn strip_disambiguation(raw_name: &str) -> &str {
        raw_name.split(NAME_DELIMITER).next().unwrap_or(raw_name)
    }

    /// Register an endpoint under its parsed display name.
    ///
    /// Idempotent: the first-seen name is authoritative, so re-registering an
    /// existing id leaves the entry untouched and returns the stored name.
    pub async fn register(&self, id: &str, raw_name: &str) -> String {
        let mut endpoints = self.endpoints.write().await;

        if let Some(existing) = endpoints.get(id) {
            debug!("Endpoint already registered: {} ({})", id, existing.display_name);
            return existing.display_name.clone();
        }

        let display_name = Self::strip_disambiguation(raw_name).to_string();
        info!("Registered endpoint: {} ({})", id, display_name);
        endpoints.insert(
            id.to_string(),
            Endpoint {
                id: id.to_string(),
                display_name: display_name.clone(),
                state: ConnectionState::Discovered,
            },
        );

        display_name
    }

    /// Resolve an endpoint's display name; absent ids resolve to the
    /// `UNKNOWN_DEVICE` sentinel so event construction never fails.
    pub async fn lookup_name(&self, id: &str) -> String {
        let endpoints = self.endpoints.read().await;
        endpoints
            .get(id)
            .map(|e| e.display_name.clone())
            .unwrap_or_else(|| UNKNOWN_DEVICE.to_string())
    }

    /// Check whether an endpoint is already known
    pub async fn contains(&self, id: &str) -> bool {
        self.endpoints.read().await.contains_key(id)
    }

    /// Remove an endpoint; no-op when the id is absent
    pub async fn remove(&self, id: &str) {
        let mut endpoints = self.endpoints.write().await;
        if endpoints.remove(id).is_some() {
            info!("Removed endpoint: {}", id);
        } else {
            debug!("Remove for unknown endpoint ignored: {}", id);
        }
    }

    /// Update the connection state of a known endpoint
    pub async fn set_state(&self, id: &str, state: ConnectionState) {
        let mut endpoints = self.endpoints.write().await;
        if let Some(endpoint) = endpoints.get_mut(id) {
            debug!("Endpoint {} state: {} -> {}", id, endpoint.state, state);
            endpoint.state = state;
        } else {
            debug!("State update for unknown endpoint ignored: {}", id);
        }
    }

    /// Get a snapshot of a single endpoint
    pub async fn get(&self, id: &str) -> Option<Endpoint> {
        self.endpoints.read().await.get(id).cloned()
    }

    /// Get a snapshot of all known endpoints
    pub async fn all(&self) -> Vec<Endpoint> {
        self.endpoints.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.endpoints.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.endpoints.read().await.is_empty()
    }

    /// Drop every entry; used at session teardown
    pub async fn clear(&self) {
        let mut endpoints = self.endpoints.write().await;
        if !endpoints.is_empty() {
            debug!("Clearing {} endpoint(s)", endpoints.len());
        }
        endpoints.clear();
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}
