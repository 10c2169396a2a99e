// Connection Negotiator - serializes per-endpoint connection attempts and
// retries request failures once with a disambiguated local identity

use crate::transport::{DiscoveryOptions, Transport};
use crate::{ConnectionState, DeviceId, EndpointRegistry, NearbyError, Result, NAME_DELIMITER};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Settle time between stopping discovery and issuing a connection request
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 500;

/// Settle time before restarting discovery after a terminal failure
pub const DEFAULT_DISCOVERY_RESTART_DELAY_MS: u64 = 1000;

/// Configuration resolved once at session start
#[derive(Debug, Clone)]
pub struct NegotiatorConfig {
    /// Name this device advertises when requesting connections
    pub device_name: String,
    /// Service id used when restarting discovery
    pub service_id: String,
    /// Whether the platform supports the disambiguated-identity retry path
    pub supports_identity_retry: bool,
    pub connect_delay: Duration,
    pub discovery_restart_delay: Duration,
    pub discovery_options: DiscoveryOptions,
}

impl NegotiatorConfig {
    pub fn new(device_name: impl Into<String>, service_id: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            service_id: service_id.into(),
            supports_identity_retry: true,
            connect_delay: Duration::from_millis(DEFAULT_CONNECT_DELAY_MS),
            discovery_restart_delay: Duration::from_millis(DEFAULT_DISCOVERY_RESTART_DELAY_MS),
            discovery_options: DiscoveryOptions::default(),
        }
    }
}

/// Drives per-endpoint connection attempts against the transport.
///
/// The pending set guarantees at most one outstanding negotiation per
/// endpoint id, covering the primary request and its single retry. A second
/// `connect` for a pending id is rejected, never queued.
pub struct ConnectionNegotiator {
    transport: Arc<dyn Transport>,
    registry: Arc<EndpointRegistry>,
    pending: Arc<RwLock<HashSet<DeviceId>>>,
    /// Shared with the owning session: whether discovery is currently
    /// running on the radio. Suspending discovery for a connection attempt
    /// and the scheduled restart both keep it in step with the transport.
    discovering: Arc<RwLock<bool>>,
    config: NegotiatorConfig,
}

impl ConnectionNegotiator {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<EndpointRegistry>,
        discovering: Arc<RwLock<bool>>,
        config: NegotiatorConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            pending: Arc::new(RwLock::new(HashSet::new())),
            discovering,
            config,
        }
    }

    /// Negotiate an outbound connection to `id`.
    ///
    /// Success here means the transport accepted the request for processing;
    /// the lifecycle outcome (peer accepted or refused) arrives later through
    /// the transport event stream.
    pub async fn connect(&self, id: &DeviceId) -> Result<bool> {
        if id.is_empty() {
            return Err(NearbyError::ConnectionError(
                "device id must not be empty".to_string(),
            ));
        }

        {
            let mut pending = self.pending.write().await;
            if !pending.insert(id.clone()) {
                warn!("Already attempting to connect to: {}", id);
                return Err(NearbyError::AlreadyConnecting(id.clone()));
            }
        }

        info!("Connecting to endpoint: {}", id);
        self.registry.set_state(id, ConnectionState::Connecting).await;

        // Discovery and connection negotiation must not share the radio:
        // always suspend discovery first, restart it after terminal failure.
        // The shared flag goes down with it so a later consumer
        // `start_discovery` reaches the transport instead of no-opping.
        {
            let mut discovering = self.discovering.write().await;
            if let Err(e) = self.transport.stop_discovery().await {
                debug!("Stop discovery before connect: {}", e);
            }
            *discovering = false;
        }
        sleep(self.config.connect_delay).await;

        match self
            .transport
            .request_connection(&self.config.device_name, id)
            .await
        {
            Ok(()) => {
                debug!("Connection request accepted for: {}", id);
                self.remove_pending(id).await;
                Ok(true)
            }
            Err(e) => {
                warn!("Connection request failed for {}: {}", id, e);
                if self.config.supports_identity_retry {
                    self.retry_with_disambiguated_name(id).await
                } else {
                    self.remove_pending(id).await;
                    self.schedule_discovery_restart();
                    Err(NearbyError::ConnectionFailed(e.to_string()))
                }
            }
        }
    }

    /// One bounded retry for a failed request.
    ///
    /// Some SDK versions keep a previously used identity string "in use"
    /// after a failed request; a fresh `name#<millis>` suffix defeats the
    /// collision. Exactly one retry, never more.
    async fn retry_with_disambiguated_name(&self, id: &DeviceId) -> Result<bool> {
        sleep(self.config.connect_delay).await;

        let retry_name = format!(
            "{}{}{}",
            self.config.device_name,
            NAME_DELIMITER,
            Utc::now().timestamp_millis()
        );
        info!("Retrying connection to {} as {}", id, retry_name);

        let outcome = self.transport.request_connection(&retry_name, id).await;
        self.remove_pending(id).await;

        match outcome {
            Ok(()) => {
                debug!("Retry connection request accepted for: {}", id);
                Ok(true)
            }
            Err(e) => {
                warn!("Retry connection request failed for {}: {}", id, e);
                self.schedule_discovery_restart();
                Err(NearbyError::ConnectionFailed(e.to_string()))
            }
        }
    }

    /// Restart discovery after a settle delay so the session stays usable
    /// without manual recovery. Scheduled, never awaited by the caller.
    ///
    /// The restart stands down if discovery came back in the meantime
    /// (the consumer re-armed it), so the radio never sees a double start.
    pub(crate) fn schedule_discovery_restart(&self) {
        let transport = Arc::clone(&self.transport);
        let discovering = Arc::clone(&self.discovering);
        let service_id = self.config.service_id.clone();
        let options = self.config.discovery_options;
        let delay = self.config.discovery_restart_delay;

        tokio::spawn(async move {
            sleep(delay).await;
            let mut discovering = discovering.write().await;
            if *discovering {
                debug!("Discovery already active, skipping scheduled restart");
                return;
            }
            debug!("Restarting discovery after connection failure");
            match transport.start_discovery(&service_id, options).await {
                Ok(()) => *discovering = true,
                Err(e) => warn!("Failed to restart discovery: {}", e),
            }
        });
    }

    /// Drop the link to an endpoint.
    ///
    /// Always reports success: the transport is idempotent on an already
    /// disconnected id, and disconnection is never an error condition.
    pub async fn disconnect(&self, id: &DeviceId) -> Result<bool> {
        info!("Disconnecting from endpoint: {}", id);
        if let Err(e) = self.transport.disconnect_from_endpoint(id).await {
            debug!("Disconnect from {} reported: {}", id, e);
        }
        Ok(true)
    }

    /// Forward a text message as an opaque byte payload
    pub async fn send_message(&self, id: &DeviceId, message: &str) -> Result<bool> {
        debug!("Sending {} byte(s) to endpoint: {}", message.len(), id);
        self.transport
            .send_payload(id, message.as_bytes())
            .await
            .map_err(|e| NearbyError::SendMessageFailed(e.to_string()))?;
        Ok(true)
    }

    /// Check whether a negotiation is outstanding for an endpoint
    pub async fn is_pending(&self, id: &str) -> bool {
        self.pending.read().await.contains(id)
    }

    pub(crate) async fn remove_pending(&self, id: &str) {
        self.pending.write().await.remove(id);
    }

    /// Discard all pending state; used at session teardown
    pub(crate) async fn clear_pending(&self) {
        let mut pending = self.pending.write().await;
        if !pending.is_empty() {
            debug!("Discarding {} pending connection(s)", pending.len());
        }
        pending.clear();
    }
}
