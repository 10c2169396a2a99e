// Nearby session - explicit per-session state with attach/detach boundaries
// Owns the registry, pending set and subscriber slot; all transport callbacks
// are funneled through its single dispatch task

use crate::transport::{AdvertisingOptions, DiscoveryOptions, Strategy, Transport, TransportEvent};
use crate::{
    ConnectionNegotiator, ConnectionState, DeviceId, DiscoveryFilter, Endpoint, EndpointRegistry,
    EventEmitter, NearbyError, NearbyEvent, NegotiatorConfig, PermissionManager, PermissionStatus,
    Result,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default service id scoping advertisement and discovery to this protocol
pub const DEFAULT_SERVICE_ID: &str = "nearby-sync.service";

/// Session configuration, resolved once at attach time
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Display name this device advertises to peers
    pub device_name: String,
    pub service_id: String,
    pub strategy: Strategy,
    /// Capability flag for the disambiguated-identity retry path
    pub supports_identity_retry: bool,
    pub connect_delay: Duration,
    pub discovery_restart_delay: Duration,
}

impl SessionConfig {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            service_id: DEFAULT_SERVICE_ID.to_string(),
            strategy: Strategy::default(),
            supports_identity_retry: true,
            connect_delay: Duration::from_millis(crate::negotiator::DEFAULT_CONNECT_DELAY_MS),
            discovery_restart_delay: Duration::from_millis(
                crate::negotiator::DEFAULT_DISCOVERY_RESTART_DELAY_MS,
            ),
        }
    }
}

/// One advertise/discover cycle against a concrete transport.
///
/// Constructed on attach, torn down on detach; registry, pending set and
/// subscriber are discarded together at teardown and a new session starts
/// empty.
pub struct NearbySession {
    session_id: Uuid,
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    registry: Arc<EndpointRegistry>,
    events: Arc<EventEmitter>,
    negotiator: Arc<ConnectionNegotiator>,
    permissions: Arc<PermissionManager>,
    advertising: Arc<RwLock<bool>>,
    discovering: Arc<RwLock<bool>>,
    dispatch_handle: Option<tokio::task::JoinHandle<()>>,
}

impl NearbySession {
    /// Attach a session to a transport and start dispatching its events.
    ///
    /// `transport_events` is the channel the adapter raises raw callbacks on;
    /// draining it from one spawned task is what keeps all registry and
    /// pending-set mutations on a single logical sequence.
    pub fn attach(
        transport: Arc<dyn Transport>,
        config: SessionConfig,
        transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        let registry = Arc::new(EndpointRegistry::new());
        let events = Arc::new(EventEmitter::new());
        // The negotiator shares this flag: it suspends discovery around
        // connection attempts and restarts it after terminal failures, and
        // both transitions must stay visible to start/stop_discovery here.
        let discovering = Arc::new(RwLock::new(false));

        let mut negotiator_config =
            NegotiatorConfig::new(config.device_name.clone(), config.service_id.clone());
        negotiator_config.supports_identity_retry = config.supports_identity_retry;
        negotiator_config.connect_delay = config.connect_delay;
        negotiator_config.discovery_restart_delay = config.discovery_restart_delay;
        negotiator_config.discovery_options = DiscoveryOptions {
            strategy: config.strategy,
        };

        let negotiator = Arc::new(ConnectionNegotiator::new(
            Arc::clone(&transport),
            Arc::clone(&registry),
            Arc::clone(&discovering),
            negotiator_config,
        ));

        let dispatch_handle = Self::spawn_dispatch(
            transport_events,
            Arc::clone(&transport),
            Arc::clone(&registry),
            Arc::clone(&events),
            Arc::clone(&negotiator),
        );

        info!("Nearby session attached: {}", session_id);

        Self {
            session_id,
            config,
            transport,
            registry,
            events,
            negotiator,
            permissions: Arc::new(PermissionManager::new()),
            advertising: Arc::new(RwLock::new(false)),
            discovering,
            dispatch_handle: Some(dispatch_handle),
        }
    }

    fn spawn_dispatch(
        mut rx: mpsc::UnboundedReceiver<TransportEvent>,
        transport: Arc<dyn Transport>,
        registry: Arc<EndpointRegistry>,
        events: Arc<EventEmitter>,
        negotiator: Arc<ConnectionNegotiator>,
    ) -> tokio::task::JoinHandle<()> {
        let filter = DiscoveryFilter::new(Arc::clone(&registry), Arc::clone(&events));

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    TransportEvent::EndpointFound { id, raw_name } => {
                        filter.on_endpoint_found(&id, &raw_name).await;
                    }
                    TransportEvent::EndpointLost { id } => {
                        filter.on_endpoint_lost(&id).await;
                    }
                    TransportEvent::ConnectionInitiated { id, raw_name } => {
                        // Inbound connections are auto-accepted; no manual
                        // confirmation step is exposed.
                        info!("Connection initiated by: {} ({})", id, raw_name);
                        if let Err(e) = transport.accept_connection(&id).await {
                            warn!("Failed to accept connection from {}: {}", id, e);
                        }

                        // The inbound counterpart of discovery: populate the
                        // registry identically and surface the peer.
                        let display_name = registry.register(&id, &raw_name).await;
                        events
                            .publish(NearbyEvent::DeviceFound {
                                device_id: id.clone(),
                                device_name: display_name,
                                unique_id: id,
                                is_remote_device: true,
                            })
                            .await;
                    }
                    TransportEvent::ConnectionResult { id, result } => match result {
                        Ok(()) => {
                            info!("Connection successful with: {}", id);
                            negotiator.remove_pending(&id).await;
                            registry.set_state(&id, ConnectionState::Connected).await;
                            let device_name = registry.lookup_name(&id).await;
                            events
                                .publish(NearbyEvent::ConnectionSuccess {
                                    device_id: id,
                                    device_name,
                                })
                                .await;
                        }
                        Err(error) => {
                            warn!("Connection failed with {}: {}", id, error);
                            negotiator.remove_pending(&id).await;
                            events
                                .publish(NearbyEvent::ConnectionFailed {
                                    device_id: id,
                                    error: format!("Connection failed: {}", error),
                                })
                                .await;
                            negotiator.schedule_discovery_restart();
                        }
                    },
                    TransportEvent::Disconnected { id } => {
                        info!("Disconnected from endpoint: {}", id);
                        // Resolve the name before purging the entry
                        let device_name = registry.lookup_name(&id).await;
                        events
                            .publish(NearbyEvent::DeviceDisconnected {
                                device_id: id.clone(),
                                device_name,
                            })
                            .await;
                        registry.remove(&id).await;
                        negotiator.remove_pending(&id).await;
                    }
                    TransportEvent::PayloadReceived { id, payload } => {
                        let message = String::from_utf8_lossy(&payload).to_string();
                        let device_name = registry.lookup_name(&id).await;
                        events
                            .publish(NearbyEvent::MessageReceived {
                                device_id: id,
                                device_name,
                                message,
                            })
                            .await;
                    }
                }
            }
            debug!("Transport event dispatch terminated");
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Subscribe to the session's event stream, replacing any previous
    /// subscriber. Events published before subscribing are not replayed.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<NearbyEvent> {
        self.events.subscribe().await
    }

    pub async fn check_permissions(&self) -> bool {
        self.permissions.is_granted().await
    }

    /// Request the proximity permission set and publish the outcome
    pub async fn request_permissions(&self) -> bool {
        let granted = self.permissions.request().await == PermissionStatus::Granted;
        self.events
            .publish(NearbyEvent::PermissionsGranted { granted })
            .await;
        granted
    }

    /// Record the host platform's permission prompt outcome
    pub async fn set_permission_status(&self, status: PermissionStatus) {
        self.permissions.set_status(status).await;
    }

    /// A detached session no longer dispatches transport events; refuse new
    /// work instead of issuing calls whose callbacks would go nowhere.
    fn verify_attached(&self) -> Result<()> {
        if self.dispatch_handle.is_some() {
            Ok(())
        } else {
            Err(NearbyError::NoActiveSession)
        }
    }

    /// Make this device visible to nearby peers
    pub async fn start_advertising(&self) -> Result<bool> {
        self.verify_attached()?;
        self.permissions.verify().await?;

        let mut advertising = self.advertising.write().await;
        if *advertising {
            debug!("Advertising already active");
            return Ok(true);
        }

        self.transport
            .start_advertising(
                &self.config.device_name,
                &self.config.service_id,
                AdvertisingOptions {
                    strategy: self.config.strategy,
                },
            )
            .await
            .map_err(|e| NearbyError::AdvertisingFailed(e.to_string()))?;

        *advertising = true;
        info!("Started advertising as: {}", self.config.device_name);
        Ok(true)
    }

    /// Stop advertising; always succeeds while the session is attached
    pub async fn stop_advertising(&self) -> Result<bool> {
        self.verify_attached()?;
        let mut advertising = self.advertising.write().await;
        if let Err(e) = self.transport.stop_advertising().await {
            debug!("Stop advertising reported: {}", e);
        }
        *advertising = false;
        Ok(true)
    }

    /// Start scanning for nearby peers
    pub async fn start_discovery(&self) -> Result<bool> {
        self.verify_attached()?;
        self.permissions.verify().await?;

        let mut discovering = self.discovering.write().await;
        if *discovering {
            debug!("Discovery already active");
            return Ok(true);
        }

        self.transport
            .start_discovery(
                &self.config.service_id,
                DiscoveryOptions {
                    strategy: self.config.strategy,
                },
            )
            .await
            .map_err(|e| NearbyError::DiscoveryFailed(e.to_string()))?;

        *discovering = true;
        info!("Started discovery");
        Ok(true)
    }

    /// Stop scanning; always succeeds while the session is attached
    pub async fn stop_discovery(&self) -> Result<bool> {
        self.verify_attached()?;
        let mut discovering = self.discovering.write().await;
        if let Err(e) = self.transport.stop_discovery().await {
            debug!("Stop discovery reported: {}", e);
        }
        *discovering = false;
        Ok(true)
    }

    /// Negotiate a connection to a discovered endpoint
    pub async fn connect_to_device(&self, id: &DeviceId) -> Result<bool> {
        self.verify_attached()?;
        self.permissions.verify().await?;
        self.negotiator.connect(id).await
    }

    /// Drop the link to an endpoint; always succeeds while attached
    pub async fn disconnect(&self, id: &DeviceId) -> Result<bool> {
        self.verify_attached()?;
        self.negotiator.disconnect(id).await
    }

    /// Send a short text message to a connected endpoint
    pub async fn send_message(&self, id: &DeviceId, message: &str) -> Result<bool> {
        self.verify_attached()?;
        self.permissions.verify().await?;
        self.negotiator.send_message(id, message).await
    }

    /// Snapshot of all endpoints the session currently knows about
    pub async fn known_endpoints(&self) -> Vec<Endpoint> {
        self.registry.all().await
    }

    /// Check whether a connection negotiation is outstanding for an endpoint
    pub async fn is_connecting(&self, id: &str) -> bool {
        self.negotiator.is_pending(id).await
    }

    /// Tear the session down.
    ///
    /// Stops the dispatch task and discards the registry, pending set and
    /// subscriber together. Requests in flight get no callbacks, and every
    /// subsequent operation fails with `NoActiveSession`.
    pub async fn detach(&mut self) {
        info!("Nearby session detaching: {}", self.session_id);

        if let Some(handle) = self.dispatch_handle.take() {
            handle.abort();
        }

        self.registry.clear().await;
        self.negotiator.clear_pending().await;
        self.events.unsubscribe().await;
        *self.advertising.write().await = false;
        *self.discovering.write().await = false;
    }
}

impl Drop for NearbySession {
    fn drop(&mut self) {
        if let Some(handle) = self.dispatch_handle.take() {
            handle.abort();
        }
    }
}
