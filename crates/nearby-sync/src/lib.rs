pub mod discovery;
pub mod error;
pub mod events;
pub mod negotiator;
pub mod permissions;
pub mod registry;
pub mod session;
pub mod transport;
pub mod types;

pub use discovery::DiscoveryFilter;
pub use error::{ErrorCategory, NearbyError, Result};
pub use events::EventEmitter;
pub use negotiator::{ConnectionNegotiator, NegotiatorConfig};
pub use permissions::{PermissionManager, PermissionStatus};
pub use registry::{EndpointRegistry, NAME_DELIMITER, UNKNOWN_DEVICE};
pub use session::{NearbySession, SessionConfig, DEFAULT_SERVICE_ID};
pub use transport::{
    AdvertisingOptions, DiscoveryOptions, Strategy, Transport, TransportEvent,
};
pub use types::{ConnectionState, DeviceId, Endpoint, NearbyEvent};
