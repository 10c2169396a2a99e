// Permission gate for nearby radio operations
// Prompting the user is the host platform's job; this only tracks the outcome

use crate::{NearbyError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Status of the proximity permission set (radio scan/advertise/connect)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Permissions have been granted
    Granted,
    /// Permissions have been denied by the user
    Denied,
    /// Permissions have not been requested yet
    NotRequested,
}

/// Tracks whether the transport's required permissions are granted.
///
/// Every transport operation is gated on this; the check is a synchronous
/// precondition, surfaced before any transport call.
pub struct PermissionManager {
    status: Arc<RwLock<PermissionStatus>>,
}

impl PermissionManager {
    pub fn new() -> Self {
        Self {
            status: Arc::new(RwLock::new(PermissionStatus::NotRequested)),
        }
    }

    /// Get the current permission status
    pub async fn check(&self) -> PermissionStatus {
        *self.status.read().await
    }

    pub async fn is_granted(&self) -> bool {
        *self.status.read().await == PermissionStatus::Granted
    }

    /// Request the proximity permission set.
    ///
    /// Already-resolved statuses are returned as-is. Without a host prompt
    /// wired in, a first request resolves to granted; hosts that surface a
    /// real dialog report the user's answer through [`set_status`].
    ///
    /// [`set_status`]: PermissionManager::set_status
    pub async fn request(&self) -> PermissionStatus {
        let current = *self.status.read().await;
        if current != PermissionStatus::NotRequested {
            debug!("Permissions already requested: {:?}", current);
            return current;
        }

        info!("Requesting proximity permissions");
        *self.status.write().await = PermissionStatus::Granted;
        PermissionStatus::Granted
    }

    /// Record the host platform's permission outcome
    pub async fn set_status(&self, status: PermissionStatus) {
        debug!("Permission status set to: {:?}", status);
        *self.status.write().await = status;
    }

    /// Verify that permissions are granted before touching the transport
    pub async fn verify(&self) -> Result<()> {
        match self.check().await {
            PermissionStatus::Granted => Ok(()),
            PermissionStatus::Denied => Err(NearbyError::PermissionDenied(
                "proximity permissions were denied".to_string(),
            )),
            PermissionStatus::NotRequested => Err(NearbyError::PermissionDenied(
                "proximity permissions have not been requested".to_string(),
            )),
        }
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}
