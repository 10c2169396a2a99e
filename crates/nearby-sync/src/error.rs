use crate::DeviceId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NearbyError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Already attempting to connect to device: {0}")]
    AlreadyConnecting(DeviceId),

    #[error("Advertising failed: {0}")]
    AdvertisingFailed(String),

    #[error("Discovery failed: {0}")]
    DiscoveryFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send message failed: {0}")]
    SendMessageFailed(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("No active session")]
    NoActiveSession,
}

pub type Result<T> = std::result::Result<T, NearbyError>;

impl NearbyError {
    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            NearbyError::PermissionDenied(details) => {
                format!(
                    "Permission denied: {}. Please grant the necessary permissions in your device settings.",
                    details
                )
            }
            NearbyError::AlreadyConnecting(device_id) => {
                format!(
                    "A connection attempt to '{}' is already in progress. Please wait for it to finish.",
                    device_id
                )
            }
            NearbyError::AdvertisingFailed(details) => {
                format!("Could not make this device visible to others: {}.", details)
            }
            NearbyError::DiscoveryFailed(details) => {
                format!("Could not search for nearby devices: {}.", details)
            }
            NearbyError::ConnectionFailed(details) => {
                format!("Connection failed: {}. Please try again.", details)
            }
            NearbyError::SendMessageFailed(details) => {
                format!("Message could not be delivered: {}.", details)
            }
            NearbyError::ConnectionError(details) => {
                format!("An unexpected connection error occurred: {}.", details)
            }
            NearbyError::NoActiveSession => {
                "No active session. Please start a session before using nearby features.".to_string()
            }
        }
    }

    /// Get error category for metrics and monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            NearbyError::PermissionDenied(_) => ErrorCategory::Permission,
            NearbyError::AlreadyConnecting(_) => ErrorCategory::Validation,
            NearbyError::AdvertisingFailed(_) => ErrorCategory::Network,
            NearbyError::DiscoveryFailed(_) => ErrorCategory::Network,
            NearbyError::ConnectionFailed(_) => ErrorCategory::Network,
            NearbyError::SendMessageFailed(_) => ErrorCategory::Network,
            NearbyError::ConnectionError(_) => ErrorCategory::Internal,
            NearbyError::NoActiveSession => ErrorCategory::Session,
        }
    }
}

/// Error categories for monitoring and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Network,
    Permission,
    Session,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Permission => write!(f, "permission"),
            ErrorCategory::Session => write!(f, "session"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_diagnostic() {
        let err = NearbyError::ConnectionFailed("endpoint busy".to_string());
        assert!(err.to_string().contains("endpoint busy"));

        let err = NearbyError::SendMessageFailed("payload rejected".to_string());
        assert!(err.to_string().contains("payload rejected"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(
            NearbyError::AlreadyConnecting("ep1".to_string()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            NearbyError::PermissionDenied("bluetooth".to_string()).category(),
            ErrorCategory::Permission
        );
        assert_eq!(
            NearbyError::DiscoveryFailed("radio off".to_string()).category(),
            ErrorCategory::Network
        );
        assert_eq!(NearbyError::NoActiveSession.category(), ErrorCategory::Session);
    }

    #[test]
    fn test_user_messages_are_actionable() {
        let msg = NearbyError::PermissionDenied("bluetooth".to_string()).user_message();
        assert!(msg.contains("settings"));

        let msg = NearbyError::AlreadyConnecting("ep1".to_string()).user_message();
        assert!(msg.contains("ep1"));
    }
}
