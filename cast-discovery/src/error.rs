//! Error types for the discovery system.

use thiserror::Error;

/// Error type for discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The mDNS daemon could not be created or driven
    #[error("mDNS daemon error: {0}")]
    Daemon(String),

    /// Browsing for the service type failed
    #[error("Failed to browse for {service_type}: {message}")]
    Browse {
        service_type: String,
        message: String,
    },

    /// A resolved service did not describe a usable Cast receiver
    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    /// `start()` was called on a source that is already running
    #[error("Discovery has already been started")]
    AlreadyStarted,
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
