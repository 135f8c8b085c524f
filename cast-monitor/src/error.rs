use thiserror::Error;

/// Errors that can occur in the Cast monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The coordinator's `start()` was already called
    #[error("Coordinator has already been started")]
    AlreadyStarted,

    /// `initialize()` called on a listener that is already active
    #[error("Listener for {0} is already initialized")]
    AlreadyInitialized(String),

    /// Operation on a listener that has been destroyed
    #[error("Listener for {0} has been destroyed")]
    Destroyed(String),

    /// A configuration value could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Device discovery error
    #[error("Device discovery failed: {0}")]
    Discovery(#[from] cast_discovery::DiscoveryError),

    /// Logging setup failed
    #[error(transparent)]
    Logging(#[from] crate::logging::LoggingError),
}

/// Result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;
