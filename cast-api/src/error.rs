use thiserror::Error;

/// High-level API errors for Cast operations
///
/// These abstract the underlying Cast v2 channel errors into the failure
/// modes a monitoring consumer cares about.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// TCP connect or TLS handshake failure, or the socket dropping mid-request.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The device answered with something that could not be interpreted.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// A request needs a running application and none is running.
    #[error("No application running on {0}")]
    NoApplication(String),

    /// The transport was shut down and no longer accepts requests.
    #[error("Transport closed")]
    Closed,
}

impl From<rust_cast::errors::Error> for ApiError {
    fn from(error: rust_cast::errors::Error) -> Self {
        use rust_cast::errors::Error;

        match error {
            Error::Io(e) => ApiError::NetworkError(e.to_string()),
            other => ApiError::ProtocolError(other.to_string()),
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
