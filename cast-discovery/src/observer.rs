use std::sync::Arc;

use crate::{Device, Result};

/// Receives device-appeared and device-removed notifications.
///
/// Callbacks run on the discovery source's own thread, so implementations
/// must be quick and must not block on network I/O.
pub trait DiscoveryObserver: Send + Sync {
    fn device_discovered(&self, device: Device);

    fn device_removed(&self, device: Device);
}

/// A mechanism that detects devices joining and leaving the network.
pub trait DiscoverySource: Send + Sync {
    /// Add an observer. Observers registered after `start()` only see
    /// subsequent events.
    fn register_observer(&self, observer: Arc<dyn DiscoveryObserver>);

    /// Begin discovery.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is already running or the underlying
    /// mechanism cannot be started.
    fn start(&self) -> Result<()>;

    /// Stop discovery. Safe to call when not started.
    fn stop(&self);
}
