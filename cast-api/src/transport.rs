use std::sync::Arc;

use cast_discovery::Device;

use crate::event::{ConnectionListener, EventListener};
use crate::listeners::ListenerId;
use crate::media::MediaStatusSnapshot;
use crate::status::StatusSnapshot;
use crate::Result;

/// Per-device protocol client.
///
/// Implementations own all network I/O for one device. Push events and
/// connection changes are delivered on the transport's own threads to the
/// registered listeners.
pub trait CastTransport: Send + Sync {
    /// The device this transport talks to.
    fn device(&self) -> &Device;

    fn register_listener(&self, listener: Arc<dyn EventListener>) -> ListenerId;

    fn unregister_listener(&self, id: ListenerId);

    fn register_connection_listener(&self, listener: Arc<dyn ConnectionListener>) -> ListenerId;

    fn unregister_connection_listener(&self, id: ListenerId);

    /// Fetch the current receiver status.
    fn status(&self) -> Result<StatusSnapshot>;

    /// Fetch the media status of the running application.
    ///
    /// `Ok(None)` means the application has no media session.
    fn media_status(&self) -> Result<Option<MediaStatusSnapshot>>;
}

/// Creates a transport for a newly discovered device.
pub trait TransportFactory: Send + Sync {
    fn create(&self, device: &Device) -> Arc<dyn CastTransport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&Device) -> Arc<dyn CastTransport> + Send + Sync,
{
    fn create(&self, device: &Device) -> Arc<dyn CastTransport> {
        self(device)
    }
}
