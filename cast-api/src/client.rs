//! Cast v2 transport built on `rust_cast`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

use cast_discovery::Device;
use parking_lot::Mutex;
use rust_cast::channels::heartbeat::HeartbeatResponse;
use rust_cast::channels::media::MediaResponse;
use rust_cast::channels::receiver::ReceiverResponse;
use rust_cast::{CastDevice, ChannelMessage};
use tracing::{debug, info, warn};

use crate::convert;
use crate::event::{ConnectionListener, EventListener, SpontaneousEvent};
use crate::listeners::{ListenerId, ListenerSet};
use crate::media::MediaStatusSnapshot;
use crate::status::StatusSnapshot;
use crate::transport::{CastTransport, TransportFactory};
use crate::Result;

/// Destination id of the platform receiver on every Cast device.
const RECEIVER_DESTINATION: &str = "receiver-0";

/// Options for [`CastClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Connect to this port instead of the advertised one
    pub port: Option<u16>,
    /// Wait between a dropped event session and the next connect attempt
    pub reconnect_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            port: None,
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl ClientOptions {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Installs the rustls crypto provider the first time a connection is made.
fn ensure_crypto_provider() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = rustls::crypto::CryptoProvider::install_default(
            rustls::crypto::aws_lc_rs::default_provider(),
        );
    });
}

struct Shared {
    listeners: ListenerSet<dyn EventListener>,
    connection_listeners: ListenerSet<dyn ConnectionListener>,
}

impl Shared {
    fn has_listeners(&self) -> bool {
        !self.listeners.is_empty() || !self.connection_listeners.is_empty()
    }

    fn dispatch(&self, event: SpontaneousEvent) {
        for listener in self.listeners.snapshot() {
            listener.spontaneous_event_received(event.clone());
        }
    }

    fn dispatch_connection(&self, connected: bool) {
        for listener in self.connection_listeners.snapshot() {
            listener.connection_event_received(connected);
        }
    }
}

/// Handle to the background thread that keeps an event connection open.
struct EventSession {
    stop: Arc<AtomicBool>,
}

/// Talks to one Cast device.
///
/// Status requests open a short-lived connection per call. Push events are
/// received on a long-lived connection owned by a background thread that is
/// started when the first listener registers and asked to stop when the last
/// one leaves. `rust_cast` offers no read timeout, so the thread notices a
/// stop request on the next message it receives (heartbeats arrive every few
/// seconds).
pub struct CastClient {
    device: Device,
    options: ClientOptions,
    shared: Arc<Shared>,
    session: Mutex<Option<EventSession>>,
}

impl CastClient {
    pub fn new(device: Device) -> Self {
        Self::with_options(device, ClientOptions::default())
    }

    pub fn with_options(device: Device, options: ClientOptions) -> Self {
        Self {
            device,
            options,
            shared: Arc::new(Shared {
                listeners: ListenerSet::new(),
                connection_listeners: ListenerSet::new(),
            }),
            session: Mutex::new(None),
        }
    }

    fn host(&self) -> String {
        self.device.ip_address.to_string()
    }

    fn port(&self) -> u16 {
        self.options.port.unwrap_or(self.device.port)
    }

    fn connect(&self) -> Result<CastDevice<'static>> {
        ensure_crypto_provider();
        debug!(device = %self.device.name, host = %self.host(), port = self.port(), "Connecting");

        let device = CastDevice::connect_without_host_verification(self.host(), self.port())?;
        device.connection.connect(RECEIVER_DESTINATION.to_string())?;
        Ok(device)
    }

    /// Whether the background event thread is (or is being) run.
    pub fn is_listening(&self) -> bool {
        self.session.lock().is_some()
    }

    fn ensure_session(&self) {
        let mut session = self.session.lock();
        if session.is_some() {
            return;
        }

        let stop = Arc::new(AtomicBool::new(false));
        let worker = EventWorker {
            name: self.device.name.clone(),
            host: self.host(),
            port: self.port(),
            reconnect_delay: self.options.reconnect_delay,
            shared: Arc::clone(&self.shared),
            stop: Arc::clone(&stop),
        };

        let spawned = thread::Builder::new()
            .name(format!("cast-events-{}", self.device.name))
            .spawn(move || worker.run());

        match spawned {
            Ok(_) => {
                *session = Some(EventSession { stop });
            }
            Err(e) => {
                warn!(device = %self.device.name, error = %e, "Failed to spawn event thread");
            }
        }
    }

    fn stop_session_if_idle(&self) {
        if self.shared.has_listeners() {
            return;
        }
        if let Some(session) = self.session.lock().take() {
            session.stop.store(true, Ordering::SeqCst);
            debug!(device = %self.device.name, "Event session stopping");
        }
    }
}

impl CastTransport for CastClient {
    fn device(&self) -> &Device {
        &self.device
    }

    fn register_listener(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let id = self.shared.listeners.register(listener);
        self.ensure_session();
        id
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.shared.listeners.unregister(id);
        self.stop_session_if_idle();
    }

    fn register_connection_listener(&self, listener: Arc<dyn ConnectionListener>) -> ListenerId {
        let id = self.shared.connection_listeners.register(listener);
        self.ensure_session();
        id
    }

    fn unregister_connection_listener(&self, id: ListenerId) {
        self.shared.connection_listeners.unregister(id);
        self.stop_session_if_idle();
    }

    fn status(&self) -> Result<StatusSnapshot> {
        let device = self.connect()?;
        let status = device.receiver.get_status()?;
        Ok(convert::status_snapshot(&status))
    }

    fn media_status(&self) -> Result<Option<MediaStatusSnapshot>> {
        let device = self.connect()?;
        let status = device.receiver.get_status()?;
        let receiver = convert::status_snapshot(&status);

        let Some(app) = receiver.active_app() else {
            return Ok(None);
        };

        let transport_id = app.transport_id.clone();
        device.connection.connect(transport_id.clone())?;
        let media = device.media.get_status(transport_id, None)?;
        Ok(convert::media_status_snapshot(&media, receiver.volume.level))
    }
}

impl Drop for CastClient {
    fn drop(&mut self) {
        if let Some(session) = self.session.lock().take() {
            session.stop.store(true, Ordering::SeqCst);
        }
    }
}

/// State moved into the event thread.
struct EventWorker {
    name: String,
    host: String,
    port: u16,
    reconnect_delay: Duration,
    shared: Arc<Shared>,
    stop: Arc<AtomicBool>,
}

impl EventWorker {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn run(self) {
        while !self.stopped() {
            let mut connected = false;
            match self.run_session(&mut connected) {
                Ok(()) => debug!(device = %self.name, "Event session ended"),
                Err(e) => warn!(device = %self.name, error = %e, "Event session failed"),
            }

            if connected {
                self.shared.dispatch_connection(false);
            }
            self.sleep_before_reconnect();
        }
        debug!(device = %self.name, "Event thread exiting");
    }

    fn sleep_before_reconnect(&self) {
        let step = Duration::from_millis(100);
        let mut waited = Duration::ZERO;
        while waited < self.reconnect_delay && !self.stopped() {
            thread::sleep(step);
            waited += step;
        }
    }

    fn run_session(&self, connected: &mut bool) -> Result<()> {
        ensure_crypto_provider();
        let device = CastDevice::connect_without_host_verification(self.host.clone(), self.port)?;
        device.connection.connect(RECEIVER_DESTINATION.to_string())?;

        *connected = true;
        info!(device = %self.name, "Event session connected");
        self.shared.dispatch_connection(true);

        let status = device.receiver.get_status()?;
        let snapshot = convert::status_snapshot(&status);
        let mut last_volume = snapshot.volume.level;
        let mut joined: Option<String> = None;
        self.join_app(&device, &snapshot, &mut joined)?;

        while !self.stopped() {
            match device.receive()? {
                ChannelMessage::Heartbeat(response) => {
                    if matches!(response, HeartbeatResponse::Ping) {
                        device.heartbeat.pong()?;
                    }
                }
                ChannelMessage::Receiver(ReceiverResponse::Status(status)) => {
                    let snapshot = convert::status_snapshot(&status);
                    last_volume = snapshot.volume.level;
                    self.join_app(&device, &snapshot, &mut joined)?;
                    self.shared.dispatch(SpontaneousEvent::status(snapshot));
                }
                ChannelMessage::Media(MediaResponse::Status(status)) => {
                    let snapshot = convert::pushed_media_status(&status, last_volume);
                    self.shared.dispatch(SpontaneousEvent::media_status(snapshot));
                }
                ChannelMessage::Connection(response) => {
                    debug!(device = %self.name, ?response, "Connection channel message");
                    self.shared
                        .dispatch(SpontaneousEvent::other("connection", format!("{:?}", response)));
                }
                other => {
                    self.shared
                        .dispatch(SpontaneousEvent::other("unknown", format!("{:?}", other)));
                }
            }
        }
        Ok(())
    }

    /// Open a virtual connection to the running app so its media channel
    /// pushes status updates to us.
    fn join_app(
        &self,
        device: &CastDevice<'_>,
        snapshot: &StatusSnapshot,
        joined: &mut Option<String>,
    ) -> Result<()> {
        let Some(app) = snapshot.active_app() else {
            *joined = None;
            return Ok(());
        };
        if joined.as_deref() == Some(app.transport_id.as_str()) {
            return Ok(());
        }

        info!(device = %self.name, app = %app.display_name, "Running app");
        device.connection.connect(app.transport_id.clone())?;
        *joined = Some(app.transport_id.clone());
        Ok(())
    }
}

/// Builds a [`CastClient`] per device with shared options.
#[derive(Debug, Clone, Default)]
pub struct CastClientFactory {
    options: ClientOptions,
}

impl CastClientFactory {
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }
}

impl TransportFactory for CastClientFactory {
    fn create(&self, device: &Device) -> Arc<dyn CastTransport> {
        Arc::new(CastClient::with_options(device.clone(), self.options.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopListener;

    impl EventListener for NoopListener {
        fn spontaneous_event_received(&self, _event: SpontaneousEvent) {}
    }

    fn unreachable_device() -> Device {
        // TEST-NET-1, never routed
        Device::new("Nowhere", "192.0.2.1:8009".parse().unwrap())
    }

    #[test]
    fn test_options_builders() {
        let options = ClientOptions::default()
            .with_port(8010)
            .with_reconnect_delay(Duration::from_millis(50));
        assert_eq!(options.port, Some(8010));
        assert_eq!(options.reconnect_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_port_override() {
        let client = CastClient::with_options(unreachable_device(), ClientOptions::default().with_port(9000));
        assert_eq!(client.port(), 9000);
        assert_eq!(client.host(), "192.0.2.1");
    }

    #[test]
    fn test_session_follows_listener_registration() {
        let client = CastClient::with_options(
            unreachable_device(),
            ClientOptions::default().with_reconnect_delay(Duration::from_millis(10)),
        );
        assert!(!client.is_listening());

        let id = client.register_listener(Arc::new(NoopListener));
        assert!(client.is_listening());

        client.unregister_listener(id);
        assert!(!client.is_listening());
    }

    #[test]
    fn test_factory_creates_client_for_device() {
        let factory = CastClientFactory::default();
        let transport = factory.create(&unreachable_device());
        assert_eq!(transport.device().name, "Nowhere");
    }
}
