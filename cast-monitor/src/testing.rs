//! In-memory collaborators for exercising listeners and the coordinator
//! without a network.
//!
//! Everything here fires callbacks synchronously on the calling thread.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cast_api::{
    ApiError, CastTransport, ConnectionListener, EventListener, ListenerId, ListenerSet,
    MediaStatusSnapshot, SpontaneousEvent, StatusSnapshot, TransportFactory,
};
use cast_discovery::{Device, DiscoveryError, DiscoveryObserver, DiscoverySource};
use parking_lot::Mutex;

type Scripted<T> = std::result::Result<T, String>;

/// Scripted [`CastTransport`].
pub struct FakeTransport {
    device: Device,
    listeners: ListenerSet<dyn EventListener>,
    connection_listeners: ListenerSet<dyn ConnectionListener>,
    status: Mutex<Scripted<StatusSnapshot>>,
    media_status: Mutex<Scripted<Option<MediaStatusSnapshot>>>,
    status_calls: AtomicUsize,
    media_status_calls: AtomicUsize,
    state_on_register: Mutex<Option<bool>>,
}

impl FakeTransport {
    pub fn new(device: Device) -> Self {
        Self {
            device,
            listeners: ListenerSet::new(),
            connection_listeners: ListenerSet::new(),
            status: Mutex::new(Ok(StatusSnapshot::default())),
            media_status: Mutex::new(Ok(None)),
            status_calls: AtomicUsize::new(0),
            media_status_calls: AtomicUsize::new(0),
            state_on_register: Mutex::new(None),
        }
    }

    pub fn set_status(&self, status: StatusSnapshot) {
        *self.status.lock() = Ok(status);
    }

    /// Make `status()` fail with a network error.
    pub fn fail_status(&self, message: &str) {
        *self.status.lock() = Err(message.to_string());
    }

    pub fn set_media_status(&self, media: Option<MediaStatusSnapshot>) {
        *self.media_status.lock() = Ok(media);
    }

    pub fn fail_media_status(&self, message: &str) {
        *self.media_status.lock() = Err(message.to_string());
    }

    /// Deliver a push event to every registered listener.
    pub fn push(&self, event: SpontaneousEvent) {
        for listener in self.listeners.snapshot() {
            listener.spontaneous_event_received(event.clone());
        }
    }

    /// Deliver a connection change to every registered connection listener.
    pub fn set_connected(&self, connected: bool) {
        for listener in self.connection_listeners.snapshot() {
            listener.connection_event_received(connected);
        }
    }

    /// Report `connected` to each connection listener from inside its
    /// registration call, as a transport that is already connected (or
    /// already down) does.
    pub fn report_connection_on_register(&self, connected: bool) {
        *self.state_on_register.lock() = Some(connected);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn media_status_calls(&self) -> usize {
        self.media_status_calls.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn connection_listener_count(&self) -> usize {
        self.connection_listeners.len()
    }
}

impl CastTransport for FakeTransport {
    fn device(&self) -> &Device {
        &self.device
    }

    fn register_listener(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        self.listeners.register(listener)
    }

    fn unregister_listener(&self, id: ListenerId) {
        self.listeners.unregister(id);
    }

    fn register_connection_listener(&self, listener: Arc<dyn ConnectionListener>) -> ListenerId {
        let id = self.connection_listeners.register(Arc::clone(&listener));
        let state = *self.state_on_register.lock();
        if let Some(connected) = state {
            listener.connection_event_received(connected);
        }
        id
    }

    fn unregister_connection_listener(&self, id: ListenerId) {
        self.connection_listeners.unregister(id);
    }

    fn status(&self) -> cast_api::Result<StatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status.lock().clone().map_err(ApiError::NetworkError)
    }

    fn media_status(&self) -> cast_api::Result<Option<MediaStatusSnapshot>> {
        self.media_status_calls.fetch_add(1, Ordering::SeqCst);
        self.media_status.lock().clone().map_err(ApiError::NetworkError)
    }
}

/// Hands out a [`FakeTransport`] per device and remembers them by address.
#[derive(Default)]
pub struct FakeTransportFactory {
    initial_status: Mutex<Option<StatusSnapshot>>,
    transports: Mutex<HashMap<SocketAddr, Arc<FakeTransport>>>,
    created: AtomicUsize,
}

impl FakeTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status every newly created transport starts with.
    pub fn with_initial_status(self, status: StatusSnapshot) -> Self {
        *self.initial_status.lock() = Some(status);
        self
    }

    /// The most recent transport created for `address`.
    pub fn transport(&self, address: &SocketAddr) -> Option<Arc<FakeTransport>> {
        self.transports.lock().get(address).cloned()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl TransportFactory for FakeTransportFactory {
    fn create(&self, device: &Device) -> Arc<dyn CastTransport> {
        let transport = Arc::new(FakeTransport::new(device.clone()));
        if let Some(status) = self.initial_status.lock().clone() {
            transport.set_status(status);
        }
        self.transports
            .lock()
            .insert(device.address(), Arc::clone(&transport));
        self.created.fetch_add(1, Ordering::SeqCst);
        transport
    }
}

/// Discovery source driven by the test.
#[derive(Default)]
pub struct FakeDiscovery {
    observers: Mutex<Vec<Arc<dyn DiscoveryObserver>>>,
    started: AtomicBool,
    fail_start: AtomicBool,
    stop_calls: AtomicUsize,
}

impl FakeDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start()` fail.
    pub fn fail_next_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn discover(&self, device: Device) {
        for observer in self.observers.lock().clone() {
            observer.device_discovered(device.clone());
        }
    }

    pub fn remove(&self, device: Device) {
        for observer in self.observers.lock().clone() {
            observer.device_removed(device.clone());
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }
}

impl DiscoverySource for FakeDiscovery {
    fn register_observer(&self, observer: Arc<dyn DiscoveryObserver>) {
        self.observers.lock().push(observer);
    }

    fn start(&self) -> cast_discovery::Result<()> {
        if self.fail_start.swap(false, Ordering::SeqCst) {
            return Err(DiscoveryError::Daemon("scripted start failure".to_string()));
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(DiscoveryError::AlreadyStarted);
        }
        Ok(())
    }

    fn stop(&self) {
        self.started.store(false, Ordering::SeqCst);
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
    }
}
