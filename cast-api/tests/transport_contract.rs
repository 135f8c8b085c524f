//! Exercises the transport seam with an in-test implementation.

use std::sync::Arc;

use cast_api::{
    Application, CastTransport, ConnectionListener, EventListener, EventPayload, ListenerId,
    ListenerSet, MediaStatusSnapshot, PlayerState, Result, SpontaneousEvent, StatusSnapshot,
    TransportFactory, Volume,
};
use cast_discovery::Device;
use parking_lot::Mutex;

struct StaticTransport {
    device: Device,
    listeners: ListenerSet<dyn EventListener>,
    connection_listeners: ListenerSet<dyn ConnectionListener>,
}

impl StaticTransport {
    fn push(&self, event: SpontaneousEvent) {
        for listener in self.listeners.snapshot() {
            listener.spontaneous_event_received(event.clone());
        }
    }
}

impl CastTransport for StaticTransport {
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
        self.connection_listeners.register(listener)
    }

    fn unregister_connection_listener(&self, id: ListenerId) {
        self.connection_listeners.unregister(id);
    }

    fn status(&self) -> Result<StatusSnapshot> {
        Ok(StatusSnapshot::new(
            Some(Application::new("CC1AD845", "Default Media Receiver")),
            Volume::new(0.5),
        ))
    }

    fn media_status(&self) -> Result<Option<MediaStatusSnapshot>> {
        Ok(Some(MediaStatusSnapshot::new(PlayerState::Playing, 3.0)))
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<SpontaneousEvent>>,
}

impl EventListener for Recorder {
    fn spontaneous_event_received(&self, event: SpontaneousEvent) {
        self.events.lock().push(event);
    }
}

fn device() -> Device {
    Device::new("Living Room", "192.168.1.40:8009".parse().unwrap())
}

#[test]
fn test_closure_is_a_transport_factory() {
    let factory = |device: &Device| -> Arc<dyn CastTransport> {
        Arc::new(StaticTransport {
            device: device.clone(),
            listeners: ListenerSet::new(),
            connection_listeners: ListenerSet::new(),
        })
    };

    let transport = factory.create(&device());
    assert_eq!(transport.device().name, "Living Room");

    let status = transport.status().unwrap();
    assert_eq!(status.active_app().unwrap().display_name, "Default Media Receiver");
    assert_eq!(status.volume.level, Some(0.5));
}

#[test]
fn test_unregistered_listener_stops_receiving() {
    let transport = StaticTransport {
        device: device(),
        listeners: ListenerSet::new(),
        connection_listeners: ListenerSet::new(),
    };
    let recorder = Arc::new(Recorder::default());
    let id = transport.register_listener(recorder.clone());

    transport.push(SpontaneousEvent::other("connection", "CLOSE"));
    transport.unregister_listener(id);
    transport.push(SpontaneousEvent::other("connection", "CLOSE"));

    let events = recorder.events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, EventPayload::Other("CLOSE".to_string()));
    assert_eq!(events[0].source, "connection");
}
