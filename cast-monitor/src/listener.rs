//! Per-device listener
//!
//! A [`DeviceListener`] watches exactly one device: it subscribes to the
//! transport's push events and connection changes, drives a [`PollTimer`]
//! while the device is connected, and writes formatted reports to the sink.
//!
//! ```text
//! Uninitialized --initialize()--> Active { subscriptions, timer } --destroy()--> Destroyed
//! ```
//!
//! The transport and the timer only ever see the listener through weak
//! references, so dropping the last [`DeviceListener`] handle releases it
//! even without `destroy()`.

use std::fmt;
use std::mem;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};

use cast_api::{
    CastTransport, ConnectionListener, EventListener, EventPayload, ListenerId,
    MediaStatusSnapshot, SpontaneousEvent, StatusSnapshot,
};
use cast_discovery::Device;
use parking_lot::Mutex;
use tracing::{debug, Level};

use crate::config::{MonitorConfig, ReconnectPolicy};
use crate::error::{MonitorError, Result};
use crate::formatter::{format_media_status, format_status, Report};
use crate::poller::{PollTarget, PollTimer};
use crate::sink::ReportSink;

/// Lifecycle phase of a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerPhase {
    Uninitialized,
    Active,
    Destroyed,
}

impl fmt::Display for ListenerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListenerPhase::Uninitialized => "uninitialized",
            ListenerPhase::Active => "active",
            ListenerPhase::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

enum ListenerState {
    Uninitialized,
    Active(ActiveState),
    Destroyed,
}

impl ListenerState {
    fn phase(&self) -> ListenerPhase {
        match self {
            ListenerState::Uninitialized => ListenerPhase::Uninitialized,
            ListenerState::Active(_) => ListenerPhase::Active,
            ListenerState::Destroyed => ListenerPhase::Destroyed,
        }
    }
}

struct ActiveState {
    /// `None` while registration is in progress
    subscriptions: Option<Subscriptions>,
    timer: TimerState,
}

struct Subscriptions {
    events: ListenerId,
    connection: ListenerId,
}

enum TimerState {
    Stopped,
    /// Stopped by a disconnect; only a reconnect may start it again.
    Suspended,
    Running(PollTimer),
}

impl TimerState {
    fn is_running(&self) -> bool {
        matches!(self, TimerState::Running(timer) if timer.is_running())
    }

    fn stop(&mut self) -> bool {
        self.halt(TimerState::Stopped)
    }

    fn suspend(&mut self) -> bool {
        self.halt(TimerState::Suspended)
    }

    fn is_suspended(&self) -> bool {
        matches!(self, TimerState::Suspended)
    }

    fn halt(&mut self, next: TimerState) -> bool {
        match mem::replace(self, next) {
            TimerState::Running(timer) => {
                let was_running = timer.is_running();
                timer.stop();
                was_running
            }
            TimerState::Stopped | TimerState::Suspended => false,
        }
    }
}

/// Monitors one device. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DeviceListener {
    inner: Arc<ListenerInner>,
}

struct ListenerInner {
    device: Device,
    transport: Arc<dyn CastTransport>,
    sink: Arc<dyn ReportSink>,
    config: MonitorConfig,
    state: Mutex<ListenerState>,
    this: Weak<ListenerInner>,
}

impl DeviceListener {
    pub fn new(
        device: Device,
        transport: Arc<dyn CastTransport>,
        sink: Arc<dyn ReportSink>,
        config: MonitorConfig,
    ) -> Self {
        let inner = Arc::new_cyclic(|this| ListenerInner {
            device,
            transport,
            sink,
            config,
            state: Mutex::new(ListenerState::Uninitialized),
            this: this.clone(),
        });
        Self { inner }
    }

    /// Subscribe to push and connection events and start polling.
    ///
    /// The initial status fetch happens on the timer thread as its first
    /// tick, so this returns without touching the network. If that fetch
    /// fails the timer ends and the listener stays Active without polling.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` or `Destroyed` if the listener is not
    /// Uninitialized; nothing changes in that case.
    pub fn initialize(&self) -> Result<()> {
        self.inner.initialize()
    }

    /// Run one poll tick on the calling thread.
    ///
    /// Returns false without doing anything unless the listener is Active.
    pub fn poll_now(&self) -> bool {
        self.inner.poll_now()
    }

    /// Tear down: stop the timer and drop both registrations. Idempotent.
    pub fn destroy(&self) {
        self.inner.destroy();
    }

    pub fn connection_event_received(&self, connected: bool) {
        self.inner.handle_connection(connected);
    }

    pub fn spontaneous_event_received(&self, event: SpontaneousEvent) {
        self.inner.handle_event(event);
    }

    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    pub fn phase(&self) -> ListenerPhase {
        self.inner.state.lock().phase()
    }

    /// Whether a poll timer is currently scheduling ticks.
    pub fn is_polling(&self) -> bool {
        match &*self.inner.state.lock() {
            ListenerState::Active(active) => active.timer.is_running(),
            _ => false,
        }
    }

    /// Whether both push and connection registrations are in place.
    pub fn is_subscribed(&self) -> bool {
        match &*self.inner.state.lock() {
            ListenerState::Active(active) => active.subscriptions.is_some(),
            _ => false,
        }
    }
}

impl fmt::Debug for DeviceListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceListener")
            .field("device", &self.inner.device.name)
            .field("address", &self.inner.device.address())
            .field("phase", &self.phase())
            .finish()
    }
}

impl ListenerInner {
    fn name(&self) -> &str {
        &self.device.name
    }

    fn initialize(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            match &*state {
                ListenerState::Uninitialized => {}
                ListenerState::Active(_) => {
                    return Err(MonitorError::AlreadyInitialized(self.device.name.clone()))
                }
                ListenerState::Destroyed => return Err(MonitorError::Destroyed(self.device.name.clone())),
            }
            *state = ListenerState::Active(ActiveState {
                subscriptions: None,
                timer: TimerState::Stopped,
            });
        }

        // Registration happens unlocked: a transport may call back synchronously.
        let events = self.transport.register_listener(Arc::new(EventBridge {
            listener: self.this.clone(),
        }));
        let connection = self
            .transport
            .register_connection_listener(Arc::new(ConnectionBridge {
                listener: self.this.clone(),
            }));

        let mut state = self.state.lock();
        match &mut *state {
            ListenerState::Active(active) => {
                active.subscriptions = Some(Subscriptions { events, connection });
                // A disconnect reported during registration keeps polling off.
                if !active.timer.is_suspended() {
                    self.start_timer(active);
                }
                drop(state);
                debug!(device = %self.name(), address = %self.device.address(), "Listener initialized");
            }
            _ => {
                // Destroyed while registering.
                drop(state);
                self.transport.unregister_listener(events);
                self.transport.unregister_connection_listener(connection);
                debug!(device = %self.name(), "Listener destroyed during initialize");
            }
        }
        Ok(())
    }

    fn start_timer(&self, active: &mut ActiveState) {
        if active.timer.is_running() {
            return;
        }
        match PollTimer::start(self.name(), self.config.poll_interval, self.this.clone()) {
            Ok(timer) => active.timer = TimerState::Running(timer),
            Err(e) => {
                self.sink
                    .emit(Level::ERROR, self.name(), &format!("Failed to start poll timer: {}", e));
            }
        }
    }

    fn destroy(&self) {
        let previous = mem::replace(&mut *self.state.lock(), ListenerState::Destroyed);

        if let ListenerState::Active(mut active) = previous {
            active.timer.stop();
            if let Some(subscriptions) = active.subscriptions.take() {
                self.transport.unregister_listener(subscriptions.events);
                self.transport
                    .unregister_connection_listener(subscriptions.connection);
            }
            debug!(device = %self.name(), "Listener destroyed");
        }
    }

    fn handle_connection(&self, connected: bool) {
        let mut state = self.state.lock();
        let ListenerState::Active(active) = &mut *state else {
            return;
        };

        if !connected {
            let stopped = active.timer.suspend();
            drop(state);
            let line = if stopped {
                "Disconnected, polling stopped"
            } else {
                "Disconnected"
            };
            self.sink.emit(Level::INFO, self.name(), line);
            return;
        }

        match self.config.reconnect_policy {
            ReconnectPolicy::KeepStopped => {
                drop(state);
                self.sink.emit(Level::INFO, self.name(), "Connected");
            }
            ReconnectPolicy::ResumePolling => {
                let resumed = !active.timer.is_running();
                self.start_timer(active);
                drop(state);
                let line = if resumed {
                    "Connected, polling resumed"
                } else {
                    "Connected"
                };
                self.sink.emit(Level::INFO, self.name(), line);
            }
        }
    }

    fn handle_event(&self, event: SpontaneousEvent) {
        if self.state.lock().phase() != ListenerPhase::Active {
            debug!(device = %self.name(), "Ignoring event for inactive listener");
            return;
        }

        match event.payload {
            EventPayload::Status(status) => self.report_status(&status),
            EventPayload::MediaStatus(media) => self.report_media(&media),
            EventPayload::Other(raw) => {
                self.sink.emit(
                    Level::INFO,
                    self.name(),
                    &format!("Not handling message from {}: {}", event.source, raw),
                );
            }
        }
    }

    fn is_active(&self) -> bool {
        matches!(&*self.state.lock(), ListenerState::Active(_))
    }

    /// Active with its timer still scheduled.
    fn timer_may_tick(&self) -> bool {
        match &*self.state.lock() {
            ListenerState::Active(active) => matches!(active.timer, TimerState::Running(_)),
            _ => false,
        }
    }

    fn poll_now(&self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.run_tick();
        true
    }

    /// Fetch and report status, then media status if something is cast.
    fn run_tick(&self) -> bool {
        match self.transport.status() {
            Ok(status) => {
                self.report_status(&status);
                if status.active_app().is_some() {
                    self.fetch_media();
                }
                true
            }
            Err(e) => {
                self.sink
                    .emit(Level::ERROR, self.name(), &format!("Status fetch failed: {}", e));
                false
            }
        }
    }

    fn fetch_media(&self) {
        match self.transport.media_status() {
            Ok(Some(media)) => self.report_media(&media),
            Ok(None) => debug!(device = %self.name(), "No media session"),
            Err(e) => {
                self.sink
                    .emit(Level::ERROR, self.name(), &format!("Media status fetch failed: {}", e));
            }
        }
    }

    fn report_status(&self, status: &StatusSnapshot) {
        self.emit_report(&format_status(status));
    }

    fn report_media(&self, media: &MediaStatusSnapshot) {
        self.emit_report(&format_media_status(media));
    }

    fn emit_report(&self, report: &Report) {
        for line in report.render(self.config.report_style) {
            self.sink.emit(Level::INFO, self.name(), &line);
        }
    }
}

impl PollTarget for ListenerInner {
    fn poll_tick(&self, first: bool) -> ControlFlow<()> {
        if !self.timer_may_tick() {
            return ControlFlow::Break(());
        }

        let fetched = self.run_tick();
        if first && !fetched {
            self.sink.emit(
                Level::ERROR,
                self.name(),
                "Initial status unavailable, not polling",
            );
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

struct EventBridge {
    listener: Weak<ListenerInner>,
}

impl EventListener for EventBridge {
    fn spontaneous_event_received(&self, event: SpontaneousEvent) {
        if let Some(listener) = self.listener.upgrade() {
            listener.handle_event(event);
        }
    }
}

struct ConnectionBridge {
    listener: Weak<ListenerInner>,
}

impl ConnectionListener for ConnectionBridge {
    fn connection_event_received(&self, connected: bool) {
        if let Some(listener) = self.listener.upgrade() {
            listener.handle_connection(connected);
        }
    }
}
