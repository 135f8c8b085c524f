//! Discovery coordinator
//!
//! Keeps exactly one [`DeviceListener`] per discovered device, keyed by the
//! device's socket address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use cast_api::TransportFactory;
use cast_discovery::{Device, DiscoveryObserver, DiscoverySource};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn, Level};

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::listener::DeviceListener;
use crate::sink::ReportSink;

/// Creates and destroys device listeners as devices come and go.
pub struct DiscoveryCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    discovery: Arc<dyn DiscoverySource>,
    transports: Arc<dyn TransportFactory>,
    sink: Arc<dyn ReportSink>,
    config: MonitorConfig,
    listeners: Mutex<HashMap<SocketAddr, DeviceListener>>,
    started: AtomicBool,
}

impl DiscoveryCoordinator {
    pub fn new(
        discovery: Arc<dyn DiscoverySource>,
        transports: Arc<dyn TransportFactory>,
        sink: Arc<dyn ReportSink>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                discovery,
                transports,
                sink,
                config,
                listeners: Mutex::new(HashMap::new()),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Register with the discovery source and begin discovery.
    ///
    /// # Errors
    ///
    /// `AlreadyStarted` on a second call, or the discovery source's start error.
    pub fn start(&self) -> Result<()> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(MonitorError::AlreadyStarted);
        }

        self.inner.discovery.register_observer(Arc::new(ObserverBridge {
            coordinator: Arc::downgrade(&self.inner),
        }));
        self.inner.discovery.start()?;
        info!("Discovery coordinator started");
        Ok(())
    }

    /// Stop discovery and destroy every listener.
    pub fn shutdown(&self) {
        self.inner.discovery.stop();

        let drained: Vec<DeviceListener> = {
            let mut listeners = self.inner.listeners.lock();
            listeners.drain().map(|(_, listener)| listener).collect()
        };
        for listener in &drained {
            listener.destroy();
        }
        info!(destroyed = drained.len(), "Discovery coordinator shut down");
    }

    pub fn on_device_discovered(&self, device: Device) {
        self.inner.device_discovered(device);
    }

    pub fn on_device_removed(&self, device: Device) {
        self.inner.device_removed(device);
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    pub fn is_monitoring(&self, address: &SocketAddr) -> bool {
        self.inner.listeners.lock().contains_key(address)
    }

    pub fn listener(&self, address: &SocketAddr) -> Option<DeviceListener> {
        self.inner.listeners.lock().get(address).cloned()
    }

    /// Devices currently monitored, in no particular order.
    pub fn devices(&self) -> Vec<Device> {
        self.inner
            .listeners
            .lock()
            .values()
            .map(|listener| listener.device().clone())
            .collect()
    }
}

impl CoordinatorInner {
    fn device_discovered(&self, device: Device) {
        let address = device.address();

        let listener = {
            let mut listeners = self.listeners.lock();
            if listeners.contains_key(&address) {
                drop(listeners);
                error!(device = %device.name, %address, "Device discovered twice, ignoring");
                self.sink.emit(
                    Level::ERROR,
                    &device.name,
                    &format!("Already monitoring {}, ignoring duplicate discovery", address),
                );
                return;
            }

            let transport = self.transports.create(&device);
            let listener = DeviceListener::new(
                device.clone(),
                transport,
                Arc::clone(&self.sink),
                self.config.clone(),
            );
            listeners.insert(address, listener.clone());
            listener
        };

        self.sink.emit(
            Level::INFO,
            &device.name,
            &format!("Found a Cast device at {}", address),
        );

        if let Err(e) = listener.initialize() {
            // Only possible if the device was removed in the meantime.
            debug!(device = %device.name, error = %e, "Listener not initialized");
        }
    }

    fn device_removed(&self, device: Device) {
        let address = device.address();
        let removed = self.listeners.lock().remove(&address);

        match removed {
            Some(listener) => {
                listener.destroy();
                self.sink.emit(
                    Level::INFO,
                    &device.name,
                    &format!("Cast device at {} removed", address),
                );
            }
            None => {
                warn!(device = %device.name, %address, "Removal of unknown device");
                self.sink.emit(
                    Level::WARN,
                    &device.name,
                    &format!("No listener for {}, nothing to remove", address),
                );
            }
        }
    }
}

struct ObserverBridge {
    coordinator: Weak<CoordinatorInner>,
}

impl DiscoveryObserver for ObserverBridge {
    fn device_discovered(&self, device: Device) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.device_discovered(device);
        }
    }

    fn device_removed(&self, device: Device) {
        if let Some(coordinator) = self.coordinator.upgrade() {
            coordinator.device_removed(device);
        }
    }
}
