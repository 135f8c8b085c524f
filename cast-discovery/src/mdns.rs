//! mDNS-backed discovery source.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::device::{device_from_service, TxtRecord};
use crate::error::{DiscoveryError, Result};
use crate::observer::{DiscoveryObserver, DiscoverySource};
use crate::Device;

/// Service type advertised by every Cast receiver.
pub const CAST_SERVICE_TYPE: &str = "_googlecast._tcp.local.";

const RECV_POLL: Duration = Duration::from_millis(250);

type ObserverList = Arc<RwLock<Vec<Arc<dyn DiscoveryObserver>>>>;

/// Discovers Cast devices by browsing [`CAST_SERVICE_TYPE`].
///
/// A single background thread drains the mDNS daemon's event channel and
/// forwards resolved and removed services to every registered observer.
/// Re-resolutions of an already known service are swallowed; a known service
/// that moves to a new address is reported as a removal followed by a
/// discovery.
pub struct MdnsDiscovery {
    observers: ObserverList,
    worker: Mutex<Option<BrowseWorker>>,
}

struct BrowseWorker {
    daemon: ServiceDaemon,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MdnsDiscovery {
    pub fn new() -> Self {
        Self {
            observers: Arc::new(RwLock::new(Vec::new())),
            worker: Mutex::new(None),
        }
    }

    /// Whether the browse thread is running.
    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }
}

impl Default for MdnsDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoverySource for MdnsDiscovery {
    fn register_observer(&self, observer: Arc<dyn DiscoveryObserver>) {
        self.observers.write().push(observer);
    }

    fn start(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(DiscoveryError::AlreadyStarted);
        }

        let daemon = ServiceDaemon::new().map_err(|e| DiscoveryError::Daemon(e.to_string()))?;
        let receiver = daemon
            .browse(CAST_SERVICE_TYPE)
            .map_err(|e| DiscoveryError::Browse {
                service_type: CAST_SERVICE_TYPE.to_string(),
                message: e.to_string(),
            })?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let observers = Arc::clone(&self.observers);

        let handle = thread::Builder::new()
            .name("cast-mdns-browse".to_string())
            .spawn(move || {
                let mut known: HashMap<String, Device> = HashMap::new();
                while !thread_shutdown.load(Ordering::Relaxed) {
                    match receiver.recv_timeout(RECV_POLL) {
                        Ok(ServiceEvent::ServiceResolved(info)) => {
                            handle_resolved(&info, &mut known, &observers);
                        }
                        Ok(ServiceEvent::ServiceRemoved(_, fullname)) => {
                            if let Some(device) = known.remove(&fullname) {
                                info!(device = %device.name, address = %device.address(), "Cast device removed");
                                notify(&observers, |o| o.device_removed(device.clone()));
                            } else {
                                debug!(%fullname, "Removal for unknown service");
                            }
                        }
                        Ok(other) => {
                            debug!(event = ?other, "mDNS event");
                        }
                        Err(_) => {
                            if receiver.is_disconnected() {
                                debug!("mDNS browse channel closed");
                                break;
                            }
                        }
                    }
                }
                debug!("mDNS browse thread exiting");
            })
            .map_err(|e| DiscoveryError::Daemon(format!("failed to spawn browse thread: {}", e)))?;

        info!(service_type = CAST_SERVICE_TYPE, "mDNS discovery started");
        *worker = Some(BrowseWorker {
            daemon,
            shutdown,
            handle: Some(handle),
        });
        Ok(())
    }

    fn stop(&self) {
        let Some(mut worker) = self.worker.lock().take() else {
            return;
        };

        worker.shutdown.store(true, Ordering::Relaxed);
        if let Err(e) = worker.daemon.stop_browse(CAST_SERVICE_TYPE) {
            debug!(error = %e, "stop_browse failed");
        }
        if let Err(e) = worker.daemon.shutdown() {
            debug!(error = %e, "mDNS daemon shutdown failed");
        }

        if let Some(handle) = worker.handle.take() {
            // An observer may call stop() from the browse thread itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        info!("mDNS discovery stopped");
    }
}

impl Drop for MdnsDiscovery {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_resolved(info: &ServiceInfo, known: &mut HashMap<String, Device>, observers: &ObserverList) {
    let fullname = info.get_fullname().to_string();
    let properties = info.get_properties();
    let txt = TxtRecord::new(
        properties.get("fn").map(|v| v.val_str()),
        properties.get("md").map(|v| v.val_str()),
        properties.get("id").map(|v| v.val_str()),
    );
    let addresses: Vec<IpAddr> = info.get_addresses().iter().copied().collect();

    let device = match device_from_service(&fullname, &addresses, info.get_port(), &txt) {
        Ok(device) => device,
        Err(e) => {
            warn!(%fullname, error = %e, "Ignoring unusable Cast advertisement");
            return;
        }
    };

    if let Some(previous) = known.get(&fullname) {
        if previous.address() == device.address() {
            debug!(device = %device.name, "Service re-resolved at the same address");
            return;
        }
        let previous = previous.clone();
        info!(
            device = %device.name,
            from = %previous.address(),
            to = %device.address(),
            "Cast device moved"
        );
        notify(observers, |o| o.device_removed(previous.clone()));
    }

    info!(device = %device.name, address = %device.address(), "Found a Cast device");
    known.insert(fullname, device.clone());
    notify(observers, |o| o.device_discovered(device.clone()));
}

fn notify(observers: &ObserverList, f: impl Fn(&dyn DiscoveryObserver)) {
    let snapshot: Vec<Arc<dyn DiscoveryObserver>> = observers.read().clone();
    for observer in &snapshot {
        f(observer.as_ref());
    }
}
