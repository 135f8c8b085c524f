//! Google Cast device discovery library
//!
//! This crate finds Cast receivers (Chromecasts, Google/Nest speakers and
//! speaker groups) on the local network by browsing the
//! `_googlecast._tcp.local.` mDNS service type.
//!
//! # Quick Start
//!
//! ```no_run
//! use cast_discovery::get;
//!
//! // Discover all Cast devices on the network
//! let devices = get();
//! for device in devices {
//!     println!("Found {} at {}", device.name, device.address());
//! }
//! ```
//!
//! # Observer-based Discovery
//!
//! Long-running consumers register a [`DiscoveryObserver`] with a
//! [`DiscoverySource`] and receive found/removed callbacks until the source
//! is stopped:
//!
//! ```no_run
//! use std::sync::Arc;
//! use cast_discovery::{Device, DiscoveryObserver, DiscoverySource, MdnsDiscovery};
//!
//! struct Printer;
//!
//! impl DiscoveryObserver for Printer {
//!     fn device_discovered(&self, device: Device) {
//!         println!("+ {}", device.name);
//!     }
//!     fn device_removed(&self, device: Device) {
//!         println!("- {}", device.name);
//!     }
//! }
//!
//! let discovery = MdnsDiscovery::new();
//! discovery.register_observer(Arc::new(Printer));
//! discovery.start().unwrap();
//! ```

mod error;
pub mod device;
mod mdns;
mod observer;

pub use error::{DiscoveryError, Result};
pub use mdns::{MdnsDiscovery, CAST_SERVICE_TYPE};
pub use observer::{DiscoveryObserver, DiscoverySource};

use std::net::{IpAddr, SocketAddr};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Information about a discovered Cast device.
///
/// Two devices are the same endpoint when their [`address`](Device::address)
/// matches; speaker groups share the IP of a member but listen on their own
/// port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Device {
    /// Cast receiver UUID from the `id` TXT record, or the mDNS instance name
    pub id: String,
    /// Friendly name of the device ("Living Room TV")
    pub name: String,
    /// IP address of the device
    pub ip_address: IpAddr,
    /// Cast control port (typically 8009)
    pub port: u16,
    /// Model name from the `md` TXT record ("Chromecast Ultra")
    pub model_name: Option<String>,
}

impl Device {
    /// Create a device from a display name and socket address.
    ///
    /// The id defaults to the display name; use [`with_id`](Device::with_id)
    /// to set the advertised UUID.
    pub fn new(name: impl Into<String>, address: SocketAddr) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            ip_address: address.ip(),
            port: address.port(),
            model_name: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Socket address used to reach the device and to key it in maps.
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.ip_address, self.port)
    }
}

/// Events emitted during device discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A Cast device was found on the network
    Found(Device),
    /// A previously found device withdrew its advertisement
    Removed(Device),
}

/// Discover all Cast devices on the local network with a default 3-second timeout.
///
/// This is a convenience function that collects all discovered devices into a Vec.
/// For continuous monitoring, register a [`DiscoveryObserver`] with
/// [`MdnsDiscovery`] instead.
pub fn get() -> Vec<Device> {
    get_with_timeout(Duration::from_secs(3))
}

/// Discover all Cast devices on the local network with a custom timeout.
///
/// Devices that are removed again before the timeout expires are not
/// returned. Failure to start the mDNS daemon yields an empty list.
///
/// # Examples
///
/// ```no_run
/// use cast_discovery::get_with_timeout;
/// use std::time::Duration;
///
/// let devices = get_with_timeout(Duration::from_secs(5));
/// for device in devices {
///     println!("Found: {} at {}", device.name, device.address());
/// }
/// ```
pub fn get_with_timeout(timeout: Duration) -> Vec<Device> {
    let (tx, rx) = mpsc::channel();
    let discovery = MdnsDiscovery::new();
    discovery.register_observer(Arc::new(ChannelObserver { tx }));

    if let Err(e) = discovery.start() {
        tracing::warn!(error = %e, "mDNS discovery could not be started");
        return Vec::new();
    }

    let deadline = Instant::now() + timeout;
    let mut devices: Vec<Device> = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(DeviceEvent::Found(device)) => {
                if !devices.iter().any(|d| d.address() == device.address()) {
                    devices.push(device);
                }
            }
            Ok(DeviceEvent::Removed(device)) => {
                devices.retain(|d| d.address() != device.address());
            }
            Err(mpsc::RecvTimeoutError::Timeout) => break,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    discovery.stop();
    devices
}

/// Forwards observer callbacks into a channel.
struct ChannelObserver {
    tx: mpsc::Sender<DeviceEvent>,
}

impl DiscoveryObserver for ChannelObserver {
    fn device_discovered(&self, device: Device) {
        let _ = self.tx.send(DeviceEvent::Found(device));
    }

    fn device_removed(&self, device: Device) {
        let _ = self.tx.send(DeviceEvent::Removed(device));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_address_combines_ip_and_port() {
        let device = Device::new("Kitchen", "192.168.1.30:8009".parse().unwrap());
        assert_eq!(device.address(), "192.168.1.30:8009".parse().unwrap());
        assert_eq!(device.id, "Kitchen");
    }

    #[test]
    fn test_group_and_member_have_distinct_addresses() {
        let member = Device::new("Kitchen", "192.168.1.30:8009".parse().unwrap());
        let group = Device::new("Downstairs", "192.168.1.30:32187".parse().unwrap());
        assert_ne!(member.address(), group.address());
    }

    #[test]
    fn test_device_builders() {
        let device = Device::new("Den", "10.0.0.2:8009".parse().unwrap())
            .with_id("0123abcd")
            .with_model("Chromecast Ultra");
        assert_eq!(device.id, "0123abcd");
        assert_eq!(device.model_name.as_deref(), Some("Chromecast Ultra"));
    }

    #[test]
    fn test_device_serializes_to_json() {
        let device = Device::new("Den", "10.0.0.2:8009".parse().unwrap());
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["name"], "Den");
        assert_eq!(json["ip_address"], "10.0.0.2");
        assert_eq!(json["port"], 8009);
    }
}
