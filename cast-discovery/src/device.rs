//! Resolved-service parsing and validation.
//!
//! Cast receivers advertise themselves on `_googlecast._tcp.local.` and put
//! their human-facing details in TXT records. This module turns those pieces
//! into a [`Device`].

use std::net::IpAddr;

use crate::error::{DiscoveryError, Result};
use crate::Device;

/// Suffix shared by every Cast service instance name.
const CAST_FULLNAME_SUFFIX: &str = "._googlecast._tcp.local.";

/// Default Cast v2 control port.
pub const DEFAULT_CAST_PORT: u16 = 8009;

/// TXT record fields published by Cast receivers.
///
/// - `fn`: friendly name ("Living Room TV")
/// - `md`: model name ("Chromecast Ultra", "Google Cast Group")
/// - `id`: receiver UUID (hex, no dashes)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxtRecord {
    pub friendly_name: Option<String>,
    pub model_name: Option<String>,
    pub id: Option<String>,
}

impl TxtRecord {
    /// Build a record from raw property values, dropping blank entries.
    pub fn new(friendly_name: Option<&str>, model_name: Option<&str>, id: Option<&str>) -> Self {
        Self {
            friendly_name: non_blank(friendly_name),
            model_name: non_blank(model_name),
            id: non_blank(id),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Strip the service suffix from an mDNS instance fullname.
///
/// `"Chromecast-abc123._googlecast._tcp.local."` becomes `"Chromecast-abc123"`.
/// Names without the suffix are returned trimmed of surrounding dots.
pub fn instance_name_from_fullname(fullname: &str) -> String {
    let trimmed = fullname.trim();
    trimmed
        .strip_suffix(CAST_FULLNAME_SUFFIX)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(trimmed)
        .trim_matches('.')
        .to_string()
}

/// Pick the address to connect to.
///
/// IPv4 is preferred; among candidates of the same family the lowest address
/// wins so repeated resolutions of the same service yield the same key.
pub fn preferred_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    let mut v4: Vec<IpAddr> = addresses.iter().copied().filter(IpAddr::is_ipv4).collect();
    v4.sort();
    if let Some(addr) = v4.first() {
        return Some(*addr);
    }

    let mut v6: Vec<IpAddr> = addresses.to_vec();
    v6.sort();
    v6.first().copied()
}

/// Convert a resolved Cast service into a [`Device`].
///
/// # Errors
///
/// Returns `DiscoveryError::InvalidDevice` when the service has no address or
/// advertises port 0.
pub fn device_from_service(
    fullname: &str,
    addresses: &[IpAddr],
    port: u16,
    txt: &TxtRecord,
) -> Result<Device> {
    let ip_address = preferred_address(addresses).ok_or_else(|| {
        DiscoveryError::InvalidDevice(format!("{} resolved without an address", fullname))
    })?;

    if port == 0 {
        return Err(DiscoveryError::InvalidDevice(format!(
            "{} advertised port 0",
            fullname
        )));
    }

    let instance = instance_name_from_fullname(fullname);
    let name = txt.friendly_name.clone().unwrap_or_else(|| instance.clone());
    let id = txt.id.clone().unwrap_or(instance);

    Ok(Device {
        id,
        name,
        ip_address,
        port,
        model_name: txt.model_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Chromecast-1a2b._googlecast._tcp.local.", "Chromecast-1a2b")]
    #[case("  Google-Home-99._googlecast._tcp.local. ", "Google-Home-99")]
    #[case("plain-name", "plain-name")]
    #[case(".dotted.", "dotted")]
    fn test_instance_name_from_fullname(#[case] fullname: &str, #[case] expected: &str) {
        assert_eq!(instance_name_from_fullname(fullname), expected);
    }

    #[test]
    fn test_preferred_address_prefers_ipv4() {
        let addrs: Vec<IpAddr> = vec![
            "fe80::1".parse().unwrap(),
            "192.168.1.20".parse().unwrap(),
            "192.168.1.10".parse().unwrap(),
        ];
        assert_eq!(
            preferred_address(&addrs),
            Some("192.168.1.10".parse().unwrap())
        );
    }

    #[test]
    fn test_preferred_address_falls_back_to_ipv6() {
        let addrs: Vec<IpAddr> = vec!["fe80::2".parse().unwrap(), "fe80::1".parse().unwrap()];
        assert_eq!(preferred_address(&addrs), Some("fe80::1".parse().unwrap()));
        assert_eq!(preferred_address(&[]), None);
    }

    #[test]
    fn test_device_from_service_uses_txt_record() {
        let txt = TxtRecord::new(Some("Living Room"), Some("Chromecast"), Some("abc123"));
        let addrs: Vec<IpAddr> = vec!["192.168.1.50".parse().unwrap()];

        let device =
            device_from_service("Chromecast-abc._googlecast._tcp.local.", &addrs, 8009, &txt)
                .unwrap();

        assert_eq!(device.name, "Living Room");
        assert_eq!(device.id, "abc123");
        assert_eq!(device.model_name.as_deref(), Some("Chromecast"));
        assert_eq!(device.address().to_string(), "192.168.1.50:8009");
    }

    #[test]
    fn test_device_from_service_falls_back_to_instance_name() {
        let txt = TxtRecord::new(Some("   "), None, None);
        let addrs: Vec<IpAddr> = vec!["10.0.0.7".parse().unwrap()];

        let device =
            device_from_service("Kitchen-speaker._googlecast._tcp.local.", &addrs, 8009, &txt)
                .unwrap();

        assert_eq!(device.name, "Kitchen-speaker");
        assert_eq!(device.id, "Kitchen-speaker");
        assert_eq!(device.model_name, None);
    }

    #[test]
    fn test_device_from_service_rejects_missing_address() {
        let result = device_from_service("x._googlecast._tcp.local.", &[], 8009, &TxtRecord::default());
        assert!(matches!(result, Err(DiscoveryError::InvalidDevice(_))));
    }

    #[test]
    fn test_device_from_service_rejects_zero_port() {
        let addrs: Vec<IpAddr> = vec!["10.0.0.7".parse().unwrap()];
        let result = device_from_service("x._googlecast._tcp.local.", &addrs, 0, &TxtRecord::default());
        assert!(matches!(result, Err(DiscoveryError::InvalidDevice(_))));
    }
}
