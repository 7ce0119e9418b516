use std::net::IpAddr;

use camfleet_common::discovery::ProbeData;
use colored::*;

use crate::terminal::colors;

type Detail = (String, ColoredString);

pub fn ip_to_detail(raw: &str, ip: Option<IpAddr>) -> Option<Detail> {
    match ip {
        Some(IpAddr::V4(addr)) => Some(("IPv4".to_string(), addr.to_string().color(colors::IPV4_ADDR))),
        Some(IpAddr::V6(addr)) => Some(("IPv6".to_string(), addr.to_string().color(colors::IPV6_ADDR))),
        None if !raw.is_empty() => Some(("IP".to_string(), raw.normal())),
        None => None,
    }
}

/// Key/value rows describing a discovered device, skipping empty fields.
pub fn probe_to_details(probe: &ProbeData) -> Vec<Detail> {
    let mut details: Vec<Detail> = Vec::new();

    if let Some(detail) = ip_to_detail(&probe.device_ip, probe.ip()) {
        details.push(detail);
    }
    if !probe.device_service_address.is_empty() {
        details.push(("Service".to_string(), probe.device_service_address.color(colors::URL)));
    }
    if let Some(location) = probe.scope("location") {
        details.push(("Location".to_string(), location.normal()));
    }
    if let Some(hardware) = probe.scope("hardware") {
        details.push(("Hardware".to_string(), hardware.normal()));
    }
    if !probe.types.is_empty() {
        details.push(("Types".to_string(), probe.types.join(", ").normal()));
    }
    if !probe.metadata_version.is_empty() {
        details.push(("Metadata".to_string(), probe.metadata_version.dimmed()));
    }
    details.push(("Endpoint".to_string(), probe.endpoint_address.dimmed()));

    details
}
