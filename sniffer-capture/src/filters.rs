//! BPF (Berkeley Packet Filter) expression builders
//!
//! Kernel-side filtering only reduces how many frames reach the decoder; the
//! decoder applies its own IPv4/TCP policy regardless.

use std::net::Ipv4Addr;

/// TCP over IPv4, the only traffic the decoder reports
pub fn tcp_over_ipv4_filter() -> String {
    "ip and tcp".to_string()
}

/// Filter for one TCP port, either direction
pub fn tcp_port_filter(port: u16) -> String {
    format!("tcp port {}", port)
}

/// Filter for a TCP port range, either direction
pub fn tcp_port_range_filter(start: u16, end: u16) -> String {
    format!("tcp portrange {}-{}", start, end)
}

/// Filter for traffic to or from one host
pub fn host_filter(ip: Ipv4Addr) -> String {
    format!("host {}", ip)
}

/// Filter for specific source IP
pub fn src_host_filter(ip: Ipv4Addr) -> String {
    format!("src host {}", ip)
}

/// Filter for specific destination IP
pub fn dst_host_filter(ip: Ipv4Addr) -> String {
    format!("dst host {}", ip)
}

/// Filter for a network in CIDR notation
pub fn net_filter(network: Ipv4Addr, prefix_len: u8) -> String {
    format!("net {}/{}", network, prefix_len)
}

/// Combine multiple filters with AND logic, skipping empty ones
pub fn combine_filters(filters: &[&str]) -> String {
    filters
        .iter()
        .filter(|f| !f.trim().is_empty())
        .map(|f| format!("({})", f))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Negate a filter
pub fn not_filter(filter: &str) -> String {
    format!("not ({})", filter)
}

/// Build the filter to install on a capture
///
/// Returns `None` when there is nothing to filter on.
pub fn capture_filter(user: Option<&str>, tcp_only: bool) -> Option<String> {
    let base = if tcp_only {
        tcp_over_ipv4_filter()
    } else {
        String::new()
    };
    let combined = combine_filters(&[base.as_str(), user.unwrap_or_default()]);
    if combined.is_empty() {
        None
    } else {
        Some(combined)
    }
}
