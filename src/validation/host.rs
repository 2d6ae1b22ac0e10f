//! Host classification for target URLs.
//!
//! Private, loopback, link-local and localhost targets are rejected unless the
//! caller explicitly allows them: analysing them would point the checker at
//! internal infrastructure.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Checks if an IPv4 address is private/internal.
///
/// Private ranges:
/// - 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16 (RFC 1918)
/// - 127.0.0.0/8 (loopback)
/// - 169.254.0.0/16 (link-local)
/// - 100.64.0.0/10 (carrier-grade NAT)
/// - 0.0.0.0/8 (this network)
/// - 224.0.0.0/4 (multicast) and 240.0.0.0/4 (reserved)
pub(crate) fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    match octets[0] {
        0 | 10 | 127 => true,
        100 => (64..=127).contains(&octets[1]),
        169 => octets[1] == 254,
        172 => (16..=31).contains(&octets[1]),
        192 => octets[1] == 168,
        224..=255 => true,
        _ => false,
    }
}

/// Checks if an IPv6 address is private/internal.
///
/// - ::1 (loopback) and :: (unspecified)
/// - fc00::/7 (unique local addresses)
/// - fe80::/10 (link-local)
/// - ff00::/8 (multicast)
/// - IPv4-mapped addresses are checked against the IPv4 rules
pub(crate) fn is_private_ipv6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_ipv4(v4);
    }
    let first = ip.segments()[0];
    (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80 || (first & 0xff00) == 0xff00
}

/// Checks if a domain name is a localhost variant.
pub(crate) fn is_localhost_domain(domain: &str) -> bool {
    let domain_lower = domain.to_lowercase();
    let trimmed = domain_lower.trim_end_matches('.');
    matches!(trimmed, "localhost" | "localhost.localdomain")
        || trimmed.ends_with(".localhost")
        || trimmed.ends_with(".local")
        || trimmed.ends_with(".internal")
}
