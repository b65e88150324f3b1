//! SSRF address classification shared by the pre-fetch hostname check and
//! the dial-time guard inside the fetch client.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Returns true if the IP must never be dialed on behalf of a client:
/// loopback, RFC 1918 private, link-local, unspecified, multicast,
/// CGNAT (100.64.0.0/10), or IPv6 unique-local. IPv4-mapped IPv6
/// addresses are unwrapped and re-checked so `::ffff:127.0.0.1` cannot
/// slip past the v4 rules.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_multicast()
                || is_cgnat(v4)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || is_ipv6_link_local(&v6)
                || is_ipv6_unique_local(&v6)
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_blocked_ip(IpAddr::V4(v4)))
        }
    }
}

/// Carrier-Grade NAT range 100.64.0.0/10, not covered by `is_private`.
fn is_cgnat(v4: Ipv4Addr) -> bool {
    let octets = v4.octets();
    octets[0] == 100 && (64..=127).contains(&octets[1])
}

fn is_ipv6_link_local(v6: &Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xffc0) == 0xfe80
}

fn is_ipv6_unique_local(v6: &Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xfe00) == 0xfc00
}
