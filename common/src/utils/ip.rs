// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::net::{IpAddr, Ipv4Addr};

use thiserror::Error;

/// Addresses that show up on gateway routes without ever being a VPN peer
/// (the unspecified address and the upper half of a split default route).
pub const PLACEHOLDER_ADDRS: [Ipv4Addr; 2] = [Ipv4Addr::UNSPECIFIED, Ipv4Addr::new(128, 0, 0, 0)];

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum IpError {
    #[error("{0:?} is not a valid IP address")]
    Invalid(String),
}

pub fn parse_ip(text: &str) -> Result<IpAddr, IpError> {
    text.trim()
        .parse::<IpAddr>()
        .map_err(|_| IpError::Invalid(text.to_string()))
}

/// Checks whether `ip` belongs to one of the RFC 1918 blocks
/// (10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16).
///
/// Unparsable input is reported as an error and never as "not private".
pub fn is_private(ip: &str) -> Result<bool, IpError> {
    parse_ip(ip).map(|addr| is_private_addr(&addr))
}

pub fn is_private_addr(ip_addr: &IpAddr) -> bool {
    match ip_addr {
        IpAddr::V4(ipv4) => ipv4.is_private(),
        IpAddr::V6(ipv6) => ipv6.to_ipv4_mapped().is_some_and(|v4| v4.is_private()),
    }
}

pub fn is_placeholder(ip_addr: &IpAddr) -> bool {
    match ip_addr {
        IpAddr::V4(ipv4) => PLACEHOLDER_ADDRS.contains(ipv4),
        IpAddr::V6(_) => false,
    }
}

/// Returns the IPv4 form of an address, unwrapping IPv4-mapped IPv6.
pub fn as_ipv4(ip_addr: &IpAddr) -> Option<Ipv4Addr> {
    match ip_addr {
        IpAddr::V4(ipv4) => Some(*ipv4),
        IpAddr::V6(ipv6) => ipv6.to_ipv4_mapped(),
    }
}

/// Prefix length of the classful default mask (A: /8, B: /16, everything else: /24).
pub fn default_prefix_len(ipv4: Ipv4Addr) -> u8 {
    match ipv4.octets()[0] {
        0..=127 => 8,
        128..=191 => 16,
        _ => 24,
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
