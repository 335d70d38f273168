// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Routing Table Model
//!
//! Decoding of the routing information base returned by the BSD routing
//! sysctl (`CTL_NET, PF_ROUTE, 0, AF_UNSPEC, NET_RT_DUMP, 0`).
//!
//! The dump is a sequence of `rt_msghdr` records, each followed by the
//! socket addresses announced in its `rtm_addrs` bitmask. The layout decoded
//! here is the Darwin one:
//!
//! ```text
//! offset  size  field
//!      0     2  rtm_msglen
//!      2     1  rtm_version
//!      3     1  rtm_type
//!      4     2  rtm_index
//!      8     4  rtm_flags
//!     12     4  rtm_addrs
//!     ..    ..  pid, seq, errno, use, inits, rt_metrics
//!     92     -  sockaddrs, each padded to 4 bytes
//! ```
//!
//! Parsing is pure so it can be exercised on any host; fetching the dump is
//! left to the system repository.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

use crate::debug;

pub const RTF_UP: i32 = 0x1;
pub const RTF_GATEWAY: i32 = 0x2;
pub const RTF_HOST: i32 = 0x4;
pub const RTF_STATIC: i32 = 0x800;
pub const RTF_PRCLONING: i32 = 0x10000;

/// Up + Gateway + Static + Host, shown as `UGSH` by `netstat -rn`.
pub const UGSH: i32 = RTF_UP | RTF_GATEWAY | RTF_STATIC | RTF_HOST;
/// Up + Gateway + Static + protocol cloning, shown as `UGSc` by `netstat -rn`.
pub const UGSC: i32 = RTF_UP | RTF_GATEWAY | RTF_STATIC | RTF_PRCLONING;

pub const RTAX_DST: usize = 0;
pub const RTAX_GATEWAY: usize = 1;
pub const RTAX_MAX: usize = 8;

pub const RTM_VERSION: u8 = 5;
pub const RT_MSGHDR_LEN: usize = 92;

pub const AF_INET: u8 = 2;
pub const AF_INET6: u8 = 30;

const SOCKADDR_IN_LEN: usize = 16;
const SOCKADDR_IN6_LEN: usize = 28;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("failed to read the routing table: {0}")]
    Fetch(#[source] std::io::Error),

    #[error("routing table queries are not supported on {0}")]
    Unsupported(&'static str),

    #[error("route message at offset {offset} is truncated")]
    Truncated { offset: usize },

    #[error("route message at offset {offset} has an invalid length of {len} bytes")]
    InvalidLength { offset: usize, len: usize },

    #[error("route message has no address in slot {slot}")]
    MissingAddress { slot: usize },

    #[error("unsupported address shape (family {family}, {len} bytes)")]
    UnsupportedAddress { family: u8, len: usize },
}

/// A socket address exactly as the kernel handed it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSockaddr {
    pub family: u8,
    pub bytes: Vec<u8>,
}

/// Route addresses the resolver knows how to turn into an [`IpAddr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAddr {
    Inet4([u8; 4]),
    Inet6([u8; 16]),
}

impl From<RouteAddr> for IpAddr {
    fn from(addr: RouteAddr) -> Self {
        match addr {
            RouteAddr::Inet4(octets) => IpAddr::V4(Ipv4Addr::from(octets)),
            RouteAddr::Inet6(octets) => IpAddr::V6(Ipv6Addr::from(octets)),
        }
    }
}

impl From<IpAddr> for RouteAddr {
    fn from(ip_addr: IpAddr) -> Self {
        match ip_addr {
            IpAddr::V4(ipv4) => RouteAddr::Inet4(ipv4.octets()),
            IpAddr::V6(ipv6) => RouteAddr::Inet6(ipv6.octets()),
        }
    }
}

impl TryFrom<&RawSockaddr> for RouteAddr {
    type Error = RouteError;

    fn try_from(sa: &RawSockaddr) -> Result<Self, Self::Error> {
        let unsupported = || RouteError::UnsupportedAddress {
            family: sa.family,
            len: sa.bytes.len(),
        };

        match sa.family {
            AF_INET => {
                let octets: [u8; 4] = sa
                    .bytes
                    .get(4..8)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(unsupported)?;
                Ok(RouteAddr::Inet4(octets))
            }
            AF_INET6 => {
                let octets: [u8; 16] = sa
                    .bytes
                    .get(8..24)
                    .and_then(|b| b.try_into().ok())
                    .ok_or_else(unsupported)?;
                Ok(RouteAddr::Inet6(octets))
            }
            _ => Err(unsupported()),
        }
    }
}

/// One entry of the routing information base.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteMessage {
    pub flags: i32,
    pub addrs: [Option<RawSockaddr>; RTAX_MAX],
}

impl RouteMessage {
    /// Builds a message carrying only a destination, as a mocked routing table would.
    pub fn with_destination(flags: i32, dst: RouteAddr) -> Self {
        let mut msg = Self {
            flags,
            ..Self::default()
        };
        msg.addrs[RTAX_DST] = Some(encode_sockaddr(dst));
        msg
    }

    /// A host-specific VPN gateway route carries exactly UGSH or UGSc.
    pub fn is_candidate(&self) -> bool {
        self.flags == UGSH || self.flags == UGSC
    }

    pub fn address(&self, slot: usize) -> Result<RouteAddr, RouteError> {
        let sa = self
            .addrs
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(RouteError::MissingAddress { slot })?;
        RouteAddr::try_from(sa)
    }

    pub fn destination(&self) -> Result<RouteAddr, RouteError> {
        self.address(RTAX_DST)
    }
}

/// Decodes a full `NET_RT_DUMP` buffer.
///
/// Messages of a different `rtm_version` are skipped, framing errors abort.
pub fn parse_rib(data: &[u8]) -> Result<Vec<RouteMessage>, RouteError> {
    let mut messages = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let len = read_u16(data, offset).ok_or(RouteError::Truncated { offset })? as usize;
        if len < 4 || offset + len > data.len() {
            return Err(RouteError::InvalidLength { offset, len });
        }

        let msg = &data[offset..offset + len];
        if msg[2] == RTM_VERSION {
            messages.push(parse_message(msg, offset)?);
        }

        offset += len;
    }

    Ok(messages)
}

fn parse_message(msg: &[u8], offset: usize) -> Result<RouteMessage, RouteError> {
    if msg.len() < RT_MSGHDR_LEN {
        return Err(RouteError::Truncated { offset });
    }

    let flags = read_i32(msg, 8).ok_or(RouteError::Truncated { offset })?;
    let present = read_i32(msg, 12).ok_or(RouteError::Truncated { offset })?;

    let mut route = RouteMessage {
        flags,
        ..RouteMessage::default()
    };

    let mut cursor = RT_MSGHDR_LEN;
    for (slot, addr) in route.addrs.iter_mut().enumerate() {
        if present & (1 << slot) == 0 {
            continue;
        }

        // Addresses claimed past the end of the message are dropped, not fatal.
        let Some(&sa_len) = msg.get(cursor) else {
            debug!(verbosity = 2, "Route message at {offset} ends before slot {slot}");
            break;
        };
        let sa_len = sa_len as usize;
        if sa_len > 0 {
            let Some(bytes) = msg.get(cursor..cursor + sa_len) else {
                debug!(verbosity = 2, "Route message at {offset} cuts slot {slot} short");
                break;
            };
            *addr = Some(RawSockaddr {
                family: bytes.get(1).copied().unwrap_or(0),
                bytes: bytes.to_vec(),
            });
        }

        cursor += roundup(sa_len);
    }

    Ok(route)
}

/// Socket addresses are padded to 32-bit boundaries; an empty one still takes 4 bytes.
fn roundup(len: usize) -> usize {
    if len == 0 { 4 } else { (len + 3) & !3 }
}

fn read_u16(data: &[u8], at: usize) -> Option<u16> {
    let bytes: [u8; 2] = data.get(at..at + 2)?.try_into().ok()?;
    Some(u16::from_ne_bytes(bytes))
}

fn read_i32(data: &[u8], at: usize) -> Option<i32> {
    let bytes: [u8; 4] = data.get(at..at + 4)?.try_into().ok()?;
    Some(i32::from_ne_bytes(bytes))
}

/// Lays out `addr` as a `sockaddr_in` / `sockaddr_in6`.
pub fn encode_sockaddr(addr: RouteAddr) -> RawSockaddr {
    match addr {
        RouteAddr::Inet4(octets) => {
            let mut bytes = vec![0u8; SOCKADDR_IN_LEN];
            bytes[0] = SOCKADDR_IN_LEN as u8;
            bytes[1] = AF_INET;
            bytes[4..8].copy_from_slice(&octets);
            RawSockaddr {
                family: AF_INET,
                bytes,
            }
        }
        RouteAddr::Inet6(octets) => {
            let mut bytes = vec![0u8; SOCKADDR_IN6_LEN];
            bytes[0] = SOCKADDR_IN6_LEN as u8;
            bytes[1] = AF_INET6;
            bytes[8..24].copy_from_slice(&octets);
            RawSockaddr {
                family: AF_INET6,
                bytes,
            }
        }
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
