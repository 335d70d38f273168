// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # VPN Peer Resolution
//!
//! Finds the remote end of the tunnel. A peer given by the user is parsed and
//! taken at face value. Otherwise the routing table is scanned for host routes
//! flagged `UGSH` or `UGSc`, and the first destination that is neither private
//! nor a placeholder wins.
//!
//! An exhausted scan is not an error: the last address seen (or `0.0.0.0`) is
//! returned as a [`PeerResolution::Fallback`] and rejecting it is up to the caller.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use killswitch_common::models::route::{RouteAddr, RouteError, RouteMessage};
use killswitch_common::system::NetworkRepository;
use killswitch_common::utils::ip::{self, IpError};
use killswitch_common::{debug, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error(transparent)]
    InvalidIp(#[from] IpError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Where the peer address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerResolution {
    /// Given on the command line.
    Supplied(IpAddr),
    /// A candidate route passed every filter.
    Discovered(IpAddr),
    /// No candidate qualified; holds the last address seen or `0.0.0.0`.
    Fallback(IpAddr),
}

impl PeerResolution {
    pub fn ip(&self) -> IpAddr {
        match self {
            Self::Supplied(ip) | Self::Discovered(ip) | Self::Fallback(ip) => *ip,
        }
    }

    /// True when the address is usable as a pf `vpn_ip`.
    pub fn is_usable(&self) -> bool {
        match self.ip() {
            IpAddr::V4(ipv4) => !ipv4.is_unspecified(),
            IpAddr::V6(_) => false,
        }
    }
}

impl fmt::Display for PeerResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip())
    }
}

/// Resolves the peer from `supplied`, or from the routing table when it is absent or blank.
pub fn resolve(
    supplied: Option<&str>,
    repo: &dyn NetworkRepository,
) -> Result<PeerResolution, PeerError> {
    match supplied.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => {
            let ip_addr: IpAddr = ip::parse_ip(text)?;
            debug!(verbosity = 1, "Using supplied peer {ip_addr}");
            Ok(PeerResolution::Supplied(ip_addr))
        }
        None => {
            let messages: Vec<RouteMessage> = repo.get_route_messages()?;
            info!(
                verbosity = 1,
                "Scanning {} routes for the VPN peer",
                messages.len()
            );
            Ok(select_peer(&messages))
        }
    }
}

/// First-match-wins scan over candidate routes, in kernel order.
pub fn select_peer(messages: &[RouteMessage]) -> PeerResolution {
    let mut last_seen: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

    for message in messages.iter().filter(|m| m.is_candidate()) {
        let dst: RouteAddr = match message.destination() {
            Ok(dst) => dst,
            Err(e) => {
                debug!(verbosity = 2, "Skipping candidate route: {e}");
                continue;
            }
        };

        let ip_addr = IpAddr::from(dst);
        last_seen = ip_addr;

        if ip::is_private_addr(&ip_addr) {
            debug!(verbosity = 2, "Skipping private route destination {ip_addr}");
            continue;
        }
        if ip::is_placeholder(&ip_addr) {
            debug!(verbosity = 2, "Skipping placeholder route destination {ip_addr}");
            continue;
        }

        return PeerResolution::Discovered(ip_addr);
    }

    PeerResolution::Fallback(last_seen)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
