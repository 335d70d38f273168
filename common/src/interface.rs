// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use crate::debug;
use crate::utils::ip::{as_ipv4, default_prefix_len};
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("failed to enumerate network interfaces: {0}")]
    Enumerate(#[source] std::io::Error),

    #[error("failed to read the addresses of {name}: {source}")]
    Addresses {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why an interface (or every address on it) was left out of both sets.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SkipReason {
    /// The interface is operationally down.
    IsDown,
    /// The loopback interface is never filtered.
    IsLoopback,
    /// None of the bound addresses is a usable IPv4 address.
    NoIpv4Address,
}

/// A classified interface, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    pub name: String,
    pub mac: String,
    pub ip: Ipv4Addr,
    /// Classful prefix, only known for broadcast interfaces.
    pub prefix: Option<u8>,
}

impl InterfaceRecord {
    /// `ip/prefix` for broadcast interfaces, the bare IP for tunnels.
    pub fn address(&self) -> String {
        match self.prefix {
            Some(prefix) => format!("{}/{}", self.ip, prefix),
            None => self.ip.to_string(),
        }
    }
}

impl fmt::Display for InterfaceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.address())
    }
}

/// The two disjoint interface sets, keyed by interface name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSets {
    pub up: HashMap<String, InterfaceRecord>,
    pub point_to_point: HashMap<String, InterfaceRecord>,
}

impl InterfaceSets {
    pub fn up_sorted(&self) -> Vec<&InterfaceRecord> {
        sorted(&self.up)
    }

    pub fn point_to_point_sorted(&self) -> Vec<&InterfaceRecord> {
        sorted(&self.point_to_point)
    }

    pub fn is_disjoint(&self) -> bool {
        self.up.keys().all(|k| !self.point_to_point.contains_key(k))
    }

    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.point_to_point.is_empty()
    }
}

fn sorted(map: &HashMap<String, InterfaceRecord>) -> Vec<&InterfaceRecord> {
    let mut records: Vec<&InterfaceRecord> = map.values().collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}

/// Partitions `interfaces` into the up set and the point-to-point set.
///
/// `addresses` returns the addresses bound to an interface; the first failure
/// aborts the whole pass. Emptiness of either set is left for the caller to judge.
pub fn classify(
    interfaces: &[NetworkInterface],
    addresses: impl Fn(&NetworkInterface) -> Result<Vec<IpNetwork>, InterfaceError>,
) -> Result<InterfaceSets, InterfaceError> {
    let mut sets = InterfaceSets::default();

    for interface in interfaces {
        if let Err(reason) = is_candidate_interface(interface) {
            debug!(verbosity = 2, "Skipping {}: {:?}", interface.name, reason);
            continue;
        }

        let ips = addresses(interface)?;
        let Some(ip) = last_usable_ipv4(&ips) else {
            debug!(
                verbosity = 2,
                "Skipping {}: {:?}",
                interface.name,
                SkipReason::NoIpv4Address
            );
            continue;
        };

        let mac = interface.mac.map(|m| m.to_string()).unwrap_or_default();
        let name = interface.name.clone();

        if interface.is_point_to_point() {
            let record = InterfaceRecord {
                name: name.clone(),
                mac,
                ip,
                prefix: None,
            };
            debug!(verbosity = 1, "Point-to-point interface {}", record);
            sets.up.remove(&name);
            sets.point_to_point.insert(name, record);
        } else {
            let record = InterfaceRecord {
                name: name.clone(),
                mac,
                ip,
                prefix: Some(default_prefix_len(ip)),
            };
            debug!(verbosity = 1, "Up interface {}", record);
            sets.point_to_point.remove(&name);
            sets.up.insert(name, record);
        }
    }

    Ok(sets)
}

fn is_candidate_interface(interface: &NetworkInterface) -> Result<(), SkipReason> {
    if !interface.is_up() {
        return Err(SkipReason::IsDown);
    }
    if interface.is_loopback() {
        return Err(SkipReason::IsLoopback);
    }
    Ok(())
}

/// Later bindings overwrite earlier ones, so the last IPv4 address wins.
/// Only loopback bindings are passed over; `0.0.0.0` still counts.
fn last_usable_ipv4(ips: &[IpNetwork]) -> Option<Ipv4Addr> {
    ips.iter()
        .filter_map(|net| as_ipv4(&net.ip()))
        .filter(|ip| !ip.is_loopback())
        .last()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
