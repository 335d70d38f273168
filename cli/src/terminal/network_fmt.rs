// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use crate::kprint;
use crate::terminal::{colors, print};
use colored::*;
use killswitch_common::interface::{InterfaceRecord, InterfaceSets};

pub fn record_to_details(record: &InterfaceRecord, tunnel: bool) -> Vec<print::Detail> {
    let address: ColoredString = match record.prefix {
        Some(prefix) => {
            let ip: ColoredString = record.ip.to_string().color(colors::IPV4_ADDR);
            let prefix: ColoredString = prefix.to_string().color(colors::IPV4_PREFIX);
            format!("{ip}/{prefix}").color(colors::SEPARATOR)
        }
        None => record.ip.to_string().color(colors::IPV4_ADDR),
    };

    let kind: ColoredString = if tunnel {
        "point-to-point".color(colors::SECONDARY)
    } else {
        "up".color(colors::SECONDARY)
    };

    let mut details: Vec<print::Detail> = vec![("Type".to_string(), kind), ("IPv4".to_string(), address)];
    if !record.mac.is_empty() {
        details.push(("MAC".to_string(), record.mac.color(colors::MAC_ADDR)));
    }
    details
}

/// Up interfaces first, then tunnels, each sorted by name.
pub fn print_interfaces(sets: &InterfaceSets) {
    let up = sets.up_sorted().into_iter().map(|r| (r, false));
    let tunnels = sets.point_to_point_sorted().into_iter().map(|r| (r, true));
    let records: Vec<(&InterfaceRecord, bool)> = up.chain(tunnels).collect();

    for (idx, (record, tunnel)) in records.iter().enumerate() {
        print::tree_head(idx, &record.name);
        print::as_tree(record_to_details(record, *tunnel));

        if idx + 1 != records.len() {
            kprint!();
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn tunnel_has_bare_ip_and_no_mac() {
        colored::control::set_override(false);
        let record = InterfaceRecord {
            name: "utun0".into(),
            mac: String::new(),
            ip: Ipv4Addr::new(10, 8, 0, 2),
            prefix: None,
        };
        let details = record_to_details(&record, true);

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].1.to_string(), "point-to-point");
        assert_eq!(details[1].1.to_string(), "10.8.0.2");
    }

    #[test]
    fn lan_interface_shows_prefix_and_mac() {
        colored::control::set_override(false);
        let record = InterfaceRecord {
            name: "en0".into(),
            mac: "aa:bb:cc:dd:ee:ff".into(),
            ip: Ipv4Addr::new(192, 168, 1, 10),
            prefix: Some(24),
        };
        let details = record_to_details(&record, false);

        let keys: Vec<&str> = details.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Type", "IPv4", "MAC"]);
        assert_eq!(details[1].1.to_string(), "192.168.1.10/24");
    }
}
