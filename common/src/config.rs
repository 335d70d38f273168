// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::time::Duration;

/// Where the generated ruleset is written before `pfctl` loads it.
pub const DEFAULT_RULES_PATH: &str = "/tmp/killswitch.pf.conf";

/// Upper bound for each public IP lookup (DNS or HTTP).
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Runtime options for a single killswitch invocation.
///
/// Built from the command line by the CLI crate so that the core crates stay
/// unaware of how the options were supplied.
#[derive(Debug, Clone)]
pub struct Config {
    /// VPN peer supplied by the user.
    ///
    /// `None` (or an empty string) means the peer is looked up in the
    /// kernel routing table instead.
    pub peer_ip: Option<String>,

    /// Lets ICMP echo requests and DNS queries leave outside the tunnel.
    pub allow_icmp_and_dns: bool,

    /// Lets hosts on the same local network talk to each other.
    pub allow_local_subnet: bool,

    /// Keeps the Apple Wireless Direct Link interface open (AirDrop, AirPlay).
    pub allow_neighbor_discovery: bool,

    /// Destination of the generated pf ruleset.
    pub rules_path: PathBuf,

    /// Timeout applied to every public IP lookup.
    pub lookup_timeout: Duration,

    /// Controls the visual density of the terminal output.
    ///
    /// # Levels
    /// * **0** (Default): Headers, trees and colors.
    /// * **1**: No headers or dividers.
    pub quiet: u8,

    /// Number of `-v` flags; events tagged with a higher `verbosity` are hidden.
    pub verbosity: u8,
}

/// Optional allowances the rule synthesizer punches into the default-deny policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOptions {
    pub allow_icmp_and_dns: bool,
    pub allow_local_subnet: bool,
    pub allow_neighbor_discovery: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            peer_ip: None,
            allow_icmp_and_dns: false,
            allow_local_subnet: false,
            allow_neighbor_discovery: false,
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            quiet: 0,
            verbosity: 0,
        }
    }
}

impl Config {
    /// The user supplied peer, with blank input treated as absent.
    pub fn supplied_peer(&self) -> Option<&str> {
        self.peer_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }

    pub fn rule_options(&self) -> RuleOptions {
        RuleOptions {
            allow_icmp_and_dns: self.allow_icmp_and_dns,
            allow_local_subnet: self.allow_local_subnet,
            allow_neighbor_discovery: self.allow_neighbor_discovery,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_peer_counts_as_absent() {
        let mut cfg = Config {
            peer_ip: Some("  ".to_string()),
            ..Config::default()
        };
        assert_eq!(cfg.supplied_peer(), None);

        cfg.peer_ip = Some("1.2.3.4".to_string());
        assert_eq!(cfg.supplied_peer(), Some("1.2.3.4"));
    }

    #[test]
    fn defaults_point_at_tmp() {
        let cfg = Config::default();
        assert_eq!(cfg.rules_path, PathBuf::from("/tmp/killswitch.pf.conf"));
        assert_eq!(cfg.lookup_timeout, Duration::from_secs(3));
        assert_eq!(cfg.rule_options(), RuleOptions::default());
    }

    #[test]
    fn rule_options_follow_flags() {
        let cfg = Config {
            allow_icmp_and_dns: true,
            allow_neighbor_discovery: true,
            ..Config::default()
        };
        let options = cfg.rule_options();
        assert!(options.allow_icmp_and_dns);
        assert!(!options.allow_local_subnet);
        assert!(options.allow_neighbor_discovery);
    }
}
