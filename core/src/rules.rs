// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # pf Rule Synthesis
//!
//! Renders the kill switch ruleset in the BSD `pf.conf` dialect:
//!
//! 1. A comment header with the generation time and the reload command.
//! 2. Macros: `int_<name>` per up interface, `vpn_<name>` per tunnel, `vpn_ip`.
//! 3. Global policy, anchored by `block all`.
//! 4. The per-interface pass rules, collected while the macros were written.
//!
//! Interface names are sorted while rendering, so identical inputs and an
//! identical timestamp give byte-identical output.

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use killswitch_common::config::{DEFAULT_RULES_PATH, RuleOptions};
use killswitch_common::interface::InterfaceSets;

/// Apple Wireless Direct Link, used by AirDrop and AirPlay.
pub const NEIGHBOR_DISCOVERY_INTERFACE: &str = "awdl0";

const SEPARATOR_WIDTH: usize = 62;
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// A rendered ruleset, ready to be written to disk or printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PfRules(String);

impl PfRules {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rule lines with the comment header and blank lines removed.
    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.0
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
    }
}

impl Display for PfRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PfRules {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Owns the text buffers while a ruleset is being rendered.
pub struct RulesBuilder<'a> {
    sets: &'a InterfaceSets,
    peer_ip: &'a str,
    options: RuleOptions,
    rules_path: PathBuf,
    text: String,
    deferred: String,
}

impl<'a> RulesBuilder<'a> {
    pub fn new(sets: &'a InterfaceSets, peer_ip: &'a str) -> Self {
        Self {
            sets,
            peer_ip,
            options: RuleOptions::default(),
            rules_path: PathBuf::from(DEFAULT_RULES_PATH),
            text: String::new(),
            deferred: String::new(),
        }
    }

    pub fn options(mut self, options: RuleOptions) -> Self {
        self.options = options;
        self
    }

    /// Path quoted in the reload command of the header.
    pub fn rules_path(mut self, path: impl AsRef<Path>) -> Self {
        self.rules_path = path.as_ref().to_path_buf();
        self
    }

    pub fn build(self) -> PfRules {
        self.build_at(Local::now())
    }

    pub fn build_at<Tz>(mut self, generated_at: DateTime<Tz>) -> PfRules
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.header(&generated_at.format(TIMESTAMP_FORMAT).to_string());
        self.macros();
        self.policy();
        self.text.push('\n');
        self.text.push_str(&self.deferred);
        PfRules(self.text)
    }

    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn defer(&mut self, line: impl AsRef<str>) {
        self.deferred.push_str(line.as_ref());
        self.deferred.push('\n');
    }

    fn header(&mut self, timestamp: &str) {
        let separator = "-".repeat(SEPARATOR_WIDTH);
        let load = format!("# sudo pfctl -Fa -f {} -e", self.rules_path.display());

        self.line(format!("# {separator}"));
        self.line(format!("# {timestamp}"));
        self.line(load);
        self.line(format!("# {separator}"));
    }

    fn macros(&mut self) {
        let sets = self.sets;

        for record in sets.up_sorted() {
            let k = &record.name;
            self.line(format!("int_{k} = \"{k}\""));

            self.defer(format!(
                "pass on $int_{k} proto {{tcp,udp}} from any port 67:68 to any port 67:68 keep state"
            ));
            if self.options.allow_icmp_and_dns {
                self.defer(format!(
                    "pass out on $int_{k} inet proto icmp all icmp-type 8 code 0 keep state"
                ));
            }
            if self.options.allow_local_subnet {
                self.defer(format!("pass from $int_{k}:network to $int_{k}:network"));
            }
            self.defer(format!(
                "pass on $int_{k} proto {{tcp, udp}} from any to $vpn_ip"
            ));
        }

        for record in sets.point_to_point_sorted() {
            let k = &record.name;
            self.line(format!("vpn_{k} = \"{k}\""));
            self.defer(format!("pass on $vpn_{k} all"));
        }

        self.line(format!("vpn_ip = \"{}\"", self.peer_ip));
        self.text.push('\n');
    }

    fn policy(&mut self) {
        self.line("set block-policy drop");
        self.line("set ruleset-optimization basic");
        self.line("set skip on lo0");
        self.line("block all");

        if self.options.allow_icmp_and_dns {
            self.line("pass quick proto {tcp, udp} from any to any port 53 keep state");
        }

        self.line("pass from any to 255.255.255.255 keep state");
        self.line("pass from 255.255.255.255 to any keep state");
        self.line("pass proto udp from any to 224.0.0.0/4 keep state");
        self.line("pass proto udp from 224.0.0.0/4 to any keep state");

        if self.options.allow_neighbor_discovery {
            self.line(format!("pass on {NEIGHBOR_DISCOVERY_INTERFACE} all"));
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
    use chrono::{FixedOffset, Utc};
    use killswitch_common::interface::InterfaceRecord;
    use std::net::Ipv4Addr;

    fn record(name: &str, ip: [u8; 4], prefix: Option<u8>) -> InterfaceRecord {
        InterfaceRecord {
            name: name.to_string(),
            mac: "aa:bb:cc:dd:ee:ff".to_string(),
            ip: Ipv4Addr::from(ip),
            prefix,
        }
    }

    fn sample_sets() -> InterfaceSets {
        let mut sets = InterfaceSets::default();
        sets.up.insert("en0".into(), record("en0", [192, 168, 1, 10], Some(24)));
        sets.up.insert("en1".into(), record("en1", [10, 0, 0, 5], Some(8)));
        sets.point_to_point
            .insert("utun0".into(), record("utun0", [10, 8, 0, 2], None));
        sets
    }

    fn fixed_time() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822("Tue, 06 Oct 2026 14:03:11 +0200").unwrap()
    }

    fn all_options() -> RuleOptions {
        RuleOptions {
            allow_icmp_and_dns: true,
            allow_local_subnet: true,
            allow_neighbor_discovery: true,
        }
    }

    #[test]
    fn header_carries_time_and_reload_command() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1").build_at(fixed_time());
        let lines: Vec<&str> = rules.as_str().lines().take(4).collect();

        let separator = format!("# {}", "-".repeat(62));
        assert_eq!(lines[0], separator);
        assert_eq!(lines[1], "# Tue, 06 Oct 2026 14:03:11 +0200");
        assert_eq!(lines[2], "# sudo pfctl -Fa -f /tmp/killswitch.pf.conf -e");
        assert_eq!(lines[3], separator);
    }

    #[test]
    fn header_follows_the_rules_path() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1")
            .rules_path("/var/run/ks.conf")
            .build_at(fixed_time());
        assert!(rules.as_str().contains("# sudo pfctl -Fa -f /var/run/ks.conf -e\n"));
    }

    #[test]
    fn declares_each_interface_and_the_peer_once() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1").build_at(fixed_time());
        let text = rules.as_str();

        assert!(text.contains("int_en0 = \"en0\"\n"));
        assert!(text.contains("int_en1 = \"en1\"\n"));
        assert!(text.contains("vpn_utun0 = \"utun0\"\n"));
        assert!(!text.contains("vpn_en0"));
        assert_eq!(text.matches("vpn_ip = ").count(), 1);
        assert!(text.contains("vpn_ip = \"10.8.0.1\"\n"));
        assert!(text.contains("pass on $vpn_utun0 all\n"));
    }

    #[test]
    fn macros_precede_their_use() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1").build_at(fixed_time());
        let text = rules.as_str();

        let peer_decl = text.find("vpn_ip = ").unwrap();
        let first_use = text.find("$vpn_ip").unwrap();
        assert!(peer_decl < first_use);
    }

    #[test]
    fn global_policy_order_is_fixed() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1")
            .options(all_options())
            .build_at(fixed_time());

        let expected = [
            "set block-policy drop",
            "set ruleset-optimization basic",
            "set skip on lo0",
            "block all",
            "pass quick proto {tcp, udp} from any to any port 53 keep state",
            "pass from any to 255.255.255.255 keep state",
            "pass from 255.255.255.255 to any keep state",
            "pass proto udp from any to 224.0.0.0/4 keep state",
            "pass proto udp from 224.0.0.0/4 to any keep state",
            "pass on awdl0 all",
        ];
        let policy: Vec<&str> = rules
            .statements()
            .skip_while(|l| !l.starts_with("set "))
            .take(expected.len())
            .collect();
        assert_eq!(policy, expected);
    }

    #[test]
    fn block_all_precedes_every_pass() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1")
            .options(all_options())
            .build_at(fixed_time());

        let statements: Vec<&str> = rules.statements().collect();
        let block = statements.iter().position(|l| *l == "block all").unwrap();
        let first_pass = statements.iter().position(|l| l.starts_with("pass")).unwrap();
        assert!(block < first_pass);
    }

    #[test]
    fn per_interface_rules_follow_the_policy() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1")
            .options(all_options())
            .build_at(fixed_time());
        let text = rules.as_str();

        for line in [
            "pass on $int_en0 proto {tcp,udp} from any port 67:68 to any port 67:68 keep state",
            "pass out on $int_en0 inet proto icmp all icmp-type 8 code 0 keep state",
            "pass from $int_en0:network to $int_en0:network",
            "pass on $int_en0 proto {tcp, udp} from any to $vpn_ip",
        ] {
            let at = text.find(line).unwrap_or_else(|| panic!("missing {line}"));
            assert!(at > text.find("pass on awdl0 all").unwrap());
        }

        let last_up_rule = text.rfind("to $vpn_ip").unwrap();
        assert!(last_up_rule < text.find("pass on $vpn_utun0 all").unwrap());
    }

    #[test]
    fn leak_rules_are_absent_by_default() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1").build_at(fixed_time());
        let text = rules.as_str();

        assert!(!text.contains("port 53"));
        assert!(!text.contains("icmp-type 8"));
        assert!(!text.contains(":network"));
        assert!(!text.contains("awdl0"));
        assert!(text.contains("port 67:68"));
    }

    #[test]
    fn zero_peer_is_rendered_as_is() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "0.0.0.0").build_at(fixed_time());
        assert!(rules.as_str().contains("vpn_ip = \"0.0.0.0\"\n"));
    }

    #[test]
    fn empty_sets_still_block_everything() {
        let sets = InterfaceSets::default();
        let rules = RulesBuilder::new(&sets, "0.0.0.0").build_at(fixed_time());
        let statements: Vec<&str> = rules.statements().collect();

        assert_eq!(statements[0], "vpn_ip = \"0.0.0.0\"");
        assert!(statements.contains(&"block all"));
        assert!(!rules.as_str().contains("$int_"));
    }

    #[test]
    fn same_input_renders_identically() {
        let sets = sample_sets();
        let at = Utc.with_ymd_and_hms(2026, 10, 6, 12, 0, 0).unwrap();
        let first = RulesBuilder::new(&sets, "10.8.0.1")
            .options(all_options())
            .build_at(at);
        let second = RulesBuilder::new(&sets.clone(), "10.8.0.1")
            .options(all_options())
            .build_at(at);
        assert_eq!(first, second);
    }

    #[test]
    fn interface_rules_are_sorted_by_name() {
        let sets = sample_sets();
        let rules = RulesBuilder::new(&sets, "10.8.0.1").build_at(fixed_time());
        let text = rules.as_str();
        assert!(text.find("int_en0 =").unwrap() < text.find("int_en1 =").unwrap());
    }
}
