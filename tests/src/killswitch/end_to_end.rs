// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

#![cfg(test)]
use std::cell::RefCell;
use std::fs;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use killswitch_common::config::{Config, RuleOptions};
use killswitch_common::models::route::{UGSC, UGSH};
use killswitch_core::peer::PeerResolution;
use killswitch_core::pf::{self, FirewallControl, KillswitchStatus, PfError, SYSTEM_PF_CONF};
use killswitch_core::session::{NetworkSession, SessionError};

use crate::utils::{connected_host, create_mock_interface, MockNetwork, IFF_BROADCAST, IFF_UP};

fn generated_at() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc2822("Sat, 17 Oct 2026 09:30:00 +0000").unwrap()
}

fn render(session: &mut NetworkSession, options: RuleOptions) -> String {
    session
        .synthesize_at(options, Path::new("/tmp/killswitch.pf.conf"), generated_at())
        .to_string()
}

#[test]
fn test_connected_host_renders_tunnel_rules() {
    let mut session = NetworkSession::open(&connected_host(), Some("10.8.0.1")).unwrap();

    let sets = session.sets();
    assert_eq!(sets.up["en0"].mac, "aa:bb:cc:dd:ee:ff");
    assert_eq!(sets.up["en0"].address(), "192.168.1.10/24");
    assert_eq!(sets.point_to_point["utun0"].address(), "10.8.0.2");
    assert!(!sets.up.contains_key("lo0"));

    let rules = render(&mut session, RuleOptions::default());
    assert!(rules.contains("int_en0 = \"en0\""));
    assert!(rules.contains("vpn_utun0 = \"utun0\""));
    assert!(!rules.contains("vpn_en0"));
    assert!(rules.contains("vpn_ip = \"10.8.0.1\""));
    assert!(rules.contains("pass on $vpn_utun0 all"));
    assert!(rules.contains("pass on $int_en0 proto {tcp, udp} from any to $vpn_ip"));
}

#[test]
fn test_supplied_peer_is_taken_verbatim() {
    for peer in ["1.2.3.4", "127.0.0.1", "192.168.1.1"] {
        let mut session = NetworkSession::open(&connected_host(), Some(peer)).unwrap();
        assert_eq!(session.peer_ip(), peer);

        let rules = render(&mut session, RuleOptions::default());
        assert_eq!(rules.matches("vpn_ip = ").count(), 1);
        assert!(rules.contains(&format!("vpn_ip = \"{peer}\"")));
    }
}

#[test]
fn test_empty_peer_without_routes_falls_back_to_zero() {
    let mut session = NetworkSession::open(&connected_host(), Some("")).unwrap();

    assert_eq!(session.peer_ip(), "0.0.0.0");
    assert!(matches!(session.peer(), PeerResolution::Fallback(_)));
    assert!(matches!(
        session.ensure_enforceable(),
        Err(SessionError::UnusablePeer(_))
    ));

    let rules = render(&mut session, RuleOptions::default());
    assert!(rules.contains("vpn_ip = \"0.0.0.0\""));
}

#[test]
fn test_peer_is_discovered_from_routes() {
    let repo = connected_host()
        .with_route(UGSH, "10.8.0.1")
        .with_route(UGSC, "128.0.0.0")
        .with_route(UGSH, "185.12.64.3")
        .with_route(UGSH, "185.12.64.4");

    let session = NetworkSession::open(&repo, None).unwrap();
    assert_eq!(session.peer_ip(), "185.12.64.3");
    assert!(matches!(session.peer(), PeerResolution::Discovered(_)));
    assert!(session.ensure_enforceable().is_ok());
}

#[test]
fn test_route_failure_aborts_the_session() {
    let repo = MockNetwork {
        fail_routes: true,
        ..connected_host()
    };
    assert!(NetworkSession::open(&repo, None).is_err());
    assert!(NetworkSession::open(&repo, Some("10.8.0.1")).is_ok());
}

#[test]
fn test_block_all_precedes_every_pass() {
    let mut session = NetworkSession::open(&connected_host(), Some("10.8.0.1")).unwrap();
    let options = RuleOptions {
        allow_icmp_and_dns: true,
        allow_local_subnet: true,
        allow_neighbor_discovery: true,
    };
    let rules = render(&mut session, options);

    let block = rules.find("\nblock all\n").unwrap();
    let first_pass = rules.find("\npass").unwrap();
    assert!(block < first_pass);
}

#[test]
fn test_no_leak_rules_without_the_option() {
    let cfg = Config {
        allow_local_subnet: true,
        ..Config::default()
    };
    let mut session = NetworkSession::open(&connected_host(), Some("10.8.0.1")).unwrap();
    let rules = render(&mut session, cfg.rule_options());

    assert!(!rules.contains("port 53"));
    assert!(!rules.contains("icmp-type 8"));
    assert!(rules.contains("pass from $int_en0:network to $int_en0:network"));
}

#[test]
fn test_rendering_is_idempotent() {
    let mut first = NetworkSession::open(&connected_host(), Some("10.8.0.1")).unwrap();
    let mut second = NetworkSession::open(&connected_host(), Some("10.8.0.1")).unwrap();

    assert_eq!(
        render(&mut first, RuleOptions::default()),
        render(&mut second, RuleOptions::default())
    );

    let now_a = first.synthesize(RuleOptions::default(), Path::new("/tmp/a")).to_string();
    let now_b = second.synthesize(RuleOptions::default(), Path::new("/tmp/a")).to_string();
    let strip = |s: &str| -> Vec<String> {
        s.lines()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, l)| l.to_string())
            .collect()
    };
    assert_eq!(strip(&now_a), strip(&now_b));
}

#[test]
fn test_sets_stay_disjoint_with_many_interfaces() {
    let mut repo = connected_host();
    for i in 1..6 {
        repo = repo.with_interface(create_mock_interface(
            &format!("en{i}"),
            None,
            &[&format!("172.16.{i}.2/24")],
            IFF_UP | IFF_BROADCAST,
        ));
    }

    let session = NetworkSession::open(&repo, Some("10.8.0.1")).unwrap();
    let sets = session.sets();
    assert_eq!(sets.up.len(), 6);
    assert!(sets.is_disjoint());
    assert_eq!(sets.up["en3"].address(), "172.16.3.2/16");
}

#[derive(Default)]
struct RecordingFirewall {
    loaded: RefCell<Vec<String>>,
}

impl FirewallControl for RecordingFirewall {
    fn enable(&self) -> Result<(), PfError> {
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<(), PfError> {
        self.loaded.borrow_mut().push(path.display().to_string());
        Ok(())
    }

    fn active_rules(&self) -> Result<String, PfError> {
        let enforcing = "block drop all\npass on en0 inet proto tcp from any to 10.8.0.1 flags S/SA keep state\n";
        Ok(match self.loaded.borrow().last().map(String::as_str) {
            Some(SYSTEM_PF_CONF) | None => String::new(),
            Some(_) => enforcing.to_string(),
        })
    }
}

#[test]
fn test_enable_status_disable_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("killswitch.pf.conf");
    let firewall = RecordingFirewall::default();

    let mut session = NetworkSession::open(&connected_host(), Some("10.8.0.1")).unwrap();
    session.ensure_enforceable().unwrap();
    let rules = session.synthesize(RuleOptions::default(), &path);

    pf::apply(&firewall, rules, &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), rules.as_str());
    assert!(matches!(
        pf::status(&firewall, &path).unwrap(),
        KillswitchStatus::Enabled { .. }
    ));

    pf::disable(&firewall, &path).unwrap();
    assert!(!path.exists());
    assert_eq!(firewall.loaded.borrow().last().unwrap(), SYSTEM_PF_CONF);
    assert_eq!(pf::status(&firewall, &path).unwrap(), KillswitchStatus::Disabled);
}

#[derive(Default)]
struct RejectingFirewall;

impl FirewallControl for RejectingFirewall {
    fn enable(&self) -> Result<(), PfError> {
        Ok(())
    }

    fn load(&self, _path: &Path) -> Result<(), PfError> {
        Err(PfError::Command {
            args: "-Fa -f".to_string(),
            stderr: "syntax error".to_string(),
        })
    }

    fn active_rules(&self) -> Result<String, PfError> {
        Ok("anchor \"com.apple/*\" all\n".to_string())
    }
}

#[test]
fn test_rejected_load_leaves_the_switch_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("killswitch.pf.conf");

    let mut session = NetworkSession::open(&connected_host(), Some("10.8.0.1")).unwrap();
    let rules = session.synthesize(RuleOptions::default(), &path);

    assert!(pf::apply(&RejectingFirewall, rules, &path).is_err());
    assert!(!path.exists());
    assert_eq!(pf::status(&RejectingFirewall, &path).unwrap(), KillswitchStatus::Disabled);
}
