// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use anyhow::{self, Context};
use colored::*;

use crate::commands::require_root;
use crate::terminal::{
    colors,
    print::{self, GLOBAL_KEY_WIDTH, Print},
};
use killswitch_common::{config::Config, info, success};
use killswitch_core::pf::{self, PfCtl};
use killswitch_core::session::NetworkSession;
use killswitch_core::system::SystemRepo;

pub fn enable(cfg: &Config) -> anyhow::Result<()> {
    require_root("enable")?;
    GLOBAL_KEY_WIDTH.set(10);

    let mut session = NetworkSession::open(&SystemRepo, cfg.supplied_peer())
        .context("failed to read the network state")?;
    session.ensure_enforceable()?;

    Print::header("enabling kill switch");
    print::aligned_line("Peer IP", session.peer_ip().color(colors::PEER_ADDR));
    print_allowances(cfg);

    let rules = session.synthesize(cfg.rule_options(), &cfg.rules_path);
    info!("Loading {}", cfg.rules_path.display());
    let active = pf::apply(&PfCtl, rules, &cfg.rules_path)?;

    Print::header("active rules");
    print::rules_block(&active);

    Print::end_of_program();
    success!("VPN kill switch enabled");
    Ok(())
}

fn print_allowances(cfg: &Config) {
    let options = cfg.rule_options();
    for (key, allowed) in [
        ("ICMP/DNS", options.allow_icmp_and_dns),
        ("Local LAN", options.allow_local_subnet),
        ("AirDrop", options.allow_neighbor_discovery),
    ] {
        let value = if allowed {
            "allowed".color(colors::OPEN)
        } else {
            "blocked".color(colors::ENFORCED)
        };
        print::aligned_line(key, value);
    }
}
