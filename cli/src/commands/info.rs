// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{self, Context, bail};
use colored::*;
use tracing::info_span;

use crate::terminal::{
    colors, network_fmt,
    print::{self, GLOBAL_KEY_WIDTH, Print},
    spinner::SpinnerGuard,
};
use killswitch_common::{config::Config, warn};
use killswitch_core::peer::PeerResolution;
use killswitch_core::session::NetworkSession;
use killswitch_core::system::SystemRepo;
use killswitch_core::whoami;

pub async fn info(cfg: &Config) -> anyhow::Result<()> {
    GLOBAL_KEY_WIDTH.set(10);

    Print::header("local system");
    print_local_system()?;

    let session = NetworkSession::open(&SystemRepo, cfg.supplied_peer())
        .context("failed to read the network state")?;

    if session.sets().up.is_empty() {
        bail!("No active network interfaces found");
    }

    Print::header("network interfaces");
    network_fmt::print_interfaces(session.sets());

    if session.sets().point_to_point.is_empty() {
        warn!("No VPN interface found, verify that you are connected");
    }

    Print::header("vpn");
    print::aligned_line("Peer IP", peer_to_colored(session.peer()));

    match lookup_public_ip(cfg.lookup_timeout).await {
        Ok(ip_addr) => print::aligned_line("Public IP", ip_addr.to_string().color(colors::IPV4_ADDR)),
        Err(e) => warn!("Could not determine the public IP: {e}"),
    }

    Print::end_of_program();
    Ok(())
}

fn print_local_system() -> anyhow::Result<()> {
    print::aligned_line("Hostname", sys_info::hostname()?);
    let release = sys_info::os_release().unwrap_or_default();
    let os_name = sys_info::os_type()?;
    print::aligned_line("OS", format!("{} {}", os_name, release));
    Ok(())
}

fn peer_to_colored(peer: PeerResolution) -> ColoredString {
    let ip: ColoredString = peer.ip().to_string().color(colors::PEER_ADDR);
    let origin: &str = match peer {
        PeerResolution::Supplied(_) => "supplied",
        PeerResolution::Discovered(_) => "routing table",
        PeerResolution::Fallback(_) => "not found",
    };
    format!("{} {}", ip, format!("({origin})").color(colors::SEPARATOR)).normal()
}

async fn lookup_public_ip(timeout: Duration) -> Result<IpAddr, whoami::WhoamiError> {
    let _guard: SpinnerGuard = run_spinner();
    whoami::public_ip(timeout).await
}

fn run_spinner() -> SpinnerGuard {
    let span = info_span!("whoami", indicatif.pb_show = true);
    let _enter = span.enter();

    SpinnerGuard::with_status(span.clone(), "Looking up the public IP...")
}
