// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Network Session
//!
//! One pass over the host: enumerate interfaces, classify them, resolve the
//! peer, and (on demand) render the ruleset. A session is built once per
//! invocation and never shared.

use std::path::Path;

use chrono::{DateTime, TimeZone};
use pnet::datalink::NetworkInterface;
use thiserror::Error;

use killswitch_common::config::RuleOptions;
use killswitch_common::interface::{self, InterfaceError, InterfaceSets};
use killswitch_common::system::NetworkRepository;
use killswitch_common::info;

use crate::peer::{self, PeerError, PeerResolution};
use crate::rules::{PfRules, RulesBuilder};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Interface(#[from] InterfaceError),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error("no active network interface found")]
    NoUpInterface,

    #[error("no VPN interface found")]
    NoVpnInterface,

    #[error("no usable VPN peer IP (got {0}), pass one with --ip")]
    UnusablePeer(String),
}

pub struct NetworkSession {
    sets: InterfaceSets,
    peer: PeerResolution,
    peer_ip: String,
    rules: Option<PfRules>,
}

impl NetworkSession {
    /// Reads the host state through `repo`. `supplied` short-circuits the route scan.
    pub fn open(repo: &dyn NetworkRepository, supplied: Option<&str>) -> Result<Self, SessionError> {
        let interfaces: Vec<NetworkInterface> = repo.get_network_interfaces()?;
        let sets = interface::classify(&interfaces, |i| repo.get_interface_addresses(i))?;

        info!(
            verbosity = 1,
            "Found {} up and {} point-to-point interfaces",
            sets.up.len(),
            sets.point_to_point.len()
        );

        let peer: PeerResolution = peer::resolve(supplied, repo)?;
        let peer_ip = peer.to_string();

        Ok(Self {
            sets,
            peer,
            peer_ip,
            rules: None,
        })
    }

    pub fn sets(&self) -> &InterfaceSets {
        &self.sets
    }

    pub fn peer(&self) -> PeerResolution {
        self.peer
    }

    pub fn peer_ip(&self) -> &str {
        &self.peer_ip
    }

    pub fn rules(&self) -> Option<&PfRules> {
        self.rules.as_ref()
    }

    /// Checks the preconditions for loading the kill switch.
    pub fn ensure_enforceable(&self) -> Result<(), SessionError> {
        if self.sets.up.is_empty() {
            return Err(SessionError::NoUpInterface);
        }
        if self.sets.point_to_point.is_empty() {
            return Err(SessionError::NoVpnInterface);
        }
        if !self.peer.is_usable() {
            return Err(SessionError::UnusablePeer(self.peer_ip.clone()));
        }
        Ok(())
    }

    pub fn synthesize(&mut self, options: RuleOptions, rules_path: &Path) -> &PfRules {
        let rules = self.builder(options, rules_path).build();
        self.rules.insert(rules)
    }

    pub fn synthesize_at<Tz>(
        &mut self,
        options: RuleOptions,
        rules_path: &Path,
        generated_at: DateTime<Tz>,
    ) -> &PfRules
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let rules = self.builder(options, rules_path).build_at(generated_at);
        self.rules.insert(rules)
    }

    fn builder(&self, options: RuleOptions, rules_path: &Path) -> RulesBuilder<'_> {
        RulesBuilder::new(&self.sets, &self.peer_ip)
            .options(options)
            .rules_path(rules_path)
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
