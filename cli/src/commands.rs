// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Command Line Interface Definitions
//!
//! The schema of everything a user can type. Execution lives in the
//! submodules; arguments, flags and help text are defined here.
//!
//! * [`CommandLine`]: global flags (verbosity, quiet, timeout, rules path).
//! * [`Commands`]: the operation to run, `info` when none is given.
//! * [`RuleArgs`]: the options that shape the generated ruleset.
//!
//! `From<&CommandLine> for Config` turns the parsed input into the internal
//! configuration, so the core crates never see `clap` types.

pub mod disable;
pub mod enable;
pub mod info;
pub mod print;
pub mod status;

use std::path::PathBuf;

use anyhow::bail;
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use is_root::is_root;
use killswitch_common::config::{Config, DEFAULT_RULES_PATH};

/// Build metadata handed to the parser instead of read from globals.
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
}

#[derive(Parser, Debug)]
#[command(name = "killswitch")]
#[command(about = "VPN kill switch for macOS, built on pf.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Reduce UI visual density (-q: no headers or dividers)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Increase logging detail (-v: session details, -vv: every route and pfctl call)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Seconds to wait for each public IP lookup
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 3, global = true)]
    pub timeout: u64,

    /// Where the generated pf ruleset is written
    #[arg(long = "rules-path", value_name = "PATH", default_value = DEFAULT_RULES_PATH, global = true)]
    pub rules_path: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show interfaces, the VPN peer and the public IP
    #[command(alias = "i")]
    Info,

    /// Print the pf ruleset without loading it
    #[command(alias = "p")]
    Print(RuleArgs),

    /// Load the kill switch (requires root)
    #[command(alias = "e")]
    Enable(RuleArgs),

    /// Restore /etc/pf.conf (requires root)
    #[command(alias = "d")]
    Disable,

    /// Report whether the kill switch is loaded
    #[command(alias = "s")]
    Status,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RuleArgs {
    /// VPN peer IPv4 address, detected from the routing table when omitted
    #[arg(long = "ip", value_name = "IPv4")]
    pub ip: Option<String>,

    /// Allow ICMP echo requests and DNS outside the tunnel
    #[arg(long = "leak")]
    pub leak: bool,

    /// Allow traffic within the local network
    #[arg(long = "local")]
    pub local: bool,

    /// Keep AirDrop and AirPlay (awdl0) working
    #[arg(long = "airdrop")]
    pub airdrop: bool,
}

impl CommandLine {
    pub fn parse_args(build: &BuildInfo) -> Self {
        let matches = Self::command()
            .name(build.name)
            .version(build.version)
            .get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Info)
    }

    fn rule_args(&self) -> Option<&RuleArgs> {
        match &self.command {
            Some(Commands::Print(args)) | Some(Commands::Enable(args)) => Some(args),
            _ => None,
        }
    }
}

impl From<&CommandLine> for Config {
    fn from(cmd: &CommandLine) -> Self {
        let rules = cmd.rule_args().cloned().unwrap_or_default();
        Self {
            peer_ip: rules.ip,
            allow_icmp_and_dns: rules.leak,
            allow_local_subnet: rules.local,
            allow_neighbor_discovery: rules.airdrop,
            rules_path: cmd.rules_path.clone(),
            lookup_timeout: std::time::Duration::from_secs(cmd.timeout),
            quiet: cmd.quiet,
            verbosity: cmd.verbosity,
        }
    }
}

/// pf can only be changed by root.
pub fn require_root(action: &str) -> anyhow::Result<()> {
    if !is_root() {
        bail!("{action} requires root, try again with sudo");
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
