// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # killswitch CLI Entry Point
//!
//! 1.  **Runtime Initialization**: `#[tokio::main]` sets up the runtime used by
//!     the public IP lookup.
//! 2.  **Global State Setup**: Installs the `tracing` subscriber and the
//!     terminal output mode.
//! 3.  **Configuration Mapping**: Converts the parsed command line into `Config`.
//! 4.  **Command Dispatch**: Routes execution to the module in `commands/`.
//! 5.  **Error Boundary**: Errors bubbling out of a command are logged here and
//!     turned into a non-zero `ExitCode`.

mod commands;
mod terminal;

use std::process::ExitCode;

use killswitch_common::{config::Config, error};

use crate::{
    commands::{BuildInfo, CommandLine, Commands, disable, enable, info, print, status},
    terminal::{print::Print, spinner},
};

const BUILD: BuildInfo = BuildInfo {
    name: env!("CARGO_BIN_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

#[tokio::main]
async fn main() -> ExitCode {
    let commands = CommandLine::parse_args(&BUILD);
    if let Err(e) = spinner::init_logging(commands.verbosity) {
        eprintln!("failed to initialize logging: {e}");
    }

    let cfg = Config::from(&commands);
    let _ = Print::init(&cfg);

    let result = match commands.command_or_default() {
        Commands::Info => info::info(&cfg).await,
        Commands::Print(_) => print::print(&cfg),
        Commands::Enable(_) => enable::enable(&cfg),
        Commands::Disable => disable::disable(&cfg),
        Commands::Status => status::status(&cfg),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Critical failure: {e:#}");
            ExitCode::FAILURE
        }
    }
}
