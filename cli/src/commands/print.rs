// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::io::{self, Write};

use anyhow::{self, Context, bail};
use killswitch_common::{config::Config, warn};
use killswitch_core::session::{NetworkSession, SessionError};
use killswitch_core::system::SystemRepo;

/// Writes the ruleset to stdout. Unlike `enable`, problems other than a
/// missing network are only warnings here.
pub fn print(cfg: &Config) -> anyhow::Result<()> {
    let mut session = NetworkSession::open(&SystemRepo, cfg.supplied_peer())
        .context("failed to read the network state")?;

    match session.ensure_enforceable() {
        Ok(()) => {}
        Err(SessionError::NoUpInterface) => bail!("No active network interfaces found"),
        Err(e) => warn!("{e}"),
    }

    let rules = session.synthesize(cfg.rule_options(), &cfg.rules_path);

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rules.as_str().as_bytes())
        .context("failed to write the ruleset")?;
    stdout.flush()?;
    Ok(())
}
