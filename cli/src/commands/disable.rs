// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use crate::commands::require_root;
use killswitch_common::{config::Config, success};
use killswitch_core::pf::{self, PfCtl, SYSTEM_PF_CONF};

pub fn disable(cfg: &Config) -> anyhow::Result<()> {
    require_root("disable")?;

    pf::disable(&PfCtl, &cfg.rules_path)?;
    success!("VPN kill switch disabled, {SYSTEM_PF_CONF} restored");
    Ok(())
}
