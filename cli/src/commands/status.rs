// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use colored::*;

use crate::terminal::{
    colors,
    print::{self, Print},
};
use killswitch_common::config::Config;
use killswitch_core::pf::{self, KillswitchStatus, PfCtl};

pub fn status(cfg: &Config) -> anyhow::Result<()> {
    match pf::status(&PfCtl, &cfg.rules_path)? {
        KillswitchStatus::Enabled { rules } => {
            print::centerln(&format!("VPN kill switch: {}", "ENABLED".color(colors::ENFORCED).bold()));
            Print::header("active rules");
            print::rules_block(&rules);
            Print::end_of_program();
        }
        KillswitchStatus::Disabled => {
            print::centerln(&format!("VPN kill switch: {}", "DISABLED".color(colors::OPEN).bold()));
        }
    }
    Ok(())
}
