// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! Loading, restoring and inspecting the packet filter through `pfctl`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use killswitch_common::{debug, info, warn};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::rules::PfRules;

/// Ruleset the system boots with, loaded back when the kill switch is disabled.
pub const SYSTEM_PF_CONF: &str = "/etc/pf.conf";

const PFCTL: &str = "pfctl";
const VPN_IP_MACRO: &str = "vpn_ip =";

#[derive(Debug, Error)]
pub enum PfError {
    #[error("failed to run pfctl {args}: {source}")]
    Spawn {
        args: String,
        #[source]
        source: io::Error,
    },

    #[error("pfctl {args} failed: {stderr}")]
    Command { args: String, stderr: String },

    #[error("failed to write rules to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The `pfctl` operations the kill switch relies on.
pub trait FirewallControl {
    /// Turns the packet filter on. Already being on is not an error.
    fn enable(&self) -> Result<(), PfError>;

    /// Flushes every rule and loads `path` in their place.
    fn load(&self, path: &Path) -> Result<(), PfError>;

    /// The active filter rules as printed by `pfctl -sr`.
    fn active_rules(&self) -> Result<String, PfError>;
}

/// Drives the real `pfctl` binary.
pub struct PfCtl;

impl PfCtl {
    fn run(&self, args: &[&str]) -> Result<(bool, String, String), PfError> {
        let joined = args.join(" ");
        debug!(verbosity = 2, "Running {PFCTL} {joined}");

        let output = Command::new(PFCTL)
            .args(args)
            .output()
            .map_err(|source| PfError::Spawn {
                args: joined,
                source,
            })?;

        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }

    fn run_checked(&self, args: &[&str]) -> Result<String, PfError> {
        let (ok, stdout, stderr) = self.run(args)?;
        if ok {
            Ok(stdout)
        } else {
            Err(PfError::Command {
                args: args.join(" "),
                stderr,
            })
        }
    }
}

impl FirewallControl for PfCtl {
    fn enable(&self) -> Result<(), PfError> {
        let (ok, _, stderr) = self.run(&["-e"])?;
        if ok || stderr.contains("already enabled") {
            return Ok(());
        }
        Err(PfError::Command {
            args: "-e".to_string(),
            stderr,
        })
    }

    fn load(&self, path: &Path) -> Result<(), PfError> {
        let path = path.to_string_lossy();
        self.run_checked(&["-Fa", "-f", &path]).map(|_| ())
    }

    fn active_rules(&self) -> Result<String, PfError> {
        self.run_checked(&["-sr"])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillswitchStatus {
    Enabled { rules: String },
    Disabled,
}

/// Writes `rules` to `path`, readable by everyone and writable by the owner.
///
/// The text is staged in a fresh file next to `path` and renamed over it, so
/// whatever already sits at `path` (a symlink included) is replaced, never written through.
pub fn write_rules(path: &Path, rules: &PfRules) -> Result<(), PfError> {
    let to_write_err = |source| PfError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir: &Path = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(to_write_err)?;
    staged
        .write_all(rules.as_str().as_bytes())
        .map_err(to_write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(to_write_err)?;
    }

    staged.persist(path).map_err(|e| to_write_err(e.error))?;

    debug!(verbosity = 1, "Wrote {} bytes to {}", rules.as_str().len(), path.display());
    Ok(())
}

/// Writes and loads the kill switch, returning the ruleset pf reports afterwards.
///
/// A rules file pf refused is removed again so it cannot be mistaken for a loaded one.
pub fn apply(ctl: &dyn FirewallControl, rules: &PfRules, path: &Path) -> Result<String, PfError> {
    write_rules(path, rules)?;

    if let Err(e) = ctl.enable().and_then(|()| ctl.load(path)) {
        if let Err(cleanup) = fs::remove_file(path) {
            warn!("Could not remove {} after a failed load: {cleanup}", path.display());
        }
        return Err(e);
    }

    info!(verbosity = 1, "Loaded {}", path.display());
    ctl.active_rules()
}

/// Restores the system ruleset and removes the generated one.
pub fn disable(ctl: &dyn FirewallControl, path: &Path) -> Result<(), PfError> {
    ctl.enable()?;
    ctl.load(Path::new(SYSTEM_PF_CONF))?;
    info!(verbosity = 1, "Restored {SYSTEM_PF_CONF}");

    if path.exists() {
        fs::remove_file(path).map_err(|source| PfError::Remove {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(verbosity = 1, "Removed {}", path.display());
    }

    Ok(())
}

/// Enabled means the rules file names a peer and pf is running the kill switch
/// for it: a default `block drop all` plus a rule that mentions the peer.
pub fn status(ctl: &dyn FirewallControl, path: &Path) -> Result<KillswitchStatus, PfError> {
    let Some(peer) = fs::read_to_string(path)
        .ok()
        .and_then(|text| declared_peer(&text).map(str::to_string))
    else {
        return Ok(KillswitchStatus::Disabled);
    };

    let active = ctl.active_rules()?;
    if is_killswitch_ruleset(&active, &peer) {
        Ok(KillswitchStatus::Enabled { rules: active })
    } else {
        debug!(verbosity = 1, "pf is not enforcing the rules for {peer}");
        Ok(KillswitchStatus::Disabled)
    }
}

/// The `vpn_ip` macro value of a generated ruleset.
fn declared_peer(text: &str) -> Option<&str> {
    text.lines().find_map(|line| {
        line.strip_prefix(VPN_IP_MACRO)?
            .trim()
            .strip_prefix('"')?
            .strip_suffix('"')
    })
}

fn is_killswitch_ruleset(active: &str, peer: &str) -> bool {
    let blocks_all = active.lines().any(|line| line.trim() == "block drop all");
    let passes_peer = active
        .lines()
        .any(|line| line.starts_with("pass") && line.split_whitespace().any(|word| word == peer));
    blocks_all && passes_peer
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
