// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use std::{cell::Cell, fmt::Display, sync::OnceLock};

use crate::terminal::colors;
use anyhow::bail;
use colored::*;
use unicode_width::UnicodeWidthStr;
use killswitch_common::config::Config;

pub const TOTAL_WIDTH: usize = 64;

static PRINT: OnceLock<Print> = OnceLock::new();

thread_local! {
    pub static GLOBAL_KEY_WIDTH: Cell<usize> = const { Cell::new(0) }
}

pub type Detail = (String, ColoredString);

/// Writes preformatted output through the tracing pipeline, above any spinner.
#[macro_export]
macro_rules! kprint {
    () => {
        $crate::kprint!("");
    };
    ($($arg:tt)*) => {
        tracing::info!(
            target: $crate::terminal::logging::PRINT_TARGET,
            raw_msg = %format_args!($($arg)*)
        );
    };
}

pub trait WithDefaultColor {
    fn with_default(self, default_color: Color) -> ColoredString;
}

impl WithDefaultColor for &str {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for String {
    fn with_default(self, default_color: Color) -> ColoredString {
        self.color(default_color)
    }
}

impl WithDefaultColor for ColoredString {
    fn with_default(self, _default_color: Color) -> ColoredString {
        self
    }
}

pub struct Print {
    q_level: u8,
}

impl Print {
    fn new(cfg: &Config) -> Self {
        Self { q_level: cfg.quiet }
    }

    pub fn init(cfg: &Config) -> anyhow::Result<()> {
        let term = Self::new(cfg);
        if PRINT.set(term).is_err() {
            bail!("terminal has already been initialized")
        }
        Ok(())
    }

    /// Falls back to full output when `init` was never called.
    fn q_level() -> u8 {
        PRINT.get().map_or(0, |p| p.q_level)
    }

    pub fn header(msg: &str) {
        if Self::q_level() > 0 {
            kprint!();
            return;
        }

        let formatted: String = format!("⟦ {} ⟧", msg);
        let msg_len: usize = formatted.width();

        let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
        let left: usize = dash_count / 2;
        let right: usize = dash_count - left;

        let line: ColoredString = format!(
            "{}{}{}",
            "─".repeat(left),
            formatted.to_uppercase().bright_green(),
            "─".repeat(right)
        )
        .bright_black();

        kprint!("{}", line);
    }

    pub fn end_of_program() {
        if Self::q_level() > 0 {
            return;
        }
        divider();
    }
}

pub fn divider() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR);
    kprint!("{}", sep);
}

pub fn aligned_line<V>(key: &str, value: V)
where
    V: Display + WithDefaultColor,
{
    let whitespace: String = ".".repeat((GLOBAL_KEY_WIDTH.get() + 1).saturating_sub(key.width()));
    let colon: String = format!(
        "{}{}",
        whitespace.color(colors::SEPARATOR),
        ":".color(colors::SEPARATOR)
    );
    let value: ColoredString = value.with_default(colors::TEXT_DEFAULT);
    print_status(format!("{}{} {}", key.color(colors::PRIMARY), colon, value));
}

/// Prints a pf ruleset line by line, dimming comments.
pub fn rules_block(text: &str) {
    for line in text.lines() {
        let colored: ColoredString = if line.trim_start().starts_with('#') {
            line.color(colors::SEPARATOR)
        } else {
            line.color(colors::TEXT_DEFAULT)
        };
        kprint!(" {}", colored);
    }
}

pub fn print_status<T: AsRef<str>>(msg: T) {
    kprint!(
        "{} {}",
        ">".color(colors::SEPARATOR),
        msg.as_ref().color(colors::TEXT_DEFAULT)
    );
}

pub fn tree_head(idx: usize, name: &str) {
    let idx_str: String = format!("[{}]", idx.to_string().color(colors::ACCENT));
    kprint!(
        "{} {}",
        idx_str.color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    );
}

pub fn as_tree(details: Vec<Detail>) {
    let padding_width: usize = details.iter().map(|(k, _)| k.width()).max().unwrap_or(0);

    for (i, (key, value)) in details.iter().enumerate() {
        let last: bool = i + 1 == details.len();
        let branch: ColoredString = if !last { "├─" } else { "└─" }.bright_black();

        let dots_count: usize = padding_width.saturating_sub(key.width());
        let dots: ColoredString = ".".repeat(dots_count).color(colors::SEPARATOR);

        kprint!(
            " {} {}{}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            dots,
            ":".color(colors::SEPARATOR),
            value
        );
    }
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    kprint!("{}{}{}", space, msg, space);
}
