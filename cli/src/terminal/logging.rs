// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! Event formatting for the `killswitch` terminal.
//!
//! Status events get a colored `[+]`/`[»]`/`[?]`/`[*]`/`[-]` prefix and are
//! dropped when their `verbosity` field exceeds the `-v` count. Multi-line
//! messages, such as `pfctl` diagnostics, continue indented under the prefix.
//! Events on the [`PRINT_TARGET`] carry preformatted output in `raw_msg` and
//! are written as is.

use std::fmt::Debug;

use colored::*;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent};
use tracing_subscriber::registry::LookupSpan;

/// Tracing target of `kprint!` events.
pub const PRINT_TARGET: &str = "killswitch::print";

/// Line break plus the indent that lines a continuation up with the message text.
const CONTINUATION: &str = "\r\n    ";

pub struct KillswitchFormatter {
    pub max_verbosity: u8,
}

impl KillswitchFormatter {
    fn shows(&self, fields: &EventFields) -> bool {
        fields.verbosity <= self.max_verbosity
    }
}

impl<S, N> FormatEvent<S, N> for KillswitchFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        if meta.target() == PRINT_TARGET {
            let mut raw = RawLine::default();
            event.record(&mut raw);
            return write!(writer, "{}\r\n", raw.text.replace('\n', "\r\n"));
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);
        if !self.shows(&fields) {
            return Ok(());
        }

        let (symbol, paint) = status_symbol(*meta.level(), fields.status.as_deref());
        write!(writer, "{} {}\r\n", paint(symbol.into()), fields.body())
    }
}

type Painter = fn(ColoredString) -> ColoredString;

fn status_symbol(level: Level, status: Option<&str>) -> (&'static str, Painter) {
    match level {
        Level::TRACE => ("[ ]", |s| s.dimmed()),
        Level::DEBUG => ("[?]", |s| s.blue()),
        Level::INFO => match status {
            Some("info") => ("[»]", |s| s.cyan().bold()),
            _ => ("[+]", |s| s.green().bold()),
        },
        Level::WARN => ("[*]", |s| s.yellow().bold()),
        Level::ERROR => ("[-]", |s| s.red().bold()),
    }
}

/// Everything a status event carries, gathered in one pass.
#[derive(Default)]
struct EventFields {
    status: Option<String>,
    verbosity: u8,
    message: String,
    extra: Vec<(&'static str, String)>,
}

impl EventFields {
    fn body(&self) -> String {
        let mut body = self.message.trim_end().to_string();
        for (name, value) in &self.extra {
            body.push_str(&format!(" {}={}", name.italic(), value));
        }
        body.replace('\n', CONTINUATION)
    }

    fn set_verbosity(&mut self, value: u64) {
        self.verbosity = u8::try_from(value).unwrap_or(u8::MAX);
    }
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        match field.name() {
            "status" | "verbosity" => {}
            "message" => self.message = format!("{value:?}"),
            name => self.extra.push((name, format!("{value:?}"))),
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "status" => self.status = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            _ => self.record_debug(field, &value),
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "verbosity" => self.set_verbosity(value),
            _ => self.record_debug(field, &value),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        match field.name() {
            "verbosity" => self.set_verbosity(value.max(0).unsigned_abs()),
            _ => self.record_debug(field, &value),
        }
    }
}

/// The `raw_msg` of a `kprint!` event, however it was recorded.
#[derive(Default)]
struct RawLine {
    text: String,
}

impl Visit for RawLine {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "raw_msg" {
            self.text = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "raw_msg" {
            self.text = value.to_string();
        }
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
