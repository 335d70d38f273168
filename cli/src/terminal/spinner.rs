// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

//! # Terminal UI & Logging
//!
//! 1.  **Global Logging**: Wires up `tracing` so that `info!`, `warn!`, etc.
//!     print cleanly to stderr without breaking the progress bar.
//! 2.  **The Spinner**: A small animation shown while the public IP lookup
//!     waits on the network, with the elapsed time next to the status text.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::*;
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::{IndicatifLayer, span_ext::IndicatifSpanExt};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::terminal::{colors, logging};

const DEFAULT_FILTER: &str = "info,killswitch=debug,mio=error";
const TICK: Duration = Duration::from_millis(100);

/// Wires up the global tracing subscriber.
///
/// 1.  **Filter**: `RUST_LOG` when set, [`DEFAULT_FILTER`] otherwise.
/// 2.  **Formatter**: `KillswitchFormatter`, hiding events above `verbosity`.
/// 3.  **Indicatif**: Logs print *above* the spinner line, not over it.
pub fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")?.tick_strings(&[
        "▁▁▁▁▁", "▁▂▂▂▁", "▁▄▂▄▁", "▂▄▆▄▂", "▄▆█▆▄", "▂▄▆▄▂", "▁▄▂▄▁", "▁▂▂▂▁",
    ]);
    let indicatif_layer = IndicatifLayer::new().with_progress_style(style);

    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .event_format(logging::KillswitchFormatter {
            max_verbosity: verbosity,
        })
        .with_writer(indicatif_layer.get_stderr_writer());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(formatting_layer)
        .with(indicatif_layer)
        .try_init()?;

    Ok(())
}

async fn run_spinner_loop(span: Span, running: Arc<AtomicBool>, status: String) {
    let mut interval = tokio::time::interval(TICK);
    let start_time = tokio::time::Instant::now();
    let mut last_text = String::new();

    while running.load(Ordering::Relaxed) {
        interval.tick().await;

        let elapsed = format!("{:.1}s", start_time.elapsed().as_secs_f64());
        let current_text = format!(
            "{} {}",
            status.as_str().color(colors::TEXT_DEFAULT),
            elapsed.color(colors::SEPARATOR)
        );

        if current_text != last_text {
            span.pb_set_message(&current_text);
            last_text = current_text;
        }
    }
}

/// Keeps the spinner alive until dropped.
pub struct SpinnerGuard {
    running: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl SpinnerGuard {
    pub fn with_status(span: Span, status: impl Into<String>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let run_clone = running.clone();
        let status: String = status.into();

        let handle = tokio::spawn(async move {
            run_spinner_loop(span, run_clone, status).await;
        });

        Self { running, handle }
    }
}

impl Drop for SpinnerGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.handle.abort();
    }
}
