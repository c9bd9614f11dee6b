// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reload triggers and outcome delivery.
//!
//! A reload re-reads configuration from the original source and hands the
//! `[plugins]` tables to the plugin runtime. Other sections take effect on
//! restart.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tunebot_core::{ReloadReport, ReloadSink, TunebotError};
use tunebot_plugin::PluginRuntime;

use crate::app::{ConfigSource, config_errors_to_error};

/// Debounce window for script directory changes.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Logs every reload outcome.
pub struct TracingReloadSink;

#[async_trait]
impl ReloadSink for TracingReloadSink {
    async fn deliver(&self, outcome: Result<&ReloadReport, &TunebotError>) {
        match outcome {
            Ok(report) if report.is_clean() => info!(%report, "plugin reload finished"),
            Ok(report) => {
                for (plugin, error) in &report.failed {
                    warn!(plugin = %plugin, error = %error, "plugin failed to reload");
                }
                for conflict in &report.conflicts {
                    warn!(conflict = %conflict, "platform conflict during reload");
                }
                warn!(%report, "plugin reload finished with errors");
            }
            Err(e) => warn!(error = %e, "plugin reload aborted"),
        }
    }
}

/// Runs one reload pass and delivers the outcome to `sink`.
///
/// Invalid configuration aborts the pass before any plugin is touched.
pub async fn reload_plugins(
    source: &ConfigSource,
    runtime: &PluginRuntime,
    sink: &dyn ReloadSink,
) -> Result<ReloadReport, TunebotError> {
    let config = match source.load() {
        Ok(config) => config,
        Err(errors) => {
            let error = config_errors_to_error(&errors);
            sink.deliver(Err(&error)).await;
            return Err(error);
        }
    };

    let report = runtime.reload(&config.plugins).await;
    sink.deliver(Ok(&report)).await;
    Ok(report)
}

/// Watches `script_dir` and sends a unit on every debounced change batch.
///
/// The returned debouncer must be kept alive for the watch to continue.
pub fn watch_script_dir(
    script_dir: &Path,
    tx: mpsc::UnboundedSender<()>,
) -> Result<Debouncer<notify::RecommendedWatcher>, TunebotError> {
    let mut debouncer = new_debouncer(WATCH_DEBOUNCE, move |result: DebounceEventResult| {
        match result {
            Ok(events) if !events.is_empty() => {
                debug!(count = events.len(), "script directory changed");
                let _ = tx.send(());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "script directory watch error"),
        }
    })
    .map_err(|e| TunebotError::Internal(format!("failed to create file watcher: {e}")))?;

    debouncer
        .watcher()
        .watch(script_dir, RecursiveMode::Recursive)
        .map_err(|e| {
            TunebotError::Config(format!(
                "cannot watch script directory {}: {e}",
                script_dir.display()
            ))
        })?;
    info!(path = %script_dir.display(), "watching script directory for changes");
    Ok(debouncer)
}
