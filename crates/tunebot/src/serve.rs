// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `tunebot serve` command implementation.
//!
//! Registers built-in platforms, loads script plugins, starts the recognition
//! service when enabled, and then waits for reload triggers (SIGHUP and the
//! optional script directory watcher) until SIGINT or SIGTERM.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tunebot_config::TunebotConfig;
use tunebot_core::{ReloadSink, TunebotError};
use tunebot_plugin::PluginRuntime;
use tunebot_recognize::{RecognitionSettings, RecognitionSupervisor};

use crate::app::{App, ConfigSource};
use crate::reload::{TracingReloadSink, reload_plugins, watch_script_dir};

/// Runs the `tunebot serve` command.
pub async fn run_serve(config: TunebotConfig, source: ConfigSource) -> Result<(), TunebotError> {
    info!(name = %config.bot.name, config = %source.describe(), "starting tunebot serve");

    let (app, _report) = App::build(&config).await?;
    info!(platforms = ?app.registry.enabled_names(), "platform registry ready");

    let shutdown = install_signal_handler();

    let supervisor = if config.recognize.enabled {
        let supervisor = Arc::new(RecognitionSupervisor::new(RecognitionSettings::from(
            &config.recognize,
        ))?);
        // Recognition is optional; the bot runs without it.
        if let Err(e) = supervisor.start(&shutdown).await {
            warn!(error = %e, "recognition service unavailable");
        }
        Some(supervisor)
    } else {
        debug!("recognition service disabled");
        None
    };

    let (reload_tx, reload_rx) = mpsc::unbounded_channel();
    spawn_sighup_listener(reload_tx.clone(), shutdown.clone());

    let _watcher = if config.runtime.watch {
        match watch_script_dir(&app.runtime.settings().script_dir, reload_tx) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(error = %e, "script directory watch disabled");
                None
            }
        }
    } else {
        drop(reload_tx);
        None
    };

    let sink = TracingReloadSink;
    reload_loop(&source, &app.runtime, &sink, reload_rx, &shutdown).await;

    info!("shutting down");
    if let Some(supervisor) = supervisor {
        // Shutdown has already been requested; give the service its own token.
        if let Err(e) = supervisor.stop(&CancellationToken::new()).await {
            warn!(error = %e, "recognition service did not stop cleanly");
        }
    }
    info!("tunebot stopped");
    Ok(())
}

/// Serves reload requests until shutdown. Requests that queue up while a
/// pass runs are coalesced into one follow-up pass.
async fn reload_loop(
    source: &ConfigSource,
    runtime: &PluginRuntime,
    sink: &dyn ReloadSink,
    mut requests: mpsc::UnboundedReceiver<()>,
    shutdown: &CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            request = requests.recv() => {
                if request.is_none() {
                    // No trigger left; wait for shutdown only.
                    shutdown.cancelled().await;
                    break;
                }
                while requests.try_recv().is_ok() {}
                info!("reloading plugins");
                if let Err(e) = reload_plugins(source, runtime, sink).await {
                    debug!(error = %e, "reload skipped");
                }
            }
        }
    }
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a token that is cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT, initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    info!("received SIGINT, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

/// Forwards SIGHUP as a reload request.
#[cfg(unix)]
fn spawn_sighup_listener(tx: mpsc::UnboundedSender<()>, shutdown: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            warn!(error = %e, "failed to install SIGHUP handler, reload on signal disabled");
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() || tx.send(()).is_err() {
                        break;
                    }
                    info!("received SIGHUP");
                }
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_sighup_listener(_tx: mpsc::UnboundedSender<()>, _shutdown: CancellationToken) {}
