// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `match`, `platforms`, `recognize`, `check-config`.

use std::fmt::Write as _;
use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::warn;
use tunebot_config::TunebotConfig;
use tunebot_core::{FailureClass, TunebotError};
use tunebot_platform::{PlatformRegistry, resolve_track, route_recognition};
use tunebot_plugin::PluginRuntime;
use tunebot_recognize::{RecognitionSettings, RecognitionSupervisor};

use crate::app::{App, ConfigSource};

/// Runs `tunebot match <text>`.
pub async fn run_match(config: &TunebotConfig, text: &str) -> Result<(), TunebotError> {
    let (app, _report) = App::build(config).await?;
    println!("{}", describe_resolution(&app.registry, text));
    Ok(())
}

fn describe_resolution(registry: &PlatformRegistry, text: &str) -> String {
    match resolve_track(registry, text) {
        Some(resolution) => {
            let mut line = format!(
                "{} {} (via {:?})",
                resolution.track.platform, resolution.track.track_id, resolution.source
            );
            if let Some(quality) = resolution.quality {
                let _ = write!(line, " quality={quality}");
            }
            line
        }
        None => "no match".to_string(),
    }
}

/// Runs `tunebot platforms`.
pub async fn run_platforms(config: &TunebotConfig) -> Result<(), TunebotError> {
    let (app, _report) = App::build(config).await?;
    print!("{}", platform_table(&app.registry, &app.runtime, config));
    Ok(())
}

fn platform_table(registry: &PlatformRegistry, runtime: &PluginRuntime, config: &TunebotConfig) -> String {
    let mut out = String::new();
    for handle in registry.list() {
        let state = handle.state();
        let capabilities: Vec<String> = state.capabilities.iter().map(|c| c.to_string()).collect();
        let _ = writeln!(
            out,
            "{:<3} {:<12} {:<20} {:<8} aliases=[{}] capabilities=[{}]",
            handle.sequence(),
            handle.name(),
            handle.origin().to_string(),
            if state.enabled { "enabled" } else { "disabled" },
            state.aliases.join(", "),
            capabilities.join(", ")
        );
    }
    for name in config.plugins.keys() {
        let _ = writeln!(out, "plugin {name}: {}", runtime.plugin_state(name));
    }
    out
}

/// Runs `tunebot recognize <file>`.
///
/// Starts the service for the duration of the request and routes the
/// result through the registry like any other match.
pub async fn run_recognize(config: &TunebotConfig, file: &Path) -> Result<(), TunebotError> {
    let audio = tokio::fs::read(file).await.map_err(|e| {
        TunebotError::NotFound(format!("audio file {}: {e}", file.display()))
    })?;
    let (app, _report) = App::build(config).await?;
    let supervisor = RecognitionSupervisor::new(RecognitionSettings::from(&config.recognize))?;
    let cancel = CancellationToken::new();

    let outcome = match supervisor.start(&cancel).await {
        Ok(()) => supervisor.recognize(audio, &cancel).await,
        Err(e) => Err(e),
    };
    if let Err(e) = supervisor.stop(&cancel).await {
        warn!(error = %e, "recognition service did not stop cleanly");
    }

    let session = match outcome {
        Ok(session) => session,
        Err(e) if e.class() == FailureClass::NoResult => {
            println!("no match");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let title = session.title.as_deref().unwrap_or("unknown title");
    println!("recognized: {title} ({})", session.artists.join(", "));
    match route_recognition(&app.registry, &session) {
        Some(track) => println!("{} {}", track.platform, track.track_id),
        None => println!("{} (platform {} is not registered)", session.url, session.platform),
    }
    Ok(())
}

/// Runs `tunebot check-config`. Reaching this point means the configuration
/// already loaded and validated.
pub fn run_check_config(config: &TunebotConfig, source: &ConfigSource) {
    println!("configuration OK ({})", source.describe());
    println!("  built-in platforms: {}", config.platforms.builtin.join(", "));
    println!("  script directory:   {}", config.runtime.script_dir);
    println!("  plugins:            {}", config.plugins.len());
    println!(
        "  recognition:        {}",
        if config.recognize.enabled { "enabled" } else { "disabled" }
    );
}
