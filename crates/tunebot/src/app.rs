// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup wiring shared by the subcommands.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tunebot_config::{ConfigError, TunebotConfig};
use tunebot_core::{ReloadReport, TunebotError};
use tunebot_platform::{PlatformRegistry, register_builtins};
use tunebot_plugin::{PluginRuntime, RuntimeSettings};

/// Where configuration is read from, for startup and every reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Compiled defaults, the XDG file hierarchy, and `TUNEBOT_*` variables.
    Layered,
    /// A single explicit file.
    File(PathBuf),
}

impl ConfigSource {
    pub fn from_flag(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => ConfigSource::File(path),
            None => ConfigSource::Layered,
        }
    }

    pub fn load(&self) -> Result<TunebotConfig, Vec<ConfigError>> {
        match self {
            ConfigSource::Layered => tunebot_config::load_and_validate(),
            ConfigSource::File(path) => tunebot_config::load_and_validate_path(path),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Layered => "default locations".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
        }
    }
}

/// Registry plus the plugin runtime feeding it.
pub struct App {
    pub registry: Arc<PlatformRegistry>,
    pub runtime: Arc<PluginRuntime>,
}

impl App {
    /// Registers the configured built-ins, then loads plugins.
    ///
    /// Built-ins go first so their names and aliases win over plugins.
    pub async fn build(config: &TunebotConfig) -> Result<(Self, ReloadReport), TunebotError> {
        let registry = Arc::new(PlatformRegistry::new());
        register_builtins(&registry, &config.platforms.builtin)?;

        let runtime = Arc::new(PluginRuntime::new(
            Arc::clone(&registry),
            RuntimeSettings::from(&config.runtime),
        )?);
        let report = runtime.load(&config.plugins).await;
        if report.is_clean() {
            info!(%report, "plugins loaded");
        } else {
            warn!(%report, "plugins loaded with errors");
        }

        Ok((Self { registry, runtime }, report))
    }
}

/// Collapses configuration diagnostics into one error for reload outcomes.
pub fn config_errors_to_error(errors: &[ConfigError]) -> TunebotError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    TunebotError::Config(messages.join("; "))
}
