// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin lifecycle: load, reload, and disable.
//!
//! A reload pass walks the configured plugins in name order, loads each one
//! in a fresh sandbox, and registers or updates one handle per declared
//! platform. Platforms that no plugin reported in the pass are disabled in
//! place. Handles are never removed, so anyone holding one keeps a valid
//! reference across reloads.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use strum::Display;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tunebot_config::{PluginsConfig, RuntimeConfig};
use tunebot_core::{ReloadReport, TunebotError};
use tunebot_platform::{PlatformHandle, PlatformRegistry, Registration, is_builtin_name};
use wasmtime::Engine;

use crate::descriptor::PlatformDeclaration;
use crate::loader::{LoadedPlugin, load_plugin};
use crate::sandbox::{SandboxLimits, new_engine};
use crate::scripted::ScriptedPlatform;

/// Lifecycle state of one plugin package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PluginState {
    Unloaded,
    Loading,
    Loaded,
    Disabled,
}

/// Settings the runtime needs from `[runtime]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSettings {
    pub script_dir: PathBuf,
    pub limits: SandboxLimits,
}

impl From<&RuntimeConfig> for RuntimeSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            script_dir: PathBuf::from(&config.script_dir),
            limits: SandboxLimits {
                fuel_per_call: config.fuel_per_call,
                memory_limit_bytes: (config.memory_limit_mb as usize).saturating_mul(1024 * 1024),
            },
        }
    }
}

/// Runtime record tying a registry handle to the plugin that implements it.
#[derive(Debug, Clone)]
pub struct ScriptedPlatformState {
    pub handle: Arc<PlatformHandle>,
    /// Plugin that last reported this platform.
    pub plugin: String,
    pub declaration: PlatformDeclaration,
    pub enabled: bool,
}

#[derive(Default)]
struct RuntimeState {
    platforms: BTreeMap<String, ScriptedPlatformState>,
}

/// Loads script plugins and keeps their platforms registered.
pub struct PluginRuntime {
    engine: Engine,
    settings: RuntimeSettings,
    registry: Arc<PlatformRegistry>,
    /// Serializes reload passes.
    state: Mutex<RuntimeState>,
    plugin_states: StdMutex<HashMap<String, PluginState>>,
}

impl PluginRuntime {
    pub fn new(registry: Arc<PlatformRegistry>, settings: RuntimeSettings) -> Result<Self, TunebotError> {
        Ok(Self {
            engine: new_engine()?,
            settings,
            registry,
            state: Mutex::new(RuntimeState::default()),
            plugin_states: StdMutex::new(HashMap::new()),
        })
    }

    pub fn registry(&self) -> &Arc<PlatformRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Current state of `plugin`; unknown plugins are `Unloaded`.
    pub fn plugin_state(&self, plugin: &str) -> PluginState {
        self.plugin_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(plugin)
            .copied()
            .unwrap_or(PluginState::Unloaded)
    }

    fn set_plugin_state(&self, plugin: &str, state: PluginState) {
        self.plugin_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(plugin.to_string(), state);
    }

    /// Initial load at startup. Same as [`PluginRuntime::reload`].
    pub async fn load(&self, plugins: &PluginsConfig) -> ReloadReport {
        self.reload(plugins).await
    }

    /// Runs one reload pass over `plugins`.
    ///
    /// Failures of individual plugins are logged and recorded in the report;
    /// they never abort the pass.
    pub async fn reload(&self, plugins: &PluginsConfig) -> ReloadReport {
        let mut state = self.state.lock().await;
        let mut report = ReloadReport::default();
        let mut reported: HashSet<String> = HashSet::new();
        let mut loaded_plugins: BTreeSet<String> = BTreeSet::new();

        for (name, config) in plugins {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if !config.enabled() {
                debug!(plugin = %name, "plugin disabled by configuration");
                report.skipped.push(name.to_string());
                continue;
            }
            if is_builtin_name(name) {
                warn!(plugin = %name, "plugin name shadows a built-in platform, skipping");
                report.skipped.push(name.to_string());
                continue;
            }

            self.set_plugin_state(name, PluginState::Loading);
            let loaded = match self.load_blocking(name, config.clone()).await {
                Ok(loaded) => loaded,
                Err(e) => {
                    warn!(plugin = %name, error = %e, "plugin failed to load");
                    report.failed.push((name.to_string(), e.to_string()));
                    continue;
                }
            };
            loaded_plugins.insert(name.to_string());

            for declaration in &loaded.descriptor.platforms {
                if reported.contains(&declaration.name) {
                    let message = format!(
                        "platform `{}` from plugin `{name}` was already loaded in this pass",
                        declaration.name
                    );
                    warn!(plugin = %name, platform = %declaration.name, "duplicate platform declaration");
                    report.conflicts.push(message);
                    continue;
                }

                match self.apply_declaration(&mut state, name, declaration, &loaded) {
                    Ok(()) => {
                        reported.insert(declaration.name.clone());
                        report.loaded.push(declaration.name.clone());
                    }
                    Err(e) => {
                        warn!(plugin = %name, platform = %declaration.name, error = %e, "platform registration failed");
                        report.conflicts.push(e.to_string());
                    }
                }
            }
        }

        for (platform, record) in state.platforms.iter_mut() {
            if reported.contains(platform) || !record.enabled {
                continue;
            }
            match self.registry.disable(platform) {
                Ok(_) => {
                    record.enabled = false;
                    info!(plugin = %record.plugin, platform = %platform, "platform disabled");
                    report.disabled.push(platform.clone());
                }
                Err(e) => warn!(platform = %platform, error = %e, "failed to disable platform"),
            }
        }

        self.settle_plugin_states(&state, plugins, &loaded_plugins);

        info!(
            loaded = report.loaded.len(),
            disabled = report.disabled.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            conflicts = report.conflicts.len(),
            "plugin reload complete"
        );
        report
    }

    async fn load_blocking(
        &self,
        name: &str,
        config: tunebot_config::PluginConfig,
    ) -> Result<LoadedPlugin, TunebotError> {
        let engine = self.engine.clone();
        let script_dir = self.settings.script_dir.clone();
        let limits = self.settings.limits;
        let plugin = name.to_string();
        tokio::task::spawn_blocking(move || {
            load_plugin(&engine, &script_dir, &plugin, &config, limits)
        })
        .await
        .map_err(|e| TunebotError::Internal(format!("plugin load task failed: {e}")))?
    }

    /// Registers a new handle or swaps the provider of an existing one.
    fn apply_declaration(
        &self,
        state: &mut RuntimeState,
        plugin: &str,
        declaration: &PlatformDeclaration,
        loaded: &LoadedPlugin,
    ) -> Result<(), TunebotError> {
        let provider = Arc::new(ScriptedPlatform::new(
            plugin,
            declaration,
            Arc::clone(&loaded.sandbox),
        ));
        let registration = Registration::script(provider, declaration.aliases.clone(), plugin);

        let handle = if state.platforms.contains_key(&declaration.name) {
            self.registry.update(&declaration.name, registration)?
        } else {
            self.registry.register(registration)?
        };

        debug!(plugin = %plugin, platform = %declaration.name, sequence = handle.sequence(), "platform loaded");
        state.platforms.insert(
            declaration.name.clone(),
            ScriptedPlatformState {
                handle,
                plugin: plugin.to_string(),
                declaration: declaration.clone(),
                enabled: true,
            },
        );
        Ok(())
    }

    fn settle_plugin_states(
        &self,
        state: &RuntimeState,
        plugins: &PluginsConfig,
        loaded_plugins: &BTreeSet<String>,
    ) {
        let mut states = self
            .plugin_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: BTreeSet<String> = states.keys().cloned().collect();
        names.extend(plugins.keys().map(|k| k.trim().to_string()).filter(|k| !k.is_empty()));

        for name in names {
            let next = if loaded_plugins.contains(&name) {
                PluginState::Loaded
            } else if state.platforms.values().any(|r| r.plugin == name) {
                PluginState::Disabled
            } else {
                PluginState::Unloaded
            };
            states.insert(name, next);
        }
    }

    /// Snapshot of every scripted platform record, in name order.
    pub async fn platforms(&self) -> Vec<ScriptedPlatformState> {
        self.state.lock().await.platforms.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_from_config_converts_megabytes() {
        let config = RuntimeConfig {
            script_dir: "/srv/plugins".into(),
            fuel_per_call: 500,
            memory_limit_mb: 4,
            watch: false,
        };
        let settings = RuntimeSettings::from(&config);
        assert_eq!(settings.script_dir, PathBuf::from("/srv/plugins"));
        assert_eq!(settings.limits.fuel_per_call, 500);
        assert_eq!(settings.limits.memory_limit_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn plugin_state_display() {
        assert_eq!(PluginState::Loading.to_string(), "loading");
        assert_eq!(PluginState::Disabled.to_string(), "disabled");
    }

    #[tokio::test]
    async fn unknown_plugin_is_unloaded() {
        let runtime = PluginRuntime::new(
            Arc::new(PlatformRegistry::new()),
            RuntimeSettings::from(&RuntimeConfig::default()),
        )
        .unwrap();
        assert_eq!(runtime.plugin_state("ghost"), PluginState::Unloaded);
        assert!(runtime.platforms().await.is_empty());
    }

    #[tokio::test]
    async fn missing_plugin_directory_fails_without_aborting() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = PluginRuntime::new(
            Arc::new(PlatformRegistry::new()),
            RuntimeSettings {
                script_dir: dir.path().to_path_buf(),
                limits: SandboxLimits::default(),
            },
        )
        .unwrap();
        let mut plugins = PluginsConfig::new();
        plugins.insert("ghost".into(), Default::default());
        plugins.insert(
            "off".into(),
            tunebot_config::PluginConfig::from_pairs([("enabled", toml::Value::Boolean(false))]),
        );

        let report = runtime.reload(&plugins).await;
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "ghost");
        assert_eq!(report.skipped, vec!["off"]);
        assert_eq!(runtime.plugin_state("ghost"), PluginState::Unloaded);
    }
}
