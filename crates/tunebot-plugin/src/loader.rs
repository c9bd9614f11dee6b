// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin package discovery and loading.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;
use tunebot_config::PluginConfig;
use tunebot_core::TunebotError;
use wasmtime::Engine;

use crate::descriptor::{parse_descriptor, PluginDescriptor};
use crate::sandbox::{capability_export, PluginSandbox, SandboxLimits};

/// A plugin package that compiled, initialized, and declared its platforms.
pub struct LoadedPlugin {
    pub descriptor: PluginDescriptor,
    pub sandbox: Arc<Mutex<PluginSandbox>>,
}

/// Lists the module files of `<script_dir>/<plugin>`, sorted by file name.
///
/// Only `.wasm` and `.wat` files count; `*_test.*` files are excluded.
pub fn discover_files(script_dir: &Path, plugin: &str) -> Result<Vec<PathBuf>, TunebotError> {
    if plugin.is_empty() || plugin == "." || plugin == ".." || plugin.contains(['/', '\\']) {
        return Err(TunebotError::Config(format!(
            "plugin name `{plugin}` is not a directory name"
        )));
    }
    let dir = script_dir.join(plugin);
    let entries = std::fs::read_dir(&dir).map_err(|e| {
        TunebotError::NotFound(format!("plugin directory {}: {e}", dir.display()))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_module_file(path))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(TunebotError::NotFound(format!(
            "no .wasm or .wat files in {}",
            dir.display()
        )));
    }
    Ok(files)
}

fn is_module_file(path: &Path) -> bool {
    let is_module = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("wasm") | Some("wat")
    );
    let is_test = path
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with("_test"));
    is_module && !is_test
}

/// Loads one plugin package in a fresh sandbox.
///
/// Runs `init` with the plugin's configuration, then reads `meta` and checks
/// that every declared capability has its entry point. Blocking; call from
/// `spawn_blocking`.
pub fn load_plugin(
    engine: &Engine,
    script_dir: &Path,
    plugin: &str,
    config: &PluginConfig,
    limits: SandboxLimits,
) -> Result<LoadedPlugin, TunebotError> {
    let files = discover_files(script_dir, plugin)?;
    debug!(plugin = %plugin, files = files.len(), "loading plugin");

    let mut sandbox = PluginSandbox::load(engine, plugin, &files, limits)?;

    let init_input = serde_json::to_vec(&config.init_values())
        .map_err(|e| TunebotError::Internal(format!("failed to encode plugin config: {e}")))?;
    sandbox.call("init", "", &init_input)?;

    let meta = sandbox.call("meta", "", &[])?;
    let descriptor = parse_descriptor(plugin, &meta)?;

    for declaration in &descriptor.platforms {
        for capability in &declaration.capabilities {
            let export = capability_export(*capability);
            if !sandbox.has_export(export) {
                return Err(TunebotError::evaluation(
                    plugin,
                    format!(
                        "platform `{}` declares {capability} but the plugin has no `{export}` export",
                        declaration.name
                    ),
                ));
            }
        }
    }

    Ok(LoadedPlugin {
        descriptor,
        sandbox: Arc::new(Mutex::new(sandbox)),
    })
}
