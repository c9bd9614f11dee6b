// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tunebot.toml` > `~/.config/tunebot/tunebot.toml` >
//! `/etc/tunebot/tunebot.toml` with environment variable overrides via `TUNEBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::TunebotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tunebot/tunebot.toml`
/// 3. `~/.config/tunebot/tunebot.toml`
/// 4. `./tunebot.toml`
/// 5. `TUNEBOT_*` environment variables
pub fn load_config() -> Result<TunebotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TunebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TunebotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TunebotConfig, figment::Error> {
    if !path.is_file() {
        return Err(figment::Error::from(format!(
            "configuration file {} does not exist",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), "loading configuration file");
    Figment::new()
        .merge(Serialized::defaults(TunebotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TunebotConfig::default()))
        .merge(Toml::file("/etc/tunebot/tunebot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tunebot/tunebot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tunebot.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `TUNEBOT_RUNTIME_SCRIPT_DIR`
/// must map to `runtime.script_dir`, not `runtime.script.dir`. Plugin tables
/// are not reachable from the environment.
fn env_provider() -> Env {
    Env::prefixed("TUNEBOT_")
        .filter(|key| !key.as_str().starts_with("plugins"))
        .map(|key| {
            let key_str = key.as_str();
            let mapped = key_str
                .replacen("bot_", "bot.", 1)
                .replacen("platforms_", "platforms.", 1)
                .replacen("runtime_", "runtime.", 1)
                .replacen("recognize_", "recognize.", 1);
            mapped.into()
        })
}
