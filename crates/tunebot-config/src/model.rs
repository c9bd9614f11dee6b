// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tunebot music bot.
//!
//! Every section uses `#[serde(deny_unknown_fields)]` except plugin tables,
//! whose keys belong to the plugin.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Tunebot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TunebotConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Built-in platform selection.
    #[serde(default)]
    pub platforms: PlatformsConfig,

    /// Script plugin runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Per-plugin tables, keyed by plugin directory name.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// External recognition service.
    #[serde(default)]
    pub recognize: RecognizeConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "tunebot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Names of the built-in platforms that can be enabled.
pub const BUILTIN_PLATFORMS: &[&str] = &["netease", "qqmusic"];

/// Built-in platform selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformsConfig {
    /// Built-in platforms to register, in match order.
    #[serde(default = "default_builtin")]
    pub builtin: Vec<String>,
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            builtin: default_builtin(),
        }
    }
}

fn default_builtin() -> Vec<String> {
    BUILTIN_PLATFORMS.iter().map(|s| s.to_string()).collect()
}

/// Script plugin runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directory holding one subdirectory per plugin.
    #[serde(default = "default_script_dir")]
    pub script_dir: String,

    /// Fuel budget for a single sandbox call.
    #[serde(default = "default_fuel_per_call")]
    pub fuel_per_call: u64,

    /// Linear memory cap per plugin instance, in MiB.
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u32,

    /// Reload plugins when files under `script_dir` change.
    #[serde(default)]
    pub watch: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            script_dir: default_script_dir(),
            fuel_per_call: default_fuel_per_call(),
            memory_limit_mb: default_memory_limit_mb(),
            watch: false,
        }
    }
}

fn default_script_dir() -> String {
    "./plugins/scripts".to_string()
}

fn default_fuel_per_call() -> u64 {
    10_000_000
}

fn default_memory_limit_mb() -> u32 {
    16
}

/// All plugin tables in name order.
pub type PluginsConfig = BTreeMap<String, PluginConfig>;

/// One `[plugins.<name>]` table.
///
/// `enabled` is reserved by the host; every other key is handed to the
/// plugin's `init` as a string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PluginConfig(pub BTreeMap<String, toml::Value>);

impl PluginConfig {
    /// Key reserved for the host.
    pub const ENABLED_KEY: &'static str = "enabled";

    /// Whether the plugin should load. Missing means enabled.
    ///
    /// Accepts booleans, integers (non-zero is true), and the strings
    /// `true/false/yes/no/on/off/1/0` in any case. Anything else is false.
    pub fn enabled(&self) -> bool {
        match self.0.get(Self::ENABLED_KEY) {
            None => true,
            Some(value) => parse_enabled(value).unwrap_or(false),
        }
    }

    /// Returns the `enabled` value when it cannot be read as a boolean.
    pub fn invalid_enabled(&self) -> Option<&toml::Value> {
        self.0
            .get(Self::ENABLED_KEY)
            .filter(|value| parse_enabled(value).is_none())
    }

    /// Flat string map passed to the plugin's `init`.
    ///
    /// Strings are passed verbatim; other values use their TOML rendering.
    pub fn init_values(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != Self::ENABLED_KEY)
            .map(|(key, value)| {
                let rendered = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), rendered)
            })
            .collect()
    }

    /// Builds a table from key/value pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, toml::Value)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn parse_enabled(value: &toml::Value) -> Option<bool> {
    match value {
        toml::Value::Boolean(b) => Some(*b),
        toml::Value::Integer(i) => Some(*i != 0),
        toml::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// External recognition service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecognizeConfig {
    /// Start the recognition service with `serve`.
    #[serde(default)]
    pub enabled: bool,

    /// Program used to launch the service.
    #[serde(default = "default_recognize_command")]
    pub command: String,

    #[serde(default = "default_recognize_args")]
    pub args: Vec<String>,

    /// Working directory of the service process. Must exist at start.
    #[serde(default = "default_recognize_working_dir")]
    pub working_dir: String,

    /// Local port; exported to the process as `PORT`.
    #[serde(default = "default_recognize_port")]
    pub port: u16,

    #[serde(default = "default_health_interval_ms")]
    pub health_interval_ms: u64,

    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra environment for the service process.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for RecognizeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_recognize_command(),
            args: default_recognize_args(),
            working_dir: default_recognize_working_dir(),
            port: default_recognize_port(),
            health_interval_ms: default_health_interval_ms(),
            startup_timeout_secs: default_startup_timeout_secs(),
            stop_grace_secs: default_stop_grace_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            env: BTreeMap::new(),
        }
    }
}

fn default_recognize_command() -> String {
    "node".to_string()
}

fn default_recognize_args() -> Vec<String> {
    vec!["server.js".to_string()]
}

fn default_recognize_working_dir() -> String {
    "plugins/netease/recognize/service".to_string()
}

fn default_recognize_port() -> u16 {
    3737
}

fn default_health_interval_ms() -> u64 {
    200
}

fn default_startup_timeout_secs() -> u64 {
    10
}

fn default_stop_grace_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}
