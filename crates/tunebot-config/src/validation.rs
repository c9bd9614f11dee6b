// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::HashSet;

use crate::diagnostic::{ConfigError, closest_match};
use crate::model::{BUILTIN_PLATFORMS, TunebotConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every error instead of failing fast.
pub fn validate_config(config: &TunebotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.bot.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::InvalidValue {
            key: "bot.log_level".into(),
            reason: format!("`{}` is not a log level", config.bot.log_level),
            help: Some(format!("use one of: {}", LOG_LEVELS.join(", "))),
        });
    }

    let mut seen_builtin = HashSet::new();
    for name in &config.platforms.builtin {
        let normalized = name.trim().to_ascii_lowercase();
        if !BUILTIN_PLATFORMS.contains(&normalized.as_str()) {
            errors.push(ConfigError::UnknownBuiltin {
                name: name.clone(),
                suggestion: closest_match(&normalized, BUILTIN_PLATFORMS.iter().copied())
                    .map(str::to_string),
            });
        } else if !seen_builtin.insert(normalized) {
            errors.push(ConfigError::invalid(
                "platforms.builtin",
                format!("lists `{name}` twice"),
            ));
        }
    }

    if config.runtime.script_dir.trim().is_empty() {
        errors.push(ConfigError::invalid("runtime.script_dir", "must not be empty"));
    }
    if config.runtime.fuel_per_call == 0 {
        errors.push(ConfigError::invalid("runtime.fuel_per_call", "must be greater than 0"));
    }
    if config.runtime.memory_limit_mb == 0 {
        errors.push(ConfigError::invalid("runtime.memory_limit_mb", "must be at least 1"));
    }

    for (name, plugin) in &config.plugins {
        let trimmed = name.trim();
        if trimmed.is_empty() || matches!(trimmed, "." | "..") || trimmed.contains(['/', '\\']) {
            errors.push(ConfigError::PluginName { name: name.clone() });
        }
        if let Some(value) = plugin.invalid_enabled() {
            errors.push(ConfigError::PluginEnabled {
                plugin: name.clone(),
                value: value.to_string(),
            });
        }
    }

    let recognize = &config.recognize;
    if recognize.enabled && recognize.command.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "recognize.command",
            "must not be empty when recognition is enabled",
        ));
    }
    if recognize.enabled && recognize.port == 0 {
        errors.push(ConfigError::invalid(
            "recognize.port",
            "must not be 0 when recognition is enabled",
        ));
    }
    for (key, value) in [
        ("recognize.health_interval_ms", recognize.health_interval_ms),
        ("recognize.startup_timeout_secs", recognize.startup_timeout_secs),
        ("recognize.request_timeout_secs", recognize.request_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ConfigError::invalid(key, "must be greater than 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&TunebotConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = TunebotConfig::default();
        config.bot.log_level = "loud".into();
        config.runtime.script_dir = "  ".into();
        config.runtime.fuel_per_call = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn unknown_builtin_gets_suggestion() {
        let mut config = TunebotConfig::default();
        config.platforms.builtin = vec!["netase".into()];
        let errors = validate_config(&config).unwrap_err();
        match &errors[0] {
            ConfigError::UnknownBuiltin { name, suggestion } => {
                assert_eq!(name, "netase");
                assert_eq!(suggestion.as_deref(), Some("netease"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_builtin_rejected() {
        let mut config = TunebotConfig::default();
        config.platforms.builtin = vec!["netease".into(), "NetEase".into()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn path_like_plugin_names_rejected() {
        let mut config = TunebotConfig::default();
        config
            .plugins
            .insert("../outside".into(), crate::model::PluginConfig::default());
        config.plugins.insert("ok".into(), crate::model::PluginConfig::default());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], ConfigError::PluginName { name } if name == "../outside"));
    }

    #[test]
    fn port_zero_only_matters_when_enabled() {
        let mut config = TunebotConfig::default();
        config.recognize.port = 0;
        assert!(validate_config(&config).is_ok());
        config.recognize.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
