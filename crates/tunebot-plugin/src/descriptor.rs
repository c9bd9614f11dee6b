// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptor parsing.
//!
//! A plugin's `meta` export returns a JSON descriptor listing the platforms
//! the package implements:
//!
//! ```json
//! {
//!   "version": "1.2.0",
//!   "min_host_version": "0.1.0",
//!   "platforms": [
//!     {"name": "bandcamp", "aliases": ["bc"], "capabilities": ["match_text", "match_url"]}
//!   ]
//! }
//! ```

use std::collections::HashSet;

use semver::Version;
use serde::Deserialize;
use tunebot_core::{Capability, CapabilitySet, TunebotError};

/// Version of this host, compared against `min_host_version`.
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Validated metadata a loaded plugin declares about itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDescriptor {
    /// On-disk package name.
    pub plugin_name: String,
    /// Declared platforms, in declaration order.
    pub platforms: Vec<PlatformDeclaration>,
    pub version: Option<Version>,
    pub min_host_version: Option<Version>,
}

/// One platform a plugin implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDeclaration {
    /// Lowercase canonical name.
    pub name: String,
    pub aliases: Vec<String>,
    pub capabilities: CapabilitySet,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    #[serde(default)]
    platforms: Vec<DeclarationEntry>,
    version: Option<String>,
    min_host_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeclarationEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    capabilities: Vec<Capability>,
    display_name: Option<String>,
}

/// Parses and validates the descriptor JSON returned by a plugin's `meta`.
///
/// Entries with an empty name are skipped. Zero remaining platforms is
/// `NotFound`; a host older than `min_host_version` is `Config`.
pub fn parse_descriptor(plugin: &str, json: &[u8]) -> Result<PluginDescriptor, TunebotError> {
    let file: DescriptorFile = serde_json::from_slice(json).map_err(|e| TunebotError::Evaluation {
        plugin: plugin.to_string(),
        message: format!("invalid descriptor: {e}"),
        source: Some(Box::new(e)),
    })?;

    let version = file
        .version
        .as_deref()
        .map(|v| parse_version(plugin, "version", v))
        .transpose()?;
    let min_host_version = file
        .min_host_version
        .as_deref()
        .map(|v| parse_version(plugin, "min_host_version", v))
        .transpose()?;

    if let Some(required) = &min_host_version {
        let host = Version::parse(HOST_VERSION)
            .map_err(|e| TunebotError::Internal(format!("invalid host version: {e}")))?;
        if *required > host {
            return Err(TunebotError::Config(format!(
                "plugin {plugin} requires tunebot {required} or newer (running {host})"
            )));
        }
    }

    let mut seen = HashSet::new();
    let mut platforms = Vec::with_capacity(file.platforms.len());
    for entry in file.platforms {
        let name = entry.name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        if !seen.insert(name.clone()) {
            return Err(TunebotError::evaluation(
                plugin,
                format!("platform `{name}` declared twice"),
            ));
        }
        let display_name = entry
            .display_name
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| name.clone());
        platforms.push(PlatformDeclaration {
            name,
            aliases: entry.aliases,
            capabilities: entry.capabilities.into_iter().collect(),
            display_name,
        });
    }

    if platforms.is_empty() {
        return Err(TunebotError::NotFound(format!(
            "plugin {plugin} declares no platforms"
        )));
    }

    Ok(PluginDescriptor {
        plugin_name: plugin.to_string(),
        platforms,
        version,
        min_host_version,
    })
}

fn parse_version(plugin: &str, field: &str, value: &str) -> Result<Version, TunebotError> {
    Version::parse(value.trim()).map_err(|e| {
        TunebotError::evaluation(plugin, format!("descriptor {field} `{value}` is not semver: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_descriptor() {
        let json = br#"{
            "version": "1.2.0",
            "platforms": [
                {"name": "Bandcamp", "aliases": ["bc"], "capabilities": ["match_text", "match_url"], "display_name": "Bandcamp"},
                {"name": "", "capabilities": ["search"]},
                {"name": "mixcloud"}
            ]
        }"#;
        let d = parse_descriptor("indie", json).unwrap();
        assert_eq!(d.plugin_name, "indie");
        assert_eq!(d.version, Some(Version::new(1, 2, 0)));
        assert_eq!(d.platforms.len(), 2);
        assert_eq!(d.platforms[0].name, "bandcamp");
        assert_eq!(d.platforms[0].aliases, vec!["bc"]);
        assert!(d.platforms[0].capabilities.contains(&Capability::MatchUrl));
        assert_eq!(d.platforms[1].display_name, "mixcloud");
        assert!(d.platforms[1].capabilities.is_empty());
    }

    #[test]
    fn unknown_capability_is_evaluation_error() {
        let json = br#"{"platforms": [{"name": "x", "capabilities": ["teleport"]}]}"#;
        let err = parse_descriptor("p", json).unwrap_err();
        assert!(matches!(err, TunebotError::Evaluation { .. }));
    }

    #[test]
    fn zero_platforms_is_not_found() {
        let err = parse_descriptor("p", br#"{"platforms": [{"name": "  "}]}"#).unwrap_err();
        assert!(matches!(err, TunebotError::NotFound(_)));
        let err = parse_descriptor("p", br#"{}"#).unwrap_err();
        assert!(matches!(err, TunebotError::NotFound(_)));
    }

    #[test]
    fn newer_host_requirement_is_config_error() {
        let err = parse_descriptor(
            "p",
            br#"{"min_host_version": "999.0.0", "platforms": [{"name": "x"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, TunebotError::Config(_)));

        let ok = parse_descriptor(
            "p",
            br#"{"min_host_version": "0.0.1", "platforms": [{"name": "x"}]}"#,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn duplicate_platform_rejected() {
        let err = parse_descriptor("p", br#"{"platforms": [{"name": "x"}, {"name": "X"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(parse_descriptor("p", b"not json").is_err());
    }
}
