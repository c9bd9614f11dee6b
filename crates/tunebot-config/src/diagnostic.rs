// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports deserialization failures by key path. They are mapped onto
//! [`ConfigError`] with a label on the offending line of `tunebot.toml` when
//! the source text is available. The semantic checks in
//! [`crate::validation`] report through the same type, so `tunebot` renders
//! every configuration problem the same way.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;
use tunebot_core::TunebotError;

use crate::model::BUILTIN_PLATFORMS;

/// Jaro-Winkler score a candidate must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One configuration problem.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A key outside `[plugins.<name>]` that no section accepts.
    #[error("unknown key `{key}` in {}", table_label(.section))]
    #[diagnostic(
        code(tunebot::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted table path, empty for the top level.
        section: String,
        key: String,
        suggestion: Option<String>,
        valid_keys: Vec<String>,
        #[label("not recognized here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}, expected {expected}")]
    #[diagnostic(code(tunebot::config::invalid_type), help("{}", invalid_type_help(key)))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// `enabled` in a plugin table holds something other than a boolean.
    #[error("`plugins.{plugin}.enabled` must be a boolean, found {value}")]
    #[diagnostic(
        code(tunebot::config::plugin_enabled),
        help(
            "use `enabled = true` or `enabled = false`; other keys in [plugins.{plugin}] go to the plugin's init"
        )
    )]
    PluginEnabled { plugin: String, value: String },

    /// A `[plugins.<name>]` table whose name cannot be a directory under `script_dir`.
    #[error("`{name}` is not a valid plugin name")]
    #[diagnostic(
        code(tunebot::config::plugin_name),
        help("name each table after a single directory under runtime.script_dir, e.g. [plugins.bandcamp]")
    )]
    PluginName { name: String },

    #[error("`{name}` in platforms.builtin is not a built-in platform")]
    #[diagnostic(
        code(tunebot::config::unknown_builtin),
        help("{}", builtin_help(suggestion.as_deref()))
    )]
    UnknownBuiltin {
        name: String,
        suggestion: Option<String>,
    },

    /// A value that parsed but is out of range for `key`.
    #[error("`{key}` {reason}")]
    #[diagnostic(code(tunebot::config::invalid_value))]
    InvalidValue {
        key: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    /// Anything figment reports that has no dedicated variant, such as a
    /// missing `--config` file or malformed TOML.
    #[error("{0}")]
    #[diagnostic(code(tunebot::config::load))]
    Load(String),
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.into(),
            reason: reason.into(),
            help: None,
        }
    }
}

impl From<ConfigError> for TunebotError {
    fn from(err: ConfigError) -> Self {
        TunebotError::Config(err.to_string())
    }
}

fn table_label(section: &str) -> String {
    if section.is_empty() {
        "the top level".to_string()
    } else {
        format!("[{section}]")
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &[String]) -> String {
    let valid = valid_keys.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid}"),
        None => format!("valid keys: {valid}"),
    }
}

fn invalid_type_help(key: &str) -> String {
    let path: Vec<&str> = key.split('.').collect();
    match path.as_slice() {
        ["plugins"] => "[plugins] holds one table per plugin, e.g. [plugins.bandcamp]".to_string(),
        ["plugins", name] => format!("declare the plugin as a table: [plugins.{name}]"),
        ["recognize", "env", ..] => "recognize.env maps variable names to strings".to_string(),
        ["platforms", "builtin", ..] => {
            format!("list platform names, e.g. builtin = [\"{}\"]", BUILTIN_PLATFORMS.join("\", \""))
        }
        _ => format!("check the value of `{key}` in tunebot.toml"),
    }
}

fn builtin_help(suggestion: Option<&str>) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`?"),
        None => format!("built-in platforms: {}", BUILTIN_PLATFORMS.join(", ")),
    }
}

/// Maps every error figment collected onto a [`ConfigError`].
///
/// `sources` pairs a display path with the TOML text read from it; labels are
/// only attached when the failing file is among them.
pub(crate) fn collect_figment_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| from_figment(error, sources))
        .collect()
}

fn from_figment(error: figment::Error, sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    match &error.kind {
        // For unknown fields figment's path names the enclosing table.
        Kind::UnknownField(field, expected) => {
            let (span, src) = label(&error, &error.path, field, sources);
            ConfigError::UnknownKey {
                section: error.path.join("."),
                key: field.clone(),
                suggestion: closest_match(field, expected.iter().copied()).map(str::to_string),
                valid_keys: expected.iter().map(|k| k.to_string()).collect(),
                span,
                src,
            }
        }
        Kind::InvalidType(found, expected) => {
            let (span, src) = match error.path.split_last() {
                Some((key, section)) => label(&error, section, key, sources),
                None => (None, None),
            };
            ConfigError::InvalidType {
                key: error.path.join("."),
                found: found.to_string(),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Load(error.to_string()),
    }
}

fn label(
    error: &figment::Error,
    section: &[String],
    key: &str,
    sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| s.file_path())
        .map(|p| p.display().to_string());

    // Strings loaded through `load_config_from_str` carry no file path.
    let source = match file {
        Some(file) => sources.iter().find(|(path, _)| *path == file),
        None => match sources {
            [only] => Some(only),
            _ => None,
        },
    };

    let Some((path, content)) = source else {
        return (None, None);
    };
    match locate_key(content, section, key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(path, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key` in TOML text, looking only at lines that belong to
/// the table `section` (empty for the top level).
pub fn locate_key(content: &str, section: &[String], key: &str) -> Option<usize> {
    let wanted = section.join(".");
    let mut table = String::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let body = line.trim_start();
        if let Some(header) = body.strip_prefix('[') {
            table = header
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or_default()
                .split('.')
                .map(|part| part.trim().trim_matches('"'))
                .collect::<Vec<_>>()
                .join(".");
            continue;
        }
        if table != wanted {
            continue;
        }

        let Some((name, _)) = body.split_once('=') else {
            continue;
        };
        if name.trim().trim_matches('"') == key {
            let indent = line.len() - body.len();
            return body.find(key).map(|at| start + indent + at);
        }
    }

    None
}

/// Closest candidate to `input` by Jaro-Winkler similarity, if any is close enough.
pub fn closest_match<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|candidate| (strsim::jaro_winkler(input, candidate), candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate)
}

/// Print each diagnostic to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
