// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WAT plugin fixtures for runtime integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tunebot_config::{PluginConfig, PluginsConfig};
use tunebot_platform::PlatformRegistry;
use tunebot_plugin::{PluginRuntime, RuntimeSettings, SandboxLimits};

/// Builder for a single-module plugin.
///
/// The generated module strips `text_prefix` from `match_text` input and
/// `url_prefix` from `match_url` input, returning the remainder as the track
/// id. `track` returns `track_json` verbatim, and `lyrics`, when set,
/// returns `lyrics_json` verbatim.
pub struct PluginFixture {
    meta: String,
    text_prefix: String,
    url_prefix: String,
    track_json: String,
    lyrics_json: Option<String>,
    init_status: i32,
    require_config: bool,
}

impl PluginFixture {
    /// One platform named `name` with match and track capabilities.
    pub fn single(name: &str, aliases: &[&str]) -> Self {
        Self::with_meta(
            json!({
                "version": "1.0.0",
                "platforms": [{
                    "name": name,
                    "aliases": aliases,
                    "display_name": name.to_uppercase(),
                    "capabilities": ["match_text", "match_url", "fetch_track"],
                }]
            })
            .to_string(),
        )
        .text_prefix(&format!("{name}:"))
        .url_prefix(&format!("https://{name}.example/track/"))
    }

    pub fn with_meta(meta: String) -> Self {
        Self {
            meta,
            text_prefix: "x:".to_string(),
            url_prefix: "https://x.example/".to_string(),
            track_json: r#"{"id":"1","title":"Fixture"}"#.to_string(),
            lyrics_json: None,
            init_status: 0,
            require_config: false,
        }
    }

    pub fn text_prefix(mut self, prefix: &str) -> Self {
        self.text_prefix = prefix.to_string();
        self
    }

    pub fn url_prefix(mut self, prefix: &str) -> Self {
        self.url_prefix = prefix.to_string();
        self
    }

    pub fn track_json(mut self, json: &str) -> Self {
        self.track_json = json.to_string();
        self
    }

    pub fn lyrics_json(mut self, json: &str) -> Self {
        self.lyrics_json = Some(json.to_string());
        self
    }

    pub fn init_status(mut self, status: i32) -> Self {
        self.init_status = status;
        self
    }

    /// `init` fails with "missing config" when given an empty object.
    pub fn require_config(mut self) -> Self {
        self.require_config = true;
        self
    }

    pub fn wat(&self) -> String {
        let config_check = if self.require_config {
            r#"(if (i32.le_u (call $input_len) (i32.const 2))
                (then
                    (call $set_output (i32.const 3584) (i32.const 14))
                    (return (i32.const 1))))"#
        } else {
            ""
        };
        let lyrics = match &self.lyrics_json {
            Some(json) => format!(
                r#"(data (i32.const 16384) "{data}")
    (func (export "lyrics") (result i32)
        (call $set_output (i32.const 16384) (i32.const {len}))
        (i32.const 0))"#,
                data = wat_escape(json),
                len = json.len(),
            ),
            None => String::new(),
        };
        format!(
            r#"(module
    (import "tunebot" "log" (func $log (param i32 i32 i32)))
    (import "tunebot" "input_len" (func $input_len (result i32)))
    (import "tunebot" "read_input" (func $read_input (param i32)))
    (import "tunebot" "set_output" (func $set_output (param i32 i32)))
    (memory (export "memory") 1)
    (data (i32.const 16) "{meta}")
    (data (i32.const 1024) "{text_prefix}")
    (data (i32.const 1536) "{url_prefix}")
    (data (i32.const 2048) "{track}")
    (data (i32.const 3072) "plugin initialized")
    (data (i32.const 3584) "missing config")

    (func $strip_prefix (param $pre i32) (param $plen i32) (result i32)
        (local $len i32) (local $i i32)
        (local.set $len (call $input_len))
        (if (i32.gt_u (local.get $len) (i32.const 8192))
            (then (return (i32.const 0))))
        (if (i32.lt_u (local.get $len) (local.get $plen))
            (then (return (i32.const 0))))
        (call $read_input (i32.const 4096))
        (block $mismatch
            (loop $cmp
                (if (i32.lt_u (local.get $i) (local.get $plen))
                    (then
                        (br_if $mismatch
                            (i32.ne
                                (i32.load8_u (i32.add (i32.const 4096) (local.get $i)))
                                (i32.load8_u (i32.add (local.get $pre) (local.get $i)))))
                        (local.set $i (i32.add (local.get $i) (i32.const 1)))
                        (br $cmp))))
            (call $set_output
                (i32.add (i32.const 4096) (local.get $plen))
                (i32.sub (local.get $len) (local.get $plen))))
        (i32.const 0))

    (func (export "init") (result i32)
        {config_check}
        (call $log (i32.const 2) (i32.const 3072) (i32.const 18))
        (i32.const {init_status}))
    (func (export "meta") (result i32)
        (call $set_output (i32.const 16) (i32.const {meta_len}))
        (i32.const 0))
    (func (export "match_text") (result i32)
        (call $strip_prefix (i32.const 1024) (i32.const {text_len})))
    (func (export "match_url") (result i32)
        (call $strip_prefix (i32.const 1536) (i32.const {url_len})))
    (func (export "track") (result i32)
        (call $set_output (i32.const 2048) (i32.const {track_len}))
        (i32.const 0))
    {lyrics}
)"#,
            meta = wat_escape(&self.meta),
            text_prefix = wat_escape(&self.text_prefix),
            url_prefix = wat_escape(&self.url_prefix),
            track = wat_escape(&self.track_json),
            meta_len = self.meta.len(),
            text_len = self.text_prefix.len(),
            url_len = self.url_prefix.len(),
            track_len = self.track_json.len(),
            init_status = self.init_status,
        )
    }

    /// Writes the fixture as `<script_dir>/<plugin>/main.wat`.
    pub fn install(&self, script_dir: &Path, plugin: &str) -> PathBuf {
        write_module(script_dir, plugin, "main.wat", &self.wat())
    }
}

/// Escapes a string for a WAT data segment.
fn wat_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn write_module(script_dir: &Path, plugin: &str, file: &str, contents: &str) -> PathBuf {
    let dir = script_dir.join(plugin);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Installs a plugin whose only module does not parse.
pub fn install_broken(script_dir: &Path, plugin: &str) {
    write_module(script_dir, plugin, "main.wat", "(module (func $broken");
}

pub fn runtime(script_dir: &Path) -> (Arc<PlatformRegistry>, PluginRuntime) {
    let registry = Arc::new(PlatformRegistry::new());
    let runtime = PluginRuntime::new(
        Arc::clone(&registry),
        RuntimeSettings {
            script_dir: script_dir.to_path_buf(),
            limits: SandboxLimits::default(),
        },
    )
    .unwrap();
    (registry, runtime)
}

/// Plugins config with every named plugin enabled and no settings.
pub fn enabled(names: &[&str]) -> PluginsConfig {
    names
        .iter()
        .map(|name| (name.to_string(), PluginConfig::default()))
        .collect()
}

pub fn disabled() -> PluginConfig {
    PluginConfig::from_pairs([("enabled", toml::Value::Boolean(false))])
}
