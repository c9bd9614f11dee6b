// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`Platform`] adapter over a plugin sandbox.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::warn;
use tunebot_core::{
    Capability, CapabilitySet, Lyrics, Platform, Track, TrackTags, TunebotError,
};

use crate::descriptor::PlatformDeclaration;
use crate::sandbox::{PluginSandbox, capability_export};

/// One declared platform of a loaded plugin.
///
/// Several platforms of the same package share one sandbox; the platform
/// name is passed to every call so the guest can dispatch.
pub struct ScriptedPlatform {
    name: String,
    display_name: String,
    capabilities: CapabilitySet,
    plugin: String,
    sandbox: Arc<Mutex<PluginSandbox>>,
}

impl ScriptedPlatform {
    pub fn new(plugin: &str, declaration: &PlatformDeclaration, sandbox: Arc<Mutex<PluginSandbox>>) -> Self {
        Self {
            name: declaration.name.clone(),
            display_name: declaration.display_name.clone(),
            capabilities: declaration.capabilities.clone(),
            plugin: plugin.to_string(),
            sandbox,
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    fn call_sync(&self, capability: Capability, input: &[u8]) -> Result<Vec<u8>, TunebotError> {
        call_sandbox(&self.sandbox, &self.plugin, &self.name, capability, input)
    }

    /// Runs a matcher; errors are logged and treated as no match.
    ///
    /// Guest code may run up to `fuel_per_call`, so on a multi-thread runtime
    /// the worker is handed off with `block_in_place` for the call. A
    /// current-thread runtime cannot hand off and runs the guest inline.
    fn run_matcher(&self, capability: Capability, input: &str) -> Option<String> {
        if !self.capabilities.contains(&capability) {
            return None;
        }
        let on_worker = Handle::try_current()
            .is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread);
        let result = if on_worker {
            tokio::task::block_in_place(|| self.call_sync(capability, input.as_bytes()))
        } else {
            self.call_sync(capability, input.as_bytes())
        };
        match result {
            Ok(output) => {
                let id = String::from_utf8_lossy(&output).trim().to_string();
                (!id.is_empty()).then_some(id)
            }
            Err(e) => {
                warn!(plugin = %self.plugin, platform = %self.name, error = %e, "matcher failed");
                None
            }
        }
    }

    /// Runs a data operation on the blocking pool and decodes its JSON output.
    async fn call_json<T>(&self, capability: Capability, input: Vec<u8>) -> Result<T, TunebotError>
    where
        T: DeserializeOwned,
    {
        if !self.capabilities.contains(&capability) {
            return Err(self.unsupported(capability));
        }
        let sandbox = Arc::clone(&self.sandbox);
        let plugin = self.plugin.clone();
        let platform = self.name.clone();
        let output = tokio::task::spawn_blocking(move || {
            call_sandbox(&sandbox, &plugin, &platform, capability, &input)
        })
        .await
        .map_err(|e| TunebotError::Internal(format!("plugin task failed: {e}")))??;

        serde_json::from_slice(&output).map_err(|e| TunebotError::Evaluation {
            plugin: self.plugin.clone(),
            message: format!(
                "`{}` returned invalid JSON for {}: {e}",
                capability_export(capability),
                self.name
            ),
            source: Some(Box::new(e)),
        })
    }
}

fn call_sandbox(
    sandbox: &Mutex<PluginSandbox>,
    plugin: &str,
    platform: &str,
    capability: Capability,
    input: &[u8],
) -> Result<Vec<u8>, TunebotError> {
    let mut guard = sandbox
        .lock()
        .map_err(|_| TunebotError::evaluation(plugin, "sandbox lock poisoned"))?;
    guard.call(capability_export(capability), platform, input)
}

#[async_trait]
impl Platform for ScriptedPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities.clone()
    }

    fn match_text(&self, text: &str) -> Option<String> {
        self.run_matcher(Capability::MatchText, text)
    }

    fn match_url(&self, url: &str) -> Option<String> {
        self.run_matcher(Capability::MatchUrl, url)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, TunebotError> {
        let input = json!({ "query": query, "limit": limit }).to_string().into_bytes();
        self.call_json(Capability::Search, input).await
    }

    async fn lyrics(&self, track_id: &str) -> Result<Lyrics, TunebotError> {
        self.call_json(Capability::FetchLyrics, track_id.as_bytes().to_vec())
            .await
    }

    async fn track(&self, track_id: &str) -> Result<Track, TunebotError> {
        self.call_json(Capability::FetchTrack, track_id.as_bytes().to_vec())
            .await
    }

    async fn tags(&self, track_id: &str) -> Result<TrackTags, TunebotError> {
        self.call_json(Capability::ProvidesTags, track_id.as_bytes().to_vec())
            .await
    }
}

impl std::fmt::Debug for ScriptedPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedPlatform")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
