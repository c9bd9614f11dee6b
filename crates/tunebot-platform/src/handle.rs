// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform handles: stable identity records for one provider.
//!
//! A handle's identity (`name`, `origin`, `sequence`) never changes. Its
//! mutable part lives in a single [`HandleState`] snapshot behind an
//! [`ArcSwap`], so a reload swaps provider, capabilities, aliases, and the
//! enabled flag in one atomic store. Holders of an `Arc<PlatformHandle>`
//! keep a valid reference across reloads and see "unavailable" once the
//! platform is disabled.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tunebot_core::{
    Capability, CapabilitySet, Lyrics, Platform, Track, TrackTags, TunebotError,
};

use crate::lyrics::normalize_lrc_timestamps;

/// Where a handle's provider comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Compiled into the binary; never mutated after registration.
    Builtin,
    /// Supplied by a script plugin package.
    Script { plugin: String },
}

impl Origin {
    pub fn is_script(&self) -> bool {
        matches!(self, Origin::Script { .. })
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Builtin => write!(f, "builtin"),
            Origin::Script { plugin } => write!(f, "plugin:{plugin}"),
        }
    }
}

/// Everything a registry needs to create or update a handle.
#[derive(Clone)]
pub struct Registration {
    pub provider: Arc<dyn Platform>,
    pub aliases: Vec<String>,
    pub origin: Origin,
}

impl Registration {
    pub fn builtin(provider: Arc<dyn Platform>, aliases: &[&str]) -> Self {
        Self {
            provider,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            origin: Origin::Builtin,
        }
    }

    pub fn script(
        provider: Arc<dyn Platform>,
        aliases: Vec<String>,
        plugin: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            aliases,
            origin: Origin::Script {
                plugin: plugin.into(),
            },
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("provider", &self.provider.name())
            .field("aliases", &self.aliases)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Immutable snapshot of a handle's mutable part.
pub struct HandleState {
    pub provider: Arc<dyn Platform>,
    pub capabilities: CapabilitySet,
    /// Normalized aliases, in registration order.
    pub aliases: Vec<String>,
    pub enabled: bool,
}

impl HandleState {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// The registry's identity record for one platform provider.
pub struct PlatformHandle {
    name: String,
    origin: Origin,
    sequence: u64,
    state: ArcSwap<HandleState>,
}

impl PlatformHandle {
    pub(crate) fn new(
        name: String,
        origin: Origin,
        sequence: u64,
        provider: Arc<dyn Platform>,
        aliases: Vec<String>,
    ) -> Self {
        let capabilities = provider.capabilities();
        Self {
            name,
            origin,
            sequence,
            state: ArcSwap::from_pointee(HandleState {
                provider,
                capabilities,
                aliases,
                enabled: true,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Registration sequence number; defines match order.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Loads the current state snapshot.
    pub fn state(&self) -> Arc<HandleState> {
        self.state.load_full()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.load().enabled
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.state.load().capabilities.clone()
    }

    pub fn aliases(&self) -> Vec<String> {
        self.state.load().aliases.clone()
    }

    pub fn display_name(&self) -> String {
        self.state.load().provider.display_name().to_string()
    }

    /// Returns the live provider, or `Unavailable` when disabled.
    pub fn provider(&self) -> Result<Arc<dyn Platform>, TunebotError> {
        let state = self.state.load();
        if !state.enabled {
            return Err(TunebotError::Unavailable(self.name.clone()));
        }
        Ok(Arc::clone(&state.provider))
    }

    /// Returns the provider when it is enabled and declares `capability`.
    pub fn provider_for(&self, capability: Capability) -> Result<Arc<dyn Platform>, TunebotError> {
        let state = self.state.load();
        if !state.enabled {
            return Err(TunebotError::Unavailable(self.name.clone()));
        }
        if !state.supports(capability) {
            return Err(TunebotError::Unsupported {
                platform: self.name.clone(),
                capability,
            });
        }
        Ok(Arc::clone(&state.provider))
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, TunebotError> {
        self.provider_for(Capability::Search)?
            .search(query, limit)
            .await
    }

    /// Fetches lyrics with every LRC timestamp rewritten to `[mm:ss.xx]`.
    pub async fn lyrics(&self, track_id: &str) -> Result<Lyrics, TunebotError> {
        let lyrics = self
            .provider_for(Capability::FetchLyrics)?
            .lyrics(track_id)
            .await?;
        Ok(Lyrics {
            text: normalize_lrc_timestamps(&lyrics.text),
            translation: lyrics.translation.as_deref().map(normalize_lrc_timestamps),
        })
    }

    pub async fn track(&self, track_id: &str) -> Result<Track, TunebotError> {
        self.provider_for(Capability::FetchTrack)?
            .track(track_id)
            .await
    }

    pub async fn tags(&self, track_id: &str) -> Result<TrackTags, TunebotError> {
        self.provider_for(Capability::ProvidesTags)?
            .tags(track_id)
            .await
    }

    pub(crate) fn swap_provider(&self, provider: Arc<dyn Platform>, aliases: Vec<String>) {
        let capabilities = provider.capabilities();
        self.state.store(Arc::new(HandleState {
            provider,
            capabilities,
            aliases,
            enabled: true,
        }));
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.state.rcu(|current| HandleState {
            provider: Arc::clone(&current.provider),
            capabilities: current.capabilities.clone(),
            aliases: current.aliases.clone(),
            enabled,
        });
    }

    pub(crate) fn set_aliases(&self, aliases: Vec<String>) {
        self.state.rcu(|current| HandleState {
            provider: Arc::clone(&current.provider),
            capabilities: current.capabilities.clone(),
            aliases: aliases.clone(),
            enabled: current.enabled,
        });
    }
}

impl fmt::Debug for PlatformHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("PlatformHandle")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("sequence", &self.sequence)
            .field("aliases", &state.aliases)
            .field("enabled", &state.enabled)
            .finish()
    }
}
