// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform registry: names, aliases, and first-match dispatch.
//!
//! The `PlatformRegistry` keeps handles in registration order. Every write
//! (register, update, disable, alias change) holds the write lock for the
//! whole validation and mutation. Matchers take a short read lock to copy an
//! ordered snapshot and run provider code without holding it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tunebot_core::{Capability, TrackMatch, TunebotError};

use crate::extract::extract_first_url;
use crate::handle::{Origin, PlatformHandle, Registration};

/// Normalizes names and aliases for storage and lookup.
pub fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

#[derive(Default)]
struct RegistryState {
    /// Handles in sequence order.
    handles: Vec<Arc<PlatformHandle>>,
    /// Canonical name -> index into `handles`.
    by_name: HashMap<String, usize>,
    /// Normalized alias -> canonical name.
    aliases: HashMap<String, String>,
    next_seq: u64,
}

impl RegistryState {
    /// Validates and normalizes `aliases` for the platform `name`.
    ///
    /// Entries owned by `name` itself are ignored, so re-registering the same
    /// aliases is never a conflict.
    fn check_aliases(&self, name: &str, aliases: &[String]) -> Result<Vec<String>, TunebotError> {
        if let Some(owner) = self.aliases.get(name) {
            if owner != name {
                return Err(TunebotError::Conflict(format!(
                    "platform name `{name}` is already an alias of `{owner}`"
                )));
            }
        }

        let mut normalized: Vec<String> = Vec::with_capacity(aliases.len());
        for alias in aliases {
            let alias = normalize(alias);
            if alias.is_empty() || normalized.contains(&alias) {
                continue;
            }
            if alias != name && self.by_name.contains_key(&alias) {
                return Err(TunebotError::Conflict(format!(
                    "alias `{alias}` for `{name}` is the name of another platform"
                )));
            }
            if let Some(owner) = self.aliases.get(&alias) {
                if owner != name {
                    return Err(TunebotError::Conflict(format!(
                        "alias `{alias}` for `{name}` is already held by `{owner}`"
                    )));
                }
            }
            normalized.push(alias);
        }
        Ok(normalized)
    }

    fn replace_aliases(&mut self, name: &str, aliases: &[String]) {
        self.aliases.retain(|_, owner| owner != name);
        for alias in aliases {
            self.aliases.insert(alias.clone(), name.to_string());
        }
    }

    fn handle(&self, name: &str) -> Option<&Arc<PlatformHandle>> {
        self.by_name.get(name).map(|&idx| &self.handles[idx])
    }
}

/// Registry of built-in and scripted platform handles.
#[derive(Default)]
pub struct PlatformRegistry {
    state: RwLock<RegistryState>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Writers never panic between validation and mutation, so a poisoned
    // lock still guards consistent state.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new handle.
    ///
    /// A name held by a disabled scripted handle is replaced in place: the
    /// new handle takes over the old sequence number. Any other duplicate
    /// name, or an ambiguous alias, is a `Conflict`.
    pub fn register(&self, registration: Registration) -> Result<Arc<PlatformHandle>, TunebotError> {
        let name = normalize(registration.provider.name());
        if name.is_empty() {
            return Err(TunebotError::Config(
                "platform name must not be empty".to_string(),
            ));
        }

        let mut state = self.write();

        let replace_at = match state.by_name.get(&name) {
            Some(&idx) => {
                let existing = &state.handles[idx];
                if existing.origin().is_script() && !existing.is_enabled() {
                    Some(idx)
                } else {
                    return Err(TunebotError::Conflict(format!(
                        "platform `{name}` is already registered"
                    )));
                }
            }
            None => None,
        };

        let aliases = state.check_aliases(&name, &registration.aliases)?;

        let sequence = match replace_at {
            Some(idx) => state.handles[idx].sequence(),
            None => {
                let seq = state.next_seq;
                state.next_seq += 1;
                seq
            }
        };

        let handle = Arc::new(PlatformHandle::new(
            name.clone(),
            registration.origin,
            sequence,
            registration.provider,
            aliases.clone(),
        ));

        match replace_at {
            Some(idx) => state.handles[idx] = Arc::clone(&handle),
            None => {
                let idx = state.handles.len();
                state.handles.push(Arc::clone(&handle));
                state.by_name.insert(name.clone(), idx);
            }
        }
        state.replace_aliases(&name, &aliases);

        tracing::debug!(platform = %name, sequence, origin = %handle.origin(), "platform registered");
        Ok(handle)
    }

    /// Swaps the provider of an existing scripted handle and enables it.
    ///
    /// Identity and sequence are kept; anyone holding the handle sees the new
    /// provider on their next call.
    pub fn update(&self, name: &str, registration: Registration) -> Result<Arc<PlatformHandle>, TunebotError> {
        let name = normalize(name);
        if normalize(registration.provider.name()) != name {
            return Err(TunebotError::Internal(format!(
                "provider `{}` cannot update platform `{name}`",
                registration.provider.name()
            )));
        }

        let mut state = self.write();
        let handle = state
            .handle(&name)
            .cloned()
            .ok_or_else(|| TunebotError::NotFound(format!("platform `{name}`")))?;
        if !handle.origin().is_script() {
            return Err(TunebotError::Conflict(format!(
                "built-in platform `{name}` cannot be updated"
            )));
        }

        let aliases = state.check_aliases(&name, &registration.aliases)?;
        handle.swap_provider(registration.provider, aliases.clone());
        state.replace_aliases(&name, &aliases);

        tracing::debug!(platform = %name, "platform updated");
        Ok(handle)
    }

    /// Marks a scripted handle disabled. The handle and its aliases stay
    /// registered. Returns `false` when it was already disabled.
    pub fn disable(&self, name: &str) -> Result<bool, TunebotError> {
        let name = normalize(name);
        let state = self.write();
        let handle = state
            .handle(&name)
            .ok_or_else(|| TunebotError::NotFound(format!("platform `{name}`")))?;
        if !handle.origin().is_script() {
            return Err(TunebotError::Conflict(format!(
                "built-in platform `{name}` cannot be disabled"
            )));
        }
        if !handle.is_enabled() {
            return Ok(false);
        }
        handle.set_enabled(false);
        tracing::debug!(platform = %name, "platform disabled");
        Ok(true)
    }

    /// Replaces the alias set of a registered platform.
    pub fn set_aliases(&self, name: &str, aliases: &[String]) -> Result<(), TunebotError> {
        let name = normalize(name);
        let mut state = self.write();
        let handle = state
            .handle(&name)
            .cloned()
            .ok_or_else(|| TunebotError::NotFound(format!("platform `{name}`")))?;
        let aliases = state.check_aliases(&name, aliases)?;
        handle.set_aliases(aliases.clone());
        state.replace_aliases(&name, &aliases);
        Ok(())
    }

    /// Resolves an alias to its canonical name.
    ///
    /// A canonical name resolves to itself only when it was registered as its
    /// own alias.
    pub fn resolve_alias(&self, token: &str) -> Option<String> {
        let token = normalize(token);
        if token.is_empty() {
            return None;
        }
        self.read().aliases.get(&token).cloned()
    }

    /// Looks up a handle by canonical name.
    pub fn get(&self, name: &str) -> Option<Arc<PlatformHandle>> {
        self.read().handle(&normalize(name)).cloned()
    }

    /// Resolves a user-supplied token as an alias first, then as a name.
    pub fn lookup(&self, token: &str) -> Option<Arc<PlatformHandle>> {
        match self.resolve_alias(token) {
            Some(name) => self.get(&name),
            None => self.get(token),
        }
    }

    /// First text match among enabled handles, in sequence order.
    pub fn match_text(&self, text: &str) -> Option<TrackMatch> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.first_match(Capability::MatchText, |provider| provider.match_text(text))
    }

    /// First URL match for the first well-formed URL embedded in `text`.
    pub fn match_url(&self, text: &str) -> Option<TrackMatch> {
        let url = extract_first_url(text)?;
        self.first_match(Capability::MatchUrl, |provider| provider.match_url(&url))
    }

    fn first_match<F>(&self, capability: Capability, matcher: F) -> Option<TrackMatch>
    where
        F: Fn(&dyn tunebot_core::Platform) -> Option<String>,
    {
        for handle in self.snapshot() {
            let state = handle.state();
            if !state.enabled || !state.supports(capability) {
                continue;
            }
            if let Some(track_id) = matcher(state.provider.as_ref()) {
                if !track_id.is_empty() {
                    return Some(TrackMatch::new(handle.name(), track_id));
                }
            }
        }
        None
    }

    fn snapshot(&self) -> Vec<Arc<PlatformHandle>> {
        self.read().handles.clone()
    }

    /// All handles in sequence order, including disabled ones.
    pub fn list(&self) -> Vec<Arc<PlatformHandle>> {
        self.snapshot()
    }

    /// Names of enabled handles in sequence order.
    pub fn enabled_names(&self) -> Vec<String> {
        self.read()
            .handles
            .iter()
            .filter(|h| h.is_enabled())
            .map(|h| h.name().to_string())
            .collect()
    }

    /// Returns true when `name` is held by a built-in handle.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|h| *h.origin() == Origin::Builtin)
    }

    pub fn len(&self) -> usize {
        self.read().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().handles.is_empty()
    }
}
