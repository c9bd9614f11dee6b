// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the registry, plugin runtime, and recognizer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A named operation a platform provider may implement.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Recognizes track references in free text (`netease:123`, bare IDs).
    MatchText,
    /// Recognizes track URLs.
    MatchUrl,
    Search,
    FetchLyrics,
    FetchTrack,
    ProvidesTags,
}

/// The set of capabilities a provider declares.
pub type CapabilitySet = BTreeSet<Capability>;

/// A resolved `(platform, track id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackMatch {
    pub platform: String,
    pub track_id: String,
}

impl TrackMatch {
    pub fn new(platform: impl Into<String>, track_id: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            track_id: track_id.into(),
        }
    }
}

/// Track metadata returned by search and lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Lyrics for one track, optionally with a translation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lyrics {
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
}

/// Tag metadata a provider supplies for audio files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackTags {
    pub title: String,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub album_artist: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// Result of one audio recognition request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionSession {
    pub platform: String,
    pub track_id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<String>,
    #[serde(default)]
    pub album: Option<String>,
}

impl RecognitionSession {
    /// The `(platform, track id)` pair for the registry lookup path.
    pub fn track_match(&self) -> TrackMatch {
        TrackMatch::new(&self.platform, &self.track_id)
    }
}

/// Health status reported by supervised services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Outcome of one plugin reload pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReloadReport {
    /// Platforms registered or updated in this pass, in registration order.
    pub loaded: Vec<String>,
    /// Platforms disabled because no plugin reported them.
    pub disabled: Vec<String>,
    /// Plugins skipped without loading (built-in name or `enabled = false`).
    pub skipped: Vec<String>,
    /// Plugins whose load failed, with the error message.
    pub failed: Vec<(String, String)>,
    /// Registry conflicts raised while registering declared platforms.
    pub conflicts: Vec<String>,
}

impl ReloadReport {
    /// Returns true when every configured plugin loaded without conflicts.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.conflicts.is_empty()
    }
}

impl std::fmt::Display for ReloadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} loaded, {} disabled, {} skipped, {} failed, {} conflicts",
            self.loaded.len(),
            self.disabled.len(),
            self.skipped.len(),
            self.failed.len(),
            self.conflicts.len()
        )
    }
}

/// Kind of chat an inbound message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

/// Minimal description of an inbound message for input policies.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub chat_id: i64,
    pub chat_kind: ChatKind,
    pub user_id: Option<i64>,
    pub text: String,
    /// True when the transport flagged the message as a bot command.
    pub is_command: bool,
}

/// Per-user preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub user_id: i64,
    pub default_platform: Option<String>,
    pub auto_link_detect: bool,
}

/// Per-group preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSettings {
    pub chat_id: i64,
    pub default_platform: Option<String>,
    pub auto_link_detect: bool,
}
