// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tunebot music bot.
//!
//! This crate provides the error taxonomy, shared value types, and the
//! collaborator traits used throughout the Tunebot workspace. Every platform
//! provider, built-in or scripted, implements [`Platform`].

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{FailureClass, TunebotError};
pub use types::{
    Capability, CapabilitySet, ChatKind, GroupSettings, HealthStatus, Lyrics, MessageContext,
    RecognitionSession, ReloadReport, Track, TrackMatch, TrackTags, UserSettings,
};

pub use traits::{Platform, ReloadSink, SettingsStore};
