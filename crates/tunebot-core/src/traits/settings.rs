// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user and per-group settings lookup.

use async_trait::async_trait;

use crate::error::TunebotError;
use crate::types::{GroupSettings, UserSettings};

/// Read access to persisted chat preferences.
///
/// `Ok(None)` means no record exists; callers apply defaults.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn user_settings(&self, user_id: i64) -> Result<Option<UserSettings>, TunebotError>;

    async fn group_settings(&self, chat_id: i64) -> Result<Option<GroupSettings>, TunebotError>;
}
