// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Providers implement [`Platform`]; the bot front end supplies
//! [`SettingsStore`] and [`ReloadSink`].

pub mod platform;
pub mod settings;
pub mod sink;

pub use platform::Platform;
pub use settings::SettingsStore;
pub use sink::ReloadSink;
