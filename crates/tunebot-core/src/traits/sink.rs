// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of plugin reload outcomes.

use async_trait::async_trait;

use crate::error::TunebotError;
use crate::types::ReloadReport;

/// Receives the outcome of every reload pass, successful or not.
#[async_trait]
pub trait ReloadSink: Send + Sync {
    async fn deliver(&self, outcome: Result<&ReloadReport, &TunebotError>);
}
