// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tunebot music bot.

use std::time::Duration;

use thiserror::Error;

use crate::types::Capability;

/// The primary error type used across the platform registry, plugin runtime,
/// and recognition supervisor.
#[derive(Debug, Error)]
pub enum TunebotError {
    /// Configuration errors (invalid TOML, missing plugin settings, bad paths).
    #[error("configuration error: {0}")]
    Config(String),

    /// A required resource does not exist (plugin files, declared platforms, handles).
    #[error("not found: {0}")]
    NotFound(String),

    /// A script plugin failed to compile, instantiate, or run.
    #[error("plugin {plugin} failed: {message}")]
    Evaluation {
        plugin: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network or process failure talking to an external service.
    ///
    /// `status` carries the HTTP status when the service answered at all,
    /// which separates "service error" from "could not reach the service".
    #[error("transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request was well-formed and answered, but produced nothing usable.
    #[error("no result: {0}")]
    EmptyResult(String),

    /// An operation or caller deadline elapsed.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// An operation was invoked from an invalid lifecycle state.
    #[error("invalid state: {0}")]
    State(String),

    /// Registering a platform name or alias would make resolution ambiguous.
    #[error("platform conflict: {0}")]
    Conflict(String),

    /// The platform does not provide the requested capability.
    #[error("platform {platform} does not support {capability}")]
    Unsupported {
        platform: String,
        capability: Capability,
    },

    /// The platform exists but its provider has been disabled.
    #[error("platform {0} is unavailable")]
    Unavailable(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers to choose user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The feature was never started, never loaded, or has been disabled.
    Unavailable,
    /// A transient failure; the caller may retry.
    Failed,
    /// A valid request with an empty answer.
    NoResult,
    /// The input, configuration, or registration was rejected.
    Rejected,
}

impl TunebotError {
    /// Shorthand for an [`TunebotError::Evaluation`] without a source.
    pub fn evaluation(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        TunebotError::Evaluation {
            plugin: plugin.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`TunebotError::Transport`] without a status or source.
    pub fn transport(message: impl Into<String>) -> Self {
        TunebotError::Transport {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Returns the failure class of this error.
    pub fn class(&self) -> FailureClass {
        match self {
            TunebotError::NotFound(_)
            | TunebotError::State(_)
            | TunebotError::Unavailable(_)
            | TunebotError::Unsupported { .. } => FailureClass::Unavailable,
            TunebotError::Transport { .. }
            | TunebotError::Timeout { .. }
            | TunebotError::Evaluation { .. }
            | TunebotError::Internal(_) => FailureClass::Failed,
            TunebotError::EmptyResult(_) => FailureClass::NoResult,
            TunebotError::Config(_) | TunebotError::Conflict(_) => FailureClass::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_separate_unavailable_failed_and_empty() {
        assert_eq!(
            TunebotError::State("not started".into()).class(),
            FailureClass::Unavailable
        );
        assert_eq!(
            TunebotError::transport("connection refused").class(),
            FailureClass::Failed
        );
        assert_eq!(
            TunebotError::EmptyResult("nothing recognized".into()).class(),
            FailureClass::NoResult
        );
        assert_eq!(
            TunebotError::Conflict("netease".into()).class(),
            FailureClass::Rejected
        );
    }

    #[test]
    fn unsupported_renders_capability() {
        let err = TunebotError::Unsupported {
            platform: "netease".into(),
            capability: Capability::FetchLyrics,
        };
        assert_eq!(err.to_string(), "platform netease does not support fetch_lyrics");
    }

    #[test]
    fn timeout_renders_operation() {
        let err = TunebotError::Timeout {
            operation: "recognition startup".into(),
            duration: Duration::from_secs(10),
        };
        assert!(err.to_string().starts_with("recognition startup timed out"));
    }
}
