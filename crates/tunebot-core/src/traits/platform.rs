// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform provider trait.

use async_trait::async_trait;

use crate::error::TunebotError;
use crate::types::{Capability, CapabilitySet, Lyrics, Track, TrackTags};

/// One retrievable source of tracks.
///
/// Matchers are synchronous and must be cheap: the registry calls them for
/// every inbound message, usually from an async task. A matcher that can run
/// for long must move itself off the async worker, the way scripted
/// platforms use `tokio::task::block_in_place`. Data operations default to
/// [`TunebotError::Unsupported`] so providers only implement what they
/// declare in [`Platform::capabilities`].
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// Canonical, lowercase platform name.
    fn name(&self) -> &str;

    /// Human-readable name for user-facing output.
    fn display_name(&self) -> &str {
        self.name()
    }

    fn capabilities(&self) -> CapabilitySet;

    /// Returns the track id referenced by `text`, if this platform recognizes it.
    fn match_text(&self, _text: &str) -> Option<String> {
        None
    }

    /// Returns the track id referenced by `url`, if this platform recognizes it.
    fn match_url(&self, _url: &str) -> Option<String> {
        None
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Track>, TunebotError> {
        Err(self.unsupported(Capability::Search))
    }

    async fn lyrics(&self, _track_id: &str) -> Result<Lyrics, TunebotError> {
        Err(self.unsupported(Capability::FetchLyrics))
    }

    async fn track(&self, _track_id: &str) -> Result<Track, TunebotError> {
        Err(self.unsupported(Capability::FetchTrack))
    }

    async fn tags(&self, _track_id: &str) -> Result<TrackTags, TunebotError> {
        Err(self.unsupported(Capability::ProvidesTags))
    }

    /// Builds the error returned for a capability this provider lacks.
    fn unsupported(&self, capability: Capability) -> TunebotError {
        TunebotError::Unsupported {
            platform: self.name().to_string(),
            capability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MatchOnly;

    impl Platform for MatchOnly {
        fn name(&self) -> &str {
            "matchonly"
        }

        fn capabilities(&self) -> CapabilitySet {
            [Capability::MatchText].into_iter().collect()
        }

        fn match_text(&self, text: &str) -> Option<String> {
            text.strip_prefix("m:").map(str::to_string)
        }
    }

    #[tokio::test]
    async fn undeclared_operations_are_unsupported() {
        let p = MatchOnly;
        let err = p.lyrics("1").await.unwrap_err();
        assert!(matches!(
            err,
            TunebotError::Unsupported {
                capability: Capability::FetchLyrics,
                ..
            }
        ));
        assert!(p.search("q", 5).await.is_err());
    }

    #[test]
    fn display_name_defaults_to_name() {
        assert_eq!(MatchOnly.display_name(), "matchonly");
        assert_eq!(MatchOnly.match_text("m:42").as_deref(), Some("42"));
        assert_eq!(MatchOnly.match_url("https://x"), None);
    }
}
