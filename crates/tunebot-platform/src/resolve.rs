// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Input resolution policy: which track does a message refer to?
//!
//! Precedence, first hit wins:
//!
//! 1. Command arguments of exactly the form `<platform> <id> <quality>`,
//!    where `quality` parses and `platform` names an enabled platform
//!    (alias or canonical name). Anything else falls through.
//! 2. The first URL in the message, through [`PlatformRegistry::match_url`].
//! 3. The text through [`PlatformRegistry::match_text`]; for commands only
//!    the arguments are matched.
//!
//! A trailing quality token is reported alongside the match in every case.
//! Chat messages go through [`resolve_message`], which first checks the
//! chat's auto link detection setting.
//!
//! Recognition results take the same path through [`route_recognition`].

use tracing::debug;
use tunebot_core::{MessageContext, RecognitionSession, SettingsStore, TrackMatch};

use crate::extract::{command_arguments, extract_quality_override, is_command};
use crate::policy::auto_link_detect_enabled;
use crate::quality::Quality;
use crate::registry::PlatformRegistry;

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Command,
    Url,
    Text,
}

/// A resolved track reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub track: TrackMatch,
    pub quality: Option<Quality>,
    pub source: ResolutionSource,
}

/// Resolves the track a message refers to.
pub fn resolve_track(registry: &PlatformRegistry, text: &str) -> Option<Resolution> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let command = is_command(text);
    let args = if command { command_arguments(text) } else { "" };

    if command {
        if let Some(resolution) = resolve_command_args(registry, args) {
            return Some(resolution);
        }
    }

    let quality = extract_quality_override(text);

    if let Some(track) = registry.match_url(text) {
        return Some(Resolution {
            track,
            quality,
            source: ResolutionSource::Url,
        });
    }

    let match_input = if command { args } else { text };
    registry.match_text(match_input).map(|track| Resolution {
        track,
        quality,
        source: ResolutionSource::Text,
    })
}

/// Resolves a chat message unless auto link detection is off for its chat.
///
/// Commands always resolve.
pub async fn resolve_message(
    registry: &PlatformRegistry,
    settings: &dyn SettingsStore,
    message: &MessageContext,
) -> Option<Resolution> {
    if !auto_link_detect_enabled(settings, message).await {
        debug!(chat_id = message.chat_id, "auto link detection disabled, message ignored");
        return None;
    }
    resolve_track(registry, &message.text)
}

/// Routes a recognition result through the registry like user input.
///
/// The session URL goes through the URL matchers first; otherwise the
/// session's platform must name an enabled handle.
pub fn route_recognition(registry: &PlatformRegistry, session: &RecognitionSession) -> Option<TrackMatch> {
    if let Some(track) = registry.match_url(&session.url) {
        return Some(track);
    }
    let handle = registry.get(&session.platform)?;
    if !handle.is_enabled() || session.track_id.is_empty() {
        return None;
    }
    Some(TrackMatch::new(handle.name(), session.track_id.as_str()))
}

fn resolve_command_args(registry: &PlatformRegistry, args: &str) -> Option<Resolution> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let [platform, track_id, quality] = tokens.as_slice() else {
        return None;
    };
    let quality = Quality::parse(quality)?;
    let handle = registry.lookup(platform)?;
    if !handle.is_enabled() {
        return None;
    }
    Some(Resolution {
        track: TrackMatch::new(handle.name(), *track_id),
        quality: Some(quality),
        source: ResolutionSource::Command,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tunebot_core::{ChatKind, GroupSettings, TunebotError, UserSettings};

    use super::*;
    use crate::builtin::register_builtins;

    fn registry() -> PlatformRegistry {
        let reg = PlatformRegistry::new();
        register_builtins(&reg, &["netease".to_string(), "qqmusic".to_string()])
            .expect("builtins register");
        reg
    }

    #[test]
    fn command_with_quality_resolves_through_alias() {
        let reg = registry();
        let r = resolve_track(&reg, "/music 163 12345 hires").unwrap();
        assert_eq!(r.track, TrackMatch::new("netease", "12345"));
        assert_eq!(r.quality, Some(Quality::HiRes));
        assert_eq!(r.source, ResolutionSource::Command);
    }

    #[test]
    fn command_with_invalid_quality_falls_through() {
        let reg = registry();
        assert_eq!(resolve_track(&reg, "/music netease 12345 invalid"), None);
        assert_eq!(resolve_track(&reg, "/music netease 12345"), None);
    }

    #[test]
    fn unknown_command_platform_falls_through() {
        let reg = registry();
        assert_eq!(resolve_track(&reg, "/music spotify abc123 standard"), None);
    }

    #[test]
    fn url_outranks_text() {
        let reg = registry();
        let r = resolve_track(&reg, "/music https://y.qq.com/n/ryqq/songDetail/0039MnYb0qxYhV").unwrap();
        assert_eq!(r.track, TrackMatch::new("qqmusic", "0039MnYb0qxYhV"));
        assert_eq!(r.source, ResolutionSource::Url);
    }

    #[test]
    fn command_args_go_through_text_matchers() {
        let reg = registry();
        let r = resolve_track(&reg, "/music qq:0039MnYb0qxYhV").unwrap();
        assert_eq!(r.track, TrackMatch::new("qqmusic", "0039MnYb0qxYhV"));
        assert_eq!(r.source, ResolutionSource::Text);
    }

    fn session(platform: &str, track_id: &str, url: &str) -> RecognitionSession {
        RecognitionSession {
            platform: platform.to_string(),
            track_id: track_id.to_string(),
            url: url.to_string(),
            title: None,
            artists: vec![],
            album: None,
        }
    }

    #[test]
    fn recognition_routes_through_url_matchers() {
        let reg = registry();
        let s = session("netease", "12345", "https://music.163.com/song/12345");
        assert_eq!(route_recognition(&reg, &s), Some(TrackMatch::new("netease", "12345")));
    }

    #[test]
    fn recognition_falls_back_to_platform_lookup() {
        let reg = registry();
        let s = session("NetEase", "777", "https://example.com/unknown");
        assert_eq!(route_recognition(&reg, &s), Some(TrackMatch::new("netease", "777")));
        let s = session("spotify", "777", "https://example.com/unknown");
        assert_eq!(route_recognition(&reg, &s), None);
    }

    #[test]
    fn plain_text_with_quality() {
        let reg = registry();
        let r = resolve_track(&reg, "netease:12345").unwrap();
        assert_eq!(r.track, TrackMatch::new("netease", "12345"));
        assert_eq!(r.quality, None);
        assert_eq!(resolve_track(&reg, ""), None);
        assert_eq!(resolve_track(&reg, "unknown"), None);
    }

    /// Group settings only; users have no records.
    struct GroupStore(HashMap<i64, bool>);

    #[async_trait]
    impl SettingsStore for GroupStore {
        async fn user_settings(&self, _user_id: i64) -> Result<Option<UserSettings>, TunebotError> {
            Ok(None)
        }

        async fn group_settings(&self, chat_id: i64) -> Result<Option<GroupSettings>, TunebotError> {
            Ok(self.0.get(&chat_id).map(|&auto_link_detect| GroupSettings {
                chat_id,
                default_platform: None,
                auto_link_detect,
            }))
        }
    }

    fn group_message(chat_id: i64, text: &str, is_command: bool) -> MessageContext {
        MessageContext {
            chat_id,
            chat_kind: ChatKind::Group,
            user_id: Some(7),
            text: text.to_string(),
            is_command,
        }
    }

    #[tokio::test]
    async fn messages_respect_auto_link_detection() {
        let reg = registry();
        let store = GroupStore(HashMap::from([(-100, false), (-200, true)]));
        let link = "listen https://music.163.com/song?id=12345";

        assert_eq!(resolve_message(&reg, &store, &group_message(-100, link, false)).await, None);

        let on = resolve_message(&reg, &store, &group_message(-200, link, false)).await.unwrap();
        assert_eq!(on.track, TrackMatch::new("netease", "12345"));
        assert_eq!(on.source, ResolutionSource::Url);

        let unknown_chat = resolve_message(&reg, &store, &group_message(-300, link, false)).await;
        assert!(unknown_chat.is_some());
    }

    #[tokio::test]
    async fn commands_resolve_even_when_detection_is_off() {
        let reg = registry();
        let store = GroupStore(HashMap::from([(-100, false)]));
        let message = group_message(-100, "/music 163 12345 lossless", true);
        let r = resolve_message(&reg, &store, &message).await.unwrap();
        assert_eq!(r.track, TrackMatch::new("netease", "12345"));
        assert_eq!(r.source, ResolutionSource::Command);
    }
}
