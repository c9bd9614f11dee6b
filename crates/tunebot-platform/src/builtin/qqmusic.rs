// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! QQ Music matchers.

use std::sync::LazyLock;

use regex::Regex;
use tunebot_core::{Capability, CapabilitySet, Platform};

use super::{is_numeric_id, match_embedded_url, parse_platform_prefix};

pub(super) const ALIASES: &[&str] = &["qq", "tencent"];

const PREFIXES: &[&str] = &["qqmusic", "qq", "tencent"];

static SONG_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:[a-z0-9]+\.)?y\.qq\.com/(?:n/ryqq/songDetail/([A-Za-z0-9]+)|n/yqq/song/([A-Za-z0-9]+)\.html|[^#]*?[?&]songmid=([A-Za-z0-9]+))",
    )
    .unwrap()
});

/// Matches QQ Music song references (songmid or numeric song id).
pub struct QqMusicPlatform;

impl Platform for QqMusicPlatform {
    fn name(&self) -> &str {
        "qqmusic"
    }

    fn display_name(&self) -> &str {
        "QQ Music"
    }

    fn capabilities(&self) -> CapabilitySet {
        [Capability::MatchText, Capability::MatchUrl]
            .into_iter()
            .collect()
    }

    fn match_text(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(value) = parse_platform_prefix(text, PREFIXES) {
            if is_song_mid(value) || is_numeric_id(value) {
                return Some(value.to_string());
            }
        }
        if let Some(id) = match_embedded_url(text, |url| self.match_url(url)) {
            return Some(id);
        }
        if is_song_mid(text) {
            return Some(text.to_string());
        }
        (is_numeric_id(text) && text.len() >= 5).then(|| text.to_string())
    }

    fn match_url(&self, url: &str) -> Option<String> {
        let caps = SONG_URL.captures(url.trim())?;
        (1..=3)
            .find_map(|i| caps.get(i))
            .map(|m| m.as_str().to_string())
    }
}

/// A songmid is 8 to 20 ASCII alphanumerics with at least one letter and
/// one digit.
fn is_song_mid(text: &str) -> bool {
    if !(8..=20).contains(&text.len()) || !text.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return false;
    }
    text.bytes().any(|b| b.is_ascii_alphabetic()) && text.bytes().any(|b| b.is_ascii_digit())
}
