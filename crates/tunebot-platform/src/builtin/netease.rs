// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! NetEase Cloud Music matchers.

use std::sync::LazyLock;

use regex::Regex;
use tunebot_core::{Capability, CapabilitySet, Platform};

use super::{is_numeric_id, match_embedded_url, parse_platform_prefix};

pub(super) const ALIASES: &[&str] = &["163", "ncm", "wy"];

const PREFIXES: &[&str] = &["netease", "163", "ncm", "wy"];

/// Song pages on music.163.com, desktop and mobile, including the `#/` SPA
/// form. `163cn.tv` short links need a redirect lookup and are not matched.
static SONG_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:(?:www|y)\.)?music\.163\.com/(?:#/)?(?:m/)?song(?:\?(?:[^#]*&)?id=(\d+)|/(\d+))",
    )
    .unwrap()
});

/// Matches NetEase song references.
pub struct NeteasePlatform;

impl Platform for NeteasePlatform {
    fn name(&self) -> &str {
        "netease"
    }

    fn display_name(&self) -> &str {
        "NetEase Cloud Music"
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
            if is_numeric_id(value) {
                return Some(value.to_string());
            }
        }
        if let Some(id) = match_embedded_url(text, |url| self.match_url(url)) {
            return Some(id);
        }
        (is_numeric_id(text) && text.len() >= 5).then(|| text.to_string())
    }

    fn match_url(&self, url: &str) -> Option<String> {
        let caps = SONG_URL.captures(url.trim())?;
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }
}
