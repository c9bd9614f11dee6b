// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction helpers for free-form chat input.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::quality::Quality;

/// http(s) URL made of RFC 3986 characters only. Whitespace (including
/// U+00A0) and any non-ASCII character end the match.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[A-Za-z0-9\-._~:/?#\[\]@!$&'()*+,;=%]+").unwrap()
});

const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?'];

/// Returns the first well-formed http(s) URL embedded in `text`.
///
/// Trailing sentence punctuation is stripped before validation; candidates
/// that do not parse as a URL with a host are skipped.
pub fn extract_first_url(text: &str) -> Option<String> {
    URL_PATTERN.find_iter(text).find_map(|m| {
        let candidate = trim_trailing_punctuation(m.as_str());
        let parsed = Url::parse(candidate).ok()?;
        parsed.host_str().filter(|h| !h.is_empty())?;
        Some(candidate.to_string())
    })
}

/// Strips sentence punctuation from the end of a URL candidate. A closing
/// `)` or `]` is kept while it pairs with an opening one inside the URL.
fn trim_trailing_punctuation(candidate: &str) -> &str {
    let mut end = candidate;
    while let Some(last) = end.chars().next_back() {
        let strip = match last {
            ')' => unbalanced(end, '(', ')'),
            ']' => unbalanced(end, '[', ']'),
            c => TRAILING_PUNCTUATION.contains(&c),
        };
        if !strip {
            break;
        }
        end = &end[..end.len() - last.len_utf8()];
    }
    end
}

fn unbalanced(s: &str, open: char, close: char) -> bool {
    s.matches(close).count() > s.matches(open).count()
}

/// Returns true when `text` is a bot command (`/cmd` or `/cmd@bot`).
pub fn is_command(text: &str) -> bool {
    let text = text.trim_start();
    text.len() > 1 && text.starts_with('/')
}

/// Returns the argument part of a bot command, or `""` for non-commands.
///
/// `"/music@tunebot   netease 123"` yields `"netease 123"`.
pub fn command_arguments(text: &str) -> &str {
    if !is_command(text) {
        return "";
    }
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((_, args)) => args.trim(),
        None => "",
    }
}

/// Returns the quality named by the last whitespace-separated token.
///
/// Needs at least two tokens, so a bare `"hires"` or `"/music"` is not an
/// override. Commands are tokenized including the command itself.
pub fn extract_quality_override(text: &str) -> Option<Quality> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    tokens.last().and_then(|last| Quality::parse(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url() {
        assert_eq!(
            extract_first_url("https://music.163.com/song?id=12345").as_deref(),
            Some("https://music.163.com/song?id=12345")
        );
    }

    #[test]
    fn url_with_trailing_punctuation() {
        assert_eq!(
            extract_first_url("看这个 https://music.163.com/song?id=12345).").as_deref(),
            Some("https://music.163.com/song?id=12345")
        );
    }

    #[test]
    fn parenthesized_path_keeps_closing_paren() {
        assert_eq!(
            extract_first_url("see https://en.wikipedia.org/wiki/Foo_(bar).").as_deref(),
            Some("https://en.wikipedia.org/wiki/Foo_(bar)")
        );
        assert_eq!(
            extract_first_url("(see https://en.wikipedia.org/wiki/Foo_(bar))").as_deref(),
            Some("https://en.wikipedia.org/wiki/Foo_(bar)")
        );
        assert_eq!(
            extract_first_url("(see https://x.com/a)").as_deref(),
            Some("https://x.com/a")
        );
        assert_eq!(
            extract_first_url("http://[::1]:8080/x]").as_deref(),
            Some("http://[::1]:8080/x")
        );
    }

    #[test]
    fn url_with_nbsp_and_suffix() {
        let text = "分享三无 Marblue 的单曲《寻味於心》: https://163cn.tv/1fxOH7O\u{00A0}(来自 @网易云音乐)";
        assert_eq!(
            extract_first_url(text).as_deref(),
            Some("https://163cn.tv/1fxOH7O")
        );
    }

    #[test]
    fn url_followed_by_full_width_punctuation() {
        let text = "分享歌曲：https://music.163.com/song?id=12345（来自@网易云音乐）";
        assert_eq!(
            extract_first_url(text).as_deref(),
            Some("https://music.163.com/song?id=12345")
        );
    }

    #[test]
    fn malformed_candidate_is_skipped() {
        assert_eq!(
            extract_first_url("https://[oops then https://y.qq.com/x").as_deref(),
            Some("https://y.qq.com/x")
        );
        assert_eq!(extract_first_url(""), None);
        assert_eq!(extract_first_url("ftp://example.com"), None);
    }

    #[test]
    fn command_arguments_cases() {
        assert_eq!(command_arguments("/music netease 123 hires"), "netease 123 hires");
        assert_eq!(command_arguments("/search test"), "test");
        assert_eq!(command_arguments("/help"), "");
        assert_eq!(command_arguments("just text"), "");
        assert_eq!(command_arguments(""), "");
        assert_eq!(command_arguments("/music   netease 123"), "netease 123");
        assert_eq!(command_arguments("/music@tunebot qq 0039MnYb0qxYhV"), "qq 0039MnYb0qxYhV");
    }

    #[test]
    fn quality_override_cases() {
        let q = |t: &str| extract_quality_override(t).map(|q| q.to_string());
        assert_eq!(q("/music netease 12345 hires").as_deref(), Some("hires"));
        assert_eq!(q("/music netease 12345 lossless").as_deref(), Some("lossless"));
        assert_eq!(q("/music netease 12345 high").as_deref(), Some("high"));
        assert_eq!(q("/music netease 12345 standard").as_deref(), Some("standard"));
        assert_eq!(q("/music netease 12345 invalid"), None);
        assert_eq!(q("/music netease 12345"), None);
        assert_eq!(q("/music"), None);
        assert_eq!(q("netease 12345 hires").as_deref(), Some("hires"));
        assert_eq!(q("周杰伦 high").as_deref(), Some("high"));
        assert_eq!(q("周杰伦 low").as_deref(), Some("standard"));
        assert_eq!(q(""), None);
    }
}
