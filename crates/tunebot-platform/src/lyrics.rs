// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LRC lyric helpers.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static LRC_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d+):(\d+)[.:](\d{1,3})\]").unwrap());

/// Rewrites every LRC timestamp to `[mm:ss.xx]`.
///
/// One fractional digit is tenths, two are hundredths, three are truncated
/// to hundredths. Timestamps whose fields do not fit are left untouched.
pub fn normalize_lrc_timestamps(lyrics: &str) -> String {
    LRC_TIMESTAMP
        .replace_all(lyrics, |caps: &Captures<'_>| {
            normalize_one(caps).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn normalize_one(caps: &Captures<'_>) -> Option<String> {
    let minutes: u32 = caps[1].parse().ok()?;
    let seconds: u32 = caps[2].parse().ok()?;
    let frac = &caps[3];
    let centis: u32 = match frac.len() {
        1 => frac.parse::<u32>().ok()? * 10,
        2 => frac.parse().ok()?,
        _ => frac[..2].parse().ok()?,
    };
    Some(format!("[{minutes:02}:{seconds:02}.{centis:02}]"))
}
