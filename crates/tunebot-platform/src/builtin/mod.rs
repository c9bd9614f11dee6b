// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in platform catalog.
//!
//! Built-in providers contribute matchers only; their API clients live
//! outside this crate. Registration order is match order, so `netease`
//! (listed first by default) wins bare numeric IDs.

mod netease;
mod qqmusic;

use std::sync::Arc;

use tunebot_core::{Platform, TunebotError};

use crate::extract::extract_first_url;
use crate::handle::{PlatformHandle, Registration};
use crate::registry::{PlatformRegistry, normalize};

pub use netease::NeteasePlatform;
pub use qqmusic::QqMusicPlatform;

/// Names of every built-in platform, in default match order.
pub const BUILTIN_NAMES: &[&str] = &["netease", "qqmusic"];

/// Returns true when `name` is a built-in platform name.
pub fn is_builtin_name(name: &str) -> bool {
    BUILTIN_NAMES.contains(&normalize(name).as_str())
}

/// Returns the registration for one built-in platform.
pub fn builtin_registration(name: &str) -> Option<Registration> {
    match normalize(name).as_str() {
        "netease" => Some(Registration::builtin(
            Arc::new(NeteasePlatform) as Arc<dyn Platform>,
            netease::ALIASES,
        )),
        "qqmusic" => Some(Registration::builtin(
            Arc::new(QqMusicPlatform) as Arc<dyn Platform>,
            qqmusic::ALIASES,
        )),
        _ => None,
    }
}

/// Registers the named built-ins in the given order.
pub fn register_builtins(
    registry: &PlatformRegistry,
    names: &[String],
) -> Result<Vec<Arc<PlatformHandle>>, TunebotError> {
    let mut handles = Vec::with_capacity(names.len());
    for name in names {
        let registration = builtin_registration(name)
            .ok_or_else(|| TunebotError::Config(format!("unknown built-in platform `{name}`")))?;
        handles.push(registry.register(registration)?);
    }
    tracing::info!(count = handles.len(), "built-in platforms registered");
    Ok(handles)
}

/// Splits `prefix:value` text when `prefix` is one of `accepted`.
fn parse_platform_prefix<'a>(text: &'a str, accepted: &[&str]) -> Option<&'a str> {
    let (prefix, value) = text.split_once(':')?;
    let prefix = prefix.trim().to_lowercase();
    let value = value.trim();
    if value.is_empty() || !accepted.contains(&prefix.as_str()) {
        return None;
    }
    Some(value)
}

fn is_numeric_id(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Runs `url_matcher` over the first URL embedded in `text`.
fn match_embedded_url(text: &str, url_matcher: impl Fn(&str) -> Option<String>) -> Option<String> {
    extract_first_url(text).and_then(|url| url_matcher(&url))
}
