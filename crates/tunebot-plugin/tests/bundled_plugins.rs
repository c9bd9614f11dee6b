// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loads the plugins shipped under `plugins/scripts`.

mod common;

use std::path::PathBuf;

use common::{enabled, runtime};
use tunebot_core::TrackMatch;

fn script_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../plugins/scripts")
}

#[tokio::test]
async fn bandcamp_plugin_matches_prefixes_and_links() {
    let (registry, runtime) = runtime(&script_dir());

    let report = runtime.load(&enabled(&["bandcamp"])).await;

    assert!(report.is_clean(), "{report}");
    assert_eq!(registry.resolve_alias("bc").as_deref(), Some("bandcamp"));
    assert_eq!(
        registry.match_text("bc:someartist/first-light"),
        Some(TrackMatch::new("bandcamp", "someartist/first-light"))
    );
    assert_eq!(
        registry.match_text("bandcamp:someartist/first-light"),
        Some(TrackMatch::new("bandcamp", "someartist/first-light"))
    );
    assert_eq!(
        registry.match_url("check https://someartist.bandcamp.com/track/first-light?from=embed out"),
        Some(TrackMatch::new("bandcamp", "someartist/first-light"))
    );
    assert_eq!(registry.match_url("https://bandcamp.com/discover"), None);
    assert_eq!(registry.match_text("bandcamp:"), None);
}
