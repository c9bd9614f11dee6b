// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response decoding for `POST /recognize`.

use serde::Deserialize;
use tunebot_core::{RecognitionSession, TunebotError};

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<RecognizeData>,
}

#[derive(Debug, Deserialize)]
struct RecognizeData {
    #[serde(default)]
    result: Vec<RecognizeMatch>,
}

#[derive(Debug, Deserialize)]
struct RecognizeMatch {
    song: Song,
}

#[derive(Debug, Deserialize)]
struct Song {
    id: serde_json::Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    artists: Vec<Named>,
    #[serde(default)]
    album: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: String,
}

/// Canonical song page for a recognized track.
pub fn song_url(track_id: &str) -> String {
    format!("https://music.163.com/song/{track_id}")
}

/// Decodes a 200 response body into a session for `platform`.
///
/// A body that does not parse, or that reports a non-200 `code`, is a
/// `Transport` error. An empty `result` list is `EmptyResult`.
pub fn decode_response(body: &[u8], platform: &str) -> Result<RecognitionSession, TunebotError> {
    let response: RecognizeResponse =
        serde_json::from_slice(body).map_err(|e| TunebotError::Transport {
            message: format!("malformed recognition response: {e}"),
            status: Some(200),
            source: Some(Box::new(e)),
        })?;

    if let Some(code) = response.code.filter(|code| *code != 200) {
        let detail = response.message.unwrap_or_default();
        return Err(TunebotError::Transport {
            message: format!("recognition service reported code {code}: {detail}"),
            status: Some(200),
            source: None,
        });
    }

    let song = response
        .data
        .and_then(|data| data.result.into_iter().next())
        .map(|m| m.song)
        .ok_or_else(|| TunebotError::EmptyResult("recognition returned no results".to_string()))?;

    let track_id = match &song.id {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        other => {
            return Err(TunebotError::Transport {
                message: format!("recognition result has invalid song id {other}"),
                status: Some(200),
                source: None,
            });
        }
    };

    Ok(RecognitionSession {
        platform: platform.to_string(),
        url: song_url(&track_id),
        track_id,
        title: song.name.filter(|n| !n.is_empty()),
        artists: song
            .artists
            .into_iter()
            .map(|a| a.name)
            .filter(|n| !n.is_empty())
            .collect(),
        album: song.album.map(|a| a.name).filter(|n| !n.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunebot_core::FailureClass;

    #[test]
    fn decodes_first_result() {
        let body = br#"{"code":200,"data":{"result":[
            {"song":{"id":1901371647,"name":"Song","artists":[{"name":"A"},{"name":"B"}],"album":{"name":"LP"}}},
            {"song":{"id":2,"name":"Other"}}
        ]}}"#;
        let session = decode_response(body, "netease").unwrap();
        assert_eq!(session.platform, "netease");
        assert_eq!(session.track_id, "1901371647");
        assert_eq!(session.url, "https://music.163.com/song/1901371647");
        assert_eq!(session.title.as_deref(), Some("Song"));
        assert_eq!(session.artists, vec!["A", "B"]);
        assert_eq!(session.album.as_deref(), Some("LP"));
    }

    #[test]
    fn empty_result_is_no_result() {
        let err = decode_response(br#"{"code":200,"data":{"result":[]}}"#, "netease").unwrap_err();
        assert_eq!(err.class(), FailureClass::NoResult);
        let err = decode_response(br#"{"code":200}"#, "netease").unwrap_err();
        assert!(matches!(err, TunebotError::EmptyResult(_)));
    }

    #[test]
    fn malformed_body_is_transport() {
        let err = decode_response(b"<html>", "netease").unwrap_err();
        assert!(matches!(err, TunebotError::Transport { status: Some(200), .. }));
    }

    #[test]
    fn error_code_is_transport() {
        let err = decode_response(br#"{"code":500,"message":"upstream"}"#, "netease").unwrap_err();
        assert!(err.to_string().contains("code 500: upstream"), "{err}");
    }

    #[test]
    fn string_ids_are_accepted() {
        let body = br#"{"data":{"result":[{"song":{"id":" 77 "}}]}}"#;
        let session = decode_response(body, "netease").unwrap();
        assert_eq!(session.track_id, "77");
        assert!(session.title.is_none());
        assert!(session.artists.is_empty());
    }
}
