//! Stream resolution for the site's own player pages.
//!
//! The player page carries an inline script configuring the player. It is
//! usually packed, and the stream URL inside is usually base64 encoded:
//!
//! ```text
//! <script>eval(function(p,a,c,k,e,d){...})</script>
//!   → unpack      → ... file_link="aHR0cHM6Ly9...";  tracks: [{...}] ...
//!   → base64      → https://cdn.example/master.m3u8
//! ```
//!
//! Every step degrades to "nothing found": a missing marker, an unpack
//! failure or an undecodable payload moves on to the next fallback instead
//! of failing the resolution.

use std::sync::{Arc, LazyLock};

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::provider::{ContentType, LinkEvent, StreamSource, SubtitleTrack};
use super::unpack::{is_packed, unpack};
use crate::error::Result;
use crate::fetcher::ResilientFetcher;
use crate::urls::absolutize;

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("script selector is valid"));

static FILE_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"file\s*:\s*["']([^"']+)["']"#).expect("file literal pattern is valid")
});

const PLAYER_MARKERS: [&str; 2] = ["sources:", "file_link="];
const FILE_LINK_START: &str = "file_link=\"";
const FILE_LINK_END: &str = "\";";
const TRACKS_START: &str = "tracks: [";
const DEFAULT_SUBTITLE_LABEL: &str = "Sub";

/// Subtitle entry of the player's `tracks` array.
#[derive(Debug, Clone, Deserialize)]
struct TrackEntry {
    file: Option<String>,
    label: Option<String>,
    kind: Option<String>,
}

/// What a player script yields before URLs are made absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerPayload {
    pub stream_url: Option<String>,
    /// `(label, file)` pairs of caption tracks.
    pub subtitles: Vec<(String, String)>,
}

/// Text of the first inline script that configures the player.
///
/// A fully packed configuration shows no marker until unpacked, so the
/// first packed script is used when no script carries one.
pub fn find_player_script(html: &Html) -> Option<String> {
    let scripts: Vec<String> = html
        .select(&SCRIPT_SELECTOR)
        .map(|script| script.text().collect())
        .collect();
    let marked = scripts
        .iter()
        .position(|text| PLAYER_MARKERS.iter().any(|marker| text.contains(marker)));
    let index = marked.or_else(|| scripts.iter().position(|text| is_packed(text)))?;
    scripts.into_iter().nth(index)
}

/// Decode a player script into its stream URL and caption tracks.
pub fn decode_player_script(script: &str) -> PlayerPayload {
    let unpacked = unpack(script);
    if unpacked.is_none() {
        debug!("Player script is not packed, using it as-is");
    }
    let text = unpacked.as_deref().unwrap_or(script);

    let stream_url = extract_file_link(text)
        .and_then(|encoded| decode_file_link(&encoded))
        .or_else(|| extract_file_literal(text))
        .filter(|url| !url.trim().is_empty());

    // Tracks usually sit outside the packed block; fall back to the
    // unpacked text when the raw script has none.
    let mut subtitles = extract_tracks(script);
    if subtitles.is_empty() && unpacked.is_some() {
        subtitles = extract_tracks(text);
    }

    PlayerPayload {
        stream_url,
        subtitles,
    }
}

/// Substring between `file_link="` and the next `";`.
pub fn extract_file_link(text: &str) -> Option<String> {
    let start = text.find(FILE_LINK_START)? + FILE_LINK_START.len();
    let rest = &text[start..];
    let end = rest.find(FILE_LINK_END)?;
    let value = rest[..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Base64-decode a `file_link` value, keeping the raw value when it is not
/// base64. Only URL-shaped results are accepted so that a value that
/// happens to decode into binary noise is not handed out as a stream.
pub fn decode_file_link(value: &str) -> Option<String> {
    let decoded = STANDARD
        .decode(value)
        .or_else(|_| STANDARD_NO_PAD.decode(value))
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .map(|s| s.trim().to_string());

    match decoded {
        Some(url) if looks_like_url(&url) => Some(url),
        _ if looks_like_url(value) => Some(value.to_string()),
        _ => {
            debug!("file_link value is neither base64 nor a URL");
            None
        }
    }
}

/// `file: "..."` literal, the unencoded player configuration.
pub fn extract_file_literal(text: &str) -> Option<String> {
    FILE_LITERAL_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Caption tracks from the `tracks: [...]` array.
///
/// Only entries with `kind == "captions"` and a file are kept. A missing
/// or non-JSON array yields no tracks.
pub fn extract_tracks(text: &str) -> Vec<(String, String)> {
    let Some(start) = text.find(TRACKS_START) else {
        return Vec::new();
    };
    let rest = &text[start + TRACKS_START.len()..];
    let Some(end) = rest.find(']') else {
        return Vec::new();
    };
    let raw = rest[..end].trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let entries: Vec<TrackEntry> = match serde_json::from_str(&format!("[{raw}]")) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(error = %e, "Unparseable tracks array");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter(|entry| entry.kind.as_deref() == Some("captions"))
        .filter_map(|entry| {
            let file = entry.file.filter(|f| !f.trim().is_empty())?;
            let label = entry
                .label
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBTITLE_LABEL.to_string());
            Some((label, file))
        })
        .collect()
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("//") || s.starts_with('/')
}

/// Turn a decoded payload into link events against the site's base URL.
pub fn payload_events(payload: PlayerPayload, source: &str, base_url: &str) -> Vec<LinkEvent> {
    let base_url = base_url.trim_end_matches('/');
    let mut events = Vec::new();
    if let Some(url) = payload.stream_url {
        events.push(LinkEvent::Stream(StreamSource {
            source: source.to_string(),
            url: absolutize(base_url, &url),
            content_type: ContentType::Hls,
            referer: Some(format!("{base_url}/")),
        }));
    }
    events.extend(payload.subtitles.into_iter().map(|(label, file)| {
        LinkEvent::Subtitle(SubtitleTrack {
            label,
            url: absolutize(base_url, &file),
        })
    }));
    events
}

/// Resolves the site's own player pages.
pub struct StreamResolver {
    fetcher: Arc<ResilientFetcher>,
}

impl StreamResolver {
    pub fn new(fetcher: Arc<ResilientFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch `player_url` and decode its player script.
    ///
    /// Returns no events when the page has no player script or the script
    /// holds no stream; only a failed page fetch is an error.
    #[instrument(skip(self))]
    pub async fn resolve(&self, player_url: &str, source: &str) -> Result<Vec<LinkEvent>> {
        let referer = format!("{}/", self.fetcher.base_url().await);
        let document = self.fetcher.fetch_document(player_url, Some(&referer)).await?;
        let base_url = self.fetcher.base_url().await;

        let Some(script) = find_player_script(&document.html()) else {
            debug!(player_url, "No player script on page");
            return Ok(Vec::new());
        };

        let events = payload_events(decode_player_script(&script), source, &base_url);
        if events.is_empty() {
            debug!(player_url, "No link found in player script");
        }
        Ok(events)
    }
}
