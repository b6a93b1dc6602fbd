//! Resolved link types and the external extractor trait.
//!
//! A player page yields an ordered sequence of [`LinkEvent`]s: at most one
//! stream from the site's own player plus any number of subtitle tracks,
//! or whatever a [`LinkExtractor`] finds on a third-party host.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Declared media type of a stream URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// HLS segmented manifest (`.m3u8`).
    Hls,
    /// DASH manifest (`.mpd`).
    Dash,
    /// Single progressive file.
    Progressive,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Hls => "application/vnd.apple.mpegurl",
            ContentType::Dash => "application/dash+xml",
            ContentType::Progressive => "video/mp4",
        }
    }
}

/// A playable stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSource {
    /// Source tab label (e.g., `"Close"`, `"FanesMovies"`).
    pub source: String,
    /// Absolute stream URL.
    pub url: String,
    pub content_type: ContentType,
    /// `Referer` the CDN requires for playback.
    pub referer: Option<String>,
}

/// A subtitle file for a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleTrack {
    pub label: String,
    /// Absolute subtitle URL.
    pub url: String,
}

/// One discovery, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkEvent {
    Stream(StreamSource),
    Subtitle(SubtitleTrack),
}

/// Resolves streams hosted by a third party (embedded players the site
/// links to but does not run itself).
#[async_trait]
pub trait LinkExtractor: Send + Sync {
    /// Short lowercase extractor name (e.g., `"direct"`).
    fn name(&self) -> &'static str;

    /// Returns `true` if this extractor can handle the given URL.
    fn matches(&self, url: &str) -> bool;

    /// Resolve `url`, sending `referer` where the host requires one.
    async fn extract(&self, url: &str, referer: &str) -> Result<Vec<LinkEvent>>;
}
