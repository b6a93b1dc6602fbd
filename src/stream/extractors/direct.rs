//! Direct media links embedded as player frames.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use url::Url;

use crate::stream::provider::{ContentType, LinkEvent, LinkExtractor, StreamSource};

pub struct DirectMediaExtractor;

impl DirectMediaExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn content_type(url: &str) -> Option<ContentType> {
        let path = Url::parse(url).ok()?.path().to_ascii_lowercase();
        if path.ends_with(".m3u8") {
            Some(ContentType::Hls)
        } else if path.ends_with(".mpd") {
            Some(ContentType::Dash)
        } else if path.ends_with(".mp4") {
            Some(ContentType::Progressive)
        } else {
            None
        }
    }
}

impl Default for DirectMediaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkExtractor for DirectMediaExtractor {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn matches(&self, url: &str) -> bool {
        Self::content_type(url).is_some()
    }

    async fn extract(&self, url: &str, referer: &str) -> Result<Vec<LinkEvent>> {
        let content_type =
            Self::content_type(url).ok_or_else(|| anyhow!("Not a direct media URL: {url}"))?;
        let source = Url::parse(url)?
            .host_str()
            .unwrap_or("direct")
            .to_string();
        Ok(vec![LinkEvent::Stream(StreamSource {
            source,
            url: url.to_string(),
            content_type,
            referer: (!referer.is_empty()).then(|| referer.to_string()),
        })])
    }
}
