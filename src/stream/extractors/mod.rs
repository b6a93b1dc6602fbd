//! Third-party player extraction.
//!
//! Frames the site embeds from other hosts are handed to an
//! [`ExtractorChain`], which dispatches to the first [`LinkExtractor`] that
//! claims the URL.

pub mod direct;

use tracing::{debug, warn};

pub use direct::DirectMediaExtractor;

use crate::stream::provider::{LinkEvent, LinkExtractor};

/// Routes third-party player URLs to link extractors.
///
/// Extractors are checked in registration order. First match wins. A
/// failing extractor yields no links and is logged as a warning.
pub struct ExtractorChain {
    extractors: Vec<Box<dyn LinkExtractor>>,
}

impl ExtractorChain {
    /// Chain with the built-in extractors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(DirectMediaExtractor::new())],
        }
    }

    /// Chain with no extractors; every URL is unhandled.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Add an extractor after the existing ones.
    #[must_use]
    pub fn with(mut self, extractor: impl LinkExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Extract links from `url`, or nothing if no extractor handles it.
    pub async fn extract(&self, url: &str, referer: &str) -> Vec<LinkEvent> {
        let Some(extractor) = self.extractors.iter().find(|e| e.matches(url)) else {
            debug!(url, "No extractor handles URL");
            return Vec::new();
        };

        debug!("Matched extractor: {}", extractor.name());
        match extractor.extract(url, referer).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Extractor {} failed for {}: {}", extractor.name(), url, e);
                Vec::new()
            }
        }
    }
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::new()
    }
}
