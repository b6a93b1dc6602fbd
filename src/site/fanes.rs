//! HDFilmCehennemi provider ("FanesMovies").

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::extract::{
    dedup_by_url, parse_catalog, parse_detail, parse_player_frame, parse_search_payload,
    parse_source_tabs, MediaDetail, MediaSummary, SourceTab,
};
use super::{LinkSet, MediaProvider};
use crate::config::{CatalogSection, SiteConfig};
use crate::error::Result;
use crate::fetcher::ResilientFetcher;
use crate::fingerprint::BrowserProfile;
use crate::http_client::AcceleratedClient;
use crate::mirror::MirrorRegistry;
use crate::stream::{ExtractorChain, LinkEvent, StreamResolver};

pub struct FanesProvider {
    name: String,
    sections: Vec<CatalogSection>,
    fetcher: Arc<ResilientFetcher>,
    resolver: StreamResolver,
    extractors: ExtractorChain,
}

impl FanesProvider {
    pub fn new(fetcher: Arc<ResilientFetcher>, config: &SiteConfig) -> Self {
        Self {
            name: config.name.clone(),
            sections: config.sections.clone(),
            resolver: StreamResolver::new(Arc::clone(&fetcher)),
            fetcher,
            extractors: ExtractorChain::new(),
        }
    }

    /// Provider talking to the live site over HTTP, with the headless
    /// browser fallback when built with the `browser` feature.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let profile = BrowserProfile::new(&config.user_agent, &config.accept_language);
        let client = AcceleratedClient::with_profile(profile)?;
        let mirrors = MirrorRegistry::from_config(config)?;
        let fetcher = ResilientFetcher::new(Arc::new(client), Arc::new(mirrors));

        #[cfg(feature = "browser")]
        let fetcher = {
            let renderer =
                crate::render::ChromeRenderer::new(&config.user_agent, config.render_timeout());
            fetcher.with_renderer(Arc::new(renderer), config)?
        };

        Ok(Self::new(Arc::new(fetcher), config))
    }

    /// Replace the chain used for third-party player frames.
    #[must_use]
    pub fn with_extractors(mut self, extractors: ExtractorChain) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn fetcher(&self) -> &Arc<ResilientFetcher> {
        &self.fetcher
    }

    /// Resolve one player frame: frames on any known mirror go through the
    /// stream resolver, everything else through the extractor chain.
    async fn resolve_frame(&self, frame_url: &str, source: &str) -> Result<Vec<LinkEvent>> {
        if self.fetcher.mirrors().contains_origin(frame_url).await {
            return self.resolver.resolve(frame_url, source).await;
        }
        let referer = format!("{}/", self.fetcher.base_url().await);
        Ok(self.extractors.extract(frame_url, &referer).await)
    }

    /// Fetch a source tab to reveal its iframe, then resolve the frame.
    async fn resolve_tab(&self, tab: &SourceTab) -> Result<Vec<LinkEvent>> {
        let document = self.fetcher.fetch_document(&tab.url, None).await?;
        let base = self.fetcher.base_url().await;
        let Some(frame) = parse_player_frame(&document.html(), &base) else {
            debug!(tab = %tab.url, "Source tab has no player frame");
            return Ok(Vec::new());
        };
        self.resolve_frame(&frame, &tab.label).await
    }
}

#[async_trait]
impl MediaProvider for FanesProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn sections(&self) -> &[CatalogSection] {
        &self.sections
    }

    #[instrument(skip(self, section), fields(section = %section.name))]
    async fn list_catalog(&self, section: &CatalogSection, page: u32) -> Result<Vec<MediaSummary>> {
        let path = format!("{}{page}", section.path);
        let document = self.fetcher.fetch_document(&path, None).await?;
        let base = self.fetcher.base_url().await;
        Ok(parse_catalog(&document.html(), &base))
    }

    /// HTML search first; the AJAX endpoint only when that yields nothing.
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<MediaSummary>> {
        let path = format!("/search/?q={}", urlencoding::encode(query));
        let html_error = match self.fetcher.fetch_document(&path, None).await {
            Ok(document) => {
                let base = self.fetcher.base_url().await;
                let results = dedup_by_url(parse_catalog(&document.html(), &base));
                if !results.is_empty() {
                    return Ok(results);
                }
                None
            }
            Err(e) => {
                warn!(error = %e, "HTML search failed, trying search endpoint");
                Some(e)
            }
        };

        match self.fetcher.fetch_search_payload(query).await {
            Some(json) => {
                let base = self.fetcher.base_url().await;
                Ok(parse_search_payload(&json, &base))
            }
            None => html_error.map_or_else(|| Ok(Vec::new()), Err),
        }
    }

    #[instrument(skip(self))]
    async fn load_detail(&self, url: &str) -> Result<Option<MediaDetail>> {
        let document = self.fetcher.fetch_document(url, None).await?;
        let base = self.fetcher.base_url().await;
        Ok(parse_detail(&document.html(), url, &base))
    }

    #[instrument(skip(self))]
    async fn resolve_links(&self, url: &str) -> Result<LinkSet> {
        let document = self.fetcher.fetch_document(url, None).await?;
        let base = self.fetcher.base_url().await;
        let (tabs, frame) = {
            let html = document.html();
            let tabs = parse_source_tabs(&html, &base, &self.name);
            let frame = if tabs.is_empty() {
                parse_player_frame(&html, &base)
            } else {
                None
            };
            (tabs, frame)
        };

        if tabs.is_empty() {
            let Some(frame) = frame else {
                debug!("No source tabs and no player frame");
                return Ok(LinkSet::default());
            };
            let events = self.resolve_frame(&frame, &self.name).await?;
            return Ok(LinkSet {
                found: true,
                events,
            });
        }

        info!(count = tabs.len(), "Resolving source tabs");
        let results = join_all(tabs.iter().map(|tab| self.resolve_tab(tab))).await;
        let events = tabs
            .iter()
            .zip(results)
            .flat_map(|(tab, result)| {
                result.unwrap_or_else(|e| {
                    warn!("Source tab {} failed for {}: {}", tab.label, tab.url, e);
                    Vec::new()
                })
            })
            .collect();

        Ok(LinkSet {
            found: true,
            events,
        })
    }
}
