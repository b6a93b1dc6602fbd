//! Mirror-aware page fetching.
//!
//! Every logical request is expanded into one concrete URL per known
//! mirror. Candidates are tried strictly in order; the first one whose body
//! is not a challenge page wins and its mirror becomes the primary.
//!
//! ```text
//! /film/x  →  https://a/film/x, https://b/film/x, https://c/film/x
//!                 challenge        challenge        200 OK  ← promote c
//! ```

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use scraper::Html;
use tracing::{debug, instrument, warn};

use crate::challenge::is_challenge;
use crate::config::SiteConfig;
use crate::error::{Error, Result, CHALLENGE_BLOCKED};
use crate::http_client::{HttpResponse, Transport};
use crate::mirror::MirrorRegistry;
use crate::render::PageRenderer;
use crate::urls::{is_absolute, origin_of, relative_path};

/// JSON key present in every real search endpoint response.
const SEARCH_RESULT_MARKER: &str = "\"result\"";

/// A page body that passed challenge detection.
#[derive(Debug, Clone)]
pub struct Document {
    /// Candidate URL that served the page.
    pub url: String,
    pub body: String,
}

impl Document {
    /// Parse the body. `Html` is not `Send`, so parse after the last await.
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Browser fallback plus the URL pattern it is allowed to handle.
struct RenderFallback {
    renderer: Arc<dyn PageRenderer>,
    intercept: Regex,
    timeout: Duration,
}

/// Fetches documents across all known mirrors.
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    mirrors: Arc<MirrorRegistry>,
    fallback: Option<RenderFallback>,
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn Transport>, mirrors: Arc<MirrorRegistry>) -> Self {
        Self {
            transport,
            mirrors,
            fallback: None,
        }
    }

    /// Enable the browser fallback for URLs matching the config's
    /// intercept pattern.
    pub fn with_renderer(
        mut self,
        renderer: Arc<dyn PageRenderer>,
        config: &SiteConfig,
    ) -> Result<Self> {
        let intercept = Regex::new(&config.intercept_pattern)
            .map_err(|e| Error::Config(format!("invalid intercept_pattern: {e}")))?;
        self.fallback = Some(RenderFallback {
            renderer,
            intercept,
            timeout: config.render_timeout(),
        });
        Ok(self)
    }

    pub fn mirrors(&self) -> &Arc<MirrorRegistry> {
        &self.mirrors
    }

    /// Current base URL of the site.
    pub async fn base_url(&self) -> String {
        self.mirrors.primary().await
    }

    /// Pull the preferred mirror from the remote list if the refresh
    /// interval has passed.
    pub async fn refresh_mirrors(&self) {
        self.mirrors.refresh(self.transport.as_ref()).await;
    }

    /// Concrete URLs to try for `url_or_path`, in order.
    pub async fn candidates(&self, url_or_path: &str) -> Vec<String> {
        candidate_urls(url_or_path, &self.mirrors.candidates().await)
    }

    /// Fetch a page from the first mirror that serves real content.
    ///
    /// Fails with [`Error::LoadFailure`] carrying the last transport error,
    /// or [`CHALLENGE_BLOCKED`] when every candidate was a challenge page.
    #[instrument(skip(self))]
    pub async fn fetch_document(&self, url_or_path: &str, referer: Option<&str>) -> Result<Document> {
        self.refresh_mirrors().await;

        let referer = match referer {
            Some(referer) => referer.to_string(),
            None => format!("{}/", self.mirrors.primary().await),
        };

        let mut last_error: Option<Error> = None;
        for url in self.candidates(url_or_path).await {
            match self.attempt(&url, &referer).await {
                Ok(Some(body)) => {
                    self.mirrors.promote_url(&url).await;
                    return Ok(Document { url, body });
                }
                Ok(None) => debug!(url = %url, "Challenge page, trying next mirror"),
                Err(e) => {
                    debug!(url = %url, error = %e, "Candidate failed");
                    last_error = Some(e);
                }
            }
        }

        let message = last_error.map_or_else(|| CHALLENGE_BLOCKED.to_string(), |e| e.to_string());
        warn!(request = %url_or_path, %message, "All mirrors exhausted");
        Err(Error::LoadFailure(message))
    }

    /// One candidate: `Ok(None)` means a challenge page that could not be
    /// cleared.
    async fn attempt(&self, url: &str, referer: &str) -> Result<Option<String>> {
        let response = self.transport.get(url, Some(referer)).await?;
        if !is_challenge(&response.body) {
            return accept(response).map(Some);
        }

        let Some(fallback) = self.fallback.as_ref() else {
            return Ok(None);
        };
        if !fallback.intercept.is_match(url) {
            return Ok(None);
        }

        debug!(url, renderer = fallback.renderer.name(), "Rendering challenge page");
        let html = tokio::time::timeout(fallback.timeout, fallback.renderer.render(url))
            .await
            .map_err(|_| Error::Render(format!("timed out after {:?}", fallback.timeout)))??;
        Ok((!is_challenge(&html)).then_some(html))
    }

    /// POST `query` to each mirror's search endpoint until one answers JSON.
    ///
    /// `None` when every mirror failed; callers treat that as "no results".
    #[instrument(skip(self))]
    pub async fn fetch_search_payload(&self, query: &str) -> Option<String> {
        self.refresh_mirrors().await;

        for base in self.mirrors.candidates().await {
            let url = format!("{base}/search/");
            let referer = format!("{base}/");
            match self
                .transport
                .post_ajax(&url, &[("query", query)], Some(&referer))
                .await
            {
                Ok(response) if is_challenge(&response.body) => {
                    debug!(url = %url, "Challenge page on search endpoint");
                }
                Ok(response) if response.body.contains(SEARCH_RESULT_MARKER) => {
                    self.mirrors.promote(&base).await;
                    return Some(response.body);
                }
                Ok(response) => debug!(url = %url, status = response.status, "No search payload"),
                Err(e) => debug!(url = %url, error = %e, "Search request failed"),
            }
        }
        None
    }
}

/// Accept a non-challenge response if its status is a success.
fn accept(response: HttpResponse) -> Result<String> {
    if response.is_success() {
        Ok(response.body)
    } else {
        Err(Error::LoadFailure(format!(
            "HTTP {} from {}",
            response.status, response.url
        )))
    }
}

/// Expand one logical request over the mirror list.
///
/// - relative path `P` → `[m + P for m in mirrors]`
/// - absolute URL `U` → `[U]` then `U`'s path and query on every other
///   mirror, without duplicates
///
/// The mirror serving `U` itself is matched by origin, since the rewritten
/// path is percent-encoded and may not spell `U` the same way.
pub fn candidate_urls(url_or_path: &str, mirrors: &[String]) -> Vec<String> {
    if !is_absolute(url_or_path) {
        let path = if url_or_path.starts_with('/') {
            url_or_path.to_string()
        } else {
            format!("/{url_or_path}")
        };
        return mirrors.iter().map(|base| format!("{base}{path}")).collect();
    }

    let mut candidates = vec![url_or_path.to_string()];
    let Some(path) = relative_path(url_or_path) else {
        return candidates;
    };
    let own_origin = origin_of(url_or_path);
    for base in mirrors {
        if own_origin.as_deref() == Some(base.as_str()) {
            continue;
        }
        let candidate = format!("{base}{path}");
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}
