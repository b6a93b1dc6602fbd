//! HTTP client used for every request to the site and its mirrors
//!
//! Features:
//! - Fixed browser fingerprint as default headers
//! - Cookie store, so challenge clearance cookies are reused
//! - Brotli, Zstd, Gzip and Deflate decompression
//! - Connection pooling with keep-alive
//!
//! The fetcher and mirror registry talk to the network through the
//! [`Transport`] trait so they can be driven by a scripted transport in
//! tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::fingerprint::BrowserProfile;

/// Status, final URL and decoded body of one request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub url: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam for the fetcher and mirror registry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Plain page navigation.
    async fn get(&self, url: &str, referer: Option<&str>) -> Result<HttpResponse>;

    /// Form POST dressed as an XHR (`X-Requested-With`, JSON `Accept`).
    async fn post_ajax(
        &self,
        url: &str,
        form: &[(&str, &str)],
        referer: Option<&str>,
    ) -> Result<HttpResponse>;
}

/// HTTP client with the site's browser profile baked in
pub struct AcceleratedClient {
    client: Client,
    profile: BrowserProfile,
}

impl AcceleratedClient {
    /// Create a client with the default Firefox profile
    pub fn new() -> Result<Self> {
        Self::with_profile(BrowserProfile::firefox())
    }

    /// Create client with specific browser profile
    pub fn with_profile(profile: BrowserProfile) -> Result<Self> {
        let headers = profile.to_headers()?;

        let client = Client::builder()
            // Mirrors differ in HTTP/2 support, let ALPN decide
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;

        Ok(Self { client, profile })
    }

    pub fn profile(&self) -> &BrowserProfile {
        &self.profile
    }

    async fn send(request: RequestBuilder) -> Result<HttpResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        debug!(
            status,
            version = ?response.version(),
            content_encoding = ?response.headers().get("content-encoding"),
            "Response received"
        );
        let body = response.text().await?;
        Ok(HttpResponse { status, url, body })
    }
}

fn with_referer(request: RequestBuilder, referer: Option<&str>) -> RequestBuilder {
    match referer {
        Some(referer) => request.header(REFERER, referer),
        None => request,
    }
}

#[async_trait]
impl Transport for AcceleratedClient {
    #[instrument(skip(self), fields(url = %url))]
    async fn get(&self, url: &str, referer: Option<&str>) -> Result<HttpResponse> {
        Self::send(with_referer(self.client.get(url), referer)).await
    }

    #[instrument(skip(self, form), fields(url = %url))]
    async fn post_ajax(
        &self,
        url: &str,
        form: &[(&str, &str)],
        referer: Option<&str>,
    ) -> Result<HttpResponse> {
        let request = self
            .client
            .post(url)
            .headers(BrowserProfile::ajax_headers())
            .form(form);
        Self::send(with_referer(request, referer)).await
    }
}
