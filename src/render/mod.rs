//! Browser rendering fallback for interactive challenge pages.
//!
//! Plain HTTP can not pass challenges that require running JavaScript. A
//! [`PageRenderer`] loads the page in a real browser and hands back the
//! final HTML once the challenge has cleared.

#[cfg(feature = "browser")]
pub mod chrome;

use async_trait::async_trait;

use crate::error::Result;

#[cfg(feature = "browser")]
pub use chrome::ChromeRenderer;

/// Renders a URL in a browser context and returns the resulting HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Short lowercase renderer name (e.g., `"chrome"`).
    fn name(&self) -> &'static str;

    /// Load `url` and return the page HTML after scripts ran.
    async fn render(&self, url: &str) -> Result<String>;
}
