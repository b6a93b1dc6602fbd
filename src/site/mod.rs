//! Site providers.
//!
//! A provider turns the pages of one streaming site into typed catalog
//! data and playable links.
//!
//! # Architecture
//!
//! - [`MediaProvider`]: Async trait every site implements
//! - [`FanesProvider`]: The mirror-resilient HDFilmCehennemi provider
//! - [`extract`]: Pure HTML/JSON parsers shared by providers
//! - [`LinkSet`]: Links found for one title or episode
//!
//! # Example
//!
//! ```rust,no_run
//! use fanes::site::{FanesProvider, MediaProvider};
//! use fanes::SiteConfig;
//!
//! # async fn example() -> fanes::Result<()> {
//! let provider = FanesProvider::from_config(&SiteConfig::default())?;
//!
//! for item in provider.search("inception").await? {
//!     println!("{} → {}", item.title, item.url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod extract;
mod fanes;

use async_trait::async_trait;
use serde::Serialize;

pub use extract::{Actor, Episode, MediaDetail, MediaKind, MediaSummary, SourceTab};
pub use fanes::FanesProvider;

use crate::config::CatalogSection;
use crate::error::Result;
use crate::stream::{LinkEvent, StreamSource, SubtitleTrack};

/// Links discovered for one detail page, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSet {
    /// `false` only when the page had neither source tabs nor a player.
    pub found: bool,
    pub events: Vec<LinkEvent>,
}

impl LinkSet {
    pub fn streams(&self) -> impl Iterator<Item = &StreamSource> {
        self.events.iter().filter_map(|event| match event {
            LinkEvent::Stream(stream) => Some(stream),
            LinkEvent::Subtitle(_) => None,
        })
    }

    pub fn subtitles(&self) -> impl Iterator<Item = &SubtitleTrack> {
        self.events.iter().filter_map(|event| match event {
            LinkEvent::Subtitle(track) => Some(track),
            LinkEvent::Stream(_) => None,
        })
    }
}

/// Catalog, search, detail and link resolution for one site.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Display name (e.g., "FanesMovies").
    fn name(&self) -> &str;

    /// Browsable catalog sections.
    fn sections(&self) -> &[CatalogSection];

    /// One page of a catalog section. Pages start at 1.
    async fn list_catalog(&self, section: &CatalogSection, page: u32) -> Result<Vec<MediaSummary>>;

    async fn search(&self, query: &str) -> Result<Vec<MediaSummary>>;

    /// Detail page of `url`; `None` when the page is not a title page.
    async fn load_detail(&self, url: &str) -> Result<Option<MediaDetail>>;

    /// Streams and subtitles reachable from the detail or episode page `url`.
    async fn resolve_links(&self, url: &str) -> Result<LinkSet>;
}
