//! `fanes` - Mirror-resilient catalog and stream client for HDFilmCehennemi
//!
//! # Features
//!
//! - **Mirror Failover**: Every request is tried across all known mirror
//!   domains; the first that serves real content becomes the primary
//! - **Challenge Detection**: Anti-bot interstitials are never returned as
//!   content; optional headless Chrome rendering (`browser` feature)
//! - **Mirror Discovery**: The preferred domain is refreshed from a shared
//!   remote list at most once per interval
//! - **Stream Resolution**: Packed player scripts are unpacked and decoded
//!   into HLS stream URLs plus caption tracks
//!
//! # Example
//!
//! ```rust,no_run
//! use fanes::site::{FanesProvider, MediaProvider};
//! use fanes::SiteConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = FanesProvider::from_config(&SiteConfig::load()?)?;
//!     let links = provider
//!         .resolve_links("https://www.hdfilmcehennemi.nl/film/inception/")
//!         .await?;
//!     for stream in links.streams() {
//!         println!("{} {}", stream.source, stream.url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod challenge;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod http_client;
pub mod mirror;
pub mod render;
pub mod site;
pub mod stream;
pub mod urls;

#[cfg(test)]
mod testing;

pub use challenge::is_challenge;
pub use config::{CatalogSection, SiteConfig};
pub use error::{Error, Result};
pub use fetcher::{Document, ResilientFetcher};
pub use fingerprint::BrowserProfile;
pub use http_client::{AcceleratedClient, HttpResponse, Transport};
pub use mirror::MirrorRegistry;
pub use render::PageRenderer;
pub use site::{FanesProvider, LinkSet, MediaDetail, MediaProvider, MediaSummary};
pub use stream::{ContentType, LinkEvent, StreamResolver, StreamSource, SubtitleTrack};

/// Version of fanes
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
