//! Stream resolution.
//!
//! Turns player pages into [`LinkEvent`]s: the site's own packed player
//! scripts through [`StreamResolver`], third-party frames through an
//! [`ExtractorChain`].

pub mod extractors;
pub mod provider;
pub mod resolver;
pub mod unpack;

pub use extractors::{DirectMediaExtractor, ExtractorChain};
pub use provider::{ContentType, LinkEvent, LinkExtractor, StreamSource, SubtitleTrack};
pub use resolver::StreamResolver;
