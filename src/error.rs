//! Error types shared by the fetcher, resolver and provider.

use thiserror::Error;

/// Message used when every candidate answered with a challenge page and no
/// transport error was recorded along the way.
pub const CHALLENGE_BLOCKED: &str = "Site challenge blocked request";

/// Errors surfaced to callers of the library.
///
/// Only [`Error::LoadFailure`] is expected in normal operation: it is raised
/// once every mirror candidate for a request has been exhausted. Decode,
/// unpack and parse failures never surface here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    LoadFailure(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Browser render failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
