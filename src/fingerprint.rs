//! Browser fingerprint sent to the site
//!
//! The site and its challenge layer are sensitive to header churn, so a
//! single fixed Firefox profile is used for every request instead of a
//! rotating one.

use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT,
};

use crate::error::{Error, Result};

pub const FIREFOX_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0";
pub const FIREFOX_ACCEPT_LANGUAGE: &str = "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7";

/// `Accept` value of jQuery-style AJAX requests.
pub const AJAX_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Browser profile with the header pair the site expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept_language: String,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self::firefox()
    }
}

impl BrowserProfile {
    #[must_use]
    pub fn firefox() -> Self {
        Self::new(FIREFOX_USER_AGENT, FIREFOX_ACCEPT_LANGUAGE)
    }

    pub fn new(user_agent: impl Into<String>, accept_language: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept_language: accept_language.into(),
        }
    }

    /// Convert profile to reqwest `HeaderMap` for page navigation
    pub fn to_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("User-Agent", &self.user_agent)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("Accept-Language", &self.accept_language)?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        Ok(headers)
    }

    /// Extra headers for the search endpoint, which only answers JSON to
    /// requests that look like XHR.
    #[must_use]
    pub fn ajax_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(AJAX_ACCEPT));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Config(format!("invalid {name} header: {e}")))
}
