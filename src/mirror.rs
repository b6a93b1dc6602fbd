//! Known mirror domains of the site, in preference order.
//!
//! The head of the list is the site's current base URL. It changes in two
//! ways only:
//! - [`MirrorRegistry::promote`] after a request succeeded on another mirror
//! - [`MirrorRegistry::refresh`] when the shared remote list names a new
//!   preferred domain (at most once per refresh interval)
//!
//! Entries are never dropped, so the list can not become empty after
//! construction.

use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::http_client::Transport;
use crate::urls::origin_of;

#[derive(Debug)]
struct MirrorState {
    mirrors: Vec<String>,
    last_refresh: Option<Instant>,
}

/// Process-wide mirror set plus its refresh gate.
#[derive(Debug)]
pub struct MirrorRegistry {
    state: RwLock<MirrorState>,
    site_key: String,
    domain_list_url: String,
    refresh_interval: Duration,
}

impl MirrorRegistry {
    /// Build a registry from seed mirrors. Each mirror is reduced to its
    /// origin and duplicates are removed; an empty seed or a mirror that is
    /// not an absolute http(s) URL is rejected.
    pub fn new<I, S>(
        seed: I,
        site_key: impl Into<String>,
        domain_list_url: impl Into<String>,
        refresh_interval: Duration,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mirrors: Vec<String> = Vec::new();
        for mirror in seed {
            let mirror = normalize(mirror.as_ref());
            if mirror.is_empty() {
                continue;
            }
            let origin = origin_of(&mirror).ok_or(Error::InvalidUrl(mirror))?;
            if !mirrors.contains(&origin) {
                mirrors.push(origin);
            }
        }
        if mirrors.is_empty() {
            return Err(Error::Config("at least one mirror is required".to_string()));
        }

        Ok(Self {
            state: RwLock::new(MirrorState {
                mirrors,
                last_refresh: None,
            }),
            site_key: site_key.into(),
            domain_list_url: domain_list_url.into(),
            refresh_interval,
        })
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(
            &config.mirrors,
            &config.site_key,
            &config.domain_list_url,
            config.refresh_interval(),
        )
    }

    /// Current base URL of the site.
    pub async fn primary(&self) -> String {
        self.state.read().await.mirrors[0].clone()
    }

    /// Snapshot of the mirror order for one request.
    pub async fn candidates(&self) -> Vec<String> {
        self.state.read().await.mirrors.clone()
    }

    /// Whether `url` is hosted on one of the known mirrors.
    pub async fn contains_origin(&self, url: &str) -> bool {
        let Some(origin) = origin_of(url) else {
            return false;
        };
        self.state.read().await.mirrors.contains(&origin)
    }

    /// Move a known mirror to the front. Returns `true` if the order changed.
    ///
    /// Unknown mirrors are ignored: the set only grows through refresh.
    pub async fn promote(&self, mirror: &str) -> bool {
        let mirror = normalize(mirror);
        let mut state = self.state.write().await;
        match state.mirrors.iter().position(|m| *m == mirror) {
            Some(0) | None => false,
            Some(index) => {
                let promoted = state.mirrors.remove(index);
                state.mirrors.insert(0, promoted);
                info!(mirror = %mirror, "Promoted mirror to primary");
                true
            }
        }
    }

    /// [`promote`](Self::promote) the mirror serving `url`.
    pub async fn promote_url(&self, url: &str) -> bool {
        match origin_of(url) {
            Some(origin) => self.promote(&origin).await,
            None => false,
        }
    }

    /// Re-synchronise the preferred mirror from the remote domain list.
    ///
    /// No-op when the last refresh is younger than the refresh interval.
    /// Fetch and parse failures are swallowed.
    pub async fn refresh(&self, transport: &dyn Transport) {
        if !self.begin_refresh().await {
            return;
        }

        let text = match transport.get(&self.domain_list_url, None).await {
            Ok(response) if response.is_success() => response.body,
            Ok(response) => {
                debug!(status = response.status, "Mirror list fetch failed");
                return;
            }
            Err(e) => {
                debug!(error = %e, "Mirror list fetch failed");
                return;
            }
        };

        match parse_mirror_list(&text, &self.site_key) {
            Some(mirror) => {
                self.set_preferred(&mirror).await;
            }
            None => debug!(site_key = %self.site_key, "No usable entry in mirror list"),
        }
    }

    /// Check-then-set of the refresh timestamp under one write guard.
    async fn begin_refresh(&self) -> bool {
        let mut state = self.state.write().await;
        let now = Instant::now();
        if let Some(last) = state.last_refresh {
            if now.duration_since(last) < self.refresh_interval {
                return false;
            }
        }
        state.last_refresh = Some(now);
        true
    }

    /// Put `mirror` at the front, removing any existing occurrence.
    /// Returns `false` when it already was the primary.
    pub async fn set_preferred(&self, mirror: &str) -> bool {
        let mirror = normalize(mirror);
        let mut state = self.state.write().await;
        if state.mirrors[0] == mirror {
            return false;
        }
        state.mirrors.retain(|m| *m != mirror);
        state.mirrors.insert(0, mirror.clone());
        info!(mirror = %mirror, "Preferred mirror updated from remote list");
        true
    }
}

/// Find `site_key`'s mirror in the remote list.
///
/// Lines look like `|HDFilmCehennemi: https://www.hdfilmcehennemi.nl/`.
/// The key match is case-insensitive and the leading `|` optional. Only
/// absolute http(s) URLs are accepted.
pub fn parse_mirror_list(text: &str, site_key: &str) -> Option<String> {
    let prefix = format!("{site_key}:");
    let line = text.lines().find(|line| {
        let line = line.trim_start();
        let line = line.strip_prefix('|').unwrap_or(line);
        line.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
    })?;

    let (_, value) = line.split_once(':')?;
    origin_of(&normalize(value))
}

fn normalize(mirror: &str) -> String {
    mirror.trim().trim_end_matches('/').to_string()
}
