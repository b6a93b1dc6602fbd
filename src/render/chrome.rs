//! Headless Chrome renderer.
//!
//! `headless_chrome` is synchronous, so each render runs on the blocking
//! pool. The browser process is launched lazily and reused.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

use super::PageRenderer;
use crate::challenge::is_challenge;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct ChromeRenderer {
    user_agent: String,
    timeout: Duration,
    browser: Arc<Mutex<Option<Browser>>>,
}

impl ChromeRenderer {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
            browser: Arc::new(Mutex::new(None)),
        }
    }

    fn browser(slot: &Mutex<Option<Browser>>, user_agent: &str) -> Result<Browser> {
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(browser) = slot.as_ref() {
            return Ok(browser.clone());
        }

        let ua_arg = format!("--user-agent={user_agent}");
        let options = LaunchOptions::default_builder()
            .headless(true)
            .args(vec![
                std::ffi::OsStr::new("--disable-blink-features=AutomationControlled"),
                std::ffi::OsStr::new("--disable-dev-shm-usage"),
                std::ffi::OsStr::new("--no-sandbox"),
                std::ffi::OsStr::new(&ua_arg),
            ])
            .build()
            .map_err(render_error)?;
        let browser = Browser::new(options).map_err(render_error)?;
        info!("Launched headless Chrome");
        *slot = Some(browser.clone());
        Ok(browser)
    }

    /// Navigate and poll the DOM until the challenge is gone or time is up.
    /// Navigation and polling share one deadline.
    fn render_blocking(
        slot: &Mutex<Option<Browser>>,
        user_agent: &str,
        url: &str,
        timeout: Duration,
    ) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let browser = Self::browser(slot, user_agent)?;
        let tab = TabGuard(browser.new_tab().map_err(render_error)?);

        tab.0.set_default_timeout(remaining(deadline));
        tab.0
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(render_error)?;

        poll_content(|| tab.0.get_content().map_err(render_error), deadline, POLL_INTERVAL)
    }
}

/// Closes the tab on every exit so failed renders do not pile up in the
/// shared browser.
struct TabGuard(Arc<Tab>);

impl Drop for TabGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close(true) {
            debug!(error = %e, "Failed to close tab");
        }
    }
}

fn render_error(e: impl std::fmt::Display) -> Error {
    Error::Render(e.to_string())
}

fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Re-read the page until it is no longer a challenge or `deadline` passes.
fn poll_content(
    mut content: impl FnMut() -> Result<String>,
    deadline: Instant,
    interval: Duration,
) -> Result<String> {
    let mut html = content()?;
    while is_challenge(&html) && Instant::now() < deadline {
        std::thread::sleep(interval.min(remaining(deadline)));
        html = content()?;
    }
    Ok(html)
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn render(&self, url: &str) -> Result<String> {
        debug!(url, "Rendering through headless Chrome");
        let slot = Arc::clone(&self.browser);
        let user_agent = self.user_agent.clone();
        let url = url.to_string();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || Self::render_blocking(&slot, &user_agent, &url, timeout))
            .await
            .map_err(render_error)?
    }
}
