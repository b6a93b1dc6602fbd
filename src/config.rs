//! Site configuration loaded from `~/.config/fanes/site.toml`.
//!
//! Every field has a default matching the live site, so the file is
//! optional and may override only the keys it names:
//!
//! ```toml
//! mirrors = ["https://www.hdfilmcehennemi.nl", "https://hdfilmcehennemi.mobi"]
//! refresh_interval_secs = 600
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fingerprint::{FIREFOX_ACCEPT_LANGUAGE, FIREFOX_USER_AGENT};

const DEFAULT_DOMAIN_LIST_URL: &str =
    "https://raw.githubusercontent.com/Kraptor123/domainListesi/refs/heads/main/eklenti_domainleri.txt";

/// A browsable catalog listing on the site. `path` is relative and ends
/// where the page number is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSection {
    pub name: String,
    pub path: String,
}

impl CatalogSection {
    fn new(path: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
        }
    }
}

/// Everything the provider needs to know about the target site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Display name, also the label of streams found without a source tab.
    pub name: String,
    /// Key of this site's line in the remote mirror list.
    pub site_key: String,
    /// Seed mirrors in preference order.
    pub mirrors: Vec<String>,
    /// Plain-text list carrying the currently preferred mirror.
    pub domain_list_url: String,
    pub refresh_interval_secs: u64,
    /// Upper bound for one headless browser render.
    pub render_timeout_secs: u64,
    /// Only URLs matching this pattern are handed to the browser renderer.
    pub intercept_pattern: String,
    pub user_agent: String,
    pub accept_language: String,
    pub sections: Vec<CatalogSection>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "FanesMovies".to_string(),
            site_key: "HDFilmCehennemi".to_string(),
            mirrors: vec![
                "https://www.hdfilmcehennemi.nl".to_string(),
                "https://www.hdfilmcehennemi.ws".to_string(),
                "https://hdfilmcehennemi.mobi".to_string(),
            ],
            domain_list_url: DEFAULT_DOMAIN_LIST_URL.to_string(),
            refresh_interval_secs: 15 * 60,
            render_timeout_secs: 20,
            intercept_pattern: r"https?://(www\.)?hdfilmcehennemi\..*".to_string(),
            user_agent: FIREFOX_USER_AGENT.to_string(),
            accept_language: FIREFOX_ACCEPT_LANGUAGE.to_string(),
            sections: vec![
                CatalogSection::new("/category/tavsiye-filmler-izle2/page/", "Tavsiye Filmler"),
                CatalogSection::new("/yabancidiziizle-5/page/", "Yabanci Diziler"),
                CatalogSection::new("/imdb-7-puan-uzeri-filmler/page/", "IMDB 7+ Filmler"),
                CatalogSection::new("/en-cok-yorumlananlar/page/", "En Cok Yorumlananlar"),
            ],
        }
    }
}

impl SiteConfig {
    /// Load from the default location, falling back to built-in defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Load from an explicit path. A missing file is an error here.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.mirrors.iter().all(|m| m.trim().is_empty()) {
            return Err(Error::Config("mirror list is empty".to_string()));
        }
        if let Err(e) = regex::Regex::new(&self.intercept_pattern) {
            return Err(Error::Config(format!("invalid intercept_pattern: {e}")));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

/// Return the path to the site config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fanes")
        .join("site.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = SiteConfig::from_toml_str("").unwrap();
        assert_eq!(config.name, "FanesMovies");
        assert_eq!(config.mirrors.len(), 3);
        assert_eq!(config.refresh_interval(), Duration::from_secs(900));
        assert_eq!(config.render_timeout(), Duration::from_secs(20));
        assert_eq!(config.sections.len(), 4);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let toml_str = r#"
mirrors = ["https://a.example", "https://b.example"]
refresh_interval_secs = 60
"#;
        let config = SiteConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.mirrors, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.refresh_interval_secs, 60);
        assert_eq!(config.site_key, "HDFilmCehennemi");
    }

    #[test]
    fn parse_sections() {
        let toml_str = r#"
[[sections]]
name = "Latest"
path = "/latest/page/"
"#;
        let config = SiteConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.sections, vec![CatalogSection::new("/latest/page/", "Latest")]);
    }

    #[test]
    fn empty_mirror_list_is_rejected() {
        let err = SiteConfig::from_toml_str("mirrors = []").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn bad_intercept_pattern_is_rejected() {
        let err = SiteConfig::from_toml_str("intercept_pattern = \"(\"").unwrap_err();
        assert!(err.to_string().contains("intercept_pattern"));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = SiteConfig::from_toml_str("mirrors = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
