//! Page extraction for catalog, search, detail and player pages.
//!
//! All parsers are pure functions over a parsed [`Html`] document and the
//! site's current base URL; relative links are absolutized against it.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::urls::{absolutize, absolutize_opt};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static CARD: LazyLock<Selector> =
    LazyLock::new(|| selector("div.poster-container, div.poster.poster-pop, div.card-list-item"));
static CARD_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("h2.title, h3.title, h3"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img[data-src], img[src]"));

static DETAIL_TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector("div.card-header > h1, div.card-header > h2, h1"));
static DETAIL_POSTER: LazyLock<Selector> =
    LazyLock::new(|| selector("img.img-fluid, img[data-src], img[src]"));
static DETAIL_TAGS: LazyLock<Selector> =
    LazyLock::new(|| selector("div.mb-0.lh-lg div:nth-child(5) a, a[rel=tag]"));
static DETAIL_YEAR: LazyLock<Selector> =
    LazyLock::new(|| selector("div.mb-0.lh-lg div:nth-child(4) a"));
static DETAIL_PLOT: LazyLock<Selector> =
    LazyLock::new(|| selector("article.text-white > p, .post-content p, .description p"));
static DETAIL_ACTORS: LazyLock<Selector> =
    LazyLock::new(|| selector("div.mb-0.lh-lg div:last-child a.chip, a[rel=tag][href*=oyuncu]"));
static ACTOR_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static RECOMMENDATIONS: LazyLock<Selector> =
    LazyLock::new(|| selector("div.swiper-wrapper div.poster.poster-pop, div.poster-container"));
static SEASON_TABS: LazyLock<Selector> =
    LazyLock::new(|| selector("nav#seasonsTabs, #seasonsTabs-tabContent"));
static EPISODES: LazyLock<Selector> = LazyLock::new(|| {
    selector("div#seasonsTabs-tabContent div.card-list-item, .episode-item, .episodes li")
});
static EPISODE_NAME: LazyLock<Selector> = LazyLock::new(|| selector("h3, .title, a"));

static SOURCE_TABS: LazyLock<Selector> =
    LazyLock::new(|| selector("nav.nav.card-nav.nav-slider a.nav-link, a.nav-link[data-bs-toggle]"));
static PLAYER_FRAME: LazyLock<Selector> =
    LazyLock::new(|| selector("div.card-video iframe, iframe[data-src], iframe[src]"));

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("number pattern is valid"));

const TITLE_SUFFIX: &str = "Filminin Bilgileri";
const DEFAULT_EPISODE_NAME: &str = "Bolum";
const SEASON_ID_PREFIX: &str = "season-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    /// Series pages live under `/dizi/`; season titles mention "Sezon".
    fn classify(url: &str, title: &str) -> Self {
        if url.contains("/dizi/") || title.to_lowercase().contains("sezon") {
            MediaKind::Series
        } else {
            MediaKind::Movie
        }
    }
}

/// A title as listed in catalogs and search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaSummary {
    pub title: String,
    pub url: String,
    pub poster: Option<String>,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Episode {
    pub name: String,
    pub url: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

/// Everything a detail page says about a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaDetail {
    pub title: String,
    pub url: String,
    pub kind: MediaKind,
    pub poster: Option<String>,
    pub year: Option<i32>,
    pub plot: Option<String>,
    pub tags: Vec<String>,
    pub actors: Vec<Actor>,
    pub recommendations: Vec<MediaSummary>,
    /// Empty for movies.
    pub episodes: Vec<Episode>,
}

/// One alternative player on a detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTab {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    result: Option<Vec<SearchHit>>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: Option<String>,
    poster: Option<String>,
    slug: Option<String>,
    slug_prefix: Option<String>,
}

/// Whitespace-normalized text content of an element.
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `data-src` when present and non-blank, else `src`.
fn lazy_src(element: ElementRef<'_>) -> Option<&str> {
    element
        .value()
        .attr("data-src")
        .filter(|s| !s.trim().is_empty())
        .or_else(|| element.value().attr("src"))
}

fn parse_card(card: ElementRef<'_>, base: &str) -> Option<MediaSummary> {
    let title = card.select(&CARD_TITLE).next().map(text_of)?;
    let href = card.select(&LINK).next()?.value().attr("href");
    let url = absolutize_opt(base, href)?;
    let poster = card
        .select(&IMAGE)
        .next()
        .and_then(|img| absolutize_opt(base, lazy_src(img)));
    let kind = MediaKind::classify(&url, &title);
    Some(MediaSummary {
        title,
        url,
        poster,
        kind,
    })
}

fn parse_cards(html: &Html, selector: &Selector, base: &str) -> Vec<MediaSummary> {
    html.select(selector)
        .filter_map(|card| parse_card(card, base))
        .collect()
}

/// Keep the first occurrence of each URL.
pub fn dedup_by_url(items: Vec<MediaSummary>) -> Vec<MediaSummary> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.url.clone()))
        .collect()
}

/// Poster cards of a catalog or HTML search page.
pub fn parse_catalog(html: &Html, base: &str) -> Vec<MediaSummary> {
    parse_cards(html, &CARD, base)
}

/// Results of the AJAX search endpoint, deduplicated by URL.
///
/// Malformed JSON yields no results.
pub fn parse_search_payload(json: &str, base: &str) -> Vec<MediaSummary> {
    let base = base.trim_end_matches('/');
    let payload: SearchPayload = match serde_json::from_str(json) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "Unparseable search payload");
            return Vec::new();
        }
    };

    let hits = payload.result.unwrap_or_default().into_iter().filter_map(|hit| {
        let title = hit.title?;
        let slug = hit.slug?;
        let url = format!("{base}/{}{slug}", hit.slug_prefix.unwrap_or_default());
        let poster = hit.poster.map(|p| format!("{base}/uploads/poster/{p}"));
        let kind = if url.contains("/dizi/") {
            MediaKind::Series
        } else {
            MediaKind::Movie
        };
        Some(MediaSummary {
            title,
            url,
            poster,
            kind,
        })
    });
    dedup_by_url(hits.collect())
}

/// Parse a detail page. `None` when the page has no title.
pub fn parse_detail(html: &Html, url: &str, base: &str) -> Option<MediaDetail> {
    let title = html.select(&DETAIL_TITLE).next().map(text_of)?;
    let title = title
        .strip_suffix(TITLE_SUFFIX)
        .unwrap_or(&title)
        .trim()
        .to_string();

    let poster = html
        .select(&DETAIL_POSTER)
        .last()
        .and_then(|img| absolutize_opt(base, lazy_src(img)));

    let mut seen = HashSet::new();
    let tags = html
        .select(&DETAIL_TAGS)
        .map(text_of)
        .filter(|tag| seen.insert(tag.clone()))
        .collect();

    let year = html
        .select(&DETAIL_YEAR)
        .next()
        .and_then(|a| text_of(a).parse().ok());

    let plot = html
        .select(&DETAIL_PLOT)
        .next()
        .map(text_of)
        .filter(|p| !p.is_empty());

    let actors = html
        .select(&DETAIL_ACTORS)
        .map(|chip| Actor {
            name: text_of(chip),
            image: chip
                .select(&ACTOR_IMAGE)
                .next()
                .and_then(|img| absolutize_opt(base, img.value().attr("src"))),
        })
        .collect();

    let recommendations = parse_cards(html, &RECOMMENDATIONS, base);

    let is_series = url.contains("/dizi/") || html.select(&SEASON_TABS).next().is_some();
    let (kind, episodes) = if is_series {
        (MediaKind::Series, parse_episodes(html, base))
    } else {
        (MediaKind::Movie, Vec::new())
    };

    Some(MediaDetail {
        title,
        url: url.to_string(),
        kind,
        poster,
        year,
        plot,
        tags,
        actors,
        recommendations,
        episodes,
    })
}

fn parse_episodes(html: &Html, base: &str) -> Vec<Episode> {
    html.select(&EPISODES)
        .filter_map(|item| {
            let url = absolutize_opt(base, item.select(&LINK).next()?.value().attr("href"))?;
            let name = item
                .select(&EPISODE_NAME)
                .next()
                .map(text_of)
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_EPISODE_NAME.to_string());
            let episode = FIRST_NUMBER
                .find(&name)
                .and_then(|m| m.as_str().parse().ok());
            Some(Episode {
                season: season_of(item),
                episode,
                name,
                url,
            })
        })
        .collect()
}

/// Season number from the nearest ancestor whose id contains `season-N`.
fn season_of(item: ElementRef<'_>) -> Option<u32> {
    item.ancestors()
        .filter_map(ElementRef::wrap)
        .filter_map(|ancestor| ancestor.value().id())
        .find_map(|id| {
            let lower = id.to_ascii_lowercase();
            let start = lower.find(SEASON_ID_PREFIX)? + SEASON_ID_PREFIX.len();
            id[start..].parse().ok()
        })
}

/// Source tabs of a detail page, labelled `default_label` when blank.
pub fn parse_source_tabs(html: &Html, base: &str, default_label: &str) -> Vec<SourceTab> {
    html.select(&SOURCE_TABS)
        .filter_map(|tab| {
            let url = absolutize_opt(base, tab.value().attr("href"))?;
            let label = text_of(tab);
            let label = if label.is_empty() {
                default_label.to_string()
            } else {
                label
            };
            Some(SourceTab { label, url })
        })
        .collect()
}

/// Absolute URL of the page's player iframe, `data-src` preferred.
pub fn parse_player_frame(html: &Html, base: &str) -> Option<String> {
    let frame = html.select(&PLAYER_FRAME).next()?;
    let src = lazy_src(frame)?.trim();
    (!src.is_empty()).then(|| absolutize(base, src))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.site.nl";

    const CATALOG: &str = r#"<html><body>
        <div class="poster-container">
            <a href="/film/inception/"><img data-src="/img/inception.jpg" src="/lazy.gif"></a>
            <h2 class="title">Inception</h2>
        </div>
        <div class="card-list-item">
            <a href="https://www.site.nl/dizi/dark/"><img src="//cdn.site/dark.jpg"></a>
            <h3>Dark</h3>
        </div>
        <div class="poster poster-pop">
            <a href="/film/the-office-1-sezon/"></a>
            <h3 class="title">The Office 1. Sezon</h3>
        </div>
        <div class="poster-container"><h3>No link</h3></div>
        <div class="poster-container"><a href="/x/"></a></div>
    </body></html>"#;

    #[test]
    fn catalog_cards() {
        let items = parse_catalog(&Html::parse_document(CATALOG), BASE);
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            MediaSummary {
                title: "Inception".into(),
                url: "https://www.site.nl/film/inception/".into(),
                poster: Some("https://www.site.nl/img/inception.jpg".into()),
                kind: MediaKind::Movie,
            }
        );
        assert_eq!(items[1].kind, MediaKind::Series);
        assert_eq!(items[1].poster.as_deref(), Some("https://cdn.site/dark.jpg"));
        assert_eq!(items[2].kind, MediaKind::Series);
        assert_eq!(items[2].poster, None);
    }

    #[test]
    fn search_payload_builds_urls() {
        let json = r#"{"result":[
            {"title":"Dark","poster":"dark.jpg","slug":"dark/","slug_prefix":"dizi/"},
            {"title":"Dark","poster":"dark.jpg","slug":"dark/","slug_prefix":"dizi/"},
            {"title":"Heat","slug":"heat/"},
            {"poster":"x.jpg","slug":"untitled/"}
        ]}"#;
        let items = parse_search_payload(json, "https://www.site.nl/");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://www.site.nl/dizi/dark/");
        assert_eq!(
            items[0].poster.as_deref(),
            Some("https://www.site.nl/uploads/poster/dark.jpg")
        );
        assert_eq!(items[0].kind, MediaKind::Series);
        assert_eq!(items[1].url, "https://www.site.nl/heat/");
        assert_eq!(items[1].poster, None);
        assert_eq!(items[1].kind, MediaKind::Movie);
    }

    #[test]
    fn search_payload_tolerates_garbage() {
        assert!(parse_search_payload("not json", BASE).is_empty());
        assert!(parse_search_payload(r#"{"result":null}"#, BASE).is_empty());
    }

    const MOVIE: &str = r#"<html><body>
        <div class="card-header"><h1>Inception Filminin Bilgileri</h1></div>
        <img class="img-fluid" src="/img/logo.png">
        <div class="mb-0 lh-lg">
            <div>a</div><div>b</div><div>c</div>
            <div><a href="/yil/2010/">2010</a></div>
            <div><a href="/tur/bilim-kurgu/">Bilim Kurgu</a><a href="/tur/aksiyon/">Aksiyon</a><a href="/tur/aksiyon/">Aksiyon</a></div>
            <div><a class="chip" href="/oyuncu/leo/"><img src="/img/leo.jpg">Leonardo DiCaprio</a></div>
        </div>
        <article class="text-white"><p>  A thief who steals
            corporate secrets. </p></article>
        <img class="img-fluid" data-src="/img/inception-big.jpg">
    </body></html>"#;

    #[test]
    fn movie_detail() {
        let url = "https://www.site.nl/film/inception/";
        let detail = parse_detail(&Html::parse_document(MOVIE), url, BASE).unwrap();
        assert_eq!(detail.title, "Inception");
        assert_eq!(detail.kind, MediaKind::Movie);
        assert_eq!(detail.year, Some(2010));
        assert_eq!(detail.poster.as_deref(), Some("https://www.site.nl/img/inception-big.jpg"));
        assert_eq!(detail.tags, vec!["Bilim Kurgu", "Aksiyon"]);
        assert_eq!(detail.plot.as_deref(), Some("A thief who steals corporate secrets."));
        assert_eq!(
            detail.actors,
            vec![Actor {
                name: "Leonardo DiCaprio".into(),
                image: Some("https://www.site.nl/img/leo.jpg".into()),
            }]
        );
        assert!(detail.episodes.is_empty());
    }

    #[test]
    fn detail_without_title_is_none() {
        let html = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert!(parse_detail(&html, "https://www.site.nl/film/x/", BASE).is_none());
    }

    const SERIES: &str = r#"<html><body>
        <h1>Dark</h1>
        <nav id="seasonsTabs"></nav>
        <div id="seasonsTabs-tabContent">
            <div class="tab-pane" id="season-1">
                <div class="card-list-item"><a href="/dizi/dark/sezon-1/bolum-1/"><h3>1. Bolum</h3></a></div>
                <div class="card-list-item"><a href="/dizi/dark/sezon-1/bolum-2/"><h3>2. Bolum</h3></a></div>
            </div>
            <div class="tab-pane" id="season-2">
                <div class="card-list-item"><a href="/dizi/dark/sezon-2/bolum-1/"></a></div>
            </div>
        </div>
    </body></html>"#;

    #[test]
    fn series_detail_episodes() {
        let url = "https://www.site.nl/series-page/";
        let detail = parse_detail(&Html::parse_document(SERIES), url, BASE).unwrap();
        assert_eq!(detail.kind, MediaKind::Series);
        assert_eq!(detail.episodes.len(), 3);
        assert_eq!(
            detail.episodes[1],
            Episode {
                name: "2. Bolum".into(),
                url: "https://www.site.nl/dizi/dark/sezon-1/bolum-2/".into(),
                season: Some(1),
                episode: Some(2),
            }
        );
        assert_eq!(detail.episodes[2].name, "Bolum");
        assert_eq!(detail.episodes[2].season, Some(2));
        assert_eq!(detail.episodes[2].episode, None);
    }

    #[test]
    fn source_tabs_and_labels() {
        let html = Html::parse_document(
            r#"<nav class="nav card-nav nav-slider">
                <a class="nav-link" href="/film/x/?alternatif=close">Close</a>
                <a class="nav-link" href="/film/x/?alternatif=2"> </a>
                <a class="nav-link">no href</a>
            </nav>"#,
        );
        let tabs = parse_source_tabs(&html, BASE, "FanesMovies");
        assert_eq!(
            tabs,
            vec![
                SourceTab {
                    label: "Close".into(),
                    url: "https://www.site.nl/film/x/?alternatif=close".into(),
                },
                SourceTab {
                    label: "FanesMovies".into(),
                    url: "https://www.site.nl/film/x/?alternatif=2".into(),
                },
            ]
        );
    }

    #[test]
    fn player_frame_prefers_data_src() {
        let html = Html::parse_document(
            r#"<div class="card-video"><iframe data-src="//player.site/embed/1" src="about:blank"></iframe></div>"#,
        );
        assert_eq!(
            parse_player_frame(&html, BASE).as_deref(),
            Some("https://player.site/embed/1")
        );

        let html = Html::parse_document(r#"<iframe src="/video/embed/9/"></iframe>"#);
        assert_eq!(
            parse_player_frame(&html, BASE).as_deref(),
            Some("https://www.site.nl/video/embed/9/")
        );

        assert!(parse_player_frame(&Html::parse_document("<p></p>"), BASE).is_none());
    }
}
