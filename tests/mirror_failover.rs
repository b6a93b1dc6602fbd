//! End-to-end mirror failover, refresh and stream resolution against
//! local mock mirrors.
//!
//! Every mirror is a `wiremock` server; the real HTTP client talks to them
//! over loopback.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fanes::site::{FanesProvider, MediaProvider};
use fanes::{
    AcceleratedClient, ContentType, Error, LinkEvent, MirrorRegistry, ResilientFetcher,
    SiteConfig, StreamSource, SubtitleTrack,
};

const CHALLENGE: &str = r#"<html><head><title>Just a moment...</title></head>
<body><script src="/cdn-cgi/challenge-platform/h/b/orchestrate/jsch/v1"></script></body></html>"#;

/// Packed player configuration whose `file_link` base64-decodes to
/// `https://cdn.example/hls/master.m3u8`, followed by unpacked tracks.
const PLAYER_SCRIPT: &str = r#"eval(function(p,a,c,k,e,d){e=function(c){return c};if(!''.replace(/^/,String)){while(c--){d[c]=k[c]||c}k=[function(e){return d[e]}];e=function(){return'\\w+'};c=1};while(c--){if(k[c]){p=p.replace(new RegExp('\\b'+e(c)+'\\b','g'),k[c])}}return p}('0 1=2.3("4");file_link="5";',10,6,'var|player|jwplayer|setup|vid|aHR0cHM6Ly9jZG4uZXhhbXBsZS9obHMvbWFzdGVyLm0zdTg='.split('|'),0,{}))
var config = {tracks: [{"file":"/subs/tr.vtt","label":"Turkce","kind":"captions"},{"file":"/thumbs.vtt","kind":"thumbnails"}]};"#;

struct Mirrors {
    servers: Vec<MockServer>,
    list: MockServer,
}

impl Mirrors {
    async fn start(count: usize) -> Self {
        let mut servers = Vec::new();
        for _ in 0..count {
            servers.push(MockServer::start().await);
        }
        Self {
            servers,
            list: MockServer::start().await,
        }
    }

    fn uri(&self, index: usize) -> String {
        self.servers[index].uri()
    }

    fn fetcher(&self) -> ResilientFetcher {
        let registry = MirrorRegistry::new(
            self.servers.iter().map(MockServer::uri),
            "HDFilmCehennemi",
            format!("{}/eklenti_domainleri.txt", self.list.uri()),
            Duration::from_secs(900),
        )
        .unwrap();
        let client = AcceleratedClient::new().unwrap();
        ResilientFetcher::new(Arc::new(client), Arc::new(registry))
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn serve(server: &MockServer, route: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fails_over_to_third_mirror_and_promotes_it() {
    let mirrors = Mirrors::start(3).await;
    serve(&mirrors.servers[0], "/film/x/", html(CHALLENGE), 1).await;
    serve(
        &mirrors.servers[1],
        "/film/x/",
        ResponseTemplate::new(403)
            .insert_header("cf-mitigated", "challenge")
            .set_body_string(CHALLENGE),
        1,
    )
    .await;
    serve(&mirrors.servers[2], "/film/x/", html("<h1>Inception</h1>"), 1).await;
    serve(&mirrors.servers[2], "/film/y/", html("<h1>Heat</h1>"), 1).await;
    serve(&mirrors.servers[0], "/film/y/", html("<h1>Heat</h1>"), 0).await;

    let fetcher = mirrors.fetcher();
    let document = fetcher.fetch_document("/film/x/", None).await.unwrap();
    assert_eq!(document.url, format!("{}/film/x/", mirrors.uri(2)));
    assert!(document.body.contains("Inception"));
    assert_eq!(fetcher.base_url().await, mirrors.uri(2));

    // The promoted mirror is tried first from now on.
    fetcher.fetch_document("/film/y/", None).await.unwrap();
    assert_eq!(
        fetcher.mirrors().candidates().await,
        vec![mirrors.uri(2), mirrors.uri(0), mirrors.uri(1)]
    );
}

#[tokio::test]
async fn all_challenges_fail_with_fixed_message() {
    let mirrors = Mirrors::start(2).await;
    for server in &mirrors.servers {
        serve(server, "/film/x/", html(CHALLENGE), 1).await;
    }

    let err = mirrors
        .fetcher()
        .fetch_document("/film/x/", None)
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::LoadFailure(_)));
    assert_eq!(err.to_string(), "Site challenge blocked request");
}

#[tokio::test]
async fn exhaustion_reports_last_http_error() {
    let mirrors = Mirrors::start(2).await;
    serve(&mirrors.servers[0], "/film/x/", html(CHALLENGE), 1).await;
    serve(&mirrors.servers[1], "/film/x/", ResponseTemplate::new(502), 1).await;

    let err = mirrors
        .fetcher()
        .fetch_document("/film/x/", None)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("HTTP 502"));
}

#[tokio::test]
async fn remote_list_is_fetched_once_per_interval() {
    let mirrors = Mirrors::start(2).await;
    let preferred = mirrors.uri(1);
    Mock::given(method("GET"))
        .and(path("/eklenti_domainleri.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "|Dizipal: https://dizipal.example\n|HDFilmCehennemi: {preferred}/\n"
        )))
        .expect(1)
        .mount(&mirrors.list)
        .await;
    serve(&mirrors.servers[1], "/", html("<h1>home</h1>"), 2).await;
    serve(&mirrors.servers[0], "/", html("<h1>home</h1>"), 0).await;

    let fetcher = mirrors.fetcher();
    fetcher.fetch_document("/", None).await.unwrap();
    fetcher.fetch_document("/", None).await.unwrap();
    assert_eq!(fetcher.base_url().await, preferred);
}

#[tokio::test]
async fn referer_defaults_to_primary() {
    let mirrors = Mirrors::start(1).await;
    let referer = format!("{}/", mirrors.uri(0));
    Mock::given(method("GET"))
        .and(path("/film/x/"))
        .and(header("referer", referer.as_str()))
        .and(header("accept-language", "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7"))
        .respond_with(html("<h1>ok</h1>"))
        .expect(1)
        .mount(&mirrors.servers[0])
        .await;

    mirrors
        .fetcher()
        .fetch_document("/film/x/", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn search_endpoint_skips_challenges() {
    let mirrors = Mirrors::start(2).await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(html(CHALLENGE))
        .expect(1)
        .mount(&mirrors.servers[0])
        .await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("query=dark"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"result":[{"title":"Dark","slug":"dark/","slug_prefix":"dizi/"}]}"#),
        )
        .expect(1)
        .mount(&mirrors.servers[1])
        .await;

    let fetcher = mirrors.fetcher();
    let payload = fetcher.fetch_search_payload("dark").await.unwrap();
    assert!(payload.contains("\"result\""));
    assert_eq!(fetcher.base_url().await, mirrors.uri(1));
}

#[tokio::test]
async fn resolves_packed_player_behind_failover() {
    let mirrors = Mirrors::start(2).await;
    let a = mirrors.uri(0);
    let b = mirrors.uri(1);

    serve(&mirrors.servers[0], "/film/inception/", html(CHALLENGE), 1).await;
    serve(
        &mirrors.servers[1],
        "/film/inception/",
        html(&format!(
            r#"<div class="card-video"><iframe data-src="{a}/video/embed/abc/"></iframe></div>"#
        )),
        1,
    )
    .await;
    // The frame points at the first mirror, which 404s on it; the same
    // path on the second mirror serves the player.
    serve(
        &mirrors.servers[1],
        "/video/embed/abc/",
        html(&format!("<html><body><script>{PLAYER_SCRIPT}</script></body></html>")),
        1,
    )
    .await;

    let config = SiteConfig::default();
    let provider = FanesProvider::new(Arc::new(mirrors.fetcher()), &config);
    let links = provider
        .resolve_links(&format!("{a}/film/inception/"))
        .await
        .unwrap();

    assert!(links.found);
    assert_eq!(
        links.events,
        vec![
            LinkEvent::Stream(StreamSource {
                source: "FanesMovies".into(),
                url: "https://cdn.example/hls/master.m3u8".into(),
                content_type: ContentType::Hls,
                referer: Some(format!("{b}/")),
            }),
            LinkEvent::Subtitle(SubtitleTrack {
                label: "Turkce".into(),
                url: format!("{b}/subs/tr.vtt"),
            }),
        ]
    );
}
