use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use airbnb_page_scraper::adapters::browser::client::PageScraper;
use airbnb_page_scraper::config::load_config;
use airbnb_page_scraper::config::types::Config;
use airbnb_page_scraper::error::{Result, ScrapeError};
use airbnb_page_scraper::http::server::{AppState, ScrapeResponse, router};
use airbnb_page_scraper::ports::browser::{BrowserLauncher, PageSession};

/// Search page served as a fixed set of answers keyed on the configured selectors.
struct ScriptedPage {
    header: Option<&'static str>,
    no_results: Option<&'static str>,
    cards: usize,
}

impl ScriptedPage {
    fn html(&self) -> String {
        let cards: String = (0..self.cards)
            .map(|i| {
                format!(
                    r#"<div itemprop="itemListElement">
                        <meta itemprop="name" content="Casa {i}">
                        <meta itemprop="url" content="www.airbnb.com.br/rooms/{}">
                        <div><span role="img" aria-label="4,9 de 5"></span><span>(1.204)</span></div>
                        <div data-testid="price-availability-row"><span>R$ 2.000,00</span></div>
                    </div>"#,
                    500 + i
                )
            })
            .collect();
        format!("<html><head></head><body><main>{cards}</main></body></html>")
    }
}

struct ScriptedSession {
    page: Arc<ScriptedPage>,
    config: Config,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn navigate(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        if selector == self.config.selectors.listing {
            Ok(self.page.cards)
        } else {
            Ok(0)
        }
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        let selectors = &self.config.selectors;
        if selector == selectors.no_results {
            Ok(self.page.no_results.map(String::from))
        } else if selector == selectors.available_count {
            Ok(self.page.header.map(String::from))
        } else {
            Ok(None)
        }
    }

    async fn html(&self) -> Result<String> {
        Ok(self.page.html())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedLauncher {
    page: Option<Arc<ScriptedPage>>,
    config: Config,
    launches: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let Some(ref page) = self.page else {
            return Err(ScrapeError::Browser("failed to launch Chrome".into()));
        };
        Ok(Box::new(ScriptedSession {
            page: Arc::clone(page),
            config: self.config.clone(),
            closes: Arc::clone(&self.closes),
        }))
    }
}

fn fast_config() -> Config {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        r"
readiness:
  signal_timeout_ms: 100
  header_timeout_ms: 30
  listings_timeout_ms: 30
  poll_interval_ms: 5
",
    )
    .unwrap();
    load_config(&path).unwrap()
}

fn app_for(page: Option<ScriptedPage>) -> (axum::Router, Arc<ScriptedLauncher>) {
    let config = fast_config();
    let launcher = Arc::new(ScriptedLauncher {
        page: page.map(Arc::new),
        config: config.clone(),
        launches: AtomicUsize::new(0),
        closes: Arc::new(AtomicUsize::new(0)),
    });
    let scraper = PageScraper::new(
        Arc::clone(&launcher) as Arc<dyn BrowserLauncher>,
        config.scraper,
        config.readiness,
        config.selectors,
        config.server.max_concurrent_sessions,
    )
    .unwrap();
    let app = router(AppState {
        scraper: Arc::new(scraper),
    });
    (app, launcher)
}

async fn post(app: axum::Router, body: serde_json::Value) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::post("/scrape")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

const SEARCH: &str = "https://www.airbnb.com.br/s/Florian%C3%B3polis/homes?adults=2";

#[tokio::test]
async fn full_page_round_trip() {
    let (app, launcher) = app_for(Some(ScriptedPage {
        header: Some("Mais de 1.000 acomodações"),
        no_results: None,
        cards: 18,
    }));

    let (status, bytes) = post(app, serde_json::json!({ "airbnbUrl": SEARCH, "page": 1 })).await;
    assert_eq!(status, StatusCode::OK);

    let body: ScrapeResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.page, 1);
    assert_eq!(body.available_accommodations_count, Some(1000));
    assert_eq!(body.loaded_listings_count, 18);
    assert_eq!(body.data.len(), 18);

    let positions: Vec<u32> = body.data.iter().map(|r| r.position).collect();
    assert_eq!(positions, (19..=36).collect::<Vec<_>>());

    let first = &body.data[0];
    assert_eq!(first.room_id.as_deref(), Some("500"));
    assert_eq!(first.title.as_deref(), Some("Casa 0"));
    assert_eq!(first.score, Some(4.9));
    assert_eq!(first.total_reviews, Some(1204));
    assert_eq!(first.price, Some(2000.0));
    assert_eq!(first.availables_count, Some(1000));

    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_search_is_ok_with_zero_available() {
    let (app, launcher) = app_for(Some(ScriptedPage {
        header: None,
        no_results: Some("Nenhum resultado exato"),
        cards: 0,
    }));

    let (status, bytes) = post(app, serde_json::json!({ "airbnbUrl": SEARCH })).await;
    assert_eq!(status, StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["outcome"], "no_results");
    assert_eq!(body["availableAccommodationsCount"], 0);
    assert_eq!(body["elementText"], "Nenhum resultado exato");
    assert_eq!(body["data"], serde_json::json!([]));
    assert_eq!(body["requestedPageUrl"], SEARCH);
    assert_eq!(launcher.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_header_reports_selector() {
    let (app, _) = app_for(Some(ScriptedPage {
        header: None,
        no_results: None,
        cards: 4,
    }));

    let (status, bytes) = post(app, serde_json::json!({ "airbnbUrl": SEARCH })).await;
    assert_eq!(status, StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["outcome"], "header_missing");
    assert!(body["availableAccommodationsCount"].is_null());
    assert!(body["elementText"].as_str().unwrap().contains("h1 span:nth-child(2)"));
}

#[tokio::test]
async fn invalid_input_never_launches_a_browser() {
    for body in [
        serde_json::json!({}),
        serde_json::json!({ "airbnbUrl": "" }),
        serde_json::json!({ "airbnbUrl": "airbnb florianopolis" }),
        serde_json::json!({ "airbnbUrl": "ftp://www.airbnb.com.br/s/Rio/homes" }),
        serde_json::json!({ "airbnbUrl": format!("{SEARCH}&checkin=10-01-2030") }),
        serde_json::json!({ "airbnbUrl": SEARCH, "page": 4_000_000_000_u32 }),
        serde_json::json!({ "airbnbUrl": SEARCH, "page": -1 }),
        serde_json::json!({ "airbnbUrl": 5 }),
    ] {
        let (app, launcher) = app_for(Some(ScriptedPage {
            header: Some("3 acomodações"),
            no_results: None,
            cards: 3,
        }));
        let (status, bytes) = post(app, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        let err: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(err["error"].is_string());
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn launch_failure_is_500() {
    let (app, _) = app_for(None);
    let (status, bytes) = post(app, serde_json::json!({ "airbnbUrl": SEARCH })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(err["error"].as_str().unwrap().contains("failed to launch Chrome"));
}
