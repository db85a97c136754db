use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::config::types::ReadinessConfig;
use crate::error::{Result, ScrapeError};
use crate::ports::browser::{BrowserLauncher, PageSession};

/// Browser session backed by static HTML snapshots.
///
/// Every `count` call moves on to the next snapshot (staying on the last one),
/// which stands in for a page that keeps rendering while it is polled.
#[derive(Clone)]
pub struct FixtureSession {
    snapshots: Arc<Vec<String>>,
    current: Arc<Mutex<usize>>,
    navigated: Arc<Mutex<Option<String>>>,
    closed: Arc<AtomicBool>,
    navigation_error: Option<String>,
    failing_queries: bool,
}

impl FixtureSession {
    pub fn new(snapshots: Vec<String>) -> Self {
        assert!(!snapshots.is_empty(), "fixture needs at least one snapshot");
        Self {
            snapshots: Arc::new(snapshots),
            current: Arc::new(Mutex::new(0)),
            navigated: Arc::new(Mutex::new(None)),
            closed: Arc::new(AtomicBool::new(false)),
            navigation_error: None,
            failing_queries: false,
        }
    }

    #[must_use]
    pub fn failing_navigation(mut self, message: &str) -> Self {
        self.navigation_error = Some(message.to_string());
        self
    }

    #[must_use]
    pub fn failing_queries(mut self) -> Self {
        self.failing_queries = true;
        self
    }

    fn snapshot(&self) -> String {
        let idx = *self.current.lock().unwrap();
        self.snapshots[idx].clone()
    }

    fn advance(&self) {
        let mut idx = self.current.lock().unwrap();
        if *idx + 1 < self.snapshots.len() {
            *idx += 1;
        }
    }

    fn check_queries(&self) -> Result<()> {
        if self.failing_queries {
            return Err(ScrapeError::Evaluation(
                "Execution context was destroyed".into(),
            ));
        }
        Ok(())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::Evaluation(format!("{e}")))
}

#[async_trait]
impl PageSession for FixtureSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        *self.navigated.lock().unwrap() = Some(url.to_string());
        match self.navigation_error {
            Some(ref message) => Err(ScrapeError::Navigation(message.clone())),
            None => Ok(()),
        }
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        self.check_queries()?;
        let selector = parse_selector(selector)?;
        let n = Html::parse_document(&self.snapshot())
            .select(&selector)
            .count();
        self.advance();
        Ok(n)
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        self.check_queries()?;
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&self.snapshot());
        Ok(document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string()))
    }

    async fn html(&self) -> Result<String> {
        self.check_queries()?;
        Ok(self.snapshot())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FixtureLauncher {
    session: Option<FixtureSession>,
    launch_error: Option<String>,
}

impl FixtureLauncher {
    pub fn new(session: FixtureSession) -> Self {
        Self {
            session: Some(session),
            launch_error: None,
        }
    }

    pub fn unavailable(message: &str) -> Self {
        Self {
            session: None,
            launch_error: Some(message.to_string()),
        }
    }

    pub fn navigated(&self) -> Option<String> {
        self.session
            .as_ref()
            .and_then(|s| s.navigated.lock().unwrap().clone())
    }

    pub fn closed(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.closed.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl BrowserLauncher for FixtureLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        match (&self.session, &self.launch_error) {
            (_, Some(message)) => Err(ScrapeError::Browser(message.clone())),
            (Some(session), None) => Ok(Box::new(session.clone())),
            (None, None) => Err(ScrapeError::Browser("no fixture session".into())),
        }
    }
}

/// Millisecond-scale timeouts so readiness tests finish quickly.
pub fn fast_readiness() -> ReadinessConfig {
    ReadinessConfig {
        signal_timeout_ms: 200,
        header_timeout_ms: 60,
        listings_timeout_ms: 60,
        poll_interval_ms: 5,
        ..ReadinessConfig::default()
    }
}

/// Page still loading: neither listings nor the empty-results heading.
pub fn shell_page() -> String {
    "<html><head></head><body><main><div>Carregando...</div></main></body></html>".into()
}

/// Empty search, with the heading nested as deep as Airbnb renders it.
pub fn no_results_page(message: &str) -> String {
    let open = "<div>".repeat(10);
    let close = "</div>".repeat(10);
    format!(
        "<html><head></head><body><main>{open}<section><h1>{message}</h1></section>{close}</main></body></html>"
    )
}

pub fn listing_page_with(cards: &[String]) -> String {
    format!(
        "<html><head></head><body><main>{}</main></body></html>",
        cards.concat()
    )
}

/// Search page with an optional "N places" header and `listings` icon-layout cards.
pub fn listing_page(header: Option<&str>, listings: usize) -> String {
    let cards: Vec<String> = (0..listings)
        .map(|i| {
            icon_card(
                &(1000 + i).to_string(),
                &format!("Acomodação {i}"),
                "4,85 (12)",
                "R$ 1.234,56",
            )
        })
        .collect();
    let page = listing_page_with(&cards);
    match header {
        Some(text) => page.replace(
            "<main>",
            &format!("<main><h1><span>Busca</span><span>{text}</span></h1>"),
        ),
        None => page,
    }
}

/// Card with a leading favourites heart, a star icon followed by "4,85 (213)", and the
/// price inside a button.
pub fn icon_card(room_id: &str, title: &str, rating: &str, price: &str) -> String {
    format!(
        r#"<div itemprop="itemListElement">
            <meta itemprop="name" content="{title}">
            <meta itemprop="url" content="www.airbnb.com.br/rooms/{room_id}?adults=2">
            <button type="button" aria-label="Adicionar aos favoritos"><span aria-hidden="true"><svg viewBox="0 0 32 32"></svg></span></button>
            <div><span aria-hidden="true"><svg viewBox="0 0 32 32"></svg> {rating}</span></div>
            <button type="button"><span>{price}</span><span>noite</span></button>
        </div>"#
    )
}

/// Card with the score in an aria-label and the price in the dedicated price row.
pub fn aria_card(room_id: &str, title: &str, score: &str, reviews: &str, price: &str) -> String {
    format!(
        r#"<div itemprop="itemListElement">
            <meta itemprop="name" content="{title}">
            <meta itemprop="url" content="www.airbnb.com.br/rooms/{room_id}">
            <div><span role="img" aria-label="Avaliação média de {score} de 5"></span><span>({reviews})</span></div>
            <div data-testid="price-availability-row"><span>{price}</span></div>
        </div>"#
    )
}

/// Card with nothing but the given identity fields.
pub fn minimal_card(room_id: Option<&str>, title: Option<&str>) -> String {
    let name = title
        .map(|t| format!(r#"<meta itemprop="name" content="{t}">"#))
        .unwrap_or_default();
    let url = room_id
        .map(|id| format!(r#"<meta itemprop="url" content="www.airbnb.com.br/rooms/{id}">"#))
        .unwrap_or_default();
    format!(r#"<div itemprop="itemListElement">{name}{url}<span>Novo</span></div>"#)
}
