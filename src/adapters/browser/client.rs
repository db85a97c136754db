use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::adapters::browser::listing_parser::ListingParser;
use crate::adapters::browser::readiness::{Readiness, ReadinessWaiter};
use crate::config::types::{ReadinessConfig, ScraperConfig, SelectorConfig};
use crate::domain::available_count::CountRules;
use crate::domain::cursor;
use crate::domain::listing::{PageRequest, PageResult, ScrapeOutcome};
use crate::error::{Result, ScrapeError};
use crate::ports::browser::{BrowserLauncher, PageSession};

/// Scrapes one search-results page per call, each in its own browser session.
pub struct PageScraper {
    launcher: Arc<dyn BrowserLauncher>,
    parser: ListingParser,
    rules: CountRules,
    scraper: ScraperConfig,
    readiness: ReadinessConfig,
    selectors: SelectorConfig,
    sessions: Semaphore,
}

impl PageScraper {
    pub fn new(
        launcher: Arc<dyn BrowserLauncher>,
        scraper: ScraperConfig,
        readiness: ReadinessConfig,
        selectors: SelectorConfig,
        max_sessions: usize,
    ) -> Result<Self> {
        let parser = ListingParser::new(&selectors, &scraper.currency_marker)?;
        let rules = CountRules::new(&readiness.threshold_phrases, readiness.threshold_count);
        Ok(Self {
            launcher,
            parser,
            rules,
            scraper,
            readiness,
            selectors,
            sessions: Semaphore::new(max_sessions.max(1)),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.scraper.page_size
    }

    /// URL actually loaded for `request`: the base URL, plus a cursor after page 0.
    pub fn target_url(&self, request: &PageRequest) -> Result<String> {
        cursor::page_url(
            &request.base_url,
            request.page_index,
            self.scraper.page_size,
            &self.scraper.cursor_param,
        )
    }

    /// Only failing to start a browser is an error. Everything that goes wrong
    /// once a page is open is folded into the returned [`PageResult`].
    pub async fn scrape_page(&self, request: &PageRequest) -> Result<PageResult> {
        let first = request.first_position(self.scraper.page_size)?;
        let url = self.target_url(request)?;

        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|e| ScrapeError::Browser(format!("session pool closed: {e}")))?;

        info!(url, page = request.page_index, "Starting scrape");
        let session = self.launcher.launch().await?;

        let result = match self.scrape_in_session(session.as_ref(), request, &url, first).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, url, "Unexpected failure while scraping page");
                PageResult::failed(url.clone(), request.page_index, &e.to_string())
            }
        };

        if let Err(e) = session.close().await {
            warn!(error = %e, "Failed to close browser session");
        }

        info!(
            outcome = ?result.outcome,
            loaded = result.loaded_listings_count,
            records = result.accommodations.len(),
            "Scrape finished"
        );
        Ok(result)
    }

    async fn scrape_in_session(
        &self,
        session: &dyn PageSession,
        request: &PageRequest,
        url: &str,
        first: u32,
    ) -> Result<PageResult> {
        session.navigate(url).await?;
        debug!("Page loaded, waiting for readiness");

        let page_size = usize::try_from(self.scraper.page_size).unwrap_or(usize::MAX);
        let waiter = ReadinessWaiter::new(&self.readiness, &self.selectors, &self.rules, page_size);

        let (available, header_text, complete) = match waiter.wait(session).await? {
            Readiness::Empty { message } => {
                return Ok(PageResult::no_results(url.to_string(), request.page_index, message));
            }
            Readiness::TimedOut { waited } => {
                return Ok(PageResult::timed_out(
                    url.to_string(),
                    request.page_index,
                    waited.as_millis(),
                ));
            }
            Readiness::HeaderMissing => {
                return Ok(PageResult::header_missing(
                    url.to_string(),
                    request.page_index,
                    &self.selectors.available_count,
                ));
            }
            Readiness::Extracted {
                available,
                header_text,
                complete,
                ..
            } => (available, header_text, complete),
        };

        let html = session.html().await?;
        let extracted = self.parser.parse_page(&html, available.value);
        info!(
            nodes = extracted.node_count,
            records = extracted.listings.len(),
            "Extracted listings"
        );

        let accommodations = extracted
            .listings
            .into_iter()
            .zip(first..=u32::MAX)
            .map(|(listing, position)| listing.into_record(position))
            .collect();

        Ok(PageResult {
            requested_url: url.to_string(),
            page_index: request.page_index,
            outcome: if complete {
                ScrapeOutcome::Complete
            } else {
                ScrapeOutcome::Partial
            },
            available_accommodations_count: available.value,
            element_text: Some(header_text),
            loaded_listings_count: extracted.node_count,
            accommodations,
        })
    }
}
