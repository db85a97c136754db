use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::types::{ReadinessConfig, SelectorConfig};
use crate::domain::available_count::{AvailableCount, CountRules};
use crate::error::Result;
use crate::ports::browser::PageSession;

/// Terminal states of the readiness wait.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    /// The page rendered the "no results" heading.
    Empty { message: String },
    /// Neither a listing nor the "no results" heading appeared in time.
    TimedOut { waited: Duration },
    /// Listings appeared but the available-count header never did.
    HeaderMissing,
    /// Extraction may run. `complete` is false when fewer than `expected`
    /// listings rendered before the listings timeout.
    Extracted {
        available: AvailableCount,
        header_text: String,
        expected: usize,
        rendered: usize,
        complete: bool,
    },
}

enum Signal {
    Listings,
    NoResults(String),
}

/// Decides when a freshly navigated search page can be extracted.
pub struct ReadinessWaiter<'a> {
    config: &'a ReadinessConfig,
    selectors: &'a SelectorConfig,
    rules: &'a CountRules,
    page_size: usize,
}

impl<'a> ReadinessWaiter<'a> {
    pub fn new(
        config: &'a ReadinessConfig,
        selectors: &'a SelectorConfig,
        rules: &'a CountRules,
        page_size: usize,
    ) -> Self {
        Self {
            config,
            selectors,
            rules,
            page_size,
        }
    }

    /// Only session failures are returned as errors; every timeout is a state.
    pub async fn wait(&self, session: &dyn PageSession) -> Result<Readiness> {
        let signal = self.await_signal(session).await?;
        match signal {
            None => {
                let waited = self.config.signal_timeout();
                warn!(
                    waited_ms = waited.as_millis(),
                    "No listings and no empty-results message appeared"
                );
                return Ok(Readiness::TimedOut { waited });
            }
            Some(Signal::NoResults(message)) => {
                info!(message, "Search returned no accommodations");
                return Ok(Readiness::Empty { message });
            }
            Some(Signal::Listings) => debug!("First listing rendered"),
        }

        let header_sel = self.selectors.available_count.as_str();
        let header_text = poll_until(
            self.config.header_timeout(),
            self.config.poll_interval(),
            move || async move { session.text_content(header_sel).await },
        )
        .await?;

        let Some(header_text) = header_text else {
            warn!(
                selector = header_sel,
                "Available-count header not found, giving up on this page"
            );
            return Ok(Readiness::HeaderMissing);
        };

        let available = self.rules.parse(&header_text);
        info!(
            header_text,
            available = ?available.value,
            source = ?available.source,
            "Read available-count header"
        );

        let listing_sel = self.selectors.listing.as_str();
        let expected = match available.value {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX).min(self.page_size),
            _ => 0,
        };

        if expected == 0 {
            let rendered = session.count(listing_sel).await?;
            return Ok(Readiness::Extracted {
                available,
                header_text,
                expected,
                rendered,
                complete: true,
            });
        }

        debug!(expected, "Waiting for listings to render");
        let reached = poll_until(
            self.config.listings_timeout(),
            self.config.poll_interval(),
            move || async move {
                let n = session.count(listing_sel).await?;
                Ok((n >= expected).then_some(n))
            },
        )
        .await?;

        let (rendered, complete) = match reached {
            Some(n) => (n, true),
            None => {
                let n = session.count(listing_sel).await?;
                warn!(
                    expected,
                    rendered = n,
                    "Listings did not finish rendering, extracting what is there"
                );
                (n, false)
            }
        };

        Ok(Readiness::Extracted {
            available,
            header_text,
            expected,
            rendered,
            complete,
        })
    }

    async fn await_signal(&self, session: &dyn PageSession) -> Result<Option<Signal>> {
        let listing_sel = self.selectors.listing.as_str();
        let no_results_sel = self.selectors.no_results.as_str();
        poll_until(
            self.config.signal_timeout(),
            self.config.poll_interval(),
            move || async move {
                // The empty-results heading wins if both happen to be present.
                if let Some(message) = session.text_content(no_results_sel).await? {
                    return Ok(Some(Signal::NoResults(message)));
                }
                if session.count(listing_sel).await? > 0 {
                    return Ok(Some(Signal::Listings));
                }
                Ok(None)
            },
        )
        .await
    }
}

/// Run `check` until it yields `Some`, or give up with `None` once `timeout` elapses.
/// The check always runs at least once.
pub async fn poll_until<T, F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = check().await? {
            return Ok(Some(value));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(None);
        }
        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}
