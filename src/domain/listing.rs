use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScrapeError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub room_id: Option<String>,
    pub title: Option<String>,
    pub total_reviews: Option<u32>,
    pub score: Option<f64>,
    pub price: Option<f64>,
    pub availables_count: Option<u32>,
    /// 1-based rank across the whole search, not just this page.
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub base_url: String,
    pub page_index: u32,
}

impl PageRequest {
    pub fn new(base_url: &str, page_index: u32) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(ScrapeError::InvalidParams {
                reason: "airbnbUrl is required".into(),
            });
        }
        let parsed = Url::parse(trimmed)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidParams {
                reason: format!("unsupported URL scheme '{}'", parsed.scheme()),
            });
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            page_index,
        })
    }

    /// Position of the first record on this page. Pages whose last position
    /// would not fit in a `u32` are rejected as invalid input.
    pub fn first_position(&self, page_size: u32) -> Result<u32> {
        self.page_index
            .checked_add(1)
            .and_then(|pages| pages.checked_mul(page_size))
            .map(|_| self.page_index * page_size + 1)
            .ok_or_else(|| ScrapeError::InvalidParams {
                reason: format!("page {} is out of range", self.page_index),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeOutcome {
    /// The expected number of listings rendered before extraction.
    Complete,
    /// Extraction ran on fewer listings than the header promised.
    Partial,
    NoResults,
    HeaderMissing,
    TimedOut,
    Failed,
}

impl ScrapeOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Complete | Self::Partial | Self::NoResults)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub requested_url: String,
    pub page_index: u32,
    pub outcome: ScrapeOutcome,
    pub available_accommodations_count: Option<u32>,
    pub element_text: Option<String>,
    pub loaded_listings_count: usize,
    pub accommodations: Vec<ListingRecord>,
}

impl PageResult {
    fn empty(
        requested_url: String,
        page_index: u32,
        outcome: ScrapeOutcome,
        available: Option<u32>,
        element_text: String,
    ) -> Self {
        Self {
            requested_url,
            page_index,
            outcome,
            available_accommodations_count: available,
            element_text: Some(element_text),
            loaded_listings_count: 0,
            accommodations: Vec::new(),
        }
    }

    pub fn no_results(requested_url: String, page_index: u32, message: String) -> Self {
        Self::empty(requested_url, page_index, ScrapeOutcome::NoResults, Some(0), message)
    }

    pub fn header_missing(requested_url: String, page_index: u32, selector: &str) -> Self {
        Self::empty(
            requested_url,
            page_index,
            ScrapeOutcome::HeaderMissing,
            None,
            format!("Error: available-count selector \"{selector}\" not found"),
        )
    }

    pub fn timed_out(requested_url: String, page_index: u32, waited_ms: u128) -> Self {
        Self::empty(
            requested_url,
            page_index,
            ScrapeOutcome::TimedOut,
            None,
            format!("Timed out after {waited_ms} ms waiting for listings or a no-results message"),
        )
    }

    pub fn failed(requested_url: String, page_index: u32, message: &str) -> Self {
        Self::empty(
            requested_url,
            page_index,
            ScrapeOutcome::Failed,
            Some(0),
            format!("Unexpected failure: {message}"),
        )
    }
}

impl std::fmt::Display for ListingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {}",
            self.position,
            self.title.as_deref().unwrap_or("(untitled)")
        )?;
        if let Some(ref id) = self.room_id {
            write!(f, " [room {id}]")?;
        }
        if let Some(price) = self.price {
            write!(f, " | {price:.2}")?;
        }
        if let Some(score) = self.score {
            write!(f, " | {score:.2}*")?;
            if let Some(reviews) = self.total_reviews {
                write!(f, " ({reviews} reviews)")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for PageResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "URL: {}", self.requested_url)?;
        writeln!(f, "Outcome: {:?}", self.outcome)?;
        if let Some(ref text) = self.element_text {
            writeln!(f, "Header text: {text}")?;
        }
        if self.loaded_listings_count == 0 {
            writeln!(f, "No accommodations were loaded for this search.")?;
            return Ok(());
        }
        match self.available_accommodations_count {
            Some(n) => writeln!(f, "Available (header): {n}")?,
            None => writeln!(f, "Available (header): unknown")?,
        }
        writeln!(f, "Loaded on page: {}", self.loaded_listings_count)?;
        for record in &self.accommodations {
            writeln!(f, "  {record}")?;
        }
        Ok(())
    }
}
