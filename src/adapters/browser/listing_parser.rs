use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::config::types::SelectorConfig;
use crate::domain::listing::ListingRecord;
use crate::error::{Result, ScrapeError};

static ROOM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/rooms/(\d+)").expect("valid regex"));
static RATING_WITH_REVIEWS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+[,.]\d+)\s*\((\d[\d.,]*)\)").expect("valid regex"));
static RATING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d(?:[,.]\d+)?)\s+(?:de|out of|of)\s+5\b").expect("valid regex")
});
static PARENTHESIZED_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d[\d.,]*)\)").expect("valid regex"));
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.]*(?:,\d+)?").expect("valid regex"));

/// Fields read from one listing node, before it gets a position.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedListing {
    pub room_id: Option<String>,
    pub title: Option<String>,
    pub total_reviews: Option<u32>,
    pub score: Option<f64>,
    pub price: Option<f64>,
    pub availables_count: Option<u32>,
}

impl ExtractedListing {
    pub fn into_record(self, position: u32) -> ListingRecord {
        ListingRecord {
            room_id: self.room_id,
            title: self.title,
            total_reviews: self.total_reviews,
            score: self.score,
            price: self.price,
            availables_count: self.availables_count,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// Listing nodes present in the snapshot, including dropped ones.
    pub node_count: usize,
    pub listings: Vec<ExtractedListing>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub score: Option<f64>,
    pub reviews: Option<u32>,
}

/// The two card layouts Airbnb uses for the rating line, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingLayout {
    /// Star icon followed by text like `4,85 (213)`.
    IconSibling,
    /// Score inside an `aria-label` such as `4,85 de 5`, review count in a
    /// separate `(213)` element.
    AriaLabel,
}

impl RatingLayout {
    pub const PRIORITY: [Self; 2] = [Self::IconSibling, Self::AriaLabel];

    /// The first layout whose marker the card carries. Later layouts are
    /// never consulted once an earlier marker is present.
    pub fn detect(node: ElementRef<'_>, parser: &ListingParser) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|layout| layout.is_present(node, parser))
    }

    pub fn is_present(self, node: ElementRef<'_>, parser: &ListingParser) -> bool {
        match self {
            Self::IconSibling => parser.rating_icons(node).next().is_some(),
            Self::AriaLabel => node.select(&parser.rating_label).next().is_some(),
        }
    }

    pub fn extract(self, node: ElementRef<'_>, parser: &ListingParser) -> Option<Rating> {
        match self {
            Self::IconSibling => parser.rating_icons(node).find_map(|icon| {
                let sibling_text = text_after(icon);
                let parent_text = icon
                    .parent()
                    .and_then(ElementRef::wrap)
                    .map(|p| p.text().collect::<String>())
                    .unwrap_or_default();
                [sibling_text, parent_text]
                    .iter()
                    .find_map(|text| parse_rating_text(text))
            }),
            Self::AriaLabel => {
                let score = node
                    .select(&parser.rating_label)
                    .filter_map(|el| el.value().attr("aria-label"))
                    .find_map(parse_rating_label);
                let reviews = node
                    .select(&parser.review_count)
                    .find_map(|el| parse_parenthesized_count(&el.text().collect::<String>()));
                if score.is_none() && reviews.is_none() {
                    return None;
                }
                Some(Rating { score, reviews })
            }
        }
    }
}

/// Compiled selectors for turning a rendered search page into listings.
pub struct ListingParser {
    listing: Selector,
    name_meta: Selector,
    url_meta: Selector,
    room_link: Selector,
    rating_icon: Selector,
    rating_label: Selector,
    review_count: Selector,
    price: Selector,
    price_button: Selector,
    span: Selector,
    currency_marker: String,
}

fn compile(name: &str, css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| {
        ScrapeError::Config(format!("invalid CSS selector for selectors.{name} ('{css}'): {e}"))
    })
}

impl ListingParser {
    pub fn new(selectors: &SelectorConfig, currency_marker: &str) -> Result<Self> {
        Ok(Self {
            listing: compile("listing", &selectors.listing)?,
            name_meta: compile("name_meta", &selectors.name_meta)?,
            url_meta: compile("url_meta", &selectors.url_meta)?,
            room_link: compile("room_link", &selectors.room_link)?,
            rating_icon: compile("rating_icon", &selectors.rating_icon)?,
            rating_label: compile("rating_label", &selectors.rating_label)?,
            review_count: compile("review_count", &selectors.review_count)?,
            price: compile("price", &selectors.price)?,
            price_button: compile("price_button", &selectors.price_button)?,
            span: compile("span", "span")?,
            currency_marker: currency_marker.to_string(),
        })
    }

    /// Extract every listing of the snapshot, in document order.
    pub fn parse_page(&self, html: &str, available: Option<u32>) -> ExtractedPage {
        let document = Html::parse_document(html);
        let mut node_count = 0;
        let mut listings = Vec::new();

        for node in document.select(&self.listing) {
            node_count += 1;
            if let Some(listing) = self.parse_listing(node, available) {
                listings.push(listing);
            } else {
                tracing::debug!(index = node_count - 1, "Skipping listing node without name or room id");
            }
        }

        ExtractedPage {
            node_count,
            listings,
        }
    }

    /// `None` only when the node carries neither a name nor a room id.
    pub fn parse_listing(&self, node: ElementRef<'_>, available: Option<u32>) -> Option<ExtractedListing> {
        let title = node
            .select(&self.name_meta)
            .find_map(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let room_id = node
            .select(&self.url_meta)
            .filter_map(|el| el.value().attr("content"))
            .chain(
                node.select(&self.room_link)
                    .filter_map(|el| el.value().attr("href")),
            )
            .find_map(extract_room_id);

        if title.is_none() && room_id.is_none() {
            return None;
        }

        let rating = RatingLayout::detect(node, self).and_then(|layout| layout.extract(node, self));

        Some(ExtractedListing {
            room_id,
            title,
            total_reviews: rating.and_then(|r| r.reviews),
            score: rating.and_then(|r| r.score),
            price: self.extract_price(node),
            availables_count: available,
        })
    }

    /// Rating icons of a card. Icons inside buttons (the favourites heart)
    /// are controls, not rating markers.
    fn rating_icons<'a>(&'a self, node: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        node.select(&self.rating_icon).filter(|icon| {
            !icon
                .ancestors()
                .filter_map(|n| n.value().as_element())
                .any(|el| el.name() == "button")
        })
    }

    fn extract_price(&self, node: ElementRef<'_>) -> Option<f64> {
        let marker = self.currency_marker.as_str();

        let dedicated = node
            .select(&self.price)
            .map(|el| el.text().collect::<String>())
            .find(|text| !text.trim().is_empty());
        if let Some(price) = dedicated.and_then(|text| parse_price(&text, marker)) {
            return Some(price);
        }

        node.select(&self.price_button)
            .flat_map(|button| button.select(&self.span))
            .map(|span| span.text().collect::<String>())
            .find(|text| text.trim_start().starts_with(marker))
            .and_then(|text| parse_price(&text, marker))
    }
}

/// Text of the nodes following `el` under the same parent.
fn text_after(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for sibling in el.next_siblings() {
        match sibling.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(sibling) {
                    out.extend(child.text());
                }
            }
            _ => {}
        }
    }
    out
}

pub fn extract_room_id(url: &str) -> Option<String> {
    ROOM_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse "4,85 (213)" → score 4.85, 213 reviews.
pub fn parse_rating_text(text: &str) -> Option<Rating> {
    let caps = RATING_WITH_REVIEWS.captures(text)?;
    Some(Rating {
        score: caps.get(1).and_then(|m| parse_score(m.as_str())),
        reviews: caps.get(2).and_then(|m| parse_digits(m.as_str())),
    })
}

/// Score out of an accessibility label: "Avaliação média de 4,85 de 5" -> 4.85.
/// Labels that do not read as "<score> de/out of 5" carry no score.
pub fn parse_rating_label(label: &str) -> Option<f64> {
    RATING_LABEL
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_score(m.as_str()))
}

/// Decimal comma or dot; anything outside the 0-5 star range is rejected.
fn parse_score(raw: &str) -> Option<f64> {
    let score = raw.replace(',', ".").parse::<f64>().ok()?;
    (0.0..=5.0).contains(&score).then_some(score)
}

fn parse_parenthesized_count(text: &str) -> Option<u32> {
    PARENTHESIZED_COUNT
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_digits(m.as_str()))
}

fn parse_digits(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u32>().ok()
}

/// Normalize a Brazilian-formatted price: "R$ 1.234,56" → 1234.56.
pub fn parse_price(text: &str, currency_marker: &str) -> Option<f64> {
    let without_marker = text.replace(currency_marker, "");
    let amount = AMOUNT.find(&without_marker)?;
    let normalized = amount.as_str().replace('.', "").replace(',', ".");
    let price = normalized.parse::<f64>().ok()?;
    (price >= 0.0).then_some(price)
}
