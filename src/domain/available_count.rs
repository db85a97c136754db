use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,.]*").expect("valid regex"));

/// How the header text was turned into a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    /// A configured "over 1,000" style phrase matched.
    Threshold,
    /// The first numeric run of the text.
    Numeric,
    /// Neither matched; the count is unknown.
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailableCount {
    pub value: Option<u32>,
    pub source: CountSource,
}

/// Rules for reading the "N places" header of a search page.
#[derive(Debug, Clone)]
pub struct CountRules {
    phrases: Vec<String>,
    threshold: u32,
}

impl CountRules {
    pub fn new(phrases: &[String], threshold: u32) -> Self {
        Self {
            phrases: phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            threshold,
        }
    }

    pub fn parse(&self, header_text: &str) -> AvailableCount {
        let lower = header_text.to_lowercase();
        if self.phrases.iter().any(|p| contains_phrase(&lower, p)) {
            return AvailableCount {
                value: Some(self.threshold),
                source: CountSource::Threshold,
            };
        }

        let value = FIRST_NUMBER.find(header_text).and_then(|m| {
            let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        });

        match value {
            Some(n) => AvailableCount {
                value: Some(n),
                source: CountSource::Numeric,
            },
            None => {
                tracing::warn!(
                    header_text,
                    "Available-count header matched no threshold phrase and holds no number"
                );
                AvailableCount {
                    value: None,
                    source: CountSource::Unrecognized,
                }
            }
        }
    }
}

/// Whole-word containment: "mil" matches "mais de mil" but not "família".
fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
