use chrono::{Days, NaiveDate};
use url::Url;

use crate::error::{Result, ScrapeError};

/// Validate the `checkin` query parameter of a search URL.
///
/// The date must be `YYYY-MM-DD` and no earlier than the day after `today`.
/// Callers pass the local calendar date (`chrono::Local::now().date_naive()`).
pub fn validate_checkin(search_url: &str, today: NaiveDate) -> Result<NaiveDate> {
    let url = Url::parse(search_url).map_err(|e| ScrapeError::InvalidCheckin {
        reason: format!("could not parse URL '{search_url}': {e}"),
    })?;

    let raw = url
        .query_pairs()
        .find(|(k, _)| k == "checkin")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| ScrapeError::InvalidCheckin {
            reason: "the \"checkin\" parameter was not found in the URL".into(),
        })?;

    let checkin = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
        ScrapeError::InvalidCheckin {
            reason: format!("invalid checkin date format \"{raw}\", expected YYYY-MM-DD"),
        }
    })?;

    let tomorrow = today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| ScrapeError::InvalidCheckin {
            reason: format!("no calendar day follows {today}"),
        })?;

    if checkin < tomorrow {
        return Err(ScrapeError::InvalidCheckin {
            reason: format!("checkin date ({checkin}) must be on or after tomorrow ({tomorrow})"),
        });
    }

    Ok(checkin)
}

/// Whether the URL carries a `checkin` query parameter at all.
pub fn has_checkin(search_url: &str) -> bool {
    Url::parse(search_url).is_ok_and(|url| url.query_pairs().any(|(k, _)| k == "checkin"))
}

/// Boolean view of [`validate_checkin`]; the diagnostic goes to the log.
pub fn is_valid_checkin(search_url: &str, today: NaiveDate) -> bool {
    match validate_checkin(search_url, today) {
        Ok(checkin) => {
            tracing::info!(%checkin, "Checkin date is valid");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Checkin validation failed");
            false
        }
    }
}
