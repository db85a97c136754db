//! One-shot scrape of the search URL named by an environment variable.

use chrono::NaiveDate;

use crate::domain::checkin;
use crate::domain::listing::{PageRequest, PageResult};
use crate::error::{Result, ScrapeError};

/// Build the request for a one-shot run from the value of `var`.
///
/// Unlike the HTTP endpoint, a valid `checkin` parameter is mandatory, and
/// pages whose positions do not fit are rejected before any browser starts.
pub fn request_from_env(
    var: &str,
    value: Option<String>,
    page: u32,
    page_size: u32,
    today: NaiveDate,
) -> Result<PageRequest> {
    let raw = value.ok_or_else(|| ScrapeError::InvalidParams {
        reason: format!("environment variable {var} is not set"),
    })?;
    let request = PageRequest::new(&raw, page)?;
    request.first_position(page_size)?;
    let checkin = checkin::validate_checkin(&request.base_url, today)?;
    tracing::info!(%checkin, url = %request.base_url, page, "Search URL accepted");
    Ok(request)
}

/// Process exit status for a finished run: zero only for usable outcomes.
pub fn exit_status(result: &PageResult) -> u8 {
    if result.outcome.is_success() { 0 } else { 1 }
}
