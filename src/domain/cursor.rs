use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Pagination token understood by Airbnb's search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub section_offset: u32,
    pub items_offset: u64,
    pub version: u32,
}

impl Cursor {
    pub fn for_page(page_index: u32, page_size: u32) -> Self {
        Self {
            section_offset: 0,
            items_offset: u64::from(page_index) * u64::from(page_size),
            version: 1,
        }
    }

    /// base64(JSON)
    pub fn encode(&self) -> String {
        // Serializing three integers cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        STANDARD.encode(json)
    }
}

/// The first page has no cursor at all; Airbnb serves it from the bare URL.
pub fn encode_cursor(page_index: u32, page_size: u32) -> Option<String> {
    if page_index == 0 {
        return None;
    }
    Some(Cursor::for_page(page_index, page_size).encode())
}

pub fn decode_cursor(token: &str) -> Result<Cursor> {
    let bytes = STANDARD.decode(token)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Build the URL for `page_index`, replacing any cursor already present on `base_url`.
pub fn page_url(base_url: &str, page_index: u32, page_size: u32, param: &str) -> Result<String> {
    let Some(token) = encode_cursor(page_index, page_size) else {
        return Ok(base_url.to_string());
    };

    let mut url = Url::parse(base_url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut qp = url.query_pairs_mut();
        qp.clear();
        for (k, v) in &kept {
            qp.append_pair(k, v);
        }
        qp.append_pair(param, &token);
    }
    Ok(url.to_string())
}
