#![no_main]
use airbnb_page_scraper::domain::cursor::{decode_cursor, page_url};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode_cursor(text);
        let _ = page_url(text, 3, 18, "cursor");
    }
});
