#![no_main]
use std::sync::LazyLock;

use airbnb_page_scraper::adapters::browser::listing_parser::ListingParser;
use airbnb_page_scraper::config::types::SelectorConfig;
use libfuzzer_sys::fuzz_target;

static PARSER: LazyLock<ListingParser> = LazyLock::new(|| {
    ListingParser::new(&SelectorConfig::default(), "R$").expect("default selectors compile")
});

fuzz_target!(|data: &[u8]| {
    if let Ok(html) = std::str::from_utf8(data) {
        let page = PARSER.parse_page(html, Some(1000));
        assert!(page.listings.len() <= page.node_count);
    }
});
