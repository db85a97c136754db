#![no_main]
use airbnb_page_scraper::adapters::browser::listing_parser::{
    extract_room_id, parse_price, parse_rating_text,
};
use airbnb_page_scraper::domain::available_count::CountRules;
use airbnb_page_scraper::config::types::ReadinessConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_price(text, "R$");
        if let Some(rating) = parse_rating_text(text) {
            assert!(rating.score.is_none_or(|s| (0.0..=5.0).contains(&s)));
        }
        let _ = extract_room_id(text);

        let cfg = ReadinessConfig::default();
        let _ = CountRules::new(&cfg.threshold_phrases, cfg.threshold_count).parse(text);
    }
});
