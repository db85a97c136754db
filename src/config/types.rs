use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on browser sessions alive at the same time.
    #[serde(default = "default_max_sessions")]
    pub max_concurrent_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_concurrent_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_true")]
    pub no_sandbox: bool,
    #[serde(default = "default_chrome_args")]
    pub extra_args: Vec<String>,
    #[serde(default)]
    pub chrome_executable: Option<String>,
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            headless: true,
            no_sandbox: true,
            extra_args: default_chrome_args(),
            chrome_executable: None,
            navigation_timeout_secs: default_navigation_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_cursor_param")]
    pub cursor_param: String,
    #[serde(default = "default_currency_marker")]
    pub currency_marker: String,
    /// Environment variable read by the standalone `once` mode.
    #[serde(default = "default_url_env")]
    pub url_env: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            cursor_param: default_cursor_param(),
            currency_marker: default_currency_marker(),
            url_env: default_url_env(),
        }
    }
}

/// Per-phase bounds of the readiness wait, plus the header-count rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_signal_timeout")]
    pub signal_timeout_ms: u64,
    #[serde(default = "default_header_timeout")]
    pub header_timeout_ms: u64,
    #[serde(default = "default_listings_timeout")]
    pub listings_timeout_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_threshold_phrases")]
    pub threshold_phrases: Vec<String>,
    #[serde(default = "default_threshold_count")]
    pub threshold_count: u32,
}

impl ReadinessConfig {
    pub fn signal_timeout(&self) -> Duration {
        Duration::from_millis(self.signal_timeout_ms)
    }

    pub fn header_timeout(&self) -> Duration {
        Duration::from_millis(self.header_timeout_ms)
    }

    pub fn listings_timeout(&self) -> Duration {
        Duration::from_millis(self.listings_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            signal_timeout_ms: default_signal_timeout(),
            header_timeout_ms: default_header_timeout(),
            listings_timeout_ms: default_listings_timeout(),
            poll_interval_ms: default_poll_interval(),
            threshold_phrases: default_threshold_phrases(),
            threshold_count: default_threshold_count(),
        }
    }
}

/// CSS selectors for the search results page. Airbnb reshuffles its markup
/// often, so all of them can be overridden from `config.yaml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorConfig {
    #[serde(default = "default_listing_selector")]
    pub listing: String,
    #[serde(default = "default_no_results_selector")]
    pub no_results: String,
    #[serde(default = "default_available_count_selector")]
    pub available_count: String,
    #[serde(default = "default_name_meta_selector")]
    pub name_meta: String,
    #[serde(default = "default_url_meta_selector")]
    pub url_meta: String,
    #[serde(default = "default_room_link_selector")]
    pub room_link: String,
    #[serde(default = "default_rating_icon_selector")]
    pub rating_icon: String,
    #[serde(default = "default_rating_label_selector")]
    pub rating_label: String,
    #[serde(default = "default_review_count_selector")]
    pub review_count: String,
    #[serde(default = "default_price_selector")]
    pub price: String,
    #[serde(default = "default_price_button_selector")]
    pub price_button: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing: default_listing_selector(),
            no_results: default_no_results_selector(),
            available_count: default_available_count_selector(),
            name_meta: default_name_meta_selector(),
            url_meta: default_url_meta_selector(),
            room_link: default_room_link_selector(),
            rating_icon: default_rating_icon_selector(),
            rating_label: default_rating_label_selector(),
            review_count: default_review_count_selector(),
            price: default_price_selector(),
            price_button: default_price_button_selector(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_max_sessions() -> usize {
    2
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
}

fn default_viewport_width() -> u32 {
    1440
}

fn default_viewport_height() -> u32 {
    900
}

fn default_true() -> bool {
    true
}

fn default_chrome_args() -> Vec<String> {
    vec![
        "--disable-setuid-sandbox".into(),
        "--disable-web-security".into(),
        "--disable-gpu".into(),
        "--disable-dev-shm-usage".into(),
    ]
}

fn default_navigation_timeout() -> u64 {
    60
}

fn default_page_size() -> u32 {
    18
}

fn default_cursor_param() -> String {
    "cursor".into()
}

fn default_currency_marker() -> String {
    "R$".into()
}

fn default_url_env() -> String {
    "AIRBNB_URL".into()
}

fn default_signal_timeout() -> u64 {
    30_000
}

fn default_header_timeout() -> u64 {
    15_000
}

fn default_listings_timeout() -> u64 {
    20_000
}

fn default_poll_interval() -> u64 {
    250
}

fn default_threshold_phrases() -> Vec<String> {
    vec![
        "over 1,000".into(),
        "more than 1,000".into(),
        "mais de 1.000".into(),
        "mil".into(),
    ]
}

fn default_threshold_count() -> u32 {
    1000
}

fn default_listing_selector() -> String {
    r#"div[itemprop="itemListElement"]"#.into()
}

fn default_no_results_selector() -> String {
    "main div div div div div div div div div div section h1".into()
}

fn default_available_count_selector() -> String {
    "h1 span:nth-child(2)".into()
}

fn default_name_meta_selector() -> String {
    r#"meta[itemprop="name"]"#.into()
}

fn default_url_meta_selector() -> String {
    r#"meta[itemprop="url"]"#.into()
}

fn default_room_link_selector() -> String {
    r#"a[href*="/rooms/"]"#.into()
}

fn default_rating_icon_selector() -> String {
    r#"span[aria-hidden="true"] svg"#.into()
}

fn default_rating_label_selector() -> String {
    r#"span[role="img"][aria-label]"#.into()
}

fn default_review_count_selector() -> String {
    "span".into()
}

fn default_price_selector() -> String {
    r#"[data-testid="price-availability-row"] span"#.into()
}

fn default_price_button_selector() -> String {
    r#"button[type="button"]"#.into()
}
