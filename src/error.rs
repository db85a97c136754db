use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page evaluation failed: {0}")]
    Evaluation(String),

    #[error("Invalid request: {reason}")]
    InvalidParams { reason: String },

    #[error("Invalid checkin date: {reason}")]
    InvalidCheckin { reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ScrapeError {
    /// Errors caused by the caller's input rather than by the browser or the site.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParams { .. } | Self::InvalidCheckin { .. } | Self::Url(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
