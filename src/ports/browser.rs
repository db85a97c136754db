use async_trait::async_trait;

use crate::error::Result;

/// One page of a launched browser, owned by a single scrape.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Number of elements currently matching `selector` in the live DOM.
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Trimmed text content of the first match, `None` when nothing matches.
    async fn text_content(&self, selector: &str) -> Result<Option<String>>;

    /// Serialized snapshot of the rendered document.
    async fn html(&self) -> Result<String>;

    /// Release the page and its browser process.
    async fn close(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSession>>;
}
