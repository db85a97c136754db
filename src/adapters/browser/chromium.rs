use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::types::BrowserConfig;
use crate::error::{Result, ScrapeError};
use crate::ports::browser::{BrowserLauncher, PageSession};

/// Launches a fresh headless Chrome for every scrape.
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn cdp_config(&self) -> Result<CdpBrowserConfig> {
        let mut builder = CdpBrowserConfig::builder()
            .window_size(self.config.viewport_width, self.config.viewport_height)
            .args(self.config.extra_args.iter().map(String::as_str));
        if !self.config.headless {
            builder = builder.with_head();
        }
        if self.config.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref exe) = self.config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }
        builder.build().map_err(ScrapeError::Browser)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        let (mut browser, mut handler) = Browser::launch(self.cdp_config()?)
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to launch Chrome: {e}")))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler stopped");
                    break;
                }
            }
        });

        let page = match prepare_page(&browser, &self.config).await {
            Ok(page) => page,
            Err(e) => {
                // Don't leak the Chrome process if page setup fails.
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser after setup error");
                }
                handle.abort();
                return Err(e);
            }
        };

        debug!("Browser session ready");
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler: handle,
            navigation_timeout: self.config.navigation_timeout(),
        }))
    }
}

async fn prepare_page(browser: &Browser, config: &BrowserConfig) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ScrapeError::Browser(e.to_string()))?;

    let user_agent = SetUserAgentOverrideParams::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .map_err(ScrapeError::Browser)?;
    page.execute(user_agent)
        .await
        .map_err(|e| ScrapeError::Browser(e.to_string()))?;

    let viewport = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(config.viewport_width))
        .height(i64::from(config.viewport_height))
        .device_scale_factor(1.0)
        .mobile(false)
        .build()
        .map_err(ScrapeError::Browser)?;
    page.execute(viewport)
        .await
        .map_err(|e| ScrapeError::Browser(e.to_string()))?;

    Ok(page)
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromiumSession {
    async fn eval_string(&self, script: String) -> Result<String> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Evaluation(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| ScrapeError::Evaluation(e.to_string()))
    }
}

/// Quote a selector as a JS string literal.
fn js_literal(selector: &str) -> String {
    serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".into())
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::Navigation(e.to_string())),
            Err(_) => Err(ScrapeError::Navigation(format!(
                "navigation to {url} timed out after {}s",
                self.navigation_timeout.as_secs()
            ))),
        }
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let script = format!(
            "String(document.querySelectorAll({}).length)",
            js_literal(selector)
        );
        let raw = self.eval_string(script).await?;
        raw.parse::<usize>()
            .map_err(|e| ScrapeError::Evaluation(format!("unexpected count '{raw}': {e}")))
    }

    async fn text_content(&self, selector: &str) -> Result<Option<String>> {
        // Null does not survive `into_value`, so the result travels as JSON text.
        let script = format!(
            "(() => {{ const el = document.querySelector({}); return JSON.stringify(el ? el.textContent.trim() : null); }})()",
            js_literal(selector)
        );
        let raw = self.eval_string(script).await?;
        Ok(serde_json::from_str::<Option<String>>(&raw)?)
    }

    async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| ScrapeError::Evaluation(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let Self {
            mut browser,
            page,
            handler,
            ..
        } = *self;

        if let Err(e) = page.close().await {
            debug!(error = %e, "Failed to close page");
        }
        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| ScrapeError::Browser(e.to_string()));
        if let Err(e) = browser.wait().await {
            debug!(error = %e, "Failed to reap browser process");
        }
        handler.abort();
        debug!("Browser session closed");
        closed
    }
}
