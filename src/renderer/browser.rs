use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, info, warn};
use thirtyfour::prelude::*;

use super::PageRenderer;
use crate::RenderError;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const INNER_TEXT_SCRIPT: &str = "return document.body ? document.body.innerText : ''";

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub webdriver_url: String,
    pub headless: bool,
    pub page_load_timeout: Duration,
    /// Where to write a PNG of the page after every fetch.
    pub screenshot_path: Option<PathBuf>,
}

/// Renders the page in a real Chrome session driven over WebDriver.
pub struct BrowserRenderer {
    driver: Option<WebDriver>,
    page_url: String,
    screenshot_path: Option<PathBuf>,
    navigated: bool,
}

impl BrowserRenderer {
    pub async fn launch(page_url: &str, settings: &BrowserSettings) -> anyhow::Result<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }
        caps.add_arg("--disable-blink-features=AutomationControlled")?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--window-size=1920,1080")?;
        caps.add_arg(&format!("--user-agent={DESKTOP_USER_AGENT}"))?;

        let driver = WebDriver::new(settings.webdriver_url.as_str(), caps)
            .await
            .with_context(|| {
                format!(
                    "could not start a browser session at {}",
                    settings.webdriver_url
                )
            })?;
        driver
            .set_page_load_timeout(settings.page_load_timeout)
            .await
            .context("could not set page load timeout")?;
        info!("Browser session started via {}", settings.webdriver_url);

        Ok(Self {
            driver: Some(driver),
            page_url: page_url.to_string(),
            screenshot_path: settings.screenshot_path.clone(),
            navigated: false,
        })
    }

    fn driver(&self) -> Result<&WebDriver, RenderError> {
        self.driver.as_ref().ok_or(RenderError::Released)
    }

    async fn inner_text(&self) -> Result<String, RenderError> {
        let ret = self.driver()?.execute(INNER_TEXT_SCRIPT, Vec::new()).await?;
        Ok(ret.json().as_str().unwrap_or_default().to_string())
    }

    async fn save_screenshot(&self) {
        let Some(path) = &self.screenshot_path else {
            return;
        };
        let Ok(driver) = self.driver() else {
            return;
        };
        match driver.screenshot_as_png().await {
            Ok(png) => match tokio::fs::write(path, &png).await {
                Ok(()) => debug!("Screenshot saved to {}", path.display()),
                Err(e) => warn!("Could not write screenshot to {}: {e}", path.display()),
            },
            Err(e) => warn!("Could not capture screenshot: {e}"),
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn fetch_rendered_text(&mut self) -> Result<String, RenderError> {
        let driver = self.driver()?;
        if self.navigated {
            debug!("Reloading {}", self.page_url);
            driver.refresh().await?;
        } else {
            info!("Opening {}", self.page_url);
            driver.goto(&self.page_url).await?;
            self.navigated = true;
        }
        let text = self.inner_text().await?;
        self.save_screenshot().await;
        Ok(text)
    }

    async fn resample_text(&mut self) -> Result<String, RenderError> {
        self.inner_text().await
    }

    async fn release(&mut self) -> Result<(), RenderError> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
            info!("Browser session closed");
        }
        Ok(())
    }
}
