//! Sources of rendered page text.
//!
//! A renderer is a stateful session: it is acquired once before the first
//! cycle, sampled repeatedly, and released when monitoring stops.

mod browser;
mod http;

use async_trait::async_trait;

use crate::RenderError;

pub use browser::{BrowserRenderer, BrowserSettings};
pub use http::HttpRenderer;

#[async_trait]
pub trait PageRenderer: Send {
    /// Loads (or reloads) the monitored page and returns its visible text.
    async fn fetch_rendered_text(&mut self) -> Result<String, RenderError>;

    /// Returns the current visible text without navigating.
    async fn resample_text(&mut self) -> Result<String, RenderError> {
        self.fetch_rendered_text().await
    }

    /// Tears the session down. Later calls on the renderer may fail.
    async fn release(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

#[async_trait]
impl<T: PageRenderer + ?Sized> PageRenderer for Box<T> {
    async fn fetch_rendered_text(&mut self) -> Result<String, RenderError> {
        (**self).fetch_rendered_text().await
    }

    async fn resample_text(&mut self) -> Result<String, RenderError> {
        (**self).resample_text().await
    }

    async fn release(&mut self) -> Result<(), RenderError> {
        (**self).release().await
    }
}
