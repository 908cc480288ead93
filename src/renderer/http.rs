use async_trait::async_trait;
use log::debug;

use super::PageRenderer;
use crate::{RenderError, requests::RequestClient, text::visible_text};

/// Fetches the page over plain HTTP and extracts its visible text.
///
/// Nothing is executed, so a page that builds its calendar with script (or
/// sits behind a script challenge) never gets past the interstitial here.
pub struct HttpRenderer {
    client: RequestClient,
    page_url: String,
}

impl HttpRenderer {
    pub fn new(client: RequestClient, page_url: &str) -> Self {
        Self {
            client,
            page_url: page_url.to_string(),
        }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn fetch_rendered_text(&mut self) -> Result<String, RenderError> {
        let response = self.client.fetch_url_response(&self.page_url).await?;
        let status = response.status();
        // Challenge pages are served with 403/503; their text is still worth classifying.
        if !status.is_success() && !matches!(status.as_u16(), 403 | 503) {
            return Err(RenderError::Status(status));
        }
        let body = response.text().await?;
        debug!("Fetched {} bytes from {} ({status})", body.len(), self.page_url);
        Ok(visible_text(&body))
    }
}
