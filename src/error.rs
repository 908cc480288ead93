use std::time::Duration;

/// The renderer could not produce page text this cycle.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("browser session failed: {0}")]
    Browser(#[from] thirtyfour::error::WebDriverError),
    #[error("page request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("page responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("renderer did not answer within {0:?}")]
    Timeout(Duration),
    #[error("renderer has already been released")]
    Released,
}

/// An alert could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notification rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}
