use reqwest::blocking::Client;
use thiserror::Error;
use tracing::info;

pub const PRICING_URL: &str =
    "https://azure.microsoft.com/en-us/pricing/details/virtual-machines/linux/";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("pricing page request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("pricing page returned an empty body")]
    EmptyBody,
}

/// Source of the raw pricing-page HTML. The pipeline only sees this trait;
/// tests substitute a stub.
pub trait PageFetcher {
    fn fetch_page(&self) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher for the live pricing page.
pub struct HttpFetcher {
    url: String,
    client: Client,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        HttpFetcher {
            url: url.into(),
            client: Client::new(),
        }
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_page(&self) -> Result<String, FetchError> {
        info!("Fetching pricing page: {}", self.url);
        let body = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .text()?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(body)
    }
}
