use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Resolution failed: {0}")]
    Resolution(String),
    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Network operations needed to fetch a memory (allows mocking for tests)
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    /// POST to a resolution endpoint and return the raw response body
    async fn resolve(&self, download_link: &Url) -> Result<Vec<u8>, DownloadError>;
    /// GET media bytes
    async fn fetch(&self, media_url: &Url) -> Result<Vec<u8>, DownloadError>;
}

/// Production transport over reqwest.
///
/// No timeouts are configured beyond the client's defaults.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        HttpTransport { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaTransport for HttpTransport {
    async fn resolve(&self, download_link: &Url) -> Result<Vec<u8>, DownloadError> {
        debug!("HttpTransport: Resolving {}", download_link);

        let response = self
            .client
            .post(download_link.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch(&self, media_url: &Url) -> Result<Vec<u8>, DownloadError> {
        debug!("HttpTransport: Fetching {}", media_url);

        let response = self
            .client
            .get(media_url.clone())
            .send()
            .await?
            .error_for_status()?;

        let data = response.bytes().await?.to_vec();
        debug!("HttpTransport: Received {} bytes", data.len());
        Ok(data)
    }
}

/// Shared, cloneable handle to the transport used by download workers
#[derive(Clone)]
pub struct MediaClient {
    transport: Arc<dyn MediaTransport>,
}

impl std::fmt::Debug for MediaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaClient")
            .field("transport", &"<dyn MediaTransport>")
            .finish()
    }
}

impl MediaClient {
    /// Client backed by real HTTP
    pub fn http() -> Self {
        Self::from_transport(Arc::new(HttpTransport::new()))
    }

    pub fn from_transport(transport: Arc<dyn MediaTransport>) -> Self {
        MediaClient { transport }
    }

    /// Turn a resolution endpoint into the real media URL.
    ///
    /// The endpoint answers with the URL as plain text.
    pub async fn resolve_media_url(&self, download_link: &Url) -> Result<Url, DownloadError> {
        let body = self.transport.resolve(download_link).await?;

        let text = String::from_utf8(body).map_err(|_| {
            DownloadError::Resolution(format!("non-UTF-8 response from {}", download_link))
        })?;
        let text = text.trim();

        Url::parse(text).map_err(|e| {
            DownloadError::Resolution(format!(
                "response from {} is not a URL ({}): {:?}",
                download_link, e, text
            ))
        })
    }

    pub async fn fetch(&self, media_url: &Url) -> Result<Vec<u8>, DownloadError> {
        self.transport.fetch(media_url).await
    }
}
