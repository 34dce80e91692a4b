use async_trait::async_trait;
use memfetch::download::{DownloadError, MediaTransport};
use reqwest::Url;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory transport for testing
///
/// Resolution endpoints and media URLs are registered up front; anything
/// unregistered fails like a network error. Counts every call and the peak
/// number of concurrent calls.
#[derive(Default)]
pub struct MockTransport {
    resolutions: Mutex<HashMap<String, Vec<u8>>>,
    media: Mutex<HashMap<String, Vec<u8>>>,
    posts: Mutex<Vec<String>>,
    gets: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` so calls overlap
    pub fn with_delay(delay: Duration) -> Self {
        MockTransport {
            delay,
            ..Self::default()
        }
    }

    /// POST to `link` answers with `body`
    pub fn add_resolution(&self, link: &str, body: &[u8]) {
        self.resolutions
            .lock()
            .unwrap()
            .insert(link.to_string(), body.to_vec());
    }

    /// GET `url` answers with `data`
    pub fn add_media(&self, url: &str, data: &[u8]) {
        self.media
            .lock()
            .unwrap()
            .insert(url.to_string(), data.to_vec());
    }

    /// Register a link that resolves to a media URL serving `data`
    pub fn add_indirect(&self, link: &str, media_url: &str, data: &[u8]) {
        self.add_resolution(link, media_url.as_bytes());
        self.add_media(media_url, data);
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.posts().len() + self.gets().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn respond(
        &self,
        url: &Url,
        log: &Mutex<Vec<String>>,
        table: &Mutex<HashMap<String, Vec<u8>>>,
    ) -> Result<Vec<u8>, DownloadError> {
        log.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = table.lock().unwrap().get(url.as_str()).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        response.ok_or_else(|| DownloadError::Transport(format!("no route to {}", url)))
    }
}

#[async_trait]
impl MediaTransport for MockTransport {
    async fn resolve(&self, download_link: &Url) -> Result<Vec<u8>, DownloadError> {
        self.respond(download_link, &self.posts, &self.resolutions)
            .await
    }

    async fn fetch(&self, media_url: &Url) -> Result<Vec<u8>, DownloadError> {
        self.respond(media_url, &self.gets, &self.media).await
    }
}
