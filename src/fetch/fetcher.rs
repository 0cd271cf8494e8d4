//! Image fetcher: resolves image references to bytes plus MIME type, with
//! its own bounded retry, independent of the generation retry path.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::cache::ImageCache;
use crate::error::{AppError, Result};
use crate::orchestrator::request::ImageSource;

/// A resolved image: raw bytes plus MIME type
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1500),
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

pub struct ImageFetcher {
    client: Client,
    cache: ImageCache,
    config: FetcherConfig,
}

impl ImageFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            cache: ImageCache::new(config.cache_ttl),
            config,
        })
    }

    /// Resolve an image reference, consulting the cache first. A cache hit
    /// returns without any network or filesystem access.
    pub async fn fetch(&self, source: &ImageSource) -> Result<FetchedImage> {
        let key = source.reference().to_string();
        if let Some(image) = self.cache.get(&key) {
            debug!(source = %source, "image cache hit");
            return Ok(image);
        }

        let mut attempt = 0u32;
        let image = loop {
            match self.fetch_once(source).await {
                Ok(image) => break image,
                Err(err) if attempt < self.config.max_retries => {
                    let delay = backoff_delay(attempt, self.config.base_delay);
                    warn!(
                        source = %source,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "image fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        self.cache.insert(key, image.clone());
        Ok(image)
    }

    async fn fetch_once(&self, source: &ImageSource) -> Result<FetchedImage> {
        match source {
            ImageSource::Url(url) => self.fetch_remote(url).await,
            ImageSource::Path(path) => self.fetch_local(path).await,
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<FetchedImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("GET {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Fetch(format!(
                "GET {}: status {}",
                url,
                response.status()
            )));
        }

        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Fetch(format!("GET {}: {}", url, e)))?
            .to_vec();

        // An octet-stream content type is no better than no header; prefer
        // the magic bytes in that case.
        let mime = header_mime
            .filter(|mime| mime.starts_with("image/"))
            .or_else(|| sniff_mime(&bytes).map(String::from))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        debug!(url = %url, size = bytes.len(), mime = %mime, "fetched remote image");
        Ok(FetchedImage { bytes, mime })
    }

    async fn fetch_local(&self, path: &str) -> Result<FetchedImage> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Fetch(format!("read {}: {}", path, e)))?;

        let mime = sniff_mime(&bytes)
            .unwrap_or("application/octet-stream")
            .to_string();

        debug!(path = %path, size = bytes.len(), mime = %mime, "read local image");
        Ok(FetchedImage { bytes, mime })
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

/// `base * 2^attempt`, capped at 30s
fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let millis = (base.as_millis() as u64).saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(millis.min(30_000))
}

/// Detect image MIME type from magic bytes
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    // BMP: BM
    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    None
}
