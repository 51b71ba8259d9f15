//! Tidal-mirror HTTP client
//!
//! The catalog is served by several community mirrors with identical APIs;
//! requests walk the mirror list in order and take the first host that
//! answers successfully. Artwork is not served by the mirrors at all - it
//! comes straight from the upstream CDN, addressed by the cover UUID.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::adapter;
use super::dto;
use crate::providers::AudioSourceApi;
use crate::providers::domain::{AlbumInfo, ProviderError, TrackHit, TrackManifest};

/// Default mirror hosts, tried in order
const DEFAULT_MIRRORS: &[&str] = &[
    "https://triton.squid.wtf",
    "https://vogel.qqdl.site",
    "https://tidal.kinoplus.online",
    "https://tidal-api.binimum.org",
];

/// Artwork CDN; cover UUIDs map to a path by replacing '-' with '/'
const ARTWORK_BASE: &str = "https://resources.tidal.com/images";

/// Artwork size variant fetched for embedding (640x640 is the "lg" variant)
const ARTWORK_SIZE: &str = "640x640";

/// Tidal-mirror API client
pub struct HifiClient {
    http_client: reqwest::Client,
    mirrors: Vec<String>,
}

const USER_AGENT: &str = concat!("mixcrate/", env!("CARGO_PKG_VERSION"));

impl HifiClient {
    /// Create a client using the default mirror list.
    pub fn new() -> Self {
        Self::with_mirrors(DEFAULT_MIRRORS.iter().map(|s| s.to_string()).collect())
    }

    /// Create a client with a custom mirror list (first entry tried first).
    pub fn with_mirrors(mirrors: Vec<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            mirrors,
        }
    }

    /// GET `path` with `params`, walking the mirror list until one host
    /// returns a success status. Only the last failure is reported.
    async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let mut last_error = ProviderError::Network("no mirrors configured".to_string());

        for mirror in &self.mirrors {
            let url = format!("{mirror}{path}");
            let response = match self.http_client.get(&url).query(params).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!(mirror = %mirror, error = %e, "mirror unreachable");
                    last_error = ProviderError::Network(e.to_string());
                    continue;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                last_error = ProviderError::RateLimited { retry_after };
                continue;
            }
            if !status.is_success() {
                tracing::debug!(mirror = %mirror, status = %status, "mirror returned error");
                last_error = ProviderError::Api(format!(
                    "HTTP {}: {}",
                    status,
                    status.canonical_reason().unwrap_or("Unknown")
                ));
                continue;
            }

            return response
                .json::<T>()
                .await
                .map_err(|e| ProviderError::Parse(e.to_string()));
        }

        Err(last_error)
    }

    /// Fetch raw bytes from an absolute URL (stream or artwork CDN).
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Api(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// CDN URL for a cover UUID at the embedding size.
    fn artwork_url(cover: &str) -> String {
        format!("{ARTWORK_BASE}/{}/{ARTWORK_SIZE}.jpg", cover.replace('-', "/"))
    }
}

impl Default for HifiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSourceApi for HifiClient {
    async fn search_track(&self, query: &str) -> Result<Vec<TrackHit>, ProviderError> {
        let response: dto::SearchResponse = self
            .request("/search/", &[("s", query.to_string())])
            .await?;
        Ok(response.data.items.into_iter().map(adapter::to_hit).collect())
    }

    async fn get_track_manifest(
        &self,
        track_id: u64,
        quality: &str,
    ) -> Result<TrackManifest, ProviderError> {
        let response: dto::TrackResponse = self
            .request(
                "/track/",
                &[
                    ("id", track_id.to_string()),
                    ("quality", quality.to_string()),
                ],
            )
            .await?;
        adapter::to_manifest(response.data)
    }

    async fn get_album_info(&self, album_id: u64) -> Result<AlbumInfo, ProviderError> {
        let response: dto::AlbumResponse = self
            .request("/album/", &[("id", album_id.to_string())])
            .await?;
        Ok(adapter::to_album(response.data))
    }

    async fn get_track_file(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.fetch_bytes(url).await
    }

    async fn get_album_art(&self, cover: &str) -> Result<Vec<u8>, ProviderError> {
        self.fetch_bytes(&Self::artwork_url(cover)).await
    }
}
