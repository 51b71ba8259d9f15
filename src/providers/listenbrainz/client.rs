//! ListenBrainz HTTP client
//!
//! Handles communication with the LB-radio endpoint.
//! See: https://listenbrainz.readthedocs.io/en/latest/users/api/
//!
//! IMPORTANT: ListenBrainz rate limits aggressively; 429 responses carry a
//! Retry-After hint that we surface so the caller can apply bounded retry.

use async_trait::async_trait;

use super::{adapter, dto};
use crate::blueprint::Blueprint;
use crate::providers::MetadataApi;
use crate::providers::domain::{Candidate, ProviderError};

/// ListenBrainz API client
pub struct ListenBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// User agent string - identify ourselves to the API
const USER_AGENT: &str = concat!("mixcrate/", env!("CARGO_PKG_VERSION"));

impl ListenBrainzClient {
    /// Create a new client; `token` enables authenticated radio requests.
    pub fn new(token: Option<&str>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            base_url: "https://api.listenbrainz.org".to_string(),
            token: token.map(String::from),
        }
    }

    /// Create a client for testing with custom base URL
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http_client,
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Send the radio request and parse the JSPF payload
    async fn send_radio_request(
        &self,
        prompt: &str,
        mode: &str,
    ) -> Result<dto::RadioResponse, ProviderError> {
        let url = format!(
            "{}/1/explore/lb-radio?prompt={}&mode={}",
            self.base_url,
            urlencoding::encode(prompt),
            urlencoding::encode(mode)
        );

        let mut request = self.http_client.get(&url);
        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Token {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(ProviderError::Api(error.error));
            }
            return Err(ProviderError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<dto::RadioResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl MetadataApi for ListenBrainzClient {
    async fn get_candidates(
        &self,
        blueprint: &Blueprint,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let response = self
            .send_radio_request(&blueprint.prompt, &blueprint.mode)
            .await?;
        let candidates = adapter::to_candidates(response);
        tracing::info!(
            prompt = %blueprint.prompt,
            count = candidates.len(),
            "fetched candidate list"
        );
        Ok(candidates)
    }
}
