use async_trait::async_trait;
use reqwest::Client;

use crate::models::job::{Prediction, PredictionRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com/v1";

/// Remote inference service that runs predictions asynchronously.
///
/// The credential is passed per call so the orchestrator can refuse to run
/// before any request leaves the process.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// `POST /predictions`
    async fn create_prediction(
        &self,
        api_token: &str,
        request: &PredictionRequest,
    ) -> Result<Prediction, ProviderError>;

    /// `GET /predictions/{id}`
    async fn get_prediction(&self, api_token: &str, id: &str) -> Result<Prediction, ProviderError>;

    /// `POST /predictions/{id}/cancel`
    async fn cancel_prediction(&self, api_token: &str, id: &str) -> Result<(), ProviderError>;
}

/// Client for the Replicate predictions API.
pub struct ReplicateClient {
    http: Client,
    base_url: String,
}

impl ReplicateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Map non-2xx responses to [`ProviderError::Api`], keeping the raw body.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_prediction(response: reqwest::Response) -> Result<Prediction, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Prediction>().await?)
    }
}

#[async_trait]
impl InferenceProvider for ReplicateClient {
    async fn create_prediction(
        &self,
        api_token: &str,
        request: &PredictionRequest,
    ) -> Result<Prediction, ProviderError> {
        let response = self
            .http
            .post(format!("{}/predictions", self.base_url))
            .bearer_auth(api_token)
            .json(request)
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    async fn get_prediction(&self, api_token: &str, id: &str) -> Result<Prediction, ProviderError> {
        let response = self
            .http
            .get(format!("{}/predictions/{}", self.base_url, id))
            .bearer_auth(api_token)
            .send()
            .await?;

        Self::parse_prediction(response).await
    }

    async fn cancel_prediction(&self, api_token: &str, id: &str) -> Result<(), ProviderError> {
        let response = self
            .http
            .post(format!("{}/predictions/{}/cancel", self.base_url, id))
            .bearer_auth(api_token)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },
}
