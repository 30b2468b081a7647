//! REST client for the provider's Higgsfield endpoints.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::messages::{GenerationRequest, SubmitResponse, TaskResponse, TrainingRequest};
use crate::{ProviderConfig, ProviderError, RemoteJobClient};

/// HTTP client for the provider API.
pub struct HiggsfieldApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HiggsfieldApi {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.api_key.clone(),
        ))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    async fn submit<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        kind: &'static str,
    ) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let submitted: SubmitResponse = Self::parse_response(response).await?;
        let task_id = submitted
            .into_task_id()
            .ok_or(ProviderError::MissingTaskId(kind))?;
        tracing::info!(task_id = %task_id, kind, "Submitted provider task");
        Ok(task_id)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ProviderError::Api`]
    /// containing the status and body text on failure.
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

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RemoteJobClient for HiggsfieldApi {
    async fn submit_training(&self, request: &TrainingRequest) -> Result<String, ProviderError> {
        self.submit("/higgsfield/character", request, "training").await
    }

    async fn submit_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<String, ProviderError> {
        self.submit("/higgsfield/text2image_soul", request, "generation")
            .await
    }

    async fn fetch_task(&self, task_id: &str) -> Result<TaskResponse, ProviderError> {
        let response = self
            .client
            .get(format!("{}/higgsfield/task/{task_id}/fetch", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn character_exists(&self, character_id: &str) -> Result<bool, ProviderError> {
        let response = self
            .client
            .get(format!("{}/higgsfield/character/{character_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::ensure_success(response).await?;
        Ok(true)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
