//! HTTP client for the backend's edge functions.
//!
//! Every generation service and the `job-status` endpoint are edge
//! functions invoked with `POST {base}/functions/v1/{name}`, carrying the
//! project's anon key and the caller's bearer token.

use async_trait::async_trait;
use atelier_core::job::JobHandle;
use atelier_core::request::JobPayload;
use atelier_core::routing::Service;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{BackendError, JobBackend};
use crate::config::ClientConfig;
use crate::messages::{StatusQuery, StatusResponse, SubmitResponse};

/// Edge function that reports job status.
pub const JOB_STATUS_FUNCTION: &str = "job-status";

/// HTTP client for one backend project.
pub struct EdgeFunctionApi {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl EdgeFunctionApi {
    /// Create a client with the configured request timeout.
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(
            client,
            config.supabase_url.clone(),
            config.anon_key.clone(),
        ))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String, anon_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    /// URL of the edge function `name`.
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    /// Invoke an edge function with a JSON body and decode its JSON answer.
    pub async fn invoke<B, T>(
        &self,
        function: &str,
        body: &B,
        credential: &str,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.function_url(function))
            .header("apikey", &self.anon_key)
            .bearer_auth(credential)
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or an
    /// [`BackendError::Api`] with the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl JobBackend for EdgeFunctionApi {
    async fn submit_job(
        &self,
        service: Service,
        payload: &JobPayload,
        credential: &str,
    ) -> Result<SubmitResponse, BackendError> {
        self.invoke(service.function_name(), payload, credential)
            .await
    }

    async fn get_job_status(
        &self,
        handle: &JobHandle,
        credential: &str,
    ) -> Result<StatusResponse, BackendError> {
        let query = StatusQuery {
            job_id: handle.run_id(),
            external_job_id: handle.external_job_id(),
        };
        self.invoke(JOB_STATUS_FUNCTION, &query, credential).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn function_urls_are_built_from_base() {
        let api = EdgeFunctionApi::with_client(
            reqwest::Client::new(),
            "https://proj.supabase.co/".into(),
            "anon".into(),
        );
        assert_eq!(
            api.function_url(Service::StyleTransfer.function_name()),
            "https://proj.supabase.co/functions/v1/styly-transfer"
        );
        assert_eq!(
            api.function_url(JOB_STATUS_FUNCTION),
            "https://proj.supabase.co/functions/v1/job-status"
        );
    }

    #[test]
    fn new_uses_config() {
        let config = ClientConfig {
            supabase_url: "https://proj.supabase.co".into(),
            anon_key: "anon".into(),
            request_timeout: Duration::from_secs(5),
            poll: Default::default(),
        };
        let api = EdgeFunctionApi::new(&config).unwrap();
        assert_eq!(api.function_url("x"), "https://proj.supabase.co/functions/v1/x");
    }
}
