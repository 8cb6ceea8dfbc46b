//! Contract of the remote job backend.
//!
//! [`JobBackend`] is the seam between the poll loop and the transport. The
//! production implementation is [`EdgeFunctionApi`](crate::api::EdgeFunctionApi).

use async_trait::async_trait;
use atelier_core::classify::BackendFailure;
use atelier_core::job::JobHandle;
use atelier_core::request::JobPayload;
use atelier_core::routing::Service;

use crate::messages::{parse_error_body, StatusResponse, SubmitResponse};

/// Errors from a single backend call.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response could not be interpreted.
    #[error("Invalid backend response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Describe this error for [`classify_backend_failure`](atelier_core::classify::classify_backend_failure).
    pub fn to_failure(&self) -> BackendFailure {
        match self {
            Self::Api { status, body } => {
                let parsed = parse_error_body(body);
                let mut failure = BackendFailure::new(parsed.message).with_status(*status);
                failure.code = parsed.code;
                failure
            }
            Self::Request(e) => {
                let failure = BackendFailure::new(e.to_string());
                match e.status() {
                    Some(status) => failure.with_status(status.as_u16()),
                    None => failure,
                }
            }
            Self::Decode(msg) => BackendFailure::new(msg.clone()),
        }
    }
}

/// Operations the remote job backend exposes.
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Queue a generation on `service`.
    async fn submit_job(
        &self,
        service: Service,
        payload: &JobPayload,
        credential: &str,
    ) -> Result<SubmitResponse, BackendError>;

    /// Read the current status of a submitted job.
    async fn get_job_status(
        &self,
        handle: &JobHandle,
        credential: &str,
    ) -> Result<StatusResponse, BackendError>;
}
