//! Submit-and-poll client for one generation.
//!
//! [`WorkflowClient::submit_and_await`] validates a request, resolves the
//! backend service, submits it, then sleeps and polls `job-status` until
//! the job completes, fails, the attempt budget runs out, or the caller
//! cancels. Every failure is mapped to a [`GenerationError`].

use std::sync::Arc;

use atelier_core::classify::{classify_backend_failure, is_expired_credential};
use atelier_core::error::GenerationError;
use atelier_core::job::{GenerationResult, JobHandle, JobState, JobStatus};
use atelier_core::progress::ProgressTracker;
use atelier_core::request::{GenerationRequest, JobPayload};
use atelier_core::routing::{resolve_service, Service};
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, JobBackend};
use crate::config::PollConfig;
use crate::messages::SubmitResponse;
use crate::session::CredentialProvider;

/// Progress callback: `(fraction in [0, 1], raw status label)`.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(f64, &str) + Send);

/// Drives generations against a [`JobBackend`].
///
/// Holds no per-generation state; concurrent calls are independent.
pub struct WorkflowClient {
    backend: Arc<dyn JobBackend>,
    credentials: Arc<dyn CredentialProvider>,
    poll: PollConfig,
}

impl WorkflowClient {
    pub fn new(
        backend: Arc<dyn JobBackend>,
        credentials: Arc<dyn CredentialProvider>,
        poll: PollConfig,
    ) -> Self {
        Self {
            backend,
            credentials,
            poll,
        }
    }

    /// Submit `request` and wait for its output images.
    pub async fn submit_and_await(
        &self,
        request: &GenerationRequest,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<GenerationResult, GenerationError> {
        self.submit_and_await_with_cancel(request, on_progress, &CancellationToken::new())
            .await
    }

    /// Like [`submit_and_await`](Self::submit_and_await), returning
    /// [`GenerationError::Cancelled`] as soon as `cancel` fires.
    ///
    /// The token is checked at the top of every poll tick and during the
    /// sleep; a cancelled tick makes no further network call.
    pub async fn submit_and_await_with_cancel(
        &self,
        request: &GenerationRequest,
        on_progress: Option<ProgressCallback<'_>>,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        request.validate()?;

        let resolution = resolve_service(request);
        tracing::info!(
            service = resolution.service.function_name(),
            rule = ?resolution.rule,
            workflow_id = %request.workflow_id,
            has_style_image = request.style_image().is_some(),
            has_mask = request.mask_image().is_some(),
            "Resolved generation service",
        );

        let credential = self
            .credentials
            .access_token()
            .await
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GenerationError::Authentication("Authentication required".to_string()))?;

        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        let handle = self
            .submit(resolution.service, &request.to_payload(), &credential)
            .await?;

        tracing::info!(
            service = resolution.service.function_name(),
            job = %handle,
            budget_secs = self.poll.budget().as_secs(),
            "Generation submitted",
        );

        self.poll_until_done(handle, credential, on_progress, cancel)
            .await
    }

    // ---- private helpers ----

    /// Submit once. Any failure, including an expired credential, is
    /// terminal for this generation.
    async fn submit(
        &self,
        service: Service,
        payload: &JobPayload,
        credential: &str,
    ) -> Result<JobHandle, GenerationError> {
        let response = self
            .backend
            .submit_job(service, payload, credential)
            .await
            .map_err(|e| submission_error(service, &e))?;

        job_handle(response)
    }

    /// The poll loop. Owns its attempt counter and progress tracker.
    async fn poll_until_done(
        &self,
        handle: JobHandle,
        mut credential: String,
        mut on_progress: Option<ProgressCallback<'_>>,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        let max_attempts = self.poll.max_attempts;
        let mut tracker = ProgressTracker::new();
        let mut attempt = 0u32;

        while attempt < max_attempts {
            if cancel.is_cancelled() {
                tracing::info!(job = %handle, attempt, "Generation cancelled");
                return Err(GenerationError::Cancelled);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(job = %handle, attempt, "Generation cancelled");
                    return Err(GenerationError::Cancelled);
                }
                _ = tokio::time::sleep(self.poll.interval) => {}
            }

            attempt += 1;
            tracing::debug!(job = %handle, attempt, max_attempts, "Polling job status");

            let status = match self.fetch_status(&handle, &mut credential).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(
                        job = %handle,
                        attempt,
                        error = %e,
                        "Status check failed, will retry",
                    );
                    continue;
                }
            };

            if status.state.is_terminal() {
                if let Some(outcome) = terminal_outcome(&handle, &status, attempt) {
                    return outcome;
                }
            }

            let fraction = tracker.next(status.progress, attempt, max_attempts);
            if let Some(callback) = on_progress.as_deref_mut() {
                callback(fraction, &status.label);
            }
        }

        tracing::error!(job = %handle, attempts = attempt, "Generation timed out");
        Err(GenerationError::Timeout { attempts: attempt })
    }

    /// Read status once, refreshing the session and retrying a single time
    /// if the credential has expired.
    async fn fetch_status(
        &self,
        handle: &JobHandle,
        credential: &mut String,
    ) -> Result<JobStatus, BackendError> {
        match self.backend.get_job_status(handle, credential).await {
            Ok(response) => Ok(response.into_status()),
            Err(e) if is_expired_credential(&e.to_failure()) => {
                match self.credentials.refresh().await {
                    Ok(token) => {
                        *credential = token;
                        let response = self.backend.get_job_status(handle, credential).await?;
                        Ok(response.into_status())
                    }
                    Err(refresh_err) => {
                        tracing::warn!(error = %refresh_err, "Session refresh failed");
                        Err(e)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }
}

/// Outcome of a terminal status, or `None` when a completed job has no
/// output yet and polling should go on.
fn terminal_outcome(
    handle: &JobHandle,
    status: &JobStatus,
    attempt: u32,
) -> Option<Result<GenerationResult, GenerationError>> {
    if status.state == JobState::Failed {
        let message = status
            .error
            .clone()
            .unwrap_or_else(|| "Generation failed".to_string());
        tracing::error!(job = %handle, attempt, error = %message, "Generation failed");
        return Some(Err(GenerationError::GenerationFailed(message)));
    }

    match GenerationResult::new(status.outputs.clone(), handle.clone(), attempt) {
        Some(result) => {
            tracing::info!(
                job = %handle,
                attempt,
                images = result.images().len(),
                "Generation completed",
            );
            Some(Ok(result))
        }
        None => {
            tracing::warn!(job = %handle, attempt, "Job completed without output images");
            None
        }
    }
}

/// Classify a rejected submission, logging the raw backend error.
fn submission_error(service: Service, err: &BackendError) -> GenerationError {
    tracing::error!(
        service = service.function_name(),
        error = %err,
        "Job submission rejected",
    );
    classify_backend_failure(&err.to_failure())
}

fn job_handle(response: SubmitResponse) -> Result<JobHandle, GenerationError> {
    JobHandle::new(response.run_id.unwrap_or_default(), response.external_job_id).ok_or_else(
        || GenerationError::Submission("No run ID received from backend".to_string()),
    )
}
