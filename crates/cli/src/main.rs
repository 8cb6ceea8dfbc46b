//! `atelier-render` -- run one AI render from the command line.
//!
//! Submits a generation to the hosted backend, polls it to completion
//! while logging progress, and prints the output image URLs (one per
//! line) on stdout. Ctrl-C cancels the poll loop.
//!
//! # Environment variables
//!
//! Backend connection settings are read by `ClientConfig::from_env`
//! (`SUPABASE_URL`, `SUPABASE_ANON_KEY`, `POLL_INTERVAL_SECS`, ...); the job
//! itself by `RenderJob::from_env` (`RENDER_OPTION`, `RENDER_INPUT_IMAGE`,
//! ...).

use std::sync::Arc;

use atelier_cli::{recovery_hint, RenderJob};
use atelier_jobs::api::EdgeFunctionApi;
use atelier_jobs::client::WorkflowClient;
use atelier_jobs::config::ClientConfig;
use atelier_jobs::enhance::PromptEnhancer;
use atelier_jobs::session::SupabaseSession;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_cli=info,atelier_jobs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid backend configuration");
        std::process::exit(1);
    });

    let mut job = RenderJob::from_env(&config.supabase_url).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid render job");
        std::process::exit(1);
    });

    tracing::info!(
        option = job.option_id.as_deref().unwrap_or("-"),
        workflow_id = %job.request.workflow_id,
        batch = job.request.batch_number,
        poll_interval_secs = config.poll.interval.as_secs(),
        max_attempts = config.poll.max_attempts,
        "Starting atelier-render",
    );

    if job.enhance_prompt {
        enhance_prompt(&mut job).await;
    }

    let api = EdgeFunctionApi::new(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });
    let session = SupabaseSession::new(
        &config,
        job.access_token.clone(),
        job.refresh_token.clone(),
    )
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build session client");
        std::process::exit(1);
    });
    let client = WorkflowClient::new(Arc::new(api), Arc::new(session), config.poll.clone());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling generation");
            ctrl_c.cancel();
        }
    });

    let mut on_progress = |fraction: f64, status: &str| {
        tracing::info!(
            percent = (fraction * 100.0).round() as u32,
            status,
            "Generation progress",
        );
    };

    match client
        .submit_and_await_with_cancel(&job.request, Some(&mut on_progress), &cancel)
        .await
    {
        Ok(result) => {
            tracing::info!(
                job = %result.handle(),
                images = result.images().len(),
                attempts = result.attempts(),
                "Render finished",
            );
            for url in result.images() {
                println!("{url}");
            }
        }
        Err(e) => {
            let hint = recovery_hint(e.recovery_action());
            tracing::error!(error = %e, hint, "Render failed");
            std::process::exit(1);
        }
    }
}

/// Replace the job's prompt with an enhanced one. Failures keep the
/// original prompt.
async fn enhance_prompt(job: &mut RenderJob) {
    let Some(api_key) = job.gemini_api_key.clone() else {
        return;
    };

    let enhancer = match PromptEnhancer::new(api_key) {
        Ok(enhancer) => match job.gemini_model.clone() {
            Some(model) => enhancer.with_model(model),
            None => enhancer,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Prompt enhancement unavailable");
            return;
        }
    };

    let enhanced = enhancer.enhance(&job.enhance_input()).await;
    match enhanced {
        Ok(prompt) => {
            tracing::info!(prompt = %prompt, "Using enhanced prompt");
            job.request.prompt = prompt;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Prompt enhancement failed, keeping original prompt");
        }
    }
}
