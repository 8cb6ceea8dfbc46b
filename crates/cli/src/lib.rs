//! Job description for the `atelier-render` binary.
//!
//! A [`RenderJob`] is assembled from environment variables: which catalog
//! option (or raw workflow id) to run, which images to feed it, and the
//! session tokens to submit with.

use atelier_core::catalog::find_option;
use atelier_core::error::{CoreError, RecoveryAction};
use atelier_core::prompt::DEFAULT_STYLE;
use atelier_core::request::{GenerationRequest, WorkflowMode};
use atelier_core::routing::WORKFLOW_SELECT_MODIFY;
use atelier_jobs::config::{env_lookup, parse_var, require_var};
use atelier_jobs::enhance::EnhanceInput;
use atelier_jobs::storage::resolve_image_ref;

/// Bucket holding uploaded source images when none is configured.
pub const DEFAULT_IMAGE_BUCKET: &str = "uploads";

/// Everything needed to run one generation from the command line.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub request: GenerationRequest,
    /// Catalog option the request was built from, if any.
    pub option_id: Option<String>,
    /// Design style fed to prompt enhancement.
    pub style: String,
    /// Run the prompt through the enhancement model before submitting.
    pub enhance_prompt: bool,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl RenderJob {
    /// Load from the process environment.
    ///
    /// | Env Var                  | Default    |
    /// |--------------------------|------------|
    /// | `RENDER_OPTION`          | --         |
    /// | `RENDER_WORKFLOW_ID`     | from option |
    /// | `RENDER_MODE`            | from option |
    /// | `RENDER_INPUT_IMAGE`     | (required) |
    /// | `RENDER_STYLE_IMAGE`     | --         |
    /// | `RENDER_MASK_IMAGE`      | --         |
    /// | `RENDER_IMAGE_BUCKET`    | `uploads`  |
    /// | `RENDER_PROMPT`          | empty      |
    /// | `RENDER_CHECKPOINT`      | --         |
    /// | `RENDER_BATCH_SIZE`      | `1`        |
    /// | `RENDER_STYLE`           | `modern`   |
    /// | `RENDER_ENHANCE_PROMPT`  | `false`    |
    /// | `GEMINI_API_KEY`         | --         |
    /// | `GEMINI_MODEL`           | --         |
    /// | `SUPABASE_ACCESS_TOKEN`  | --         |
    /// | `SUPABASE_REFRESH_TOKEN` | --         |
    ///
    /// One of `RENDER_OPTION` or `RENDER_WORKFLOW_ID` must be set. A mask
    /// image switches the request to the select-and-modify workflow. Image
    /// references that are not `http(s)` URLs are read as object paths in
    /// the image bucket under `base_url`.
    pub fn from_env(base_url: &str) -> Result<Self, CoreError> {
        Self::from_lookup(env_lookup, base_url)
    }

    /// Load through an arbitrary variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        base_url: &str,
    ) -> Result<Self, CoreError> {
        let optional = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bucket = optional("RENDER_IMAGE_BUCKET").unwrap_or_else(|| DEFAULT_IMAGE_BUCKET.into());
        let image = |reference: String| resolve_image_ref(base_url, &bucket, &reference);
        let input_image = image(require_var(&lookup, "RENDER_INPUT_IMAGE")?);

        let option_id = optional("RENDER_OPTION");
        let mut request = match option_id.as_deref() {
            Some(id) => {
                let option = find_option(id).ok_or_else(|| {
                    CoreError::Config(format!("RENDER_OPTION '{id}' is not a known option"))
                })?;
                if !option.active {
                    return Err(CoreError::Config(format!(
                        "RENDER_OPTION '{id}' is not currently offered"
                    )));
                }
                option.request(input_image)
            }
            None => {
                let workflow_id = optional("RENDER_WORKFLOW_ID").ok_or_else(|| {
                    CoreError::Config("RENDER_OPTION or RENDER_WORKFLOW_ID must be set".into())
                })?;
                GenerationRequest::new(workflow_id, input_image)
            }
        };

        if option_id.is_some() {
            if let Some(workflow_id) = optional("RENDER_WORKFLOW_ID") {
                request.workflow_id = workflow_id;
            }
        }
        if let Some(name) = optional("RENDER_MODE") {
            let mode = WorkflowMode::from_name(&name).ok_or_else(|| {
                CoreError::Config(format!("RENDER_MODE has an invalid value '{name}'"))
            })?;
            request = request.with_mode(mode);
        }
        if let Some(style_image) = optional("RENDER_STYLE_IMAGE") {
            request = request.with_style_image(image(style_image));
        }
        if let Some(mask_image) = optional("RENDER_MASK_IMAGE") {
            // Masked edits only run on the select-and-modify workflow.
            request.workflow_id = WORKFLOW_SELECT_MODIFY.to_string();
            request = request.with_mask_image(image(mask_image));
        }
        if let Some(prompt) = optional("RENDER_PROMPT") {
            request = request.with_prompt(prompt);
        }
        if let Some(checkpoint) = optional("RENDER_CHECKPOINT") {
            request = request.with_checkpoint(checkpoint);
        }

        let batch_size: u32 = parse_var(&lookup, "RENDER_BATCH_SIZE", request.batch_number)?;
        if batch_size == 0 {
            return Err(CoreError::Config(
                "RENDER_BATCH_SIZE must be at least 1".into(),
            ));
        }
        request = request.with_batch_number(batch_size);

        let enhance_prompt: bool = parse_var(&lookup, "RENDER_ENHANCE_PROMPT", false)?;
        let gemini_api_key = optional("GEMINI_API_KEY");
        if enhance_prompt && gemini_api_key.is_none() {
            return Err(CoreError::Config(
                "GEMINI_API_KEY must be set when RENDER_ENHANCE_PROMPT is enabled".into(),
            ));
        }

        Ok(Self {
            request,
            option_id,
            style: optional("RENDER_STYLE").unwrap_or_else(|| DEFAULT_STYLE.into()),
            enhance_prompt,
            gemini_api_key,
            gemini_model: optional("GEMINI_MODEL"),
            access_token: optional("SUPABASE_ACCESS_TOKEN"),
            refresh_token: optional("SUPABASE_REFRESH_TOKEN"),
        })
    }

    /// Input for the prompt enhancer, describing this job's images.
    pub fn enhance_input(&self) -> EnhanceInput<'_> {
        EnhanceInput {
            current_prompt: &self.request.prompt,
            style: &self.style,
            mode: self.request.mode.unwrap_or(WorkflowMode::Interior),
            image_url: Some(self.request.input_image.as_str()),
            mask_url: self.request.mask_image(),
        }
    }
}

/// User-facing hint printed after a failed generation.
pub fn recovery_hint(action: RecoveryAction) -> &'static str {
    match action {
        RecoveryAction::Relogin => "Sign in again and refresh SUPABASE_ACCESS_TOKEN.",
        RecoveryAction::PurchaseCredits => "Purchase more credits to continue.",
        RecoveryAction::Retry => "Try the generation again.",
        RecoveryAction::None => "",
    }
}
