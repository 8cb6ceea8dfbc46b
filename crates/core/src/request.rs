//! Generation request model, validation, and the submission payload.
//!
//! A [`GenerationRequest`] is built per user action, validated, and turned
//! into a [`JobPayload`] exactly once before submission.

use serde::Serialize;

use crate::error::GenerationError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Version tag sent when the request does not name one.
pub const DEFAULT_VERSION: &str = "1.0";

/// Number of images generated when the request does not say otherwise.
pub const DEFAULT_BATCH_NUMBER: u32 = 1;

// ---------------------------------------------------------------------------
// Workflow mode
// ---------------------------------------------------------------------------

/// Declared design mode of a request, used as a routing fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowMode {
    Interior,
    Exterior,
    Enhancement,
}

impl WorkflowMode {
    /// Parse a mode name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "interior" => Some(Self::Interior),
            "exterior" | "facade" => Some(Self::Exterior),
            "enhancement" => Some(Self::Enhancement),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Interior => "interior",
            Self::Exterior => "exterior",
            Self::Enhancement => "enhancement",
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One generation as requested by the UI controller.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Workflow (deployment) identifier selecting the model variant.
    pub workflow_id: String,
    /// URL of the image to transform.
    pub input_image: String,
    /// URL of a style reference image; forces the style-transfer service.
    pub style_image: Option<String>,
    /// URL of a modification mask.
    pub mask_image: Option<String>,
    /// Free-text positive prompt.
    pub prompt: String,
    /// Checkpoint (model weights) identifier.
    pub checkpoint: Option<String>,
    pub version: String,
    pub batch_number: u32,
    pub mode: Option<WorkflowMode>,
}

impl GenerationRequest {
    /// Start a request with the two mandatory fields and defaults elsewhere.
    pub fn new(workflow_id: impl Into<String>, input_image: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            input_image: input_image.into(),
            style_image: None,
            mask_image: None,
            prompt: String::new(),
            checkpoint: None,
            version: DEFAULT_VERSION.to_string(),
            batch_number: DEFAULT_BATCH_NUMBER,
            mode: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_style_image(mut self, url: impl Into<String>) -> Self {
        self.style_image = Some(url.into());
        self
    }

    pub fn with_mask_image(mut self, url: impl Into<String>) -> Self {
        self.mask_image = Some(url.into());
        self
    }

    pub fn with_checkpoint(mut self, checkpoint: impl Into<String>) -> Self {
        self.checkpoint = Some(checkpoint.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_batch_number(mut self, batch_number: u32) -> Self {
        self.batch_number = batch_number;
        self
    }

    pub fn with_mode(mut self, mode: WorkflowMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Style reference image, treating a blank string as absent.
    pub fn style_image(&self) -> Option<&str> {
        non_blank(self.style_image.as_deref())
    }

    /// Mask image, treating a blank string as absent.
    pub fn mask_image(&self) -> Option<&str> {
        non_blank(self.mask_image.as_deref())
    }

    /// Check the request can be submitted.
    ///
    /// Runs before any credential lookup or network call; every failure is a
    /// [`GenerationError::Submission`].
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.input_image.trim().is_empty() {
            return Err(GenerationError::Submission(
                "input_image is required".to_string(),
            ));
        }
        if self.workflow_id.trim().is_empty() {
            return Err(GenerationError::Submission(
                "workflow_id is required".to_string(),
            ));
        }
        if self.batch_number == 0 {
            return Err(GenerationError::Submission(
                "batch_number must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the submission body sent to the backend service.
    pub fn to_payload(&self) -> JobPayload {
        let version = if self.version.trim().is_empty() {
            DEFAULT_VERSION.to_string()
        } else {
            self.version.clone()
        };

        JobPayload {
            input_image: self.input_image.clone(),
            positive: self.prompt.clone(),
            input_checkpoint: self.checkpoint.clone(),
            workflow_id: self.workflow_id.clone(),
            version,
            batch_number: self.batch_number.max(DEFAULT_BATCH_NUMBER),
            input_styleimage: self.style_image().map(str::to_string),
            input_mask: self.mask_image().map(str::to_string),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// JSON body of a job submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobPayload {
    pub input_image: String,
    pub positive: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_checkpoint: Option<String>,
    pub workflow_id: String,
    pub version: String,
    pub batch_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_styleimage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_mask: Option<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn new_request_uses_defaults() {
        let req = GenerationRequest::new("wf-1", "https://img/a.png");
        assert_eq!(req.version, "1.0");
        assert_eq!(req.batch_number, 1);
        assert!(req.prompt.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn missing_input_image_is_a_submission_error() {
        let req = GenerationRequest::new("wf-1", "  ");
        assert_matches!(req.validate(), Err(GenerationError::Submission(msg)) if msg.contains("input_image"));
    }

    #[test]
    fn missing_workflow_id_is_a_submission_error() {
        let req = GenerationRequest::new("", "https://img/a.png");
        assert_matches!(req.validate(), Err(GenerationError::Submission(msg)) if msg.contains("workflow_id"));
    }

    #[test]
    fn zero_batch_is_rejected() {
        let req = GenerationRequest::new("wf-1", "https://img/a.png").with_batch_number(0);
        assert_matches!(req.validate(), Err(GenerationError::Submission(_)));
    }

    #[test]
    fn payload_omits_absent_optionals() {
        let payload = GenerationRequest::new("wf-1", "https://img/a.png").to_payload();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["input_image"], "https://img/a.png");
        assert_eq!(json["positive"], "");
        assert_eq!(json["workflow_id"], "wf-1");
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["batch_number"], 1);
        assert!(json.get("input_styleimage").is_none());
        assert!(json.get("input_mask").is_none());
        assert!(json.get("input_checkpoint").is_none());
    }

    #[test]
    fn payload_carries_optionals_and_drops_blank_ones() {
        let payload = GenerationRequest::new("wf-1", "https://img/a.png")
            .with_prompt("warm oak floor")
            .with_style_image("https://img/style.png")
            .with_mask_image(" ")
            .with_checkpoint("juggernaut_xl")
            .with_version("")
            .with_batch_number(4)
            .to_payload();

        assert_eq!(payload.positive, "warm oak floor");
        assert_eq!(payload.input_styleimage.as_deref(), Some("https://img/style.png"));
        assert_eq!(payload.input_mask, None);
        assert_eq!(payload.input_checkpoint.as_deref(), Some("juggernaut_xl"));
        assert_eq!(payload.version, "1.0");
        assert_eq!(payload.batch_number, 4);
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!(WorkflowMode::from_name("Interior"), Some(WorkflowMode::Interior));
        assert_eq!(WorkflowMode::from_name("facade"), Some(WorkflowMode::Exterior));
        assert_eq!(WorkflowMode::from_name("enhancement"), Some(WorkflowMode::Enhancement));
        assert_eq!(WorkflowMode::from_name("landscape"), None);
    }
}
