//! Best-effort reclassification of backend failures into
//! [`GenerationError`] variants.
//!
//! The backend currently reports failures as free text, so the fallback
//! path matches known substrings. A structured error code, when present,
//! always wins over the text.

use crate::error::GenerationError;

// ---------------------------------------------------------------------------
// Known markers
// ---------------------------------------------------------------------------

/// Message fragment the backend uses when credits run out.
pub const INSUFFICIENT_CREDITS_MARKER: &str = "insufficient credits";
/// Message fragment the backend uses for rejected credentials.
pub const UNAUTHORIZED_MARKER: &str = "unauthorized";
/// Message fragment the backend uses for missing request fields.
pub const MISSING_FIELD_MARKER: &str = "required";

/// Structured codes mapped to [`GenerationError::InsufficientResource`].
const INSUFFICIENT_CODES: &[&str] = &["insufficient_credits", "quota_exceeded", "payment_required"];
/// Structured codes mapped to [`GenerationError::Authentication`].
const AUTH_CODES: &[&str] = &["unauthorized", "invalid_jwt", "jwt_expired"];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// A rejected backend call, as seen by the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendFailure {
    /// HTTP status, when the failure came from an HTTP response.
    pub status: Option<u16>,
    /// Machine-readable error code, if the backend supplied one.
    pub code: Option<String>,
    /// Human-readable detail.
    pub message: String,
}

impl BackendFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Map a failed submission to the caller-facing taxonomy.
pub fn classify_backend_failure(failure: &BackendFailure) -> GenerationError {
    let message = failure.message.trim();
    let detail = if message.is_empty() {
        "Unknown error".to_string()
    } else {
        message.to_string()
    };

    if let Some(code) = failure.code.as_deref().map(str::to_ascii_lowercase) {
        if INSUFFICIENT_CODES.contains(&code.as_str()) {
            return GenerationError::InsufficientResource(detail);
        }
        if AUTH_CODES.contains(&code.as_str()) {
            return GenerationError::Authentication(detail);
        }
    }

    if failure.status == Some(402) {
        return GenerationError::InsufficientResource(detail);
    }

    let lower = message.to_ascii_lowercase();
    if lower.contains(INSUFFICIENT_CREDITS_MARKER) {
        return GenerationError::InsufficientResource(
            "Please purchase more credits to continue.".to_string(),
        );
    }
    if failure.status == Some(401) || lower.contains(UNAUTHORIZED_MARKER) {
        return GenerationError::Authentication("Please log in again.".to_string());
    }
    if lower.contains(MISSING_FIELD_MARKER) {
        return GenerationError::Submission(format!("Invalid workflow configuration: {detail}"));
    }

    GenerationError::Submission(detail)
}

/// Whether a failure means the access token has expired and a session
/// refresh may help.
pub fn is_expired_credential(failure: &BackendFailure) -> bool {
    if failure.status == Some(401) {
        return true;
    }
    if failure
        .code
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case("jwt_expired"))
    {
        return true;
    }
    failure.message.to_ascii_lowercase().contains("jwt expired")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn insufficient_credits_by_text() {
        let failure = BackendFailure::new("Insufficient credits: 0 remaining").with_status(400);
        assert_matches!(
            classify_backend_failure(&failure),
            GenerationError::InsufficientResource(_)
        );
    }

    #[test]
    fn structured_code_wins_over_text() {
        let failure = BackendFailure::new("field input_image is required").with_code("QUOTA_EXCEEDED");
        assert_matches!(
            classify_backend_failure(&failure),
            GenerationError::InsufficientResource(msg) if msg.contains("input_image")
        );
    }

    #[test]
    fn payment_required_status_is_insufficient() {
        let failure = BackendFailure::new("").with_status(402);
        assert_matches!(
            classify_backend_failure(&failure),
            GenerationError::InsufficientResource(msg) if msg == "Unknown error"
        );
    }

    #[test]
    fn unauthorized_by_status_or_text() {
        assert_matches!(
            classify_backend_failure(&BackendFailure::new("nope").with_status(401)),
            GenerationError::Authentication(_)
        );
        assert_matches!(
            classify_backend_failure(&BackendFailure::new("Unauthorized request")),
            GenerationError::Authentication(_)
        );
    }

    #[test]
    fn missing_field_is_invalid_configuration() {
        let failure = BackendFailure::new("input_image is required").with_status(400);
        assert_matches!(
            classify_backend_failure(&failure),
            GenerationError::Submission(msg) if msg == "Invalid workflow configuration: input_image is required"
        );
    }

    #[test]
    fn anything_else_is_a_submission_error() {
        let failure = BackendFailure::new("edge function crashed").with_status(500);
        assert_eq!(
            classify_backend_failure(&failure),
            GenerationError::Submission("edge function crashed".into())
        );
    }

    #[test]
    fn expired_credentials_detected() {
        assert!(is_expired_credential(&BackendFailure::new("x").with_status(401)));
        assert!(is_expired_credential(&BackendFailure::new("JWT expired")));
        assert!(is_expired_credential(&BackendFailure::new("").with_code("jwt_expired")));
        assert!(!is_expired_credential(&BackendFailure::new("bad input").with_status(400)));
    }
}
