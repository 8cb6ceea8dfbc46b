//! Wire types exchanged with the job backend's edge functions.
//!
//! Submission returns `{"runId": "...", "external_job_id": "..."}`; the
//! `job-status` function returns
//! `{"status": "...", "progress": n, "result": {...}, "error": "..."}`.

use atelier_core::job::{JobState, JobStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of a job submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    /// Backend run identifier; absent when the backend failed to queue.
    #[serde(rename = "runId", alias = "run_id", default)]
    pub run_id: Option<String>,
    /// Identifier of the job on the provider behind the backend.
    #[serde(default)]
    pub external_job_id: Option<String>,
}

/// Body of a `job-status` call.
#[derive(Debug, Serialize)]
pub struct StatusQuery<'a> {
    pub job_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_job_id: Option<&'a str>,
}

/// Response of a `job-status` call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl StatusResponse {
    /// Normalize into a domain [`JobStatus`].
    pub fn into_status(self) -> JobStatus {
        let outputs = self
            .result
            .as_ref()
            .map(extract_output_urls)
            .unwrap_or_default();

        let label = self.status.unwrap_or_default();
        JobStatus {
            state: JobState::from_label(&label),
            label,
            progress: self.progress,
            outputs,
            error: self.error.as_ref().and_then(error_message),
        }
    }
}

/// Collect output image URLs from a result value, in order, without
/// duplicates.
///
/// Accepts a bare string, an array, or an object carrying `url`, `urls`,
/// or `images`.
pub fn extract_output_urls(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_urls(value, &mut out);
    out
}

fn collect_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(url) => {
            let trimmed = url.trim();
            if !trimmed.is_empty() && !out.iter().any(|existing| existing == trimmed) {
                out.push(trimmed.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_urls(item, out);
            }
        }
        Value::Object(obj) => {
            for key in ["url", "urls", "images"] {
                if let Some(inner) = obj.get(key) {
                    collect_urls(inner, out);
                }
            }
        }
        _ => {}
    }
}

/// Human-readable text from an `error` field (string or `{message}`).
pub fn error_message(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .or_else(|| obj.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        Value::Null => return None,
        other => other.to_string(),
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Detail extracted from a non-2xx response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub message: String,
}

/// Parse an error response body.
///
/// JSON bodies are searched for `error`/`message` and `code`; anything
/// else is returned verbatim.
pub fn parse_error_body(body: &str) -> ErrorBody {
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) else {
        return ErrorBody {
            code: None,
            message: body.trim().to_string(),
        };
    };

    let message = obj
        .get("error")
        .or_else(|| obj.get("message"))
        .and_then(error_message)
        .unwrap_or_else(|| body.trim().to_string());
    let code = obj
        .get("code")
        .and_then(Value::as_str)
        .map(str::to_string);

    ErrorBody { code, message }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn submit_response_reads_camel_case_run_id() {
        let resp: SubmitResponse =
            serde_json::from_value(json!({"runId": "run-1", "external_job_id": "ext-1"})).unwrap();
        assert_eq!(resp.run_id.as_deref(), Some("run-1"));
        assert_eq!(resp.external_job_id.as_deref(), Some("ext-1"));
    }

    #[test]
    fn submit_response_tolerates_missing_run_id() {
        let resp: SubmitResponse = serde_json::from_value(json!({"ok": true})).unwrap();
        assert!(resp.run_id.is_none());
    }

    #[test]
    fn status_query_skips_absent_external_id() {
        let body = serde_json::to_value(StatusQuery {
            job_id: "run-1",
            external_job_id: None,
        })
        .unwrap();
        assert_eq!(body, json!({"job_id": "run-1"}));
    }

    #[test]
    fn completed_status_extracts_single_url() {
        let resp: StatusResponse = serde_json::from_value(json!({
            "status": "completed",
            "result": {"url": "https://cdn/out.png"}
        }))
        .unwrap();
        let status = resp.into_status();
        assert_eq!(status.state, JobState::Completed);
        assert_eq!(status.outputs, vec!["https://cdn/out.png"]);
    }

    #[test]
    fn urls_keep_backend_order_without_duplicates() {
        let urls = extract_output_urls(&json!({
            "url": "https://cdn/a.png",
            "urls": ["https://cdn/b.png", "https://cdn/a.png"],
            "images": [{"url": "https://cdn/c.png"}]
        }));
        assert_eq!(urls, vec!["https://cdn/a.png", "https://cdn/b.png", "https://cdn/c.png"]);
    }

    #[test]
    fn failed_status_carries_error_text() {
        let resp: StatusResponse = serde_json::from_value(json!({
            "status": "failed",
            "error": {"message": "model overloaded"}
        }))
        .unwrap();
        let status = resp.into_status();
        assert_eq!(status.state, JobState::Failed);
        assert_eq!(status.error.as_deref(), Some("model overloaded"));
    }

    #[test]
    fn unknown_status_keeps_raw_label() {
        let resp: StatusResponse =
            serde_json::from_value(json!({"status": "IN_QUEUE", "progress": 12.0})).unwrap();
        let status = resp.into_status();
        assert_eq!(status.state, JobState::Unknown);
        assert_eq!(status.label, "IN_QUEUE");
        assert_eq!(status.progress, Some(12.0));
    }

    #[test]
    fn null_status_decodes_as_unknown() {
        let resp: StatusResponse =
            serde_json::from_value(json!({"status": null, "progress": null, "result": null}))
                .unwrap();
        let status = resp.into_status();
        assert_eq!(status.state, JobState::Unknown);
        assert_eq!(status.label, "");
        assert!(status.outputs.is_empty());
    }

    #[test]
    fn error_body_json_and_plain_text() {
        let parsed = parse_error_body(r#"{"error": "Insufficient credits", "code": "insufficient_credits"}"#);
        assert_eq!(parsed.message, "Insufficient credits");
        assert_eq!(parsed.code.as_deref(), Some("insufficient_credits"));

        let plain = parse_error_body("  gateway timeout ");
        assert_eq!(plain.message, "gateway timeout");
        assert!(plain.code.is_none());
    }
}
