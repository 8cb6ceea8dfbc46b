//! Job handle, status, and result types.

use std::fmt;

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Identifiers issued by the backend for one submitted job.
///
/// Immutable once issued; `run_id` is the polling key and
/// `external_job_id` is passed alongside as a correlation key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    run_id: String,
    external_job_id: Option<String>,
}

impl JobHandle {
    /// Build a handle; returns `None` when `run_id` is blank.
    pub fn new(run_id: impl Into<String>, external_job_id: Option<String>) -> Option<Self> {
        let run_id = run_id.into();
        if run_id.trim().is_empty() {
            return None;
        }
        Some(Self {
            run_id,
            external_job_id: external_job_id.filter(|id| !id.trim().is_empty()),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn external_job_id(&self) -> Option<&str> {
        self.external_job_id.as_deref()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.external_job_id {
            Some(ext) => write!(f, "{} ({ext})", self.run_id),
            None => f.write_str(&self.run_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a job as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    /// A label this client does not know; treated as non-terminal.
    Unknown,
}

impl JobState {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Self::Pending,
            "running" | "processing" | "in_progress" => Self::Running,
            "completed" | "succeeded" | "success" => Self::Completed,
            "failed" | "error" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One status read, normalized from the backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatus {
    pub state: JobState,
    /// Raw status label as the backend sent it.
    pub label: String,
    /// Backend-reported progress, if any (not yet normalized).
    pub progress: Option<f64>,
    /// Output URLs, in backend order. Empty unless completed.
    pub outputs: Vec<String>,
    /// Backend-supplied error message for failed jobs.
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Successful outcome of one generation. Always holds at least one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    images: Vec<String>,
    handle: JobHandle,
    attempts: u32,
}

impl GenerationResult {
    /// Build a result; returns `None` when `images` is empty.
    pub fn new(images: Vec<String>, handle: JobHandle, attempts: u32) -> Option<Self> {
        if images.is_empty() {
            return None;
        }
        Some(Self {
            images,
            handle,
            attempts,
        })
    }

    /// Output image URLs in backend order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// First output image URL.
    pub fn primary_image(&self) -> &str {
        &self.images[0]
    }

    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Status checks charged against the attempt budget.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_rejects_blank_run_id() {
        assert!(JobHandle::new("  ", None).is_none());
    }

    #[test]
    fn handle_drops_blank_external_id() {
        let handle = JobHandle::new("run-1", Some(String::new())).unwrap();
        assert_eq!(handle.external_job_id(), None);
        assert_eq!(handle.to_string(), "run-1");
    }

    #[test]
    fn handle_display_includes_external_id() {
        let handle = JobHandle::new("run-1", Some("ext-9".into())).unwrap();
        assert_eq!(handle.to_string(), "run-1 (ext-9)");
    }

    #[test]
    fn state_labels_parse() {
        assert_eq!(JobState::from_label("pending"), JobState::Pending);
        assert_eq!(JobState::from_label("RUNNING"), JobState::Running);
        assert_eq!(JobState::from_label("completed"), JobState::Completed);
        assert_eq!(JobState::from_label("failed"), JobState::Failed);
        assert_eq!(JobState::from_label("warming_up"), JobState::Unknown);
        assert!(!JobState::Unknown.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn result_requires_an_image() {
        let handle = JobHandle::new("run-1", None).unwrap();
        assert!(GenerationResult::new(Vec::new(), handle.clone(), 1).is_none());

        let result =
            GenerationResult::new(vec!["https://a".into(), "https://b".into()], handle, 3).unwrap();
        assert_eq!(result.primary_image(), "https://a");
        assert_eq!(result.images().len(), 2);
        assert_eq!(result.attempts(), 3);
    }
}
