//! Remote job identifiers, kinds and status values.

use std::fmt;

use serde::Serialize;

/// The remote capabilities the pipeline submits work to.
///
/// Each kind maps to one `POST {base}/tasks/{path}` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    Briefs,
    Image,
    Voiceover,
    Video,
    Music,
    Loudnorm,
    Merge,
    BackgroundMusic,
    Caption,
}

impl JobKind {
    /// URL path segment for this capability.
    pub fn path(self) -> &'static str {
        match self {
            Self::Briefs => "briefs",
            Self::Image => "image",
            Self::Voiceover => "voiceover",
            Self::Video => "video",
            Self::Music => "music",
            Self::Loudnorm => "loudnorm",
            Self::Merge => "merge",
            Self::BackgroundMusic => "background-music",
            Self::Caption => "caption",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Opaque handle to a submitted remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    pub kind: JobKind,
}

/// Status reported by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    Failed,
    /// Malformed, unreachable or unrecognized. Callers keep polling.
    Unknown,
}

impl JobStatus {
    /// Map a wire status string. Unrecognized values become [`JobStatus::Unknown`].
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => Self::Queued,
            "running" | "processing" | "in_progress" => Self::Running,
            "success" | "succeeded" | "completed" => Self::Success,
            "failed" | "error" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// One status query answer.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    pub status: JobStatus,
    /// Normalized media reference, when the job produced one.
    pub result_url: Option<String>,
    /// Structured output document, when the job produced one.
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl JobQuery {
    pub fn unknown() -> Self {
        Self {
            status: JobStatus::Unknown,
            result_url: None,
            output: None,
            error: None,
        }
    }
}

/// Payload of a successfully finished job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub url: Option<String>,
    pub output: Option<serde_json::Value>,
}

impl JobResult {
    /// The media reference, or an empty string when the job produced
    /// only structured output.
    pub fn url_or_empty(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }
}
