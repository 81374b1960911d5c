//! The immutable work request a pipeline run is driven by.
//!
//! The ingestion layer deserializes an [`IngestRequest`], converts it with
//! [`IngestRequest::into_descriptor`] and enqueues the resulting
//! [`TaskDescriptor`]. Nothing downstream mutates a descriptor.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::aspect::AspectRatio;
use crate::error::CoreError;
use crate::types::TaskId;
use crate::variant::PipelineVariant;

/// Characters of the brief kept in task-state records for display.
pub const BRIEF_PREVIEW_LEN: usize = 100;

/// Raw request as received by the ingestion layer.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IngestRequest {
    /// Caller-supplied idempotency key. A fresh UUID is used when absent.
    #[serde(default)]
    pub task_id: Option<String>,
    #[validate(length(min = 1, max = 8000))]
    pub prompt: String,
    #[validate(url)]
    pub image_url: String,
    #[validate(length(min = 1))]
    pub video_id: String,
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(email)]
    pub user_email: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[validate(url)]
    pub callback_url: String,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub variant: PipelineVariant,
}

/// Validated, immutable input for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub task_id: TaskId,
    pub owner_id: String,
    pub owner_email: String,
    pub owner_name: Option<String>,
    pub content_id: String,
    pub conversation_id: Option<String>,
    pub brief: String,
    pub source_image_url: String,
    pub aspect_ratio: AspectRatio,
    pub callback_url: String,
    pub variant: PipelineVariant,
}

impl IngestRequest {
    /// Validate the request and turn it into a [`TaskDescriptor`].
    pub fn into_descriptor(self) -> Result<TaskDescriptor, CoreError> {
        self.validate()?;

        let brief = self.prompt.trim().to_string();
        if brief.is_empty() {
            return Err(CoreError::Validation("prompt must not be blank".into()));
        }

        let aspect_ratio = match self.aspect_ratio.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => AspectRatio::default(),
        };

        let task_id = self
            .task_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(TaskDescriptor {
            task_id,
            owner_id: self.user_id,
            owner_email: self.user_email,
            owner_name: self.user_name.filter(|n| !n.trim().is_empty()),
            content_id: self.video_id,
            conversation_id: self.chat_id.filter(|c| !c.trim().is_empty()),
            brief,
            source_image_url: self.image_url,
            aspect_ratio,
            callback_url: self.callback_url,
            variant: self.variant,
        })
    }
}

impl TaskDescriptor {
    /// Leading part of the brief, cut on a character boundary.
    pub fn brief_preview(&self) -> String {
        let mut chars = self.brief.chars();
        let preview: String = chars.by_ref().take(BRIEF_PREVIEW_LEN).collect();
        if chars.next().is_some() {
            format!("{preview}...")
        } else {
            preview
        }
    }
}
