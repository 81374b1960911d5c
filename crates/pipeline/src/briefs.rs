//! Scene brief generation.

use async_trait::async_trait;
use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::scene::BriefSheet;
use reelsmith_remote::JobKind;
use serde_json::json;

use crate::stage::StageError;
use crate::stages::Toolkit;

/// Turns a free-text brief into per-scene briefs.
#[async_trait]
pub trait BriefWriter: Send + Sync {
    /// Produce a sheet for `scene_count` scenes. The caller validates the
    /// count and numbering.
    async fn write_briefs(
        &self,
        descriptor: &TaskDescriptor,
        scene_count: usize,
    ) -> Result<BriefSheet, StageError>;
}

/// Brief writer backed by the remote `briefs` capability, which returns
/// the sheet as the job's structured `output`.
pub struct RemoteBriefWriter {
    toolkit: Toolkit,
}

impl RemoteBriefWriter {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl BriefWriter for RemoteBriefWriter {
    async fn write_briefs(
        &self,
        descriptor: &TaskDescriptor,
        scene_count: usize,
    ) -> Result<BriefSheet, StageError> {
        let params = json!({
            "brief": descriptor.brief,
            "scene_count": scene_count,
            "variant": descriptor.variant.as_str(),
            "aspect_ratio": descriptor.aspect_ratio.as_str(),
            "source_image_url": descriptor.source_image_url,
        });

        let result = self
            .toolkit
            .run_single(JobKind::Briefs, params, self.toolkit.config.briefs_deadline)
            .await?;

        let output = result
            .output
            .ok_or_else(|| StageError::InvalidOutput("brief writer returned no output".into()))?;
        serde_json::from_value(output)
            .map_err(|e| StageError::InvalidOutput(format!("unreadable brief sheet: {e}")))
    }
}
