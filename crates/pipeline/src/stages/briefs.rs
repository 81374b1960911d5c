use std::sync::Arc;

use async_trait::async_trait;

use crate::briefs::BriefWriter;
use crate::context::RunContext;
use crate::stage::{StageError, StageExecutor};

/// Writes and validates the scene briefs. Produces exactly the variant's
/// scene count, or fails.
pub struct BriefsStage {
    writer: Arc<dyn BriefWriter>,
}

impl BriefsStage {
    pub fn new(writer: Arc<dyn BriefWriter>) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl StageExecutor for BriefsStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        let expected = ctx.descriptor.variant.scene_count();
        let sheet = self.writer.write_briefs(&ctx.descriptor, expected).await?;
        let music_prompt = sheet.music_prompt().map(str::to_string);

        ctx.scenes = sheet.into_scenes(expected)?;
        ctx.music_prompt = music_prompt;

        tracing::info!(
            task_id = ctx.task_id(),
            scenes = ctx.scenes.len(),
            has_music_prompt = ctx.music_prompt.is_some(),
            "Scene briefs ready",
        );
        Ok(())
    }
}
