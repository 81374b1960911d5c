//! Stages that assemble and finish the cut: compose, music mix, captions.

use async_trait::async_trait;
use reelsmith_remote::JobKind;
use serde_json::json;

use crate::context::RunContext;
use crate::stage::{StageError, StageExecutor};
use crate::stages::{require_url, Toolkit};

fn current_cut(ctx: &RunContext) -> Result<String, StageError> {
    ctx.current_cut
        .clone()
        .ok_or_else(|| StageError::MissingInput("no composed video".into()))
}

// ---------------------------------------------------------------------------
// Compose
// ---------------------------------------------------------------------------

/// Merges the successful scene clips with their voiceovers into one cut at
/// the task's resolution. Voiceovers are matched to clips by position; a
/// scene without narration contributes an empty reference.
pub struct ComposeStage {
    toolkit: Toolkit,
}

impl ComposeStage {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl StageExecutor for ComposeStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        let config = &self.toolkit.config;
        let (clips, voiceovers): (Vec<&str>, Vec<&str>) = ctx
            .scenes
            .iter()
            .filter_map(|scene| {
                let clip = scene.video_url.as_deref()?;
                Some((clip, scene.voiceover_url.as_deref().unwrap_or_default()))
            })
            .unzip();

        if clips.is_empty() {
            return Err(StageError::MissingInput("no scene clips to compose".into()));
        }

        let resolution = ctx.descriptor.aspect_ratio.resolution();
        let params = json!({
            "scene_clip_urls": clips,
            "voiceover_urls": voiceovers,
            "width": resolution.width,
            "height": resolution.height,
            "video_volume": config.merge_video_volume,
            "voiceover_volume": config.merge_voiceover_volume,
        });

        let result = self
            .toolkit
            .run_single(JobKind::Merge, params, config.merge_deadline)
            .await?;
        let url = require_url(result, "merge")?;
        ctx.record_artifact("compose", "composed", &url);
        ctx.current_cut = Some(url);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Music mix
// ---------------------------------------------------------------------------

/// Lays the music track under the cut. A no-op when there is no music.
pub struct MusicMixStage {
    toolkit: Toolkit,
}

impl MusicMixStage {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl StageExecutor for MusicMixStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        let Some(music_url) = ctx.music_url.clone() else {
            tracing::info!(task_id = ctx.task_id(), "No music track, skipping mix");
            return Ok(());
        };
        let config = &self.toolkit.config;
        let video_url = current_cut(ctx)?;

        let result = self
            .toolkit
            .run_single(
                JobKind::BackgroundMusic,
                json!({
                    "video_url": video_url,
                    "music_url": music_url,
                    "music_volume": config.mix_music_volume,
                    "video_volume": config.mix_video_volume,
                }),
                config.background_music_deadline,
            )
            .await?;
        let url = require_url(result, "background music")?;
        ctx.record_artifact("music_mix", "with_music", &url);
        ctx.current_cut = Some(url);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Captions
// ---------------------------------------------------------------------------

/// Transcribes the narration and burns captions into the cut.
pub struct CaptionsStage {
    toolkit: Toolkit,
}

impl CaptionsStage {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl StageExecutor for CaptionsStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        let config = &self.toolkit.config;
        let video_url = current_cut(ctx)?;

        let result = self
            .toolkit
            .run_single(
                JobKind::Caption,
                json!({
                    "video_url": video_url,
                    "model_size": config.caption_model.as_str(),
                }),
                config.caption_deadline,
            )
            .await?;
        let url = require_url(result, "caption")?;
        ctx.record_artifact("captions", "captioned", &url);
        ctx.current_cut = Some(url);
        Ok(())
    }
}
