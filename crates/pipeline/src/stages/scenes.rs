//! Per-scene fan-out stages: images, voiceovers and video clips.
//!
//! Each stage submits one remote job per scene, waits for the batch under
//! its group deadline and writes results back by scene index.

use async_trait::async_trait;
use reelsmith_remote::{FanOutOutcome, JobKind, JobResult};
use serde_json::json;

use crate::context::RunContext;
use crate::stage::{StageError, StageExecutor};
use crate::stages::Toolkit;

fn ensure_scenes(ctx: &RunContext) -> Result<(), StageError> {
    if ctx.scenes.is_empty() {
        return Err(StageError::MissingInput("no scene briefs".into()));
    }
    Ok(())
}

fn ensure_at_least(
    outcome: &FanOutOutcome<JobResult>,
    what: &'static str,
    required: usize,
) -> Result<(), StageError> {
    let succeeded = outcome.successes();
    if succeeded < required {
        return Err(StageError::Shortfall {
            what,
            succeeded,
            required,
            total: outcome.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// One still image per scene, conditioned on the task's source image.
pub struct ImagesStage {
    toolkit: Toolkit,
}

impl ImagesStage {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl StageExecutor for ImagesStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        ensure_scenes(ctx)?;
        let source = &ctx.descriptor.source_image_url;
        let aspect = ctx.descriptor.aspect_ratio.as_str();

        let params = ctx
            .scenes
            .iter()
            .map(|scene| {
                let prompt = scene.brief.visual.trim();
                (!prompt.is_empty()).then(|| {
                    json!({
                        "prompt": prompt,
                        "image_urls": [source],
                        "aspect_ratio": aspect,
                    })
                })
            })
            .collect();

        let outcome = self
            .toolkit
            .fanout
            .run_remote(JobKind::Image, params, self.toolkit.config.image_deadline)
            .await;

        for (idx, slot) in outcome.slots.iter().enumerate() {
            let url = slot.as_ref().and_then(|r| r.url.clone());
            if let Some(url) = &url {
                let label = format!("scene_{}_image", ctx.scenes[idx].scene_number());
                ctx.record_artifact("images", label, url);
            }
            ctx.scenes[idx].image_url = url;
        }

        let required = ctx.descriptor.variant.min_successful_scenes();
        ensure_at_least(&outcome, "scene images", required)
    }
}

// ---------------------------------------------------------------------------
// Voiceovers
// ---------------------------------------------------------------------------

/// Narration per scene. Fails only when no scene gets a voiceover.
pub struct VoiceoversStage {
    toolkit: Toolkit,
}

impl VoiceoversStage {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl StageExecutor for VoiceoversStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        ensure_scenes(ctx)?;

        let params = ctx
            .scenes
            .iter()
            .map(|scene| {
                let text = scene.brief.voice_text();
                if text.is_empty() {
                    return None;
                }
                let style = scene.brief.voice_style.clone().unwrap_or_default();
                Some(json!({
                    "text": text,
                    "voice_id": style.resolved_voice_id(),
                    "emotion": style.resolved_emotion(),
                }))
            })
            .collect();

        let outcome = self
            .toolkit
            .fanout
            .run_remote(JobKind::Voiceover, params, self.toolkit.config.voiceover_deadline)
            .await;

        for (idx, slot) in outcome.slots.iter().enumerate() {
            let url = slot.as_ref().and_then(|r| r.url.clone());
            if let Some(url) = &url {
                let label = format!("scene_{}_voiceover", ctx.scenes[idx].scene_number());
                ctx.record_artifact("voiceovers", label, url);
            }
            ctx.scenes[idx].voiceover_url = url;
        }

        ensure_at_least(&outcome, "voiceovers", 1)
    }
}

// ---------------------------------------------------------------------------
// Videos
// ---------------------------------------------------------------------------

/// Animates each scene image into a clip. Scenes without an image are
/// skipped and count as failures.
pub struct VideosStage {
    toolkit: Toolkit,
}

impl VideosStage {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }
}

#[async_trait]
impl StageExecutor for VideosStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        ensure_scenes(ctx)?;
        let aspect = ctx.descriptor.aspect_ratio.as_str();

        let params = ctx
            .scenes
            .iter()
            .map(|scene| {
                let image_url = scene.image_url.as_deref()?;
                let motion = scene.brief.motion.trim();
                let prompt = if motion.is_empty() {
                    scene.brief.visual.trim()
                } else {
                    motion
                };
                Some(json!({
                    "image_url": image_url,
                    "prompt": prompt,
                    "aspect_ratio": aspect,
                }))
            })
            .collect();

        let outcome = self
            .toolkit
            .fanout
            .run_remote(JobKind::Video, params, self.toolkit.config.video_deadline)
            .await;

        for (idx, slot) in outcome.slots.iter().enumerate() {
            let url = slot.as_ref().and_then(|r| r.url.clone());
            if let Some(url) = &url {
                let label = format!("scene_{}_video", ctx.scenes[idx].scene_number());
                ctx.record_artifact("videos", label, url);
            }
            ctx.scenes[idx].video_url = url;
        }

        let required = ctx.descriptor.variant.min_successful_scenes();
        ensure_at_least(&outcome, "scene videos", required)
    }
}
