use async_trait::async_trait;
use reelsmith_core::scene::combined_music_direction;
use reelsmith_remote::JobKind;
use serde_json::json;

use crate::context::RunContext;
use crate::stage::{StageError, StageExecutor};
use crate::stages::{require_url, Toolkit};

/// Prompt used when neither the brief writer nor any scene gives a music
/// direction.
pub const DEFAULT_MUSIC_PROMPT: &str = "Upbeat commercial background music, energetic and engaging, \
     perfect for product showcase (no words only melody)";

/// Appended to prompts built from scene directions.
const INSTRUMENTAL_SUFFIX: &str = " (no words only melody)";

/// Generates a background track, then loudness-normalizes it.
///
/// The prompt is the brief writer's dedicated music prompt when there is
/// one, otherwise the scenes' music directions joined together, otherwise
/// [`DEFAULT_MUSIC_PROMPT`]. A failed normalization keeps the raw track.
pub struct MusicStage {
    toolkit: Toolkit,
}

impl MusicStage {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }

    fn prompt(ctx: &RunContext) -> String {
        if let Some(prompt) = ctx.music_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            return prompt.to_string();
        }
        let combined = combined_music_direction(&ctx.scenes);
        if combined.is_empty() {
            DEFAULT_MUSIC_PROMPT.to_string()
        } else {
            combined + INSTRUMENTAL_SUFFIX
        }
    }
}

#[async_trait]
impl StageExecutor for MusicStage {
    async fn execute(&self, ctx: &mut RunContext) -> Result<(), StageError> {
        let config = &self.toolkit.config;
        let prompt = Self::prompt(ctx);

        let raw = self
            .toolkit
            .run_single(
                JobKind::Music,
                json!({
                    "prompt": prompt,
                    "duration_secs": config.music_duration_secs,
                }),
                config.music_deadline,
            )
            .await?;
        let raw_url = require_url(raw, "music")?;
        ctx.record_artifact("music", "music_raw", &raw_url);

        let normalized = self
            .toolkit
            .run_single(
                JobKind::Loudnorm,
                json!({
                    "audio_url": raw_url,
                    "offset_db": config.loudnorm_offset_db,
                }),
                config.loudnorm_deadline,
            )
            .await
            .and_then(|result| require_url(result, "loudness normalization"));

        let music_url = match normalized {
            Ok(url) => {
                ctx.record_artifact("music", "music_normalized", &url);
                url
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %ctx.task_id(),
                    error = %e,
                    "Music normalization failed, keeping raw track",
                );
                raw_url
            }
        };
        ctx.music_url = Some(music_url);
        Ok(())
    }
}
