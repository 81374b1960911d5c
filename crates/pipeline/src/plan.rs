//! The production stage list.
//!
//! | # | Stage        | Policy   | %  | Fallback           |
//! |---|--------------|----------|----|--------------------|
//! | 1 | `briefs`     | required | 10 |                    |
//! | 2 | `images`     | required | 25 |                    |
//! | 3 | `voiceovers` | optional | 35 | `SilentVoiceovers` |
//! | 4 | `videos`     | required | 50 |                    |
//! | 5 | `music`      | optional | 65 | `NoMusic`          |
//! | 6 | `compose`    | required | 80 |                    |
//! | 7 | `music_mix`  | optional | 85 | `KeepCurrentCut`   |
//! | 8 | `captions`   | optional | 90 | `KeepCurrentCut`   |
//!
//! Both variants share the list; scene count and success thresholds come
//! from the task's [`PipelineVariant`](reelsmith_core::variant::PipelineVariant).

use std::sync::Arc;

use crate::briefs::BriefWriter;
use crate::stage::{Fallback, Stage};
use crate::stages::assembly::{CaptionsStage, ComposeStage, MusicMixStage};
use crate::stages::audio::MusicStage;
use crate::stages::briefs::BriefsStage;
use crate::stages::scenes::{ImagesStage, VideosStage, VoiceoversStage};
use crate::stages::Toolkit;

/// Build the ordered stage list.
pub fn standard_plan(toolkit: &Toolkit, writer: Arc<dyn BriefWriter>) -> Vec<Stage> {
    vec![
        Stage::required(
            "briefs",
            "Writing scene briefs",
            10,
            Arc::new(BriefsStage::new(writer)),
        ),
        Stage::required(
            "images",
            "Generating scene images",
            25,
            Arc::new(ImagesStage::new(toolkit.clone())),
        ),
        Stage::optional(
            "voiceovers",
            "Recording voiceovers",
            35,
            Fallback::SilentVoiceovers,
            Arc::new(VoiceoversStage::new(toolkit.clone())),
        ),
        Stage::required(
            "videos",
            "Animating scenes",
            50,
            Arc::new(VideosStage::new(toolkit.clone())),
        ),
        Stage::optional(
            "music",
            "Composing music",
            65,
            Fallback::NoMusic,
            Arc::new(MusicStage::new(toolkit.clone())),
        ),
        Stage::required(
            "compose",
            "Composing final video",
            80,
            Arc::new(ComposeStage::new(toolkit.clone())),
        ),
        Stage::optional(
            "music_mix",
            "Adding background music",
            85,
            Fallback::KeepCurrentCut,
            Arc::new(MusicMixStage::new(toolkit.clone())),
        ),
        Stage::optional(
            "captions",
            "Adding captions",
            90,
            Fallback::KeepCurrentCut,
            Arc::new(CaptionsStage::new(toolkit.clone())),
        ),
    ]
}
