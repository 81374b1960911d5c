//! Stage deadlines, mix levels and other pipeline tunables.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Transcription model size used for burned-in captions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionModel {
    Tiny,
    Base,
    #[default]
    Small,
    Medium,
    Large,
}

impl CaptionModel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tiny => "tiny",
            Self::Base => "base",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl FromStr for CaptionModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiny" => Ok(Self::Tiny),
            "base" => Ok(Self::Base),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown caption model '{other}'")),
        }
    }
}

impl fmt::Display for CaptionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for one pipeline deployment. Built once at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Interval between status queries for every remote job.
    pub poll_interval: Duration,
    /// Upper bound on a whole run, callback excluded.
    pub run_deadline: Duration,

    pub briefs_deadline: Duration,
    /// Group deadline for the per-scene image batch.
    pub image_deadline: Duration,
    /// Group deadline for the per-scene voiceover batch.
    pub voiceover_deadline: Duration,
    /// Group deadline for the per-scene video batch.
    pub video_deadline: Duration,
    pub music_deadline: Duration,
    pub loudnorm_deadline: Duration,
    pub merge_deadline: Duration,
    pub background_music_deadline: Duration,
    pub caption_deadline: Duration,

    /// Requested length of the generated music track.
    pub music_duration_secs: u32,
    /// Loudness offset applied to the music track, in dB.
    pub loudnorm_offset_db: f32,
    pub merge_video_volume: f32,
    pub merge_voiceover_volume: f32,
    pub mix_music_volume: f32,
    pub mix_video_volume: f32,
    pub caption_model: CaptionModel,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            run_deadline: Duration::from_secs(1200),
            briefs_deadline: Duration::from_secs(120),
            image_deadline: Duration::from_secs(300),
            voiceover_deadline: Duration::from_secs(300),
            video_deadline: Duration::from_secs(600),
            music_deadline: Duration::from_secs(900),
            loudnorm_deadline: Duration::from_secs(120),
            merge_deadline: Duration::from_secs(480),
            background_music_deadline: Duration::from_secs(300),
            caption_deadline: Duration::from_secs(600),
            music_duration_secs: 60,
            loudnorm_offset_db: -15.0,
            merge_video_volume: 0.2,
            merge_voiceover_volume: 2.0,
            mix_music_volume: 0.3,
            mix_video_volume: 1.0,
            caption_model: CaptionModel::Small,
        }
    }
}
