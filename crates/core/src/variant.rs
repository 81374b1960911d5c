//! Pipeline variants: how many scenes a run produces and how many must
//! survive the required generation stages.

use serde::{Deserialize, Serialize};

/// Which stage plan a task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineVariant {
    /// Five scenes, music direction derived from the per-scene briefs.
    #[default]
    Standard,
    /// Six scenes, a dedicated music prompt from the brief writer, and
    /// per-scene voice styles.
    Extended,
}

impl PipelineVariant {
    /// Exact number of scene briefs the brief-writing stage must produce.
    pub fn scene_count(self) -> usize {
        match self {
            Self::Standard => 5,
            Self::Extended => 6,
        }
    }

    /// Minimum successful scenes for the image and video stages to pass.
    pub fn min_successful_scenes(self) -> usize {
        match self {
            Self::Standard => 3,
            Self::Extended => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}
