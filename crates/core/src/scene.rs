//! Scene briefs and the per-scene artifacts accumulated during a run.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Upper bound on voiceover text handed to the speech capability.
pub const MAX_VOICE_TEXT_CHARS: usize = 5000;

/// Voice used when a brief names none.
pub const DEFAULT_VOICE_ID: &str = "Wise_Woman";

/// Emotion used when a brief names none or an unsupported one.
pub const DEFAULT_EMOTION: &str = "neutral";

/// Emotions the speech capability accepts.
pub const SUPPORTED_EMOTIONS: [&str; 7] = [
    "neutral",
    "happy",
    "sad",
    "angry",
    "fearful",
    "disgusted",
    "surprised",
];

// ---------------------------------------------------------------------------
// Briefs
// ---------------------------------------------------------------------------

/// Optional speaking style attached to a voice brief.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoiceStyle {
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
}

impl VoiceStyle {
    /// Voice id with the default applied.
    pub fn resolved_voice_id(&self) -> &str {
        self.voice_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VOICE_ID)
    }

    /// Emotion mapped onto [`SUPPORTED_EMOTIONS`], falling back to neutral.
    pub fn resolved_emotion(&self) -> &'static str {
        let wanted = self
            .emotion
            .as_deref()
            .map(|e| e.trim().to_ascii_lowercase())
            .unwrap_or_default();
        SUPPORTED_EMOTIONS
            .iter()
            .copied()
            .find(|e| *e == wanted)
            .unwrap_or(DEFAULT_EMOTION)
    }
}

/// Per-modality briefs for one scene, as written by the brief writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBrief {
    pub scene_number: u32,
    /// Still-image prompt.
    #[serde(alias = "image_prompt")]
    pub visual: String,
    /// Image-to-video motion prompt.
    #[serde(default, alias = "video_prompt")]
    pub motion: String,
    /// Voiceover text.
    #[serde(default, alias = "voiceover")]
    pub voice: String,
    #[serde(default)]
    pub voice_style: Option<VoiceStyle>,
    #[serde(default)]
    pub ambient_sound: String,
    #[serde(default)]
    pub music_direction: String,
}

impl SceneBrief {
    /// Voice text trimmed and capped at [`MAX_VOICE_TEXT_CHARS`].
    pub fn voice_text(&self) -> String {
        self.voice.trim().chars().take(MAX_VOICE_TEXT_CHARS).collect()
    }
}

/// Brief writer output: one brief per scene plus an optional dedicated
/// music prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefSheet {
    pub scenes: Vec<SceneBrief>,
    #[serde(default)]
    pub music_prompt: Option<String>,
}

impl BriefSheet {
    /// Validate the sheet and turn it into ordered scene units.
    ///
    /// Requires exactly `expected` scenes numbered `1..=expected` (in any
    /// input order) with a non-blank visual brief each.
    pub fn into_scenes(self, expected: usize) -> Result<Vec<SceneUnit>, CoreError> {
        if self.scenes.len() != expected {
            return Err(CoreError::Validation(format!(
                "expected exactly {expected} scene briefs, got {}",
                self.scenes.len()
            )));
        }

        let mut briefs = self.scenes;
        briefs.sort_by_key(|b| b.scene_number);

        for (idx, brief) in briefs.iter().enumerate() {
            let wanted = idx as u32 + 1;
            if brief.scene_number != wanted {
                return Err(CoreError::Validation(format!(
                    "scene numbers must run 1..={expected}; found {} where {wanted} was expected",
                    brief.scene_number
                )));
            }
            if brief.visual.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "scene {wanted} has an empty visual brief"
                )));
            }
        }

        Ok(briefs.into_iter().map(SceneUnit::new).collect())
    }

    /// Dedicated music prompt, if the writer produced a non-blank one.
    pub fn music_prompt(&self) -> Option<&str> {
        self.music_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Scene units
// ---------------------------------------------------------------------------

/// One scene and the artifacts produced for it so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneUnit {
    pub brief: SceneBrief,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub voiceover_url: Option<String>,
}

impl SceneUnit {
    pub fn new(brief: SceneBrief) -> Self {
        Self {
            brief,
            image_url: None,
            video_url: None,
            voiceover_url: None,
        }
    }

    pub fn scene_number(&self) -> u32 {
        self.brief.scene_number
    }
}

/// Join the per-scene music directions into a single prompt.
pub fn combined_music_direction(scenes: &[SceneUnit]) -> String {
    scenes
        .iter()
        .map(|s| s.brief.music_direction.trim())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(". ")
}
