//! Mutable state accumulated while a run walks its stages.

use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::result::Artifact;
use reelsmith_core::scene::SceneUnit;

use crate::stage::Fallback;

/// Per-run working state, owned by the engine for the run's lifetime.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub descriptor: TaskDescriptor,
    /// Scene units in scene-number order, filled by the brief stage.
    pub scenes: Vec<SceneUnit>,
    /// Dedicated music prompt from the brief writer, if any.
    pub music_prompt: Option<String>,
    /// Loudness-normalized music track.
    pub music_url: Option<String>,
    /// Latest assembled video. The final artifact once all stages ran.
    pub current_cut: Option<String>,
    artifacts: Vec<Artifact>,
}

impl RunContext {
    pub fn new(descriptor: TaskDescriptor) -> Self {
        Self {
            descriptor,
            scenes: Vec::new(),
            music_prompt: None,
            music_url: None,
            current_cut: None,
            artifacts: Vec::new(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.descriptor.task_id
    }

    /// Keep an intermediate artifact for diagnostics.
    pub fn record_artifact(&mut self, stage: &str, label: impl Into<String>, url: &str) {
        self.artifacts.push(Artifact {
            stage: stage.to_string(),
            label: label.into(),
            url: url.to_string(),
        });
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Split into the descriptor, the final cut and the artifact ledger.
    pub fn into_parts(self) -> (TaskDescriptor, Option<String>, Vec<Artifact>) {
        (self.descriptor, self.current_cut, self.artifacts)
    }

    /// Put the context into the placeholder state a failed optional stage
    /// leaves behind.
    pub fn apply_fallback(&mut self, fallback: Fallback) {
        match fallback {
            Fallback::SilentVoiceovers => {
                for scene in &mut self.scenes {
                    scene.voiceover_url = None;
                }
            }
            Fallback::NoMusic => self.music_url = None,
            Fallback::KeepCurrentCut => {}
        }
    }
}
