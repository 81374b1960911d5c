//! The production stage list end to end, against an in-memory remote
//! capability. Time is paused so poll intervals and deadlines cost nothing.

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reelsmith_core::result::RunStatus;
use reelsmith_core::variant::PipelineVariant;
use reelsmith_pipeline::plan::standard_plan;
use reelsmith_pipeline::stages::audio::DEFAULT_MUSIC_PROMPT;
use reelsmith_pipeline::{PipelineConfig, PipelineEngine, RemoteBriefWriter, Toolkit};
use reelsmith_remote::{
    JobHandle, JobKind, JobQuery, JobStatus, PollLoop, RemoteCapability, RemoteError,
};
use serde_json::{json, Value};

use common::{descriptor, RecordingNotifier, RecordingProgress};

// ---------------------------------------------------------------------------
// Fake remote capability
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Fate {
    Fail,
    Hang,
}

/// Answers every job with success unless a rule says otherwise. A rule
/// matches a kind and, optionally, a substring of the submitted params.
struct FakeRemote {
    brief_count: usize,
    music_prompt: Option<&'static str>,
    music_directions: bool,
    rules: Vec<(JobKind, Option<&'static str>, Fate)>,
    next_id: AtomicUsize,
    submissions: Mutex<Vec<(JobKind, Value)>>,
    answers: Mutex<HashMap<String, JobQuery>>,
}

impl FakeRemote {
    fn new(brief_count: usize) -> Self {
        Self {
            brief_count,
            music_prompt: None,
            music_directions: true,
            rules: Vec::new(),
            next_id: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            answers: Mutex::new(HashMap::new()),
        }
    }

    fn with_rule(mut self, kind: JobKind, matching: Option<&'static str>, fate: Fate) -> Self {
        self.rules.push((kind, matching, fate));
        self
    }

    fn with_music_prompt(mut self, prompt: &'static str) -> Self {
        self.music_prompt = Some(prompt);
        self
    }

    fn without_music_directions(mut self) -> Self {
        self.music_directions = false;
        self
    }

    fn submitted(&self, kind: JobKind) -> Vec<Value> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn brief_sheet(&self) -> Value {
        let scenes: Vec<Value> = (1..=self.brief_count)
            .map(|n| {
                json!({
                    "scene_number": n,
                    "visual": format!("visual {n}"),
                    "motion": format!("motion {n}"),
                    "voice": format!("voice {n}"),
                    "music_direction": if self.music_directions {
                        format!("cello {n}")
                    } else {
                        String::new()
                    },
                })
            })
            .collect();
        json!({ "scenes": scenes, "music_prompt": self.music_prompt })
    }

    fn answer_for(&self, kind: JobKind, params: &Value, id: &str) -> JobQuery {
        let text = params.to_string();
        let fate = self.rules.iter().find_map(|(k, matching, fate)| {
            (*k == kind && matching.map_or(true, |m| text.contains(m))).then_some(*fate)
        });
        match fate {
            Some(Fate::Fail) => JobQuery {
                status: JobStatus::Failed,
                error: Some(format!("{kind} exploded")),
                ..JobQuery::unknown()
            },
            Some(Fate::Hang) => JobQuery {
                status: JobStatus::Running,
                ..JobQuery::unknown()
            },
            None if kind == JobKind::Briefs => JobQuery {
                status: JobStatus::Success,
                output: Some(self.brief_sheet()),
                ..JobQuery::unknown()
            },
            None => JobQuery {
                status: JobStatus::Success,
                result_url: Some(format!("https://cdn.test/{kind}/{id}")),
                ..JobQuery::unknown()
            },
        }
    }
}

#[async_trait]
impl RemoteCapability for FakeRemote {
    async fn submit(&self, kind: JobKind, params: &Value) -> Result<JobHandle, RemoteError> {
        let id = format!("job-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.submissions.lock().unwrap().push((kind, params.clone()));
        let answer = self.answer_for(kind, params, &id);
        self.answers.lock().unwrap().insert(id.clone(), answer);
        Ok(JobHandle { id, kind })
    }

    async fn query(&self, handle: &JobHandle) -> JobQuery {
        self.answers
            .lock()
            .unwrap()
            .get(&handle.id)
            .cloned()
            .unwrap_or_else(JobQuery::unknown)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Run {
    remote: Arc<FakeRemote>,
    notifier: Arc<RecordingNotifier>,
    progress: Arc<RecordingProgress>,
    result: reelsmith_core::result::PipelineResult,
}

async fn run(remote: FakeRemote, variant: PipelineVariant) -> Run {
    let remote = Arc::new(remote);
    let config = Arc::new(PipelineConfig::default());
    let toolkit = Toolkit::new(PollLoop::new(remote.clone()), config.clone());
    let writer = Arc::new(RemoteBriefWriter::new(toolkit.clone()));
    let progress = Arc::new(RecordingProgress::default());
    let notifier = Arc::new(RecordingNotifier::accepting());
    let engine = PipelineEngine::new(
        standard_plan(&toolkit, writer),
        progress.clone(),
        notifier.clone(),
    )
    .with_run_deadline(config.run_deadline);

    let result = engine.run(descriptor(variant)).await;
    Run {
        remote,
        notifier,
        progress,
        result,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Every stage succeeds: the captioned cut is the final artifact and every
/// intermediate artifact is kept.
#[tokio::test(start_paused = true)]
async fn happy_path_produces_captioned_cut() {
    let run = run(FakeRemote::new(5), PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    let final_url = run.result.final_url.clone().unwrap();
    assert!(final_url.starts_with("https://cdn.test/caption/"));
    // 5 images, 5 voiceovers, 5 videos, 2 music, composed, mixed, captioned.
    assert_eq!(run.result.artifacts.len(), 20);

    let merge = run.remote.submitted(JobKind::Merge);
    assert_eq!(merge.len(), 1);
    assert_eq!(merge[0]["scene_clip_urls"].as_array().unwrap().len(), 5);
    assert_eq!(merge[0]["voiceover_urls"].as_array().unwrap().len(), 5);
    assert_eq!(merge[0]["width"], 1080);
    assert_eq!(merge[0]["height"], 1920);

    let loudnorm = run.remote.submitted(JobKind::Loudnorm);
    assert_eq!(loudnorm[0]["offset_db"], -15.0);
    let music = run.remote.submitted(JobKind::Music);
    assert_eq!(
        music[0]["prompt"],
        "cello 1. cello 2. cello 3. cello 4. cello 5 (no words only melody)"
    );

    assert_eq!(run.notifier.success_count(), 1);
    assert_eq!(run.notifier.successes.lock().unwrap()[0].video_url, final_url);
    assert_eq!(run.progress.percents().last(), Some(&100));
}

/// Scenario C: four briefs instead of five fail the run at the first stage.
#[tokio::test(start_paused = true)]
async fn wrong_brief_count_fails_immediately() {
    let run = run(FakeRemote::new(4), PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Failed);
    let error = run.result.error.clone().unwrap();
    assert!(error.contains("briefs"), "{error}");
    assert!(error.contains("expected exactly 5 scene briefs, got 4"), "{error}");
    assert_eq!(run.remote.submissions.lock().unwrap().len(), 1);
    assert_eq!(run.notifier.failure_count(), 1);
    assert_eq!(run.notifier.success_count(), 0);
}

/// Scenario D: the music stage fails, the run completes without a track.
#[tokio::test(start_paused = true)]
async fn music_failure_completes_without_track() {
    let remote = FakeRemote::new(5).with_rule(JobKind::Music, None, Fate::Fail);
    let run = run(remote, PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    assert!(run.remote.submitted(JobKind::Loudnorm).is_empty());
    assert!(run.remote.submitted(JobKind::BackgroundMusic).is_empty());
    let caption = run.remote.submitted(JobKind::Caption);
    assert!(caption[0]["video_url"].as_str().unwrap().contains("/merge/"));
    assert_eq!(caption[0]["model_size"], "small");
}

/// Scenario B: one image never finishes. The batch returns at its group
/// deadline with four images and the run carries on with four scenes.
#[tokio::test(start_paused = true)]
async fn hanging_image_is_dropped_at_group_deadline() {
    let remote = FakeRemote::new(5).with_rule(JobKind::Image, Some("visual 4"), Fate::Hang);
    let run = run(remote, PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    let videos = run.remote.submitted(JobKind::Video);
    assert_eq!(videos.len(), 4);
    assert!(videos.iter().all(|v| v["prompt"] != "motion 4"));

    let merge = run.remote.submitted(JobKind::Merge);
    assert_eq!(merge[0]["scene_clip_urls"].as_array().unwrap().len(), 4);
    assert_eq!(merge[0]["voiceover_urls"].as_array().unwrap().len(), 4);
}

/// Fewer successful images than the threshold fails the run before any
/// video is requested.
#[tokio::test(start_paused = true)]
async fn image_shortfall_is_fatal() {
    let remote = FakeRemote::new(5)
        .with_rule(JobKind::Image, Some("visual 1"), Fate::Fail)
        .with_rule(JobKind::Image, Some("visual 2"), Fate::Fail)
        .with_rule(JobKind::Image, Some("visual 5"), Fate::Fail);
    let run = run(remote, PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Failed);
    assert_eq!(
        run.result.error.as_deref(),
        Some("stage 'images' failed: only 2 of 5 scene images succeeded (need 3)")
    );
    assert!(run.remote.submitted(JobKind::Video).is_empty());
    // The two images that did succeed are kept for diagnostics.
    assert_eq!(run.result.artifacts.len(), 2);
}

/// Every voiceover failing falls back to silent narration.
#[tokio::test(start_paused = true)]
async fn voiceover_failure_composes_silent_cut() {
    let remote = FakeRemote::new(5).with_rule(JobKind::Voiceover, None, Fate::Fail);
    let run = run(remote, PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    let merge = run.remote.submitted(JobKind::Merge);
    let voiceovers = merge[0]["voiceover_urls"].as_array().unwrap();
    assert_eq!(voiceovers.len(), 5);
    assert!(voiceovers.iter().all(|v| v == ""));
}

/// The extended variant writes six scenes, needs four, and uses the
/// writer's dedicated music prompt.
#[tokio::test(start_paused = true)]
async fn extended_variant_uses_six_scenes_and_music_prompt() {
    let remote = FakeRemote::new(6)
        .with_music_prompt("slow ambient synths")
        .with_rule(JobKind::Video, Some("motion 2"), Fate::Fail)
        .with_rule(JobKind::Video, Some("motion 6"), Fate::Fail);
    let run = run(remote, PipelineVariant::Extended).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    assert_eq!(run.remote.submitted(JobKind::Image).len(), 6);
    let music = run.remote.submitted(JobKind::Music);
    assert_eq!(music[0]["prompt"], "slow ambient synths");
    let merge = run.remote.submitted(JobKind::Merge);
    assert_eq!(merge[0]["scene_clip_urls"].as_array().unwrap().len(), 4);
}

/// A failing caption job keeps the mixed cut as the final artifact.
#[tokio::test(start_paused = true)]
async fn caption_failure_keeps_mixed_cut() {
    let remote = FakeRemote::new(5).with_rule(JobKind::Caption, None, Fate::Fail);
    let run = run(remote, PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    assert!(run
        .result
        .final_url
        .as_deref()
        .unwrap()
        .starts_with("https://cdn.test/background-music/"));
}

/// A failed loudness normalization keeps the raw track for the mix.
#[tokio::test(start_paused = true)]
async fn loudnorm_failure_mixes_raw_track() {
    let remote = FakeRemote::new(5).with_rule(JobKind::Loudnorm, None, Fate::Fail);
    let run = run(remote, PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    assert_eq!(run.remote.submitted(JobKind::Loudnorm).len(), 1);

    let mix = run.remote.submitted(JobKind::BackgroundMusic);
    assert_eq!(mix.len(), 1);
    assert!(mix[0]["music_url"]
        .as_str()
        .unwrap()
        .starts_with("https://cdn.test/music/"));
    assert!(run
        .result
        .artifacts
        .iter()
        .all(|a| a.label != "music_normalized"));
    assert!(run
        .result
        .final_url
        .as_deref()
        .unwrap()
        .starts_with("https://cdn.test/caption/"));
}

/// Without any music direction the stage falls back to a stock prompt.
#[tokio::test(start_paused = true)]
async fn missing_music_directions_use_default_prompt() {
    let remote = FakeRemote::new(5).without_music_directions();
    let run = run(remote, PipelineVariant::Standard).await;

    assert_eq!(run.result.status, RunStatus::Completed);
    let music = run.remote.submitted(JobKind::Music);
    assert_eq!(music.len(), 1);
    assert_eq!(music[0]["prompt"], DEFAULT_MUSIC_PROMPT);
    assert_eq!(run.remote.submitted(JobKind::BackgroundMusic).len(), 1);
}
