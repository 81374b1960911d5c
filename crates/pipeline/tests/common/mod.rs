//! Shared fakes for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use reelsmith_core::aspect::AspectRatio;
use reelsmith_core::descriptor::TaskDescriptor;
use reelsmith_core::task_state::Progress;
use reelsmith_core::variant::PipelineVariant;
use reelsmith_events::{FailurePayload, SuccessPayload, TerminalNotifier};
use reelsmith_pipeline::ProgressReporter;

pub fn descriptor(variant: PipelineVariant) -> TaskDescriptor {
    TaskDescriptor {
        task_id: "task-1".into(),
        owner_id: "user-1".into(),
        owner_email: "owner@example.com".into(),
        owner_name: Some("Ada".into()),
        content_id: "video-1".into(),
        conversation_id: Some("chat-1".into()),
        brief: "An astronaut plants a garden on the moon".into(),
        source_image_url: "https://cdn.test/source.png".into(),
        aspect_ratio: AspectRatio::Portrait,
        callback_url: "https://hooks.test/done".into(),
        variant,
    }
}

/// Records every progress report.
#[derive(Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<Progress>>,
}

impl RecordingProgress {
    pub fn percents(&self) -> Vec<u8> {
        self.reports.lock().unwrap().iter().map(|p| p.percent).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.reports.lock().unwrap().iter().map(|p| p.label.clone()).collect()
    }
}

#[async_trait]
impl ProgressReporter for RecordingProgress {
    async fn report(&self, _task_id: &str, progress: Progress) {
        self.reports.lock().unwrap().push(progress);
    }
}

/// Records every callback and answers with a fixed delivery outcome.
pub struct RecordingNotifier {
    pub accept: bool,
    pub successes: Mutex<Vec<SuccessPayload>>,
    pub failures: Mutex<Vec<FailurePayload>>,
}

impl RecordingNotifier {
    pub fn accepting() -> Self {
        Self::with_outcome(true)
    }

    pub fn rejecting() -> Self {
        Self::with_outcome(false)
    }

    fn with_outcome(accept: bool) -> Self {
        Self {
            accept,
            successes: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    pub fn success_count(&self) -> usize {
        self.successes.lock().unwrap().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }
}

#[async_trait]
impl TerminalNotifier for RecordingNotifier {
    async fn notify_success(&self, _endpoint: &str, payload: &SuccessPayload) -> bool {
        self.successes.lock().unwrap().push(payload.clone());
        self.accept
    }

    async fn notify_failure(&self, _endpoint: &str, payload: &FailurePayload) -> bool {
        self.failures.lock().unwrap().push(payload.clone());
        self.accept
    }
}
