//! Wiring from configuration to a ready [`PipelineEngine`].

use std::sync::Arc;

use reelsmith_db::TaskStore;
use reelsmith_events::{CallbackError, CallbackNotifier};
use reelsmith_pipeline::plan::standard_plan;
use reelsmith_pipeline::{PipelineEngine, RemoteBriefWriter, StoreProgressReporter, Toolkit};
use reelsmith_remote::{PollLoop, RemoteJobClient};

use crate::config::WorkerConfig;

/// Build the production engine: remote client, standard stage plan,
/// store-backed progress and HTTP callbacks.
pub fn build_engine(
    config: &WorkerConfig,
    store: Arc<dyn TaskStore>,
) -> Result<PipelineEngine, CallbackError> {
    let client = Arc::new(RemoteJobClient::new(config.remote_api_url.clone()));
    let toolkit = Toolkit::new(PollLoop::new(client), Arc::new(config.pipeline.clone()));
    let writer = Arc::new(RemoteBriefWriter::new(toolkit.clone()));
    let stages = standard_plan(&toolkit, writer);

    let notifier = CallbackNotifier::new(config.callback_timeout, &config.callback_user_agent)?;
    let progress = StoreProgressReporter::new(store);

    tracing::debug!(
        remote_api_url = %config.remote_api_url,
        stages = stages.len(),
        "Pipeline engine configured",
    );

    Ok(
        PipelineEngine::new(stages, Arc::new(progress), Arc::new(notifier))
            .with_run_deadline(config.pipeline.run_deadline),
    )
}
