//! Pipeline orchestration.
//!
//! [`PipelineEngine`] walks an ordered list of [`Stage`] descriptors over a
//! mutable [`RunContext`], reports progress at every transition, applies
//! typed fallbacks when optional stages fail, and sends exactly one
//! terminal callback per run. [`plan::standard_plan`] builds the production
//! stage list on top of `reelsmith-remote`.

pub mod briefs;
pub mod config;
pub mod context;
pub mod engine;
pub mod plan;
pub mod progress;
pub mod stage;
pub mod stages;

pub use briefs::{BriefWriter, RemoteBriefWriter};
pub use config::{CaptionModel, PipelineConfig};
pub use context::RunContext;
pub use engine::{PipelineEngine, RunState};
pub use progress::{ProgressReporter, StoreProgressReporter};
pub use stage::{Fallback, Stage, StageError, StageExecutor, StageFailure, StagePolicy};
pub use stages::Toolkit;
