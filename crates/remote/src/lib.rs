//! Client and coordination primitives for remote asynchronous jobs.
//!
//! Every generative capability the pipeline uses is a remote service with
//! the same contract: submit a job, get an opaque id back, poll until the
//! job reaches a terminal state. This crate provides:
//!
//! - [`RemoteJobClient`] - HTTP implementation of [`RemoteCapability`].
//! - [`PollLoop`] - fixed-interval polling bounded by a mandatory deadline.
//! - [`FanOutCoordinator`] - concurrent submit/collect over a batch of
//!   items with index-ordered, partial results.

pub mod api;
pub mod capability;
pub mod clock;
pub mod fanout;
pub mod job;
pub mod poll;

pub use api::{RemoteError, RemoteJobClient};
pub use capability::RemoteCapability;
pub use clock::{Clock, TokioClock};
pub use fanout::{FanOutCoordinator, FanOutOutcome, ItemError};
pub use job::{JobHandle, JobKind, JobQuery, JobResult, JobStatus};
pub use poll::{PollError, PollLoop};
