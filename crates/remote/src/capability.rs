use async_trait::async_trait;

use crate::api::RemoteError;
use crate::job::{JobHandle, JobKind, JobQuery};

/// Submit/query contract shared by every remote generative capability.
///
/// [`RemoteJobClient`](crate::RemoteJobClient) is the HTTP
/// implementation; stage tests substitute in-memory fakes.
#[async_trait]
pub trait RemoteCapability: Send + Sync {
    /// Queue a job. Any failure is returned immediately and never retried.
    async fn submit(&self, kind: JobKind, params: &serde_json::Value)
        -> Result<JobHandle, RemoteError>;

    /// Ask for the current status. Never fails: an unreachable service or
    /// a malformed answer yields [`JobStatus::Unknown`](crate::JobStatus::Unknown).
    async fn query(&self, handle: &JobHandle) -> JobQuery;
}
