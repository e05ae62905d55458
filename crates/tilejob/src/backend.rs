use async_trait::async_trait;

use crate::error::JobError;
use crate::form::DownloadRequest;
use crate::types::{Capabilities, JobHandle, ProgressSnapshot};

/// The remote service that actually fetches tiles and writes MBTiles.
#[async_trait]
pub trait TileBackend: Send + Sync {
    async fn health(&self) -> Result<(), JobError>;
    async fn capabilities(&self) -> Result<Capabilities, JobError>;
    /// Exactly one submission, no retry.
    async fn submit(&self, req: &DownloadRequest) -> Result<JobHandle, JobError>;
    async fn progress(&self, handle: &JobHandle) -> Result<ProgressSnapshot, JobError>;
    async fn cleanup(&self, handle: &JobHandle) -> Result<(), JobError>;
    /// Where the artifact called `file_name` can be retrieved.
    fn artifact_url(&self, file_name: &str) -> String;
}
