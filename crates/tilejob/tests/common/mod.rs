#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tilejob::{Capabilities, DownloadRequest, JobError, JobHandle, JobStatus, ProgressSnapshot, TileBackend};
use tokio::time::Instant;

/// In-memory backend that replays a fixed list of progress responses.
/// Once the script runs out it keeps answering `running`.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<ProgressSnapshot, JobError>>>,
    latency: Duration,
    started: Instant,
    pub progress_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub health_calls: AtomicUsize,
    pub healthy: AtomicBool,
    poll_offsets: Mutex<Vec<Duration>>,
    submit_reply: Mutex<Option<Result<JobHandle, JobError>>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<ProgressSnapshot, JobError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            latency: Duration::ZERO,
            started: Instant::now(),
            progress_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            healthy: AtomicBool::new(true),
            poll_offsets: Mutex::new(Vec::new()),
            submit_reply: Mutex::new(None),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_submit_reply(self, reply: Result<JobHandle, JobError>) -> Self {
        *self.submit_reply.lock().unwrap() = Some(reply);
        self
    }

    pub fn polls(&self) -> usize {
        self.progress_calls.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_offsets(&self) -> Vec<Duration> {
        self.poll_offsets.lock().unwrap().clone()
    }
}

pub fn snapshot(status: JobStatus, downloaded: u64) -> ProgressSnapshot {
    ProgressSnapshot { status, total_tiles: 31, downloaded_tiles: downloaded, ..Default::default() }
}

pub fn running(downloaded: u64) -> Result<ProgressSnapshot, JobError> {
    Ok(snapshot(JobStatus::Running, downloaded))
}

pub fn completed() -> Result<ProgressSnapshot, JobError> {
    Ok(ProgressSnapshot {
        output_file: Some("/tmp/out/city.mbtiles".into()),
        file_size_bytes: Some(2048),
        ..snapshot(JobStatus::Completed, 31)
    })
}

pub fn failed(message: Option<&str>) -> Result<ProgressSnapshot, JobError> {
    Ok(ProgressSnapshot { error: message.map(str::to_string), ..snapshot(JobStatus::Error, 7) })
}

pub fn network_error() -> Result<ProgressSnapshot, JobError> {
    Err(JobError::Network("connection reset".into()))
}

#[async_trait]
impl TileBackend for ScriptedBackend {
    async fn health(&self) -> Result<(), JobError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(JobError::Network("connection refused".into()))
        }
    }

    async fn capabilities(&self) -> Result<Capabilities, JobError> {
        Ok(Capabilities::default())
    }

    async fn submit(&self, _req: &DownloadRequest) -> Result<JobHandle, JobError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(JobHandle::new("session_test_1")))
    }

    async fn progress(&self, _handle: &JobHandle) -> Result<ProgressSnapshot, JobError> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        self.poll_offsets.lock().unwrap().push(self.started.elapsed());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| running(0))
    }

    async fn cleanup(&self, _handle: &JobHandle) -> Result<(), JobError> {
        Ok(())
    }

    fn artifact_url(&self, file_name: &str) -> String {
        format!("http://tiles.test/download_file/{file_name}")
    }
}
