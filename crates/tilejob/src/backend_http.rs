use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::backend::TileBackend;
use crate::config::ClientConfig;
use crate::error::JobError;
use crate::form::DownloadRequest;
use crate::types::{Capabilities, JobHandle, ProgressSnapshot};
use crate::wire::{self, ErrorBody, RequestShape, SubmitResponse};

/// REST client for the tile backend.
pub struct HttpBackend {
    base_url: Url,
    shape: RequestShape,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, shape: RequestShape) -> Result<Self, JobError> {
        Self::with_client(base_url, shape, reqwest::Client::new())
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, JobError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!("tiledl/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| JobError::Network(e.to_string()))?;
        Self::with_client(&cfg.backend_url, cfg.request_shape, client)
    }

    pub fn with_client(base_url: &str, shape: RequestShape, client: reqwest::Client) -> Result<Self, JobError> {
        let base_url = Url::parse(base_url).map_err(|e| JobError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(JobError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { base_url, shape, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn shape(&self) -> RequestShape {
        self.shape
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Streams the artifact to `dest`, returning the number of bytes written.
    ///
    /// The body lands in a `.part` sibling first; `dest` only appears once
    /// the whole body has been written.
    pub async fn fetch_artifact(&self, file_name: &str, dest: &Path) -> Result<u64, JobError> {
        let url = self.endpoint(&wire::download_file_path(file_name));
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let part = partial_path(dest);
        let written = match write_body(resp, &part).await {
            Ok(n) => n,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&part).await {
                    warn!(path=%part.display(), "could not remove partial artifact: {rm}");
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&part, dest).await?;

        info!(file=%file_name, dest=%dest.display(), bytes=written, "artifact saved");
        Ok(written)
    }
}

#[async_trait]
impl TileBackend for HttpBackend {
    async fn health(&self) -> Result<(), JobError> {
        let resp = self.client.get(self.endpoint(wire::HEALTH_PATH)).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    async fn capabilities(&self) -> Result<Capabilities, JobError> {
        let resp = self.client.get(self.endpoint(self.shape.capabilities_path())).send().await?;
        read_json(resp).await
    }

    async fn submit(&self, req: &DownloadRequest) -> Result<JobHandle, JobError> {
        let url = self.endpoint(self.shape.submit_path());
        let body = self.shape.payload(req);
        debug!(%url, %body, "submitting download");

        let resp = self.client.post(url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        let parsed: SubmitResponse = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) if !status.is_success() => {
                return Err(JobError::Backend {
                    status: Some(status.as_u16()),
                    message: format!("tile server returned HTTP {status}"),
                })
            }
            Err(e) => {
                return Err(JobError::Backend {
                    status: Some(status.as_u16()),
                    message: format!("unreadable response from tile server: {e}"),
                })
            }
        };

        if !status.is_success() && parsed.error.is_none() {
            return Err(JobError::Backend {
                status: Some(status.as_u16()),
                message: parsed.message.unwrap_or_else(|| format!("tile server returned HTTP {status}")),
            });
        }

        let handle = parsed.into_handle(Some(status.as_u16()))?;
        info!(session_id=%handle, output=%req.output_name, "download submitted");
        Ok(handle)
    }

    async fn progress(&self, handle: &JobHandle) -> Result<ProgressSnapshot, JobError> {
        let resp = self.client.get(self.endpoint(&wire::progress_path(handle))).send().await?;
        read_json(resp).await
    }

    async fn cleanup(&self, handle: &JobHandle) -> Result<(), JobError> {
        let resp = self.client.post(self.endpoint(&wire::cleanup_path(handle))).send().await?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }

    fn artifact_url(&self, file_name: &str) -> String {
        self.endpoint(&wire::download_file_path(file_name)).to_string()
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("artifact"));
    name.push(".part");
    dest.with_file_name(name)
}

async fn write_body(mut resp: Response, path: &Path) -> Result<u64, JobError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, JobError> {
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    Ok(resp.json::<T>().await?)
}

async fn error_from_response(resp: Response) -> JobError {
    let status = resp.status();
    let body: ErrorBody = resp.json().await.unwrap_or_default();
    JobError::Backend {
        status: Some(status.as_u16()),
        message: body
            .error
            .or(body.message)
            .unwrap_or_else(|| format!("tile server returned HTTP {status}")),
    }
}
