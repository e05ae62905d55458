use chrono::NaiveDate;
use tracing::warn;

use crate::backend::TileBackend;
use crate::error::JobError;
use crate::form::{DownloadForm, DownloadRequest};
use crate::types::JobHandle;

/// A job accepted by the backend, with the request that started it.
#[derive(Debug, Clone)]
pub struct Submission {
    pub handle: JobHandle,
    pub request: DownloadRequest,
}

/// Validates `form` and submits it once.
///
/// Validation failures return before the backend is touched.
pub async fn submit<B: TileBackend + ?Sized>(
    backend: &B,
    form: &DownloadForm,
    today: NaiveDate,
) -> Result<Submission, JobError> {
    let request = form.validate(today)?;

    let handle = backend.submit(&request).await.map_err(|e| {
        warn!(output=%request.output_name, "download submission failed: {e}");
        e
    })?;

    Ok(Submission { handle, request })
}
