use thiserror::Error;

/// Bad form input, caught before anything is sent.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("latitude {0} is outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside -180..=180")]
    LongitudeOutOfRange(f64),

    #[error("min zoom {min} is greater than max zoom {max}")]
    ZoomOrder { min: u8, max: u8 },

    #[error("buffer must be greater than 0 degrees, got {0}")]
    BufferNotPositive(f64),

    #[error("zoom level {0} is outside 1..=21")]
    ZoomOutOfRange(u8),
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    /// Transport failure; the job is not started or in an unknown state.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx, `{error}` or `{success:false}` from the backend.
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    /// Terminal `error` status reported while polling.
    #[error("download failed: {0}")]
    JobFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for JobError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return JobError::Backend {
                status: e.status().map(|s| s.as_u16()),
                message: format!("unreadable response from tile server: {e}"),
            };
        }
        JobError::Network(format!("could not reach the tile server ({e})"))
    }
}

impl JobError {
    pub fn is_validation(&self) -> bool {
        matches!(self, JobError::Validation(_))
    }
}
