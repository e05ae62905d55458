//! Client side of the MBTiles download service.
//!
//! Validates a download form, submits it to the tile backend, follows the
//! resulting job by polling and turns the terminal state into a message.

pub mod backend;
pub mod backend_http;
pub mod config;
pub mod error;
pub mod filename;
pub mod form;
pub mod health;
pub mod initiator;
pub mod poller;
pub mod presenter;
pub mod types;
pub mod wire;

pub use backend::TileBackend;
pub use backend_http::HttpBackend;
pub use config::ClientConfig;
pub use error::{JobError, ValidationError};
pub use form::{DownloadForm, DownloadRequest};
pub use health::{ConnectionStatus, HealthMonitor};
pub use initiator::{submit, Submission};
pub use poller::{JobOutcome, PollState, PollTask, PollView, PollerConfig, ProgressPoller};
pub use presenter::{present, render_progress, Presentation};
pub use types::{Capabilities, JobHandle, JobStatus, ProgressSnapshot, TileSource};
pub use wire::RequestShape;
