use std::fmt;

use crate::backend::TileBackend;
use crate::poller::JobOutcome;
use crate::types::ProgressSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    Success {
        summary: String,
        file_name: Option<String>,
        link: Option<String>,
    },
    Failure {
        message: String,
    },
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Success { summary, link, .. } => {
                write!(f, "✅ Download complete: {summary}")?;
                if let Some(link) = link {
                    write!(f, "\n   {link}")?;
                }
                Ok(())
            }
            Presentation::Failure { message } => write!(f, "❌ Download failed: {message}"),
        }
    }
}

/// Turns a finished poll into what the user sees. Pure; builds the link
/// through the backend but never calls it.
pub fn present(outcome: &JobOutcome, backend: &dyn TileBackend) -> Presentation {
    match outcome {
        JobOutcome::Completed(snap) => {
            let file_name = snap.artifact_name().map(str::to_string);
            let link = file_name.as_deref().map(|name| backend.artifact_url(name));
            Presentation::Success { summary: summary(snap), file_name, link }
        }
        JobOutcome::Failed { message, .. } => Presentation::Failure { message: message.clone() },
        JobOutcome::TimedOut { last } => {
            let message = match last {
                Some(s) => format!(
                    "gave up waiting after {} with {}/{} tiles downloaded",
                    format_duration(s.elapsed_time),
                    s.downloaded_tiles,
                    s.total_tiles
                ),
                None => "gave up waiting for the tile server".to_string(),
            };
            Presentation::Failure { message }
        }
    }
}

fn summary(snap: &ProgressSnapshot) -> String {
    let name = snap
        .display_name
        .as_deref()
        .or_else(|| snap.artifact_name())
        .unwrap_or("tiles.mbtiles");
    let size_mb = snap.file_size_bytes.unwrap_or(0) as f64 / (1024.0 * 1024.0);
    let tiles = if snap.downloaded_tiles > 0 { snap.downloaded_tiles } else { snap.total_tiles };
    format!("{name}, {size_mb:.2} MB, {tiles} tiles in {}", format_duration(snap.elapsed_time))
}

/// One line for a job still in flight.
pub fn render_progress(snap: &ProgressSnapshot) -> String {
    let mut line = format!(
        "[{}] zoom {:>2}  {}/{} tiles  {:5.1}%",
        snap.status, snap.current_zoom, snap.downloaded_tiles, snap.total_tiles, snap.progress_percent
    );
    if snap.tiles_per_second > 0.0 {
        line.push_str(&format!("  {:.1} tiles/s", snap.tiles_per_second));
    }
    if snap.estimated_remaining_time > 0 {
        line.push_str(&format!("  ETA {}", format_duration(snap.estimated_remaining_time)));
    }
    line
}

pub fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s:02}s"),
        _ => format!("{h}h {m:02}m {s:02}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::form::DownloadRequest;
    use crate::types::{Capabilities, JobHandle, JobStatus};
    use async_trait::async_trait;

    struct LinkOnly;

    #[async_trait]
    impl TileBackend for LinkOnly {
        async fn health(&self) -> Result<(), JobError> {
            unreachable!()
        }
        async fn capabilities(&self) -> Result<Capabilities, JobError> {
            unreachable!()
        }
        async fn submit(&self, _: &DownloadRequest) -> Result<JobHandle, JobError> {
            unreachable!()
        }
        async fn progress(&self, _: &JobHandle) -> Result<ProgressSnapshot, JobError> {
            unreachable!()
        }
        async fn cleanup(&self, _: &JobHandle) -> Result<(), JobError> {
            unreachable!()
        }
        fn artifact_url(&self, file_name: &str) -> String {
            format!("http://tiles.local/download_file/{file_name}")
        }
    }

    fn completed() -> ProgressSnapshot {
        ProgressSnapshot {
            status: JobStatus::Completed,
            total_tiles: 31,
            downloaded_tiles: 31,
            elapsed_time: 75,
            output_file: Some("/srv/out/nyc.mbtiles".into()),
            display_name: Some("nyc.mbtiles".into()),
            file_size_bytes: Some(3 * 1024 * 1024 / 2),
            ..Default::default()
        }
    }

    #[test]
    fn success_has_summary_and_link() {
        let p = present(&JobOutcome::Completed(completed()), &LinkOnly);
        assert_eq!(
            p,
            Presentation::Success {
                summary: "nyc.mbtiles, 1.50 MB, 31 tiles in 1m 15s".into(),
                file_name: Some("nyc.mbtiles".into()),
                link: Some("http://tiles.local/download_file/nyc.mbtiles".into()),
            }
        );
        assert!(p.to_string().starts_with("✅"));
    }

    #[test]
    fn success_without_artifact_has_no_link() {
        let snap = ProgressSnapshot { output_file: None, display_name: None, ..completed() };
        match present(&JobOutcome::Completed(snap), &LinkOnly) {
            Presentation::Success { link, file_name, .. } => {
                assert_eq!(link, None);
                assert_eq!(file_name, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failure_keeps_backend_message_verbatim() {
        let outcome = JobOutcome::Failed {
            message: "Too many tiles (812345). Max: 50000".into(),
            snapshot: ProgressSnapshot { status: JobStatus::Error, ..Default::default() },
        };
        let p = present(&outcome, &LinkOnly);
        assert_eq!(p.to_string(), "❌ Download failed: Too many tiles (812345). Max: 50000");
    }

    #[test]
    fn timeout_is_a_failure() {
        let p = present(&JobOutcome::TimedOut { last: None }, &LinkOnly);
        assert!(matches!(p, Presentation::Failure { .. }));
    }

    #[test]
    fn progress_line() {
        let snap = ProgressSnapshot {
            status: JobStatus::Running,
            current_zoom: 12,
            downloaded_tiles: 10,
            total_tiles: 40,
            progress_percent: 25.0,
            tiles_per_second: 2.5,
            estimated_remaining_time: 12,
            ..Default::default()
        };
        assert_eq!(render_progress(&snap), "[running] zoom 12  10/40 tiles   25.0%  2.5 tiles/s  ETA 12s");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 01s");
        assert_eq!(format_duration(3723), "1h 02m 03s");
    }
}
