use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tilejob::{
    present, render_progress, submit, ClientConfig, DownloadForm, HealthMonitor, HttpBackend, JobHandle, JobOutcome,
    PollState, Presentation, ProgressPoller, TileBackend,
};
use tilemath::{estimate, tiles_in_range, BoundingBox, EstimatorConfig, ZoomRange};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{DownloadArgs, EstimateArgs};

pub fn run_estimate(args: &EstimateArgs, cfg: &EstimatorConfig) -> Result<ExitCode> {
    let zoom = ZoomRange::new(args.min_zoom, args.max_zoom)?;
    let est = estimate(args.buffer, zoom, cfg)?;

    println!("Estimate for buffer {}° over zoom {zoom} ({:?}):", args.buffer, cfg.formula);
    for z in &est.per_zoom {
        println!("  z{:<2}  {:>10} per side  {:>20} tiles", z.zoom, z.tiles_per_side, z.tiles);
    }
    println!("  total tiles:  {}", est.reported_tiles);
    if est.is_limited {
        println!("  (limited; uncapped prediction is {})", est.total_tiles);
    }
    println!("  size:         ~{} MB", est.estimated_size_mb);
    println!("  area:         ~{} km", est.area_size_km);

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let bounds = BoundingBox::around(lat, lon, args.buffer)?;
        let (total, per_zoom) = tiles_in_range(&bounds, zoom);
        println!("Web-Mercator tiles around ({lat}, {lon}): {total}");
        for (z, n) in per_zoom {
            println!("  z{z:<2}  {n}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn run_download(args: DownloadArgs, cfg: &ClientConfig, shutdown: CancellationToken) -> Result<ExitCode> {
    let backend = Arc::new(HttpBackend::from_config(cfg)?);
    let health = HealthMonitor::spawn_with_token(backend.clone(), cfg.health_interval, shutdown.clone());

    let form = DownloadForm {
        latitude: args.lat,
        longitude: args.lon,
        buffer: args.buffer,
        min_zoom: args.min_zoom,
        max_zoom: args.max_zoom,
        tile_source: args.source,
        output_name: args.name,
    };
    let today = chrono::Local::now().date_naive();
    let sub = match submit(backend.as_ref(), &form, today).await {
        Ok(sub) => sub,
        Err(e) => {
            eprintln!("❌ {e}");
            health.shutdown().await;
            return Ok(ExitCode::FAILURE);
        }
    };

    if let Ok(est) = estimate(sub.request.buffer, sub.request.zoom, &cfg.estimator) {
        println!(
            "Started {} ({} tiles predicted, ~{} MB)",
            sub.handle, est.reported_tiles, est.estimated_size_mb
        );
    }

    let poller = ProgressPoller::new(backend.clone(), cfg.poll);
    let task = poller.start_with_token(sub.handle.clone(), shutdown.clone());
    let mut views = task.subscribe();
    let mut status = health.subscribe();

    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if view.state == PollState::Done {
                    break;
                }
                if let Some(snap) = &view.snapshot {
                    eprintln!("{}", render_progress(snap));
                }
            }
            Ok(()) = status.changed() => {
                let now = status.borrow_and_update().clone();
                if !now.is_online() {
                    eprintln!("⚠ tile server {now}");
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }

    let outcome = task.finish().await;
    health.shutdown().await;

    let Some(outcome) = outcome else {
        println!("Stopped following {}; the server may still be working on it.", sub.handle);
        return Ok(ExitCode::from(130));
    };

    let shown = present(&outcome, backend.as_ref());
    println!("{shown}");

    if let (Presentation::Success { file_name: Some(file_name), .. }, Some(dir)) = (&shown, &args.fetch) {
        let dest = dir.join(file_name);
        fetch_into(&backend, file_name, &dest).await?;
        if args.cleanup {
            cleanup(&backend, &sub.handle).await;
        }
    }

    Ok(exit_code(&outcome))
}

pub async fn run_status(session_id: String, cfg: &ClientConfig) -> Result<ExitCode> {
    let backend = HttpBackend::from_config(cfg)?;
    let snap = backend.progress(&JobHandle::new(session_id)).await?;

    match JobOutcome::classify(snap) {
        Ok(outcome) => {
            println!("{}", present(&outcome, &backend));
            Ok(exit_code(&outcome))
        }
        Err(snap) => {
            println!("{}", render_progress(&snap));
            Ok(ExitCode::SUCCESS)
        }
    }
}

pub async fn run_health(cfg: &ClientConfig) -> Result<ExitCode> {
    let backend = HttpBackend::from_config(cfg)?;
    match backend.health().await {
        Ok(()) => {
            println!("online: {}", backend.base_url());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("offline: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn run_sources(cfg: &ClientConfig) -> Result<ExitCode> {
    let backend = HttpBackend::from_config(cfg)?;
    let caps = backend.capabilities().await?;

    if let Some(status) = &caps.qgis_status {
        println!("server: {status}");
    }
    if let Some(manual) = caps.manual_method_available {
        println!("manual download: {}", if manual { "available" } else { "unavailable" });
    }
    for source in &caps.sources {
        match caps.descriptions.get(source) {
            Some(desc) => println!("  {source:<14} {desc}"),
            None => println!("  {source}"),
        }
    }
    for algorithm in &caps.tile_algorithms {
        println!("  algorithm: {algorithm}");
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn run_fetch(file_name: String, out: Option<PathBuf>, cfg: &ClientConfig) -> Result<ExitCode> {
    let backend = HttpBackend::from_config(cfg)?;
    let dest = out.unwrap_or_else(|| PathBuf::from(&file_name));
    fetch_into(&backend, &file_name, &dest).await?;
    Ok(ExitCode::SUCCESS)
}

pub async fn run_cleanup(session_id: String, cfg: &ClientConfig) -> Result<ExitCode> {
    let backend = HttpBackend::from_config(cfg)?;
    backend.cleanup(&JobHandle::new(session_id.clone())).await?;
    println!("cleaned up {session_id}");
    Ok(ExitCode::SUCCESS)
}

async fn fetch_into(backend: &HttpBackend, file_name: &str, dest: &Path) -> Result<()> {
    let bytes = backend
        .fetch_artifact(file_name, dest)
        .await
        .with_context(|| format!("failed to fetch {file_name}"))?;
    println!("saved {} ({bytes} bytes)", dest.display());
    Ok(())
}

async fn cleanup(backend: &HttpBackend, handle: &JobHandle) {
    match backend.cleanup(handle).await {
        Ok(()) => info!(session_id=%handle, "session cleaned up"),
        Err(e) => warn!(session_id=%handle, "cleanup failed: {e}"),
    }
}

fn exit_code(outcome: &JobOutcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
