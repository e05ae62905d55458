//! Drives each accepted session from `idle` to a terminal status.
//!
//! Nothing is fetched: the job is sized with real Web-Mercator arithmetic,
//! then `tiles_per_tick` tiles are counted as downloaded every tick. The
//! artifact is a JSON manifest standing in for the MBTiles file.

use bytes::Bytes;
use chrono::Utc;
use tilejob::TileSource;
use tilemath::{tiles_in_range, BoundingBox, ZoomRange};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::session::{SessionRecord, SessionStatus};
use crate::state::SharedState;

pub struct NewSession {
    pub session_id: String,
    pub total_tiles: u64,
}

pub fn new_session_id() -> String {
    let short = uuid::Uuid::new_v4().simple().to_string();
    format!("session_{}_{}", Utc::now().timestamp(), &short[..8])
}

/// Records a new session and spawns its simulation.
pub async fn start_session(
    state: &SharedState,
    bounds: BoundingBox,
    zoom: ZoomRange,
    tile_source: TileSource,
    output_name: String,
) -> NewSession {
    let session_id = new_session_id();
    let (total_tiles, per_zoom) = tiles_in_range(&bounds, zoom);
    let record = SessionRecord::new(
        session_id.clone(),
        bounds,
        zoom,
        tile_source,
        output_name,
        &per_zoom,
        Utc::now(),
    );
    state.set_session(record).await;

    info!(session_id=%session_id, total_tiles, zoom=%zoom, source=%tile_source, "session accepted");
    spawn_simulation(state.clone(), session_id.clone());

    NewSession { session_id, total_tiles }
}

pub fn spawn_simulation(state: SharedState, session_id: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_session(&state, &session_id).await;
    })
}

async fn run_session(state: &SharedState, id: &str) {
    let cfg = state.config.clone();

    tokio::select! {
        biased;
        _ = state.shutdown.cancelled() => return,
        _ = tokio::time::sleep(cfg.start_delay) => {}
    }

    let started = state
        .update_session(id, |r| {
            let now = Utc::now();
            r.last_update = now;
            if r.total_tiles > cfg.max_tiles {
                r.status = SessionStatus::Error;
                r.error = Some(format!("Too many tiles ({}). Max: {}", r.total_tiles, cfg.max_tiles));
                return false;
            }
            r.status = SessionStatus::Downloading;
            r.started_at = Some(now);
            true
        })
        .await;
    match started {
        None => {
            debug!(session_id=%id, "session removed before start");
            return;
        }
        Some(false) => {
            warn!(session_id=%id, "session rejected: too many tiles");
            return;
        }
        Some(true) => {}
    }

    let mut ticks = tokio::time::interval_at(tokio::time::Instant::now() + cfg.tick, cfg.tick);
    loop {
        tokio::select! {
            biased;
            _ = state.shutdown.cancelled() => return,
            _ = ticks.tick() => {}
        }

        let advanced = state
            .update_session(id, |r| {
                r.downloaded_tiles = (r.downloaded_tiles + cfg.tiles_per_tick).min(r.total_tiles);
                r.current_zoom = r.zoom_at(r.downloaded_tiles.min(r.total_tiles.saturating_sub(1)));
                r.last_update = Utc::now();
                r.downloaded_tiles >= r.total_tiles
            })
            .await;
        match advanced {
            None => {
                debug!(session_id=%id, "session removed while running");
                return;
            }
            Some(true) => break,
            Some(false) => {}
        }
    }

    finish_session(state, id).await;
}

async fn finish_session(state: &SharedState, id: &str) {
    let Some(record) = state.get_session(id).await else {
        return;
    };

    let file_name = artifact_file_name(&record);
    let body = match manifest(&record) {
        Ok(b) => b,
        Err(e) => {
            state
                .update_session(id, |r| {
                    r.status = SessionStatus::Error;
                    r.error = Some(format!("could not build artifact: {e}"));
                    r.last_update = Utc::now();
                })
                .await;
            return;
        }
    };
    let size = body.len() as u64;
    state.put_artifact(file_name.clone(), body).await;

    state
        .update_session(id, |r| {
            let now = Utc::now();
            r.status = SessionStatus::Completed;
            r.output_file = Some(format!("/tmp/{file_name}"));
            r.display_name = Some(file_name.clone());
            r.file_size_bytes = size;
            r.finished_at = Some(now);
            r.last_update = now;
        })
        .await;

    info!(session_id=%id, file=%file_name, tiles=record.total_tiles, "session completed");
}

/// `{output_name}_{id suffix}.mbtiles`, so sessions sharing an output name
/// never share an artifact.
fn artifact_file_name(r: &SessionRecord) -> String {
    let suffix = r.session_id.rsplit('_').next().unwrap_or(&r.session_id);
    format!("{}_{suffix}.mbtiles", r.output_name)
}

/// Stand-in for the MBTiles metadata table.
fn manifest(r: &SessionRecord) -> serde_json::Result<Bytes> {
    let b = &r.bounds;
    let (lat, lon) = b.center();
    let attribution = match r.tile_source {
        TileSource::Satellite => "Satellite imagery © ArcGIS World Imagery",
        TileSource::OpenStreetMap => "© OpenStreetMap contributors",
        TileSource::Terrain => "© OpenTopoMap (CC-BY-SA)",
    };
    let doc = serde_json::json!({
        "name": r.output_name,
        "type": "baselayer",
        "version": "1.0",
        "description": format!("Simulated {} tiles", r.tile_source),
        "format": "png",
        "bounds": format!("{},{},{},{}", b.west, b.south, b.east, b.north),
        "minzoom": r.zoom.min(),
        "maxzoom": r.zoom.max(),
        "center": format!("{lon},{lat},{}", r.zoom.min()),
        "attribution": attribution,
        "tiles": r.total_tiles,
        "tiles_per_zoom": r.tiles_per_zoom,
    });
    Ok(Bytes::from(serde_json::to_vec_pretty(&doc)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique_and_prefixed() {
        let a = new_session_id();
        let b = new_session_id();
        assert!(a.starts_with("session_"));
        assert_ne!(a, b);
        assert_eq!(a.rsplit('_').next().map(str::len), Some(8));
    }

    #[test]
    fn artifact_names_carry_the_session_suffix() {
        let zoom = ZoomRange::new(3, 3).unwrap();
        let bounds = BoundingBox::around(0.0, 0.0, 0.05).unwrap();
        let (_, per_zoom) = tiles_in_range(&bounds, zoom);
        let record = |id: &str| {
            SessionRecord::new(id.into(), bounds, zoom, TileSource::Satellite, "city".into(), &per_zoom, Utc::now())
        };

        let a = artifact_file_name(&record("session_1760000000_0a1b2c3d"));
        let b = artifact_file_name(&record("session_1760000000_9f8e7d6c"));
        assert_eq!(a, "city_0a1b2c3d.mbtiles");
        assert_ne!(a, b);
    }

    #[test]
    fn manifest_describes_the_job() {
        let zoom = ZoomRange::new(3, 4).unwrap();
        let bounds = BoundingBox::around(0.0, 0.0, 0.05).unwrap();
        let (_, per_zoom) = tiles_in_range(&bounds, zoom);
        let r = SessionRecord::new("s".into(), bounds, zoom, TileSource::Terrain, "hills".into(), &per_zoom, Utc::now());

        let doc: serde_json::Value = serde_json::from_slice(&manifest(&r).unwrap()).unwrap();
        assert_eq!(doc["name"], "hills");
        assert_eq!(doc["minzoom"], 3);
        assert_eq!(doc["maxzoom"], 4);
        assert_eq!(doc["tiles"], 8);
    }
}
