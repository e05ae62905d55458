use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tilejob::{ClientConfig, RequestShape, TileSource};
use tilemath::TileFormula;

#[derive(Parser, Debug)]
#[command(name = "tiledl")]
#[command(about = "Estimate, start and follow offline map tile downloads", long_about = None)]
pub struct Cli {
    /// Tile server base URL (overrides TILE_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Request shape the server speaks: center or bounds (overrides TILE_REQUEST_SHAPE)
    #[arg(long, global = true)]
    pub shape: Option<RequestShape>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict tile count, size and area without contacting the server
    Estimate(EstimateArgs),
    /// Submit a download and follow it to the end
    Download(DownloadArgs),
    /// Show the current progress of a session
    Status { session_id: String },
    /// Check whether the tile server is reachable
    Health,
    /// List tile sources and server capabilities
    Sources,
    /// Save a finished artifact locally
    Fetch {
        file_name: String,
        /// Destination path (defaults to the file name in the current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Ask the server to forget a session
    Cleanup { session_id: String },
}

#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Half-width of the area in degrees
    #[arg(long, default_value = "0.005")]
    pub buffer: f64,

    #[arg(long, default_value = "10")]
    pub min_zoom: u8,

    #[arg(long, default_value = "16")]
    pub max_zoom: u8,

    /// ground or degree (overrides TILE_ESTIMATE_FORMULA)
    #[arg(long)]
    pub formula: Option<TileFormula>,

    /// Upper bound on the reported count (overrides TILE_COUNT_CAP)
    #[arg(long)]
    pub cap: Option<u64>,

    /// With --lon, also count real Web-Mercator tiles around this point
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Centre latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: String,

    /// Centre longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: String,

    /// Half-width of the area in degrees
    #[arg(long, default_value = "0.005")]
    pub buffer: String,

    #[arg(long, default_value = "10")]
    pub min_zoom: u8,

    #[arg(long, default_value = "16")]
    pub max_zoom: u8,

    /// satellite, openstreetmap or terrain
    #[arg(long, default_value = "satellite")]
    pub source: TileSource,

    /// Output name; generated from the coordinates when empty
    #[arg(long, default_value = "")]
    pub name: String,

    /// Save the artifact into this directory once the download completes
    #[arg(long)]
    pub fetch: Option<PathBuf>,

    /// Forget the session on the server after a successful fetch
    #[arg(long, requires = "fetch")]
    pub cleanup: bool,
}

impl Cli {
    /// Layers command-line overrides on top of the environment.
    pub fn apply(&self, cfg: &mut ClientConfig) {
        if let Some(url) = &self.backend {
            cfg.backend_url = url.clone();
        }
        if let Some(shape) = self.shape {
            cfg.request_shape = shape;
        }
        if let Command::Estimate(args) = &self.command {
            if let Some(formula) = args.formula {
                cfg.estimator.formula = formula;
            }
            if args.cap.is_some() {
                cfg.estimator.tile_cap = args.cap;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "tiledl", "download", "--lat", "-33.8688", "--lon", "151.2093", "--source", "osm", "--name", "Sydney",
        ])
        .unwrap();
        match cli.command {
            Command::Download(args) => {
                assert_eq!(args.lat, "-33.8688");
                assert_eq!(args.source, TileSource::OpenStreetMap);
                assert_eq!(args.buffer, "0.005");
                assert_eq!((args.min_zoom, args.max_zoom), (10, 16));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_flags_override_environment() {
        let cli = Cli::try_parse_from([
            "tiledl", "estimate", "--formula", "degree", "--cap", "1000", "--backend", "http://tiles:8080", "--shape",
            "bounds",
        ])
        .unwrap();
        let mut cfg = ClientConfig::default();
        cli.apply(&mut cfg);
        assert_eq!(cfg.backend_url, "http://tiles:8080");
        assert_eq!(cfg.request_shape, RequestShape::Bounds);
        assert_eq!(cfg.estimator.formula, TileFormula::DegreeGrid);
        assert_eq!(cfg.estimator.tile_cap, Some(1000));
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["tiledl", "estimate", "--lat", "10"]).is_err());
        assert!(Cli::try_parse_from(["tiledl", "download", "--cleanup", "--lat", "1", "--lon", "2"]).is_err());
    }

    #[test]
    fn rejects_unknown_source() {
        assert!(Cli::try_parse_from(["tiledl", "download", "--lat", "1", "--lon", "2", "--source", "bing"]).is_err());
    }
}
