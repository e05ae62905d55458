use std::time::Duration;

use anyhow::{bail, Context, Result};
use tilemath::{EstimatorConfig, TileFormula};

use crate::poller::PollerConfig;
use crate::wire::RequestShape;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Client settings, resolved once at startup and handed to every networked
/// component.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub backend_url: String,
    pub request_shape: RequestShape,
    pub poll: PollerConfig,
    pub health_interval: Duration,
    pub request_timeout: Option<Duration>,
    pub estimator: EstimatorConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_shape: RequestShape::default(),
            poll: PollerConfig::default(),
            health_interval: Duration::from_secs(30),
            request_timeout: None,
            estimator: EstimatorConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let backend_url = get("TILE_BACKEND_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or(defaults.backend_url);

        let request_shape = match get("TILE_REQUEST_SHAPE") {
            Some(v) => v.parse::<RequestShape>().map_err(anyhow::Error::msg)?,
            None => defaults.request_shape,
        };

        let interval = millis(&get, "TILE_POLL_INTERVAL_MS")?.unwrap_or(defaults.poll.interval);
        let first_poll_delay = millis(&get, "TILE_FIRST_POLL_MS")?.unwrap_or(defaults.poll.first_poll_delay);
        let max_poll_duration = secs(&get, "TILE_MAX_POLL_SECS")?;
        let health_interval = secs(&get, "TILE_HEALTH_INTERVAL_SECS")?.unwrap_or(defaults.health_interval);
        let request_timeout = secs(&get, "TILE_REQUEST_TIMEOUT_SECS")?;

        let formula = match get("TILE_ESTIMATE_FORMULA") {
            Some(v) => v.parse::<TileFormula>().map_err(anyhow::Error::msg)?,
            None => defaults.estimator.formula,
        };
        let tile_cap = match get("TILE_COUNT_CAP") {
            Some(v) => Some(v.trim().parse::<u64>().with_context(|| format!("TILE_COUNT_CAP is not a count: {v}"))?),
            None => None,
        };

        // fail fast, fail loud
        if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
            bail!("TILE_BACKEND_URL must start with http:// or https://");
        }
        if interval.is_zero() {
            bail!("TILE_POLL_INTERVAL_MS must be greater than 0");
        }
        if health_interval.is_zero() {
            bail!("TILE_HEALTH_INTERVAL_SECS must be greater than 0");
        }

        Ok(Self {
            backend_url,
            request_shape,
            poll: PollerConfig { interval, first_poll_delay, max_poll_duration },
            health_interval,
            request_timeout,
            estimator: EstimatorConfig { formula, tile_cap, ..defaults.estimator },
        })
    }
}

fn millis(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    number(get, key).map(|v| v.map(Duration::from_millis))
}

fn secs(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    number(get, key).map(|v| v.map(Duration::from_secs))
}

fn number(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    get(key)
        .map(|v| v.trim().parse::<u64>().with_context(|| format!("{key} must be a whole number, got {v:?}")))
        .transpose()
}
