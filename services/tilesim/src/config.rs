use std::time::Duration;

use anyhow::{bail, Context, Result};

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub bind_addr: String,
    /// How often a running session advances.
    pub tick: Duration,
    pub tiles_per_tick: u64,
    /// Time a new session sits in `idle` before it starts.
    pub start_delay: Duration,
    /// Sessions larger than this fail instead of running.
    pub max_tiles: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            tick: Duration::from_millis(100),
            tiles_per_tick: 5,
            start_delay: Duration::from_millis(1000),
            max_tiles: 50_000,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("SIM_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let tick = number("SIM_TICK_MS")?.map(Duration::from_millis).unwrap_or(defaults.tick);
        let tiles_per_tick = number("SIM_TILES_PER_TICK")?.unwrap_or(defaults.tiles_per_tick);
        let start_delay = number("SIM_START_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.start_delay);
        let max_tiles = number("SIM_MAX_TILES")?.unwrap_or(defaults.max_tiles);

        // fail fast, fail loud
        if tick.is_zero() {
            bail!("SIM_TICK_MS must be greater than 0");
        }
        if tiles_per_tick == 0 {
            bail!("SIM_TILES_PER_TICK must be greater than 0");
        }

        Ok(Self { bind_addr, tick, tiles_per_tick, start_delay, max_tiles })
    }
}

fn number(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{key} must be a whole number, got {v:?}")),
        _ => Ok(None),
    }
}
