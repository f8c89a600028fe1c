//! Runtime configuration.
//!
//! Follows a two-tier philosophy: compile-time Cargo features are
//! reserved for concerns that genuinely need to be baked into the
//! binary (`rust_decimal`'s `serde-with-str` feature, which fixes the
//! snapshot wire format at compile time, for instance); anything that
//! can reasonably change between runs — symbol, unit size, leverage
//! ladder, venue credentials, audit cadence — is a runtime value loaded
//! from a JSON config file with environment overrides, never a feature
//! flag.
//!
//! Environment overrides use a `QUADGRID_`-prefixed, `__`-nested-separator
//! scheme, e.g. `QUADGRID_GRID__UNIT_SIZE=50` overrides `grid.unit_size`.

pub mod types;

pub use types::{AuditConfig, Config, GridParams, MetricsConfig, PersistenceConfig, VenueConfig};

use std::path::Path;

use anyhow::{bail, Result};

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // TODO: add the `config` crate for layered File+Environment
        // loading once this moves beyond a single-file deployment; for
        // now a plain JSON read is enough and keeps this dependency-free
        // until there's a second source to layer.
        let raw = std::fs::read_to_string(path)?;
        let mut cfg: Config = serde_json::from_str(&raw)?;
        apply_env_overrides(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_default() -> Result<Self> {
        Self::load("config/default.json")
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.unit_size <= rust_decimal::Decimal::ZERO {
            bail!("grid.unit_size must be positive");
        }
        if self.grid.position_notional <= rust_decimal::Decimal::ZERO {
            bail!("grid.position_notional must be positive");
        }
        if self.grid.leverage_ladder.is_empty() {
            bail!("grid.leverage_ladder must not be empty");
        }
        if self.grid.position_range.0 >= self.grid.position_range.1 {
            bail!("grid.position_range must have min < max");
        }
        match self.venue.mode.as_str() {
            "live" | "simulated" => {}
            other => bail!("venue.mode must be 'live' or 'simulated', got '{other}'"),
        }
        match self.metrics.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => bail!("metrics.log_level '{other}' is not a recognised level"),
        }
        Ok(())
    }
}

fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(symbol) = std::env::var("QUADGRID_GRID__SYMBOL") {
        cfg.grid.symbol = symbol;
    }
    if let Ok(mode) = std::env::var("QUADGRID_VENUE__MODE") {
        cfg.venue.mode = mode;
    }
    if let Ok(level) = std::env::var("QUADGRID_METRICS__LOG_LEVEL") {
        cfg.metrics.log_level = level;
    }
}
