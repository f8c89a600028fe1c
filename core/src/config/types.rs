//! Concrete runtime configuration for a single symbol/account instance.
//! Multi-symbol operation is just multiple independent `Config` values,
//! one engine task each.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_leverage_ladder() -> Vec<u32> {
    vec![20, 10, 5, 3]
}

fn default_audit_interval_secs() -> u64 {
    120
}

fn default_follow_up_delay_secs() -> u64 {
    30
}

fn default_post_unit_change_delay_secs() -> u64 {
    2
}

fn default_position_range() -> (i32, i32) {
    (-10, 10)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_execution_mode() -> String {
    "simulated".to_string()
}

fn default_persistence_path() -> PathBuf {
    PathBuf::from("quadgrid-state.json")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    #[serde(default = "default_execution_mode")]
    pub mode: String,
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
    pub api_key: Option<String>,
    pub private_key_path: Option<PathBuf>,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            mode: default_execution_mode(),
            api_url: None,
            ws_url: None,
            api_key: None,
            private_key_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridParams {
    pub symbol: String,
    pub entry_price: Decimal,
    pub unit_size: Decimal,
    pub position_notional: Decimal,
    #[serde(default = "default_leverage_ladder")]
    pub leverage_ladder: Vec<u32>,
    #[serde(default = "default_position_range")]
    pub position_range: (i32, i32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_post_unit_change_delay_secs")]
    pub post_unit_change_delay_secs: u64,
    #[serde(default = "default_follow_up_delay_secs")]
    pub follow_up_delay_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_audit_interval_secs(),
            post_unit_change_delay_secs: default_post_unit_change_delay_secs(),
            follow_up_delay_secs: default_follow_up_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_persistence_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_true")]
    pub recover_on_startup: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_persistence_path(),
            recover_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub grid: GridParams,
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Config {
        Config {
            grid: GridParams {
                symbol: "BTC-PERP".into(),
                entry_price: dec!(60000),
                unit_size: dec!(100),
                position_notional: dec!(6000),
                leverage_ladder: default_leverage_ladder(),
                position_range: default_position_range(),
            },
            venue: VenueConfig::default(),
            audit: AuditConfig::default(),
            metrics: MetricsConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }

    #[test]
    fn defaults_fill_in_leverage_ladder_descending() {
        let cfg = sample();
        assert_eq!(cfg.grid.leverage_ladder, vec![20, 10, 5, 3]);
    }

    #[test]
    fn serialises_and_round_trips_through_json() {
        let cfg = sample();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grid.symbol, cfg.grid.symbol);
    }
}
