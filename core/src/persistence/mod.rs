//! Crash-recovery snapshots. Written atomically (write to a temp file,
//! then rename) on any non-trivial state change so a crash mid-write
//! never leaves a corrupt snapshot on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything needed to rehydrate a `CycleState` + window after a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub symbol: String,
    pub entry_price: Decimal,
    pub unit_size: Decimal,
    pub current_unit: i32,
    pub peak_unit: i32,
    pub valley_unit: i32,
    pub phase: String,
    pub trailing_stop: Vec<i32>,
    pub trailing_buy: Vec<i32>,
    /// (unit, exchange order id) pairs for every resting slot.
    pub position_map_order_ids: Vec<(i32, Option<String>)>,
    pub cycle_index: u32,
    pub cumulative_growth: Decimal,
    pub initial_order_id: Option<String>,
    pub startup_timestamp: u64,
}

pub fn save(path: impl AsRef<Path>, snapshot: &Snapshot) -> io::Result<()> {
    let path = path.as_ref();
    let tmp_path = tmp_path_for(path);
    let json = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> io::Result<Snapshot> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

pub fn exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = tmp
        .file_name()
        .map(|n| format!("{}.tmp", n.to_string_lossy()))
        .unwrap_or_else(|| "snapshot.tmp".to_string());
    tmp.set_file_name(file_name);
    tmp
}

pub fn now_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
