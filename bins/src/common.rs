//! Common CLI scaffolding shared by the grid binaries.

use anyhow::Result;
use clap::Parser;
use quadgrid_core::engine::EngineStatus;

/// `trade SYMBOL POSITION_SIZE UNIT_SIZE [--leverage N] [--testnet]`
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct TradeArgs {
    pub symbol: String,
    pub position_notional: rust_decimal::Decimal,
    pub unit_size: rust_decimal::Decimal,

    #[arg(long, default_value_t = 20)]
    pub leverage: u32,

    #[arg(long)]
    pub testnet: bool,

    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[arg(long)]
    pub json_logs: bool,
}

pub fn init_logging(level: &str, json_logs: bool) -> Result<()> {
    quadgrid_core::utils::init_logger(level, json_logs)
}

pub fn print_status(status: &EngineStatus) {
    tracing::info!("=== {} ===", status.symbol);
    tracing::info!("phase: {}", status.phase);
    tracing::info!("cycle: {} (growth {})", status.cycle_index, status.cumulative_growth);
    tracing::info!("current unit: {}", status.current_unit);
    tracing::info!("trailing stop: {:?}", status.trailing_stop);
    tracing::info!("trailing buy: {:?}", status.trailing_buy);
    tracing::info!(
        "ticks={} fills={} unmatched={} resets={} audits={}",
        status.stats.ticks_processed,
        status.stats.fills_processed,
        status.stats.unmatched_fills,
        status.stats.resets,
        status.stats.audits_run,
    );
}
