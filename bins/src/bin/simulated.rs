//! Runs the grid engine against an in-process simulated venue. This
//! binary stands in for the external-collaborator CLI/exchange-adapter
//! surface described alongside the core engine; it is not itself part
//! of the engine's deliverable, just a way to exercise it end to end.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use quadgrid_bins::common::{init_logging, print_status, TradeArgs};
use quadgrid_core::domain::GridConfig;
use quadgrid_core::engine::{AuditorConfig, Engine, EngineEvent, OrderManager};
use quadgrid_core::execution::{SimulatedVenue, Venue};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

/// Descending ladder starting at the requested leverage, halving down to
/// 1x, mirroring the venue-agnostic fallback the engine itself expects.
fn leverage_ladder(top: u32) -> Vec<u32> {
    let mut ladder = vec![top.max(1)];
    while *ladder.last().unwrap() > 1 {
        let next = (ladder.last().unwrap() / 2).max(1);
        ladder.push(next);
    }
    ladder
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = TradeArgs::parse();
    init_logging(&args.log_level, args.json_logs)?;

    if args.testnet {
        tracing::info!("testnet flag has no effect against the simulated venue");
    }

    let starting_mark_price = dec!(100);
    let mut venue = SimulatedVenue::new(starting_mark_price);
    let entry_price = venue.mark_price();

    let grid_config = GridConfig::new(
        args.symbol.clone(),
        entry_price,
        args.unit_size,
        args.position_notional,
        args.leverage,
    );

    let mut order_manager = OrderManager::new(venue, leverage_ladder(args.leverage));
    if let Err(e) = order_manager.apply_leverage_ladder() {
        tracing::warn!(error = %e, "no leverage tier accepted, continuing at venue default");
    }

    let snapshot_path = Some(PathBuf::from(format!("{}-snapshot.json", args.symbol)));
    let mut engine = Engine::new(
        grid_config,
        order_manager,
        AuditorConfig::default(),
        (-10, 10),
        snapshot_path,
    );

    let (tx, rx) = mpsc::channel::<EngineEvent>(quadgrid_core::engine::EVENT_QUEUE_CAPACITY);

    let shutdown_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.blocking_send(EngineEvent::Shutdown);
    })?;

    let tick_tx = tx.clone();
    let price_feed = tokio::spawn(async move {
        let mut price: Decimal = starting_mark_price;
        let mut rng = rand::thread_rng();
        loop {
            tokio::time::sleep(Duration::from_millis(500)).await;
            let step: i32 = rng.gen_range(-3..=3);
            price += Decimal::from(step) * dec!(0.1);
            if tick_tx.send(EngineEvent::PriceTick(price)).await.is_err() {
                break;
            }
        }
    });

    engine.run(rx).await;
    price_feed.abort();

    print_status(&engine.status());
    Ok(())
}
