//! Per-cycle configuration and the mutable state that survives across a
//! cycle's lifetime, from position open to RESET.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Immutable inputs for a single cycle. `long_fragment_asset` is locked in
/// at cycle start and only ever recomputed on RESET.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub symbol: String,
    pub entry_price: Decimal,
    pub unit_size: Decimal,
    pub position_notional: Decimal,
    pub leverage: u32,
    pub asset_size: Decimal,
    pub long_fragment_asset: Decimal,
}

impl GridConfig {
    pub fn new(
        symbol: impl Into<String>,
        entry_price: Decimal,
        unit_size: Decimal,
        position_notional: Decimal,
        leverage: u32,
    ) -> Self {
        let asset_size = position_notional / entry_price;
        let long_fragment_asset = asset_size / dec!(4);
        Self {
            symbol: symbol.into(),
            entry_price,
            unit_size,
            position_notional,
            leverage,
            asset_size,
            long_fragment_asset,
        }
    }

    /// Rebuilds config around a RESET: new entry price, realised position
    /// size from the venue, recomputed notional and fragment.
    pub fn reset(&mut self, new_entry_price: Decimal, realised_size: Decimal) {
        self.entry_price = new_entry_price;
        self.asset_size = realised_size;
        self.position_notional = realised_size * new_entry_price;
        self.long_fragment_asset = realised_size / dec!(4);
    }
}

/// Mutable state tracked across a cycle: created on position open,
/// destroyed (replaced) on RESET. Phase is intentionally absent — it is a
/// derived view computed by `PhaseClassifier`, never stored here.
#[derive(Debug, Clone)]
pub struct CycleState {
    pub current_unit: i32,
    pub peak_unit: i32,
    pub valley_unit: i32,
    pub cycle_index: u32,
    pub cumulative_growth: Decimal,
    pub initial_order_id: Option<String>,
    pub ever_held_buy: bool,
    pub ever_filled_stop: bool,
    /// Set only when the window has fully converted to all-buys at least
    /// once this cycle. This, not `ever_held_buy`, is what gates RESET and
    /// the Recovery phase: a shallow retracement that fills one stop and
    /// recovers without ever reaching an all-buy window must stay in
    /// Retracement, not be mistaken for a completed decline/recovery loop.
    pub ever_fully_declined: bool,
}

impl CycleState {
    pub fn new() -> Self {
        Self {
            current_unit: 0,
            peak_unit: 0,
            valley_unit: 0,
            cycle_index: 0,
            cumulative_growth: Decimal::ONE,
            initial_order_id: None,
            ever_held_buy: false,
            ever_filled_stop: false,
            ever_fully_declined: false,
        }
    }

    pub fn observe_unit(&mut self, unit: i32) {
        self.current_unit = unit;
        self.peak_unit = self.peak_unit.max(unit);
        self.valley_unit = self.valley_unit.min(unit);
    }

    /// Resets per-cycle tracking fields after a RESET, folding the cycle's
    /// growth factor into the running compounding total.
    pub fn on_reset(&mut self, growth_factor: Decimal) {
        self.current_unit = 0;
        self.peak_unit = 0;
        self.valley_unit = 0;
        self.cycle_index += 1;
        self.cumulative_growth *= growth_factor;
        self.ever_held_buy = false;
        self.ever_filled_stop = false;
        self.ever_fully_declined = false;
    }
}

impl Default for CycleState {
    fn default() -> Self {
        Self::new()
    }
}
