//! The engine's sole I/O boundary: turns window intent into venue calls,
//! keeps the position map's order ids and statuses in step with what
//! actually happened, and owns the leverage fallback ladder.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::{OrderType, PositionMap, SlideAction};
use crate::execution::{OrderId, Venue, VenueError};
use crate::resilience::{BackoffConfig, ExponentialBackoff};

/// Tracks a limit-buy that rests above current market price on a venue
/// without native trigger-limit-buy support. The order is never sent to
/// the venue until price actually reaches the target, guaranteeing it
/// can never execute early.
#[derive(Debug, Clone)]
struct PendingBuyIntent {
    unit: i32,
    target_price: Decimal,
    size: Decimal,
}

pub struct OrderManager<V: Venue> {
    venue: V,
    leverage_ladder: Vec<u32>,
    active_leverage: Option<u32>,
    /// Set to `false` for venues that cannot natively rest a buy above
    /// market; those buys are tracked here and emitted as taker orders
    /// once price reaches the target instead.
    supports_conditional_buy: bool,
    pending_buys: HashMap<i32, PendingBuyIntent>,
    backoff_config: BackoffConfig,
}

impl<V: Venue> OrderManager<V> {
    pub fn new(venue: V, leverage_ladder: Vec<u32>) -> Self {
        Self {
            venue,
            leverage_ladder,
            active_leverage: None,
            supports_conditional_buy: true,
            pending_buys: HashMap::new(),
            backoff_config: BackoffConfig::default(),
        }
    }

    pub fn without_conditional_buy_support(mut self) -> Self {
        self.supports_conditional_buy = false;
        self
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn venue_mut(&mut self) -> &mut V {
        &mut self.venue
    }

    pub fn active_leverage(&self) -> Option<u32> {
        self.active_leverage
    }

    /// Walks the ladder from its first (highest) entry down, accepting
    /// the first tier the venue confirms rather than failing the session
    /// outright on a leverage rejection.
    pub fn apply_leverage_ladder(&mut self) -> Result<u32, VenueError> {
        let mut last_err = None;
        for &tier in &self.leverage_ladder {
            match self.venue.set_leverage(tier) {
                Ok(accepted) => {
                    if accepted != self.leverage_ladder[0] {
                        warn!(tier = accepted, "leverage fallback accepted lower tier");
                    }
                    self.active_leverage = Some(accepted);
                    return Ok(accepted);
                }
                Err(e) => {
                    info!(requested = tier, error = %e, "leverage tier rejected, trying next");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| VenueError::LeverageRejected {
            requested: 0,
            reason: "empty leverage ladder".into(),
        }))
    }

    /// Executes a single slide action against the venue, updating the
    /// position map to match what actually happened. `fragment_size` is
    /// the per-slot order size (the cycle's locked long fragment).
    pub fn execute(
        &mut self,
        action: &SlideAction,
        position_map: &mut PositionMap,
        fragment_size: Decimal,
    ) {
        match action {
            SlideAction::Vacated { .. } => {
                // Bookkeeping only; position_map was already updated by
                // the sliding window itself.
            }
            SlideAction::Cancel { unit } => self.execute_cancel(*unit, position_map),
            SlideAction::Place { unit, order_type } => {
                self.execute_place(*unit, *order_type, position_map, fragment_size)
            }
        }
    }

    fn execute_cancel(&mut self, unit: i32, position_map: &mut PositionMap) {
        self.pending_buys.remove(&unit);
        let order_id = match position_map.get(unit) {
            Ok(entry) => entry.order_id.clone(),
            Err(_) => None,
        };
        let Some(order_id) = order_id else {
            return;
        };
        match self.cancel_with_retry(&OrderId::new(order_id)) {
            Ok(()) => {}
            Err(e) => warn!(unit, error = %e, "cancellation exhausted retries"),
        }
    }

    fn cancel_with_retry(&mut self, order_id: &OrderId) -> Result<(), VenueError> {
        let mut backoff = ExponentialBackoff::with_config(self.backoff_config.clone());
        loop {
            match self.venue.cancel(order_id) {
                Ok(()) => return Ok(()),
                Err(VenueError::OrderNotFound(_)) => return Ok(()),
                Err(e) => match backoff.next_delay() {
                    Some(delay) => std::thread::sleep(delay),
                    None => return Err(e),
                },
            }
        }
    }

    fn execute_place(
        &mut self,
        unit: i32,
        order_type: OrderType,
        position_map: &mut PositionMap,
        fragment_size: Decimal,
    ) {
        let price = match position_map.price_of(unit) {
            Ok(p) => p,
            Err(e) => {
                warn!(unit, error = %e, "cannot place, unit out of range");
                return;
            }
        };

        if order_type == OrderType::LimitBuy
            && !self.supports_conditional_buy
            && price > self.venue.mark_price()
        {
            self.pending_buys.insert(
                unit,
                PendingBuyIntent {
                    unit,
                    target_price: price,
                    size: fragment_size,
                },
            );
            return;
        }

        let result = match order_type {
            OrderType::StopLossSell => self.venue.place_stop_sell(price, fragment_size),
            OrderType::LimitBuy => self.venue.place_limit_buy(price, fragment_size),
        };

        match result {
            Ok(order_id) => {
                let _ = position_map.set_active(unit, order_id.as_str().to_string());
            }
            Err(e) => {
                warn!(unit, %order_type, error = %e, "venue rejected placement, slot left empty");
                let _ = position_map.set_empty(unit);
            }
        }
    }

    /// Feeds a price tick to the pending-buy tracker fallback, emitting
    /// taker orders for any intent whose target has now been reached.
    pub fn on_price_tick(&mut self, price: Decimal, position_map: &mut PositionMap) {
        if self.supports_conditional_buy || self.pending_buys.is_empty() {
            return;
        }
        let triggered: Vec<i32> = self
            .pending_buys
            .values()
            .filter(|intent| price >= intent.target_price)
            .map(|intent| intent.unit)
            .collect();

        for unit in triggered {
            if let Some(intent) = self.pending_buys.remove(&unit) {
                match self.venue.place_limit_buy(intent.target_price, intent.size) {
                    Ok(order_id) => {
                        let _ = position_map.set_active(unit, order_id.as_str().to_string());
                    }
                    Err(e) => {
                        warn!(unit, error = %e, "pending buy trigger rejected by venue");
                        let _ = position_map.set_empty(unit);
                    }
                }
            }
        }
    }
}
