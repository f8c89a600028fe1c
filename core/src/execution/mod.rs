//! The venue boundary: everything that can suspend on a network round
//! trip lives behind the [`Venue`] trait. The engine loop never holds a
//! lock across one of these calls.

pub mod simulated;
pub mod types;

pub use simulated::SimulatedVenue;
pub use types::{ExecutionMode, Fill, Order, OrderId, OrderStatus, Side, TimeInForce};

use rust_decimal::Decimal;
use thiserror::Error;

/// Structured venue-side failures, distinguished so the engine loop can
/// apply the right recovery per the error taxonomy: retry, skip-slot,
/// fall back to a lower leverage tier, or escalate.
#[derive(Debug, Error, Clone)]
pub enum VenueError {
    #[error("rpc timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("venue rejected order: {0}")]
    Rejected(String),
    #[error("venue rejected leverage {requested}: {reason}")]
    LeverageRejected { requested: u32, reason: String },
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// The REST + stream surface the engine consumes from a venue adapter.
/// `place_stop_sell`/`place_limit_buy` are separate from a generic
/// `place_order` because stop-sells are always reduce-only and
/// limit-buys resting above market may need conditional (trigger) order
/// semantics — venues without native support implement the pending-buy
/// tracker fallback internally and still satisfy this trait.
pub trait Venue: Send {
    fn place_stop_sell(&mut self, price: Decimal, size: Decimal) -> Result<OrderId, VenueError>;
    fn place_limit_buy(&mut self, price: Decimal, size: Decimal) -> Result<OrderId, VenueError>;
    fn cancel(&mut self, order_id: &OrderId) -> Result<(), VenueError>;
    fn open_orders(&self) -> Vec<Order>;
    /// Signed realised position size (positive = long).
    fn position(&self) -> Decimal;
    fn mark_price(&self) -> Decimal;
    /// Attempts to set leverage, returning the tier actually accepted.
    fn set_leverage(&mut self, leverage: u32) -> Result<u32, VenueError>;
    /// Drains and returns fills observed since the last call.
    fn drain_fills(&mut self) -> Vec<Fill>;
    fn execution_mode(&self) -> ExecutionMode;

    fn dropped_fill_count(&self) -> u64 {
        0
    }

    fn cancel_all(&mut self) -> Result<(), VenueError> {
        let orders = self.open_orders();
        for order in orders {
            match self.cancel(&order.id) {
                Ok(()) | Err(VenueError::OrderNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_error_display_is_human_readable() {
        let err = VenueError::LeverageRejected {
            requested: 20,
            reason: "invalid leverage".into(),
        };
        assert!(err.to_string().contains("20"));
    }
}
