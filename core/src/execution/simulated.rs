//! In-process venue stand-in used by the `quadgrid-simulated` binary and
//! by tests. Fills are generated pessimistically and immediately, the
//! instant an order is placed — there is no partial-fill or slippage
//! model here, that belongs to a future, more realistic simulator.

use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{ExecutionMode, Fill, Order, OrderId, OrderStatus, VenueError};
use crate::domain::OrderType;

/// Caps the in-memory fill queue so a venue-side bug (or a test that
/// never drains) can't grow this unboundedly; overflow drops the oldest
/// fill and counts it, mirroring how a real venue's fill stream would
/// eventually disconnect a slow consumer.
const MAX_PENDING_FILLS: usize = 1024;

pub struct SimulatedVenue {
    orders: HashMap<OrderId, Order>,
    pending_fills: VecDeque<Fill>,
    dropped_fills: u64,
    position: Decimal,
    mark_price: Decimal,
    leverage: u32,
}

impl SimulatedVenue {
    pub fn new(starting_mark_price: Decimal) -> Self {
        info!("simulated venue initialised at mark price {starting_mark_price}");
        Self {
            orders: HashMap::new(),
            pending_fills: VecDeque::new(),
            dropped_fills: 0,
            position: Decimal::ZERO,
            mark_price: starting_mark_price,
            leverage: 1,
        }
    }

    pub fn set_mark_price(&mut self, price: Decimal) {
        self.mark_price = price;
    }

    pub fn pending_fill_count(&self) -> usize {
        self.pending_fills.len()
    }

    fn push_fill(&mut self, fill: Fill) {
        if self.pending_fills.len() >= MAX_PENDING_FILLS {
            self.pending_fills.pop_front();
            self.dropped_fills += 1;
            warn!("simulated fill queue at capacity, dropping oldest fill");
        }
        self.pending_fills.push_back(fill);
    }

    fn simulate_fill(&mut self, order: &mut Order) -> Fill {
        order.filled_size = order.size;
        order.avg_fill_price = Some(order.price);
        order.status = OrderStatus::Filled;

        let side = order.side();
        let signed = match side {
            super::Side::Buy => order.size,
            super::Side::Sell => -order.size,
        };
        self.position += signed;

        Fill::new(order.id.clone(), side, order.price, order.size)
    }

    fn place(&mut self, order_type: OrderType, price: Decimal, size: Decimal) -> Result<OrderId, VenueError> {
        if size <= Decimal::ZERO {
            return Err(VenueError::Rejected("order size must be positive".into()));
        }
        if price < Decimal::ZERO {
            return Err(VenueError::Rejected("price must be non-negative".into()));
        }

        let id = OrderId::new_random();
        let mut order = match order_type {
            OrderType::StopLossSell => Order::stop_loss_sell(id.clone(), price, size),
            OrderType::LimitBuy => Order::limit_buy(id.clone(), price, size),
        };
        order.status = OrderStatus::Active;

        let fill = self.simulate_fill(&mut order);
        self.orders.insert(id.clone(), order);
        self.push_fill(fill);

        Ok(id)
    }
}

impl super::Venue for SimulatedVenue {
    fn place_stop_sell(&mut self, price: Decimal, size: Decimal) -> Result<OrderId, VenueError> {
        self.place(OrderType::StopLossSell, price, size)
    }

    fn place_limit_buy(&mut self, price: Decimal, size: Decimal) -> Result<OrderId, VenueError> {
        self.place(OrderType::LimitBuy, price, size)
    }

    fn cancel(&mut self, order_id: &OrderId) -> Result<(), VenueError> {
        match self.orders.get_mut(order_id) {
            Some(order) if order.is_active() => {
                order.status = OrderStatus::Cancelled;
                Ok(())
            }
            // Already filled, or never existed: cancellation is still
            // considered successful per the venue error taxonomy.
            _ => Ok(()),
        }
    }

    fn open_orders(&self) -> Vec<Order> {
        self.orders
            .values()
            .filter(|o| o.is_active())
            .cloned()
            .collect()
    }

    fn position(&self) -> Decimal {
        self.position
    }

    fn mark_price(&self) -> Decimal {
        self.mark_price
    }

    fn set_leverage(&mut self, leverage: u32) -> Result<u32, VenueError> {
        self.leverage = leverage;
        Ok(leverage)
    }

    fn drain_fills(&mut self) -> Vec<Fill> {
        self.pending_fills.drain(..).collect()
    }

    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::Simulated
    }

    fn dropped_fill_count(&self) -> u64 {
        self.dropped_fills
    }
}

#[cfg(test)]
mod tests {
    use super::super::Venue;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn place_stop_sell_fills_immediately() {
        let mut venue = SimulatedVenue::new(dec!(100));
        let id = venue.place_stop_sell(dec!(96), dec!(1)).unwrap();
        let fills = venue.drain_fills();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].order_id, id);
        assert_eq!(venue.position(), dec!(-1));
    }

    #[test]
    fn place_limit_buy_fills_and_increments_position() {
        let mut venue = SimulatedVenue::new(dec!(100));
        venue.place_limit_buy(dec!(104), dec!(2)).unwrap();
        assert_eq!(venue.position(), dec!(2));
    }

    #[test]
    fn cancel_on_already_filled_order_is_still_ok() {
        let mut venue = SimulatedVenue::new(dec!(100));
        let id = venue.place_stop_sell(dec!(96), dec!(1)).unwrap();
        assert!(venue.cancel(&id).is_ok());
    }

    #[test]
    fn rejects_non_positive_size() {
        let mut venue = SimulatedVenue::new(dec!(100));
        let err = venue.place_stop_sell(dec!(96), dec!(0)).unwrap_err();
        assert!(matches!(err, VenueError::Rejected(_)));
    }

    #[test]
    fn open_orders_excludes_filled() {
        let mut venue = SimulatedVenue::new(dec!(100));
        venue.place_stop_sell(dec!(96), dec!(1)).unwrap();
        assert!(venue.open_orders().is_empty());
    }
}
