//! Integration coverage for the literal boundary scenarios: a full
//! decline/recovery cycle driving a RESET, and a two-pass audit that
//! cancels an orphan order and then confirms a healthy book.

use std::collections::HashMap;

use quadgrid_core::domain::GridConfig;
use quadgrid_core::engine::{Auditor, AuditorConfig, Engine, EngineEvent, OrderManager};
use quadgrid_core::execution::{ExecutionMode, Fill, Order, OrderId, SimulatedVenue, Venue, VenueError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn full_decline_and_recovery_cycle_triggers_reset() {
    let config = GridConfig::new("BTC-PERP", dec!(100), dec!(1), dec!(400), 1);
    let venue = SimulatedVenue::new(dec!(100));
    let order_manager = OrderManager::new(venue, vec![1]);
    let mut engine = Engine::new(config, order_manager, AuditorConfig::default(), (-20, 20), None);

    assert_eq!(engine.status().trailing_stop, vec![-4, -3, -2, -1]);

    // A gap decline past all four stops converts the whole window to buys.
    engine.handle_event(EngineEvent::PriceTick(dec!(94)));
    let mid = engine.status();
    assert!(mid.trailing_stop.is_empty());
    assert_eq!(mid.trailing_buy, vec![-5, -4, -3, -2]);
    assert_eq!(mid.stats.resets, 0);

    // Recovering all the way back past the buys rebuilds an all-stops
    // window with prior buy history, which triggers a RESET.
    engine.handle_event(EngineEvent::PriceTick(dec!(100)));
    let after = engine.status();
    assert_eq!(after.stats.resets, 1);
    assert_eq!(after.cycle_index, 1);
    assert_eq!(after.trailing_stop, vec![-4, -3, -2, -1]);
    assert!(after.trailing_buy.is_empty());
}

/// A venue double that keeps placed orders genuinely resting until the
/// test explicitly fills them, unlike [`SimulatedVenue`] which fills on
/// placement. Needed to exercise audit scenarios where a live order must
/// still be observable as an orphan on the next pass.
#[derive(Default)]
struct RestingVenue {
    orders: HashMap<OrderId, Order>,
    position: Decimal,
    mark_price: Decimal,
    next_id: u64,
}

impl RestingVenue {
    fn new(mark_price: Decimal) -> Self {
        Self {
            mark_price,
            ..Default::default()
        }
    }

    fn next_order_id(&mut self) -> OrderId {
        self.next_id += 1;
        OrderId::new(format!("resting-{}", self.next_id))
    }
}

impl Venue for RestingVenue {
    fn place_stop_sell(&mut self, price: Decimal, size: Decimal) -> Result<OrderId, VenueError> {
        let id = self.next_order_id();
        self.orders.insert(id.clone(), Order::stop_loss_sell(id.clone(), price, size));
        Ok(id)
    }

    fn place_limit_buy(&mut self, price: Decimal, size: Decimal) -> Result<OrderId, VenueError> {
        let id = self.next_order_id();
        self.orders.insert(id.clone(), Order::limit_buy(id.clone(), price, size));
        Ok(id)
    }

    fn cancel(&mut self, order_id: &OrderId) -> Result<(), VenueError> {
        match self.orders.remove(order_id) {
            Some(_) => Ok(()),
            None => Err(VenueError::OrderNotFound(order_id.to_string())),
        }
    }

    fn open_orders(&self) -> Vec<Order> {
        self.orders.values().filter(|o| o.is_active()).cloned().collect()
    }

    fn position(&self) -> Decimal {
        self.position
    }

    fn mark_price(&self) -> Decimal {
        self.mark_price
    }

    fn set_leverage(&mut self, leverage: u32) -> Result<u32, VenueError> {
        Ok(leverage)
    }

    fn drain_fills(&mut self) -> Vec<Fill> {
        Vec::new()
    }

    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::Simulated
    }
}

#[test]
fn orphan_order_is_cancelled_then_second_pass_is_healthy() {
    use quadgrid_core::domain::{PositionMap, PriceQuantiser, SlidingWindow};

    let quantiser = PriceQuantiser::new(dec!(100), dec!(1));
    let mut position_map = PositionMap::new(&quantiser, -20, 20);
    let mut window = SlidingWindow::new();
    let venue = RestingVenue::new(dec!(100));
    let mut order_manager = OrderManager::new(venue, vec![1]);

    for action in &window.init(&mut position_map) {
        order_manager.execute(action, &mut position_map, dec!(1));
    }

    // An order the window never asked for: a stray resting order at a
    // price the grid doesn't expect, e.g. left over from a prior crash.
    order_manager
        .venue_mut()
        .place_stop_sell(dec!(50), dec!(1))
        .expect("orphan placement");

    let auditor = Auditor::new(AuditorConfig::default());

    let first_pass = auditor.audit(&window, &mut position_map, &mut order_manager, dec!(1));
    assert_eq!(first_pass.orphans_cancelled.len(), 1);
    assert!(first_pass.needs_follow_up());

    let second_pass = auditor.audit(&window, &mut position_map, &mut order_manager, dec!(1));
    assert!(second_pass.is_healthy(), "orphan should be gone by the follow-up pass");
}
