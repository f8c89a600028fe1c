//! Matches venue fill events to grid units and recycles the filled slot
//! into its opposite order type. A pure transformation over
//! `SlidingWindow`/`PositionMap`; the only I/O here is what
//! `OrderManager::execute` performs on its behalf.

use std::time::SystemTime;

use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{OrderType, PositionMap, SlidingWindow};
use crate::execution::{Fill, Venue};

use super::order_manager::OrderManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOutcome {
    /// Fill predates engine startup, or is the cycle's bootstrap order.
    Ignored,
    /// Fill's order id has no corresponding position map entry.
    Unmatched,
    /// Fill was matched and the window recycled.
    Applied { unit: i32, order_type: OrderType },
}

pub struct FillRouter {
    startup_time: SystemTime,
}

impl FillRouter {
    pub fn new(startup_time: SystemTime) -> Self {
        Self { startup_time }
    }

    pub fn route<V: Venue>(
        &self,
        fill: &Fill,
        initial_order_id: Option<&str>,
        window: &mut SlidingWindow,
        position_map: &mut PositionMap,
        order_manager: &mut OrderManager<V>,
        fragment_size: Decimal,
        current_unit: i32,
    ) -> FillOutcome {
        if fill.timestamp < self.startup_time {
            return FillOutcome::Ignored;
        }
        if initial_order_id == Some(fill.order_id.as_str()) {
            return FillOutcome::Ignored;
        }

        let Some(unit) = position_map.find_by_order_id(fill.order_id.as_str()) else {
            warn!(order_id = %fill.order_id, "unmatched fill, awaiting auditor reconciliation");
            return FillOutcome::Unmatched;
        };

        let order_type = match position_map.get(unit) {
            Ok(entry) => entry.order_type,
            Err(_) => None,
        };
        let Some(order_type) = order_type else {
            warn!(unit, "fill matched a unit with no recorded order type");
            return FillOutcome::Unmatched;
        };

        let actions = match order_type {
            OrderType::StopLossSell => window.recycle_stop_fill(unit, position_map),
            OrderType::LimitBuy => window.recycle_buy_fill(unit, position_map),
        };
        for action in &actions {
            order_manager.execute(action, position_map, fragment_size);
        }

        if window.len() < 4 {
            let restore_actions = window.restore_invariant(current_unit, position_map);
            for action in &restore_actions {
                order_manager.execute(action, position_map, fragment_size);
            }
        }

        FillOutcome::Applied { unit, order_type }
    }
}
