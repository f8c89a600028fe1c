//! The four-order sliding window: two sorted lists of units, one side
//! trailing stop-sells below market, the other trailing limit-buys above
//! it. `SlidingWindow` is a pure data structure — it decides what should
//! be resting where, but never performs I/O itself. Callers turn the
//! returned [`SlideAction`]s into real placements/cancellations through
//! the order manager.

use super::position_map::{OrderType, PositionMap};

#[cfg(test)]
#[path = "window_proptest.rs"]
mod window_proptest;

/// One step the caller must take to bring the book in line with the
/// window's desired state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideAction {
    /// Unit was vacated by a fill already recorded elsewhere — bookkeeping
    /// only, no cancellation RPC against the venue.
    Vacated { unit: i32 },
    /// A genuinely resting order must be cancelled.
    Cancel { unit: i32 },
    /// A new order must be placed at this unit.
    Place { unit: i32, order_type: OrderType },
}

/// Two disjoint, ascending-sorted unit lists whose combined length is 4
/// in steady state.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    trailing_stop: Vec<i32>,
    trailing_buy: Vec<i32>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self {
            trailing_stop: Vec::new(),
            trailing_buy: Vec::new(),
        }
    }

    pub fn trailing_stop(&self) -> &[i32] {
        &self.trailing_stop
    }

    pub fn trailing_buy(&self) -> &[i32] {
        &self.trailing_buy
    }

    pub fn len(&self) -> usize {
        self.trailing_stop.len() + self.trailing_buy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, unit: i32) -> bool {
        self.trailing_stop.binary_search(&unit).is_ok()
            || self.trailing_buy.binary_search(&unit).is_ok()
    }

    /// Seeds the window at cycle start: four stop-sells immediately below
    /// the entry unit, placed eagerly.
    pub fn init(&mut self, position_map: &mut PositionMap) -> Vec<SlideAction> {
        self.trailing_stop = vec![-4, -3, -2, -1];
        self.trailing_buy.clear();
        let mut actions = Vec::with_capacity(4);
        for &unit in &self.trailing_stop {
            let _ = position_map.set_pending(unit, OrderType::StopLossSell);
            actions.push(SlideAction::Place {
                unit,
                order_type: OrderType::StopLossSell,
            });
        }
        actions
    }

    /// Recomputes the desired window for a move from `old` to `new` and
    /// returns the ordered actions needed to realise it. A no-op slide
    /// (`new == old`) returns an empty action list rather than erroring —
    /// the quantiser already filters those before they reach here, this
    /// is a defensive match for the idempotence law.
    pub fn slide(&mut self, old: i32, new: i32, position_map: &mut PositionMap) -> Vec<SlideAction> {
        if new == old {
            return Vec::new();
        }
        if new > old {
            self.slide_up(new, position_map)
        } else {
            self.slide_down(new, position_map)
        }
    }

    fn slide_up(&mut self, new: i32, position_map: &mut PositionMap) -> Vec<SlideAction> {
        // Desired stop range, ascending: the 4 units immediately below market.
        let desired: Vec<i32> = ((new - 4)..new).collect();

        // A buy at or below the new unit has been crossed by the rally
        // and is treated as optimistically executed; the Auditor
        // reconciles against the venue's actual fill record.
        let (vacated_buys, surviving_buys): (Vec<i32>, Vec<i32>) =
            self.trailing_buy.iter().partition(|&&u| u <= new);
        self.trailing_buy = surviving_buys;

        let mut actions = Vec::new();
        for unit in &vacated_buys {
            let _ = position_map.set_filled(*unit);
            actions.push(SlideAction::Vacated { unit: *unit });
        }

        let keep_stops: Vec<i32> = self
            .trailing_stop
            .iter()
            .copied()
            .filter(|u| desired.contains(u))
            .collect();
        let to_cancel: Vec<i32> = self
            .trailing_stop
            .iter()
            .copied()
            .filter(|u| !desired.contains(u))
            .collect();

        let deficit = 4usize.saturating_sub(keep_stops.len() + self.trailing_buy.len());
        let mut to_place: Vec<i32> = desired
            .iter()
            .rev()
            .copied()
            .filter(|u| !keep_stops.contains(u))
            .take(deficit)
            .collect();
        to_place.sort_unstable();

        // Placements before cancellations: the book never drops below 4
        // resting orders while RPCs are in flight.
        for unit in &to_place {
            let _ = position_map.set_pending(*unit, OrderType::StopLossSell);
            actions.push(SlideAction::Place {
                unit: *unit,
                order_type: OrderType::StopLossSell,
            });
        }
        for unit in &to_cancel {
            let _ = position_map.set_cancelled(*unit);
            actions.push(SlideAction::Cancel { unit: *unit });
        }

        self.trailing_stop = keep_stops;
        self.trailing_stop.extend(to_place);
        self.trailing_stop.sort_unstable();

        actions
    }

    fn slide_down(&mut self, new: i32, position_map: &mut PositionMap) -> Vec<SlideAction> {
        // Desired buy range, ascending: the 4 units immediately above market.
        let desired: Vec<i32> = ((new + 1)..=(new + 4)).collect();

        // A stop at or above the new unit has been crossed by the decline
        // and is treated as optimistically executed; the Auditor
        // reconciles against the venue's actual fill record.
        let (vacated_stops, surviving_stops): (Vec<i32>, Vec<i32>) =
            self.trailing_stop.iter().partition(|&&u| u >= new);
        self.trailing_stop = surviving_stops;

        let mut actions = Vec::new();
        for unit in &vacated_stops {
            let _ = position_map.set_filled(*unit);
            actions.push(SlideAction::Vacated { unit: *unit });
        }

        let keep_buys: Vec<i32> = self
            .trailing_buy
            .iter()
            .copied()
            .filter(|u| desired.contains(u))
            .collect();
        let to_cancel: Vec<i32> = self
            .trailing_buy
            .iter()
            .copied()
            .filter(|u| !desired.contains(u))
            .collect();

        let deficit = 4usize.saturating_sub(keep_buys.len() + self.trailing_stop.len());
        let to_place: Vec<i32> = desired
            .iter()
            .copied()
            .filter(|u| !keep_buys.contains(u))
            .take(deficit)
            .collect();

        for unit in &to_place {
            let _ = position_map.set_pending(*unit, OrderType::LimitBuy);
            actions.push(SlideAction::Place {
                unit: *unit,
                order_type: OrderType::LimitBuy,
            });
        }
        for unit in &to_cancel {
            let _ = position_map.set_cancelled(*unit);
            actions.push(SlideAction::Cancel { unit: *unit });
        }

        self.trailing_buy = keep_buys;
        self.trailing_buy.extend(to_place);
        self.trailing_buy.sort_unstable();

        actions
    }

    /// Removes a filled stop-sell at `unit` and schedules its replacement
    /// limit-buy one unit above, per the fill-recycling rule.
    pub fn recycle_stop_fill(&mut self, unit: i32, position_map: &mut PositionMap) -> Vec<SlideAction> {
        self.trailing_stop.retain(|u| *u != unit);
        let _ = position_map.set_filled(unit);
        let replacement = unit + 1;
        let _ = position_map.set_pending(replacement, OrderType::LimitBuy);
        if !self.trailing_buy.contains(&replacement) {
            self.trailing_buy.push(replacement);
            self.trailing_buy.sort_unstable();
        }
        vec![SlideAction::Place {
            unit: replacement,
            order_type: OrderType::LimitBuy,
        }]
    }

    /// Removes a filled limit-buy at `unit` and schedules its replacement
    /// stop-sell one unit below.
    pub fn recycle_buy_fill(&mut self, unit: i32, position_map: &mut PositionMap) -> Vec<SlideAction> {
        self.trailing_buy.retain(|u| *u != unit);
        let _ = position_map.set_filled(unit);
        let replacement = unit - 1;
        let _ = position_map.set_pending(replacement, OrderType::StopLossSell);
        if !self.trailing_stop.contains(&replacement) {
            self.trailing_stop.push(replacement);
            self.trailing_stop.sort_unstable();
        }
        vec![SlideAction::Place {
            unit: replacement,
            order_type: OrderType::StopLossSell,
        }]
    }

    /// Restores the steady-state invariant (four resting orders) after a
    /// mutation leaves the window short, defaulting to whichever side
    /// last had activity. `anchor` is the current unit.
    pub fn restore_invariant(&mut self, anchor: i32, position_map: &mut PositionMap) -> Vec<SlideAction> {
        let mut actions = Vec::new();
        while self.len() < 4 {
            let unit = if self.trailing_buy.is_empty() {
                anchor - self.trailing_stop.len() as i32 - 1
            } else {
                anchor + self.trailing_buy.len() as i32 + 1
            };
            let order_type = if unit < anchor {
                OrderType::StopLossSell
            } else {
                OrderType::LimitBuy
            };
            let _ = position_map.set_pending(unit, order_type);
            match order_type {
                OrderType::StopLossSell => {
                    self.trailing_stop.push(unit);
                    self.trailing_stop.sort_unstable();
                }
                OrderType::LimitBuy => {
                    self.trailing_buy.push(unit);
                    self.trailing_buy.sort_unstable();
                }
            }
            actions.push(SlideAction::Place { unit, order_type });
        }
        actions
    }

    pub fn is_all_stops(&self) -> bool {
        self.trailing_buy.is_empty() && self.trailing_stop.len() == 4
    }

    /// True once the window has fully converted to buys — all four slots
    /// are limit-buys and no stop survives. Distinct from "at least one
    /// buy has ever filled": a shallow retracement that only converts one
    /// or two stops before recovering never reaches this state.
    pub fn is_all_buys(&self) -> bool {
        self.trailing_stop.is_empty() && self.trailing_buy.len() == 4
    }

    pub fn reset_to_stops(&mut self, position_map: &mut PositionMap) -> Vec<SlideAction> {
        self.trailing_buy.clear();
        self.init(position_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quantiser::PriceQuantiser;
    use rust_decimal_macros::dec;

    fn map() -> PositionMap {
        let q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        PositionMap::new(&q, -20, 20)
    }

    #[test]
    fn init_seeds_four_stop_sells() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        let actions = w.init(&mut m);
        assert_eq!(w.trailing_stop(), &[-4, -3, -2, -1]);
        assert!(w.trailing_buy().is_empty());
        assert_eq!(actions.len(), 4);
    }

    #[test]
    fn up_by_one_cancels_oldest_and_places_newest() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        let actions = w.slide(0, 1, &mut m);
        assert_eq!(w.trailing_stop(), &[-3, -2, -1, 0]);
        assert!(w.trailing_buy().is_empty());
        let cancels = actions
            .iter()
            .filter(|a| matches!(a, SlideAction::Cancel { unit: -4 }))
            .count();
        let places = actions
            .iter()
            .filter(|a| matches!(a, SlideAction::Place { unit: 0, .. }))
            .count();
        assert_eq!(cancels, 1);
        assert_eq!(places, 1);
    }

    #[test]
    fn down_gap_replaces_all_four_with_buys() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        let actions = w.slide(0, -6, &mut m);
        assert!(w.trailing_stop().is_empty());
        assert_eq!(w.trailing_buy(), &[-5, -4, -3, -2]);
        let vacated = actions
            .iter()
            .filter(|a| matches!(a, SlideAction::Vacated { .. }))
            .count();
        let places = actions
            .iter()
            .filter(|a| matches!(a, SlideAction::Place { .. }))
            .count();
        assert_eq!(vacated, 4);
        assert_eq!(places, 4);
    }

    #[test]
    fn multi_unit_rebound_vacates_all_buys_and_restores_stops() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.trailing_buy = vec![-5, -4, -3, -2];
        for u in &w.trailing_buy.clone() {
            let _ = m.set_pending(*u, OrderType::LimitBuy);
        }
        let actions = w.slide(-6, 0, &mut m);
        assert_eq!(w.trailing_stop(), &[-4, -3, -2, -1]);
        assert!(w.trailing_buy().is_empty());
        let vacated = actions
            .iter()
            .filter(|a| matches!(a, SlideAction::Vacated { .. }))
            .count();
        assert_eq!(vacated, 4);
    }

    #[test]
    fn slide_idempotence_on_equal_units_is_noop() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        let before = w.trailing_stop().to_vec();
        let actions = w.slide(0, 0, &mut m);
        assert!(actions.is_empty());
        assert_eq!(w.trailing_stop(), before.as_slice());
    }

    #[test]
    fn buy_resting_exactly_at_new_unit_is_vacated() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.trailing_buy = vec![0, 1, 2, 3];
        for u in &w.trailing_buy.clone() {
            let _ = m.set_pending(*u, OrderType::LimitBuy);
        }
        let actions = w.slide(-1, 0, &mut m);
        assert!(
            !w.trailing_buy().contains(&0),
            "a buy sitting exactly at the new current unit must be vacated"
        );
        assert!(actions
            .iter()
            .any(|a| matches!(a, SlideAction::Vacated { unit: 0 })));
    }

    #[test]
    fn stop_resting_exactly_at_new_unit_is_vacated() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.trailing_stop = vec![-3, -2, -1, 0];
        for u in &w.trailing_stop.clone() {
            let _ = m.set_pending(*u, OrderType::StopLossSell);
        }
        let actions = w.slide(1, 0, &mut m);
        assert!(
            !w.trailing_stop().contains(&0),
            "a stop sitting exactly at the new current unit must be vacated"
        );
        assert!(actions
            .iter()
            .any(|a| matches!(a, SlideAction::Vacated { unit: 0 })));
    }

    #[test]
    fn round_trip_preserves_steady_state_invariant() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        w.slide(0, 3, &mut m);
        w.slide(3, 0, &mut m);
        assert_eq!(w.len(), 4);
        for u in w.trailing_stop() {
            assert!(!w.trailing_buy().contains(u));
        }
    }
}
