//! Property-based tests for the sliding window's steady-state invariants
//! across arbitrary sequences of unit moves, not just the hand-picked
//! scenarios in `window.rs`'s unit tests.

#[cfg(test)]
mod tests {
    use crate::domain::position_map::PositionMap;
    use crate::domain::quantiser::PriceQuantiser;
    use crate::domain::window::SlidingWindow;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn map() -> PositionMap {
        let q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        PositionMap::new(&q, -500, 500)
    }

    proptest! {
        /// After every slide in an arbitrary walk, the window holds at
        /// most 4 resting orders, split into two disjoint, internally
        /// sorted sides.
        #[test]
        fn window_stays_disjoint_and_sorted(steps in prop::collection::vec(-20i32..=20, 0..50)) {
            let mut m = map();
            let mut w = SlidingWindow::new();
            w.init(&mut m);
            let mut unit = 0;

            for step in steps {
                let new_unit = (unit + step).clamp(-400, 400);
                w.slide(unit, new_unit, &mut m);
                unit = new_unit;

                prop_assert!(w.len() <= 4);
                prop_assert!(w.trailing_stop().windows(2).all(|p| p[0] < p[1]));
                prop_assert!(w.trailing_buy().windows(2).all(|p| p[0] < p[1]));
                for &s in w.trailing_stop() {
                    prop_assert!(!w.trailing_buy().contains(&s));
                }
            }
        }

        /// Every resting stop stays strictly below the current unit and
        /// every resting buy stays strictly above it — the steady-state
        /// placement invariant must hold after any single slide from a
        /// freshly initialised window.
        #[test]
        fn resting_orders_stay_on_their_side_of_current_unit(target in -40i32..=40) {
            let mut m = map();
            let mut w = SlidingWindow::new();
            w.init(&mut m);
            w.slide(0, target, &mut m);

            for &s in w.trailing_stop() {
                prop_assert!(s < target);
            }
            for &b in w.trailing_buy() {
                prop_assert!(b > target);
            }
        }

        /// Sliding to the same unit twice in a row is idempotent: the
        /// second slide is a pure no-op regardless of the first.
        #[test]
        fn repeated_slide_to_same_unit_is_idempotent(target in -40i32..=40) {
            let mut m = map();
            let mut w = SlidingWindow::new();
            w.init(&mut m);
            w.slide(0, target, &mut m);

            let stops_before = w.trailing_stop().to_vec();
            let buys_before = w.trailing_buy().to_vec();
            let actions = w.slide(target, target, &mut m);

            prop_assert!(actions.is_empty());
            prop_assert_eq!(w.trailing_stop().to_vec(), stops_before);
            prop_assert_eq!(w.trailing_buy().to_vec(), buys_before);
        }
    }
}
