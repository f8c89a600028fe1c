//! Phase is a pure, derived view over window composition and cycle
//! history — it is never stored independently, only recomputed.

use std::fmt;

use super::window::SlidingWindow;

/// Where the cycle sits in the advance/retracement/decline/recovery loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// All four resting orders are stop-sells; price has been climbing
    /// (or just reset) without a retracement fill yet.
    Advance,
    /// At least one stop-sell has filled but the window still holds a
    /// mix, or has not yet produced a buy-side fill.
    Retracement,
    /// All four resting orders are limit-buys.
    Decline,
    /// At least one limit-buy has filled; the window is recovering
    /// toward an all-stops state.
    Recovery,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Advance => "advance",
            Phase::Retracement => "retracement",
            Phase::Decline => "decline",
            Phase::Recovery => "recovery",
        };
        write!(f, "{s}")
    }
}

/// Tracks just enough cycle history to disambiguate Retracement/Advance
/// from Recovery when the window happens to be all-stops. `ever_held_buy`
/// and `ever_filled_stop` are observability only; `ever_fully_declined` is
/// what classification actually gates on — a shallow retracement that
/// never drove the window to all-buys must not read as Recovery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseHistory {
    pub ever_held_buy: bool,
    pub ever_filled_stop: bool,
    pub ever_fully_declined: bool,
}

/// Derives the current [`Phase`] from window composition plus minimal
/// cycle history. Never holds state of its own beyond what's passed in.
pub struct PhaseClassifier;

impl PhaseClassifier {
    pub fn classify(window: &SlidingWindow, history: PhaseHistory) -> Phase {
        let stops = window.trailing_stop().len();
        let buys = window.trailing_buy().len();

        if buys == 0 && stops == 4 {
            if history.ever_fully_declined {
                Phase::Recovery
            } else {
                Phase::Advance
            }
        } else if stops == 0 && buys == 4 {
            Phase::Decline
        } else if buys > 0 && stops > 0 {
            if history.ever_fully_declined {
                Phase::Recovery
            } else {
                Phase::Retracement
            }
        } else {
            // Degenerate window (mid-correction, fewer than 4 resting).
            if history.ever_fully_declined {
                Phase::Recovery
            } else {
                Phase::Retracement
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position_map::PositionMap;
    use crate::domain::quantiser::PriceQuantiser;
    use rust_decimal_macros::dec;

    fn map() -> PositionMap {
        let q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        PositionMap::new(&q, -20, 20)
    }

    #[test]
    fn all_stops_with_no_buy_history_is_advance() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        let phase = PhaseClassifier::classify(&w, PhaseHistory::default());
        assert_eq!(phase, Phase::Advance);
    }

    #[test]
    fn all_buys_is_decline() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        w.slide(0, -6, &mut m);
        let phase = PhaseClassifier::classify(&w, PhaseHistory::default());
        assert_eq!(phase, Phase::Decline);
    }

    #[test]
    fn all_stops_after_prior_buy_history_is_recovery() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        w.slide(0, -6, &mut m);
        w.slide(-6, 0, &mut m);
        let history = PhaseHistory {
            ever_held_buy: true,
            ever_filled_stop: true,
            ever_fully_declined: true,
        };
        let phase = PhaseClassifier::classify(&w, history);
        assert_eq!(phase, Phase::Recovery);
    }

    #[test]
    fn all_stops_after_shallow_retracement_without_full_decline_is_advance() {
        // Only one stop ever converts to a buy and then recovers; the
        // window never reached all-buys, so this must not read as Recovery.
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        w.slide(0, -1, &mut m);
        w.slide(-1, 0, &mut m);
        let history = PhaseHistory {
            ever_held_buy: true,
            ever_filled_stop: true,
            ever_fully_declined: false,
        };
        let phase = PhaseClassifier::classify(&w, history);
        assert_eq!(phase, Phase::Advance);
    }

    #[test]
    fn mixed_window_without_history_is_retracement() {
        let mut m = map();
        let mut w = SlidingWindow::new();
        w.init(&mut m);
        w.slide(0, 3, &mut m);
        w.slide(3, 0, &mut m);
        let phase = PhaseClassifier::classify(&w, PhaseHistory::default());
        assert_eq!(phase, Phase::Retracement);
    }
}
