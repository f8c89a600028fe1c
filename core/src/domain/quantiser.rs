//! Maps a market price onto a signed unit index relative to a cycle's
//! entry price, and reports unit-change events as price ticks arrive.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// A unit boundary crossing: the engine moved from unit `from` to unit `to`
/// on a single price tick. `|to - from| > 1` is a gap jump and must be
/// handled atomically by the sliding window, not stepped through one unit
/// at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitEvent {
    pub from: i32,
    pub to: i32,
}

impl UnitEvent {
    pub fn gap(&self) -> i32 {
        (self.to - self.from).abs()
    }
}

/// Converts raw prices into unit indices and tracks the currently occupied
/// unit so that repeated prices within the same unit are dropped silently.
#[derive(Debug, Clone)]
pub struct PriceQuantiser {
    entry_price: Decimal,
    unit_size: Decimal,
    current_unit: i32,
}

impl PriceQuantiser {
    pub fn new(entry_price: Decimal, unit_size: Decimal) -> Self {
        Self {
            entry_price,
            unit_size,
            current_unit: 0,
        }
    }

    pub fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    pub fn unit_size(&self) -> Decimal {
        self.unit_size
    }

    pub fn current_unit(&self) -> i32 {
        self.current_unit
    }

    /// `floor((price - entry_price) / unit_size)`, exact decimal division
    /// rounding toward negative infinity. Never fails: extreme prices just
    /// produce extreme unit indices, range clamping is the caller's job.
    pub fn quantise(&self, price: Decimal) -> i32 {
        let offset = (price - self.entry_price) / self.unit_size;
        let unit = offset.floor();
        // unit_size and entry_price keep the operating range well inside
        // i32, so this truncation never overflows in practice.
        unit.to_i64().unwrap_or(if unit.is_sign_negative() {
            i32::MIN as i64
        } else {
            i32::MAX as i64
        }) as i32
    }

    pub fn price_of(&self, unit: i32) -> Decimal {
        self.entry_price + self.unit_size * Decimal::from(unit)
    }

    /// Feeds a new price tick. Returns `None` if the tick stays within the
    /// currently occupied unit; otherwise returns the crossing event and
    /// advances `current_unit`.
    pub fn on_price(&mut self, price: Decimal) -> Option<UnitEvent> {
        let to = self.quantise(price);
        if to == self.current_unit {
            return None;
        }
        let from = self.current_unit;
        self.current_unit = to;
        Some(UnitEvent { from, to })
    }

    /// Rebase the quantiser onto a new entry price, as happens on RESET.
    pub fn rebase(&mut self, entry_price: Decimal) {
        self.entry_price = entry_price;
        self.current_unit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn quantises_exact_boundaries_toward_current_unit() {
        let q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        assert_eq!(q.quantise(dec!(100.00)), 0);
        assert_eq!(q.quantise(dec!(100.10)), 1);
        assert_eq!(q.quantise(dec!(99.90)), -1);
        assert_eq!(q.quantise(dec!(100.15)), 1);
        assert_eq!(q.quantise(dec!(99.95)), -1);
    }

    #[test]
    fn on_price_drops_same_unit_updates() {
        let mut q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        assert_eq!(q.on_price(dec!(100.05)), None);
        assert_eq!(
            q.on_price(dec!(100.15)),
            Some(UnitEvent { from: 0, to: 1 })
        );
        assert_eq!(q.on_price(dec!(100.18)), None);
    }

    #[test]
    fn gap_jump_is_reported_atomically() {
        let mut q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        let ev = q.on_price(dec!(99.35)).unwrap();
        assert_eq!(ev, UnitEvent { from: 0, to: -6 });
        assert_eq!(ev.gap(), 6);
    }

    #[test]
    fn rebase_resets_current_unit_to_zero() {
        let mut q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        q.on_price(dec!(101.50));
        q.rebase(dec!(101.50));
        assert_eq!(q.current_unit(), 0);
        assert_eq!(q.quantise(dec!(101.50)), 0);
    }
}
