//! Dense per-cycle table of grid slots keyed by signed unit index.

use std::fmt;

use rust_decimal::Decimal;

use super::errors::DomainError;
use super::quantiser::PriceQuantiser;

/// The two order shapes the grid ever rests in the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    /// Reduce-only stop order resting below market, trailing price up.
    StopLossSell,
    /// Conditional/tracked buy resting above market, trailing price down.
    LimitBuy,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::StopLossSell => write!(f, "stop_loss_sell"),
            OrderType::LimitBuy => write!(f, "limit_buy"),
        }
    }
}

/// Lifecycle state of a single grid slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// No order intended for this unit right now.
    Empty,
    /// Placement RPC in flight, no exchange order id recorded yet.
    Pending,
    /// Exchange order id recorded, resting live in the book.
    Active,
    /// Filled and removed from the window.
    Filled,
    /// Cancelled and removed from the window.
    Cancelled,
}

/// A single unit's slot: what, if anything, is resting there.
#[derive(Debug, Clone)]
pub struct PositionMapEntry {
    pub unit: i32,
    pub price: Decimal,
    pub order_id: Option<String>,
    pub order_type: Option<OrderType>,
    pub status: SlotStatus,
}

impl PositionMapEntry {
    fn empty(unit: i32, price: Decimal) -> Self {
        Self {
            unit,
            price,
            order_id: None,
            order_type: None,
            status: SlotStatus::Empty,
        }
    }

    pub fn is_resting(&self) -> bool {
        matches!(self.status, SlotStatus::Pending | SlotStatus::Active)
    }
}

/// Dense table of grid slots for the operating range, allocated once per
/// cycle. Lookups are O(1) via direct index arithmetic; units outside the
/// configured range are refused rather than silently growing the table.
#[derive(Debug, Clone)]
pub struct PositionMap {
    min_unit: i32,
    max_unit: i32,
    slots: Vec<PositionMapEntry>,
}

impl PositionMap {
    pub fn new(quantiser: &PriceQuantiser, min_unit: i32, max_unit: i32) -> Self {
        assert!(min_unit <= max_unit);
        let slots = (min_unit..=max_unit)
            .map(|u| PositionMapEntry::empty(u, quantiser.price_of(u)))
            .collect();
        Self {
            min_unit,
            max_unit,
            slots,
        }
    }

    pub fn min_unit(&self) -> i32 {
        self.min_unit
    }

    pub fn max_unit(&self) -> i32 {
        self.max_unit
    }

    fn index_of(&self, unit: i32) -> Result<usize, DomainError> {
        if unit < self.min_unit || unit > self.max_unit {
            return Err(DomainError::UnitOutOfRange {
                unit,
                min: self.min_unit,
                max: self.max_unit,
            });
        }
        Ok((unit - self.min_unit) as usize)
    }

    /// Clamps an out-of-range unit to the nearest in-range unit. Callers
    /// that hit this path should flag the Auditor; the grid keeps running
    /// against the clamped slot rather than halting.
    pub fn clamp(&self, unit: i32) -> i32 {
        unit.clamp(self.min_unit, self.max_unit)
    }

    pub fn get(&self, unit: i32) -> Result<&PositionMapEntry, DomainError> {
        let idx = self.index_of(unit)?;
        Ok(&self.slots[idx])
    }

    pub fn get_mut(&mut self, unit: i32) -> Result<&mut PositionMapEntry, DomainError> {
        let idx = self.index_of(unit)?;
        Ok(&mut self.slots[idx])
    }

    pub fn set_pending(&mut self, unit: i32, order_type: OrderType) -> Result<(), DomainError> {
        let entry = self.get_mut(unit)?;
        entry.order_type = Some(order_type);
        entry.order_id = None;
        entry.status = SlotStatus::Pending;
        Ok(())
    }

    pub fn set_active(&mut self, unit: i32, order_id: String) -> Result<(), DomainError> {
        let entry = self.get_mut(unit)?;
        entry.order_id = Some(order_id);
        entry.status = SlotStatus::Active;
        Ok(())
    }

    pub fn set_filled(&mut self, unit: i32) -> Result<(), DomainError> {
        let entry = self.get_mut(unit)?;
        entry.status = SlotStatus::Filled;
        entry.order_id = None;
        entry.order_type = None;
        Ok(())
    }

    pub fn set_cancelled(&mut self, unit: i32) -> Result<(), DomainError> {
        let entry = self.get_mut(unit)?;
        entry.status = SlotStatus::Cancelled;
        entry.order_id = None;
        entry.order_type = None;
        Ok(())
    }

    pub fn set_empty(&mut self, unit: i32) -> Result<(), DomainError> {
        let entry = self.get_mut(unit)?;
        entry.status = SlotStatus::Empty;
        entry.order_id = None;
        entry.order_type = None;
        Ok(())
    }

    /// Finds the unit (if any) whose recorded order id matches, used when
    /// a fill or audit result names an order id without a unit.
    pub fn find_by_order_id(&self, order_id: &str) -> Option<i32> {
        self.slots
            .iter()
            .find(|e| e.order_id.as_deref() == Some(order_id))
            .map(|e| e.unit)
    }

    pub fn price_of(&self, unit: i32) -> Result<Decimal, DomainError> {
        Ok(self.get(unit)?.price)
    }

    pub fn rebuild(&mut self, quantiser: &PriceQuantiser) {
        for entry in &mut self.slots {
            entry.price = quantiser.price_of(entry.unit);
            entry.order_id = None;
            entry.order_type = None;
            entry.status = SlotStatus::Empty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn map() -> PositionMap {
        let q = PriceQuantiser::new(dec!(100.00), dec!(0.10));
        PositionMap::new(&q, -10, 10)
    }

    #[test]
    fn out_of_range_lookup_is_refused() {
        let m = map();
        assert!(matches!(
            m.get(11),
            Err(DomainError::UnitOutOfRange { .. })
        ));
        assert_eq!(m.clamp(11), 10);
    }

    #[test]
    fn slot_lifecycle_round_trips() {
        let mut m = map();
        m.set_pending(-1, OrderType::StopLossSell).unwrap();
        assert_eq!(m.get(-1).unwrap().status, SlotStatus::Pending);
        m.set_active(-1, "abc".into()).unwrap();
        assert_eq!(m.get(-1).unwrap().order_id.as_deref(), Some("abc"));
        m.set_filled(-1).unwrap();
        assert_eq!(m.get(-1).unwrap().status, SlotStatus::Filled);
        assert!(m.get(-1).unwrap().order_id.is_none());
    }

    #[test]
    fn find_by_order_id_locates_unit() {
        let mut m = map();
        m.set_pending(3, OrderType::LimitBuy).unwrap();
        m.set_active(3, "xyz".into()).unwrap();
        assert_eq!(m.find_by_order_id("xyz"), Some(3));
        assert_eq!(m.find_by_order_id("nope"), None);
    }
}
