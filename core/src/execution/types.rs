//! Venue-facing order and fill types. Price/size fields are exact
//! decimals throughout; floating point is reserved for human-readable
//! logging only.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rust_decimal::Decimal;

use crate::domain::OrderType;

/// Client-assigned order identifier. Assigned before the placement RPC is
/// sent so the exchange order id can be recorded in the position map the
/// instant the call returns, even under concurrent fill delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn new_random() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let salt: u32 = rand::random();
        Self(format!("qg-{nanos:x}-{salt:08x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl OrderType {
    /// The side a resting order of this type always trades.
    pub fn side(self) -> Side {
        match self {
            OrderType::StopLossSell => Side::Sell,
            OrderType::LimitBuy => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    GoodTilCancel,
    ImmediateOrCancel,
    FillOrKill,
}

/// Mirrors [`crate::domain::SlotStatus`] but lives at the venue boundary —
/// kept as a distinct type since a venue can report states (e.g. a fill
/// observed before the placement RPC returned) the domain model never
/// needs to represent directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Empty,
    Pending,
    Active,
    Filled,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub order_type: OrderType,
    pub price: Decimal,
    pub size: Decimal,
    pub time_in_force: TimeInForce,
    /// Stop-sells are always reduce-only; this only ever reduces exposure.
    pub reduce_only: bool,
    pub status: OrderStatus,
    pub filled_size: Decimal,
    pub avg_fill_price: Option<Decimal>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Order {
    pub fn stop_loss_sell(id: OrderId, price: Decimal, size: Decimal) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            order_type: OrderType::StopLossSell,
            price,
            size,
            time_in_force: TimeInForce::GoodTilCancel,
            reduce_only: true,
            status: OrderStatus::Pending,
            filled_size: Decimal::ZERO,
            avg_fill_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn limit_buy(id: OrderId, price: Decimal, size: Decimal) -> Self {
        let now = SystemTime::now();
        Self {
            id,
            order_type: OrderType::LimitBuy,
            price,
            size,
            time_in_force: TimeInForce::GoodTilCancel,
            reduce_only: false,
            status: OrderStatus::Pending,
            filled_size: Decimal::ZERO,
            avg_fill_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn side(&self) -> Side {
        self.order_type.side()
    }

    pub fn remaining_size(&self) -> Decimal {
        self.size - self.filled_size
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Active)
    }
}

#[derive(Debug, Clone)]
pub struct Fill {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub timestamp: SystemTime,
    pub fee: Option<Decimal>,
}

impl Fill {
    pub fn new(order_id: OrderId, side: Side, price: Decimal, size: Decimal) -> Self {
        Self {
            order_id,
            side,
            price,
            size,
            timestamp: SystemTime::now(),
            fee: None,
        }
    }

    pub fn notional(&self) -> Decimal {
        self.price * self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Live,
    Simulated,
}

impl ExecutionMode {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Some(Self::Live),
            "simulated" | "sim" | "paper" => Some(Self::Simulated),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Live => write!(f, "live"),
            ExecutionMode::Simulated => write!(f, "simulated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stop_loss_sell_is_reduce_only() {
        let order = Order::stop_loss_sell(OrderId::new("1"), dec!(100), dec!(1));
        assert!(order.reduce_only);
        assert_eq!(order.side(), Side::Sell);
    }

    #[test]
    fn limit_buy_is_not_reduce_only() {
        let order = Order::limit_buy(OrderId::new("2"), dec!(95), dec!(1));
        assert!(!order.reduce_only);
        assert_eq!(order.side(), Side::Buy);
    }

    #[test]
    fn execution_mode_display_round_trips_through_parse() {
        assert_eq!(ExecutionMode::from_str_loose("live"), Some(ExecutionMode::Live));
        assert_eq!(
            ExecutionMode::from_str_loose("simulated"),
            Some(ExecutionMode::Simulated)
        );
        assert_eq!(ExecutionMode::Live.to_string(), "live");
    }
}
