//! quadgrid-core — the core trading engine for a long-biased, unit-
//! quantised grid strategy trading perpetual futures.
//!
//! The engine maintains a sliding window of exactly four resting orders
//! trailing market price: trailing stop-sells below market as price
//! advances, converting to trailing limit-buys above market as price
//! declines. Fills recycle into the opposite order type. This crate
//! owns the hard part — the unit tracker and phase classifier, the
//! sliding-window order manager, the fill reconciliation pipeline, and
//! the order auditor — and stays deliberately agnostic to any one
//! exchange: venue adapters implement the [`execution::Venue`] trait.

pub mod config;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod persistence;
pub mod resilience;
pub mod utils;

pub use anyhow::{Error, Result};

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::{
        CycleState, DomainError, GridConfig, OrderType, Phase, PhaseClassifier, PositionMap,
        PriceQuantiser, SlideAction, SlidingWindow, SlotStatus,
    };
    pub use crate::engine::{Engine, EngineEvent, EngineStats, EngineStatus, OrderManager};
    pub use crate::execution::{ExecutionMode, Fill, Order, OrderId, Venue, VenueError};
}
