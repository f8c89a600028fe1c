//! The grid's domain model: unit tracker, position map, sliding window,
//! phase classifier, and per-cycle state. Everything here is pure data
//! and pure transformations — no I/O, the engine layer is the boundary.

pub mod cycle;
pub mod errors;
pub mod phase;
pub mod position_map;
pub mod quantiser;
pub mod window;

pub use cycle::{CycleState, GridConfig};
pub use errors::DomainError;
pub use phase::{Phase, PhaseClassifier, PhaseHistory};
pub use position_map::{OrderType, PositionMap, PositionMapEntry, SlotStatus};
pub use quantiser::{PriceQuantiser, UnitEvent};
pub use window::{SlideAction, SlidingWindow};
