//! `stockgrid-adapter` — bridges one externally-owned slot container into
//! the aggregation world.
//!
//! The adapter owns a per-slot snapshot cache and runs the three algorithms
//! the network-storage abstraction stands on: two-phase bin-packing
//! insertion, a defensive multi-call extraction loop, and the per-cycle diff
//! pass that turns cache/live divergence into minimal signed delta batches.

pub mod adapter;
pub mod container;

pub use adapter::{ContainerAdapter, Mode, TickRateHint};
pub use container::SlotContainer;
