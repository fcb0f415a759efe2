//! `stockgrid-index` — the sorted, quantity-tracked aggregation index.
//!
//! One [`StackMultiset`] holds the canonical per-identity accounting records
//! for a network: physically stored quantity plus craftable/requestable
//! overlays. Every operation runs under one exclusive lock per instance, so
//! mutators are atomic and range queries observe a consistent snapshot of
//! the whole ordering.

pub mod multiset;

pub use multiset::{Meaningful, StackMultiset};
