//! Capabilities the core consumes from an external slot container.

use stockgrid_core::{Stack, StackIdentity};

/// One externally-owned, slot-addressed container.
///
/// The contract is intentionally minimal: count slots, read a slot, attempt
/// a per-slot insert or extract with simulate/commit semantics. Partial
/// acceptance is normal; implementations report what they actually did
/// through return values, never through faults.
///
/// Extraction results are untrusted: a broken implementation may return more
/// than was requested, and the adapter clamps defensively rather than
/// failing.
pub trait SlotContainer {
    /// Current number of slots. May change between reconciliation cycles.
    fn slot_count(&self) -> usize;

    /// The stack currently occupying the slot, or `None` for an empty slot
    /// (and for any out-of-range index).
    fn stack_in_slot(&self, slot: usize) -> Option<Stack>;

    /// Attempt to insert into one slot, returning the uninserted remainder;
    /// `None` means the stack was fully consumed. With `simulate` set,
    /// nothing is committed.
    fn insert(&mut self, slot: usize, stack: Stack, simulate: bool) -> Option<Stack>;

    /// Attempt to remove up to `amount` units matching `identity` from one
    /// slot, returning what was actually removed. A single call is not
    /// guaranteed to satisfy the full amount even when the slot holds
    /// enough.
    fn extract(
        &mut self,
        slot: usize,
        identity: &StackIdentity,
        amount: i64,
        simulate: bool,
    ) -> Option<Stack>;
}
