//! The external inventory adapter: insertion, extraction, and the per-cycle
//! snapshot diff.

use std::sync::Arc;

use tracing::warn;

use stockgrid_core::{Stack, StackIdentity, StorageChannel};
use stockgrid_events::{ActionSource, ChangeBatch, ChangeListener, ChangeNotifier, StackDelta, VerificationToken};
use stockgrid_index::StackMultiset;

use crate::container::SlotContainer;

/// Commit semantics for inject/extract.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Compute the outcome without committing anything.
    Simulate,
    /// Commit the mutation.
    Modulate,
}

/// Scheduling urgency hint returned by a reconciliation pass. The external
/// scheduler decides when the next cycle runs; the adapter only advises.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickRateHint {
    /// Changes were observed; re-invoke soon.
    Urgent,
    /// Nothing changed; safe to throttle the cycle rate.
    Slower,
}

/// Cached aggregated view of one slot: identity plus quantity as of the last
/// diff pass.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct SlotAggregate {
    identity: StackIdentity,
    quantity: i64,
}

impl SlotAggregate {
    fn of(stack: &Stack) -> Self {
        Self {
            identity: stack.identity,
            quantity: stack.quantity,
        }
    }
}

/// Bridges one slot container into the aggregation world.
///
/// Not internally synchronized: `inject`, `extract`, and `reconcile` for a
/// given instance belong to one logical cycle (they take `&mut self`).
/// Distinct adapter instances run fully independently. Divergence between
/// the snapshot cache and live container state is tolerated between cycles
/// and corrected at the next `reconcile` call; the adapter never locks the
/// container itself.
pub struct ContainerAdapter<C: SlotContainer> {
    container: C,
    /// Raw stack per slot as of the last diff pass.
    cached_raw: Vec<Option<Stack>>,
    /// Aggregated identity+quantity per slot, resized together with
    /// `cached_raw`.
    cached_agg: Vec<Option<SlotAggregate>>,
    notifier: ChangeNotifier,
    source: ActionSource,
    anomalies: u64,
}

impl<C: SlotContainer> ContainerAdapter<C> {
    pub fn new(container: C) -> Self {
        Self {
            container,
            cached_raw: Vec::new(),
            cached_agg: Vec::new(),
            notifier: ChangeNotifier::new(),
            source: ActionSource::Unattributed,
            anomalies: 0,
        }
    }

    /// Channel tag identifying this adapter as an item-class aggregator.
    pub const fn channel(&self) -> StorageChannel {
        StorageChannel::Item
    }

    /// Provenance tag attached to the delta batches this adapter publishes.
    pub fn set_action_source(&mut self, source: ActionSource) {
        self.source = source;
    }

    pub fn add_listener(&self, listener: Arc<dyn ChangeListener>, token: VerificationToken) {
        self.notifier.add_listener(listener, token);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ChangeListener>) {
        self.notifier.remove_listener(listener);
    }

    /// Contract violations observed so far (containers over-returning on
    /// extraction).
    pub const fn anomaly_count(&self) -> u64 {
        self.anomalies
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    /// Mutable access to the underlying container, for collaborators that
    /// own this adapter (e.g. test harnesses simulating external mutation).
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// Insert a stack, returning the uninserted remainder (`None` = fully
    /// consumed).
    ///
    /// Modulate inserts in two phases to avoid fragmenting existing partial
    /// stacks: phase 1 tops up currently occupied slots, phase 2 fills the
    /// slots phase 1 remembered as empty. If the container accepted nothing
    /// the caller gets the input back untouched — the canonical "target
    /// full" signal. Any non-zero modulate acceptance triggers an immediate
    /// diff pass so listeners observe the change without waiting for the
    /// next scheduled cycle.
    pub fn inject(&mut self, stack: Stack, mode: Mode) -> Option<Stack> {
        if stack.quantity <= 0 {
            return None;
        }

        let remaining = match mode {
            // A simulation would eventually reach any empty slot anyway, so
            // one pass suffices.
            Mode::Simulate => self.simulate_inject(stack),
            Mode::Modulate => self.perform_inject(stack),
        };

        if remaining.map(|r| r.quantity) == Some(stack.quantity) {
            // Nothing was accepted; hand the input back untouched.
            return Some(stack);
        }

        if mode == Mode::Modulate {
            self.reconcile();
        }

        remaining
    }

    fn perform_inject(&mut self, stack: Stack) -> Option<Stack> {
        let slot_count = self.container.slot_count();

        // Slots skipped in phase 1, remembered so phase 2 does not have to
        // re-query their content.
        let mut retry = vec![false; slot_count];
        let mut remaining = stack;

        for slot in 0..slot_count {
            if self.container.stack_in_slot(slot).is_none() {
                // Phase 1 only tops up existing stacks.
                retry[slot] = true;
                continue;
            }

            match self.container.insert(slot, remaining, false) {
                None => return None,
                Some(rest) => remaining = rest,
            }
        }

        for slot in 0..slot_count {
            if !retry[slot] {
                continue;
            }

            match self.container.insert(slot, remaining, false) {
                None => return None,
                Some(rest) => remaining = rest,
            }
        }

        Some(remaining)
    }

    fn simulate_inject(&mut self, stack: Stack) -> Option<Stack> {
        let mut remaining = stack;
        for slot in 0..self.container.slot_count() {
            match self.container.insert(slot, remaining, true) {
                None => return None,
                Some(rest) => remaining = rest,
            }
        }
        Some(remaining)
    }

    /// Extract up to `amount` units precisely matching `identity`,
    /// accumulating across slots into one result stack.
    ///
    /// Returns `None` if nothing was extracted; a smaller-than-requested
    /// result is partial satisfaction, not an error. A slot is drained with
    /// repeated calls because a single call is not guaranteed to satisfy the
    /// remainder even when reported capacity suffices. A call yielding more
    /// than the remainder is clamped and counted as a container contract
    /// violation. Any non-zero modulate extraction triggers an immediate
    /// diff pass.
    pub fn extract(&mut self, identity: &StackIdentity, amount: i64, mode: Mode) -> Option<Stack> {
        if amount <= 0 {
            return None;
        }

        let simulate = mode == Mode::Simulate;
        let mut remaining = amount;
        let mut gathered: Option<Stack> = None;

        for slot in 0..self.container.slot_count() {
            match self.container.stack_in_slot(slot) {
                Some(occupant) if occupant.identity == *identity => {}
                _ => continue,
            }

            loop {
                let Some(mut extracted) =
                    self.container.extract(slot, identity, remaining, simulate)
                else {
                    break;
                };
                if extracted.quantity <= 0 {
                    break;
                }

                if extracted.quantity > remaining {
                    self.anomalies += 1;
                    warn!(
                        slot,
                        requested = remaining,
                        returned = extracted.quantity,
                        "container over-returned on extraction; clamping to the remainder"
                    );
                    extracted.quantity = remaining;
                }

                remaining -= extracted.quantity;
                gathered = Some(match gathered {
                    Some(mut total) => {
                        total.quantity += extracted.quantity;
                        total
                    }
                    // The first yield doubles as the template for the rest.
                    None => extracted,
                });

                if remaining <= 0 {
                    break;
                }
            }

            if remaining <= 0 {
                break;
            }
        }

        let gathered = gathered?;
        if mode == Mode::Modulate {
            self.reconcile();
        }
        Some(gathered)
    }

    /// One diff pass: re-read the container, compare against the snapshot
    /// cache, publish the resulting delta batch, and advise the scheduler.
    ///
    /// Identity changes in a slot (including empty transitions) emit a
    /// removal of the old aggregate and an addition of the new one; a
    /// quantity move on an unchanged identity emits a single signed delta.
    /// Slots truncated by a container shrink emit the negative of their last
    /// known aggregate before the cache entries are dropped.
    pub fn reconcile(&mut self) -> TickRateHint {
        let mut deltas = Vec::new();
        let slots = self.container.slot_count();

        if slots > self.cached_raw.len() {
            self.cached_raw.resize(slots, None);
            self.cached_agg.resize(slots, None);
        }

        for slot in 0..slots {
            let live = self.container.stack_in_slot(slot);

            match (self.cached_raw[slot], live) {
                (None, None) => {}
                (Some(old), Some(new)) if old.identity == new.identity => {
                    // Same occupant; only the amount may have moved.
                    let old_quantity = self.cached_agg[slot].map_or(0, |agg| agg.quantity);
                    let diff = new.quantity - old_quantity;
                    if diff != 0 {
                        self.cached_raw[slot] = live;
                        self.cached_agg[slot] = Some(SlotAggregate::of(&new));
                        deltas.push(StackDelta::new(new.identity, diff));
                    }
                }
                _ => {
                    // Different occupant (or an empty transition).
                    if let Some(old_agg) = self.cached_agg[slot] {
                        deltas.push(StackDelta::new(old_agg.identity, -old_agg.quantity));
                    }
                    self.cached_raw[slot] = live;
                    self.cached_agg[slot] = live.as_ref().map(SlotAggregate::of);
                    if let Some(new_agg) = self.cached_agg[slot] {
                        deltas.push(StackDelta::new(new_agg.identity, new_agg.quantity));
                    }
                }
            }
        }

        if slots < self.cached_raw.len() {
            for slot in slots..self.cached_agg.len() {
                if let Some(agg) = self.cached_agg[slot] {
                    deltas.push(StackDelta::new(agg.identity, -agg.quantity));
                }
            }
            self.cached_raw.truncate(slots);
            self.cached_agg.truncate(slots);
        }

        if deltas.is_empty() {
            TickRateHint::Slower
        } else {
            self.notifier.deliver(&ChangeBatch::new(deltas), &self.source);
            TickRateHint::Urgent
        }
    }

    /// Fold every slot's current content into the supplied multiset as
    /// stored quantity.
    pub fn enumerate_available(&self, out: &StackMultiset) {
        for slot in 0..self.container.slot_count() {
            if let Some(stack) = self.container.stack_in_slot(slot) {
                out.add_storage(&stack);
            }
        }
    }
}
