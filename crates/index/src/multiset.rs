//! Sorted stack multiset with fuzzy range queries and alias expansion.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::{Arc, Mutex};

use stockgrid_core::{AliasTable, FuzzyPolicy, Stack, StackIdentity};

/// The aggregated quantity index: at most one record per identity, sorted by
/// the canonical identity order.
///
/// Records are never implicitly evicted — a record whose overlays have all
/// dropped to zero persists so later contributions merge back into it. Use
/// [`StackMultiset::compact`] to bound retention explicitly.
///
/// All operations acquire the instance lock for their duration; none perform
/// IO, so lock hold time is bounded by in-memory map operations. Lookups
/// return owned snapshots of the records, not references into the locked
/// map; mutation goes through the `add*` family.
pub struct StackMultiset {
    records: Mutex<BTreeMap<StackIdentity, Stack>>,
    aliases: Arc<AliasTable>,
}

impl StackMultiset {
    pub fn new() -> Self {
        Self::with_aliases(Arc::new(AliasTable::new()))
    }

    /// A multiset whose fuzzy queries expand across the given alias table.
    pub fn with_aliases(aliases: Arc<AliasTable>) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            aliases,
        }
    }

    /// Merge a contribution by the stack's own merge rule (quantities and
    /// requestable amounts add, craftable flags combine), or insert a copy
    /// as a new record.
    pub fn add(&self, stack: &Stack) {
        if let Ok(mut records) = self.records.lock() {
            match records.entry(stack.identity) {
                Entry::Occupied(mut entry) => entry.get_mut().merge(stack),
                Entry::Vacant(entry) => {
                    entry.insert(*stack);
                }
            }
        }
    }

    /// Merge a contribution as physically stored: only the quantity is
    /// incremented on an existing record.
    pub fn add_storage(&self, stack: &Stack) {
        if let Ok(mut records) = self.records.lock() {
            match records.entry(stack.identity) {
                Entry::Occupied(mut entry) => {
                    let record = entry.get_mut();
                    record.quantity = record.quantity.saturating_add(stack.quantity);
                }
                Entry::Vacant(entry) => {
                    entry.insert(*stack);
                }
            }
        }
    }

    /// Mark the identity craftable; a missing record is created with
    /// quantity 0.
    pub fn add_crafting(&self, stack: &Stack) {
        if let Ok(mut records) = self.records.lock() {
            match records.entry(stack.identity) {
                Entry::Occupied(mut entry) => entry.get_mut().craftable = true,
                Entry::Vacant(entry) => {
                    let mut record = *stack;
                    record.quantity = 0;
                    record.craftable = true;
                    entry.insert(record);
                }
            }
        }
    }

    /// Add to the identity's requestable amount; a missing record is created
    /// with quantity 0 and craftable cleared.
    pub fn add_requestable(&self, stack: &Stack) {
        if let Ok(mut records) = self.records.lock() {
            match records.entry(stack.identity) {
                Entry::Occupied(mut entry) => {
                    let record = entry.get_mut();
                    record.requestable = record.requestable.saturating_add(stack.requestable);
                }
                Entry::Vacant(entry) => {
                    let mut record = *stack;
                    record.quantity = 0;
                    record.craftable = false;
                    entry.insert(record);
                }
            }
        }
    }

    /// Exact lookup by precise identity equality.
    pub fn find_precise(&self, identity: &StackIdentity) -> Option<Stack> {
        let records = self.records.lock().ok()?;
        records.get(identity).copied()
    }

    /// All records whose identity falls inside the policy-derived range of
    /// the filter.
    ///
    /// When the filter's item type belongs to an alias group, one range
    /// query runs per member and the results are unioned (any alias
    /// satisfies the logical request), deduplicated by identity. Members
    /// registered as variant wildcards ignore the variant dimension
    /// regardless of the requested policy. Results come back in identity
    /// order.
    pub fn find_fuzzy(&self, filter: &StackIdentity, policy: FuzzyPolicy) -> Vec<Stack> {
        let Ok(records) = self.records.lock() else {
            return Vec::new();
        };

        match self.aliases.members_for(filter.item_type()) {
            Some(members) => {
                let mut union: BTreeMap<StackIdentity, Stack> = BTreeMap::new();
                for member in members {
                    let effective = if member.variant_wildcard {
                        FuzzyPolicy::IgnoreVariant
                    } else {
                        policy
                    };
                    let bounds = member.identity.fuzzy_bounds(effective);
                    for (identity, record) in records.range(bounds) {
                        union.insert(*identity, *record);
                    }
                }
                union.into_values().collect()
            }
            None => records
                .range(filter.fuzzy_bounds(policy))
                .map(|(_, record)| *record)
                .collect(),
        }
    }

    /// Clear every record's transient accounting state for a fresh pass.
    /// Removes nothing.
    pub fn reset_status(&self) {
        if let Ok(mut records) = self.records.lock() {
            for record in records.values_mut() {
                record.reset_status();
            }
        }
    }

    /// First record carrying signal, in identity order.
    pub fn first(&self) -> Option<Stack> {
        self.meaningful().next()
    }

    /// Finite, restartable-per-call sequence over the records that carry
    /// signal. Zero-signal records are skipped, never removed; any record
    /// with at least one non-zero overlay is yielded.
    pub fn meaningful(&self) -> Meaningful {
        let snapshot: Vec<Stack> = match self.records.lock() {
            Ok(records) => records.values().copied().collect(),
            Err(_) => Vec::new(),
        };
        Meaningful {
            inner: snapshot.into_iter(),
        }
    }

    /// Raw record count, zero-signal records included.
    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop records with no signal left. Opt-in retention bound; nothing in
    /// the core calls this.
    pub fn compact(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.retain(|_, record| record.is_meaningful());
        }
    }
}

impl Default for StackMultiset {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for StackMultiset {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StackMultiset")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Lazy filtering sequence over a multiset snapshot; see
/// [`StackMultiset::meaningful`].
#[derive(Debug)]
pub struct Meaningful {
    inner: std::vec::IntoIter<Stack>,
}

impl Iterator for Meaningful {
    type Item = Stack;

    fn next(&mut self) -> Option<Stack> {
        self.inner.by_ref().find(Stack::is_meaningful)
    }
}
