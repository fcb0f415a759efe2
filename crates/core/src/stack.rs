//! The quantity-tracked stack value type and its merge rules.

use serde::{Deserialize, Serialize};

use crate::identity::StackIdentity;

/// Transport class of an aggregator, consumed by upstream routing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageChannel {
    Item,
    Fluid,
}

/// A stack of one identity with its accounting overlays.
///
/// The same type serves as what moves through containers and as the
/// aggregation index's per-identity record. `quantity`, `craftable`, and
/// `requestable` are independent overlays: a stack may have quantity 0 and
/// still be craftable or requestable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub identity: StackIdentity,
    /// Physically stored amount (>= 0).
    pub quantity: i64,
    /// Whether the identity can be produced on demand.
    pub craftable: bool,
    /// Amount obtainable on request from elsewhere (>= 0).
    pub requestable: i64,
}

impl Stack {
    pub const fn new(identity: StackIdentity, quantity: i64) -> Self {
        Self {
            identity,
            quantity,
            craftable: false,
            requestable: 0,
        }
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = quantity;
        self
    }

    /// The stack's own merge rule: quantities and requestable amounts add,
    /// craftable flags combine.
    pub fn merge(&mut self, other: &Self) {
        self.quantity = self.quantity.saturating_add(other.quantity);
        self.requestable = self.requestable.saturating_add(other.requestable);
        self.craftable |= other.craftable;
    }

    /// A stack carries signal if any overlay is non-zero.
    pub const fn is_meaningful(&self) -> bool {
        self.quantity > 0 || self.craftable || self.requestable > 0
    }

    /// Clear transient accounting state for a fresh pass. The identity
    /// survives; only the overlays are zeroed.
    pub fn reset_status(&mut self) {
        self.quantity = 0;
        self.requestable = 0;
        self.craftable = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ItemTypeId, TagFingerprint, VariantId};

    fn stack(quantity: i64) -> Stack {
        let identity = StackIdentity::new(
            ItemTypeId::new(1),
            VariantId::new(0),
            TagFingerprint::new(0),
        );
        Stack::new(identity, quantity)
    }

    #[test]
    fn merge_adds_quantities_and_combines_flags() {
        let mut a = stack(3);
        let mut b = stack(4);
        b.craftable = true;
        b.requestable = 7;

        a.merge(&b);
        assert_eq!(a.quantity, 7);
        assert_eq!(a.requestable, 7);
        assert!(a.craftable);
    }

    #[test]
    fn meaningful_requires_at_least_one_non_zero_overlay() {
        assert!(!stack(0).is_meaningful());
        assert!(stack(1).is_meaningful());

        let mut craft_only = stack(0);
        craft_only.craftable = true;
        assert!(craft_only.is_meaningful());

        let mut request_only = stack(0);
        request_only.requestable = 5;
        assert!(request_only.is_meaningful());
    }

    #[test]
    fn reset_status_zeroes_all_overlays() {
        let mut s = stack(10);
        s.craftable = true;
        s.requestable = 2;
        s.reset_status();
        assert!(!s.is_meaningful());
    }
}
