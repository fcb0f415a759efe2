//! Canonical stack identity: equality, total order, and fuzzy range bounds.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::id::{ItemTypeId, TagFingerprint, VariantId};

/// Tolerance rule controlling how much variant information a fuzzy range
/// query ignores.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyPolicy {
    /// Ignore the variant dimension entirely: every variant of the item type
    /// matches.
    IgnoreVariant,
    /// The variant must match exactly; auxiliary tags are still ignored
    /// (fuzzy queries never discriminate on tag fingerprints).
    ExactVariant,
    /// Bucket by remaining-durability percentage: identities on the same
    /// side of the given threshold (e.g. 25/50/75/99) match each other.
    Percent(u8),
}

/// Immutable canonical descriptor of a stack's kind.
///
/// Serves as both the precise equality key and the total-order key of the
/// aggregation index. Ordering tie-breaks deterministically: item type, then
/// variant, then tag fingerprint.
///
/// `variant_ceiling` is the item type's maximum damage value. It is carried
/// as metadata for percentage-band bucketing only and never participates in
/// equality, ordering, or hashing.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct StackIdentity {
    item_type: ItemTypeId,
    variant: VariantId,
    tag_fp: TagFingerprint,
    variant_ceiling: u16,
}

impl StackIdentity {
    pub const fn new(item_type: ItemTypeId, variant: VariantId, tag_fp: TagFingerprint) -> Self {
        Self {
            item_type,
            variant,
            tag_fp,
            variant_ceiling: 0,
        }
    }

    /// Identity for a damageable item type: `variant_ceiling` is the maximum
    /// damage value, used to derive percentage-band bounds.
    pub const fn with_ceiling(
        item_type: ItemTypeId,
        variant: VariantId,
        tag_fp: TagFingerprint,
        variant_ceiling: u16,
    ) -> Self {
        Self {
            item_type,
            variant,
            tag_fp,
            variant_ceiling,
        }
    }

    pub const fn item_type(&self) -> ItemTypeId {
        self.item_type
    }

    pub const fn variant(&self) -> VariantId {
        self.variant
    }

    pub const fn tag_fp(&self) -> TagFingerprint {
        self.tag_fp
    }

    pub const fn variant_ceiling(&self) -> u16 {
        self.variant_ceiling
    }

    /// Half-open `[low, high)` bounds over the identity order containing
    /// every identity the given policy treats as equivalent to `self`.
    ///
    /// The bounds are derived canonical identities, not real records; upper
    /// bounds at the top of a component's range roll over to the next
    /// component (and to `Unbounded` past the last item type).
    pub fn fuzzy_bounds(&self, policy: FuzzyPolicy) -> (Bound<Self>, Bound<Self>) {
        match policy {
            FuzzyPolicy::IgnoreVariant => self.variant_span(VariantId::MIN, None),
            FuzzyPolicy::ExactVariant => self.variant_span(self.variant, self.variant.succ()),
            FuzzyPolicy::Percent(threshold) => {
                let ceiling = self.variant_ceiling;
                if ceiling == 0 {
                    // Undamageable item: a single band covering the type.
                    return self.variant_span(VariantId::MIN, None);
                }
                // Damage value below which a stack still has more than
                // `threshold` percent durability remaining.
                let kept = 100 - u32::from(threshold.min(100));
                let split = (u32::from(ceiling) * kept / 100) as u16;
                if self.variant.raw() < split {
                    self.variant_span(VariantId::MIN, Some(VariantId::new(split)))
                } else {
                    self.variant_span(VariantId::new(split), None)
                }
            }
        }
    }

    /// Bounds spanning `[from, to)` variants of this item type, the full tag
    /// dimension included. `to == None` spans to the end of the type.
    fn variant_span(&self, from: VariantId, to: Option<VariantId>) -> (Bound<Self>, Bound<Self>) {
        let low = Bound::Included(Self::floor(self.item_type, from));
        let high = match to {
            Some(v) => Bound::Excluded(Self::floor(self.item_type, v)),
            None => match self.item_type.succ() {
                Some(next) => Bound::Excluded(Self::floor(next, VariantId::MIN)),
                None => Bound::Unbounded,
            },
        };
        (low, high)
    }

    /// Smallest identity with the given type and variant.
    const fn floor(item_type: ItemTypeId, variant: VariantId) -> Self {
        Self::new(item_type, variant, TagFingerprint::MIN)
    }

    const fn key(&self) -> (u32, u16, u64) {
        (self.item_type.raw(), self.variant.raw(), self.tag_fp.raw())
    }
}

impl PartialEq for StackIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for StackIdentity {}

impl Hash for StackIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for StackIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for StackIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn identity(item_type: u32, variant: u16, tag: u64) -> StackIdentity {
        StackIdentity::new(
            ItemTypeId::new(item_type),
            VariantId::new(variant),
            TagFingerprint::new(tag),
        )
    }

    fn in_bounds(bounds: &(Bound<StackIdentity>, Bound<StackIdentity>), id: StackIdentity) -> bool {
        use core::ops::RangeBounds;
        bounds.contains(&id)
    }

    #[test]
    fn order_tie_breaks_type_then_variant_then_tag() {
        assert!(identity(1, 9, 9) < identity(2, 0, 0));
        assert!(identity(1, 1, 9) < identity(1, 2, 0));
        assert!(identity(1, 1, 1) < identity(1, 1, 2));
    }

    #[test]
    fn ceiling_is_excluded_from_equality_and_order() {
        let a = StackIdentity::with_ceiling(
            ItemTypeId::new(7),
            VariantId::new(3),
            TagFingerprint::new(0),
            100,
        );
        let b = identity(7, 3, 0);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn ignore_variant_spans_the_whole_type() {
        let bounds = identity(5, 200, 42).fuzzy_bounds(FuzzyPolicy::IgnoreVariant);
        assert!(in_bounds(&bounds, identity(5, 0, 0)));
        assert!(in_bounds(&bounds, identity(5, u16::MAX, u64::MAX)));
        assert!(!in_bounds(&bounds, identity(4, u16::MAX, u64::MAX)));
        assert!(!in_bounds(&bounds, identity(6, 0, 0)));
    }

    #[test]
    fn exact_variant_spans_the_tag_dimension_only() {
        let bounds = identity(5, 7, 42).fuzzy_bounds(FuzzyPolicy::ExactVariant);
        assert!(in_bounds(&bounds, identity(5, 7, 0)));
        assert!(in_bounds(&bounds, identity(5, 7, u64::MAX)));
        assert!(!in_bounds(&bounds, identity(5, 6, u64::MAX)));
        assert!(!in_bounds(&bounds, identity(5, 8, 0)));
    }

    #[test]
    fn exact_variant_at_top_of_range_rolls_over_cleanly() {
        let bounds = identity(5, u16::MAX, 0).fuzzy_bounds(FuzzyPolicy::ExactVariant);
        assert!(in_bounds(&bounds, identity(5, u16::MAX, 123)));
        assert!(!in_bounds(&bounds, identity(6, 0, 0)));
    }

    #[test]
    fn percent_band_splits_at_durability_threshold() {
        // Ceiling 100, threshold 75% => split at damage 25.
        let fresh = StackIdentity::with_ceiling(
            ItemTypeId::new(9),
            VariantId::new(10),
            TagFingerprint::new(0),
            100,
        );
        let bounds = fresh.fuzzy_bounds(FuzzyPolicy::Percent(75));
        assert!(in_bounds(&bounds, identity(9, 0, 0)));
        assert!(in_bounds(&bounds, identity(9, 24, u64::MAX)));
        assert!(!in_bounds(&bounds, identity(9, 25, 0)));

        let worn = StackIdentity::with_ceiling(
            ItemTypeId::new(9),
            VariantId::new(60),
            TagFingerprint::new(0),
            100,
        );
        let bounds = worn.fuzzy_bounds(FuzzyPolicy::Percent(75));
        assert!(!in_bounds(&bounds, identity(9, 24, 0)));
        assert!(in_bounds(&bounds, identity(9, 25, 0)));
        assert!(in_bounds(&bounds, identity(9, 100, 0)));
    }

    #[test]
    fn percent_band_on_undamageable_type_degenerates_to_ignore_variant() {
        let id = identity(3, 0, 0);
        let bounds = id.fuzzy_bounds(FuzzyPolicy::Percent(50));
        assert!(in_bounds(&bounds, identity(3, u16::MAX, u64::MAX)));
        assert!(!in_bounds(&bounds, identity(4, 0, 0)));
    }

    #[test]
    fn last_item_type_yields_an_unbounded_upper_bound() {
        let id = identity(u32::MAX, 3, 0);
        let (_, high) = id.fuzzy_bounds(FuzzyPolicy::IgnoreVariant);
        assert_eq!(high, Bound::Unbounded);
    }

    proptest! {
        /// Precise equality and the total order must agree: two identities
        /// compare `Equal` iff they are equal.
        #[test]
        fn order_is_consistent_with_equality(
            a_type in 0u32..100, a_var in 0u16..100, a_tag in 0u64..100,
            b_type in 0u32..100, b_var in 0u16..100, b_tag in 0u64..100,
        ) {
            let a = identity(a_type, a_var, a_tag);
            let b = identity(b_type, b_var, b_tag);
            prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
        }

        /// The policy-derived range always contains the filter identity
        /// itself.
        #[test]
        fn bounds_contain_the_filter(
            item_type in 0u32..100,
            variant in 0u16..200,
            tag in any::<u64>(),
            ceiling in 0u16..200,
            threshold in 0u8..100,
        ) {
            let id = StackIdentity::with_ceiling(
                ItemTypeId::new(item_type),
                VariantId::new(variant),
                TagFingerprint::new(tag),
                ceiling,
            );
            for policy in [
                FuzzyPolicy::IgnoreVariant,
                FuzzyPolicy::ExactVariant,
                FuzzyPolicy::Percent(threshold),
            ] {
                prop_assert!(in_bounds(&id.fuzzy_bounds(policy), id));
            }
        }
    }
}
