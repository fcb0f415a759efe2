//! Precomputed alias-group table.
//!
//! An alias group is a set of concrete identities treated as interchangeable
//! for fuzzy lookup purposes (one logical resource backed by several item
//! types). The table is explicit data registered up front — fuzzy lookups
//! are a pure data-driven union over known aliases, never runtime type
//! inspection.

use std::collections::HashMap;

use crate::id::ItemTypeId;
use crate::identity::StackIdentity;

/// One concrete identity participating in an alias group.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AliasMember {
    pub identity: StackIdentity,
    /// The member stands for every variant of its item type, not one
    /// specific variant; it is range-queried as if the requested policy
    /// ignored variants.
    pub variant_wildcard: bool,
}

impl AliasMember {
    pub const fn new(identity: StackIdentity) -> Self {
        Self {
            identity,
            variant_wildcard: false,
        }
    }

    pub const fn wildcard(identity: StackIdentity) -> Self {
        Self {
            identity,
            variant_wildcard: true,
        }
    }
}

/// Alias-group registry keyed by item type.
#[derive(Debug, Default)]
pub struct AliasTable {
    groups: Vec<Vec<AliasMember>>,
    by_type: HashMap<ItemTypeId, usize>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one group of interchangeable members.
    ///
    /// Every member's item type is mapped to the group; if a type already
    /// belonged to an earlier group, the later registration wins for that
    /// type.
    pub fn register_group(&mut self, members: Vec<AliasMember>) {
        if members.is_empty() {
            return;
        }
        let index = self.groups.len();
        for member in &members {
            self.by_type.insert(member.identity.item_type(), index);
        }
        self.groups.push(members);
    }

    /// Members of the group the given item type belongs to, if any.
    pub fn members_for(&self, item_type: ItemTypeId) -> Option<&[AliasMember]> {
        self.by_type
            .get(&item_type)
            .map(|&index| self.groups[index].as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
