//! `stockgrid-core` — stack identity, ordering, and alias primitives.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the canonical identity scheme used to compare and order stacks, fuzzy
//! tolerance policies with their range bounds, the precomputed alias-group
//! table, and the quantity-tracked stack value type.

pub mod alias;
pub mod error;
pub mod id;
pub mod identity;
pub mod stack;

pub use alias::{AliasMember, AliasTable};
pub use error::{DomainError, DomainResult};
pub use id::{ActorId, DeviceId, ItemTypeId, TagFingerprint, VariantId};
pub use identity::{FuzzyPolicy, StackIdentity};
pub use stack::{Stack, StorageChannel};
