//! `stockgrid-events` — change events and their listener registry.
//!
//! A reconciliation cycle over one container produces a batch of signed
//! quantity deltas; the [`ChangeNotifier`] fans that batch out to registered
//! listeners, validating each registration's token at delivery time and
//! pruning the ones that no longer hold up.

pub mod change;
pub mod notifier;

pub use change::{ActionSource, ChangeBatch, StackDelta};
pub use notifier::{ChangeListener, ChangeNotifier, VerificationToken};
