//! Signed quantity deltas and their provenance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockgrid_core::{ActorId, DeviceId, StackIdentity};

/// One signed quantity change for one identity. Ephemeral: produced by a
/// diff pass, consumed by listeners, never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDelta {
    pub identity: StackIdentity,
    pub delta: i64,
}

impl StackDelta {
    pub const fn new(identity: StackIdentity, delta: i64) -> Self {
        Self { identity, delta }
    }
}

/// Opaque provenance tag attached to a delta batch for downstream
/// attribution.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Player(ActorId),
    Machine(DeviceId),
    Unattributed,
}

/// One reconciliation cycle's worth of deltas, in slot iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub deltas: Vec<StackDelta>,
    /// Business time of the diff pass that produced the batch.
    pub occurred_at: DateTime<Utc>,
}

impl ChangeBatch {
    pub fn new(deltas: Vec<StackDelta>) -> Self {
        Self {
            deltas,
            occurred_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}
