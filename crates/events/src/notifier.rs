//! Listener registry with validate-at-delivery semantics.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::change::{ActionSource, ChangeBatch};

/// Opaque token a listener registration carries; the listener itself decides
/// at delivery time whether it is still valid for the token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationToken(Uuid);

impl VerificationToken {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VerificationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver of delta batches.
pub trait ChangeListener: Send + Sync {
    /// Is this registration still valid for the token it was registered
    /// with? Returning `false` prunes the registration.
    fn is_valid(&self, token: &VerificationToken) -> bool;

    /// Receive one cycle's full batch plus its provenance tag.
    fn post_change(&self, batch: &ChangeBatch, source: &ActionSource);
}

/// Registration map keyed by receiver identity.
///
/// Delivery order across listeners is unspecified; within a batch, event
/// order is whatever the producer put there (slot iteration order for diff
/// passes).
pub struct ChangeNotifier {
    listeners: Mutex<Vec<(Arc<dyn ChangeListener>, VerificationToken)>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a receiver with its verification token. Re-registering the
    /// same receiver replaces the stored token.
    pub fn add_listener(&self, listener: Arc<dyn ChangeListener>, token: VerificationToken) {
        if let Ok(mut listeners) = self.listeners.lock() {
            match listeners
                .iter_mut()
                .find(|(existing, _)| same_receiver(existing, &listener))
            {
                Some(entry) => entry.1 = token,
                None => listeners.push((listener, token)),
            }
        }
    }

    /// Remove a receiver by identity. Unknown receivers are a no-op.
    pub fn remove_listener(&self, listener: &Arc<dyn ChangeListener>) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(|(existing, _)| !same_receiver(existing, listener));
        }
    }

    /// Fan a batch out to every valid registration, pruning invalid ones
    /// while delivering.
    pub fn deliver(&self, batch: &ChangeBatch, source: &ActionSource) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(|(listener, token)| {
                if listener.is_valid(token) {
                    listener.post_change(batch, source);
                    true
                } else {
                    false
                }
            });
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

/// Receiver identity: the allocation behind the `Arc`, ignoring vtable
/// metadata.
fn same_receiver(a: &Arc<dyn ChangeListener>, b: &Arc<dyn ChangeListener>) -> bool {
    core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::StackDelta;
    use std::sync::atomic::{AtomicBool, Ordering};
    use stockgrid_core::{ItemTypeId, StackIdentity, TagFingerprint, VariantId};

    struct Recorder {
        expected: VerificationToken,
        alive: AtomicBool,
        received: Mutex<Vec<(ChangeBatch, ActionSource)>>,
    }

    impl Recorder {
        fn new(expected: VerificationToken) -> Self {
            Self {
                expected,
                alive: AtomicBool::new(true),
                received: Mutex::new(Vec::new()),
            }
        }

        fn batches(&self) -> usize {
            self.received.lock().unwrap().len()
        }
    }

    impl ChangeListener for Recorder {
        fn is_valid(&self, token: &VerificationToken) -> bool {
            self.alive.load(Ordering::SeqCst) && *token == self.expected
        }

        fn post_change(&self, batch: &ChangeBatch, source: &ActionSource) {
            self.received.lock().unwrap().push((batch.clone(), *source));
        }
    }

    fn sample_batch() -> ChangeBatch {
        let identity = StackIdentity::new(
            ItemTypeId::new(1),
            VariantId::new(0),
            TagFingerprint::new(0),
        );
        ChangeBatch::new(vec![StackDelta::new(identity, 3)])
    }

    #[test]
    fn valid_listeners_receive_the_full_batch_and_source() {
        let notifier = ChangeNotifier::new();
        let token = VerificationToken::new();
        let recorder = Arc::new(Recorder::new(token));
        notifier.add_listener(recorder.clone(), token);

        let batch = sample_batch();
        notifier.deliver(&batch, &ActionSource::Unattributed);

        let received = recorder.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, batch);
        assert_eq!(received[0].1, ActionSource::Unattributed);
    }

    #[test]
    fn invalid_registrations_are_pruned_at_delivery() {
        let notifier = ChangeNotifier::new();
        let token = VerificationToken::new();
        let recorder = Arc::new(Recorder::new(token));
        notifier.add_listener(recorder.clone(), token);

        recorder.alive.store(false, Ordering::SeqCst);
        notifier.deliver(&sample_batch(), &ActionSource::Unattributed);

        assert_eq!(recorder.batches(), 0);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn stale_token_fails_validation() {
        let notifier = ChangeNotifier::new();
        let recorder = Arc::new(Recorder::new(VerificationToken::new()));
        // Registered under a different token than the listener expects.
        notifier.add_listener(recorder.clone(), VerificationToken::new());

        notifier.deliver(&sample_batch(), &ActionSource::Unattributed);
        assert_eq!(recorder.batches(), 0);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn remove_listener_targets_by_receiver_identity() {
        let notifier = ChangeNotifier::new();
        let token = VerificationToken::new();
        let kept = Arc::new(Recorder::new(token));
        let removed = Arc::new(Recorder::new(token));
        notifier.add_listener(kept.clone(), token);
        notifier.add_listener(removed.clone(), token);

        let handle: Arc<dyn ChangeListener> = removed.clone();
        notifier.remove_listener(&handle);
        assert_eq!(notifier.listener_count(), 1);

        notifier.deliver(&sample_batch(), &ActionSource::Unattributed);
        assert_eq!(kept.batches(), 1);
        assert_eq!(removed.batches(), 0);
    }

    #[test]
    fn re_registering_replaces_the_token() {
        let notifier = ChangeNotifier::new();
        let good = VerificationToken::new();
        let recorder = Arc::new(Recorder::new(good));

        notifier.add_listener(recorder.clone(), VerificationToken::new());
        notifier.add_listener(recorder.clone(), good);
        assert_eq!(notifier.listener_count(), 1);

        notifier.deliver(&sample_batch(), &ActionSource::Unattributed);
        assert_eq!(recorder.batches(), 1);
    }
}
