//! Keyed in-flight saga state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use common::BookingId;
use domain::PendingValidation;
use tokio::sync::{Mutex as EntryLock, OwnedMutexGuard};

pub(crate) struct Entry {
    pending: PendingValidation,
    resolved: bool,
    first_seen: Instant,
}

impl Entry {
    fn new() -> Self {
        Self {
            pending: PendingValidation::new(),
            resolved: false,
            first_seen: Instant::now(),
        }
    }
}

type Slot = Arc<EntryLock<Entry>>;

/// One [`PendingValidation`] per booking, each behind its own async lock.
///
/// Handlers for different bookings never wait on each other. Handlers for the
/// same booking are serialized for the whole merge-decide-act sequence. Once
/// an entry is discarded, anyone still queued on it starts over with a fresh
/// entry.
#[derive(Default)]
pub struct PendingRegistry {
    slots: Mutex<HashMap<BookingId, Slot>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<BookingId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the entry for `id`, creating it if absent.
    pub async fn lock(&self, id: &BookingId) -> LockedEntry<'_> {
        loop {
            let slot = Arc::clone(self.slots().entry(id.clone()).or_insert_with(|| {
                Arc::new(EntryLock::new(Entry::new()))
            }));

            if let Some(locked) = self.acquire(id, slot).await {
                return locked;
            }
        }
    }

    /// Locks the entry for `id` only if one exists.
    pub async fn lock_existing(&self, id: &BookingId) -> Option<LockedEntry<'_>> {
        let slot = self.slots().get(id).cloned()?;
        self.acquire(id, slot).await
    }

    async fn acquire(&self, id: &BookingId, slot: Slot) -> Option<LockedEntry<'_>> {
        let guard = Arc::clone(&slot).lock_owned().await;
        if guard.resolved {
            return None;
        }
        Some(LockedEntry {
            registry: self,
            id: id.clone(),
            slot,
            guard,
        })
    }

    /// Number of unresolved entries.
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the IDs currently tracked.
    pub fn ids(&self) -> Vec<BookingId> {
        self.slots().keys().cloned().collect()
    }

    fn remove(&self, id: &BookingId, slot: &Slot) {
        let mut slots = self.slots();
        if slots.get(id).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(id);
        }
    }
}

/// Exclusive access to one booking's pending state.
pub struct LockedEntry<'a> {
    registry: &'a PendingRegistry,
    id: BookingId,
    slot: Slot,
    guard: OwnedMutexGuard<Entry>,
}

impl LockedEntry<'_> {
    pub fn id(&self) -> &BookingId {
        &self.id
    }

    pub fn pending(&self) -> &PendingValidation {
        &self.guard.pending
    }

    pub fn pending_mut(&mut self) -> &mut PendingValidation {
        &mut self.guard.pending
    }

    /// Time since the first report for this booking arrived.
    pub fn age(&self) -> Duration {
        self.guard.first_seen.elapsed()
    }

    /// Removes the entry. Waiters queued behind this lock start over.
    pub fn discard(mut self) {
        self.guard.resolved = true;
        self.registry.remove(&self.id, &self.slot);
    }
}
