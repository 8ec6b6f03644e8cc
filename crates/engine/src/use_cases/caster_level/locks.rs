//! Per-character reconciliation locks.
//!
//! A trigger that finds its character busy is dropped, but it flags the entry
//! so the running pass does one fresh pass before releasing. The flag and the
//! release are decided under the same map shard lock, so a trigger either
//! lands before release and is honoured, or after release and starts its own
//! pass.

use std::sync::Arc;

use arcanum_domain::CharacterId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Default)]
struct LockState {
    rerun: bool,
}

#[derive(Clone, Default)]
pub struct ReconciliationLocks {
    held: Arc<DashMap<CharacterId, LockState>>,
}

impl ReconciliationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or request a follow-up pass from the current holder.
    pub fn acquire_or_request(&self, id: CharacterId) -> Option<PassGuard> {
        match self.held.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(LockState::default());
                Some(PassGuard::new(self.held.clone(), id))
            }
            Entry::Occupied(mut entry) => {
                entry.get_mut().rerun = true;
                None
            }
        }
    }

    /// Take the lock only if free, without requesting anything otherwise.
    pub fn try_acquire(&self, id: CharacterId) -> Option<PassGuard> {
        match self.held.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(LockState::default());
                Some(PassGuard::new(self.held.clone(), id))
            }
            Entry::Occupied(_) => None,
        }
    }

    pub fn is_held(&self, id: CharacterId) -> bool {
        self.held.contains_key(&id)
    }
}

/// Exclusive right to reconcile one character.
///
/// Released by [`PassGuard::complete`], or on drop if the pass unwinds.
pub struct PassGuard {
    held: Arc<DashMap<CharacterId, LockState>>,
    id: CharacterId,
    released: bool,
}

impl PassGuard {
    fn new(held: Arc<DashMap<CharacterId, LockState>>, id: CharacterId) -> Self {
        Self {
            held,
            id,
            released: false,
        }
    }

    pub fn character_id(&self) -> CharacterId {
        self.id
    }

    /// Finish a pass. Returns `true` when a follow-up was requested; the lock
    /// is then still held and the flag cleared. Returns `false` once released.
    pub fn complete(&mut self) -> bool {
        if self.released {
            return false;
        }
        match self.held.entry(self.id) {
            Entry::Occupied(mut entry) if entry.get().rerun => {
                entry.get_mut().rerun = false;
                true
            }
            Entry::Occupied(entry) => {
                entry.remove();
                self.released = true;
                false
            }
            Entry::Vacant(_) => {
                self.released = true;
                false
            }
        }
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        if !self.released {
            self.held.remove(&self.id);
        }
    }
}
