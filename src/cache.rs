//! Instance caches backing the two lifetime scopes.
//!
//! A container owns one [`InstanceCache`] for container-managed instances and
//! every `invoke` call creates a throwaway one for invoke-managed instances.
//! Both are keyed by registration, not by the requested type, so a target
//! exposed under several interfaces is constructed once per cache.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::error::DiResult;
use crate::reflect::AnyArc;
use crate::registration::TargetId;

type Slot = Arc<OnceCell<AnyArc>>;

/// Lazily-filled instance slots, one per registration.
///
/// The map lock is only held long enough to fetch or create a slot. The
/// construction itself runs inside the slot's `OnceCell`, which lets
/// independent registrations build in parallel while concurrent requests for
/// the same registration wait for the first builder.
#[derive(Default)]
pub(crate) struct InstanceCache {
    slots: Mutex<HashMap<TargetId, Slot>>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: TargetId) -> Slot {
        self.slots.lock().entry(id).or_default().clone()
    }

    /// Returns the cached instance or builds it with `init`.
    ///
    /// A failed `init` leaves the slot empty so a later call retries.
    pub(crate) fn get_or_try_init<F>(&self, id: TargetId, init: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        let slot = self.slot(id);
        slot.get_or_try_init(init).cloned()
    }

    #[cfg_attr(not(any(test, feature = "diagnostics")), allow(dead_code))]
    pub(crate) fn get(&self, id: TargetId) -> Option<AnyArc> {
        self.slots.lock().get(&id).and_then(|slot| slot.get().cloned())
    }

    /// Drops the slot of a registration that is no longer bound.
    ///
    /// A resolver still building the old registration keeps its own handle to
    /// the slot and evicts again once it has finished.
    pub(crate) fn evict(&self, id: TargetId) -> Option<AnyArc> {
        self.slots.lock().remove(&id).and_then(|slot| slot.get().cloned())
    }

    /// Number of constructed instances.
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().values().filter(|slot| slot.get().is_some()).count()
    }
}
