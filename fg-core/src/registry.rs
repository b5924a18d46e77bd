//! Feature-handle registry (spec.md §3, "Feature handle"; §5).
//!
//! Grounded on the teacher's `wgpu-core::registry::Registry`: a storage map
//! protected by a lock, with identity assignment split out from the map
//! itself. The teacher's `Registry` additionally tracks epochs because its
//! ids get recycled; ours does not need to, because spec.md is explicit
//! that `internal_id` is "never reused within a process run" — so a plain
//! monotonic counter replaces the teacher's `IdentityHandlerFactory`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use fgt::{FeatureHandle, FeatureId, FeatureKind};

use crate::error::CoreError;
use crate::orchestrator::FrameInterpolator;

/// Process-wide `internal_id → orchestrator` map (spec.md §3). Create and
/// release are writer-locked; evaluate is reader-locked and holds a shared
/// reference for the call's duration, so a concurrent release cannot
/// destroy the orchestrator mid-dispatch (spec.md §5).
pub struct FeatureRegistry {
    next_id: AtomicU32,
    entries: RwLock<FxHashMap<FeatureId, Arc<FrameInterpolator>>>,
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self {
            // internal_id 0 is reserved as "no handle" at the ABI boundary,
            // matching the vendor convention that a null feature handle is
            // never valid.
            next_id: AtomicU32::new(1),
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    /// Allocates the next `internal_id` and inserts `orchestrator` under it.
    /// `internal_id`s emitted by two successive calls always differ
    /// (spec.md §8, P4).
    pub fn create(&self, orchestrator: FrameInterpolator) -> FeatureHandle {
        let internal_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().insert(internal_id, Arc::new(orchestrator));
        FeatureHandle {
            internal_id,
            feature_kind: FeatureKind::FrameGeneration,
        }
    }

    /// Looks up the orchestrator for `handle`, holding a shared reference
    /// for as long as the returned `Arc` is alive — this is the "reader
    /// lock held for the duration of the call" from spec.md §5.
    pub fn get(&self, handle: FeatureHandle) -> Result<Arc<FrameInterpolator>, CoreError> {
        self.entries
            .read()
            .get(&handle.internal_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("feature handle {}", handle.internal_id)))
    }

    /// Removes the entry; the handle value itself is not freed, only the
    /// map slot (spec.md §3, "Lifecycle"). Returns an error if the handle
    /// was never created or was already released, matching
    /// `EvaluateFeature`/`ReleaseFeature` returning `FeatureNotFound` for an
    /// unknown handle (spec.md §8, P3).
    pub fn release(&self, handle: FeatureHandle) -> Result<(), CoreError> {
        self.entries
            .write()
            .remove(&handle.internal_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("feature handle {}", handle.internal_id)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::stub_orchestrator;

    #[test]
    fn successive_creates_yield_distinct_ids() {
        let registry = FeatureRegistry::new();
        let a = registry.create(stub_orchestrator());
        let b = registry.create(stub_orchestrator());
        assert_ne!(a.internal_id, b.internal_id);
        assert!(b.internal_id > a.internal_id);
    }

    #[test]
    fn release_then_evaluate_reports_not_found() {
        let registry = FeatureRegistry::new();
        let handle = registry.create(stub_orchestrator());
        assert!(registry.release(handle).is_ok());
        assert!(matches!(registry.get(handle), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn create_release_create_strictly_increases_id() {
        let registry = FeatureRegistry::new();
        let first = registry.create(stub_orchestrator());
        registry.release(first).unwrap();
        let second = registry.create(stub_orchestrator());
        assert!(second.internal_id > first.internal_id);
    }

    #[test]
    fn releasing_unknown_handle_errors() {
        let registry = FeatureRegistry::new();
        let bogus = FeatureHandle {
            internal_id: 999,
            feature_kind: FeatureKind::FrameGeneration,
        };
        assert!(registry.release(bogus).is_err());
    }
}
