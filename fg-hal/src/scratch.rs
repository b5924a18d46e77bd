//! Per-backend "user data" side table.
//!
//! The original implementation stashes 16 bytes immediately *before* the
//! third-party backend's opaque scratch buffer, then reaches it back with
//! pointer arithmetic (spec.md §9, "Pre-header user-data on an opaque
//! scratch buffer"). That trick only exists because the C++ struct layout
//! is fixed; in Rust we have no reason to reproduce it. Instead we key a
//! side table by the scratch buffer's own identity (its base address),
//! which is stable for the backend interface's lifetime and never touched
//! by the third-party library.
//!
//! This is the primary mechanism (see DESIGN.md for why the prefix trick
//! was not carried forward).

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::backend::{ResourceAllocCallback, ResourceReleaseCallback};

/// The two optional callbacks pulled out of the host's parameter bag
/// (`ResourceAllocCallback`, `ResourceReleaseCallback`); present only when
/// the host wants to own texture allocation itself (spec.md §4.H).
#[derive(Clone)]
pub struct UserData {
    pub alloc: Option<ResourceAllocCallback>,
    pub release: Option<ResourceReleaseCallback>,
}

static TABLE: Mutex<Option<HashMap<usize, UserData>>> = Mutex::new(None);

fn key_for(scratch_base: *const u8) -> usize {
    scratch_base as usize
}

/// Associate `user_data` with a scratch buffer's base address.
pub fn attach(scratch_base: *const u8, user_data: UserData) {
    let mut guard = TABLE.lock();
    guard.get_or_insert_with(HashMap::new).insert(key_for(scratch_base), user_data);
}

/// Look up the user data previously attached to `scratch_base`, if any.
pub fn lookup(scratch_base: *const u8) -> Option<UserData> {
    TABLE
        .lock()
        .as_ref()
        .and_then(|table| table.get(&key_for(scratch_base)).cloned())
}

/// Drop the association. Called when a `BackendWrapper` is torn down so the
/// table doesn't accumulate stale entries across orchestrator
/// create/destroy cycles.
pub fn detach(scratch_base: *const u8) {
    if let Some(table) = TABLE.lock().as_mut() {
        table.remove(&key_for(scratch_base));
    }
}
