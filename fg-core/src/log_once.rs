//! "Log once per condition" idiom (spec.md §7): several warnings — missing
//! command list, missing optional bag keys — would otherwise fire every
//! frame. Each call site is keyed by a short string; the first call logs,
//! later calls with the same key are silent.

use std::collections::HashSet;

use parking_lot::Mutex;

static SEEN: Mutex<Option<HashSet<&'static str>>> = Mutex::new(None);

/// Logs `message()` at `warn` level the first time `key` is seen this
/// process run, and never again.
pub fn warn_once(key: &'static str, message: impl FnOnce() -> String) {
    let mut guard = SEEN.lock();
    let seen = guard.get_or_insert_with(HashSet::new);
    if seen.insert(key) {
        log::warn!("{}", message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn only_builds_the_message_once_per_key() {
        static CALLS: AtomicU32 = AtomicU32::new(0);
        let key = "only_builds_the_message_once_per_key::unique";
        for _ in 0..5 {
            warn_once(key, || {
                CALLS.fetch_add(1, Ordering::SeqCst);
                "test warning".to_string()
            });
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
