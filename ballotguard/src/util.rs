use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Short prefix of an identifier, for log lines
pub(crate) fn short_id(id: &Uuid) -> String {
    hex::encode(&id.as_bytes()[..4])
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// State behind these locks is only ever mutated in one final step, so a poisoned guard still
/// holds consistent state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
