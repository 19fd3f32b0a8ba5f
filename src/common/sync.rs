//! Lock helpers.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if another worker panicked while
/// holding it. Every structure guarded this way is left consistent between
/// method calls, so the data is still usable after a poisoned unlock.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
