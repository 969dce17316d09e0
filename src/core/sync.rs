//! Lock helpers for the std `RwLock`/`Mutex` types used across the crate
//!
//! Two flavours are provided. The `*_or` helpers turn a poisoned lock into a
//! caller-supplied error for paths that can report failure. The
//! `*_recovering` helpers take the inner data back out of a poisoned lock
//! for read paths that must always answer (status polling, event fan-out).

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

fn poison_message(what: &str, mode: &str) -> String {
    format!(
        "Internal synchronisation error ({} {} lock poisoned). A panic occurred while the lock was held.",
        what, mode
    )
}

/// Acquire a read guard, mapping poisoning through `error_constructor`
pub fn read_or<'a, T, E>(
    lock: &'a RwLock<T>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<'a, T>, E> {
    lock.read()
        .map_err(|_| error_constructor(poison_message(what, "read")))
}

/// Acquire a write guard, mapping poisoning through `error_constructor`
pub fn write_or<'a, T, E>(
    lock: &'a RwLock<T>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<'a, T>, E> {
    lock.write()
        .map_err(|_| error_constructor(poison_message(what, "write")))
}

/// Acquire a mutex guard, mapping poisoning through `error_constructor`
pub fn lock_or<'a, T, E>(
    mutex: &'a Mutex<T>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    mutex
        .lock()
        .map_err(|_| error_constructor(poison_message(what, "mutex")))
}

/// Acquire a read guard, recovering the data if the lock was poisoned
pub fn read_recovering<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::warn!("{}", poison_message(what, "read"));
        poisoned.into_inner()
    })
}

/// Acquire a write guard, recovering the data if the lock was poisoned
pub fn write_recovering<'a, T>(lock: &'a RwLock<T>, what: &str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned: PoisonError<_>| {
        log::warn!("{}", poison_message(what, "write"));
        poisoned.into_inner()
    })
}
