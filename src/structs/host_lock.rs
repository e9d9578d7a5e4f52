//! # HostLock Module
//!
//! Process-wide lock serialising host-side work triggered by the backend: group
//! invocations and call state destruction. Re-entrant per thread, since a callable
//! may itself issue a nested `switch` or `dispatch`.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

static HOST_LOCK: Mutex<()> = Mutex::new(());

thread_local! {
    static HELD: RefCell<(usize, Option<MutexGuard<'static, ()>>)> = const { RefCell::new((0, None)) };
}

/// Marker type for the host lock.
pub struct HostLock;

impl HostLock {
    /// Acquires the lock, or deepens the current thread's hold on it.
    pub fn acquire() -> HostGuard {
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if held.0 == 0 {
                held.1 = Some(HOST_LOCK.lock().unwrap_or_else(PoisonError::into_inner));
            }
            held.0 += 1;
        });
        HostGuard {
            _not_send: PhantomData,
        }
    }

    /// True when the current thread holds the lock.
    pub fn is_held() -> bool {
        HELD.with(|held| held.borrow().0 > 0)
    }
}

/// Scoped hold on the host lock. Must be dropped on the thread that acquired it.
pub struct HostGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for HostGuard {
    fn drop(&mut self) {
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            held.0 = held.0.saturating_sub(1);
            if held.0 == 0 {
                held.1 = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentrant_acquire() {
        assert!(!HostLock::is_held());
        let outer = HostLock::acquire();
        {
            let _inner = HostLock::acquire();
            assert!(HostLock::is_held());
        }
        assert!(HostLock::is_held());
        drop(outer);
        assert!(!HostLock::is_held());
    }
}
