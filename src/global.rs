//! Process-wide singleton wiring for [`BuddyAllocator`].
//!
//! `BuddyAllocator` itself has no internal locking (see its own docs);
//! concurrency is entirely the caller's responsibility. When a true
//! process-wide instance is needed, this module holds one behind a
//! [`spin::Mutex`], set up once during boot.

use spin::{Mutex, Once};

use crate::BuddyAllocator;

static ALLOCATOR: Once<Mutex<BuddyAllocator>> = Once::new();

/// Initializes the global allocator instance.
///
/// Must be called exactly once during kernel initialization, before any
/// other code calls [`with`].
///
/// # Panics
///
/// Panics if called more than once.
pub fn init(max_order: usize, n: usize) {
    if ALLOCATOR.is_completed() {
        panic!("global buddy allocator already initialized");
    }
    ALLOCATOR.call_once(|| Mutex::new(BuddyAllocator::new(max_order, n)));
}

/// Runs `f` with exclusive access to the global allocator instance.
///
/// # Panics
///
/// Panics if [`init`] has not been called yet.
pub fn with<R>(f: impl FnOnce(&mut BuddyAllocator) -> R) -> R {
    let allocator = ALLOCATOR
        .get()
        .expect("global buddy allocator not initialized; call global::init first");
    f(&mut allocator.lock())
}

/// Returns whether the global allocator instance has been initialized.
pub fn is_initialized() -> bool {
    ALLOCATOR.is_completed()
}
