//! Compile-time size bounds for the buddy allocator's static storage.
//!
//! All metadata arrays in this crate are sized to the worst case a build
//! could ever need, and reserved statically (there is no heap to draw on).
//! A given [`crate::BuddyAllocator`] instance may be configured at `init`
//! time with a smaller effective order and frame count, but the backing
//! arrays are always `MAX_FRAMES` wide.

/// Highest order this build can ever support. Order 15 gives a maximum
/// block of 2^15 = 32,768 pages.
pub const MAX_SUPPORTED_ORDER: usize = 15;

/// Number of free lists needed to cover orders `0..=MAX_SUPPORTED_ORDER`.
pub const NUM_ORDERS: usize = MAX_SUPPORTED_ORDER + 1;

/// Upper bound on the number of page frames any allocator instance in this
/// build can manage.
pub const MAX_FRAMES: usize = 1 << MAX_SUPPORTED_ORDER;

/// Number of `u64` words needed to hold one bit per frame.
pub const BITMAP_WORDS: usize = MAX_FRAMES / 64;

/// Assumed size of a single page frame, used only to render human-readable
/// byte counts in log output. No allocation arithmetic depends on it.
pub const PAGE_SIZE_BYTES: usize = 4096;

static_assertions::const_assert!(MAX_FRAMES.is_power_of_two());
static_assertions::const_assert!(MAX_FRAMES >= 64);
static_assertions::const_assert!(MAX_FRAMES % 64 == 0);
