//! Allocation ledger: starting page index -> granted order.
//!
//! Consulted on release to recover a block's size. Flat-array indexed by
//! starting index, giving O(1) insert/take with no scan over outstanding
//! allocations required.

use crate::config::MAX_FRAMES;
use crate::page_index::PageIndex;

pub(crate) struct Ledger {
    orders: [Option<u8>; MAX_FRAMES],
}

impl Ledger {
    pub(crate) const fn new() -> Self {
        Self {
            orders: [None; MAX_FRAMES],
        }
    }

    pub(crate) fn reset(&mut self) {
        self.orders.fill(None);
    }

    /// Records that `p` was granted at order `k`.
    ///
    /// Precondition: `p` is not already recorded.
    pub(crate) fn insert(&mut self, p: PageIndex, k: usize) {
        debug_assert!(
            self.orders[p.as_usize()].is_none(),
            "ledger already has an entry for this index"
        );
        self.orders[p.as_usize()] = Some(k as u8);
    }

    /// Removes and returns the order recorded for `p`, if any.
    pub(crate) fn take(&mut self, p: PageIndex) -> Option<usize> {
        self.orders[p.as_usize()].take().map(|k| k as usize)
    }

    /// Returns whether `p` currently has a recorded allocation.
    #[cfg(test)]
    pub(crate) fn contains(&self, p: PageIndex) -> bool {
        self.orders[p.as_usize()].is_some()
    }
}
