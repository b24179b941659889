//! Binary buddy allocator for physical page frames.
//!
//! Services requests of the form "give me `n` contiguous pages" and
//! "release the run starting at index `p`". Order-indexed free lists
//! ([`crate::free_index::FreeIndex`]) hold free blocks, a flat ledger
//! ([`crate::ledger::Ledger`]) records the order each outstanding
//! allocation was granted at, and a page-state bitmap
//! ([`crate::bitmap::PageBitmap`]) tracks allocated starting indices for
//! cross-checking and diagnostics.
//!
//! This type performs no internal synchronization: `acquire` and `release`
//! both take `&mut self` and run straight through with no suspension
//! point. Callers sharing one instance across interrupt context or threads
//! are expected to serialize access externally. See [`crate::global`] for
//! a ready-made lock-guarded singleton.

use log::{error, trace};

use crate::bitmap::PageBitmap;
use crate::config::{MAX_SUPPORTED_ORDER, PAGE_SIZE_BYTES};
use crate::error::{AllocError, ReleaseError};
use crate::free_index::FreeIndex;
use crate::human_address::HumanAddress;
use crate::human_size::HumanSize;
use crate::ledger::Ledger;
use crate::page_index::PageIndex;

/// Computes the smallest order `k` such that `2^k >= n`.
///
/// `n` must be strictly positive.
fn order_for_size(n: usize) -> usize {
    debug_assert!(n > 0);
    let mut remaining = n - 1;
    let mut order = 0;
    while remaining > 0 {
        remaining >>= 1;
        order += 1;
    }
    order
}

/// A binary buddy allocator managing `n` page frames under orders
/// `0..=max_order`.
pub struct BuddyAllocator {
    max_order: usize,
    n: usize,
    bitmap: PageBitmap,
    free_index: FreeIndex,
    ledger: Ledger,
}

impl BuddyAllocator {
    /// Creates and initializes a buddy allocator managing `n` page frames
    /// under orders `0..=max_order`.
    ///
    /// If `n` is less than `2^max_order`, the tail pages `[n, 2^max_order)`
    /// are permanently marked allocated and never handed out. They exist
    /// only because `2^max_order` is the smallest power of two at least as
    /// large as `n`, not because the kernel actually owns that memory.
    ///
    /// # Panics
    ///
    /// Panics if `max_order > MAX_SUPPORTED_ORDER` or `n > 1 << max_order`.
    pub fn new(max_order: usize, n: usize) -> Self {
        assert!(
            max_order <= MAX_SUPPORTED_ORDER,
            "max_order exceeds this build's MAX_SUPPORTED_ORDER"
        );
        assert!(n <= 1 << max_order, "n exceeds 2^max_order");

        let mut allocator = Self {
            max_order,
            n,
            bitmap: PageBitmap::new(),
            free_index: FreeIndex::new(),
            ledger: Ledger::new(),
        };
        allocator.init();
        allocator
    }

    /// Re-initializes this allocator in place: establishes the free blocks
    /// covering the usable prefix `[0, n)` and permanently reserves the
    /// tail, if any. Idempotency is not required by callers, but calling
    /// this resets all state as if freshly constructed.
    pub fn init(&mut self) {
        self.bitmap.reset();
        self.free_index.reset();
        self.ledger.reset();
        self.init_region(PageIndex::new(0), self.max_order);
    }

    /// Recursively splits the span `[p, p + 2^order)` into the largest
    /// free blocks that fit entirely within `[0, n)`, marking any sub-span
    /// that falls entirely outside `[0, n)` as permanently allocated.
    fn init_region(&mut self, p: PageIndex, order: usize) {
        let size = 1usize << order;
        let start = p.as_usize();
        let end = start + size;

        if end <= self.n {
            self.free_index.push(order, p);
        } else if start >= self.n {
            // Entirely unmanageable: mark permanently allocated and never
            // surface it anywhere else. No ledger entry: nothing acquired
            // this, so nothing should ever be able to release it.
            self.bitmap.set(p, order);
        } else {
            debug_assert!(order > 0, "a single page cannot straddle the boundary");
            let half = size / 2;
            self.init_region(p, order - 1);
            self.init_region(p + half, order - 1);
        }
    }

    /// Allocates `2^k` contiguous pages, where `k` is the smallest order
    /// with `2^k >= n_pages`. Returns the starting page index.
    pub fn acquire(&mut self, n_pages: usize) -> Result<PageIndex, AllocError> {
        if n_pages == 0 || n_pages > (1 << self.max_order) {
            error!(
                "acquire: invalid page count {} ({})",
                n_pages,
                HumanSize::from(n_pages.saturating_mul(PAGE_SIZE_BYTES))
            );
            return Err(AllocError::InvalidSize);
        }

        let k = order_for_size(n_pages);
        let alloc_order = self.find_free_order(k).ok_or_else(|| {
            error!(
                "acquire: out of memory for order {} ({})",
                k,
                HumanSize::from((1usize << k) * PAGE_SIZE_BYTES)
            );
            AllocError::OutOfMemory
        })?;

        let p = self
            .free_index
            .pop_any(alloc_order)
            .expect("find_free_order reported a non-empty list");

        self.split_down(p, alloc_order, k);

        self.ledger.insert(p, k);
        self.bitmap.set(p, k);
        trace!(
            "acquire: granted order {} ({}) at {}",
            k,
            HumanSize::from((1usize << k) * PAGE_SIZE_BYTES),
            HumanAddress::from(p.as_usize())
        );
        Ok(p)
    }

    /// Releases the block previously returned by [`acquire`](Self::acquire)
    /// at index `p`. Attempts to coalesce with the freed block's buddy,
    /// recursively, up through increasing orders.
    pub fn release(&mut self, p: PageIndex) -> Result<(), ReleaseError> {
        let k = self.ledger.take(p).ok_or_else(|| {
            error!(
                "release: {} has no outstanding allocation",
                HumanAddress::from(p.as_usize())
            );
            ReleaseError::InvalidRelease
        })?;

        self.bitmap.clear(p, k);

        let mut cur_p = p;
        let mut cur_k = k;
        while cur_k < self.max_order {
            let buddy = cur_p.buddy_of(cur_k);
            if !self.free_index.remove(cur_k, buddy) {
                break;
            }
            trace!(
                "release: merging order {} blocks at {} and {}",
                cur_k,
                HumanAddress::from(cur_p.as_usize()),
                HumanAddress::from(buddy.as_usize())
            );
            cur_p = if cur_p.as_usize() < buddy.as_usize() {
                cur_p
            } else {
                buddy
            };
            cur_k += 1;
        }

        self.free_index.push(cur_k, cur_p);
        Ok(())
    }

    /// Total number of page frames this allocator manages, including any
    /// permanently reserved tail pages.
    pub fn total_frames(&self) -> usize {
        1 << self.max_order
    }

    /// Number of usable (non-permanently-reserved) page frames.
    pub fn usable_frames(&self) -> usize {
        self.n
    }

    /// Number of free frames across all orders.
    pub fn free_frames(&self) -> usize {
        (0..=self.max_order)
            .map(|order| self.free_index.count(order) * (1 << order))
            .sum()
    }

    /// Number of free blocks at a specific order.
    pub fn free_blocks_at_order(&self, order: usize) -> usize {
        if order > self.max_order {
            return 0;
        }
        self.free_index.count(order)
    }

    /// Returns whether `p` is the starting index of a currently allocated
    /// block (including permanently reserved tail pages).
    pub fn is_allocated(&self, p: PageIndex) -> bool {
        self.bitmap.test(p)
    }

    /// Finds the lowest order `>= min_order` with at least one free block.
    fn find_free_order(&self, min_order: usize) -> Option<usize> {
        (min_order..=self.max_order).find(|&order| !self.free_index.is_empty(order))
    }

    /// Splits a block from `from_order` down to `to_order`, pushing each
    /// upper half onto its order's free list. The lower half always keeps
    /// the parent's starting address, which trivially preserves the
    /// alignment invariant with no arithmetic choice to make.
    fn split_down(&mut self, p: PageIndex, from_order: usize, to_order: usize) {
        for order in (to_order..from_order).rev() {
            let buddy = p + (1 << order);
            self.free_index.push(order, buddy);
        }
    }
}
