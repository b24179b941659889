//! Property-based tests driven by randomized `acquire`/`release` sequences.
//!
//! Each property below checks one of the allocator's quantified invariants
//! against a model built purely from its own public API. There is no
//! separate reference implementation, only the invariants themselves,
//! checked after every step of a random walk.

use buddy_pmm::{AllocError, BuddyAllocator, PageIndex};
use proptest::prelude::*;

const MAX_ORDER: usize = 6; // 64 pages, no reserved tail (n == 2^max_order)
const N: usize = 1 << MAX_ORDER;

#[derive(Debug, Clone)]
enum Op {
    Acquire(usize),
    ReleaseOldest,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1..=N).prop_map(Op::Acquire),
        Just(Op::ReleaseOldest),
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(op_strategy(), 1..200)
}

/// Every outstanding allocation's starting index is aligned to its own
/// order, and no two outstanding allocations' page ranges overlap.
fn check_alignment_and_non_overlap(outstanding: &[(PageIndex, usize)]) {
    for &(p, k) in outstanding {
        assert!(
            p.is_aligned_to(k),
            "index {} is not aligned to order {}",
            p.as_usize(),
            k
        );
    }
    for i in 0..outstanding.len() {
        for j in (i + 1)..outstanding.len() {
            let (pi, ki) = outstanding[i];
            let (pj, kj) = outstanding[j];
            let (si, ei) = (pi.as_usize(), pi.as_usize() + (1 << ki));
            let (sj, ej) = (pj.as_usize(), pj.as_usize() + (1 << kj));
            assert!(
                ei <= sj || ej <= si,
                "blocks [{si},{ei}) and [{sj},{ej}) overlap"
            );
        }
    }
}

/// The bitmap agrees exactly with the set of outstanding allocations: every
/// page inside one reads allocated, every page outside all of them reads
/// free.
fn check_bitmap_matches(a: &BuddyAllocator, outstanding: &[(PageIndex, usize)]) {
    let mut expected_allocated = vec![false; N];
    for &(p, k) in outstanding {
        for i in p.as_usize()..p.as_usize() + (1 << k) {
            expected_allocated[i] = true;
        }
    }
    for i in 0..N {
        assert_eq!(
            a.is_allocated(PageIndex::new(i)),
            expected_allocated[i],
            "bitmap mismatch at page {i}"
        );
    }
}

proptest! {
    /// Partitioning, alignment, and non-overlap invariants hold after every
    /// step of a random sequence of acquires and releases.
    #[test]
    fn partitioning_alignment_and_non_overlap_hold(ops in ops_strategy()) {
        let mut a = BuddyAllocator::new(MAX_ORDER, N);
        let mut outstanding: Vec<(PageIndex, usize)> = Vec::new();

        for op in ops {
            match op {
                Op::Acquire(n_pages) => {
                    if let Ok(p) = a.acquire(n_pages) {
                        let k = (0usize..=MAX_ORDER)
                            .find(|&k| (1usize << k) >= n_pages)
                            .unwrap();
                        outstanding.push((p, k));
                    }
                }
                Op::ReleaseOldest => {
                    if !outstanding.is_empty() {
                        let (p, _) = outstanding.remove(0);
                        prop_assert!(a.release(p).is_ok());
                    }
                }
            }

            check_alignment_and_non_overlap(&outstanding);
            check_bitmap_matches(&a, &outstanding);

            let allocated_frames: usize = outstanding.iter().map(|&(_, k)| 1 << k).sum();
            prop_assert_eq!(a.free_frames() + allocated_frames, a.usable_frames());
        }
    }

    /// Releasing every outstanding allocation from a random sequence always
    /// fully coalesces back to a single top-order free block.
    #[test]
    fn full_coalesce_after_releasing_everything(ops in ops_strategy()) {
        let mut a = BuddyAllocator::new(MAX_ORDER, N);
        let mut outstanding: Vec<PageIndex> = Vec::new();

        for op in ops {
            match op {
                Op::Acquire(n_pages) => {
                    if let Ok(p) = a.acquire(n_pages) {
                        outstanding.push(p);
                    }
                }
                Op::ReleaseOldest => {
                    if !outstanding.is_empty() {
                        let p = outstanding.remove(0);
                        prop_assert!(a.release(p).is_ok());
                    }
                }
            }
        }

        for p in outstanding {
            prop_assert!(a.release(p).is_ok());
        }

        prop_assert_eq!(a.free_blocks_at_order(MAX_ORDER), 1);
        prop_assert_eq!(a.free_frames(), N);
        for order in 0..MAX_ORDER {
            prop_assert_eq!(a.free_blocks_at_order(order), 0);
        }
    }

    /// `acquire(n)` immediately followed by `release(p)` restores the exact
    /// free-block distribution across every order.
    #[test]
    fn round_trip_restores_free_state(n_pages in 1..=N) {
        let mut a = BuddyAllocator::new(MAX_ORDER, N);
        let before: Vec<usize> = (0..=MAX_ORDER).map(|k| a.free_blocks_at_order(k)).collect();

        let p = a.acquire(n_pages).expect("fresh allocator has room for any valid size");
        a.release(p).unwrap();

        let after: Vec<usize> = (0..=MAX_ORDER).map(|k| a.free_blocks_at_order(k)).collect();
        prop_assert_eq!(before, after);
    }

    /// Releasing the same index twice always fails the second time,
    /// regardless of how much allocator state has churned in between.
    #[test]
    fn double_release_is_always_rejected(ops in ops_strategy(), pick in 0..50usize) {
        let mut a = BuddyAllocator::new(MAX_ORDER, N);
        let mut outstanding: Vec<PageIndex> = Vec::new();

        for op in ops {
            match op {
                Op::Acquire(n_pages) => {
                    if let Ok(p) = a.acquire(n_pages) {
                        outstanding.push(p);
                    }
                }
                Op::ReleaseOldest => {
                    if !outstanding.is_empty() {
                        let p = outstanding.remove(0);
                        prop_assert!(a.release(p).is_ok());
                    }
                }
            }
        }

        if !outstanding.is_empty() {
            let p = outstanding[pick % outstanding.len()];
            prop_assert!(a.release(p).is_ok());
            prop_assert!(a.release(p).is_err());
        }
    }

    /// Invalid sizes are rejected identically no matter the allocator's
    /// current fragmentation state.
    #[test]
    fn invalid_size_is_always_rejected(ops in ops_strategy(), over in 1..=N) {
        let mut a = BuddyAllocator::new(MAX_ORDER, N);

        for op in ops {
            match op {
                Op::Acquire(n_pages) => {
                    let _ = a.acquire(n_pages);
                }
                Op::ReleaseOldest => {}
            }
        }

        prop_assert_eq!(a.acquire(0), Err(AllocError::InvalidSize));
        prop_assert_eq!(a.acquire(N + over), Err(AllocError::InvalidSize));
    }
}
