#![cfg_attr(not(test), no_std)]

//! # Buddy PMM
//!
//! A binary buddy allocator for fixed-size physical page frames, intended
//! to run inside a kernel's memory-management subsystem above the raw
//! page-frame array and below any slab/object allocator or virtual-memory
//! code. It owns no heap of its own: every container is a statically
//! sized array reserved at compile time (see [`config`]).
//!
//! The allocator exposes exactly three operations:
//!
//! - [`BuddyAllocator::new`], establishes the initial free blocks.
//! - [`BuddyAllocator::acquire`], grants a contiguous run of pages.
//! - [`BuddyAllocator::release`], returns a previously granted run.
//!
//! Concurrency, the page-frame array's contents, MMU/page-table code, and
//! multi-zone/NUMA/per-CPU topology are all out of scope. See
//! [`global`] for the lock-guarded singleton a kernel would wrap this type
//! in.

mod bitmap;
mod buddy_allocator;
mod config;
mod error;
mod free_index;
mod human_address;
mod human_size;
mod ledger;
mod page_index;

pub mod global;

pub use buddy_allocator::BuddyAllocator;
pub use config::{MAX_FRAMES, MAX_SUPPORTED_ORDER, NUM_ORDERS};
pub use error::{AllocError, ReleaseError};
pub use human_address::HumanAddress;
pub use human_size::HumanSize;
pub use page_index::PageIndex;
