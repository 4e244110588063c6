//! Counting global allocator feeding the heap profile
//!
//! Install it in a binary with:
//!
//! ```no_run
//! use pathos_core::CountingAllocator;
//!
//! #[global_allocator]
//! static GLOBAL: CountingAllocator = CountingAllocator;
//!
//! fn main() {
//!     CountingAllocator::mark_installed();
//! }
//! ```

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static ALLOCATED_BYTES: AtomicU64 = AtomicU64::new(0);
static FREED_BYTES: AtomicU64 = AtomicU64::new(0);
static ALLOCATIONS: AtomicU64 = AtomicU64::new(0);
static FREES: AtomicU64 = AtomicU64::new(0);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// `System` allocator wrapper that keeps running totals
#[derive(Debug, Default, Clone, Copy)]
pub struct CountingAllocator;

/// Totals since process start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationCounters {
    pub allocated_bytes: u64,
    pub freed_bytes: u64,
    pub allocations: u64,
    pub frees: u64,
}

impl AllocationCounters {
    pub fn in_use_bytes(&self) -> u64 {
        self.allocated_bytes.saturating_sub(self.freed_bytes)
    }
}

impl CountingAllocator {
    pub fn counters() -> AllocationCounters {
        AllocationCounters {
            allocated_bytes: ALLOCATED_BYTES.load(Ordering::Relaxed),
            freed_bytes: FREED_BYTES.load(Ordering::Relaxed),
            allocations: ALLOCATIONS.load(Ordering::Relaxed),
            frees: FREES.load(Ordering::Relaxed),
        }
    }

    /// Record that this allocator is the `#[global_allocator]` of the process
    pub fn mark_installed() {
        INSTALLED.store(true, Ordering::SeqCst);
    }

    /// Whether the counters cover every allocation of the process
    pub fn is_active() -> bool {
        INSTALLED.load(Ordering::SeqCst)
    }

    fn on_alloc(size: usize) {
        ALLOCATED_BYTES.fetch_add(size as u64, Ordering::Relaxed);
        ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
    }

    fn on_free(size: usize) {
        FREED_BYTES.fetch_add(size as u64, Ordering::Relaxed);
        FREES.fetch_add(1, Ordering::Relaxed);
    }
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            Self::on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc_zeroed(layout);
        if !ptr.is_null() {
            Self::on_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        Self::on_free(layout.size());
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            Self::on_free(layout.size());
            Self::on_alloc(new_size);
        }
        new_ptr
    }
}
