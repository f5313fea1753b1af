//! Counting wrapper around mimalloc. Install it as the global allocator in the
//! binary to make [`snapshot`] report live numbers; without it every counter
//! stays at zero.

use mimalloc::MiMalloc;
use serde::Serialize;
use std::alloc::{GlobalAlloc, Layout};
use std::sync::atomic::{AtomicUsize, Ordering};

static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
static FREED: AtomicUsize = AtomicUsize::new(0);
static RESIDENT: AtomicUsize = AtomicUsize::new(0);
static ALLOCATIONS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default, Debug, Clone, Copy)]
pub struct CountingMiMalloc;

unsafe impl GlobalAlloc for CountingMiMalloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ret = unsafe { MiMalloc.alloc(layout) };
        if !ret.is_null() {
            record_alloc(layout.size());
        }
        ret
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ret = unsafe { MiMalloc.alloc_zeroed(layout) };
        if !ret.is_null() {
            record_alloc(layout.size());
        }
        ret
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        record_free(layout.size());
        unsafe { MiMalloc.dealloc(ptr, layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let ret = unsafe { MiMalloc.realloc(ptr, layout, new_size) };
        if !ret.is_null() {
            record_free(layout.size());
            record_alloc(new_size);
        }
        ret
    }
}

fn record_alloc(size: usize) {
    ALLOCATED.fetch_add(size, Ordering::Relaxed);
    RESIDENT.fetch_add(size, Ordering::Relaxed);
    ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
}

fn record_free(size: usize) {
    FREED.fetch_add(size, Ordering::Relaxed);
    RESIDENT.fetch_sub(size, Ordering::Relaxed);
}

/// Cumulative allocator counters at one instant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeapSnapshot {
    pub allocated_bytes: usize,
    pub freed_bytes: usize,
    pub resident_bytes: usize,
    pub allocations: usize,
}

/// Signed change between two snapshots.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeapDiff {
    pub allocated_bytes: i64,
    pub freed_bytes: i64,
    pub resident_bytes: i64,
    pub allocations: i64,
}

pub fn snapshot() -> HeapSnapshot {
    HeapSnapshot {
        allocated_bytes: ALLOCATED.load(Ordering::Relaxed),
        freed_bytes: FREED.load(Ordering::Relaxed),
        resident_bytes: RESIDENT.load(Ordering::Relaxed),
        allocations: ALLOCATIONS.load(Ordering::Relaxed),
    }
}

fn delta(now: usize, before: usize) -> i64 {
    now as i64 - before as i64
}

impl HeapSnapshot {
    pub fn compare_to(&self, previous: &HeapSnapshot) -> HeapDiff {
        HeapDiff {
            allocated_bytes: delta(self.allocated_bytes, previous.allocated_bytes),
            freed_bytes: delta(self.freed_bytes, previous.freed_bytes),
            resident_bytes: delta(self.resident_bytes, previous.resident_bytes),
            allocations: delta(self.allocations, previous.allocations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_is_signed() {
        let before = HeapSnapshot {
            allocated_bytes: 100,
            freed_bytes: 10,
            resident_bytes: 90,
            allocations: 4,
        };
        let after = HeapSnapshot {
            allocated_bytes: 150,
            freed_bytes: 100,
            resident_bytes: 50,
            allocations: 6,
        };
        let diff = after.compare_to(&before);
        assert_eq!(diff.allocated_bytes, 50);
        assert_eq!(diff.freed_bytes, 90);
        assert_eq!(diff.resident_bytes, -40);
        assert_eq!(diff.allocations, 2);
    }

    #[test]
    fn counting_allocator_tracks_its_own_traffic() {
        let before = snapshot();
        let layout = Layout::from_size_align(4096, 8).unwrap();
        unsafe {
            let ptr = CountingMiMalloc.alloc(layout);
            assert!(!ptr.is_null());
            CountingMiMalloc.dealloc(ptr, layout);
        }
        let diff = snapshot().compare_to(&before);
        assert!(diff.allocated_bytes >= 4096);
        assert!(diff.freed_bytes >= 4096);
        assert!(diff.allocations >= 1);
    }
}
