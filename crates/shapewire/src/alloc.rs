// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Allocators charged by the allocating decoder.
//!
//! Decoded values own their memory through `Box` and `Vec`. Every pointer or
//! slice node the decoder materializes is charged to an [`Allocator`] with the
//! node's `Layout`, and [`crate::release`] credits the same layouts back. This
//! gives callers a hard budget for untrusted input and an exact account of
//! what a decoded value holds. Zero-sized layouts are never charged.
//!
//! Dropping a decoded value without releasing it frees the memory but leaves
//! its charge on the allocator.

use parking_lot::Mutex;
use std::alloc::Layout;
use std::fmt;

/// The allocator refused a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocation refused")
    }
}

impl std::error::Error for AllocError {}

/// Memory source for the allocating decoder.
pub trait Allocator {
    /// Charge `layout` (never zero-sized).
    fn allocate(&self, layout: Layout) -> Result<(), AllocError>;

    /// Return a charge previously granted for `layout`.
    fn deallocate(&self, layout: Layout);

    /// Total bytes this allocator could ever grant, if bounded.
    ///
    /// Slices larger than this are rejected as `InvalidLength` rather than
    /// `OutOfMemory`.
    fn capacity(&self) -> Option<usize> {
        None
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate(&self, layout: Layout) -> Result<(), AllocError> {
        (**self).allocate(layout)
    }

    fn deallocate(&self, layout: Layout) {
        (**self).deallocate(layout);
    }

    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }
}

/// Unbounded, stateless allocator backed by the global heap.
#[derive(Debug, Clone, Copy, Default)]
pub struct Heap;

impl Allocator for Heap {
    fn allocate(&self, _layout: Layout) -> Result<(), AllocError> {
        Ok(())
    }

    fn deallocate(&self, _layout: Layout) {}
}

/// Counters exposed by [`Budget`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BudgetStats {
    /// Charges currently outstanding.
    pub live_allocations: usize,
    /// Bytes currently outstanding.
    pub live_bytes: usize,
    /// High-water mark of `live_bytes`.
    pub peak_bytes: usize,
    /// Charges granted since creation.
    pub total_allocations: u64,
    /// Charges refused since creation.
    pub refused: u64,
}

/// Thread-safe allocator with an optional byte capacity and live counters.
#[derive(Debug)]
pub struct Budget {
    capacity: Option<usize>,
    stats: Mutex<BudgetStats>,
}

impl Budget {
    /// Budget refusing charges once `capacity` bytes are outstanding.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            stats: Mutex::new(BudgetStats::default()),
        }
    }

    /// Budget that only counts.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            capacity: None,
            stats: Mutex::new(BudgetStats::default()),
        }
    }

    pub fn stats(&self) -> BudgetStats {
        *self.stats.lock()
    }

    pub fn live_allocations(&self) -> usize {
        self.stats.lock().live_allocations
    }

    pub fn live_bytes(&self) -> usize {
        self.stats.lock().live_bytes
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Allocator for Budget {
    fn allocate(&self, layout: Layout) -> Result<(), AllocError> {
        let mut stats = self.stats.lock();
        let Some(next) = stats.live_bytes.checked_add(layout.size()) else {
            stats.refused += 1;
            return Err(AllocError);
        };
        if self.capacity.is_some_and(|cap| next > cap) {
            stats.refused += 1;
            return Err(AllocError);
        }
        stats.live_bytes = next;
        stats.live_allocations += 1;
        stats.total_allocations += 1;
        stats.peak_bytes = stats.peak_bytes.max(next);
        Ok(())
    }

    fn deallocate(&self, layout: Layout) {
        let mut stats = self.stats.lock();
        debug_assert!(stats.live_allocations > 0, "deallocate without allocate");
        stats.live_allocations = stats.live_allocations.saturating_sub(1);
        stats.live_bytes = stats.live_bytes.saturating_sub(layout.size());
    }

    fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

/// Allocator handed to the non-allocating decode path.
///
/// The static gate guarantees it is never charged.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NoAlloc;

impl Allocator for NoAlloc {
    fn allocate(&self, _layout: Layout) -> Result<(), AllocError> {
        Err(AllocError)
    }

    fn deallocate(&self, _layout: Layout) {}

    fn capacity(&self) -> Option<usize> {
        Some(0)
    }
}

/// Charge `layout` unless it is zero-sized.
pub(crate) fn charge<A: Allocator + ?Sized>(alloc: &A, layout: Layout) -> crate::Result<()> {
    if layout.size() == 0 {
        return Ok(());
    }
    alloc
        .allocate(layout)
        .map_err(|_| crate::Error::OutOfMemory)
}

/// Credit `layout` back unless it is zero-sized.
pub(crate) fn credit<A: Allocator + ?Sized>(alloc: &A, layout: Layout) {
    if layout.size() != 0 {
        alloc.deallocate(layout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_counts_and_refuses() {
        let budget = Budget::with_capacity(16);
        let eight = Layout::new::<u64>();
        budget.allocate(eight).expect("first fits");
        budget.allocate(eight).expect("second fits");
        assert_eq!(budget.allocate(Layout::new::<u8>()), Err(AllocError));

        let stats = budget.stats();
        assert_eq!(stats.live_allocations, 2);
        assert_eq!(stats.live_bytes, 16);
        assert_eq!(stats.refused, 1);

        budget.deallocate(eight);
        budget.deallocate(eight);
        assert_eq!(budget.live_allocations(), 0);
        assert_eq!(budget.live_bytes(), 0);
        assert_eq!(budget.stats().peak_bytes, 16);
        assert_eq!(budget.stats().total_allocations, 2);
    }

    #[test]
    fn test_zero_sized_layouts_are_free() {
        let budget = Budget::with_capacity(0);
        charge(&budget, Layout::new::<()>()).expect("zst charge");
        credit(&budget, Layout::new::<()>());
        assert_eq!(budget.stats(), BudgetStats::default());
        assert!(matches!(
            charge(&budget, Layout::new::<u8>()),
            Err(crate::Error::OutOfMemory)
        ));
    }

    #[test]
    fn test_reference_forwards() {
        let budget = Budget::unbounded();
        let by_ref = &budget;
        by_ref.allocate(Layout::new::<u32>()).expect("allocate");
        assert_eq!(budget.live_bytes(), 4);
        assert_eq!(by_ref.capacity(), None);
        assert!(Heap.allocate(Layout::new::<[u8; 1 << 20]>()).is_ok());
    }
}
