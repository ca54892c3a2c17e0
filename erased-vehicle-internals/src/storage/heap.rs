//! Owned, uninitialized heap blocks.
//!
//! A [`HeapBlock`] owns memory, never a payload. Dropping a block releases the
//! memory without running any destructor, which lets the containers use it as
//! a scope guard: a block allocated for a copy that never got initialized (for
//! example because the payload's `clone` panicked) is still released exactly
//! once.

use alloc::alloc::{alloc, dealloc};
use core::{alloc::Layout, ptr::NonNull};

use crate::{error::AllocError, util::Erased};

/// An owned heap allocation with a known [`Layout`].
///
/// Zero-sized layouts are never passed to the allocator; they are represented
/// by a dangling pointer that is aligned to the requested alignment.
pub struct HeapBlock {
    /// Pointer to the start of the block
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. If `layout.size() != 0`, the pointer was returned by the global
    ///    allocator for exactly `layout` and has not been deallocated.
    /// 2. If `layout.size() == 0`, the pointer is dangling, non-null and
    ///    aligned to `layout.align()`.
    ptr: NonNull<u8>,
    /// The layout used to allocate the block
    layout: Layout,
}

impl HeapBlock {
    /// Allocates a block for `layout` from the global allocator.
    ///
    /// Returns an [`AllocError`] if the allocator reports failure.
    #[inline]
    pub(crate) fn try_alloc(layout: Layout) -> Result<Self, AllocError> {
        if layout.size() == 0 {
            let dangling = core::ptr::without_provenance_mut::<u8>(layout.align());
            let ptr = NonNull::new(dangling).ok_or(AllocError::new(layout))?;
            return Ok(Self { ptr, layout });
        }

        // SAFETY: The layout has a non-zero size, as checked above.
        let ptr = unsafe { alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or(AllocError::new(layout))?;
        Ok(Self { ptr, layout })
    }

    /// Allocates a block that can hold a `T`.
    #[inline]
    pub(crate) fn try_alloc_for<T>() -> Result<Self, AllocError> {
        Self::try_alloc(Layout::new::<T>())
    }

    /// The layout the block was allocated with.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns a pointer to the start of the block.
    #[inline]
    pub(crate) fn as_ptr(&self) -> NonNull<Erased> {
        self.ptr.cast::<Erased>()
    }
}

impl core::ops::Drop for HeapBlock {
    #[inline]
    fn drop(&mut self) {
        if self.layout.size() == 0 {
            return;
        }

        // SAFETY:
        // 1. The pointer was allocated by the global allocator with `self.layout`
        //    (guaranteed by the invariants of this type, and the size is non-zero).
        // 2. The block is released exactly once since we are in `drop`.
        unsafe {
            dealloc(self.ptr.as_ptr(), self.layout);
        }
    }
}
