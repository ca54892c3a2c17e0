//! Error type for failed payload allocations.

use core::alloc::Layout;

/// Error returned when heap storage for a payload could not be obtained.
///
/// Contains the layout that was requested from the global allocator.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    /// The layout whose allocation failed
    layout: Layout,
}

impl AllocError {
    /// Creates a new [`AllocError`] for the given layout.
    #[inline]
    pub const fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// The layout that could not be allocated.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }
}

impl core::fmt::Debug for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AllocError")
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "failed to allocate {} bytes with alignment {}",
            self.layout.size(),
            self.layout.align()
        )
    }
}

impl core::error::Error for AllocError {}
