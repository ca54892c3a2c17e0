//! Fixed-size inline buffers.

use core::{cell::UnsafeCell, mem::MaybeUninit, ptr::NonNull};

use crate::util::Erased;

/// Alignment of every [`InlineBuffer`].
///
/// Payloads with a stricter alignment never fit inline.
pub const INLINE_ALIGN: usize = 16;

/// `N` bytes of uninitialized storage aligned to [`INLINE_ALIGN`].
///
/// The bytes sit in an [`UnsafeCell`] so that a payload with interior
/// mutability can be stored in them and accessed through shared references.
#[repr(C, align(16))]
pub struct InlineBuffer<const N: usize> {
    /// The raw storage
    bytes: UnsafeCell<[MaybeUninit<u8>; N]>,
}

impl<const N: usize> InlineBuffer<N> {
    /// Creates a new uninitialized buffer.
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            bytes: UnsafeCell::new([MaybeUninit::uninit(); N]),
        }
    }

    /// Returns whether a `T` can be stored in this buffer.
    ///
    /// This is a `const fn` so that the answer is known at compile time.
    #[inline]
    pub const fn fits<T>() -> bool {
        core::mem::size_of::<T>() <= N && core::mem::align_of::<T>() <= INLINE_ALIGN
    }

    /// Returns a pointer to the start of the buffer.
    #[inline]
    pub(crate) fn as_ptr(&self) -> NonNull<Erased> {
        NonNull::from(&self.bytes).cast::<Erased>()
    }
}
