//! Storage policies deciding where a payload lives.
//!
//! A storage policy is a zero-sized marker type implementing [`Storage`]. Its
//! associated [`Storage::Slot`] is the memory a container embeds: an owned heap
//! block, an inline buffer, or a choice between the two.
//!
//! - [`Remote`]: the payload always lives in a [`HeapBlock`].
//! - [`Local<N>`]: the payload always lives in an [`InlineBuffer<N>`]. Payloads
//!   that do not fit are rejected at compile time.
//! - [`Sbo<N>`]: the payload lives inline when it fits and on the heap
//!   otherwise. The choice is made per payload type at compile time and
//!   recorded in the [`SboSlot`] discriminant.
//!
//! Slots own memory only. Running the payload's destructor is the job of the
//! container, which then lets the slot release its memory.

mod heap;
mod inline;

use core::{alloc::Layout, ptr::NonNull};

pub use self::{
    heap::HeapBlock,
    inline::{INLINE_ALIGN, InlineBuffer},
};
use crate::{error::AllocError, util::Erased};

/// Where the payload of a container currently lives.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum StorageLocation {
    /// The payload is stored inside the container itself.
    Inline,
    /// The payload is stored in a separate heap block owned by the container.
    Heap,
}

/// Keeps [`Storage`] implementable only inside this crate.
mod sealed_storage {
    /// Supertrait of [`Storage`](super::Storage) that cannot be named outside this crate.
    pub trait Sealed: 'static {}

    impl Sealed for super::Remote {}
    impl<const N: usize> Sealed for super::Local<N> {}
    impl<const N: usize> Sealed for super::Sbo<N> {}
}

/// Policy deciding where a container stores its payload.
///
/// This trait is sealed and cannot be implemented outside of this crate. Use
/// one of [`Remote`], [`Local`] or [`Sbo`].
///
/// # Guarantees
///
/// For every slot returned by [`slot_for::<T>`](Storage::slot_for), the
/// pointers returned by [`payload_ptr`](Storage::payload_ptr) are valid for
/// reads and writes of a `T` and aligned for it, for as long as the slot
/// exists. Moving the slot may move the payload along with it. The same holds
/// for [`slot_like`](Storage::slot_like) with respect to the given layout.
pub trait Storage: sealed_storage::Sealed {
    /// The memory a container embeds to hold its payload.
    type Slot;

    /// Obtains an uninitialized slot suitable for a `T`.
    ///
    /// Fails only if heap memory was needed and could not be allocated.
    fn slot_for<T>() -> Result<Self::Slot, AllocError>;

    /// Obtains an uninitialized slot of the same kind as `slot`, suitable for
    /// a payload with the given `layout`.
    ///
    /// Used when copying a container whose payload type is not statically
    /// known. `layout` must be the layout of the payload stored in `slot`.
    fn slot_like(slot: &Self::Slot, layout: Layout) -> Result<Self::Slot, AllocError>;

    /// Returns a pointer to the payload memory of the slot.
    fn payload_ptr(slot: &Self::Slot) -> NonNull<Erased>;

    /// Reports where the payload memory of the slot lives.
    fn location(slot: &Self::Slot) -> StorageLocation;
}

/// Always store the payload on the heap.
///
/// Every container owns exactly one allocation sized by the payload type.
/// Zero-sized payloads are the exception; they never allocate.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Remote;

impl Storage for Remote {
    type Slot = HeapBlock;

    #[inline]
    fn slot_for<T>() -> Result<HeapBlock, AllocError> {
        HeapBlock::try_alloc_for::<T>()
    }

    #[inline]
    fn slot_like(_slot: &HeapBlock, layout: Layout) -> Result<HeapBlock, AllocError> {
        HeapBlock::try_alloc(layout)
    }

    #[inline]
    fn payload_ptr(slot: &HeapBlock) -> NonNull<Erased> {
        slot.as_ptr()
    }

    #[inline]
    fn location(_slot: &HeapBlock) -> StorageLocation {
        StorageLocation::Heap
    }
}

/// Always store the payload inline in a buffer of `N` bytes.
///
/// Never allocates. Constructing a container from a payload that is larger
/// than `N` bytes, or aligned to more than [`INLINE_ALIGN`], fails to compile.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Local<const N: usize>;

impl<const N: usize> Storage for Local<N> {
    type Slot = InlineBuffer<N>;

    #[inline]
    fn slot_for<T>() -> Result<InlineBuffer<N>, AllocError> {
        const {
            assert!(
                InlineBuffer::<N>::fits::<T>(),
                "payload does not fit in the inline buffer of this storage policy"
            );
        }
        Ok(InlineBuffer::new())
    }

    #[inline]
    fn slot_like(_slot: &InlineBuffer<N>, _layout: Layout) -> Result<InlineBuffer<N>, AllocError> {
        Ok(InlineBuffer::new())
    }

    #[inline]
    fn payload_ptr(slot: &InlineBuffer<N>) -> NonNull<Erased> {
        slot.as_ptr()
    }

    #[inline]
    fn location(_slot: &InlineBuffer<N>) -> StorageLocation {
        StorageLocation::Inline
    }
}

/// Store the payload inline when it fits in `N` bytes, on the heap otherwise.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct Sbo<const N: usize>;

/// Slot of the [`Sbo`] storage policy.
pub enum SboSlot<const N: usize> {
    /// The payload fits and is stored inline.
    Inline(InlineBuffer<N>),
    /// The payload is too large or too aligned and lives on the heap.
    Heap(HeapBlock),
}

impl<const N: usize> Storage for Sbo<N> {
    type Slot = SboSlot<N>;

    #[inline]
    fn slot_for<T>() -> Result<SboSlot<N>, AllocError> {
        let fits = const { InlineBuffer::<N>::fits::<T>() };
        if fits {
            Ok(SboSlot::Inline(InlineBuffer::new()))
        } else {
            HeapBlock::try_alloc_for::<T>().map(SboSlot::Heap)
        }
    }

    #[inline]
    fn slot_like(slot: &SboSlot<N>, layout: Layout) -> Result<SboSlot<N>, AllocError> {
        match slot {
            SboSlot::Inline(_) => Ok(SboSlot::Inline(InlineBuffer::new())),
            SboSlot::Heap(_) => HeapBlock::try_alloc(layout).map(SboSlot::Heap),
        }
    }

    #[inline]
    fn payload_ptr(slot: &SboSlot<N>) -> NonNull<Erased> {
        match slot {
            SboSlot::Inline(buffer) => buffer.as_ptr(),
            SboSlot::Heap(block) => block.as_ptr(),
        }
    }

    #[inline]
    fn location(slot: &SboSlot<N>) -> StorageLocation {
        match slot {
            SboSlot::Inline(_) => StorageLocation::Inline,
            SboSlot::Heap(_) => StorageLocation::Heap,
        }
    }
}
