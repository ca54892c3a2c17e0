//! The type-erased, owning payload container.
//!
//! This module encapsulates the fields of [`RawValue`], ensuring they are only
//! visible within this module. This visibility restriction guarantees the
//! safety invariant: **the dispatch handle was created for exactly the type of
//! the payload stored in the slot**.
//!
//! # Safety Invariant
//!
//! Both fields are set together in [`RawValue::try_new`] (from the same `T`)
//! or in [`RawValue::try_clone`] (copied from a value that upholds the
//! invariant), and neither can be modified afterwards. The slot holds an
//! initialized payload from the end of construction until the start of the
//! [`Drop`] implementation.
//!
//! # Type Erasure
//!
//! The concrete payload type is only known inside the constructor. From then
//! on the container relies on the [`ValueVtable`] reachable through its
//! dispatch handle to accelerate, clone and drop the payload, and on the
//! table's layout to size heap blocks for copies.

use core::{any::TypeId, marker::PhantomData};

use crate::{
    capability::Accelerate,
    dispatch::Dispatch,
    error::AllocError,
    storage::{Storage, StorageLocation},
    vtable::ValueVtable,
};

/// An owned payload of some type `T: Accelerate + Clone + 'static`, though we
/// do not know which actual `T` it is.
///
/// `S` decides where the payload lives and `D` how its operation table is
/// reached. Dropping a [`RawValue`] drops the payload exactly once and then
/// releases its heap block, if it has one.
///
/// The type is neither `Send` nor `Sync`, since the erased payload might not
/// be either.
pub struct RawValue<S: Storage, D: Dispatch> {
    /// Handle to the operation table of the payload
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The handle was created with `D::for_type::<T>()` where `T` is the
    ///    type of the payload stored in `slot`.
    dispatch: D,
    /// Memory holding the payload
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The slot was obtained from `S::slot_for::<T>()` or from
    ///    `S::slot_like` with the layout of `T`.
    /// 2. The slot holds an initialized `T` for the entire lifetime of this
    ///    object, except during the execution of the `Drop` implementation.
    slot: S::Slot,
    /// Opts out of `Send` and `Sync`
    _marker: PhantomData<*mut ()>,
}

impl<S: Storage, D: Dispatch> RawValue<S, D> {
    /// Creates a new [`RawValue`] owning `value`.
    ///
    /// Returns an [`AllocError`] if the storage policy needed heap memory and
    /// none could be allocated. In that case `value` is dropped.
    #[inline]
    pub fn try_new<T>(value: T) -> Result<Self, AllocError>
    where
        T: Accelerate + Clone + 'static,
    {
        let slot = S::slot_for::<T>()?;
        let ptr: *mut T = S::payload_ptr(&slot).cast::<T>().as_ptr();

        // SAFETY: `S::slot_for::<T>` returns memory that is valid for writes of a
        // `T` and aligned for it. The slot is fresh, so nothing is overwritten.
        unsafe {
            ptr.write(value);
        }

        Ok(Self {
            // SAFETY:
            // 1. The handle is created for the type that was just written.
            dispatch: D::for_type::<T>(),
            // SAFETY:
            // 1. The slot comes from `S::slot_for::<T>`.
            // 2. The payload was initialized above.
            slot,
            _marker: PhantomData,
        })
    }

    /// Creates an independent copy of this value by cloning the payload into a
    /// fresh slot of the same kind.
    ///
    /// Returns an [`AllocError`] if heap memory for the copy could not be
    /// allocated. If the payload's `clone` panics, the fresh slot is released
    /// and nothing is dropped twice.
    #[inline]
    pub fn try_clone(&self) -> Result<Self, AllocError> {
        let vtable = self.vtable();
        let slot = S::slot_like(&self.slot, vtable.layout())?;

        let src = S::payload_ptr(&self.slot);
        let dst = S::payload_ptr(&slot);

        // SAFETY:
        // 1. `src` points to the initialized payload this table was created for
        //    (guaranteed by the invariants of this type).
        // 2. `dst` comes from `S::slot_like` with the layout of the payload, so it is
        //    valid for writes and aligned.
        // 3. The slot is fresh, so nothing is overwritten.
        unsafe {
            vtable.clone_into(src, dst);
        }

        Ok(Self {
            // SAFETY:
            // 1. The payload in the new slot has the same type as ours.
            dispatch: self.dispatch,
            // SAFETY:
            // 1. The slot comes from `S::slot_like` with the layout of the payload.
            // 2. The payload was initialized by `clone_into` above.
            slot,
            _marker: PhantomData,
        })
    }

    /// Calls [`Accelerate::accelerate`] on the payload.
    #[inline]
    pub fn accelerate(&mut self) {
        let ptr = S::payload_ptr(&self.slot);

        // SAFETY:
        // 1. The handle was created for the payload type stored in the slot and the
        //    payload is initialized (guaranteed by the invariants of this type).
        // 2. We hold `&mut self`, so no other references to the payload exist.
        unsafe {
            self.dispatch.accelerate(ptr);
        }
    }

    /// Returns the operation table of the payload.
    #[inline]
    pub fn vtable(&self) -> &ValueVtable {
        self.dispatch.vtable()
    }

    /// Returns the [`TypeId`] of the payload.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.vtable().type_id()
    }

    /// Returns the [`core::any::type_name`] of the payload.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.vtable().type_name()
    }

    /// Reports where the payload lives.
    #[inline]
    pub fn location(&self) -> StorageLocation {
        S::location(&self.slot)
    }

    /// Returns a reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.type_id() != TypeId::of::<T>() {
            return None;
        }

        let ptr = S::payload_ptr(&self.slot).cast::<T>();
        // SAFETY: The payload is an initialized `T` (checked above and guaranteed
        // by the invariants of this type), and the returned reference borrows
        // `self`, so the payload outlives it and cannot be mutated meanwhile.
        Some(unsafe { ptr.as_ref() })
    }

    /// Returns a mutable reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.type_id() != TypeId::of::<T>() {
            return None;
        }

        let mut ptr = S::payload_ptr(&self.slot).cast::<T>();
        // SAFETY: The payload is an initialized `T` (checked above and guaranteed
        // by the invariants of this type), and the returned reference borrows
        // `self` mutably, so it is the only reference to the payload.
        Some(unsafe { ptr.as_mut() })
    }
}

impl<S: Storage, D: Dispatch> core::ops::Drop for RawValue<S, D> {
    #[inline]
    fn drop(&mut self) {
        let ptr = S::payload_ptr(&self.slot);

        // SAFETY:
        // 1. The payload is initialized and matches the table (guaranteed by the
        //    invariants of this type).
        // 2. The payload is not used afterwards; the slot only releases its memory
        //    when it is dropped right after this function returns.
        unsafe {
            self.vtable().drop_in_place(ptr);
        }
    }
}

impl<S: Storage, D: Dispatch> core::fmt::Debug for RawValue<S, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawValue")
            .field("type_name", &self.type_name())
            .field("location", &self.location())
            .finish()
    }
}
