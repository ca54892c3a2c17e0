//! Vtable for type-erased vehicle payloads.
//!
//! This module contains the [`ValueVtable`] which enables calling the
//! capability, cloning and dropping a payload after its concrete type `T` has
//! been erased. The vtable stores function pointers that dispatch to the
//! correct typed implementations.
//!
//! The fields of [`ValueVtable`] are private to this module. This visibility
//! restriction guarantees the safety invariant: **every function pointer in a
//! vtable was instantiated with the same type `T`, and `layout` is the layout
//! of that `T`**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are only created as
//! `&'static` references via [`ValueVtable::new`], which pairs the function
//! pointers with a specific type `T` at compile time. Copying a vtable by
//! value (as [`LocalTable`] does) preserves the pairing since the copy cannot
//! be modified afterwards.
//!
//! [`LocalTable`]: crate::dispatch::LocalTable

use core::{alloc::Layout, any::TypeId, ptr::NonNull};

use crate::{capability::Accelerate, util::Erased};

/// Vtable for type-erased payload operations.
///
/// Contains function pointers for performing operations on a payload without
/// knowing its concrete type at compile time.
///
/// # Safety
///
/// The following safety invariants are guaranteed to be upheld as long as this
/// struct exists:
///
/// * The fields `accelerate`, `drop_in_place` and `clone_into` all point to the
///   functions defined below
/// * The concrete pointers are all instantiated with the same payload type `T`
///   that was used to create this `ValueVtable`, and `layout` equals
///   `Layout::new::<T>()`.
#[derive(Clone, Copy)]
pub struct ValueVtable {
    /// Gets the [`TypeId`] of the payload type that was used to create this
    /// [`ValueVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the payload type.
    type_name: fn() -> &'static str,
    /// Calls [`Accelerate::accelerate`] on the payload behind the pointer.
    accelerate: unsafe fn(NonNull<Erased>),
    /// Runs the destructor of the payload behind the pointer in place.
    drop_in_place: unsafe fn(NonNull<Erased>),
    /// Clones the payload behind the first pointer into the uninitialized
    /// memory behind the second pointer.
    clone_into: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Size and alignment of the payload type.
    layout: Layout,
}

impl ValueVtable {
    /// Creates a new [`ValueVtable`] for the payload type `T`.
    ///
    /// The table is a compile-time constant with `'static` lifetime, so
    /// handing out references to it never allocates.
    #[inline]
    pub const fn new<T: Accelerate + Clone + 'static>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                accelerate: accelerate::<T>,
                drop_in_place: drop_in_place::<T>,
                clone_into: clone_into::<T>,
                layout: Layout::new::<T>(),
            }
        }
    }

    /// Gets the [`TypeId`] of the payload type that was used to create this
    /// [`ValueVtable`].
    #[inline]
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the payload type that was used to
    /// create this [`ValueVtable`].
    #[inline]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// The layout of the payload type.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// The size in bytes of the payload type.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// The alignment in bytes of the payload type.
    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Returns the raw `accelerate` entry.
    ///
    /// Used by dispatch shapes that keep a copy of the hot entry inline.
    #[inline]
    pub(crate) fn accelerate_fn(&self) -> unsafe fn(NonNull<Erased>) {
        self.accelerate
    }

    /// Calls [`T::accelerate`] on the payload behind `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized instance of the payload type this
    ///    [`ValueVtable`] was created for.
    /// 2. No other references to that payload are alive for the duration of
    ///    the call.
    ///
    /// [`T::accelerate`]: Accelerate::accelerate
    #[inline]
    pub(crate) unsafe fn accelerate(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.accelerate` points to the function
        // `accelerate::<T>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe {
            (self.accelerate)(ptr);
        }
    }

    /// Runs the destructor of the payload behind `ptr` without releasing the
    /// memory it lives in.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized instance of the payload type this
    ///    [`ValueVtable`] was created for.
    /// 2. The payload is not used after calling this method, other than to
    ///    release the memory backing it.
    #[inline]
    pub(crate) unsafe fn drop_in_place(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.drop_in_place` points to the function
        // `drop_in_place::<T>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe {
            (self.drop_in_place)(ptr);
        }
    }

    /// Clones the payload behind `src` into the memory behind `dst`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `src` points to an initialized instance of the payload type this
    ///    [`ValueVtable`] was created for.
    /// 2. `dst` is valid for writes of [`Self::layout`] and properly aligned
    ///    for it.
    /// 3. `dst` does not currently hold a value that needs dropping; it will be
    ///    overwritten without running a destructor.
    #[inline]
    pub(crate) unsafe fn clone_into(&self, src: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: We know that `self.clone_into` points to the function
        // `clone_into::<T>` below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.clone_into)(src, dst);
        }
    }
}

/// Calls [`Accelerate::accelerate`] on the payload.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `T`
/// 2. No other references to the `T` are alive for the duration of the call
unsafe fn accelerate<T: Accelerate>(ptr: NonNull<Erased>) {
    let mut ptr: NonNull<T> = ptr.cast::<T>();
    // SAFETY:
    // 1. The pointer is valid, aligned and initialized (guaranteed by caller)
    // 2. The access is unique (guaranteed by caller)
    let payload: &mut T = unsafe { ptr.as_mut() };
    payload.accelerate();
}

/// Drops the `T` behind the pointer in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `ptr` points to an initialized `T`
/// 2. The `T` is not used after calling this function
unsafe fn drop_in_place<T>(ptr: NonNull<Erased>) {
    let ptr: *mut T = ptr.cast::<T>().as_ptr();
    // SAFETY:
    // 1. The pointer is valid, aligned and initialized (guaranteed by caller)
    // 2. The value is never accessed again (guaranteed by caller)
    unsafe {
        core::ptr::drop_in_place(ptr);
    }
}

/// Clones the `T` behind `src` into `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` points to an initialized `T`
/// 2. `dst` is valid for writes of a `T` and properly aligned
/// 3. `dst` does not hold a value that needs dropping
unsafe fn clone_into<T: Clone>(src: NonNull<Erased>, dst: NonNull<Erased>) {
    let src: NonNull<T> = src.cast::<T>();
    // SAFETY:
    // 1. The source is valid, aligned and initialized (guaranteed by caller)
    let cloned: T = unsafe { src.as_ref() }.clone();

    let dst: *mut T = dst.cast::<T>().as_ptr();
    // SAFETY:
    // 2. The destination is valid for writes and aligned (guaranteed by caller)
    // 3. Nothing is overwritten that would need dropping (guaranteed by caller)
    unsafe {
        dst.write(cloned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Bike(u8);
    impl Accelerate for Bike {
        fn accelerate(&mut self) {
            self.0 += 1;
        }
    }

    #[derive(Clone)]
    struct Rocket([u64; 3]);
    impl Accelerate for Rocket {
        fn accelerate(&mut self) {
            self.0[0] += 10;
        }
    }

    #[test]
    fn test_value_vtable_eq() {
        let vtable1 = ValueVtable::new::<Bike>();
        let vtable2 = ValueVtable::new::<Bike>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
        assert!(!core::ptr::eq(vtable1, ValueVtable::new::<Rocket>()));
    }

    #[test]
    fn test_value_vtable_identity_and_layout() {
        let vtable = ValueVtable::new::<Rocket>();
        assert_eq!(vtable.type_id(), TypeId::of::<Rocket>());
        assert!(vtable.type_name().ends_with("Rocket"));
        assert_eq!(vtable.size(), core::mem::size_of::<Rocket>());
        assert_eq!(vtable.align(), core::mem::align_of::<Rocket>());
        assert_eq!(vtable.layout(), Layout::new::<Rocket>());
    }

    #[test]
    fn test_value_vtable_dispatch() {
        let vtable = ValueVtable::new::<Bike>();
        let mut bike = Bike(1);
        let mut copy = core::mem::MaybeUninit::<Bike>::uninit();

        let src = NonNull::from(&mut bike).cast::<Erased>();
        let dst = NonNull::from(&mut copy).cast::<Erased>();

        // SAFETY: `src` points to an initialized `Bike` that is not otherwise
        // borrowed, and `dst` is an uninitialized `Bike` slot.
        unsafe {
            vtable.accelerate(src);
        }
        // SAFETY: See above.
        unsafe {
            vtable.clone_into(src, dst);
        }
        // SAFETY: `clone_into` initialized `copy`.
        let mut copy = unsafe { copy.assume_init() };

        assert_eq!(bike.0, 2);
        assert_eq!(copy.0, 2);
        copy.accelerate();
        assert_eq!(bike.0, 2);
        assert_eq!(copy.0, 3);
    }
}
