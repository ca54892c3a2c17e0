//! Dispatch table shapes.
//!
//! A container keeps a dispatch handle next to its payload. The handle decides
//! how the per-type [`ValueVtable`] is reached:
//!
//! - [`SharedTable`]: a `&'static` reference to the table. One pointer per
//!   instance, two loads per call.
//! - [`LocalTable`]: a full copy of the table stored by value in every
//!   instance. Largest footprint, one load per call.
//! - [`JoinedTable`]: the `accelerate` entry copied inline next to a
//!   `&'static` reference used for everything else. One extra pointer per
//!   instance, one load on the hot path.
//!
//! All shapes are built from the same compile-time table, so they are always
//! in sync with the payload type they were created for.

use core::ptr::NonNull;

use crate::{capability::Accelerate, util::Erased, vtable::ValueVtable};

/// Keeps [`Dispatch`] implementable only inside this crate.
mod sealed_dispatch {
    /// Supertrait of [`Dispatch`](super::Dispatch) that cannot be named outside this crate.
    pub trait Sealed: Copy + 'static {}

    impl Sealed for super::SharedTable {}
    impl Sealed for super::LocalTable {}
    impl Sealed for super::JoinedTable {}
}

/// How a container reaches the operation table of its payload.
///
/// This trait is sealed and cannot be implemented outside of this crate. Use
/// one of [`SharedTable`], [`LocalTable`] or [`JoinedTable`].
pub trait Dispatch: sealed_dispatch::Sealed {
    /// Creates the handle for the payload type `T`.
    fn for_type<T: Accelerate + Clone + 'static>() -> Self;

    /// Returns the full operation table.
    fn vtable(&self) -> &ValueVtable;

    /// Calls the `accelerate` entry of the table on `ptr`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `ptr` points to an initialized instance of the payload type this
    ///    handle was created for.
    /// 2. No other references to that payload are alive for the duration of
    ///    the call.
    unsafe fn accelerate(&self, ptr: NonNull<Erased>);
}

/// Per-instance reference to the shared, per-type table.
#[derive(Copy, Clone)]
pub struct SharedTable {
    /// The table of the payload type
    vtable: &'static ValueVtable,
}

impl Dispatch for SharedTable {
    #[inline]
    fn for_type<T: Accelerate + Clone + 'static>() -> Self {
        Self {
            vtable: ValueVtable::new::<T>(),
        }
    }

    #[inline]
    fn vtable(&self) -> &ValueVtable {
        self.vtable
    }

    #[inline]
    unsafe fn accelerate(&self, ptr: NonNull<Erased>) {
        // SAFETY:
        // 1. The table was created for the payload type (guaranteed by the caller)
        // 2. Guaranteed by the caller
        unsafe {
            self.vtable.accelerate(ptr);
        }
    }
}

/// Per-instance copy of the whole table.
#[derive(Copy, Clone)]
pub struct LocalTable {
    /// A by-value copy of the table of the payload type
    vtable: ValueVtable,
}

impl Dispatch for LocalTable {
    #[inline]
    fn for_type<T: Accelerate + Clone + 'static>() -> Self {
        Self {
            vtable: *ValueVtable::new::<T>(),
        }
    }

    #[inline]
    fn vtable(&self) -> &ValueVtable {
        &self.vtable
    }

    #[inline]
    unsafe fn accelerate(&self, ptr: NonNull<Erased>) {
        // SAFETY:
        // 1. The table was copied from the table of the payload type (guaranteed
        //    by the caller)
        // 2. Guaranteed by the caller
        unsafe {
            self.vtable.accelerate(ptr);
        }
    }
}

/// Inline copy of the hot `accelerate` entry joined with a reference to the
/// shared table.
#[derive(Copy, Clone)]
pub struct JoinedTable {
    /// The table of the payload type, used for everything but `accelerate`
    remote: &'static ValueVtable,
    /// Copy of `remote`'s `accelerate` entry
    ///
    /// # Safety
    ///
    /// Always equal to the `accelerate` entry of `remote`.
    accelerate: unsafe fn(NonNull<Erased>),
}

impl Dispatch for JoinedTable {
    #[inline]
    fn for_type<T: Accelerate + Clone + 'static>() -> Self {
        let remote = ValueVtable::new::<T>();
        Self {
            remote,
            accelerate: remote.accelerate_fn(),
        }
    }

    #[inline]
    fn vtable(&self) -> &ValueVtable {
        self.remote
    }

    #[inline]
    unsafe fn accelerate(&self, ptr: NonNull<Erased>) {
        // SAFETY: `self.accelerate` is the `accelerate` entry of the table for the
        // payload type, so its requirements are the ones of
        // `ValueVtable::accelerate`:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        unsafe {
            (self.accelerate)(ptr);
        }
    }
}
