//! The [`Vehicle`] container and its policy aliases.

use alloc::{alloc::handle_alloc_error, format};
use core::any::TypeId;

use erased_vehicle_internals::{
    AllocError, RawValue, ValueVtable,
    capability::Accelerate,
    dispatch::{Dispatch, SharedTable},
    storage::{Local, Remote, Sbo, Storage, StorageLocation},
};
use rootcause::Report;

/// Inline capacity in bytes used by [`Vehicle`] when no storage policy is
/// named.
pub const DEFAULT_INLINE_CAPACITY: usize = 32;

/// A value of any type implementing [`Accelerate`], with its concrete type
/// erased behind a hand-written operation table.
///
/// A [`Vehicle`] owns exactly one payload. Cloning a vehicle clones the
/// payload, dropping it drops the payload, and
/// [`accelerate`](Vehicle::accelerate) calls the payload's own
/// [`Accelerate::accelerate`], all without knowing the payload's type.
///
/// The two type parameters are independent policies:
///
/// - `S` decides where the payload lives: [`Remote`] (always on the heap),
///   [`Local<N>`] (always inline, `N` bytes) or [`Sbo<N>`] (inline when it
///   fits, heap otherwise).
/// - `D` decides how the operation table is reached: [`SharedTable`] (a
///   pointer per instance), [`LocalTable`] (a copy per instance) or
///   [`JoinedTable`] (the hot entry inline).
///
/// [`LocalTable`]: erased_vehicle_internals::dispatch::LocalTable
/// [`JoinedTable`]: erased_vehicle_internals::dispatch::JoinedTable
///
/// # Examples
///
/// ```
/// use erased_vehicle::prelude::*;
///
/// #[derive(Clone)]
/// struct Car {
///     speed: u32,
/// }
///
/// impl Accelerate for Car {
///     fn accelerate(&mut self) {
///         self.speed += 10;
///     }
/// }
///
/// let mut car: Vehicle = Vehicle::new(Car { speed: 0 });
/// let mut copy = car.clone();
///
/// car.accelerate();
/// copy.accelerate();
/// copy.accelerate();
///
/// assert_eq!(car.downcast_ref::<Car>().unwrap().speed, 10);
/// assert_eq!(copy.downcast_ref::<Car>().unwrap().speed, 20);
/// assert_eq!(car.storage(), StorageLocation::Inline);
/// ```
///
/// Types without the capability are rejected at compile time:
///
/// ```compile_fail
/// use erased_vehicle::prelude::*;
///
/// #[derive(Clone)]
/// struct Bicycle;
///
/// let bicycle: Vehicle = Vehicle::new(Bicycle);
/// ```
///
/// So are payloads that do not fit a [`Local`] buffer:
///
/// ```compile_fail
/// use erased_vehicle::prelude::*;
///
/// #[derive(Clone)]
/// struct Train {
///     cars: [u64; 16],
/// }
///
/// impl Accelerate for Train {
///     fn accelerate(&mut self) {}
/// }
///
/// let train: LocalVehicle<64> = Vehicle::new(Train { cars: [0; 16] });
/// ```
pub struct Vehicle<S: Storage = Sbo<DEFAULT_INLINE_CAPACITY>, D: Dispatch = SharedTable> {
    /// The type-erased payload
    raw: RawValue<S, D>,
}

/// A [`Vehicle`] that always stores its payload on the heap.
pub type RemoteVehicle = Vehicle<Remote, SharedTable>;

/// A [`Vehicle`] that always stores its payload inline in `N` bytes.
pub type LocalVehicle<const N: usize> = Vehicle<Local<N>, SharedTable>;

/// A [`Vehicle`] that stores payloads of up to `N` bytes inline and larger
/// ones on the heap.
pub type SboVehicle<const N: usize> = Vehicle<Sbo<N>, SharedTable>;

impl<S: Storage, D: Dispatch> Vehicle<S, D> {
    /// Creates a new [`Vehicle`] owning `vehicle`.
    ///
    /// If the storage policy needs heap memory and the allocation fails, this
    /// calls [`handle_alloc_error`], the same way [`Box::new`] does. Use
    /// [`Vehicle::try_new`] to handle the failure instead.
    ///
    /// [`Box::new`]: alloc::boxed::Box::new
    #[must_use]
    pub fn new<T>(vehicle: T) -> Self
    where
        T: Accelerate + Clone + 'static,
    {
        match RawValue::try_new(vehicle) {
            Ok(raw) => Self::from_raw(raw, "new"),
            Err(error) => {
                log_allocation_failure(&error, core::any::type_name::<T>());
                handle_alloc_error(error.layout())
            }
        }
    }

    /// Creates a new [`Vehicle`] owning `vehicle`, reporting allocation
    /// failure as an error.
    ///
    /// On failure `vehicle` is dropped and the returned report names its
    /// type.
    ///
    /// # Out of memory
    ///
    /// Building the report allocates too. If the allocator cannot serve that
    /// small request either, the process aborts through the global allocation
    /// error handler, so this is not a way to survive complete memory
    /// exhaustion. It does recover from a payload allocation the allocator
    /// refuses while smaller requests still succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use erased_vehicle::prelude::*;
    ///
    /// #[derive(Clone)]
    /// struct Truck;
    ///
    /// impl Accelerate for Truck {
    ///     fn accelerate(&mut self) {}
    /// }
    ///
    /// let truck = RemoteVehicle::try_new(Truck).expect("allocation failed");
    /// assert!(truck.is::<Truck>());
    /// ```
    #[track_caller]
    pub fn try_new<T>(vehicle: T) -> Result<Self, Report<AllocError>>
    where
        T: Accelerate + Clone + 'static,
    {
        match RawValue::try_new(vehicle) {
            Ok(raw) => Ok(Self::from_raw(raw, "new")),
            Err(error) => Err(allocation_failed(error, core::any::type_name::<T>())),
        }
    }

    /// Creates an independent copy of this [`Vehicle`], reporting allocation
    /// failure as an error.
    ///
    /// The copy has the same storage location as the original. On failure the
    /// original is left untouched.
    ///
    /// Building the report allocates, with the same consequences as described
    /// for [`Vehicle::try_new`] when memory is completely exhausted.
    #[track_caller]
    pub fn try_clone(&self) -> Result<Self, Report<AllocError>> {
        match self.raw.try_clone() {
            Ok(raw) => Ok(Self::from_raw(raw, "clone")),
            Err(error) => Err(allocation_failed(error, self.type_name())),
        }
    }

    /// Wraps a freshly built [`RawValue`].
    fn from_raw(raw: RawValue<S, D>, operation: &'static str) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            operation = operation,
            type_name = raw.type_name(),
            storage = ?raw.location(),
            size = raw.vtable().size(),
            "stored vehicle payload"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = operation;

        Self { raw }
    }

    /// Calls [`Accelerate::accelerate`] on the payload.
    #[inline]
    pub fn accelerate(&mut self) {
        self.raw.accelerate();
    }

    /// Returns the [`TypeId`] of the payload.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.raw.type_id()
    }

    /// Returns the [`core::any::type_name`] of the payload.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.raw.type_name()
    }

    /// Returns `true` if the payload is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Returns a reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.raw.downcast_ref()
    }

    /// Returns a mutable reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.raw.downcast_mut()
    }

    /// Reports whether the payload lives inline or on the heap.
    #[inline]
    pub fn storage(&self) -> StorageLocation {
        self.raw.location()
    }

    /// Returns the operation table of the payload.
    ///
    /// Copies of a vehicle keep referring to the table of their source.
    #[inline]
    pub fn vtable(&self) -> &ValueVtable {
        self.raw.vtable()
    }
}

impl<S: Storage, D: Dispatch> Clone for Vehicle<S, D> {
    /// Clones the payload into a new [`Vehicle`].
    ///
    /// Calls [`handle_alloc_error`] if heap memory for the copy cannot be
    /// allocated. Use [`Vehicle::try_clone`] to handle the failure instead.
    fn clone(&self) -> Self {
        match self.raw.try_clone() {
            Ok(raw) => Self::from_raw(raw, "clone"),
            Err(error) => {
                log_allocation_failure(&error, self.type_name());
                handle_alloc_error(error.layout())
            }
        }
    }
}

impl<S: Storage, D: Dispatch> core::fmt::Debug for Vehicle<S, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Vehicle")
            .field("type_name", &self.type_name())
            .field("storage", &self.storage())
            .finish()
    }
}

/// Emits a debug event for a failed payload allocation.
fn log_allocation_failure(error: &AllocError, type_name: &'static str) {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        type_name = type_name,
        size = error.layout().size(),
        align = error.layout().align(),
        "failed to allocate vehicle storage"
    );
    #[cfg(not(feature = "tracing"))]
    let _ = (error, type_name);
}

/// Turns an [`AllocError`] into a report naming the payload type.
#[track_caller]
fn allocation_failed(error: AllocError, type_name: &'static str) -> Report<AllocError> {
    log_allocation_failure(&error, type_name);
    Report::new(error).attach(format!("Payload type: {type_name}"))
}
