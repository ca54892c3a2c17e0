//! A [`Vehicle`](crate::Vehicle) alternative built on a trait object.
//!
//! [`BoxedVehicle`] offers the same value semantics as
//! [`Vehicle`](crate::Vehicle) but lets the compiler build the dispatch table:
//! every payload is wrapped in a private adapter implementing an object-safe
//! trait, and the container owns one `Box` of that trait object.

use alloc::boxed::Box;
use core::any::{Any, TypeId};

use erased_vehicle_internals::capability::Accelerate;

/// Object-safe view of a payload.
trait VehicleConcept {
    /// Forwards to [`Accelerate::accelerate`].
    fn accelerate(&mut self);

    /// Clones the payload into a new box.
    fn clone_boxed(&self) -> Box<dyn VehicleConcept>;

    /// Returns the [`core::any::type_name`] of the payload.
    fn type_name(&self) -> &'static str;

    /// Returns the payload as [`Any`].
    fn as_any(&self) -> &dyn Any;

    /// Returns the payload as mutable [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Adapter implementing [`VehicleConcept`] for a concrete payload.
struct VehicleModel<T> {
    /// The wrapped payload
    vehicle: T,
}

impl<T> VehicleConcept for VehicleModel<T>
where
    T: Accelerate + Clone + 'static,
{
    fn accelerate(&mut self) {
        self.vehicle.accelerate();
    }

    fn clone_boxed(&self) -> Box<dyn VehicleConcept> {
        Box::new(VehicleModel {
            vehicle: self.vehicle.clone(),
        })
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        &self.vehicle
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.vehicle
    }
}

/// A value of any type implementing [`Accelerate`], dispatched through a
/// compiler-generated vtable.
///
/// Behaves like [`Vehicle`](crate::Vehicle) from the outside. Every instance
/// owns exactly one heap allocation (none for zero-sized payloads). Allocation
/// failure is handled by the global allocation error handler, as with any
/// [`Box`].
///
/// # Examples
///
/// ```
/// use erased_vehicle::prelude::*;
///
/// #[derive(Clone)]
/// struct Plane {
///     altitude: u32,
/// }
///
/// impl Accelerate for Plane {
///     fn accelerate(&mut self) {
///         self.altitude += 1000;
///     }
/// }
///
/// let mut plane = BoxedVehicle::new(Plane { altitude: 0 });
/// let copy = plane.clone();
/// plane.accelerate();
///
/// assert_eq!(plane.downcast_ref::<Plane>().unwrap().altitude, 1000);
/// assert_eq!(copy.downcast_ref::<Plane>().unwrap().altitude, 0);
/// ```
pub struct BoxedVehicle {
    /// The boxed adapter around the payload
    inner: Box<dyn VehicleConcept>,
}

impl BoxedVehicle {
    /// Creates a new [`BoxedVehicle`] owning `vehicle`.
    #[must_use]
    pub fn new<T>(vehicle: T) -> Self
    where
        T: Accelerate + Clone + 'static,
    {
        Self::from_inner(Box::new(VehicleModel { vehicle }), "new")
    }

    /// Wraps a freshly boxed adapter.
    fn from_inner(inner: Box<dyn VehicleConcept>, operation: &'static str) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            operation = operation,
            type_name = inner.type_name(),
            "boxed vehicle payload"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = operation;

        Self { inner }
    }

    /// Calls [`Accelerate::accelerate`] on the payload.
    #[inline]
    pub fn accelerate(&mut self) {
        self.inner.accelerate();
    }

    /// Returns the [`TypeId`] of the payload.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.inner.as_any().type_id()
    }

    /// Returns the [`core::any::type_name`] of the payload.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }

    /// Returns `true` if the payload is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    /// Returns a reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref()
    }

    /// Returns a mutable reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.as_any_mut().downcast_mut()
    }
}

impl Clone for BoxedVehicle {
    fn clone(&self) -> Self {
        Self::from_inner(self.inner.clone_boxed(), "clone")
    }
}

impl core::fmt::Debug for BoxedVehicle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoxedVehicle")
            .field("type_name", &self.type_name())
            .finish()
    }
}
