//! The capability a concrete type must provide to be stored in a vehicle.
//!
//! This is the only operation dispatched through the type-erased tables. The
//! containers additionally require `Clone + 'static` so that payloads can be
//! copied and identified after their type has been erased.

/// Trait for types that can be accelerated.
///
/// Any type implementing this trait (and `Clone + 'static`) can be wrapped in
/// a vehicle container. The container never learns the concrete type; it only
/// knows how to call [`accelerate`](Accelerate::accelerate), how to clone the
/// value and how to drop it.
///
/// # Examples
///
/// ```
/// use erased_vehicle_internals::capability::Accelerate;
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
/// ```
pub trait Accelerate {
    /// Performs the type-specific acceleration.
    fn accelerate(&mut self);
}
