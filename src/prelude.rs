//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use erased_vehicle::prelude::*;
//!
//! #[derive(Clone)]
//! struct Truck;
//!
//! impl Accelerate for Truck {
//!     fn accelerate(&mut self) {}
//! }
//!
//! let mut truck: RemoteVehicle = Vehicle::new(Truck);
//! truck.accelerate();
//! ```
//!
//! # What's Included
//!
//! - **[`Accelerate`]**: the capability every payload implements
//! - **[`Vehicle`]** and its aliases [`RemoteVehicle`], [`LocalVehicle`] and
//!   [`SboVehicle`]
//! - **[`BoxedVehicle`]**: the trait-object based alternative
//! - **[`StorageLocation`]**: the answer of [`Vehicle::storage`]

pub use crate::{
    Accelerate, BoxedVehicle, LocalVehicle, RemoteVehicle, SboVehicle, StorageLocation, Vehicle,
};
