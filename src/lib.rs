#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Value-semantic polymorphic containers built on hand-written vtables.
//!
//! ## Overview
//!
//! This crate stores a value of any type implementing [`Accelerate`] in a
//! container that hides the value's concrete type. The container behaves like
//! a regular value: cloning it clones the payload, dropping it drops the
//! payload, and calling [`accelerate`](Vehicle::accelerate) runs the payload's
//! own implementation. Unlike `Box<dyn Trait>`, the dispatch table is built by
//! hand, which makes two things configurable:
//!
//! - **where the payload lives**: on the heap ([`Remote`]), inline in a fixed
//!   buffer ([`Local`]), or inline when small enough and on the heap otherwise
//!   ([`Sbo`])
//! - **how the table is reached**: through a shared pointer ([`SharedTable`]),
//!   through a per-instance copy ([`LocalTable`]), or with the hot entry
//!   copied inline ([`JoinedTable`])
//!
//! ## Quick Example
//!
//! ```
//! use erased_vehicle::prelude::*;
//!
//! #[derive(Clone)]
//! struct Car {
//!     make: String,
//!     year: u16,
//! }
//!
//! impl Accelerate for Car {
//!     fn accelerate(&mut self) {
//!         println!("Car::accelerate({} {})", self.make, self.year);
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct Plane {
//!     make: String,
//!     model: String,
//! }
//!
//! impl Accelerate for Plane {
//!     fn accelerate(&mut self) {
//!         println!("Plane::accelerate({} {})", self.make, self.model);
//!     }
//! }
//!
//! let mut vehicles: Vec<SboVehicle<64>> = vec![
//!     Vehicle::new(Car { make: "Audi".into(), year: 2017 }),
//!     Vehicle::new(Plane { make: "Boeing".into(), model: "747".into() }),
//! ];
//!
//! for vehicle in &mut vehicles {
//!     vehicle.accelerate();
//! }
//! ```
//!
//! ## Choosing Policies
//!
//! [`Vehicle<S, D>`] takes a storage policy `S` and a dispatch shape `D`. The
//! defaults (`Sbo<32>` and [`SharedTable`]) suit most payloads. The aliases
//! [`RemoteVehicle`], [`LocalVehicle`] and [`SboVehicle`] name the common
//! combinations.
//!
//! | Storage      | Allocations per instance          | Oversized payloads   |
//! |--------------|-----------------------------------|----------------------|
//! | [`Remote`]   | one (none for zero-sized types)   | accepted             |
//! | [`Local<N>`] | none                              | compile error        |
//! | [`Sbo<N>`]   | none if it fits, one otherwise    | moved to the heap    |
//!
//! [`BoxedVehicle`] provides the same behavior with a compiler-generated
//! vtable and exactly one box per instance.
//!
//! ## Errors
//!
//! Missing capabilities and oversized [`Local`] payloads are compile-time
//! errors. Heap allocation failure is the only runtime error:
//! [`Vehicle::new`] and [`Clone::clone`] hand it to
//! [`handle_alloc_error`](alloc::alloc::handle_alloc_error), while
//! [`Vehicle::try_new`] and [`Vehicle::try_clone`] return a
//! [`Report<AllocError>`](rootcause::Report) naming the payload type.
//!
//! ## Logging
//!
//! With the default `tracing` feature, construction and cloning emit `TRACE`
//! events and allocation failures emit `DEBUG` events through the [`tracing`]
//! crate.
//!
//! For implementation details, see the [`erased-vehicle-internals`] crate.
//!
//! [`erased-vehicle-internals`]: erased_vehicle_internals
//! [`tracing`]: https://docs.rs/tracing

extern crate alloc;

mod boxed;
pub mod prelude;
mod vehicle;

pub use erased_vehicle_internals::{
    AllocError, ValueVtable,
    capability::Accelerate,
    dispatch::{Dispatch, JoinedTable, LocalTable, SharedTable},
    storage::{INLINE_ALIGN, Local, Remote, Sbo, Storage, StorageLocation},
};

pub use self::{
    boxed::BoxedVehicle,
    vehicle::{DEFAULT_INLINE_CAPACITY, LocalVehicle, RemoteVehicle, SboVehicle, Vehicle},
};
