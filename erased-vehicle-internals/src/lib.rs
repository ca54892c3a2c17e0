#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`erased-vehicle`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased data structures and unsafe
//! operations that power the [`erased-vehicle`] container. It stores a value
//! of any type implementing [`Accelerate`] behind a hand-written operation
//! table instead of a trait object, and lets the caller choose where the value
//! lives and how the table is reached.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`erased-vehicle`] crate, not this
//! one.
//!
//! # Architecture
//!
//! - **[`capability`]**: the [`Accelerate`] trait every payload implements
//! - **[`ValueVtable`]**: per-type, compile-time constant table of function
//!   pointers (`accelerate`, `drop_in_place`, `clone_into`) plus the payload
//!   layout
//! - **[`dispatch`]**: how a container reaches its table
//!   - [`SharedTable`]: `&'static` reference
//!   - [`LocalTable`]: by-value copy
//!   - [`JoinedTable`]: hot entry inline, reference for the rest
//! - **[`storage`]**: where a container keeps its payload
//!   - [`Remote`]: always on the heap
//!   - [`Local`]: always inline, capacity checked at compile time
//!   - [`Sbo`]: inline when it fits, heap otherwise
//! - **[`RawValue`]**: the owning container tying a dispatch handle to a slot
//!
//! # Safety Strategy
//!
//! Type erasure requires careful handling to maintain Rust's type safety
//! guarantees. Once a `Car` is stored as untyped bytes, every function pointer
//! used on those bytes must have been instantiated for `Car`.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **Compile-time tables**: a [`ValueVtable`] can only be obtained from
//!   [`ValueVtable::new`], which instantiates every entry with the same type
//! - **Owning slots**: storage slots release their own memory on drop, so a
//!   container only has to drop its payload, and a half-built copy never leaks
//! - **Documented vtable contracts**: Each vtable method specifies exactly when
//!   it can be safely called
//!
//! [`erased-vehicle`]: https://docs.rs/erased-vehicle/latest/erased_vehicle/
//! [`Accelerate`]: capability::Accelerate
//! [`SharedTable`]: dispatch::SharedTable
//! [`LocalTable`]: dispatch::LocalTable
//! [`JoinedTable`]: dispatch::JoinedTable
//! [`Remote`]: storage::Remote
//! [`Local`]: storage::Local
//! [`Sbo`]: storage::Sbo

extern crate alloc;

pub mod capability;
pub mod dispatch;
mod error;
mod raw;
pub mod storage;
mod util;
mod vtable;

pub use self::{error::AllocError, raw::RawValue, util::Erased, vtable::ValueVtable};
