//! Heap object headers.
//!
//! Every object the running program allocates, closures created by
//! `CreateFunction` included, starts with a [`GcCell`]. The header points
//! at the [`VTable`] describing the object and, in debug builds or with
//! the `gc-cell-id` feature, carries a unique allocation id.
//!
//! Objects whose vtable declares a finalizer must be registered with the
//! [`Heap`] before their header is constructed, and construction must
//! happen in registration order. [`Heap::allocate`] does both in the
//! right order; anything else that builds headers by hand is checked
//! with an assertion.

mod cell;
mod heap;

pub use cell::{CellId, Finalizer, GcCell, VTable};
pub use heap::Heap;
