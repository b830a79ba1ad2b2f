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
//! Internal implementation crate for [`polyshape`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased data structures and unsafe
//! operations that power the [`polyshape`] value container. It provides
//! type erasure through a hand-written vtable, so that values of unrelated
//! types can be stored behind one handle and drawn through one function.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`polyshape`] crate, not this one.
//!
//! # Architecture
//!
//! - **[`shape`]**: The adapter layer
//!   - [`RawShape`]: Owned shape placed by some [`Storage`]
//!   - [`RawShapeRef`]: Borrowed reference to an owned shape
//!   - [`RawShapeBorrow`]: Non-owning view over either a plain value or a
//!     shape
//!   - [`ShapeData`]: `#[repr(C)]` adapter pairing a payload with its
//!     strategy behind a vtable pointer
//!   - [`ShapeVtable`]: Function pointers for type-erased dispatch
//!
//! - **[`storage`]**: Where the adapter lives
//!   - [`Storage`]: The allocation contract, including the compile-time
//!     capacity check
//!   - [`Heap`]: One global-allocator block per shape
//!   - [`Inline`]: A fixed buffer embedded in the handle itself
//!
//! - **[`handlers`]**: The capability and override traits
//!   - [`Draw`]: What a payload type must provide
//!   - [`DrawStrategy`]: What a per-value override must provide
//!
//! # Safety Strategy
//!
//! When we erase `ShapeData<Circle, FreeDraw>` to
//! `ShapeData<Erased, Erased>`, the vtable function pointers must still match
//! the concrete types stored in memory.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **`#[repr(C)]` layout**: The vtable pointer is always the first field,
//!   so it can be read without knowing the payload type
//! - **Documented vtable contracts**: Each vtable method specifies exactly when
//!   it can be safely called
//!
//! [`polyshape`]: https://docs.rs/polyshape/latest/polyshape/
//! [`ShapeData`]: shape::data::ShapeData
//! [`ShapeVtable`]: shape::vtable::ShapeVtable
//! [`Storage`]: storage::Storage
//! [`Heap`]: storage::Heap
//! [`Inline`]: storage::Inline
//! [`Draw`]: handlers::Draw
//! [`DrawStrategy`]: handlers::DrawStrategy

extern crate alloc;

pub mod handlers;
mod shape;
pub mod storage;
mod util;

pub use shape::{RawShape, RawShapeBorrow, RawShapeRef};
