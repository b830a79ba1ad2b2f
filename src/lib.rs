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

//! Value-semantic type erasure for drawable shapes.
//!
//! ## Overview
//!
//! This crate lets you store values of unrelated types behind one uniform,
//! owning handle, [`Shape`], and draw any of them through one function. The
//! stored types share no base trait object and need no registration: a type
//! is storable as soon as it implements [`Draw`] and [`Clone`].
//!
//! Unlike a `Box<dyn Draw>`, a [`Shape`] is a *value*: cloning it deep-copies
//! the stored value, and where the value lives is a type parameter. It can be
//! heap-allocated, placed by a caller-supplied allocation policy, or embedded
//! directly in the handle without any allocation at all.
//!
//! ## Quick Example
//!
//! ```
//! use core::fmt::Write;
//!
//! use polyshape::prelude::*;
//!
//! #[derive(Clone)]
//! struct Circle {
//!     radius: f64,
//! }
//!
//! impl Draw for Circle {
//!     fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
//!         writeln!(canvas, "circle: radius={}", self.radius)
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct Square {
//!     side: f64,
//! }
//!
//! impl Draw for Square {
//!     fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
//!         writeln!(canvas, "square: side={}", self.side)
//!     }
//! }
//!
//! let mut shapes = Shapes::new();
//! shapes.push(Shape::new(Circle { radius: 2.3 }));
//! shapes.push(Shape::with_strategy(
//!     Square { side: 1.2 },
//!     |square: &Square, canvas: &mut dyn Write| writeln!(canvas, "a square of {}", square.side),
//! ));
//!
//! let mut canvas = String::new();
//! draw_all(&shapes, &mut canvas).unwrap();
//! assert_eq!(canvas, "circle: radius=2.3\na square of 1.2\n");
//! ```
//!
//! For complete programs, see the `demos` directory in the repository.
//!
//! ## Core Concepts
//!
//! A [`Shape`] owns exactly one *adapter*: the stored value, a
//! [`DrawStrategy`] that says how to draw it, and a pointer to a static table
//! of the operations the handle needs (draw, clone, relocate, drop). The
//! concrete type is resolved once, when the shape is created. From then on
//! every operation is a single indirect call.
//!
//! The **strategy** defaults to [`FreeDraw`], which calls the value's own
//! [`Draw`] implementation and occupies no space. Passing an explicit
//! strategy, such as a closure, overrides drawing for that one value without
//! touching its type.
//!
//! The **storage** decides where the adapter lives:
//!
//! | Storage | Allocation | Capacity | Failure |
//! |---|---|---|---|
//! | [`Heap`] | one global-allocator block per shape | none | out of memory is fatal |
//! | [`&Pool<B>`](storage::Pool) | a block of a caller-owned pool | `size_of::<B>()` | an oversized value fails to compile; an exhausted pool is an error |
//! | [`Inline<B>`](Inline) | none, the adapter is embedded in the handle | `size_of::<B>()` | an oversized value fails to compile |
//!
//! Any other policy can be plugged in by implementing [`Storage`].
//!
//! For implementation details, see the [`polyshape-internals`] crate.
//!
//! [`polyshape-internals`]: polyshape_internals
//!
//! ## Compile-time Checks
//!
//! Wrapping a value that does not implement [`Draw`] is a type error.
//! Wrapping a value whose adapter exceeds the size or alignment of a bounded
//! storage stops the build when that construction is compiled; see
//! [`Storage::try_create`].
//!
//! ## Errors
//!
//! Constructors come in two forms. The plain forms ([`Shape::new`],
//! [`Clone::clone`], ...) treat a runtime allocation failure as fatal, the
//! way the standard collections do. The `try_` forms return a
//! [`rootcause::Report`] with an [`AllocationError`] context.
//!
//! ## Logging
//!
//! The [`Pool`](storage::Pool) storage emits [`tracing`] events when blocks
//! are taken and returned. No other part of the crate logs.

extern crate alloc;

pub mod handlers;
pub mod prelude;
mod shape;
pub mod shapes;
pub mod storage;

pub use polyshape_internals::handlers::{Draw, DrawStrategy, FreeDraw};

pub use self::{
    shape::{owned::Shape, ref_::ShapeRef},
    shapes::{Shapes, draw_all},
    storage::{AllocationError, Heap, Inline, Storage},
};

/// A [`Shape`] whose adapter is embedded in the handle, in the default
/// 128-byte buffer aligned to 16.
pub type InlineShape = Shape<Inline>;

/// Draws anything drawable onto the canvas.
///
/// This is the one entry point that works uniformly over plain values,
/// [`Shape`]s with any storage, [`ShapeRef`]s and whole [`Shapes`]
/// collections.
///
/// # Examples
///
/// ```
/// use core::fmt::Write;
///
/// use polyshape::{Draw, Shape, draw};
///
/// #[derive(Clone)]
/// struct Dot;
///
/// impl Draw for Dot {
///     fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
///         canvas.write_str(".")
///     }
/// }
///
/// let mut canvas = String::new();
/// draw(&Dot, &mut canvas).unwrap();
/// draw(&Shape::new(Dot), &mut canvas).unwrap();
/// assert_eq!(canvas, "..");
/// ```
#[inline]
pub fn draw<T: Draw + ?Sized>(drawable: &T, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    drawable.draw(canvas)
}
