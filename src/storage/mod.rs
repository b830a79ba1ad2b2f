//! Where a [`Shape`](crate::Shape) keeps its value.
//!
//! A storage is a type parameter of [`Shape`](crate::Shape) and
//! [`Shapes`](crate::Shapes), so the choice is made at compile time, per use
//! site, without any runtime branching:
//!
//! - [`Heap`] (the default): one allocation per shape, any size.
//! - [`Inline<B>`]: no allocation; the value is embedded in the handle, in a
//!   buffer shaped like `B` ([`DefaultBuffer`] is 128 bytes aligned to 16).
//! - [`&Pool<B>`](Pool): fixed-size blocks from a pool the caller owns.
//!
//! Bounded storages check the size and alignment of every value they are
//! given when the construction is compiled:
//!
//! ```
//! use polyshape::{Draw, Shape, storage::{Align8, Inline}};
//!
//! #[derive(Clone)]
//! struct Point(i32, i32);
//!
//! impl Draw for Point {
//!     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
//!         write!(canvas, "({}, {})", self.0, self.1)
//!     }
//! }
//!
//! // 8 bytes of vtable pointer plus 8 bytes of point
//! let shape: Shape<Inline<Align8<16>>> = Shape::inline(Point(1, 2));
//! assert_eq!(shape.to_string(), "(1, 2)");
//! ```
//!
//! Storing a `Point` in an `Inline<Align8<8>>` would stop the build with
//! "the value is too large for this storage".
//!
//! # Custom Storages
//!
//! Implement [`Storage`] to plug in any other allocation policy. The
//! [`Pool`] in this module is written exactly the way a downstream
//! implementation would be.

mod pool;

pub use polyshape_internals::storage::{
    Align8, Align16, AllocationError, DEFAULT_INLINE_ALIGNMENT, DEFAULT_INLINE_CAPACITY,
    DefaultBuffer, Heap, Inline, InlineSlot, Storage, handle_allocation_error,
};

pub use self::pool::{Pool, PoolSlot};

/// A [`Shape`](crate::Shape) placed in a block of a [`Pool`].
pub type PooledShape<'p, B = DefaultBuffer> = crate::Shape<&'p Pool<B>>;
