//! Commonly used items for convenient importing.
//!
//! The prelude re-exports the handles, traits and functions most programs
//! need, so a single use statement is enough to define drawable types and
//! store them.
//!
//! # Usage
//!
//! ```rust
//! use polyshape::prelude::*;
//!
//! #[derive(Clone)]
//! struct Dot;
//!
//! impl Draw for Dot {
//!     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
//!         canvas.write_str(".")
//!     }
//! }
//!
//! let shapes: Shapes = [Shape::new(Dot), Shape::new(Dot)].into();
//! let mut canvas = String::new();
//! draw_all(&shapes, &mut canvas).unwrap();
//! assert_eq!(canvas, "..");
//! ```
//!
//! # What's Included
//!
//! - **[`Draw`]** and **[`DrawStrategy`]**: The traits for drawing values
//! - **[`FreeDraw`]**: The default strategy
//! - **[`Shape`]**, **[`InlineShape`]** and **[`ShapeRef`]**: Owned and
//!   borrowed handles
//! - **[`Shapes`]**, **[`draw`]** and **[`draw_all`]**: Collections and
//!   drawing entry points
//! - **[`Heap`]**, **[`Inline`]**, **[`Pool`]** and **[`Storage`]**: Storage
//!   policies

pub use crate::{
    Draw, DrawStrategy, FreeDraw, InlineShape, Shape, ShapeRef, Shapes, draw, draw_all,
    storage::{Heap, Inline, Pool, Storage},
};
