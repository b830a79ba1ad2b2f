//! The traits that decide what can be stored in a [`Shape`] and how it is
//! drawn.
//!
//! # What Can Be Stored?
//!
//! Any type implementing [`Draw`] and [`Clone`] (and owning its data, i.e.
//! `'static`). There is no base trait object to inherit from and nothing to
//! register. The [`Draw`] implementation is resolved when the value is
//! wrapped, and a type without one is rejected by the compiler at that point.
//!
//! # Strategies
//!
//! A [`DrawStrategy<S>`] replaces the [`Draw`] implementation for one stored
//! value. It is stored next to the value inside the shape. Every closure of
//! the form `Fn(&S, &mut dyn core::fmt::Write) -> core::fmt::Result` is a
//! strategy, and a named type can implement the trait for several payload
//! types at once, which is useful for cross-cutting concerns such as colors.
//!
//! [`FreeDraw`] is the strategy used when none is given. It forwards to
//! [`Draw::draw`] and takes up no space.
//!
//! # Examples
//!
//! ```
//! use core::fmt::Write;
//!
//! use polyshape::{
//!     Shape,
//!     handlers::{Draw, DrawStrategy},
//! };
//!
//! #[derive(Clone)]
//! struct Circle {
//!     radius: f64,
//! }
//!
//! impl Draw for Circle {
//!     fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
//!         write!(canvas, "circle: radius={}", self.radius)
//!     }
//! }
//!
//! #[derive(Clone)]
//! struct Red;
//!
//! impl DrawStrategy<Circle> for Red {
//!     fn draw(&self, circle: &Circle, canvas: &mut dyn Write) -> core::fmt::Result {
//!         write!(canvas, "circle: radius={}, color = red", circle.radius)
//!     }
//! }
//!
//! let plain = Shape::new(Circle { radius: 1.0 });
//! let red = Shape::with_strategy(Circle { radius: 1.0 }, Red);
//! assert_eq!(plain.to_string(), "circle: radius=1");
//! assert_eq!(red.to_string(), "circle: radius=1, color = red");
//! ```
//!
//! [`Shape`]: crate::Shape

pub use polyshape_internals::handlers::{Draw, DrawStrategy, FreeDraw};
