//! Traits that define what can be stored in a shape and how it is drawn.
//!
//! This module provides the capability trait that payload types implement
//! and the strategy trait used to override drawing for a single stored
//! value.

/// Capability required of every value stored in a shape.
///
/// A type is drawable when it can describe itself onto a canvas. No common
/// base type and no registration are involved: implementing this trait is all
/// it takes, and a missing implementation is a compile-time error at the
/// place the value is wrapped.
///
/// The canvas is any [`core::fmt::Write`] sink. The only error a draw can
/// produce is the canvas's own [`core::fmt::Error`].
///
/// # Examples
///
/// ```
/// use core::fmt::Write;
///
/// use polyshape_internals::handlers::Draw;
///
/// struct Circle {
///     radius: f64,
/// }
///
/// impl Draw for Circle {
///     fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
///         writeln!(canvas, "circle: radius={}", self.radius)
///     }
/// }
///
/// let mut out = String::new();
/// Circle { radius: 2.5 }.draw(&mut out).unwrap();
/// assert_eq!(out, "circle: radius=2.5\n");
/// ```
pub trait Draw {
    /// Draws the value onto the canvas.
    fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result;
}

impl<T: Draw + ?Sized> Draw for &T {
    #[inline]
    fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        T::draw(*self, canvas)
    }
}

/// Per-value override of how a payload of type `S` is drawn.
///
/// A strategy is stored next to the payload inside the shape and is invoked
/// instead of [`Draw::draw`]. This allows a caller to change how one specific
/// value is drawn (for example, to add a color) without touching the payload
/// type or its [`Draw`] implementation.
///
/// Every closure with the signature
/// `Fn(&S, &mut dyn core::fmt::Write) -> core::fmt::Result` is a strategy.
/// A named type may implement this trait for several payload types at once.
///
/// # Examples
///
/// ```
/// use core::fmt::Write;
///
/// use polyshape_internals::handlers::DrawStrategy;
///
/// struct Square {
///     side: f64,
/// }
///
/// struct Outlined;
///
/// impl DrawStrategy<Square> for Outlined {
///     fn draw(&self, square: &Square, canvas: &mut dyn Write) -> core::fmt::Result {
///         writeln!(canvas, "square: side={}, outlined", square.side)
///     }
/// }
///
/// let loud = |square: &Square, canvas: &mut dyn Write| writeln!(canvas, "SQUARE {}", square.side);
///
/// let mut out = String::new();
/// Outlined.draw(&Square { side: 1.5 }, &mut out).unwrap();
/// loud.draw(&Square { side: 3.0 }, &mut out).unwrap();
/// assert_eq!(out, "square: side=1.5, outlined\nSQUARE 3\n");
/// ```
pub trait DrawStrategy<S: ?Sized> {
    /// Draws `shape` onto the canvas.
    fn draw(&self, shape: &S, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result;
}

impl<S: ?Sized, F> DrawStrategy<S> for F
where
    F: Fn(&S, &mut dyn core::fmt::Write) -> core::fmt::Result,
{
    #[inline]
    fn draw(&self, shape: &S, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        self(shape, canvas)
    }
}

/// The default strategy: draws the payload with its own [`Draw`]
/// implementation.
///
/// Shapes that were created without an explicit strategy store this
/// zero-sized strategy, so they cost nothing beyond the payload itself.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct FreeDraw;

impl<S: Draw + ?Sized> DrawStrategy<S> for FreeDraw {
    #[inline]
    fn draw(&self, shape: &S, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        shape.draw(canvas)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use core::fmt::Write;

    use super::*;

    struct Dot;

    impl Draw for Dot {
        fn draw(&self, canvas: &mut dyn Write) -> core::fmt::Result {
            canvas.write_str(".")
        }
    }

    #[test]
    fn test_free_draw_forwards_to_draw() {
        let mut out = String::new();
        FreeDraw.draw(&Dot, &mut out).unwrap();
        FreeDraw.draw(&&Dot, &mut out).unwrap();
        assert_eq!(out, "..");
    }

    #[test]
    fn test_closure_strategy() {
        let strategy = |_: &Dot, canvas: &mut dyn Write| canvas.write_str("*");
        let mut out = String::new();
        strategy.draw(&Dot, &mut out).unwrap();
        assert_eq!(out, "*");
    }

    #[test]
    fn test_free_draw_is_zero_sized() {
        assert_eq!(core::mem::size_of::<FreeDraw>(), 0);
    }
}
