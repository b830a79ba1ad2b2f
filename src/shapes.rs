//! Ordered collections of shapes and batch drawing.
//!
//! [`Shapes`] keeps [`Shape`]s in insertion order and draws them in exactly
//! that order. There is no sorting, deduplication or filtering, and nothing
//! is drawn in parallel.

use alloc::vec::Vec;

use crate::{
    Draw, Shape,
    storage::{Heap, Storage},
};

/// An ordered collection of [`Shape`]s.
///
/// You can think of a [`Shapes<St>`] as a wrapper around a
/// `Vec<Shape<St>>` that is itself drawable: drawing the collection draws
/// every element in the order it was pushed.
///
/// # Examples
///
/// ```
/// use polyshape::{Draw, Shape, Shapes};
///
/// #[derive(Clone)]
/// struct Label(&'static str);
///
/// impl Draw for Label {
///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
///         writeln!(canvas, "{}", self.0)
///     }
/// }
///
/// let shapes: Shapes = ["one", "two", "three"]
///     .into_iter()
///     .map(|text| Shape::new(Label(text)))
///     .collect();
/// assert_eq!(shapes.to_string(), "one\ntwo\nthree\n");
/// ```
#[repr(transparent)]
pub struct Shapes<St: Storage = Heap> {
    shapes: Vec<Shape<St>>,
}

impl<St: Storage> Shapes<St> {
    /// Creates a new, empty collection.
    ///
    /// Drawing an empty collection writes nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyshape::Shapes;
    ///
    /// let shapes: Shapes = Shapes::new();
    /// assert!(shapes.is_empty());
    /// assert_eq!(shapes.to_string(), "");
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Creates a new, empty collection with room for `capacity` shapes.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            shapes: Vec::with_capacity(capacity),
        }
    }

    /// Appends a shape to the end of the collection.
    #[inline]
    pub fn push(&mut self, shape: Shape<St>) {
        self.shapes.push(shape);
    }

    /// Removes and returns the last shape, or [`None`] if the collection is
    /// empty.
    #[inline]
    pub fn pop(&mut self) -> Option<Shape<St>> {
        self.shapes.pop()
    }

    /// Returns the shape at `index`, or [`None`] if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Shape<St>> {
        self.shapes.get(index)
    }

    /// Returns the number of shapes in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the collection contains no shapes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Returns an iterator over the shapes in insertion order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Shape<St>> {
        self.shapes.iter()
    }

    /// Returns the shapes as a slice, in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[Shape<St>] {
        &self.shapes
    }

    /// Draws every shape onto the canvas, in insertion order.
    ///
    /// Stops at the first error returned by the canvas.
    pub fn draw_all(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        self.shapes.iter().try_for_each(|shape| shape.draw(canvas))
    }
}

/// Draws every shape of the collection onto the canvas, in insertion order.
///
/// See [`Shapes::draw_all`].
#[inline]
pub fn draw_all<St: Storage>(
    shapes: &Shapes<St>,
    canvas: &mut dyn core::fmt::Write,
) -> core::fmt::Result {
    shapes.draw_all(canvas)
}

impl<St: Storage> Default for Shapes<St> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<St: Storage> Clone for Shapes<St> {
    fn clone(&self) -> Self {
        Self {
            shapes: self.shapes.clone(),
        }
    }
}

impl<St: Storage> Draw for Shapes<St> {
    #[inline]
    fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        self.draw_all(canvas)
    }
}

impl<St: Storage> core::fmt::Display for Shapes<St> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.draw_all(f)
    }
}

impl<St: Storage> core::fmt::Debug for Shapes<St> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.shapes.iter()).finish()
    }
}

impl<St: Storage> Extend<Shape<St>> for Shapes<St> {
    fn extend<I: IntoIterator<Item = Shape<St>>>(&mut self, iter: I) {
        self.shapes.extend(iter);
    }
}

impl<St: Storage> FromIterator<Shape<St>> for Shapes<St> {
    fn from_iter<I: IntoIterator<Item = Shape<St>>>(iter: I) -> Self {
        Self {
            shapes: Vec::from_iter(iter),
        }
    }
}

impl<St: Storage> IntoIterator for Shapes<St> {
    type Item = Shape<St>;
    type IntoIter = alloc::vec::IntoIter<Shape<St>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.shapes.into_iter()
    }
}

impl<'a, St: Storage> IntoIterator for &'a Shapes<St> {
    type Item = &'a Shape<St>;
    type IntoIter = core::slice::Iter<'a, Shape<St>>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}

impl<St: Storage> From<Vec<Shape<St>>> for Shapes<St> {
    #[inline]
    fn from(shapes: Vec<Shape<St>>) -> Self {
        Self { shapes }
    }
}

impl<const N: usize, St: Storage> From<[Shape<St>; N]> for Shapes<St> {
    #[inline]
    fn from(shapes: [Shape<St>; N]) -> Self {
        Self {
            shapes: Vec::from(shapes),
        }
    }
}
