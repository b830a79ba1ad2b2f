use polyshape_internals::RawShapeBorrow;

use crate::{
    Draw, Shape,
    shape::allocation_report,
    storage::{AllocationError, Heap, Storage, handle_allocation_error},
};

/// A borrowed view of something drawable, with its concrete type erased.
///
/// A [`ShapeRef`] is to [`Shape`] what `&str` is to `String`: it is two
/// words wide, [`Copy`], never allocates, and can be created either from an
/// existing [`Shape`] or directly from a reference to any drawable value.
/// Functions that only need to draw can take a `ShapeRef` and accept both
/// without forcing callers to allocate.
///
/// # Examples
///
/// ```
/// use polyshape::{Draw, Shape, ShapeRef};
///
/// #[derive(Clone)]
/// struct Circle {
///     radius: f64,
/// }
///
/// impl Draw for Circle {
///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
///         write!(canvas, "circle: radius={}", self.radius)
///     }
/// }
///
/// fn describe(shape: ShapeRef<'_>) -> String {
///     format!("<{shape}>")
/// }
///
/// let circle = Circle { radius: 1.5 };
/// let owned = Shape::new(circle.clone());
///
/// assert_eq!(describe(ShapeRef::new(&circle)), "<circle: radius=1.5>");
/// assert_eq!(describe(owned.as_ref()), "<circle: radius=1.5>");
/// ```
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct ShapeRef<'a> {
    raw: RawShapeBorrow<'a>,
}

impl<'a> ShapeRef<'a> {
    /// Creates a view of a plain value, drawn with its own [`Draw`]
    /// implementation.
    #[inline]
    pub fn new<S>(value: &'a S) -> Self
    where
        S: Draw + Clone + 'static,
    {
        Self {
            raw: RawShapeBorrow::from_value(value),
        }
    }

    /// Draws the viewed value onto the canvas.
    #[inline]
    pub fn draw(self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        self.raw.draw(canvas)
    }

    /// Copies the viewed value into a new heap-allocated [`Shape`].
    ///
    /// A view of a [`Shape`] keeps that shape's strategy. Drawing the copy
    /// produces the same output as drawing the view.
    #[inline]
    pub fn to_shape(self) -> Shape<Heap> {
        self.to_shape_in(Heap)
    }

    /// Copies the viewed value into a new [`Shape`] placed in `storage`.
    ///
    /// The size of the viewed value is only known at runtime, so a value that
    /// does not fit a bounded storage is a runtime failure here, passed to
    /// [`handle_allocation_error`]. Use [`try_to_shape_in`](Self::try_to_shape_in)
    /// to handle it.
    pub fn to_shape_in<St: Storage>(self, storage: St) -> Shape<St> {
        match self.raw.try_to_owned_in(storage) {
            Ok(raw) => Shape::from_raw(raw),
            Err(error) => handle_allocation_error(error),
        }
    }

    /// Copies the viewed value into a new heap-allocated [`Shape`], reporting
    /// runtime allocation failures.
    #[track_caller]
    pub fn try_to_shape(self) -> rootcause::Result<Shape<Heap>, AllocationError> {
        self.try_to_shape_in(Heap)
    }

    /// Copies the viewed value into a new [`Shape`] placed in `storage`,
    /// reporting runtime allocation failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyshape::{AllocationError, Draw, Shape, ShapeRef, storage::{Align8, Inline}};
    ///
    /// #[derive(Clone)]
    /// struct Wide([u64; 4]);
    ///
    /// impl Draw for Wide {
    ///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    ///         write!(canvas, "{:?}", self.0)
    ///     }
    /// }
    ///
    /// let wide = Wide([1, 2, 3, 4]);
    /// let report = ShapeRef::new(&wide)
    ///     .try_to_shape_in(Inline::<Align8<16>>::new())
    ///     .err()
    ///     .unwrap();
    /// assert!(matches!(
    ///     report.current_context(),
    ///     AllocationError::DoesNotFit { capacity: 16, .. }
    /// ));
    /// ```
    #[track_caller]
    pub fn try_to_shape_in<St: Storage>(
        self,
        storage: St,
    ) -> rootcause::Result<Shape<St>, AllocationError> {
        match self.raw.try_to_owned_in(storage) {
            Ok(raw) => Ok(Shape::from_raw(raw)),
            Err(error) => Err(allocation_report::<St>(error)),
        }
    }
}

impl<'a, St: Storage> From<&'a Shape<St>> for ShapeRef<'a> {
    #[inline]
    fn from(shape: &'a Shape<St>) -> Self {
        Self {
            raw: RawShapeBorrow::from_shape(shape.as_raw().as_ref()),
        }
    }
}

impl Draw for ShapeRef<'_> {
    #[inline]
    fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        ShapeRef::draw(*self, canvas)
    }
}

impl core::fmt::Display for ShapeRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        ShapeRef::draw(*self, f)
    }
}

impl core::fmt::Debug for ShapeRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShapeRef").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec::Vec};

    use super::*;
    use crate::{
        Inline,
        storage::{Align8, Pool},
    };

    #[derive(Clone)]
    struct Square {
        side: f64,
    }

    impl Draw for Square {
        fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            write!(canvas, "square: side={}", self.side)
        }
    }

    #[test]
    fn test_shape_ref_size() {
        assert_eq!(size_of::<ShapeRef<'_>>(), 2 * size_of::<usize>());
        assert_eq!(size_of::<Option<ShapeRef<'_>>>(), 2 * size_of::<usize>());
    }

    #[test]
    fn test_views_over_values_and_shapes() {
        let square = Square { side: 1.2 };
        let green = Shape::with_strategy(
            square.clone(),
            |square: &Square, canvas: &mut dyn core::fmt::Write| {
                write!(canvas, "square: side={}, color = green", square.side)
            },
        );

        let views = [ShapeRef::new(&square), green.as_ref(), ShapeRef::from(&green)];
        let drawn: Vec<_> = views.iter().map(ToString::to_string).collect();
        assert_eq!(
            drawn,
            [
                "square: side=1.2",
                "square: side=1.2, color = green",
                "square: side=1.2, color = green"
            ]
        );
    }

    #[test]
    fn test_to_shape_matches_view() {
        let pool = Pool::<Align8<32>>::new(1);
        let pooled = Shape::new_in(&pool, Square { side: 2.5 });

        let from_value = ShapeRef::new(&Square { side: 0.5 }).to_shape();
        let from_shape: Shape = pooled.as_ref().into();
        let inline: Shape<Inline> = pooled.as_ref().to_shape_in(Inline::new());
        drop(pooled);

        assert_eq!(from_value.to_string(), "square: side=0.5");
        assert_eq!(from_shape.to_string(), "square: side=2.5");
        assert_eq!(inline.to_string(), "square: side=2.5");
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_try_to_shape_reports_exhausted_pool() {
        let pool = Pool::<Align8<32>>::new(0);
        let square = Square { side: 1.0 };
        let report = ShapeRef::new(&square).try_to_shape_in(&pool).err().unwrap();
        assert_eq!(
            report.current_context(),
            &AllocationError::Exhausted { slots: 0 }
        );
        assert!(ShapeRef::new(&square).try_to_shape().is_ok());
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(ShapeRef<'_>: Send, Sync);
    }
}
