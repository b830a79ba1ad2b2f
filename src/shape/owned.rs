use core::alloc::Layout;

use polyshape_internals::RawShape;

use crate::{
    Draw, DrawStrategy, FreeDraw, ShapeRef,
    shape::allocation_report,
    storage::{AllocationError, Heap, Inline, Storage, handle_allocation_error},
};

/// An owned value of some drawable type, with its concrete type erased.
///
/// A [`Shape`] stores exactly one value, together with the strategy used to
/// draw it, in a slot of the storage `St`. Values of unrelated types can be
/// stored behind the same `Shape` type, put into the same collection, and
/// drawn through the same function:
///
/// - It is created from any `S: Draw + Clone + 'static` with
///   [`new`](Self::new), or with an explicit [`DrawStrategy`] with
///   [`with_strategy`](Self::with_strategy).
/// - It behaves like a value: [`clone`](Clone::clone) deep-copies the stored
///   value into a new slot, and moving a `Shape` moves the value with it.
/// - It is drawn with [`draw`](Self::draw), through [`Display`], or through
///   the free [`draw`](crate::draw) function.
///
/// Once stored, the value cannot be inspected or recovered. Drawing is the
/// only thing a `Shape` can do with it.
///
/// # Storage
///
/// The storage defaults to [`Heap`]. [`Shape<Inline<B>>`](Inline) embeds the
/// value in the handle itself and never allocates. Values that are too big
/// for a bounded storage are rejected when the construction is compiled.
///
/// # Compile-time Capability Check
///
/// Only types implementing [`Draw`] can be stored:
///
/// ```compile_fail
/// use polyshape::Shape;
///
/// struct Invisible;
///
/// // `Invisible` does not implement `Draw`
/// let shape = Shape::new(Invisible);
/// ```
///
/// [`Display`]: core::fmt::Display
#[repr(transparent)]
pub struct Shape<St: Storage = Heap> {
    raw: RawShape<St>,
}

impl Shape<Heap> {
    /// Wraps `value` in a new heap-allocated shape.
    ///
    /// The value is drawn with its own [`Draw`] implementation.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyshape::{Draw, Shape};
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
    /// let shape = Shape::new(Circle { radius: 2.3 });
    /// assert_eq!(shape.to_string(), "circle: radius=2.3");
    /// ```
    #[inline]
    pub fn new<S>(value: S) -> Self
    where
        S: Draw + Clone + 'static,
    {
        Self::new_in(Heap, value)
    }

    /// Wraps `value` in a new heap-allocated shape that is drawn with
    /// `strategy` instead of the value's own [`Draw`] implementation.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyshape::{Draw, Shape};
    ///
    /// #[derive(Clone)]
    /// struct Square {
    ///     side: f64,
    /// }
    ///
    /// impl Draw for Square {
    ///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    ///         write!(canvas, "square: side={}", self.side)
    ///     }
    /// }
    ///
    /// let shape = Shape::with_strategy(
    ///     Square { side: 1.2 },
    ///     |square: &Square, canvas: &mut dyn core::fmt::Write| {
    ///         write!(canvas, "square: side={}, color = green", square.side)
    ///     },
    /// );
    /// assert_eq!(shape.to_string(), "square: side=1.2, color = green");
    /// ```
    #[inline]
    pub fn with_strategy<S, D>(value: S, strategy: D) -> Self
    where
        S: Draw + Clone + 'static,
        D: DrawStrategy<S> + Clone + 'static,
    {
        Self::with_strategy_in(Heap, value, strategy)
    }
}

impl<B> Shape<Inline<B>> {
    /// Wraps `value` in a new shape that embeds it in the handle.
    ///
    /// Fails to compile if the value does not fit the buffer `B`.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyshape::{Draw, InlineShape};
    ///
    /// #[derive(Clone)]
    /// struct Dot;
    ///
    /// impl Draw for Dot {
    ///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    ///         canvas.write_str(".")
    ///     }
    /// }
    ///
    /// let shape = InlineShape::inline(Dot);
    /// assert_eq!(shape.to_string(), ".");
    /// assert_eq!(size_of::<InlineShape>(), 128);
    /// ```
    ///
    /// A value too large for the buffer stops the build:
    ///
    /// ```compile_fail
    /// use polyshape::{Draw, Shape, storage::{Align8, Inline}};
    ///
    /// #[derive(Clone)]
    /// struct Point(i32, i32);
    ///
    /// impl Draw for Point {
    ///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    ///         write!(canvas, "({}, {})", self.0, self.1)
    ///     }
    /// }
    ///
    /// // 8 bytes of vtable pointer plus 8 bytes of point do not fit in 8
    /// let shape: Shape<Inline<Align8<8>>> = Shape::inline(Point(1, 2));
    /// ```
    ///
    /// So does a value aligned more strictly than the buffer:
    ///
    /// ```compile_fail
    /// use polyshape::{Draw, InlineShape};
    ///
    /// #[derive(Clone)]
    /// #[repr(align(64))]
    /// struct Aligned;
    ///
    /// impl Draw for Aligned {
    ///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    ///         canvas.write_str("aligned")
    ///     }
    /// }
    ///
    /// // The default buffer is aligned to 16
    /// let shape = InlineShape::inline(Aligned);
    /// ```
    #[inline]
    pub fn inline<S>(value: S) -> Self
    where
        S: Draw + Clone + 'static,
    {
        Self::new_in(Inline::new(), value)
    }

    /// Wraps `value` in a new shape that embeds it in the handle and is drawn
    /// with `strategy`.
    ///
    /// Fails to compile if the value and strategy together do not fit the
    /// buffer `B`.
    #[inline]
    pub fn inline_with_strategy<S, D>(value: S, strategy: D) -> Self
    where
        S: Draw + Clone + 'static,
        D: DrawStrategy<S> + Clone + 'static,
    {
        Self::with_strategy_in(Inline::new(), value, strategy)
    }
}

impl<St: Storage> Shape<St> {
    /// Wraps `value` in a new shape placed in `storage`.
    ///
    /// Fails to compile if the value exceeds the bounds of the storage. Any
    /// runtime allocation failure is passed to [`handle_allocation_error`].
    #[inline]
    pub fn new_in<S>(storage: St, value: S) -> Self
    where
        S: Draw + Clone + 'static,
    {
        Self {
            raw: RawShape::new(storage, value, FreeDraw),
        }
    }

    /// Wraps `value` in a new shape placed in `storage` that is drawn with
    /// `strategy`.
    ///
    /// Fails to compile if the value and strategy exceed the bounds of the
    /// storage. Any runtime allocation failure is passed to
    /// [`handle_allocation_error`].
    #[inline]
    pub fn with_strategy_in<S, D>(storage: St, value: S, strategy: D) -> Self
    where
        S: Draw + Clone + 'static,
        D: DrawStrategy<S> + Clone + 'static,
    {
        Self {
            raw: RawShape::new(storage, value, strategy),
        }
    }

    /// Wraps `value` in a new shape placed in `storage`, reporting runtime
    /// allocation failures.
    ///
    /// The report's context is the [`AllocationError`]; the name of the
    /// storage type is attached to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyshape::{AllocationError, Draw, Shape, storage::Pool};
    ///
    /// #[derive(Clone)]
    /// struct Dot;
    ///
    /// impl Draw for Dot {
    ///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    ///         canvas.write_str(".")
    ///     }
    /// }
    ///
    /// let pool: Pool = Pool::new(0);
    /// let report = Shape::try_new_in(&pool, Dot).err().unwrap();
    /// assert_eq!(
    ///     report.current_context(),
    ///     &AllocationError::Exhausted { slots: 0 }
    /// );
    /// ```
    #[track_caller]
    pub fn try_new_in<S>(storage: St, value: S) -> rootcause::Result<Self, AllocationError>
    where
        S: Draw + Clone + 'static,
    {
        Self::try_with_strategy_in(storage, value, FreeDraw)
    }

    /// Wraps `value` in a new shape placed in `storage` that is drawn with
    /// `strategy`, reporting runtime allocation failures.
    #[track_caller]
    pub fn try_with_strategy_in<S, D>(
        storage: St,
        value: S,
        strategy: D,
    ) -> rootcause::Result<Self, AllocationError>
    where
        S: Draw + Clone + 'static,
        D: DrawStrategy<S> + Clone + 'static,
    {
        match RawShape::try_new(storage, value, strategy) {
            Ok(raw) => Ok(Self { raw }),
            Err(error) => Err(allocation_report::<St>(error)),
        }
    }

    /// Draws the stored value onto the canvas.
    ///
    /// The strategy given at construction is used; without one, the value's
    /// own [`Draw`] implementation is.
    #[inline]
    pub fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        self.raw.as_ref().draw(canvas)
    }

    /// Returns a borrowed, copyable view of this shape.
    #[inline]
    pub fn as_ref(&self) -> ShapeRef<'_> {
        ShapeRef::from(self)
    }

    /// Returns the storage this shape was placed by.
    #[inline]
    pub fn storage(&self) -> &St {
        self.raw.storage()
    }

    /// Returns the size and alignment of the slot the value occupies.
    ///
    /// This is the stored value plus its strategy and one pointer.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.raw.as_ref().layout()
    }

    /// Deep-copies the shape into a new slot of the same storage, reporting
    /// runtime allocation failures.
    #[track_caller]
    pub fn try_clone(&self) -> rootcause::Result<Self, AllocationError> {
        match self.raw.try_clone() {
            Ok(raw) => Ok(Self { raw }),
            Err(error) => Err(allocation_report::<St>(error)),
        }
    }

    /// Moves the stored value onto the heap.
    ///
    /// The value is neither cloned nor dropped, and the old slot is released.
    ///
    /// # Examples
    ///
    /// ```
    /// use polyshape::{Draw, InlineShape, Shape};
    ///
    /// #[derive(Clone)]
    /// struct Dot;
    ///
    /// impl Draw for Dot {
    ///     fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    ///         canvas.write_str(".")
    ///     }
    /// }
    ///
    /// let inline = InlineShape::inline(Dot);
    /// let heap: Shape = inline.into_heap();
    /// assert_eq!(heap.to_string(), ".");
    /// ```
    pub fn into_heap(self) -> Shape<Heap> {
        match self.raw.try_relocate(Heap) {
            Ok(raw) => Shape { raw },
            Err((_, error)) => handle_allocation_error(error),
        }
    }
}

impl<St: Storage> Clone for Shape<St> {
    /// Deep-copies the shape into a new slot of the same storage.
    ///
    /// Runtime allocation failures, such as an exhausted pool, are passed to
    /// [`handle_allocation_error`]. If cloning the stored value panics, the
    /// new slot is released and `self` is unaffected. The provided
    /// `clone_from` only assigns once the copy is complete.
    fn clone(&self) -> Self {
        match self.raw.try_clone() {
            Ok(raw) => Self { raw },
            Err(error) => handle_allocation_error(error),
        }
    }
}

impl<St: Storage> Draw for Shape<St> {
    #[inline]
    fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        Shape::draw(self, canvas)
    }
}

impl<St: Storage> core::fmt::Display for Shape<St> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.draw(f)
    }
}

impl<St: Storage> core::fmt::Debug for Shape<St> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let layout = self.layout();
        f.debug_struct("Shape")
            .field("storage", &core::any::type_name::<St>())
            .field("size", &layout.size())
            .field("align", &layout.align())
            .finish_non_exhaustive()
    }
}

impl From<ShapeRef<'_>> for Shape<Heap> {
    #[inline]
    fn from(shape: ShapeRef<'_>) -> Self {
        shape.to_shape()
    }
}

impl<St: Storage> Shape<St> {
    /// Wraps an owned raw shape.
    #[inline]
    pub(crate) fn from_raw(raw: RawShape<St>) -> Self {
        Self { raw }
    }

    /// Returns the raw shape.
    #[inline]
    pub(crate) fn as_raw(&self) -> &RawShape<St> {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use alloc::{
        format,
        rc::Rc,
        string::{String, ToString},
    };
    use core::cell::Cell;

    use super::*;
    use crate::{
        InlineShape,
        storage::{Align8, Align16, Pool},
    };

    #[derive(Clone, Debug)]
    struct Circle {
        radius: f64,
    }

    impl Draw for Circle {
        fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            write!(canvas, "circle: radius={}", self.radius)
        }
    }

    #[derive(Clone)]
    struct Counted {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Counted {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    impl Draw for Counted {
        fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            canvas.write_str("counted")
        }
    }

    #[test]
    fn test_shape_size() {
        assert_eq!(size_of::<Shape>(), size_of::<usize>());
        assert_eq!(size_of::<Option<Shape>>(), size_of::<usize>());
        assert_eq!(size_of::<Shape<Inline>>(), 128);
        assert_eq!(align_of::<Shape<Inline>>(), 16);
        assert_eq!(size_of::<Shape<Inline<Align8<24>>>>(), 24);
    }

    #[test]
    fn test_clone_round_trip() {
        let shapes: [Shape; 2] = [
            Shape::new(Circle { radius: 2.3 }),
            Shape::with_strategy(
                Circle { radius: 2.3 },
                |circle: &Circle, canvas: &mut dyn core::fmt::Write| {
                    write!(canvas, "({})", circle.radius)
                },
            ),
        ];
        for shape in &shapes {
            assert_eq!(shape.clone().to_string(), shape.to_string());
        }
    }

    #[test]
    fn test_strategy_precedence() {
        let circle = Circle { radius: 4.1 };
        let plain = Shape::new(circle.clone());
        let blue = Shape::with_strategy(circle, |circle: &Circle, canvas: &mut dyn core::fmt::Write| {
            write!(canvas, "circle: radius={}, color = blue", circle.radius)
        });
        assert_eq!(plain.to_string(), "circle: radius=4.1");
        assert_eq!(blue.to_string(), "circle: radius=4.1, color = blue");
    }

    #[test]
    fn test_clone_independence_and_single_drop() {
        let drops = Rc::new(Cell::new(0));
        let original = InlineShapeOf::inline(Counted {
            drops: Rc::clone(&drops),
        });
        let mut copy = original.clone();
        drop(original);
        assert_eq!(drops.get(), 1);
        assert_eq!(copy.to_string(), "counted");

        copy.clone_from(&Shape::inline(Counted {
            drops: Rc::clone(&drops),
        }));
        // The temporary source and the old value of `copy`
        assert_eq!(drops.get(), 3);
        drop(copy);
        assert_eq!(drops.get(), 4);
    }

    type InlineShapeOf = Shape<Inline<Align16<64>>>;

    /// Counts its own draws through `&self`.
    #[derive(Clone)]
    struct DrawCounter {
        draws: Cell<usize>,
    }

    impl Draw for DrawCounter {
        fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            self.draws.set(self.draws.get() + 1);
            write!(canvas, "{}", self.draws.get())
        }
    }

    #[test]
    fn test_interior_mutability_in_every_storage() {
        let pool = Pool::<Align16<64>>::new(1);
        let shapes = (
            Shape::new(DrawCounter { draws: Cell::new(0) }),
            InlineShape::inline(DrawCounter { draws: Cell::new(0) }),
            InlineShapeOf::inline_with_strategy(
                DrawCounter { draws: Cell::new(0) },
                |counter: &DrawCounter, canvas: &mut dyn core::fmt::Write| {
                    counter.draw(canvas)?;
                    canvas.write_str("!")
                },
            ),
            Shape::new_in(&pool, DrawCounter { draws: Cell::new(0) }),
        );

        assert_eq!(shapes.0.to_string(), "1");
        assert_eq!(shapes.0.to_string(), "2");
        assert_eq!(shapes.1.to_string(), "1");
        assert_eq!(shapes.1.to_string(), "2");
        assert_eq!(shapes.2.to_string(), "1!");
        assert_eq!(shapes.2.to_string(), "2!");
        assert_eq!(shapes.3.to_string(), "1");
        assert_eq!(shapes.3.to_string(), "2");

        // A clone starts from the count at the time of cloning
        let copy = shapes.1.clone();
        assert_eq!(copy.to_string(), "3");
        assert_eq!(shapes.1.to_string(), "3");
    }

    #[test]
    fn test_move_keeps_value_for_every_storage() {
        let pool = Pool::<Align16<64>>::new(1);
        let heap = Shape::new(Circle { radius: 1.0 });
        let inline = InlineShapeOf::inline(Circle { radius: 2.0 });
        let pooled = Shape::new_in(&pool, Circle { radius: 3.0 });

        let moved = (heap, inline, pooled);
        let (heap, inline, pooled) = moved;
        assert_eq!(
            format!("{heap} {inline} {pooled}"),
            "circle: radius=1 circle: radius=2 circle: radius=3"
        );
    }

    #[test]
    fn test_into_heap_releases_pool_block() {
        let pool = Pool::<Align16<64>>::new(1);
        let pooled = Shape::new_in(&pool, Circle { radius: 5.0 });
        assert_eq!(pool.available(), 0);

        let heap = pooled.into_heap();
        assert_eq!(pool.available(), 1);
        assert_eq!(heap.to_string(), "circle: radius=5");
    }

    #[test]
    fn test_try_clone_reports_exhaustion() {
        let pool = Pool::<Align16<64>>::new(1);
        let pooled = Shape::new_in(&pool, Circle { radius: 1.0 });
        let report = pooled.try_clone().err().unwrap();
        assert_eq!(
            report.current_context(),
            &AllocationError::Exhausted { slots: 1 }
        );
        let rendered = report.to_string();
        assert!(rendered.contains("all 1 slots of the storage are in use"));
        assert!(rendered.contains("storage: &"));
        assert!(rendered.contains("Pool"));
    }

    #[test]
    #[should_panic(expected = "all 1 slots of the storage are in use")]
    fn test_clone_panics_on_exhaustion() {
        let pool = Pool::<Align16<64>>::new(1);
        let pooled = Shape::new_in(&pool, Circle { radius: 1.0 });
        let _copy = pooled.clone();
    }

    #[test]
    fn test_layout_and_debug() {
        let shape = Shape::new(Circle { radius: 1.0 });
        assert_eq!(shape.layout().size(), size_of::<usize>() + size_of::<f64>());
        let debug = format!("{shape:?}");
        assert!(debug.starts_with("Shape { storage: "));
        assert!(debug.contains("Heap"));
        assert!(debug.ends_with("size: 16, align: 8, .. }"));
    }

    #[test]
    fn test_shapes_nest() {
        let inner = Shape::new(Circle { radius: 0.5 });
        let outer = Shape::with_strategy(inner, |inner: &Shape, canvas: &mut dyn core::fmt::Write| {
            canvas.write_str("[")?;
            inner.draw(canvas)?;
            canvas.write_str("]")
        });
        let mut canvas = String::new();
        crate::draw(&outer, &mut canvas).unwrap();
        assert_eq!(canvas, "[circle: radius=0.5]");
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(Shape: Send, Sync);
        static_assertions::assert_not_impl_any!(Shape<Inline>: Send, Sync);
    }
}
