//! Non-owning, type-erased views.
//!
//! A [`RawShapeBorrow`] is a data pointer plus a `&'static` [`BorrowVtable`].
//! It can point either at a plain value of some drawable type or at the
//! adapter of an existing shape, and offers the same operations for both:
//! drawing, and cloning the viewed value into a new owned shape.
//!
//! This module encapsulates the fields of [`RawShapeBorrow`], guaranteeing
//! that the vtable always matches what the pointer refers to.

use core::{alloc::Layout, marker::PhantomData, ptr::NonNull};

use crate::{
    handlers::{Draw, FreeDraw},
    shape::{
        data::ShapeData,
        raw::{RawShape, RawShapeRef},
    },
    storage::{AllocationError, Storage},
    util::Erased,
};

/// Vtable for the target of a [`RawShapeBorrow`].
///
/// # Safety Invariant
///
/// The function pointers either all belong to the value functions below
/// instantiated with one type `S`, or all belong to the shape functions
/// below.
struct BorrowVtable {
    /// Draws the target.
    draw: unsafe fn(NonNull<Erased>, &mut dyn core::fmt::Write) -> core::fmt::Result,
    /// Layout of the adapter an owned copy of the target needs.
    owned_layout: unsafe fn(NonNull<Erased>) -> Layout,
    /// Writes an owned adapter holding a clone of the target to
    /// uninitialized memory.
    clone_to: unsafe fn(NonNull<Erased>, NonNull<u8>),
}

impl BorrowVtable {
    /// Vtable for a plain value of type `S`, drawn with [`FreeDraw`].
    const fn of_value<S: Draw + Clone + 'static>() -> &'static Self {
        const {
            &Self {
                draw: value_draw::<S>,
                owned_layout: value_owned_layout::<S>,
                clone_to: value_clone_to::<S>,
            }
        }
    }

    /// Vtable for the adapter of an existing shape.
    const fn of_shape() -> &'static Self {
        const {
            &Self {
                draw: shape_draw,
                owned_layout: shape_owned_layout,
                clone_to: shape_clone_to,
            }
        }
    }
}

/// Draws a plain `S`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer refers to a live `S`.
unsafe fn value_draw<S: Draw>(
    ptr: NonNull<Erased>,
    canvas: &mut dyn core::fmt::Write,
) -> core::fmt::Result {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &S = unsafe { ptr.cast::<S>().as_ref() };
    value.draw(canvas)
}

/// Layout of the adapter wrapping a plain `S`.
///
/// # Safety
///
/// This function is always safe to call. It is `unsafe` only to share the
/// signature of [`shape_owned_layout`].
unsafe fn value_owned_layout<S: Draw + Clone + 'static>(_: NonNull<Erased>) -> Layout {
    Layout::new::<ShapeData<S, FreeDraw>>()
}

/// Writes an adapter holding a clone of a plain `S` to `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer refers to a live `S`.
/// 2. `dst` is valid for writes of a `ShapeData<S, FreeDraw>`, properly
///    aligned, and does not hold a value that needs dropping.
unsafe fn value_clone_to<S: Draw + Clone + 'static>(ptr: NonNull<Erased>, dst: NonNull<u8>) {
    // SAFETY:
    // 1. Guaranteed by the caller
    let value: &S = unsafe { ptr.cast::<S>().as_ref() };
    let data = ShapeData::new(value.clone(), FreeDraw);
    // SAFETY:
    // 2. Guaranteed by the caller
    unsafe {
        dst.cast::<ShapeData<S, FreeDraw>>().write(data);
    }
}

/// Draws the adapter of a shape.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer refers to a live adapter created with `ShapeData::new`.
unsafe fn shape_draw(ptr: NonNull<Erased>, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
    // SAFETY:
    // 1. Guaranteed by the caller
    let shape = unsafe { RawShapeRef::from_ptr(ptr.cast()) };
    shape.draw(canvas)
}

/// Layout of the adapter of a shape.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer refers to a live adapter created with `ShapeData::new`.
unsafe fn shape_owned_layout(ptr: NonNull<Erased>) -> Layout {
    // SAFETY:
    // 1. Guaranteed by the caller
    let shape = unsafe { RawShapeRef::from_ptr(ptr.cast()) };
    shape.layout()
}

/// Writes a clone of the adapter of a shape to `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer refers to a live adapter created with `ShapeData::new`.
/// 2. `dst` is valid for writes of the adapter's layout, properly aligned,
///    and does not hold a value that needs dropping.
unsafe fn shape_clone_to(ptr: NonNull<Erased>, dst: NonNull<u8>) {
    // SAFETY:
    // 1. Guaranteed by the caller
    let shape = unsafe { RawShapeRef::from_ptr(ptr.cast()) };
    let vtable = shape.vtable();
    // SAFETY:
    // 1. The vtable was read from this adapter
    // 2. Guaranteed by the caller
    // 3. Guaranteed by the caller
    unsafe {
        vtable.clone_to(shape, dst);
    }
}

/// A non-owning, type-erased view of something drawable.
///
/// The view is two words wide and never allocates. It is `Copy`, and behaves
/// like a `&'a T` of the viewed value.
#[derive(Clone, Copy)]
pub struct RawShapeBorrow<'a> {
    /// Pointer to the viewed value or adapter
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer refers to what `vtable` was created for (a live `S` for
    ///    [`BorrowVtable::of_value`] with `S`, or a live adapter for
    ///    [`BorrowVtable::of_shape`]) and stays valid for reads for `'a`.
    ptr: NonNull<Erased>,
    /// How to operate on the target
    vtable: &'static BorrowVtable,
    /// Marker to tell the compiler that we should behave the same as a
    /// `&'a Erased`
    _marker: PhantomData<&'a Erased>,
}

impl<'a> RawShapeBorrow<'a> {
    /// Creates a view of a plain value, drawn with its own [`Draw`]
    /// implementation.
    #[inline]
    pub fn from_value<S: Draw + Clone + 'static>(value: &'a S) -> Self {
        Self {
            ptr: NonNull::from(value).cast(),
            vtable: BorrowVtable::of_value::<S>(),
            _marker: PhantomData,
        }
    }

    /// Creates a view of an existing shape, drawn with the strategy the shape
    /// was created with.
    #[inline]
    pub fn from_shape(shape: RawShapeRef<'a>) -> Self {
        Self {
            ptr: shape.as_non_null().cast(),
            vtable: BorrowVtable::of_shape(),
            _marker: PhantomData,
        }
    }

    /// Draws the viewed value.
    #[inline]
    pub fn draw(self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        // SAFETY: We know that `self.vtable.draw` belongs to the same family as
        // the target of `self.ptr`. Its safety requirements are upheld:
        // 1. Guaranteed by the invariants of `RawShapeBorrow`
        unsafe { (self.vtable.draw)(self.ptr, canvas) }
    }

    /// Returns the layout a storage must provide to hold an owned copy of the
    /// viewed value.
    #[inline]
    pub fn owned_layout(self) -> Layout {
        // SAFETY:
        // 1. Guaranteed by the invariants of `RawShapeBorrow`
        unsafe { (self.vtable.owned_layout)(self.ptr) }
    }

    /// Clones the viewed value into a new owned shape placed in `storage`.
    ///
    /// A plain value is wrapped with [`FreeDraw`]; a shape keeps its strategy.
    /// Fails with [`AllocationError::DoesNotFit`] if `storage` is bounded and
    /// the adapter exceeds its bounds.
    pub fn try_to_owned_in<St: Storage>(self, storage: St) -> Result<RawShape<St>, AllocationError> {
        let init = |dst: NonNull<u8>| {
            // SAFETY:
            // 1. Guaranteed by the invariants of `RawShapeBorrow`
            // 2. `dst` was allocated for `self.owned_layout()` (guaranteed by
            //    `try_emplace`) and is uninitialized
            unsafe { (self.vtable.clone_to)(self.ptr, dst) }
        };
        // SAFETY:
        // 1. `clone_to` writes an adapter created with `ShapeData::new`, whose
        //    layout is `owned_layout`
        unsafe { RawShape::try_emplace(storage, self.owned_layout(), init) }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::storage::{Align8, Heap, Inline};

    #[derive(Clone)]
    struct Tag(u32);

    impl Draw for Tag {
        fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            write!(canvas, "tag {}", self.0)
        }
    }

    fn draw_to_string(view: RawShapeBorrow<'_>) -> String {
        let mut out = String::new();
        view.draw(&mut out).unwrap();
        out
    }

    #[test]
    fn test_borrow_size() {
        assert_eq!(size_of::<RawShapeBorrow<'_>>(), 2 * size_of::<usize>());
        assert_eq!(size_of::<Option<RawShapeBorrow<'_>>>(), 2 * size_of::<usize>());
    }

    #[test]
    fn test_borrow_of_value() {
        let tag = Tag(3);
        let view = RawShapeBorrow::from_value(&tag);
        assert_eq!(draw_to_string(view), "tag 3");
        assert_eq!(view.owned_layout(), Layout::new::<ShapeData<Tag, FreeDraw>>());

        let owned = view.try_to_owned_in(Heap).unwrap();
        let mut out = String::new();
        owned.as_ref().draw(&mut out).unwrap();
        assert_eq!(out, "tag 3");
    }

    #[test]
    fn test_borrow_of_shape_keeps_strategy() {
        let shape = RawShape::new(
            Heap,
            Tag(9),
            |tag: &Tag, canvas: &mut dyn core::fmt::Write| write!(canvas, "TAG {}", tag.0),
        );
        let view = RawShapeBorrow::from_shape(shape.as_ref());
        assert_eq!(draw_to_string(view), "TAG 9");
        assert_eq!(view.owned_layout(), shape.as_ref().layout());

        let owned = view.try_to_owned_in(Inline::<Align8<16>>::new()).unwrap();
        drop(shape);
        let mut out = String::new();
        owned.as_ref().draw(&mut out).unwrap();
        assert_eq!(out, "TAG 9");
    }

    #[test]
    fn test_borrow_to_owned_does_not_fit() {
        #[derive(Clone)]
        struct Wide([u64; 4]);

        impl Draw for Wide {
            fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
                write!(canvas, "{:?}", self.0)
            }
        }

        let wide = Wide([1, 2, 3, 4]);
        let result = RawShapeBorrow::from_value(&wide).try_to_owned_in(Inline::<Align8<16>>::new());
        assert!(matches!(result, Err(AllocationError::DoesNotFit { .. })));
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(RawShapeBorrow<'_>: Send, Sync);
    }
}
