//! Vtable for type-erased shape operations.
//!
//! This module contains the [`ShapeVtable`] which enables drawing, cloning,
//! relocating and dropping an adapter when its payload type `S` and strategy
//! type `D` have been erased. The vtable stores function pointers that
//! dispatch to the correct typed implementations.
//!
//! The fields of [`ShapeVtable`] are private to this module. This visibility
//! restriction guarantees the safety invariant: **the vtable's type parameters
//! must match the actual payload and strategy stored in the [`ShapeData`]**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`ShapeVtable::new`], which pairs the function pointers with
//! specific types `S` and `D` at compile time.

use core::{alloc::Layout, any::TypeId, ptr::NonNull};

use crate::{
    handlers::DrawStrategy,
    shape::{data::ShapeData, raw::RawShapeRef},
    util::Erased,
};

/// Vtable for type-erased shape operations.
///
/// # Safety Invariant
///
/// The function pointer fields are guaranteed to point to the functions
/// defined below instantiated with the payload type `S` and strategy type `D`
/// that were used to create this [`ShapeVtable`], and `layout` is the layout
/// of `ShapeData<S, D>`.
pub(crate) struct ShapeVtable {
    /// Layout of the `ShapeData<S, D>` this vtable was created for.
    layout: Layout,
    /// Gets the [`TypeId`] of `ShapeData<S, D>`.
    type_id: fn() -> TypeId,
    /// Drops the `ShapeData<S, D>` in place without releasing its memory.
    drop_in_place: unsafe fn(NonNull<ShapeData<Erased, Erased>>),
    /// Draws the payload through the strategy.
    draw: unsafe fn(RawShapeRef<'_>, &mut dyn core::fmt::Write) -> core::fmt::Result,
    /// Writes a deep clone of the adapter to uninitialized memory.
    clone_to: unsafe fn(RawShapeRef<'_>, NonNull<u8>),
    /// Moves the adapter to uninitialized memory, leaving the source
    /// logically uninitialized.
    relocate: unsafe fn(NonNull<ShapeData<Erased, Erased>>, NonNull<u8>),
}

impl ShapeVtable {
    /// Creates a new [`ShapeVtable`] for the payload type `S` and the strategy
    /// type `D`.
    pub(super) const fn new<S, D>() -> &'static Self
    where
        S: Clone + 'static,
        D: DrawStrategy<S> + Clone + 'static,
    {
        const {
            &Self {
                layout: Layout::new::<ShapeData<S, D>>(),
                type_id: TypeId::of::<ShapeData<S, D>>,
                drop_in_place: drop_in_place::<S, D>,
                draw: draw::<S, D>,
                clone_to: clone_to::<S, D>,
                relocate: relocate::<S, D>,
            }
        }
    }

    /// Layout of the adapter this vtable describes.
    #[inline]
    pub(super) fn layout(&self) -> Layout {
        self.layout
    }

    /// Gets the [`TypeId`] of the adapter this vtable describes.
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Drops the adapter pointed to by `ptr` in place.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ShapeVtable`] must be a vtable for the adapter pointed to by
    ///    `ptr`.
    /// 2. The pointer is valid for reads and writes and the adapter is
    ///    initialized.
    /// 3. The adapter is not used again, except to release its memory.
    #[inline]
    pub(super) unsafe fn drop_in_place(&self, ptr: NonNull<ShapeData<Erased, Erased>>) {
        // SAFETY: We know that `self.drop_in_place` points to the function
        // `drop_in_place::<S, D>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.drop_in_place)(ptr);
        }
    }

    /// Draws the adapter using the strategy it was created with.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ShapeVtable`] must be a vtable for the adapter referenced by
    ///    the [`RawShapeRef`].
    #[inline]
    pub(super) unsafe fn draw(
        &self,
        ptr: RawShapeRef<'_>,
        canvas: &mut dyn core::fmt::Write,
    ) -> core::fmt::Result {
        // SAFETY: We know that `self.draw` points to the function `draw::<S, D>`
        // below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        unsafe { (self.draw)(ptr, canvas) }
    }

    /// Writes a deep clone of the adapter to `dst`.
    ///
    /// If cloning the payload or strategy panics, nothing has been written.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ShapeVtable`] must be a vtable for the adapter referenced by
    ///    the [`RawShapeRef`].
    /// 2. `dst` is valid for writes of [`layout`](Self::layout) bytes and
    ///    aligned to it.
    /// 3. `dst` does not hold a value that needs dropping.
    #[inline]
    pub(super) unsafe fn clone_to(&self, ptr: RawShapeRef<'_>, dst: NonNull<u8>) {
        // SAFETY: We know that `self.clone_to` points to the function
        // `clone_to::<S, D>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.clone_to)(ptr, dst);
        }
    }

    /// Moves the adapter at `src` to `dst`.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This [`ShapeVtable`] must be a vtable for the adapter pointed to by
    ///    `src`.
    /// 2. `src` is valid for reads and the adapter is initialized.
    /// 3. `dst` is valid for writes of [`layout`](Self::layout) bytes, aligned
    ///    to it, does not overlap `src` and does not hold a value that needs
    ///    dropping.
    /// 4. The adapter at `src` is treated as uninitialized afterwards.
    #[inline]
    pub(super) unsafe fn relocate(&self, src: NonNull<ShapeData<Erased, Erased>>, dst: NonNull<u8>) {
        // SAFETY: We know that `self.relocate` points to the function
        // `relocate::<S, D>` below. That function's safety requirements are
        // upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        // 4. Guaranteed by the caller
        unsafe {
            (self.relocate)(src, dst);
        }
    }
}

/// Drops the `ShapeData<S, D>` pointed to by `ptr` in place.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer refers to an initialized `ShapeData<S, D>`.
/// 2. The pointer is valid for reads and writes.
/// 3. The adapter is not used again, except to release its memory.
unsafe fn drop_in_place<S: 'static, D: 'static>(ptr: NonNull<ShapeData<Erased, Erased>>) {
    let ptr: NonNull<ShapeData<S, D>> = ptr.cast();
    // SAFETY:
    // 1. The pointer refers to an initialized value of the right type
    //    (guaranteed by the caller)
    // 2. Guaranteed by the caller
    // 3. The value is not used again (guaranteed by the caller)
    unsafe { ptr.drop_in_place() }
}

/// Draws an adapter through its strategy.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The types `S` and `D` match the actual payload and strategy types stored
///    in the [`ShapeData`].
unsafe fn draw<S: 'static, D: DrawStrategy<S> + 'static>(
    ptr: RawShapeRef<'_>,
    canvas: &mut dyn core::fmt::Write,
) -> core::fmt::Result {
    // SAFETY:
    // 1. Guaranteed by the caller
    let data: &ShapeData<S, D> = unsafe { ptr.cast_inner::<S, D>() };
    data.draw(canvas)
}

/// Writes a deep clone of the adapter to `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The types `S` and `D` match the actual payload and strategy types stored
///    in the [`ShapeData`].
/// 2. `dst` is valid for writes of a `ShapeData<S, D>` and properly aligned.
/// 3. `dst` does not hold a value that needs dropping.
unsafe fn clone_to<S: Clone + 'static, D: Clone + 'static>(ptr: RawShapeRef<'_>, dst: NonNull<u8>) {
    // SAFETY:
    // 1. Guaranteed by the caller
    let data: &ShapeData<S, D> = unsafe { ptr.cast_inner::<S, D>() };
    let copy = data.clone();
    // SAFETY:
    // 2. Guaranteed by the caller
    // 3. Nothing is overwritten without being dropped (guaranteed by the caller)
    unsafe {
        dst.cast::<ShapeData<S, D>>().write(copy);
    }
}

/// Moves the adapter at `src` to `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer `src` refers to an initialized `ShapeData<S, D>` and is
///    valid for reads.
/// 2. `dst` is valid for writes of a `ShapeData<S, D>`, properly aligned, does
///    not overlap `src` and does not hold a value that needs dropping.
/// 3. The value at `src` is treated as uninitialized afterwards.
unsafe fn relocate<S: 'static, D: 'static>(src: NonNull<ShapeData<Erased, Erased>>, dst: NonNull<u8>) {
    // SAFETY:
    // 1. Guaranteed by the caller
    // 3. The value is not used again at `src` (guaranteed by the caller)
    let value = unsafe { src.cast::<ShapeData<S, D>>().read() };
    // SAFETY:
    // 2. Guaranteed by the caller
    unsafe {
        dst.cast::<ShapeData<S, D>>().write(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{Draw, FreeDraw};

    #[derive(Clone)]
    struct Dot;

    impl Draw for Dot {
        fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            canvas.write_str(".")
        }
    }

    #[derive(Clone)]
    struct Star;

    impl DrawStrategy<Dot> for Star {
        fn draw(&self, _: &Dot, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            canvas.write_str("*")
        }
    }

    #[test]
    fn test_shape_vtable_eq() {
        let vtable1 = ShapeVtable::new::<Dot, FreeDraw>();
        let vtable2 = ShapeVtable::new::<Dot, FreeDraw>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
    }

    #[test]
    fn test_shape_vtable_differs_per_strategy() {
        let free = ShapeVtable::new::<Dot, FreeDraw>();
        let star = ShapeVtable::new::<Dot, Star>();

        assert!(!core::ptr::eq(free, star));
        assert_eq!(free.type_id(), TypeId::of::<ShapeData<Dot, FreeDraw>>());
        assert_eq!(star.type_id(), TypeId::of::<ShapeData<Dot, Star>>());
    }

    #[test]
    fn test_shape_vtable_layout() {
        let vtable = ShapeVtable::new::<[u32; 5], FreeDrawU32>();
        assert_eq!(vtable.layout(), Layout::new::<ShapeData<[u32; 5], FreeDrawU32>>());
        assert!(vtable.layout().size() >= 20 + size_of::<usize>());
    }

    #[derive(Clone)]
    struct FreeDrawU32;

    impl DrawStrategy<[u32; 5]> for FreeDrawU32 {
        fn draw(&self, values: &[u32; 5], canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            write!(canvas, "{values:?}")
        }
    }
}
