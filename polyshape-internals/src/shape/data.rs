//! This module encapsulates the fields of the [`ShapeData`]. Since this is the
//! only place they are visible, the [`ShapeVtable`] stored in an adapter is
//! guaranteed to always be in sync with the payload and strategy types next
//! to it. They are in sync when created, and the API offers no way to change
//! the [`ShapeVtable`], the payload type or the strategy type afterwards.

use crate::{
    handlers::DrawStrategy,
    shape::{raw::RawShapeRef, vtable::ShapeVtable},
};

/// The adapter: a payload, the strategy that draws it, and the vtable that
/// erases both.
///
/// This struct uses `#[repr(C)]` so that the vtable field can be read even
/// when the concrete payload type `S` and strategy type `D` are unknown.
#[repr(C)]
pub(crate) struct ShapeData<S: 'static, D: 'static> {
    /// The vtable of this adapter
    vtable: &'static ShapeVtable,
    /// The wrapped value
    shape: S,
    /// How the wrapped value is drawn
    strategy: D,
}

impl<S: Clone + 'static, D: DrawStrategy<S> + Clone + 'static> ShapeData<S, D> {
    /// Creates a new [`ShapeData`], pairing the value and strategy with the
    /// vtable for exactly these two types.
    #[inline]
    pub(crate) fn new(shape: S, strategy: D) -> Self {
        Self {
            vtable: ShapeVtable::new::<S, D>(),
            shape,
            strategy,
        }
    }
}

impl<S: 'static, D: DrawStrategy<S> + 'static> ShapeData<S, D> {
    /// Draws the payload through the stored strategy.
    #[inline]
    pub(super) fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        self.strategy.draw(&self.shape, canvas)
    }
}

impl<S: Clone + 'static, D: Clone + 'static> Clone for ShapeData<S, D> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            vtable: self.vtable,
            shape: self.shape.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

impl<'a> RawShapeRef<'a> {
    /// Returns a reference to the [`ShapeVtable`] of the [`ShapeData`]
    /// instance.
    #[inline]
    pub(super) fn vtable(self) -> &'static ShapeVtable {
        let ptr = self.as_ptr();
        // SAFETY: We don't know the actual payload or strategy types, but we do
        // know that the pointer refers to an instance of `ShapeData<S, D>` for
        // some specific `S` and `D`. Since `ShapeData<S, D>` is `#[repr(C)]`,
        // it is safe to create pointers to the fields before the payload.
        //
        // No reference to the `ShapeData` itself is created, as that would
        // still be undefined behavior since we don't have the right type.
        let vtable_ptr: *const &'static ShapeVtable = unsafe { &raw const (*ptr).vtable };

        // SAFETY: Dereferencing the pointer and getting out the
        // `&'static ShapeVtable` is valid for the same reasons
        unsafe { *vtable_ptr }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FreeDraw;

    #[test]
    fn test_shape_field_offsets() {
        use core::mem::{offset_of, size_of};

        #[repr(align(32))]
        #[derive(Clone)]
        struct LargeAlignment {
            _value: u8,
        }

        assert_eq!(offset_of!(ShapeData<u8, FreeDraw>, vtable), 0);
        assert_eq!(offset_of!(ShapeData<u32, FreeDraw>, vtable), 0);
        assert_eq!(offset_of!(ShapeData<[u64; 4], FreeDraw>, vtable), 0);
        assert_eq!(offset_of!(ShapeData<LargeAlignment, FreeDraw>, vtable), 0);
        assert_eq!(offset_of!(ShapeData<u8, LargeAlignment>, vtable), 0);

        assert!(offset_of!(ShapeData<u8, FreeDraw>, shape) >= size_of::<&'static ShapeVtable>());
        assert!(
            offset_of!(ShapeData<LargeAlignment, FreeDraw>, shape)
                >= size_of::<&'static ShapeVtable>()
        );
        assert!(
            offset_of!(ShapeData<u8, LargeAlignment>, strategy)
                > offset_of!(ShapeData<u8, LargeAlignment>, shape)
        );
    }

    #[test]
    fn test_free_draw_adds_no_size() {
        assert_eq!(
            size_of::<ShapeData<[u64; 4], FreeDraw>>(),
            size_of::<&'static ShapeVtable>() + size_of::<[u64; 4]>()
        );
    }
}
