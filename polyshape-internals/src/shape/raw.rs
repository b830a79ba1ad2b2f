//! Type-erased shape handle types.
//!
//! This module encapsulates the fields of [`RawShape`] and [`RawShapeRef`],
//! ensuring they are only visible within this module. This visibility
//! restriction guarantees the safety invariant: **the slot of a [`RawShape`]
//! always holds an initialized `ShapeData<S, D>` that was placed there by the
//! storage it is paired with**.
//!
//! # Safety Invariant
//!
//! A slot can only be filled through [`RawShape::new`], [`RawShape::try_new`],
//! [`RawShapeRef::try_clone_in`], [`RawShape::try_relocate`] and
//! [`RawShapeBorrow::try_to_owned_in`], all of which write a complete adapter
//! before the handle exists. The slot and storage cannot be modified
//! afterwards, so the [`Drop`] implementation can always run the adapter's
//! destructor and hand the slot back to the storage that allocated it.
//!
//! # Type Erasure
//!
//! The concrete payload type `S` and strategy type `D` are erased by casting
//! the slot pointer to `ShapeData<Erased, Erased>`. The vtable stored at the
//! start of every adapter provides everything needed to operate on it.
//!
//! [`RawShapeBorrow::try_to_owned_in`]: crate::RawShapeBorrow::try_to_owned_in

use core::{alloc::Layout, any::TypeId, marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

use crate::{
    handlers::DrawStrategy,
    shape::data::ShapeData,
    storage::{AllocationError, Storage, handle_allocation_error},
    util::Erased,
};

/// An owned, type-erased adapter placed in a slot of the storage `St`.
///
/// The slot is guaranteed to hold an initialized `ShapeData<S, D>` for some
/// specific `S` and `D`, though we do not know which. It is allowed to become
/// uninitialized inside the [`Drop`] implementation only.
pub struct RawShape<St: Storage> {
    /// Where the adapter lives
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The slot was allocated by `storage` (or a clone of it) with the
    ///    layout recorded in the adapter's vtable.
    /// 2. The slot holds an initialized `ShapeData<S, D>` for some `S` and `D`,
    ///    except during the execution of the `Drop` implementation.
    slot: St::Slot,
    /// The storage that allocated `slot`
    storage: St,
    /// Shapes are neither `Send` nor `Sync`, whatever the slot type is
    _not_send: PhantomData<*const ()>,
}

impl<St: Storage> RawShape<St> {
    /// Wraps `shape` and `strategy` in a new adapter placed in `storage`.
    ///
    /// Fails to compile if the adapter exceeds the storage's
    /// [`MAX_SIZE`](Storage::MAX_SIZE) or [`MAX_ALIGN`](Storage::MAX_ALIGN).
    /// Other allocation failures are passed to
    /// [`handle_allocation_error`].
    #[inline]
    pub fn new<S, D>(storage: St, shape: S, strategy: D) -> Self
    where
        S: Clone + 'static,
        D: DrawStrategy<S> + Clone + 'static,
    {
        match Self::try_new(storage, shape, strategy) {
            Ok(this) => this,
            Err(error) => handle_allocation_error(error),
        }
    }

    /// Wraps `shape` and `strategy` in a new adapter placed in `storage`.
    ///
    /// Fails to compile if the adapter exceeds the storage's
    /// [`MAX_SIZE`](Storage::MAX_SIZE) or [`MAX_ALIGN`](Storage::MAX_ALIGN).
    /// On a runtime allocation failure the value and strategy are dropped.
    pub fn try_new<S, D>(storage: St, shape: S, strategy: D) -> Result<Self, AllocationError>
    where
        S: Clone + 'static,
        D: DrawStrategy<S> + Clone + 'static,
    {
        let slot = storage.try_create(ShapeData::new(shape, strategy))?;
        Ok(Self {
            slot,
            storage,
            _not_send: PhantomData,
        })
    }

    /// Returns a reference to the adapter.
    #[inline]
    pub fn as_ref(&self) -> RawShapeRef<'_> {
        RawShapeRef {
            ptr: St::as_ptr(&self.slot).cast(),
            _marker: PhantomData,
        }
    }

    /// Returns the storage this shape was placed by.
    #[inline]
    pub fn storage(&self) -> &St {
        &self.storage
    }

    /// Deep-clones the adapter into a new slot of a clone of this shape's
    /// storage.
    #[inline]
    pub fn try_clone(&self) -> Result<Self, AllocationError> {
        self.as_ref().try_clone_in(self.storage.clone())
    }

    /// Moves the adapter into a slot of `storage` without cloning or dropping
    /// the payload.
    ///
    /// On failure the shape is handed back unchanged together with the error.
    pub fn try_relocate<St2: Storage>(
        self,
        storage: St2,
    ) -> Result<RawShape<St2>, (Self, AllocationError)> {
        let vtable = self.as_ref().vtable();
        let layout = vtable.layout();
        let mut slot = match storage.try_allocate(layout) {
            Ok(slot) => slot,
            Err(error) => return Err((self, error)),
        };

        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so each field is moved out exactly
        // once. Moving the slot keeps the adapter inside it intact.
        let mut old_slot = unsafe { core::ptr::read(&this.slot) };
        // SAFETY: Same as above.
        let old_storage = unsafe { core::ptr::read(&this.storage) };

        let src = St::as_mut_ptr(&mut old_slot).cast::<ShapeData<Erased, Erased>>();
        let dst = St2::as_mut_ptr(&mut slot);

        // SAFETY:
        // 1. The vtable was read from the adapter now at `src`
        // 2. `src` points to the initialized adapter of this shape (guaranteed by
        //    the invariants of `RawShape`)
        // 3. `dst` was just allocated for `layout`, is uninitialized and is
        //    distinct from the old slot
        // 4. The old slot is deallocated below and never read again
        unsafe {
            vtable.relocate(src, dst);
        }

        // SAFETY:
        // 1. The slot was allocated by this storage with `layout` (guaranteed by
        //    the invariants of `RawShape`)
        // 2. The adapter was moved out just above
        // 3. The old slot goes out of scope right after
        unsafe {
            old_storage.deallocate(&mut old_slot, layout);
        }

        Ok(RawShape {
            slot,
            storage,
            _not_send: PhantomData,
        })
    }

    /// Allocates a slot of `layout` in `storage` and lets `init` fill it.
    ///
    /// If `init` panics, the slot is released before the panic continues.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `init` writes an initialized `ShapeData<S, D>` to the pointer it
    ///    receives before returning, for some `S` and `D` whose layout is
    ///    `layout`, and whose vtable is the one for `S` and `D`.
    pub(super) unsafe fn try_emplace(
        storage: St,
        layout: Layout,
        init: impl FnOnce(NonNull<u8>),
    ) -> Result<Self, AllocationError> {
        /// Releases the slot if `init` unwinds.
        struct Guard<'s, St: Storage> {
            /// The storage the slot came from
            storage: &'s St,
            /// The slot being filled
            slot: &'s mut St::Slot,
            /// Layout the slot was allocated with
            layout: Layout,
        }

        impl<St: Storage> Drop for Guard<'_, St> {
            fn drop(&mut self) {
                // SAFETY:
                // 1. The slot was allocated by this storage with `layout`
                // 2. `init` did not finish, and writes its value as a whole, so
                //    the slot holds nothing to drop
                // 3. The slot is discarded after the unwind
                unsafe {
                    self.storage.deallocate(self.slot, self.layout);
                }
            }
        }

        let mut slot = storage.try_allocate(layout)?;
        let guard = Guard {
            storage: &storage,
            slot: &mut slot,
            layout,
        };
        init(St::as_mut_ptr(&mut *guard.slot));
        core::mem::forget(guard);

        Ok(Self {
            slot,
            storage,
            _not_send: PhantomData,
        })
    }
}

impl<St: Storage> Drop for RawShape<St> {
    #[inline]
    fn drop(&mut self) {
        let vtable = self.as_ref().vtable();
        let layout = vtable.layout();
        let ptr = St::as_mut_ptr(&mut self.slot).cast::<ShapeData<Erased, Erased>>();

        // SAFETY:
        // 1. The vtable was read from the adapter at `ptr`
        // 2. The adapter is initialized (guaranteed by the invariants of
        //    `RawShape`) and the pointer comes from a mutable borrow of the slot
        // 3. We are in the drop function, so only the deallocation below follows
        unsafe {
            vtable.drop_in_place(ptr);
        }
        // SAFETY:
        // 1. The slot was allocated by this storage with `layout` (guaranteed by
        //    the invariants of `RawShape`)
        // 2. The adapter was dropped just above
        // 3. We are in the drop function
        unsafe {
            self.storage.deallocate(&mut self.slot, layout);
        }
    }
}

/// A lifetime-bound pointer to an adapter that is guaranteed to be an
/// initialized `ShapeData<S, D>` for some specific `S` and `D`, though we do
/// not know which.
#[derive(Clone, Copy)]
#[repr(transparent)]
pub struct RawShapeRef<'a> {
    /// Pointer to the adapter
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer refers to an initialized `ShapeData<S, D>` for some `S`
    ///    and `D`, valid for reads for the lifetime `'a`.
    ptr: NonNull<ShapeData<Erased, Erased>>,

    /// Marker to tell the compiler that we should behave the same as a
    /// `&'a ShapeData<Erased, Erased>`
    _marker: PhantomData<&'a ShapeData<Erased, Erased>>,
}

impl<'a> RawShapeRef<'a> {
    /// Creates a reference from a pointer to an adapter.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer refers to an initialized `ShapeData<S, D>` for some `S`
    ///    and `D`, created with [`ShapeData::new`], that stays valid for reads
    ///    for the lifetime `'a`.
    #[inline]
    pub(super) unsafe fn from_ptr(ptr: NonNull<ShapeData<Erased, Erased>>) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Casts the [`RawShapeRef`] to a [`ShapeData<S, D>`] reference.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The types `S` and `D` match the actual payload and strategy types
    ///    stored in the [`ShapeData`].
    #[inline]
    pub(super) unsafe fn cast_inner<S: 'static, D: 'static>(self) -> &'a ShapeData<S, D> {
        // Debug assertion to catch type mismatches in case of bugs
        debug_assert_eq!(self.vtable().type_id(), TypeId::of::<ShapeData<S, D>>());

        let this = self.ptr.cast::<ShapeData<S, D>>();
        // SAFETY: Converting the NonNull pointer to a reference is sound because:
        // - The pointer is non-null, properly aligned, and dereferenceable (guaranteed
        //   by the invariants of `RawShapeRef`)
        // - The pointee is an initialized `ShapeData<S, D>` (the invariants of
        //   `RawShapeRef` and the caller's guarantee about `S` and `D`)
        // - Shared access is allowed for the lifetime `'a`
        unsafe { this.as_ref() }
    }

    /// Returns a raw pointer to the adapter.
    #[inline]
    pub(super) fn as_ptr(self) -> *const ShapeData<Erased, Erased> {
        self.ptr.as_ptr()
    }

    /// Returns the pointer to the adapter.
    #[inline]
    pub(super) fn as_non_null(self) -> NonNull<ShapeData<Erased, Erased>> {
        self.ptr
    }

    /// Draws the adapter with the strategy it was created with.
    #[inline]
    pub fn draw(self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
        let vtable = self.vtable();
        // SAFETY:
        // 1. The vtable returned by `self.vtable()` is guaranteed to match the data in
        //    the `ShapeData`.
        unsafe { vtable.draw(self, canvas) }
    }

    /// Returns the layout of the adapter, which is what a storage must
    /// provide to hold a copy of it.
    #[inline]
    pub fn layout(self) -> Layout {
        self.vtable().layout()
    }

    /// Deep-clones the adapter into a new slot of `storage`.
    ///
    /// Fails with [`AllocationError::DoesNotFit`] if `storage` is bounded and
    /// the adapter exceeds its bounds. If cloning the payload panics, the new
    /// slot is released and nothing else is affected.
    pub fn try_clone_in<St: Storage>(self, storage: St) -> Result<RawShape<St>, AllocationError> {
        let vtable = self.vtable();
        let init = |dst: NonNull<u8>| {
            // SAFETY:
            // 1. The vtable was read from this adapter
            // 2. `dst` was allocated for `vtable.layout()` (guaranteed by
            //    `try_emplace`)
            // 3. `dst` is uninitialized
            unsafe { vtable.clone_to(self, dst) }
        };
        // SAFETY:
        // 1. `clone_to` writes a complete `ShapeData<S, D>` with the same types,
        //    and therefore the same layout and vtable, as this adapter
        unsafe { RawShape::try_emplace(storage, vtable.layout(), init) }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::{
        handlers::{Draw, FreeDraw},
        storage::{Align8, DefaultBuffer, Heap, Inline},
    };

    #[derive(Clone)]
    struct Label(String);

    impl Draw for Label {
        fn draw(&self, canvas: &mut dyn core::fmt::Write) -> core::fmt::Result {
            write!(canvas, "label: {}", self.0)
        }
    }

    fn draw_to_string(shape: RawShapeRef<'_>) -> String {
        let mut out = String::new();
        shape.draw(&mut out).unwrap();
        out
    }

    #[test]
    fn test_raw_shape_size() {
        assert_eq!(size_of::<RawShape<Heap>>(), size_of::<usize>());
        assert_eq!(size_of::<Option<RawShape<Heap>>>(), size_of::<usize>());
        assert_eq!(size_of::<RawShapeRef<'_>>(), size_of::<usize>());
        assert_eq!(size_of::<Option<RawShapeRef<'_>>>(), size_of::<usize>());
        assert_eq!(size_of::<RawShape<Inline>>(), size_of::<DefaultBuffer>());
    }

    #[test]
    fn test_raw_shape_draws_through_strategy() {
        let free = RawShape::new(Heap, Label(String::from("a")), FreeDraw);
        let loud = RawShape::new(
            Heap,
            Label(String::from("a")),
            |label: &Label, canvas: &mut dyn core::fmt::Write| write!(canvas, "LABEL {}", label.0),
        );

        assert_eq!(draw_to_string(free.as_ref()), "label: a");
        assert_eq!(draw_to_string(loud.as_ref()), "LABEL a");
        assert!(!core::ptr::eq(free.as_ref().vtable(), loud.as_ref().vtable()));
    }

    #[test]
    fn test_raw_shape_clone_is_deep() {
        let original = RawShape::new(Inline::<DefaultBuffer>::new(), Label(String::from("x")), FreeDraw);
        let copy = original.try_clone().unwrap();
        assert_ne!(original.as_ref().as_ptr(), copy.as_ref().as_ptr());

        drop(original);
        assert_eq!(draw_to_string(copy.as_ref()), "label: x");
    }

    #[test]
    fn test_raw_shape_relocate_between_storages() {
        let inline = RawShape::new(Inline::<DefaultBuffer>::new(), Label(String::from("m")), FreeDraw);
        let heap = match inline.try_relocate(Heap) {
            Ok(heap) => heap,
            Err(_) => panic!("heap storage is unbounded"),
        };
        assert_eq!(draw_to_string(heap.as_ref()), "label: m");
    }

    #[test]
    fn test_raw_shape_relocate_failure_returns_shape() {
        let heap = RawShape::new(Heap, Label(String::from("big")), FreeDraw);
        let Err((heap, error)) = heap.try_relocate(Inline::<Align8<8>>::new()) else {
            panic!("an adapter holding a String does not fit 8 bytes");
        };
        assert!(matches!(error, AllocationError::DoesNotFit { capacity: 8, .. }));
        assert_eq!(draw_to_string(heap.as_ref()), "label: big");
    }

    #[test]
    fn test_raw_shape_layout() {
        let shape = RawShape::new(Heap, 7_u64, |value: &u64, canvas: &mut dyn core::fmt::Write| {
            write!(canvas, "{value}")
        });
        let layout = shape.as_ref().layout();
        assert!(layout.size() >= size_of::<u64>() + size_of::<usize>());
        assert_eq!(layout.align(), align_of::<u64>().max(align_of::<usize>()));
        assert_eq!(draw_to_string(shape.as_ref()), "7");
    }

    #[test]
    fn test_send_sync() {
        static_assertions::assert_not_impl_any!(RawShape<Heap>: Send, Sync);
        static_assertions::assert_not_impl_any!(RawShape<Inline>: Send, Sync);
        static_assertions::assert_not_impl_any!(RawShapeRef<'_>: Send, Sync);
    }
}
