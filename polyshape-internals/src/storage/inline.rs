//! Allocation-free storage embedded in the shape handle.
//!
//! The adapter is written directly into a buffer of type `B` that lives
//! inside the slot, and therefore inside the owning shape. The capacity and
//! alignment of the buffer are the size and alignment of `B`; values that do
//! not fit are rejected when the construction is compiled.
//!
//! Moving an inline shape moves the buffer bytes along with it. Every Rust
//! value can be relocated by a plain byte copy, so this is a true move: the
//! payload is neither cloned nor dropped.

use core::{
    alloc::Layout, cell::UnsafeCell, marker::PhantomData, mem::MaybeUninit, ptr::NonNull,
};

use crate::storage::{AllocationError, Storage};

/// Capacity in bytes of [`DefaultBuffer`].
pub const DEFAULT_INLINE_CAPACITY: usize = 128;

/// Alignment in bytes of [`DefaultBuffer`].
pub const DEFAULT_INLINE_ALIGNMENT: usize = 16;

/// Byte buffer of `N` bytes aligned to 8.
#[derive(Copy, Clone, Debug)]
#[repr(C, align(8))]
pub struct Align8<const N: usize>(pub [u8; N]);

/// Byte buffer of `N` bytes aligned to 16.
#[derive(Copy, Clone, Debug)]
#[repr(C, align(16))]
pub struct Align16<const N: usize>(pub [u8; N]);

/// The buffer used by [`Inline`] when none is named: 128 bytes aligned to 16.
pub type DefaultBuffer = Align16<DEFAULT_INLINE_CAPACITY>;

const _: () = {
    assert!(size_of::<DefaultBuffer>() == DEFAULT_INLINE_CAPACITY);
    assert!(align_of::<DefaultBuffer>() == DEFAULT_INLINE_ALIGNMENT);
};

/// Stores the adapter inside the shape handle, in a buffer shaped like `B`.
///
/// Any sized type can serve as the buffer. [`Align8`] and [`Align16`] cover
/// the common cases; a payload type itself can be used to get a buffer that
/// fits it exactly.
///
/// # Examples
///
/// ```
/// use polyshape_internals::storage::{Align8, Inline, Storage};
///
/// type Small = Inline<Align8<32>>;
/// assert_eq!(<Small as Storage>::MAX_SIZE, 32);
/// assert_eq!(<Small as Storage>::MAX_ALIGN, 8);
/// ```
pub struct Inline<B = DefaultBuffer>(PhantomData<fn() -> B>);

impl<B> Inline<B> {
    /// Creates the storage. It carries no state.
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<B> Clone for Inline<B> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for Inline<B> {}

impl<B> Default for Inline<B> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<B> core::fmt::Debug for Inline<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Inline")
            .field("capacity", &size_of::<B>())
            .field("alignment", &align_of::<B>())
            .finish()
    }
}

/// Slot of an [`Inline`] storage: the raw buffer itself.
///
/// The buffer sits in an [`UnsafeCell`], so a payload with interior
/// mutability can be drawn through a shared reference to the shape.
pub struct InlineSlot<B>(UnsafeCell<MaybeUninit<B>>);

// SAFETY:
// 1. The slot owns `size_of::<B>()` bytes aligned to `align_of::<B>()`, and
//    `try_allocate` only accepts layouts within both.
// 2. The pointers are derived from the reference to the slot through
//    `UnsafeCell::get`, so shared access may write. The memory is the slot
//    itself, so it moves with it.
// 3. Every slot is its own buffer.
// 4. `try_allocate` accepts exactly the layouts within `MAX_SIZE` and
//    `MAX_ALIGN`.
unsafe impl<B> Storage for Inline<B> {
    type Slot = InlineSlot<B>;

    const MAX_SIZE: usize = size_of::<B>();
    const MAX_ALIGN: usize = align_of::<B>();

    fn try_allocate(&self, layout: Layout) -> Result<InlineSlot<B>, AllocationError> {
        if layout.size() > Self::MAX_SIZE || layout.align() > Self::MAX_ALIGN {
            return Err(AllocationError::DoesNotFit {
                layout,
                capacity: Self::MAX_SIZE,
                alignment: Self::MAX_ALIGN,
            });
        }
        Ok(InlineSlot(UnsafeCell::new(MaybeUninit::uninit())))
    }

    #[inline]
    fn as_ptr(slot: &InlineSlot<B>) -> NonNull<u8> {
        // SAFETY:
        // 1. `UnsafeCell::get` returns a pointer derived from a reference, which
        //    is never null
        unsafe { NonNull::new_unchecked(slot.0.get().cast()) }
    }

    #[inline]
    fn as_mut_ptr(slot: &mut InlineSlot<B>) -> NonNull<u8> {
        // SAFETY:
        // 1. `UnsafeCell::get` returns a pointer derived from a reference, which
        //    is never null
        unsafe { NonNull::new_unchecked(slot.0.get().cast()) }
    }

    #[inline]
    unsafe fn deallocate(&self, _slot: &mut InlineSlot<B>, _layout: Layout) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_buffer_geometry() {
        assert_eq!(<Inline as Storage>::MAX_SIZE, DEFAULT_INLINE_CAPACITY);
        assert_eq!(<Inline as Storage>::MAX_ALIGN, DEFAULT_INLINE_ALIGNMENT);
        assert_eq!(size_of::<InlineSlot<DefaultBuffer>>(), 128);
        assert_eq!(size_of::<Inline>(), 0);
    }

    #[test]
    fn test_inline_rejects_ill_fitting_layouts() {
        let storage = Inline::<Align8<16>>::new();
        assert!(storage.try_allocate(Layout::new::<[u64; 2]>()).is_ok());

        let too_big = Layout::new::<[u64; 3]>();
        assert_eq!(
            storage.try_allocate(too_big).err(),
            Some(AllocationError::DoesNotFit {
                layout: too_big,
                capacity: 16,
                alignment: 8
            })
        );

        let overaligned = Layout::from_size_align(16, 16).unwrap();
        assert!(matches!(
            storage.try_allocate(overaligned),
            Err(AllocationError::DoesNotFit { .. })
        ));
    }

    #[test]
    fn test_inline_pointer_is_aligned() {
        let storage = Inline::<DefaultBuffer>::new();
        let mut slot = storage.try_allocate(Layout::new::<u128>()).unwrap();
        assert_eq!(Inline::<DefaultBuffer>::as_mut_ptr(&mut slot).as_ptr() as usize % 16, 0);
        assert_eq!(
            Inline::<DefaultBuffer>::as_ptr(&slot),
            Inline::<DefaultBuffer>::as_mut_ptr(&mut slot)
        );
    }

    #[test]
    fn test_shared_pointer_allows_interior_writes() {
        let storage = Inline::<Align8<8>>::new();
        let slot = storage.create(core::cell::Cell::new(1_u64));
        let ptr = Inline::<Align8<8>>::as_ptr(&slot).cast::<core::cell::Cell<u64>>();
        // SAFETY: The slot holds an initialized `Cell<u64>` that is only
        // accessed through shared references here
        let cell = unsafe { ptr.as_ref() };
        cell.set(cell.get() + 1);
        cell.set(cell.get() + 1);
        assert_eq!(cell.get(), 3);
    }
}
