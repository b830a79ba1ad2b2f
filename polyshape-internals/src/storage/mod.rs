//! Storage strategies deciding where a shape's adapter lives.
//!
//! A [`Storage`] hands out raw slots of memory, tells the shape where a slot
//! starts, and takes slots back. The built-in strategies are:
//!
//! - [`Heap`]: one global-allocator block per shape, sized exactly to the
//!   adapter. No capacity limit.
//! - [`Inline`]: a fixed buffer embedded in the shape handle itself. No
//!   allocation at all, at the cost of a compile-time size ceiling.
//!
//! Any other allocation policy (arenas, pools, custom allocators) is plugged
//! in by implementing [`Storage`] for it.
//!
//! # Compile-time capacity checks
//!
//! Bounded storages declare [`Storage::MAX_SIZE`] and [`Storage::MAX_ALIGN`].
//! [`Storage::try_create`] asserts against both inside a `const` block, so
//! placing an oversized or overaligned value into a bounded storage fails
//! when the construction is compiled, never when it runs.

use core::{alloc::Layout, ptr::NonNull};

mod heap;
mod inline;

pub use self::{
    heap::Heap,
    inline::{
        Align8, Align16, DEFAULT_INLINE_ALIGNMENT, DEFAULT_INLINE_CAPACITY, DefaultBuffer, Inline,
        InlineSlot,
    },
};

/// The allocation contract behind every shape.
///
/// # Safety
///
/// Implementors must guarantee:
///
/// 1. A slot returned by [`try_allocate`](Storage::try_allocate) for some
///    `layout` refers to memory that is valid for reads and writes of
///    `layout.size()` bytes and aligned to `layout.align()`, until the slot is
///    passed to [`deallocate`](Storage::deallocate).
/// 2. [`as_ptr`](Storage::as_ptr) and [`as_mut_ptr`](Storage::as_mut_ptr)
///    return the start of that memory. If the memory is embedded in the slot
///    itself, the pointer must be derived from the given reference, and moving
///    the slot must move the memory with it. The pointer returned by `as_ptr`
///    must also permit writes, since the stored value may mutate itself
///    through `&self` (for example through a `Cell`); embedded memory must
///    therefore be wrapped in an [`UnsafeCell`](core::cell::UnsafeCell).
/// 3. The memory of distinct live slots does not overlap.
/// 4. [`MAX_SIZE`](Storage::MAX_SIZE) and [`MAX_ALIGN`](Storage::MAX_ALIGN)
///    are upper bounds of what `try_allocate` accepts: every layout within both
///    bounds either succeeds or fails with
///    [`Exhausted`](AllocationError::Exhausted) or
///    [`OutOfMemory`](AllocationError::OutOfMemory), never with
///    [`DoesNotFit`](AllocationError::DoesNotFit).
pub unsafe trait Storage: Clone {
    /// Owned raw handle to one allocation.
    type Slot;

    /// Largest value size this storage accepts.
    const MAX_SIZE: usize = usize::MAX;

    /// Largest value alignment this storage accepts.
    const MAX_ALIGN: usize = usize::MAX;

    /// Reserves memory for a value with the given layout.
    ///
    /// The returned slot is uninitialized.
    fn try_allocate(&self, layout: Layout) -> Result<Self::Slot, AllocationError>;

    /// Returns the start of the slot's memory for shared access.
    ///
    /// Shared access includes writes to the interior-mutable parts of the
    /// stored value.
    fn as_ptr(slot: &Self::Slot) -> NonNull<u8>;

    /// Returns the start of the slot's memory for writing.
    fn as_mut_ptr(slot: &mut Self::Slot) -> NonNull<u8>;

    /// Releases the slot's memory.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The slot was returned by `try_allocate` on this storage, or on a
    ///    clone of it, with exactly this `layout`.
    /// 2. Any value placed in the slot has already been dropped or moved out.
    /// 3. The slot is not used again after this call.
    unsafe fn deallocate(&self, slot: &mut Self::Slot, layout: Layout);

    /// Places `value` into a new slot.
    ///
    /// Fails to compile when `T` exceeds [`MAX_SIZE`](Storage::MAX_SIZE) or
    /// [`MAX_ALIGN`](Storage::MAX_ALIGN). The error is reported at the
    /// construction site, and the compiler's "the above error was encountered
    /// while instantiating" note names the exact `T` and storage, whose size
    /// and alignment are the offending requirement. A `const` panic message
    /// cannot format the numbers themselves, so the message names which of the
    /// two bounds was exceeded.
    fn try_create<T>(&self, value: T) -> Result<Self::Slot, AllocationError> {
        const {
            assert!(
                size_of::<T>() <= Self::MAX_SIZE,
                "the value is too large for this storage (size_of::<T>() > MAX_SIZE)"
            );
            assert!(
                align_of::<T>() <= Self::MAX_ALIGN,
                "the value is overaligned for this storage (align_of::<T>() > MAX_ALIGN)"
            );
        }

        let mut slot = self.try_allocate(Layout::new::<T>())?;
        let ptr = Self::as_mut_ptr(&mut slot).cast::<T>();
        // SAFETY:
        // 1. The slot was just allocated for `Layout::new::<T>()`, so it is valid
        //    for writes of a `T` and properly aligned (guaranteed by the
        //    `Storage` implementation)
        // 2. The slot is uninitialized, so nothing is overwritten without being
        //    dropped
        unsafe {
            ptr.write(value);
        }
        Ok(slot)
    }

    /// Places `value` into a new slot, treating allocation failure as fatal.
    ///
    /// See [`handle_allocation_error`].
    #[inline]
    fn create<T>(&self, value: T) -> Self::Slot {
        match self.try_create(value) {
            Ok(slot) => slot,
            Err(error) => handle_allocation_error(error),
        }
    }

    /// Drops the `T` stored in the slot and releases the slot.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The slot was returned by [`create`](Storage::create) or
    ///    [`try_create`](Storage::try_create) for a `T` on this storage, or on
    ///    a clone of it.
    /// 2. The value has not been dropped or moved out.
    /// 3. The slot is not used again after this call.
    unsafe fn destroy<T>(&self, slot: &mut Self::Slot) {
        let ptr = Self::as_mut_ptr(slot).cast::<T>();
        // SAFETY:
        // 1. The slot holds an initialized `T` that has not been dropped
        //    (guaranteed by the caller)
        unsafe {
            ptr.drop_in_place();
        }
        // SAFETY:
        // 1. The slot was allocated for `Layout::new::<T>()` on this storage
        //    (guaranteed by the caller)
        // 2. The value was dropped just above
        // 3. Guaranteed by the caller
        unsafe {
            self.deallocate(slot, Layout::new::<T>());
        }
    }
}

/// Reason a [`Storage`] could not provide a slot.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum AllocationError {
    /// The global allocator returned no memory.
    OutOfMemory {
        /// Layout that was requested.
        layout: Layout,
    },
    /// The layout exceeds the fixed capacity or alignment of the storage.
    ///
    /// Typed construction rejects such values at compile time. This variant
    /// is only produced when a type-erased shape is copied or moved into a
    /// different storage.
    DoesNotFit {
        /// Layout that was requested.
        layout: Layout,
        /// Capacity of the storage in bytes.
        capacity: usize,
        /// Alignment of the storage in bytes.
        alignment: usize,
    },
    /// Every slot of a fixed-size storage is in use.
    Exhausted {
        /// Total number of slots in the storage.
        slots: usize,
    },
}

impl core::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory { layout } => write!(
                f,
                "out of memory while allocating {} bytes aligned to {}",
                layout.size(),
                layout.align()
            ),
            Self::DoesNotFit {
                layout,
                capacity,
                alignment,
            } => write!(
                f,
                "a value of {} bytes aligned to {} does not fit a storage of {} bytes aligned to {}",
                layout.size(),
                layout.align(),
                capacity,
                alignment
            ),
            Self::Exhausted { slots } => write!(f, "all {slots} slots of the storage are in use"),
        }
    }
}

impl core::error::Error for AllocationError {}

/// Treats an allocation failure as fatal.
///
/// Out-of-memory conditions are forwarded to
/// [`alloc::alloc::handle_alloc_error`], matching how the standard collections
/// react to memory exhaustion. Every other failure panics with the error's
/// message.
#[cold]
#[track_caller]
pub fn handle_allocation_error(error: AllocationError) -> ! {
    match error {
        AllocationError::OutOfMemory { layout } => alloc::alloc::handle_alloc_error(layout),
        error => panic!("{error}"),
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_allocation_error_display() {
        let layout = Layout::new::<[u64; 4]>();
        assert_eq!(
            AllocationError::OutOfMemory { layout }.to_string(),
            "out of memory while allocating 32 bytes aligned to 8"
        );
        assert_eq!(
            AllocationError::DoesNotFit {
                layout,
                capacity: 16,
                alignment: 8
            }
            .to_string(),
            "a value of 32 bytes aligned to 8 does not fit a storage of 16 bytes aligned to 8"
        );
        assert_eq!(
            AllocationError::Exhausted { slots: 3 }.to_string(),
            "all 3 slots of the storage are in use"
        );
    }

    #[test]
    #[should_panic(expected = "all 2 slots of the storage are in use")]
    fn test_handle_allocation_error_panics_for_exhaustion() {
        handle_allocation_error(AllocationError::Exhausted { slots: 2 });
    }

    #[test]
    fn test_create_and_destroy_run_drop_once() {
        use core::cell::Cell;

        struct Counted<'a>(&'a Cell<usize>);
        impl Drop for Counted<'_> {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Cell::new(0);
        let mut heap_slot = Heap.create(Counted(&drops));
        let mut inline_slot = Inline::<DefaultBuffer>::default().create(Counted(&drops));
        assert_eq!(drops.get(), 0);

        // SAFETY: Both slots hold a live `Counted` created on the same storage.
        unsafe { Heap.destroy::<Counted<'_>>(&mut heap_slot) };
        assert_eq!(drops.get(), 1);
        // SAFETY: Same as above.
        unsafe { Inline::<DefaultBuffer>::default().destroy::<Counted<'_>>(&mut inline_slot) };
        assert_eq!(drops.get(), 2);
    }
}
