use core::{alloc::Layout, ptr::NonNull};

use crate::storage::{AllocationError, Storage};

/// Places every shape in its own block from the global allocator.
///
/// The block is sized exactly to the adapter, so there is no capacity limit.
/// Moving a heap-backed shape moves one pointer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Heap;

// SAFETY:
// 1. Non-zero-sized blocks come from `alloc::alloc::alloc` with the requested
//    layout and stay valid until `dealloc`. Zero-sized slots are dangling but
//    aligned, which is valid for zero-sized reads and writes.
// 2. The slot is the pointer itself; moving the slot does not move the memory.
// 3. The global allocator never hands out overlapping live blocks.
// 4. The bounds are unlimited, and `try_allocate` never reports `DoesNotFit`.
unsafe impl Storage for Heap {
    type Slot = NonNull<u8>;

    fn try_allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError> {
        let ptr = if layout.size() == 0 {
            core::ptr::without_provenance_mut::<u8>(layout.align())
        } else {
            // SAFETY:
            // 1. The layout has a non-zero size
            unsafe { alloc::alloc::alloc(layout) }
        };
        NonNull::new(ptr).ok_or(AllocationError::OutOfMemory { layout })
    }

    #[inline]
    fn as_ptr(slot: &NonNull<u8>) -> NonNull<u8> {
        *slot
    }

    #[inline]
    fn as_mut_ptr(slot: &mut NonNull<u8>) -> NonNull<u8> {
        *slot
    }

    unsafe fn deallocate(&self, slot: &mut NonNull<u8>, layout: Layout) {
        if layout.size() != 0 {
            // SAFETY:
            // 1. The block was allocated by the global allocator with this exact
            //    layout (guaranteed by the caller)
            // 2. The block is not used again (guaranteed by the caller)
            unsafe { alloc::alloc::dealloc(slot.as_ptr(), layout) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_zero_sized_slot_is_aligned() {
        let layout = Layout::from_size_align(0, 64).unwrap();
        let mut slot = Heap.try_allocate(layout).unwrap();
        assert_eq!(Heap::as_ptr(&slot).as_ptr() as usize % 64, 0);
        // SAFETY: The slot was allocated above with the same layout and holds
        // no value.
        unsafe { Heap.deallocate(&mut slot, layout) };
    }

    #[test]
    fn test_heap_is_unbounded() {
        assert_eq!(<Heap as Storage>::MAX_SIZE, usize::MAX);
        assert_eq!(<Heap as Storage>::MAX_ALIGN, usize::MAX);
        assert_eq!(core::mem::size_of::<Heap>(), 0);
    }
}
