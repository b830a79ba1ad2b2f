use alloc::{boxed::Box, vec::Vec};
use core::{
    alloc::Layout,
    cell::{RefCell, UnsafeCell},
    mem::MaybeUninit,
    ptr::NonNull,
};

use crate::storage::{AllocationError, DefaultBuffer, Storage};

/// A fixed number of equally sized blocks that shapes can be placed in.
///
/// Every block is shaped like `B`: a value fits when its adapter is no larger
/// and no more aligned than `B`, which is checked when the construction is
/// compiled. The number of blocks is chosen at runtime and never grows; once
/// every block is taken, further allocations fail with
/// [`AllocationError::Exhausted`] until a pooled shape is dropped.
///
/// The storage is `&Pool<B>`, so the borrow checker guarantees the pool
/// outlives every shape placed in it.
///
/// # Examples
///
/// ```
/// use polyshape::{Draw, Shape, storage::Pool};
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
/// let pool: Pool = Pool::new(2);
/// let first = Shape::new_in(&pool, Dot);
/// let second = first.clone();
/// assert_eq!(pool.available(), 0);
/// assert!(Shape::try_new_in(&pool, Dot).is_err());
///
/// drop(first);
/// assert_eq!(pool.available(), 1);
/// assert_eq!(second.to_string(), ".");
/// ```
pub struct Pool<B = DefaultBuffer> {
    /// The blocks, each shaped like `B`
    blocks: Box<[UnsafeCell<MaybeUninit<B>>]>,
    /// Indices of the blocks not holding a shape
    free: RefCell<Vec<usize>>,
}

impl<B> Pool<B> {
    /// Creates a pool with `slots` blocks.
    pub fn new(slots: usize) -> Self {
        let blocks = (0..slots)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();
        // Lowest index is handed out first
        let free = (0..slots).rev().collect();
        Self {
            blocks,
            free: RefCell::new(free),
        }
    }

    /// Total number of blocks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }

    /// Number of blocks not currently holding a shape.
    #[inline]
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }
}

impl<B> core::fmt::Debug for Pool<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pool")
            .field("block_size", &size_of::<B>())
            .field("block_align", &align_of::<B>())
            .field("capacity", &self.capacity())
            .field("available", &self.available())
            .finish()
    }
}

/// Slot of a [`Pool`]: one taken block.
#[derive(Debug)]
#[allow(missing_copy_implementations)]
pub struct PoolSlot {
    /// Position of the block in the pool
    index: usize,
    /// Start of the block
    ptr: NonNull<u8>,
}

// SAFETY:
// 1. Every block is `size_of::<B>()` bytes aligned to `align_of::<B>()`, and
//    `try_allocate` only accepts layouts within both. The block stays valid
//    while the pool is borrowed, which outlasts the slot.
// 2. The slot stores the block's address, which does not move with the slot.
// 3. A block index is in the free list or in exactly one live slot.
// 4. Layouts within the bounds fail only with `Exhausted`.
unsafe impl<'p, B> Storage for &'p Pool<B> {
    type Slot = PoolSlot;

    const MAX_SIZE: usize = size_of::<B>();
    const MAX_ALIGN: usize = align_of::<B>();

    fn try_allocate(&self, layout: Layout) -> Result<PoolSlot, AllocationError> {
        if layout.size() > Self::MAX_SIZE || layout.align() > Self::MAX_ALIGN {
            tracing::warn!(
                size = layout.size(),
                align = layout.align(),
                block_size = Self::MAX_SIZE,
                block_align = Self::MAX_ALIGN,
                "value does not fit a pool block"
            );
            return Err(AllocationError::DoesNotFit {
                layout,
                capacity: Self::MAX_SIZE,
                alignment: Self::MAX_ALIGN,
            });
        }

        let Some(index) = self.free.borrow_mut().pop() else {
            tracing::warn!(slots = self.capacity(), "pool exhausted");
            return Err(AllocationError::Exhausted {
                slots: self.capacity(),
            });
        };
        tracing::trace!(index, available = self.available(), "pool block taken");

        let ptr = NonNull::from(&self.blocks[index]).cast::<u8>();
        Ok(PoolSlot { index, ptr })
    }

    #[inline]
    fn as_ptr(slot: &PoolSlot) -> NonNull<u8> {
        slot.ptr
    }

    #[inline]
    fn as_mut_ptr(slot: &mut PoolSlot) -> NonNull<u8> {
        slot.ptr
    }

    unsafe fn deallocate(&self, slot: &mut PoolSlot, _layout: Layout) {
        self.free.borrow_mut().push(slot.index);
        tracing::trace!(index = slot.index, available = self.available(), "pool block returned");
    }
}
