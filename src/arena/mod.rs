//! Bump-pointer arena backing every allocation made while a project is
//! loaded and built.
//!
//! The arena owns an ordered chain of heap blocks. Allocation bumps a
//! cursor in the current block and moves on to (or appends) a later block
//! once the request no longer fits. Individual allocations are never
//! freed; [`Arena::reset`] rewinds every cursor and [`Arena::release`]
//! returns the blocks to the system allocator.
//!
//! Allocation goes through `&self` and hands out references tied to that
//! shared borrow, so the parsed project model can hold plain `&'a str`
//! views into arena memory. `reset` and `release` take `&mut self`, which
//! statically invalidates every outstanding view.
//!
//! ```
//! use catalyze::arena::Arena;
//!
//! let arena = Arena::new(0);
//! let name = arena.alloc_str("app");
//! let flags = arena.alloc_slice_copy(&["-O2", "-Wall"]);
//! assert_eq!(&*name, "app");
//! assert_eq!(flags.len(), 2);
//! ```

pub mod simd;

use std::alloc::{self, Layout};
use std::cell::{Cell, RefCell};
use std::io::{self, Read};
use std::ptr::NonNull;

/// Allocation sizes are rounded up to a multiple of this.
pub const ALIGN: usize = std::mem::size_of::<usize>();

/// Capacity used by `Arena::new(0)`.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// Every block buffer starts on a 32-byte boundary (one AVX2 lane).
const BLOCK_ALIGN: usize = 32;

/// Largest single request. Any block sized up to this still has a valid
/// [`Layout`].
pub const MAX_REQUEST: usize = isize::MAX as usize & !(BLOCK_ALIGN - 1);

/// Rounds `size` up to the arena's allocation granularity. `None` when
/// the rounded size would exceed [`MAX_REQUEST`].
pub const fn align_up(size: usize) -> Option<usize> {
    if size > MAX_REQUEST {
        return None;
    }
    Some((size + ALIGN - 1) & !(ALIGN - 1))
}

/// A request the arena can never satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("arena request of {0} bytes exceeds the address space")]
    CapacityOverflow(usize),
}

/// Out-of-memory and oversized requests end the process.
#[cold]
fn alloc_failure(err: AllocError) -> ! {
    eprintln!("catalyze: {err}");
    std::process::abort()
}

struct Block {
    data: NonNull<u8>,
    capacity: usize,
    usage: usize,
}

impl Block {
    /// Starts from `default_capacity` and doubles until `size` fits.
    /// `size` is at most [`MAX_REQUEST`].
    fn new(default_capacity: usize, size: usize) -> Block {
        let mut capacity = default_capacity;
        while capacity < size {
            capacity = capacity.saturating_mul(2);
        }
        if capacity > MAX_REQUEST {
            capacity = size;
        }

        let Ok(layout) = Layout::from_size_align(capacity, BLOCK_ALIGN) else {
            alloc_failure(AllocError::CapacityOverflow(capacity));
        };

        // SAFETY: `capacity` is at least ALIGN, so the layout is non-zero.
        // The buffer is zeroed so every byte handed out is initialised.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let Some(data) = NonNull::new(ptr) else {
            alloc::handle_alloc_error(layout);
        };

        Block {
            data,
            capacity,
            usage: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.capacity - self.usage
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `data` came from `alloc_zeroed` with exactly this layout.
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.capacity, BLOCK_ALIGN);
            alloc::dealloc(self.data.as_ptr(), layout);
        }
    }
}

/// Process-local bump allocator. Not thread-safe.
pub struct Arena {
    blocks: RefCell<Vec<Block>>,
    /// Index of the block allocation currently bumps from.
    current: Cell<usize>,
    default_capacity: usize,
}

impl Arena {
    /// Creates an empty arena. No memory is reserved until the first
    /// allocation. A `default_capacity` of zero selects
    /// [`DEFAULT_BLOCK_SIZE`].
    pub fn new(default_capacity: usize) -> Self {
        let default_capacity = match default_capacity {
            0 => DEFAULT_BLOCK_SIZE,
            n => align_up(n).unwrap_or(MAX_REQUEST),
        };

        Self {
            blocks: RefCell::new(Vec::new()),
            current: Cell::new(0),
            default_capacity,
        }
    }

    /// Reserves `size` bytes, rounded up to pointer alignment, and returns
    /// exactly `size` of them.
    ///
    /// The contents are whatever the block held before (zero for fresh
    /// blocks, stale bytes after a [`reset`](Arena::reset)); use
    /// [`alloc_zeroed`](Arena::alloc_zeroed) when the caller needs zeros.
    /// Out-of-memory aborts the process through
    /// [`std::alloc::handle_alloc_error`]; a request larger than
    /// [`MAX_REQUEST`] aborts with a diagnostic.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc(&self, size: usize) -> &mut [u8] {
        match self.try_alloc(size) {
            Ok(buf) => buf,
            Err(err) => alloc_failure(err),
        }
    }

    /// Like [`alloc`](Arena::alloc), but reports an oversized request
    /// instead of aborting. The arena is left untouched on error.
    #[allow(clippy::mut_from_ref)]
    pub fn try_alloc(&self, size: usize) -> Result<&mut [u8], AllocError> {
        if size == 0 {
            return Ok(&mut []);
        }

        let reserved = align_up(size).ok_or(AllocError::CapacityOverflow(size))?;
        let mut blocks = self.blocks.borrow_mut();

        let mut idx = self.current.get();
        while idx < blocks.len() && blocks[idx].remaining() < reserved {
            idx += 1;
        }
        if idx == blocks.len() {
            blocks.push(Block::new(self.default_capacity, reserved));
        }
        self.current.set(idx);

        let block = &mut blocks[idx];
        let offset = block.usage;
        block.usage += reserved;

        // SAFETY: `offset + reserved <= capacity`, the region was never
        // handed out since the last reset, and block buffers never move or
        // get freed while `&self` is borrowed.
        Ok(unsafe { std::slice::from_raw_parts_mut(block.data.as_ptr().add(offset), size) })
    }

    /// Like [`alloc`](Arena::alloc) but guarantees zeroed bytes.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_zeroed(&self, size: usize) -> &mut [u8] {
        let buf = self.alloc(size);
        simd::fill(buf, 0);
        buf
    }

    /// Copies `s` into the arena.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_str(&self, s: &str) -> &mut str {
        let buf = self.alloc(s.len());
        simd::copy(buf, s.as_bytes());
        // SAFETY: the bytes are an exact copy of a valid `str`.
        unsafe { std::str::from_utf8_unchecked_mut(buf) }
    }

    /// Copies a slice of plain values into the arena.
    ///
    /// # Panics
    ///
    /// Panics if `T` needs stricter alignment than [`ALIGN`].
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &mut [T] {
        assert!(
            std::mem::align_of::<T>() <= ALIGN,
            "arena cannot satisfy alignment of {}",
            std::any::type_name::<T>()
        );

        let bytes = std::mem::size_of_val(src);
        if bytes == 0 {
            return &mut [];
        }

        let dst = self.alloc(bytes).as_mut_ptr() as *mut T;
        // SAFETY: `dst` is ALIGN-aligned (blocks are 32-byte aligned and
        // every offset is a multiple of ALIGN), spans `bytes` bytes owned by
        // this allocation, and cannot overlap `src`.
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
            std::slice::from_raw_parts_mut(dst, src.len())
        }
    }

    /// Returns a new allocation of `new_size` bytes holding a copy of
    /// `old` followed by zeros. `old` itself is left untouched. When
    /// `new_size` is not larger, the copy is truncated to `new_size`.
    #[allow(clippy::mut_from_ref)]
    pub fn grow(&self, old: &[u8], new_size: usize) -> &mut [u8] {
        let buf = self.alloc(new_size);
        let kept = old.len().min(new_size);
        let (head, tail) = buf.split_at_mut(kept);
        simd::copy(head, &old[..kept]);
        simd::fill(tail, 0);
        buf
    }

    /// Rewinds every block so its memory is reused by later allocations.
    /// The blocks themselves stay allocated.
    pub fn reset(&mut self) {
        for block in self.blocks.get_mut().iter_mut() {
            block.usage = 0;
        }
        self.current.set(0);
    }

    /// Frees every block. The arena starts over with fresh blocks on the
    /// next allocation.
    pub fn release(&mut self) {
        self.blocks.get_mut().clear();
        self.current.set(0);
    }

    /// Total bytes reserved from the system allocator.
    pub fn capacity(&self) -> usize {
        self.blocks.borrow().iter().map(|b| b.capacity).sum()
    }

    /// Total bytes handed out (after alignment rounding).
    pub fn usage(&self) -> usize {
        self.blocks.borrow().iter().map(|b| b.usage).sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(0)
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("blocks", &self.block_count())
            .field("usage", &self.usage())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Reads `reader` to the end into arena memory.
///
/// `size_hint` sizes the first buffer (a file's metadata length, usually).
/// One spare byte lets an exact hint reach end of input without growing;
/// when the input turns out longer the buffer is doubled with
/// [`Arena::grow`]. Interrupted reads are retried.
pub fn read_to_arena<'a, R: Read>(
    arena: &'a Arena,
    mut reader: R,
    size_hint: usize,
) -> io::Result<&'a [u8]> {
    let mut buf: &'a mut [u8] = arena.alloc(size_hint.saturating_add(1).max(64));
    let mut filled = 0;

    loop {
        if filled == buf.len() {
            let doubled = buf.len().saturating_mul(2);
            buf = arena.grow(buf, doubled);
        }

        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let buf: &'a [u8] = buf;
    Ok(&buf[..filled])
}
