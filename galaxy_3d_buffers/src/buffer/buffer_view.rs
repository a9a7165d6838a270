/// BufferView - a logical buffer layered over a backing allocation.
///
/// A view either owns its backing (created by `allocate`) or borrows the
/// backing of another view (`reference`, `reference_range`). Vertex, index
/// and joint buffers are the same view with a different `BufferKind`.
///
/// Lifecycle:
/// - `new` → empty (nominally owning, nothing to release)
/// - `allocate` → owning, offset 0
/// - `reference` / `reference_range` → non-owning alias of another view's backing
/// - `release` (or drop) → back to empty; only an owning view destroys its backing
///
/// There is no reference counting: the owner must outlive its aliases. An alias
/// used after its owner was released gets `Error::InvalidResource` from
/// `map_buffer`/`update` rather than stale memory.

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::{Arc, MutexGuard};

use crate::buffer::{BackingKey, BufferArena, SharedBufferArena};
use crate::error::{Error, Result};
use crate::graphics_device::{BufferBindFlags, BufferMapType};
use crate::utils::is_16_byte_aligned;
use crate::{engine_info, engine_warn};

// ===== BUFFER KIND =====

/// Static description of a buffer specialization
pub trait BufferKind: Send + Sync + 'static {
    /// Kind name used in diagnostics ("vertex", "index", "joint")
    const NAME: &'static str;
    /// Log source and assertion prefix
    const SOURCE: &'static str;
    /// Native bind target
    const BIND: BufferBindFlags;
    /// Size in bytes of one capacity unit
    const ELEMENT_SIZE: u64;
    /// Capacity unit name used in diagnostics
    const UNIT: &'static str;
    /// Seed initial data at creation time (otherwise create empty, then update)
    const SEED_AT_CREATION: bool;
    /// Whether the source of a reference must not be mapped
    const REFERENCE_REQUIRES_UNMAPPED_SOURCE: bool;

    /// CPU-side element type
    type Element: bytemuck::Pod;

    /// Allocation size in bytes for `count` capacity units
    fn alloc_size(count: usize) -> u64;
}

// ===== BACKING =====

/// Role of a view towards its backing allocation
///
/// Only `Owned` ever reaches `BufferArena::destroy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// The view created this backing and destroys it on release
    Owned(BackingKey),
    /// The view aliases a backing owned by another view
    Borrowed(BackingKey),
}

impl Backing {
    /// Key of the backing allocation
    pub fn key(&self) -> BackingKey {
        match *self {
            Backing::Owned(key) | Backing::Borrowed(key) => key,
        }
    }
}

// ===== BUFFER VIEW =====

/// Logical buffer over a backing allocation
pub struct BufferView<K: BufferKind> {
    arena: SharedBufferArena,
    capacity: usize,
    offset: usize,
    mapped: bool,
    backing: Option<Backing>,
    _kind: PhantomData<K>,
}

impl<K: BufferKind> BufferView<K> {
    /// Create an empty view bound to an arena
    pub fn new(arena: &SharedBufferArena) -> Self {
        Self {
            arena: Arc::clone(arena),
            capacity: 0,
            offset: 0,
            mapped: false,
            backing: None,
            _kind: PhantomData,
        }
    }

    // ===== ACCESSORS =====

    /// Logical size, in capacity units (bytes, or joints for joint buffers)
    pub fn capacity(&self) -> usize { self.capacity }

    /// Offset into the backing allocation, in capacity units
    pub fn offset(&self) -> usize { self.offset }

    /// Logical size in bytes
    pub fn size_bytes(&self) -> u64 { self.capacity as u64 * K::ELEMENT_SIZE }

    /// Offset into the backing allocation in bytes
    pub fn byte_offset(&self) -> u64 { self.offset as u64 * K::ELEMENT_SIZE }

    /// Size the backing would need for this capacity (rounded to the allocation granularity)
    pub fn allocated_size(&self) -> u64 { K::alloc_size(self.capacity) }

    /// Whether this view is responsible for destroying its backing
    ///
    /// The empty view is nominally owning: there is nothing to release.
    pub fn owns(&self) -> bool {
        !matches!(self.backing, Some(Backing::Borrowed(_)))
    }

    /// Whether a CPU write pointer is outstanding
    pub fn is_mapped(&self) -> bool { self.mapped }

    /// Whether the view has a backing allocation (owned or borrowed)
    pub fn is_allocated(&self) -> bool { self.backing.is_some() }

    /// Role towards the backing allocation
    pub fn backing(&self) -> Option<Backing> { self.backing }

    /// Key of the backing allocation
    pub fn backing_key(&self) -> Option<BackingKey> { self.backing.map(|b| b.key()) }

    /// Arena the backing lives in
    pub fn arena(&self) -> &SharedBufferArena { &self.arena }

    // ===== ALLOCATION =====

    /// Create an owning backing allocation for `count` capacity units
    ///
    /// The allocation is rounded up to the kind's granularity but the view
    /// keeps `count` as its capacity. With `data`, the first `count` elements
    /// are uploaded: seeded at creation for vertex/index buffers, through a
    /// discard update for joint buffers.
    ///
    /// # Panics
    ///
    /// If the view already has a backing, `count` is zero, `data` is shorter
    /// than `count` or not 16-byte aligned.
    ///
    /// # Errors
    ///
    /// `Error::ResourceExhausted` if the device refuses the allocation, or the
    /// device error of the initial joint upload. Either way the view stays empty.
    pub fn allocate(&mut self, data: Option<&[K::Element]>, count: usize) -> Result<()> {
        assert!(self.backing.is_none(), "{}: allocate on a view that already has a backing", K::SOURCE);
        assert!(count > 0, "{}: allocate with count = 0", K::SOURCE);
        let data = data.map(|d| {
            assert!(d.len() >= count,
                "{}: allocate of {} {} with only {} provided", K::SOURCE, count, K::UNIT, d.len());
            assert!(is_16_byte_aligned(d.as_ptr()), "{}: source data is not 16-byte aligned", K::SOURCE);
            &d[..count]
        });

        let initial: Option<&[u8]> = if K::SEED_AT_CREATION {
            data.map(bytemuck::cast_slice::<K::Element, u8>)
        } else {
            None
        };

        {
            let shared = Arc::clone(&self.arena);
            let mut arena = lock(&shared)?;
            let key = arena.create(K::NAME, K::BIND, K::alloc_size(count), initial)?;
            self.backing = Some(Backing::Owned(key));
            self.capacity = count;
            self.offset = 0;
            self.mapped = false;
            self.log_event(&arena, "alloc");
        }

        if !K::SEED_AT_CREATION {
            if let Some(data) = data {
                if let Err(error) = self.update(data) {
                    self.release();
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    // ===== REFERENCING =====

    /// Alias the whole of `other`
    ///
    /// Releases the current resource first. The result never owns its
    /// backing, and always points at the owner's backing even when `other`
    /// is itself an alias.
    ///
    /// # Panics
    ///
    /// If this view is mapped, or `other` has no backing.
    pub fn reference(&mut self, other: &Self) {
        assert!(!self.mapped, "{}: reference into a mapped view", K::SOURCE);
        let key = Self::reference_source(other);
        assert!(other.capacity > 0, "{}: reference from an empty view", K::SOURCE);

        self.release();
        self.arena = Arc::clone(&other.arena);
        self.capacity = other.capacity;
        self.offset = other.offset;
        self.backing = Some(Backing::Borrowed(key));
    }

    /// Alias `sub_count` units of `other` starting `sub_offset` units into it
    ///
    /// A zero-length range leaves the view empty.
    ///
    /// # Panics
    ///
    /// If this view is mapped, `other` has no backing, or the range does not
    /// fit in `other`'s capacity.
    pub fn reference_range(&mut self, other: &Self, sub_offset: usize, sub_count: usize) {
        assert!(!self.mapped, "{}: reference into a mapped view", K::SOURCE);
        let key = Self::reference_source(other);
        let end = sub_offset.checked_add(sub_count);
        assert!(end.map_or(false, |end| end <= other.capacity),
            "{}: sub-range {}+{} exceeds source capacity {}",
            K::SOURCE, sub_offset, sub_count, other.capacity);

        self.release();
        if sub_count == 0 {
            return;
        }
        self.arena = Arc::clone(&other.arena);
        self.capacity = sub_count;
        self.offset = other.offset + sub_offset;
        self.backing = Some(Backing::Borrowed(key));
    }

    fn reference_source(other: &Self) -> BackingKey {
        if K::REFERENCE_REQUIRES_UNMAPPED_SOURCE {
            assert!(!other.mapped, "{}: reference from a mapped view", K::SOURCE);
        }
        match other.backing_key() {
            Some(key) => key,
            None => panic!("{}: reference from a view without backing", K::SOURCE),
        }
    }

    // ===== RELEASE =====

    /// Release the view's resource and return it to the empty state
    ///
    /// Unmaps first if needed. Only an owning view destroys its backing;
    /// aliases simply forget theirs. Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.mapped {
            if let Err(error) = self.unmap_buffer() {
                engine_warn!(K::SOURCE, "Unmap during release failed: {}", error);
            }
        }

        if let Some(Backing::Owned(key)) = self.backing {
            match self.arena.lock() {
                Ok(mut arena) => {
                    self.log_event(&arena, "free");
                    arena.destroy(key);
                }
                Err(_) => engine_warn!(K::SOURCE, "Arena lock poisoned, backing {:?} not destroyed", key),
            }
        }

        self.clear_without_freeing();
    }

    fn clear_without_freeing(&mut self) {
        self.capacity = 0;
        self.offset = 0;
        self.mapped = false;
        self.backing = None;
    }

    // ===== MAPPING =====

    /// Map the view for CPU writes and return a pointer to its first byte
    ///
    /// The pointer addresses `size_bytes()` writable bytes until
    /// `unmap_buffer` is called. Previous contents may be discarded.
    ///
    /// # Panics
    ///
    /// If the view has no backing, is already mapped, `map_type` is `Read`,
    /// or the view is a sub-range at a non-zero offset.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidResource` if the owner already destroyed the backing
    /// - `Error::ResourceExhausted` if the device cannot provide a pointer
    pub fn map_buffer(&mut self, map_type: BufferMapType) -> Result<NonNull<u8>> {
        let key = self.expect_backing("map_buffer");
        assert!(!self.mapped, "{}: map_buffer on an already mapped view", K::SOURCE);
        assert!(map_type == BufferMapType::Write, "{}: read mapping is not supported", K::SOURCE);
        assert!(self.offset == 0, "{}: map_buffer on a sub-range at offset {}", K::SOURCE, self.offset);

        let ptr = lock(&self.arena)?.map(key, self.byte_offset(), self.size_bytes())?;
        self.mapped = true;
        Ok(ptr)
    }

    /// Commit the mapped range and clear the mapped state
    ///
    /// # Panics
    ///
    /// If the view has no backing or is not mapped.
    pub fn unmap_buffer(&mut self) -> Result<()> {
        let key = self.expect_backing("unmap_buffer");
        assert!(self.mapped, "{}: unmap_buffer on a view that is not mapped", K::SOURCE);

        let mut arena = lock(&self.arena)?;
        self.mapped = false;
        arena.unmap(key)
    }

    /// Map the view, hand its bytes to `write`, then unmap
    pub fn write_mapped<R>(&mut self, write: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        let ptr = self.map_buffer(BufferMapType::Write)?;
        let len = self.size_bytes() as usize;
        // SAFETY: the device guarantees `len` writable bytes at `ptr` until unmap,
        // the arena allows a single outstanding map per backing, and `&mut self`
        // keeps this view untouched while the slice lives.
        let bytes = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) };
        let result = write(bytes);
        self.unmap_buffer()?;
        Ok(result)
    }

    /// Same as `write_mapped`, with the mapped memory viewed as elements
    pub fn write_mapped_elements<R>(&mut self, write: impl FnOnce(&mut [K::Element]) -> R) -> Result<R> {
        self.write_mapped(|bytes| bytemuck::try_cast_slice_mut::<u8, K::Element>(bytes).map(write))?
            .map_err(|error| Error::BackendError(format!(
                "{}: mapped memory cannot be viewed as {} elements: {:?}", K::SOURCE, K::NAME, error
            )))
    }

    // ===== UPDATE =====

    /// Discard-and-rewrite upload of `data` at the start of the view
    ///
    /// # Panics
    ///
    /// If the view has no backing, is mapped, is a sub-range at a non-zero
    /// offset, `data` is not 16-byte aligned or longer than the capacity.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if the owner already destroyed the backing.
    pub fn update(&self, data: &[K::Element]) -> Result<()> {
        let key = self.expect_backing("update");
        assert!(!self.mapped, "{}: update on a mapped view", K::SOURCE);
        assert!(self.offset == 0, "{}: update on a sub-range at offset {}", K::SOURCE, self.offset);
        assert!(data.len() <= self.capacity,
            "{}: update size overrun, {} > {}", K::SOURCE, data.len(), self.capacity);
        if data.is_empty() {
            return Ok(());
        }
        assert!(is_16_byte_aligned(data.as_ptr()), "{}: source data is not 16-byte aligned", K::SOURCE);

        lock(&self.arena)?.update_discard(key, self.byte_offset(), bytemuck::cast_slice(data))
    }

    // ===== SWAP =====

    /// Exchange the full state of two views
    ///
    /// # Panics
    ///
    /// If only one of the two views owns its backing.
    pub fn swap(&mut self, other: &mut Self) {
        assert_eq!(self.owns(), other.owns(),
            "{}: swap between an owning and a non-owning view", K::SOURCE);
        std::mem::swap(self, other);
    }

    // ===== INTERNAL =====

    fn expect_backing(&self, operation: &str) -> BackingKey {
        match self.backing_key() {
            Some(key) => key,
            None => panic!("{}: {} on a view without backing", K::SOURCE, operation),
        }
    }

    fn log_event(&self, arena: &BufferArena, event: &str) {
        if !arena.config().show_buffers {
            return;
        }
        let api = self.backing_key().and_then(|key| arena.native_id(key)).unwrap_or(0);
        engine_info!(K::SOURCE, "{} buffer {} {:p}, api {:#x} ({} {})",
            K::NAME, event, self as *const Self, api, self.capacity, K::UNIT);
    }
}

fn lock(arena: &SharedBufferArena) -> Result<MutexGuard<'_, BufferArena>> {
    arena
        .lock()
        .map_err(|_| Error::BackendError("Buffer arena lock poisoned".to_string()))
}

impl<K: BufferKind> Drop for BufferView<K> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<K: BufferKind> fmt::Debug for BufferView<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::SOURCE)
            .field("capacity", &self.capacity)
            .field("offset", &self.offset)
            .field("owns", &self.owns())
            .field("mapped", &self.mapped)
            .field("backing", &self.backing)
            .finish()
    }
}

// ===== BYTE-ADDRESSED VIEWS =====

impl<K: BufferKind<Element = u8>> BufferView<K> {
    /// Allocate from a slice of typed vertices or indices
    pub fn allocate_from<T: bytemuck::Pod>(&mut self, data: &[T]) -> Result<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.allocate(Some(bytes), bytes.len())
    }

    /// Discard update from a slice of typed vertices or indices
    pub fn update_from<T: bytemuck::Pod>(&self, data: &[T]) -> Result<()> {
        self.update(bytemuck::cast_slice(data))
    }
}

#[cfg(test)]
#[path = "buffer_view_tests.rs"]
mod tests;
