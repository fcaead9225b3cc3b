//! Storage Infrastructure
//!
//! This module provides [`Arena`] and [`ArenaPtr`] as storage abstractions and
//! [`SlabPool`] with [`SlabPtr`] as the concrete fixed-size slab allocator.
//!
//! A slab pool stores its entries in chunks of at most [`MAX_CHUNK_ENTRIES`]
//! entries. Every chunk keeps an embedded free list, the index of its first
//! free entry and the number of busy entries, both fitting in one byte. The
//! pool links the chunks that still have free entries into an intrusive list,
//! so allocation and deallocation are both O(1).
//!
//! Chunks that become empty are **not** released. A pool only grows until it
//! is cleared or dropped, which trades some fragmentation for fast
//! allocation.
//!
//! Objects that are meant to live only inside a pool implement
//! [`PoolObject`] and are created with [`SlabPool::construct`] and released
//! with [`SlabPool::destroy`].
//!
//! # See also
//!
//! - [Multi-list](crate::core::multi_list)
//! - [Graph](crate::core::graph)

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::{fmt, mem, ops};

use tracing::debug;

use crate::core::multi_list::{MultiListLinks, MultiListPtr};
use crate::core::utils::{PackedOption, Reserved};

/// A trait for indexing into an arena.
pub trait ArenaPtr: Copy + Eq + Hash {
    /// The arena type, which should support the pointer type.
    type Arena: Arena<Self>;

    /// The internal data.
    type Data;

    /// Try to dereference the pointer with an arena.
    ///
    /// # Returns
    ///
    /// - `Some(&Self::Data)`: A reference to the data in the arena.
    /// - `None`: The pointer is invalid.
    fn try_deref(self, arena: &Self::Arena) -> Option<&Self::Data> { arena.try_deref(self) }

    /// Try to mutably dereference the pointer with an arena.
    ///
    /// # Returns
    ///
    /// - `Some(&mut Self::Data)`: A mutable reference to the data in the arena.
    /// - `None`: The pointer is invalid.
    fn try_deref_mut(self, arena: &mut Self::Arena) -> Option<&mut Self::Data> {
        arena.try_deref_mut(self)
    }

    /// Dereference the pointer with an arena.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is invalid, which is always a bug of the caller.
    fn deref(self, arena: &Self::Arena) -> &Self::Data {
        arena
            .try_deref(self)
            .unwrap_or_else(|| panic!("dereferencing an invalid arena pointer"))
    }

    /// Mutably dereference the pointer with an arena.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is invalid, which is always a bug of the caller.
    fn deref_mut(self, arena: &mut Self::Arena) -> &mut Self::Data {
        arena
            .try_deref_mut(self)
            .unwrap_or_else(|| panic!("dereferencing an invalid arena pointer"))
    }
}

/// A trait for an arena that can store data and allocate pointers.
///
/// # Type Parameters
///
/// - `Ptr`: The pointer type that is supported by the arena. The data type is
///   inferred from the pointer type by using [`ArenaPtr::Data`].
pub trait Arena<Ptr>
where
    Ptr: ArenaPtr<Arena = Self>,
{
    /// Construct data with the allocated pointer and store it into the arena.
    ///
    /// This allows the stored data to know its own pointer.
    ///
    /// # Parameters
    ///
    /// - `f`: A function that takes the allocated pointer and returns the
    ///   constructed data.
    ///
    /// # Returns
    ///
    /// The allocated pointer to the stored data.
    fn alloc_with<F>(&mut self, f: F) -> Ptr
    where
        F: FnOnce(Ptr) -> Ptr::Data;

    /// Store data into the arena and return the allocated pointer.
    fn alloc(&mut self, data: Ptr::Data) -> Ptr { self.alloc_with(|_| data) }

    /// Deallocate the data of the pointer from the arena.
    ///
    /// # Returns
    ///
    /// - `Some(Ptr::Data)`: The data of the deallocated pointer.
    /// - `None`: The pointer is invalid.
    fn try_dealloc(&mut self, ptr: Ptr) -> Option<Ptr::Data>;

    /// Try to dereference a pointer.
    ///
    /// # Returns
    ///
    /// - `Some(&Ptr::Data)`: A reference to the data in the arena.
    /// - `None`: The pointer is invalid.
    fn try_deref(&self, ptr: Ptr) -> Option<&Ptr::Data>;

    /// Try to mutably dereference a pointer.
    ///
    /// # Returns
    ///
    /// - `Some(&mut Ptr::Data)`: A mutable reference to the data in the arena.
    /// - `None`: The pointer is invalid.
    fn try_deref_mut(&mut self, ptr: Ptr) -> Option<&mut Ptr::Data>;
}

/// Position of an entry inside a chunk.
pub type ChunkPos = u8;

/// The maximum number of entries in one chunk.
pub const MAX_CHUNK_ENTRIES: ChunkPos = ChunkPos::MAX;

/// The "no entry" position, terminating the free list of a chunk.
///
/// This is equal to [`MAX_CHUNK_ENTRIES`], so a chunk of maximal size has its
/// last entry pointing to the sentinel without any special case.
pub const UNDEF_POS: ChunkPos = MAX_CHUNK_ENTRIES;

/// The maximum number of chunks in one pool.
///
/// The chunk index and the entry position are packed into a [`u32`] handle,
/// with the entry position in the lowest byte.
pub const MAX_CHUNKS: usize = 1 << 24;

/// The only chunk list maintained through intrusive links: chunks with at
/// least one free entry.
const CHUNK_LIST_FREE: usize = 0;

/// Number of intrusive lists a chunk participates in.
const CHUNK_LISTS_NUM: usize = 1;

/// A pointer to an entry of a [`SlabPool`].
///
/// The pointer can only be allocated by [`SlabPool`]. One should not create a
/// pointer manually.
///
/// The pointer packs the index of the chunk and the position of the entry in
/// that chunk. It is not generational, so the user should be careful after
/// re-allocation: a deallocated slot is handed out again by the next
/// allocation from the same chunk.
///
/// # Type Parameters
///
/// - `T`: The type of the stored data, which is the same as the data type in
///   the pool.
pub struct SlabPtr<T> {
    /// `chunk << 8 | pos`.
    raw: u32,
    _phantom: PhantomData<T>,
}

impl<T> SlabPtr<T> {
    fn from_parts(chunk: usize, pos: ChunkPos) -> Self {
        debug_assert!(chunk < MAX_CHUNKS);
        debug_assert!(pos != UNDEF_POS);
        Self::from_raw(((chunk as u32) << 8) | pos as u32)
    }

    pub(crate) fn from_raw(raw: u32) -> Self {
        Self {
            raw,
            _phantom: PhantomData,
        }
    }

    pub(crate) fn raw(self) -> u32 { self.raw }

    /// The index of the chunk holding the entry.
    pub fn chunk(self) -> usize { (self.raw >> 8) as usize }

    /// The position of the entry inside its chunk.
    pub fn pos(self) -> ChunkPos { (self.raw & 0xff) as ChunkPos }
}

impl<T> Reserved for SlabPtr<T> {
    // `pos == UNDEF_POS` never addresses an entry.
    fn reserved() -> Self { Self::from_raw(u32::MAX) }

    fn is_reserved(&self) -> bool { self.raw == u32::MAX }
}

impl<T> Clone for SlabPtr<T> {
    fn clone(&self) -> Self { *self }
}

impl<T> Copy for SlabPtr<T> {}

impl<T> Hash for SlabPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) { self.raw.hash(state) }
}

impl<T> PartialEq for SlabPtr<T> {
    fn eq(&self, other: &Self) -> bool { self.raw == other.raw }
}

impl<T> Eq for SlabPtr<T> {}

impl<T> PartialOrd for SlabPtr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl<T> Ord for SlabPtr<T> {
    fn cmp(&self, other: &Self) -> Ordering { self.raw.cmp(&other.raw) }
}

impl<T> fmt::Debug for SlabPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "*{}:{}", self.chunk(), self.pos())
    }
}

impl<T> fmt::Display for SlabPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "*{}:{}", self.chunk(), self.pos())
    }
}

/// An entry in a chunk.
enum Entry<T> {
    /// The entry is free.
    ///
    /// The free list is not ordered by position, but by the order of
    /// de-allocation, the last deallocated entry will be the first entry in
    /// the free list.
    Free {
        /// The position of the next free entry, or [`UNDEF_POS`].
        next: ChunkPos,
    },
    /// The entry holds a live object.
    Busy(T),
}

/// Index of a chunk in its pool, used as the intrusive list pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkIdx(u32);

impl Reserved for ChunkIdx {
    fn reserved() -> Self { Self(u32::MAX) }

    fn is_reserved(&self) -> bool { self.0 == u32::MAX }
}

/// A chunk of entries.
struct Chunk<T> {
    /// The entries, allocated once when the chunk is created.
    entries: Box<[Entry<T>]>,
    /// Position of the first free entry.
    free_entry: ChunkPos,
    /// Number of busy entries.
    busy: ChunkPos,
    /// Links of the list of chunks with free entries.
    links: MultiListLinks<ChunkIdx, CHUNK_LISTS_NUM>,
}

impl<T> Chunk<T> {
    fn new(capacity: ChunkPos) -> Self {
        let entries = (0..capacity)
            .map(|pos| Entry::Free {
                next: if pos + 1 < capacity { pos + 1 } else { UNDEF_POS },
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            entries,
            free_entry: 0,
            busy: 0,
            links: MultiListLinks::default(),
        }
    }

    /// Check if this chunk has free entries.
    fn has_space(&self) -> bool { self.free_entry != UNDEF_POS }

    /// Check if this chunk has no busy entries.
    fn is_empty(&self) -> bool { self.busy == 0 }
}

impl<T> MultiListPtr<Vec<Chunk<T>>, CHUNK_LISTS_NUM> for ChunkIdx {
    fn links(self, storage: &Vec<Chunk<T>>) -> &MultiListLinks<Self, CHUNK_LISTS_NUM> {
        &storage[self.0 as usize].links
    }

    fn links_mut(
        self,
        storage: &mut Vec<Chunk<T>>,
    ) -> &mut MultiListLinks<Self, CHUNK_LISTS_NUM> {
        &mut storage[self.0 as usize].links
    }
}

/// Statistics of a [`SlabPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Number of live (busy) entries.
    pub live: usize,
    /// Number of chunks, including empty ones.
    pub chunks: usize,
    /// Number of chunks with at least one free entry.
    pub chunks_with_space: usize,
    /// Number of entries per chunk.
    pub chunk_capacity: ChunkPos,
}

/// A fixed-size slab allocator.
///
/// # Type Parameters
///
/// - `T`: The type of the stored data. All allocated pointers will have this
///   as the data type.
///
/// # Examples
///
/// ```
/// use scl_graph::core::storage::{Arena, ArenaPtr, SlabPool};
///
/// let mut pool = SlabPool::new();
///
/// let one = pool.alloc(1); // allocate a pointer with data 1
/// let two = pool.alloc(2); // allocate a pointer with data 2
///
/// assert_ne!(one, two); // allocated pointers are different
///
/// // dereference the pointers to get the data
/// assert_eq!(one.try_deref(&pool), Some(&1));
/// assert_eq!(pool[two], 2);
///
/// pool[two] = 3;
/// assert_eq!(pool[two], 3); // the data is modified
///
/// // a pool must be empty when it is dropped
/// assert_eq!(pool.dealloc(one), 1);
/// assert_eq!(pool.dealloc(two), 3);
/// ```
///
/// # Panics
///
/// Dropping a pool that still has live entries panics, a pool is expected to
/// be emptied by its owner (or [`cleared`](Self::clear)) first.
pub struct SlabPool<T> {
    /// All chunks of the pool.
    chunks: Vec<Chunk<T>>,
    /// The head of the list of chunks with free entries.
    free_chunks: PackedOption<ChunkIdx>,
    /// Number of entries per chunk.
    chunk_capacity: ChunkPos,
    /// Number of live entries.
    len: usize,
}

impl<T> Default for SlabPool<T> {
    fn default() -> Self { Self::with_chunk_capacity(MAX_CHUNK_ENTRIES) }
}

impl<T> SlabPool<T> {
    /// Create an empty pool with chunks of maximal size.
    pub fn new() -> Self { Self::default() }

    /// Create an empty pool with `capacity` entries per chunk.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or greater than [`MAX_CHUNK_ENTRIES`].
    pub fn with_chunk_capacity(capacity: ChunkPos) -> Self {
        assert!(
            capacity > 0,
            "chunk capacity must be in 1..={}",
            MAX_CHUNK_ENTRIES
        );
        Self {
            chunks: Vec::new(),
            free_chunks: PackedOption::none(),
            chunk_capacity: capacity,
            len: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize { self.len }

    /// Check if the pool has no live entries.
    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Number of entries per chunk.
    pub fn chunk_capacity(&self) -> ChunkPos { self.chunk_capacity }

    /// Number of chunks, including empty ones.
    pub fn num_chunks(&self) -> usize { self.chunks.len() }

    /// Number of chunks with at least one free entry.
    pub fn num_free_chunks(&self) -> usize {
        match self.free_chunks.unpack() {
            Some(head) => head.iter(&self.chunks, CHUNK_LIST_FREE).count(),
            None => 0,
        }
    }

    /// Collect the statistics of the pool.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.len,
            chunks: self.chunks.len(),
            chunks_with_space: self.num_free_chunks(),
            chunk_capacity: self.chunk_capacity,
        }
    }

    /// Deallocate the data of the pointer.
    ///
    /// # Panics
    ///
    /// Panics if the pool is empty or the pointer does not address a live
    /// entry (e.g. double free).
    pub fn dealloc(&mut self, ptr: SlabPtr<T>) -> T {
        assert!(self.len > 0, "deallocating {} from an empty pool", ptr);
        self.try_dealloc(ptr)
            .unwrap_or_else(|| panic!("deallocating {} which is not allocated", ptr))
    }

    /// Drop the data of the pointer and free its entry.
    ///
    /// This is the counterpart of [`construct`](Self::construct), the
    /// destructor of the object runs exactly once here.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`dealloc`](Self::dealloc).
    pub fn destroy(&mut self, ptr: SlabPtr<T>) { drop(self.dealloc(ptr)) }

    /// Drop all live entries and release all chunks.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.free_chunks = PackedOption::none();
        self.len = 0;
    }

    /// Iterate over the pointers and data of live entries.
    ///
    /// The order is the storage order, not the allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (SlabPtr<T>, &T)> {
        self.chunks.iter().enumerate().flat_map(|(chunk, c)| {
            c.entries
                .iter()
                .enumerate()
                .filter_map(move |(pos, entry)| match entry {
                    Entry::Busy(data) => Some((SlabPtr::from_parts(chunk, pos as ChunkPos), data)),
                    Entry::Free { .. } => None,
                })
        })
    }

    /// Iterate mutably over the data of live entries.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.chunks.iter_mut().flat_map(|c| {
            c.entries.iter_mut().filter_map(|entry| match entry {
                Entry::Busy(data) => Some(data),
                Entry::Free { .. } => None,
            })
        })
    }

    /// Append a new empty chunk and put it on the free chunk list.
    fn grow(&mut self) -> ChunkIdx {
        let index = self.chunks.len();
        assert!(index < MAX_CHUNKS, "slab pool exceeds {} chunks", MAX_CHUNKS);
        self.chunks.push(Chunk::new(self.chunk_capacity));

        let chunk = ChunkIdx(index as u32);
        chunk.push_front(&mut self.chunks, CHUNK_LIST_FREE, &mut self.free_chunks);
        debug!(
            chunk = index,
            capacity = self.chunk_capacity,
            "slab pool grows a new chunk"
        );
        chunk
    }
}

/// Dropping a pool with live entries panics, unless the thread is already
/// unwinding. Without `std` the unwinding state is unknown, so the leak is
/// only reported as an error event and the entries are dropped.
impl<T> Drop for SlabPool<T> {
    fn drop(&mut self) {
        if self.len != 0 {
            report_live_entries(self.len);
        }
    }
}

#[cfg(any(feature = "std", test))]
fn report_live_entries(len: usize) {
    if !std::thread::panicking() {
        panic!("dropping a slab pool with {} live entries", len);
    }
}

#[cfg(not(any(feature = "std", test)))]
fn report_live_entries(len: usize) {
    tracing::error!(live = len, "dropping a slab pool with live entries");
}

impl<T> ArenaPtr for SlabPtr<T> {
    type Arena = SlabPool<T>;
    type Data = T;
}

impl<T> Arena<SlabPtr<T>> for SlabPool<T> {
    fn alloc_with<F>(&mut self, f: F) -> SlabPtr<T>
    where
        F: FnOnce(SlabPtr<T>) -> T,
    {
        let chunk = match self.free_chunks.unpack() {
            Some(chunk) => chunk,
            None => self.grow(),
        };
        let index = chunk.0 as usize;
        let pos = self.chunks[index].free_entry;
        debug_assert!(pos != UNDEF_POS, "chunk on the free list is full");

        let ptr = SlabPtr::from_parts(index, pos);
        // construct before touching the free list, so a panicking constructor
        // leaves the pool unchanged
        let data = f(ptr);

        let c = &mut self.chunks[index];
        let entry = &mut c.entries[pos as usize];
        c.free_entry = match *entry {
            // the free entry will be taken, so the next will be the new head
            Entry::Free { next } => next,
            // we have a free position, this entry should be free
            Entry::Busy(_) => unreachable!(),
        };
        *entry = Entry::Busy(data);
        c.busy += 1;
        self.len += 1;

        if !c.has_space() {
            chunk.unlink(&mut self.chunks, CHUNK_LIST_FREE, &mut self.free_chunks);
        }
        ptr
    }

    fn try_dealloc(&mut self, ptr: SlabPtr<T>) -> Option<T> {
        let index = ptr.chunk();
        let pos = ptr.pos();
        let c = self.chunks.get_mut(index)?;
        if let Entry::Free { .. } = c.entries.get(pos as usize)? {
            return None;
        }
        debug_assert!(!c.is_empty());

        let was_full = !c.has_space();
        let next = c.free_entry;
        let old_entry = mem::replace(&mut c.entries[pos as usize], Entry::Free { next });
        c.free_entry = pos;
        c.busy -= 1;
        self.len -= 1;

        if was_full {
            ChunkIdx(index as u32).push_front(
                &mut self.chunks,
                CHUNK_LIST_FREE,
                &mut self.free_chunks,
            );
        }
        match old_entry {
            Entry::Busy(data) => Some(data),
            Entry::Free { .. } => unreachable!(),
        }
    }

    fn try_deref(&self, ptr: SlabPtr<T>) -> Option<&T> {
        match self.chunks.get(ptr.chunk())?.entries.get(ptr.pos() as usize)? {
            Entry::Busy(data) => Some(data),
            Entry::Free { .. } => None,
        }
    }

    fn try_deref_mut(&mut self, ptr: SlabPtr<T>) -> Option<&mut T> {
        match self
            .chunks
            .get_mut(ptr.chunk())?
            .entries
            .get_mut(ptr.pos() as usize)?
        {
            Entry::Busy(data) => Some(data),
            Entry::Free { .. } => None,
        }
    }
}

impl<T> ops::Index<SlabPtr<T>> for SlabPool<T> {
    type Output = T;

    fn index(&self, ptr: SlabPtr<T>) -> &T { ptr.deref(self) }
}

impl<T> ops::IndexMut<SlabPtr<T>> for SlabPool<T> {
    fn index_mut(&mut self, ptr: SlabPtr<T>) -> &mut T { ptr.deref_mut(self) }
}

/// A type whose instances are only ever constructed inside a [`SlabPool`].
///
/// There is no other way to obtain a pooled record than
/// [`SlabPool::construct`], and the only way to release it is
/// [`SlabPool::destroy`] (or [`SlabPool::dealloc`] to take the object back).
pub trait PoolObject: Sized {
    /// The arguments of the in-pool constructor.
    type Args;

    /// Build the object for the entry addressed by `ptr`.
    fn construct(ptr: SlabPtr<Self>, args: Self::Args) -> Self;
}

impl<T: PoolObject> SlabPool<T> {
    /// Construct an object directly in the pool.
    pub fn construct(&mut self, args: T::Args) -> SlabPtr<T> {
        self.alloc_with(|ptr| T::construct(ptr, args))
    }
}
