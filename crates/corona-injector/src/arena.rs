//! Explicitly released parameter storage.
//!
//! Injector variants that load coefficients from configuration keep them
//! in a [`ManagedBuffer`] allocated from a [`ManagedArena`]. The arena
//! holds a strong reference to every allocation until it is handed back
//! through [`ManagedArena::free`]; a buffer that is dropped without being
//! freed stays alive in the arena and shows up in
//! [`ManagedArena::outstanding`]. Reads through a buffer never touch the
//! arena, so the per-particle path takes no lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use corona_core::Real;
use indexmap::IndexMap;

/// Buffer ids are unique across arenas so a foreign buffer is always caught.
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

/// Registry of live parameter buffers.
#[derive(Debug, Default)]
pub struct ManagedArena {
    live: Mutex<IndexMap<u64, Arc<[Real]>>>,
}

/// A read-only coefficient buffer owned by a [`ManagedArena`].
///
/// Not `Clone`: exactly one handle exists per allocation, and it must be
/// returned with [`ManagedArena::free`].
#[derive(Debug)]
pub struct ManagedBuffer {
    id: u64,
    data: Arc<[Real]>,
}

impl ManagedBuffer {
    /// The stored coefficients.
    #[inline]
    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }

    /// Number of coefficients.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer holds no coefficients.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ManagedArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> MutexGuard<'_, IndexMap<u64, Arc<[Real]>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy `values` into a new buffer.
    pub fn alloc(&self, values: &[Real]) -> ManagedBuffer {
        let id = NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed);
        let data: Arc<[Real]> = Arc::from(values);
        self.live().insert(id, Arc::clone(&data));
        ManagedBuffer { id, data }
    }

    /// Return a buffer to the arena, releasing its storage.
    ///
    /// # Panics
    ///
    /// If the buffer was allocated by a different arena.
    pub fn free(&self, buffer: ManagedBuffer) {
        if self.live().shift_remove(&buffer.id).is_none() {
            panic!("ManagedArena::free: buffer {} not owned by this arena", buffer.id);
        }
    }

    /// Number of buffers allocated but not yet freed.
    pub fn outstanding(&self) -> usize {
        self.live().len()
    }

    /// Total bytes held by outstanding buffers.
    pub fn outstanding_bytes(&self) -> usize {
        self.live()
            .values()
            .map(|b| b.len() * std::mem::size_of::<Real>())
            .sum()
    }
}
