//! The allocator capability a [`Tile`](crate::tile::Tile) is constructed
//! with: a backend-tagged allocate/release pair with a capacity ceiling
//! that can be exhausted, giving this crate's `AllocatorFailure` path
//! something concrete to exercise, the same way a disk manager's
//! `allocate_page` returns `None` once `max_pages` is reached.
//!
//! Unlike the original's global `StorageManager::GetInstance()`, the
//! allocator here is an injected capability: every `Tile` owns a handle to
//! one, never reaching for thread-local or process-global state.

use crate::error::{CompressError, Result};

/// Which physical storage class a buffer was requested from. A single
/// variant today; kept as an enum so additional backends (e.g. a pinned NVM
/// region) slot in without changing the `StorageManager` trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    Heap,
}

/// Capability for acquiring and releasing a tile's backing byte buffer.
pub trait StorageManager {
    fn allocate(&mut self, backend: BackendType, nbytes: usize) -> Result<Box<[u8]>>;

    /// Tolerates `None` (the "null pointer" case in the consumed contract)
    /// as a no-op.
    fn release(&mut self, backend: BackendType, buf: Option<Box<[u8]>>);
}

/// A process-heap-backed allocator with an optional capacity ceiling, so
/// tests can exercise [`CompressError::AllocatorFailure`] deterministically.
#[derive(Debug, Clone)]
pub struct HeapAllocator {
    capacity_bytes: Option<usize>,
    outstanding_bytes: usize,
}

impl HeapAllocator {
    pub fn new() -> Self {
        HeapAllocator {
            capacity_bytes: None,
            outstanding_bytes: 0,
        }
    }

    pub fn with_capacity(capacity_bytes: usize) -> Self {
        HeapAllocator {
            capacity_bytes: Some(capacity_bytes),
            outstanding_bytes: 0,
        }
    }

    pub fn outstanding_bytes(&self) -> usize {
        self.outstanding_bytes
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageManager for HeapAllocator {
    fn allocate(&mut self, _backend: BackendType, nbytes: usize) -> Result<Box<[u8]>> {
        if let Some(cap) = self.capacity_bytes {
            if self.outstanding_bytes + nbytes > cap {
                return Err(CompressError::AllocatorFailure {
                    requested_bytes: nbytes,
                });
            }
        }
        self.outstanding_bytes += nbytes;
        Ok(vec![0u8; nbytes].into_boxed_slice())
    }

    fn release(&mut self, _backend: BackendType, buf: Option<Box<[u8]>>) {
        if let Some(b) = buf {
            self.outstanding_bytes = self.outstanding_bytes.saturating_sub(b.len());
        }
    }
}
