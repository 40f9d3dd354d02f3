//! Fixed-layout, 16-byte-aligned buffers shared zero-copy between engine
//! stages.

use crate::error::{LiveCalcError, LiveCalcResult};
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::Arc;

const ALIGNMENT: usize = 16;

/// The three buffer kinds the substrate allocates, each with a fixed
/// per-record size and a hard capacity cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Input,
    Scenario,
    Result,
}

impl BufferKind {
    pub fn record_size(&self) -> usize {
        match self {
            BufferKind::Input => 32,
            BufferKind::Scenario => 16,
            BufferKind::Result => 32,
        }
    }

    pub fn capacity_cap(&self) -> usize {
        match self {
            BufferKind::Input => 10_000_000,
            BufferKind::Scenario => 100_000_000,
            BufferKind::Result => 100_000_000,
        }
    }
}

/// A zero-initialized, 16-byte-aligned allocation for `n` fixed-size
/// records of `kind`.
pub struct Buffer {
    ptr: NonNull<u8>,
    layout: Layout,
    kind: BufferKind,
    record_count: usize,
}

// The buffer hands out a raw base pointer for zero-copy sharing between
// engine stages; the substrate's DAG edges are the synchronization
// mechanism (producer writes before consumer reads), not this type.
unsafe impl Send for Buffer {}
unsafe impl Sync for Buffer {}

impl Buffer {
    fn allocate(kind: BufferKind, record_count: usize) -> LiveCalcResult<Self> {
        let size = kind
            .record_size()
            .checked_mul(record_count)
            .ok_or_else(|| LiveCalcError::BufferOverflow {
                name: String::new(),
                requested: record_count,
                capacity: kind.capacity_cap(),
            })?
            .max(1);
        let layout = Layout::from_size_align(size, ALIGNMENT)
            .map_err(|e| LiveCalcError::ConfigInvalid(e.to_string()))?;
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| {
            LiveCalcError::ConfigInvalid("allocation failure".to_string())
        })?;
        Ok(Self {
            ptr,
            layout,
            kind,
            record_count,
        })
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn size_bytes(&self) -> usize {
        self.layout.size()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn is_aligned(&self) -> bool {
        (self.ptr.as_ptr() as usize) % ALIGNMENT == 0
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Owns every named buffer for a run. Names are unique; a second `get`
/// for the same name returns the same underlying allocation.
#[derive(Default)]
pub struct BufferManager {
    buffers: HashMap<String, Arc<Buffer>>,
}

impl BufferManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(
        &mut self,
        kind: BufferKind,
        name: &str,
        record_count: usize,
    ) -> LiveCalcResult<Arc<Buffer>> {
        if self.buffers.contains_key(name) {
            return Err(LiveCalcError::DuplicateName(name.to_string()));
        }
        if record_count > kind.capacity_cap() {
            return Err(LiveCalcError::BufferOverflow {
                name: name.to_string(),
                requested: record_count,
                capacity: kind.capacity_cap(),
            });
        }
        let buffer = Arc::new(Buffer::allocate(kind, record_count)?);
        self.buffers.insert(name.to_string(), buffer.clone());
        Ok(buffer)
    }

    pub fn get(&self, name: &str) -> LiveCalcResult<Arc<Buffer>> {
        self.buffers
            .get(name)
            .cloned()
            .ok_or_else(|| LiveCalcError::BufferNotFound(name.to_string()))
    }

    pub fn free(&mut self, name: &str) -> LiveCalcResult<()> {
        self.buffers
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| LiveCalcError::BufferNotFound(name.to_string()))
    }

    pub fn free_all(&mut self) {
        self.buffers.clear();
    }

    pub fn validate_size(&self, name: &str, expected_bytes: usize) -> LiveCalcResult<()> {
        let buffer = self.get(name)?;
        if buffer.size_bytes() != expected_bytes {
            return Err(LiveCalcError::SizeMismatch {
                name: name.to_string(),
                expected: expected_bytes,
                got: buffer.size_bytes(),
            });
        }
        Ok(())
    }
}
