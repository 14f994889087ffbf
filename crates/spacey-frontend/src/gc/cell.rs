//! The object header and its descriptor.

use super::Heap;
use std::fmt;

/// Allocation id of a heap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(u64);

impl CellId {
    pub(super) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Called by the collector before a cell is freed.
pub type Finalizer = fn(&GcCell);

/// Shape and behavior shared by every cell of one kind.
#[derive(Debug)]
pub struct VTable {
    /// Kind name, for diagnostics
    pub name: &'static str,
    /// Allocation size in bytes, header included
    pub size: u32,
    /// Runs before the cell is freed
    pub finalizer: Option<Finalizer>,
}

impl VTable {
    /// Creates a vtable without a finalizer.
    pub const fn new(name: &'static str, size: u32) -> Self {
        Self {
            name,
            size,
            finalizer: None,
        }
    }

    /// Creates a vtable whose cells must be finalized.
    pub const fn with_finalizer(name: &'static str, size: u32, finalizer: Finalizer) -> Self {
        Self {
            name,
            size,
            finalizer: Some(finalizer),
        }
    }

    /// Returns true if cells of this kind have a finalizer.
    #[inline]
    pub fn has_finalizer(&self) -> bool {
        self.finalizer.is_some()
    }
}

/// The header at the start of every heap object.
#[repr(C)]
pub struct GcCell {
    vtable: &'static VTable,
    #[cfg(any(debug_assertions, feature = "gc-cell-id"))]
    id: CellId,
}

impl GcCell {
    /// Constructs the header of the cell allocated as `id`.
    ///
    /// # Panics
    ///
    /// Panics if `vtable` has a finalizer and `id` is not the finalizable
    /// cell most recently registered with `heap`. That means the
    /// allocator registered cells out of construction order.
    pub fn new(heap: &Heap, vtable: &'static VTable, id: CellId) -> Self {
        assert!(
            !vtable.has_finalizer() || heap.is_most_recent_finalizable(id),
            "{} cell {id} constructed out of finalizer registration order",
            vtable.name
        );
        #[cfg(not(any(debug_assertions, feature = "gc-cell-id")))]
        let _ = id;
        Self {
            vtable,
            #[cfg(any(debug_assertions, feature = "gc-cell-id"))]
            id,
        }
    }

    /// Returns the descriptor of this cell.
    #[inline]
    pub fn vtable(&self) -> &'static VTable {
        self.vtable
    }

    /// Returns the allocation id.
    #[cfg(any(debug_assertions, feature = "gc-cell-id"))]
    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Runs the finalizer, if the vtable has one.
    pub fn finalize(&self) {
        if let Some(finalizer) = self.vtable.finalizer {
            finalizer(self);
        }
    }
}

impl fmt::Debug for GcCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut cell = f.debug_struct("GcCell");
        cell.field("kind", &self.vtable.name);
        #[cfg(any(debug_assertions, feature = "gc-cell-id"))]
        cell.field("id", &self.id);
        cell.finish()
    }
}
