//! Allocation ids and the finalizable-cell registry.

use super::{CellId, GcCell, VTable};
use parking_lot::Mutex;
use tracing::trace;

#[derive(Debug, Default)]
struct HeapState {
    next_id: u64,
    /// Finalizable cells in registration order
    finalizable: Vec<CellId>,
}

/// Hands out cell ids and tracks which cells need finalization.
#[derive(Debug, Default)]
pub struct Heap {
    state: Mutex<HeapState>,
}

impl Heap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh allocation id. Ids increase monotonically.
    pub fn next_object_id(&self) -> CellId {
        let mut state = self.state.lock();
        let id = CellId::new(state.next_id);
        state.next_id += 1;
        id
    }

    /// Records that `id` must be finalized before it is freed.
    pub fn register_finalizable(&self, id: CellId) {
        trace!(%id, "registered finalizable cell");
        self.state.lock().finalizable.push(id);
    }

    /// Returns true if `id` is the last cell passed to
    /// [`register_finalizable`](Self::register_finalizable).
    pub fn is_most_recent_finalizable(&self, id: CellId) -> bool {
        self.state.lock().finalizable.last() == Some(&id)
    }

    /// Returns how many finalizable cells are registered.
    pub fn finalizable_count(&self) -> usize {
        self.state.lock().finalizable.len()
    }

    /// Removes and returns the registered cells, oldest first.
    pub fn take_finalizable(&self) -> Vec<CellId> {
        std::mem::take(&mut self.state.lock().finalizable)
    }

    /// Allocates the header of a new cell, registering it first if its
    /// vtable has a finalizer.
    pub fn allocate(&self, vtable: &'static VTable) -> (CellId, GcCell) {
        let id = self.next_object_id();
        if vtable.has_finalizer() {
            self.register_finalizable(id);
        }
        (id, GcCell::new(self, vtable, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static PLAIN: VTable = VTable::new("plain", 16);

    static FINALIZED: AtomicUsize = AtomicUsize::new(0);

    fn count_finalization(_: &GcCell) {
        FINALIZED.fetch_add(1, Ordering::SeqCst);
    }

    static FINALIZABLE: VTable = VTable::with_finalizer("finalizable", 32, count_finalization);

    #[test]
    fn test_ids_increase() {
        let heap = Heap::new();
        let first = heap.next_object_id();
        let second = heap.next_object_id();
        assert!(second > first);
        assert_eq!(second.get(), first.get() + 1);
    }

    #[test]
    fn test_allocate_plain_cell() {
        let heap = Heap::new();
        let (_, cell) = heap.allocate(&PLAIN);
        assert_eq!(cell.vtable().name, "plain");
        assert_eq!(heap.finalizable_count(), 0);
    }

    #[test]
    fn test_allocate_registers_finalizable() {
        let heap = Heap::new();
        heap.allocate(&PLAIN);
        let (first, _) = heap.allocate(&FINALIZABLE);
        let (second, cell) = heap.allocate(&FINALIZABLE);
        assert!(heap.is_most_recent_finalizable(second));
        assert!(!heap.is_most_recent_finalizable(first));
        assert_eq!(heap.take_finalizable(), vec![first, second]);
        assert_eq!(heap.finalizable_count(), 0);

        let before = FINALIZED.load(Ordering::SeqCst);
        cell.finalize();
        assert_eq!(FINALIZED.load(Ordering::SeqCst), before + 1);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_cell_records_id() {
        let heap = Heap::new();
        heap.allocate(&PLAIN);
        let (id, cell) = heap.allocate(&PLAIN);
        assert_eq!(cell.id(), id);
        assert_eq!(format!("{cell:?}"), "GcCell { kind: \"plain\", id: CellId(1) }");
    }

    #[test]
    fn test_manual_construction_in_order() {
        let heap = Heap::new();
        let id = heap.next_object_id();
        heap.register_finalizable(id);
        let cell = GcCell::new(&heap, &FINALIZABLE, id);
        assert!(cell.vtable().has_finalizer());
    }

    #[test]
    #[should_panic(expected = "out of finalizer registration order")]
    fn test_construction_out_of_order_panics() {
        let heap = Heap::new();
        let early = heap.next_object_id();
        let late = heap.next_object_id();
        heap.register_finalizable(early);
        heap.register_finalizable(late);
        GcCell::new(&heap, &FINALIZABLE, early);
    }

    #[test]
    #[should_panic(expected = "out of finalizer registration order")]
    fn test_unregistered_finalizable_panics() {
        let heap = Heap::new();
        let id = heap.next_object_id();
        GcCell::new(&heap, &FINALIZABLE, id);
    }
}
