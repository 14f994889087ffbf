//! Scope management for name resolution during lowering.

use crate::ident::Atom;
use crate::ir::VariableId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    variable: VariableId,
    /// The scope depth where this was declared
    depth: usize,
}

/// The names visible at some point, flattened into one list.
///
/// Stored on lazily compiled functions so their bodies can be lowered
/// later against the same bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedScope {
    bindings: Vec<(Atom, VariableId)>,
}

impl SavedScope {
    /// Returns the saved bindings, ordered by variable.
    pub fn bindings(&self) -> &[(Atom, VariableId)] {
        &self.bindings
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing was visible.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Maps source names to frame variables, one scope per function or catch
/// clause. Names missing from the table are global properties.
#[derive(Debug, Default)]
pub struct NameTable {
    bindings: FxHashMap<Atom, Binding>,
    /// Per open scope, the bindings it shadowed
    scopes: Vec<Vec<(Atom, Option<Binding>)>>,
}

impl NameTable {
    /// Creates an empty table with no open scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with one scope holding the saved bindings.
    pub fn from_saved(saved: &SavedScope) -> Self {
        let mut table = Self::new();
        table.begin_scope();
        for &(name, variable) in &saved.bindings {
            table.declare(name, variable);
        }
        table
    }

    /// Returns the number of open scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Begin a new scope.
    pub fn begin_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// End the current scope, restoring every binding it shadowed.
    pub fn end_scope(&mut self) {
        let Some(shadowed) = self.scopes.pop() else {
            return;
        };
        for (name, previous) in shadowed.into_iter().rev() {
            match previous {
                Some(binding) => self.bindings.insert(name, binding),
                None => self.bindings.remove(&name),
            };
        }
    }

    /// Binds `name` in the current scope, replacing an earlier binding of
    /// the same scope.
    pub fn declare(&mut self, name: Atom, variable: VariableId) {
        if self.scopes.is_empty() {
            self.begin_scope();
        }
        let depth = self.depth();
        let binding = Binding { variable, depth };
        let previous = self.bindings.insert(name, binding);
        if previous.is_none_or(|previous| previous.depth != depth)
            && let Some(scope) = self.scopes.last_mut()
        {
            scope.push((name, previous));
        }
    }

    /// Resolve a name to its innermost binding.
    pub fn resolve(&self, name: Atom) -> Option<VariableId> {
        self.bindings.get(&name).map(|binding| binding.variable)
    }

    /// Check if a name is bound by the current scope itself.
    pub fn is_declared_in_current_scope(&self, name: Atom) -> bool {
        self.bindings
            .get(&name)
            .is_some_and(|binding| binding.depth == self.depth())
    }

    /// Captures every visible binding.
    pub fn snapshot(&self) -> SavedScope {
        let mut bindings: Vec<_> = self
            .bindings
            .iter()
            .map(|(&name, binding)| (name, binding.variable))
            .collect();
        bindings.sort_by_key(|&(_, variable)| variable);
        SavedScope { bindings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Interner;

    fn var(index: usize) -> VariableId {
        VariableId::from_index(index)
    }

    #[test]
    fn test_scope_new() {
        let table = NameTable::new();
        assert_eq!(table.depth(), 0);
        assert!(table.snapshot().is_empty());
    }

    #[test]
    fn test_scope_begin_end() {
        let mut table = NameTable::new();
        table.begin_scope();
        assert_eq!(table.depth(), 1);
        table.end_scope();
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn test_scope_resolve() {
        let mut interner = Interner::new();
        let (x, y) = (interner.intern("x"), interner.intern("y"));
        let mut table = NameTable::new();
        table.begin_scope();
        table.declare(x, var(0));
        assert_eq!(table.resolve(x), Some(var(0)));
        assert_eq!(table.resolve(y), None);
        assert!(table.is_declared_in_current_scope(x));
    }

    #[test]
    fn test_shadowing_is_undone() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let mut table = NameTable::new();
        table.begin_scope();
        table.declare(x, var(0));

        table.begin_scope();
        assert!(!table.is_declared_in_current_scope(x));
        table.declare(x, var(1));
        table.declare(x, var(2));
        assert_eq!(table.resolve(x), Some(var(2)));
        table.end_scope();

        assert_eq!(table.resolve(x), Some(var(0)));
        table.end_scope();
        assert_eq!(table.resolve(x), None);
    }

    #[test]
    fn test_snapshot_restores_visible_names() {
        let mut interner = Interner::new();
        let (x, y) = (interner.intern("x"), interner.intern("y"));
        let mut table = NameTable::new();
        table.begin_scope();
        table.declare(x, var(0));
        table.begin_scope();
        table.declare(y, var(1));
        table.declare(x, var(2));

        let saved = table.snapshot();
        assert_eq!(saved.bindings(), &[(y, var(1)), (x, var(2))]);

        let restored = NameTable::from_saved(&saved);
        assert_eq!(restored.resolve(x), Some(var(2)));
        assert_eq!(restored.resolve(y), Some(var(1)));
    }
}
