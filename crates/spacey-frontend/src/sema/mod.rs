//! Semantic validation and per-function semantic records.
//!
//! The [`SemanticValidator`] walks a parsed [`Ast`](crate::ast::Ast),
//! reports scoping, strictness and control-flow errors to the
//! [`Diagnostics`](crate::source::Diagnostics) sink, decorates nodes in
//! place, and fills a [`SemContext`] with one [`FunctionInfo`] per function.
//! The IR generator reads those records and never writes them.

mod validator;

pub use validator::SemanticValidator;

use crate::ast::{LabelIndex, NodeId};
use std::ops::{Index, IndexMut};

/// Handle of a [`FunctionInfo`] inside a [`SemContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionInfoId(u32);

impl FunctionInfoId {
    /// Returns the raw index of this record.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bookkeeping for one label allocated in a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelInfo {
    /// The innermost `try` active where the label was allocated.
    pub surrounding_try: Option<NodeId>,
}

/// Facts gathered about one function during validation.
#[derive(Debug, Default)]
pub struct FunctionInfo {
    /// Declared names (`Identifier` nodes of declarators), in source order.
    pub decls: Vec<NodeId>,
    /// Function declarations hoisted to this function, in source order.
    pub closures: Vec<NodeId>,
    /// One entry per allocated label, indexed by [`LabelIndex`].
    pub labels: Vec<LabelInfo>,
    /// An arrow function appears directly in this function.
    pub contains_arrow_functions: bool,
    /// A nested arrow function refers to this function's `arguments`.
    pub contains_arrow_functions_using_arguments: bool,
    /// Resolved strictness.
    pub strict: bool,
}

impl FunctionInfo {
    /// Allocates the next label index.
    pub fn allocate_label(&mut self, surrounding_try: Option<NodeId>) -> LabelIndex {
        let index = self.labels.len() as LabelIndex;
        self.labels.push(LabelInfo { surrounding_try });
        index
    }
}

/// The table of semantic records.
#[derive(Debug, Default)]
pub struct SemContext {
    functions: Vec<FunctionInfo>,
}

impl SemContext {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty record and returns its handle.
    pub fn create_function(&mut self) -> FunctionInfoId {
        let id = FunctionInfoId(self.functions.len() as u32);
        self.functions.push(FunctionInfo::default());
        id
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if no record was created.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Index<FunctionInfoId> for SemContext {
    type Output = FunctionInfo;

    fn index(&self, id: FunctionInfoId) -> &FunctionInfo {
        &self.functions[id.index()]
    }
}

impl IndexMut<FunctionInfoId> for SemContext {
    fn index_mut(&mut self, id: FunctionInfoId) -> &mut FunctionInfo {
        &mut self.functions[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_allocation_is_monotonic() {
        let mut sem = SemContext::new();
        let id = sem.create_function();
        assert_eq!(sem[id].allocate_label(None), 0);
        assert_eq!(sem[id].allocate_label(None), 1);
        assert_eq!(sem[id].labels.len(), 2);
    }
}
