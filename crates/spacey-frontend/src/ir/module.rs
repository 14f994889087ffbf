//! The IR module.

use super::{DefinitionKind, Function, FunctionId, VariableId};
use crate::ident::Atom;
use crate::source::SourceRange;
use std::ops::{Index, IndexMut};

/// A frame variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    /// Source name, or a generated `?anon_` name
    pub name: Atom,
    /// The function whose frame holds the variable
    pub owner: FunctionId,
}

/// A property of the global object known to the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalProperty {
    /// Property name
    pub name: Atom,
    /// Declared with `var` or a function declaration in global code
    pub declared: bool,
}

/// Every function of a compilation, plus shared storage.
#[derive(Debug, Default)]
pub struct Module {
    functions: Vec<Function>,
    variables: Vec<Variable>,
    globals: Vec<GlobalProperty>,
    top_level: Option<FunctionId>,
}

impl Module {
    /// Creates an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function with no parameters and no body.
    pub fn create_function(
        &mut self,
        name: Atom,
        kind: DefinitionKind,
        strict: bool,
        range: SourceRange,
        global_scope: bool,
    ) -> FunctionId {
        let id = FunctionId::from_index(self.functions.len());
        self.functions
            .push(Function::new(name, kind, strict, range, global_scope));
        id
    }

    /// Returns every function with its id, in creation order.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(index, function)| (FunctionId::from_index(index), function))
    }

    /// Returns the number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if the module holds no function.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Finds the first function with the given name.
    pub fn find_function(&self, name: Atom) -> Option<FunctionId> {
        self.functions()
            .find(|(_, function)| function.name == name)
            .map(|(id, _)| id)
    }

    /// Returns the global code of the most recently lowered program.
    pub fn top_level(&self) -> Option<FunctionId> {
        self.top_level
    }

    pub(crate) fn set_top_level(&mut self, function: FunctionId) {
        self.top_level = Some(function);
    }

    /// Adds a variable to the frame of `owner`.
    pub fn add_variable(&mut self, owner: FunctionId, name: Atom) -> VariableId {
        let id = VariableId::from_index(self.variables.len());
        self.variables.push(Variable { name, owner });
        self[owner].variables.push(id);
        id
    }

    /// Returns a variable.
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    /// Records a global property. A property seen before is reused, and
    /// becomes declared if `declared` is set.
    pub fn global_property(&mut self, name: Atom, declared: bool) -> &GlobalProperty {
        let index = match self.globals.iter().position(|global| global.name == name) {
            Some(index) => {
                self.globals[index].declared |= declared;
                index
            }
            None => {
                self.globals.push(GlobalProperty { name, declared });
                self.globals.len() - 1
            }
        };
        &self.globals[index]
    }

    /// Returns the known global properties in order of first use.
    pub fn globals(&self) -> &[GlobalProperty] {
        &self.globals
    }

    /// Returns the global property called `name`.
    pub fn find_global(&self, name: Atom) -> Option<&GlobalProperty> {
        self.globals.iter().find(|global| global.name == name)
    }
}

impl Index<FunctionId> for Module {
    type Output = Function;

    fn index(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }
}

impl IndexMut<FunctionId> for Module {
    fn index_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Interner;

    #[test]
    fn test_global_properties_dedup() {
        let mut interner = Interner::new();
        let (x, y) = (interner.intern("x"), interner.intern("y"));
        let mut module = Module::new();

        assert!(!module.global_property(x, false).declared);
        module.global_property(y, true);
        assert!(module.global_property(x, true).declared);
        assert!(module.global_property(x, false).declared);
        assert_eq!(module.globals().len(), 2);
    }
}
