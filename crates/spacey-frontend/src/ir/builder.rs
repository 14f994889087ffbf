//! Instruction builder.

use super::{
    BlockId, DefinitionKind, Function, FunctionId, InstrKind, Instruction, Location, Module,
    Parameter, Value, VariableId,
};
use crate::ident::Atom;
use crate::source::SourceRange;

/// A saved builder position, restored when a nested function is done.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderState {
    function: Option<FunctionId>,
    insertion: Option<BlockId>,
    location: Location,
}

/// Creates functions, blocks and instructions in a [`Module`].
///
/// The builder appends to its insertion block. Emitting a terminator
/// clears the insertion block; the next instruction then opens a fresh,
/// unreachable block, so code after `return` or `break` still has a home.
pub struct IrBuilder<'m> {
    module: &'m mut Module,
    function: Option<FunctionId>,
    insertion: Option<BlockId>,
    location: Location,
}

impl<'m> IrBuilder<'m> {
    /// Creates a builder over `module`.
    pub fn new(module: &'m mut Module) -> Self {
        Self {
            module,
            function: None,
            insertion: None,
            location: Location::default(),
        }
    }

    /// Returns the module.
    pub fn module(&self) -> &Module {
        &*self.module
    }

    /// Returns the module mutably.
    pub fn module_mut(&mut self) -> &mut Module {
        &mut *self.module
    }

    /// Adds a function to the module without switching to it.
    pub fn create_function(
        &mut self,
        name: Atom,
        kind: DefinitionKind,
        strict: bool,
        range: SourceRange,
        global_scope: bool,
    ) -> FunctionId {
        self.module
            .create_function(name, kind, strict, range, global_scope)
    }

    /// Makes `function` current, with no insertion block.
    pub fn set_function(&mut self, function: FunctionId) {
        self.function = Some(function);
        self.insertion = None;
        self.location = Location::default();
    }

    /// Returns the current function.
    ///
    /// # Panics
    ///
    /// Panics if no function was selected.
    pub fn function_id(&self) -> FunctionId {
        match self.function {
            Some(function) => function,
            None => panic!("IrBuilder used without a current function"),
        }
    }

    /// Returns the current function.
    pub fn function(&self) -> &Function {
        &self.module[self.function_id()]
    }

    /// Returns the current function mutably.
    pub fn function_mut(&mut self) -> &mut Function {
        let id = self.function_id();
        &mut self.module[id]
    }

    /// Adds a block to the current function.
    pub fn create_block(&mut self) -> BlockId {
        self.function_mut().create_block()
    }

    /// Sets where new instructions go.
    pub fn set_insertion_block(&mut self, block: Option<BlockId>) {
        self.insertion = block;
    }

    /// Returns where new instructions go, if anywhere.
    pub fn insertion_block(&self) -> Option<BlockId> {
        self.insertion
    }

    /// Returns true unless the last instruction emitted was a terminator.
    pub fn is_reachable(&self) -> bool {
        self.insertion.is_some()
    }

    /// Returns the insertion block, opening one if needed.
    pub fn current_block(&mut self) -> BlockId {
        match self.insertion {
            Some(block) => block,
            None => {
                let block = self.create_block();
                self.insertion = Some(block);
                block
            }
        }
    }

    /// Sets the source range attached to new instructions.
    pub fn set_location(&mut self, range: SourceRange) {
        self.location.range = Some(range);
    }

    /// Starts a new statement at `range`, bumping the statement counter.
    pub fn next_statement(&mut self, range: SourceRange) {
        let function = self.function_mut();
        let count = function.statement_count.unwrap_or(0) + 1;
        function.statement_count = Some(count);
        self.location = Location {
            range: Some(range),
            statement: count,
        };
    }

    /// Forgets the statement counter of the current function.
    pub fn clear_statement_count(&mut self) {
        self.function_mut().statement_count = None;
    }

    /// Appends an instruction to the insertion block.
    pub fn emit(&mut self, kind: InstrKind) -> Value {
        let block = self.current_block();
        let terminator = kind.is_terminator();
        let location = self.location;
        let id = self
            .function_mut()
            .push_instr(block, Instruction { kind, location });
        if terminator {
            self.insertion = None;
        }
        Value::Instr(id)
    }

    /// Inserts an instruction before the terminator of `block`.
    pub fn insert_before_terminator(&mut self, block: BlockId, kind: InstrKind) -> Value {
        let location = self.location;
        let id = self
            .function_mut()
            .insert_before_terminator(block, Instruction { kind, location });
        Value::Instr(id)
    }

    /// Adds a parameter to the current function.
    pub fn add_parameter(&mut self, name: Atom) -> Value {
        let params = &mut self.function_mut().params;
        params.push(Parameter { name });
        Value::Parameter(params.len() as u32 - 1)
    }

    /// Adds a frame variable to the current function.
    pub fn add_variable(&mut self, name: Atom) -> VariableId {
        let owner = self.function_id();
        self.module.add_variable(owner, name)
    }

    /// Captures the current function, insertion block and location.
    pub fn save_state(&self) -> BuilderState {
        BuilderState {
            function: self.function,
            insertion: self.insertion,
            location: self.location,
        }
    }

    /// Returns to a saved position.
    pub fn restore_state(&mut self, state: BuilderState) {
        self.function = state.function;
        self.insertion = state.insertion;
        self.location = state.location;
    }

    /// Reads a frame variable.
    pub fn load_frame(&mut self, variable: VariableId) -> Value {
        self.emit(InstrKind::LoadFrame(variable))
    }

    /// Writes a frame variable.
    pub fn store_frame(&mut self, variable: VariableId, value: Value) {
        self.emit(InstrKind::StoreFrame { variable, value });
    }

    /// Jumps to `target`.
    pub fn branch(&mut self, target: BlockId) {
        self.emit(InstrKind::Branch(target));
    }

    /// Jumps on `condition`.
    pub fn cond_branch(&mut self, condition: Value, then_block: BlockId, else_block: BlockId) {
        self.emit(InstrKind::CondBranch {
            condition,
            then_block,
            else_block,
        });
    }

    /// Returns `value`.
    pub fn ret(&mut self, value: Value) {
        self.emit(InstrKind::Return(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Interner;
    use crate::source::SourceManager;

    #[test]
    fn test_terminator_closes_block() {
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("t.js", "");
        let mut interner = Interner::new();
        let mut module = Module::new();
        let mut builder = IrBuilder::new(&mut module);

        let f = builder.create_function(
            interner.intern("f"),
            DefinitionKind::Es5,
            false,
            SourceRange::new(buffer, 0, 0),
            false,
        );
        builder.set_function(f);
        builder.ret(Value::UNDEFINED);
        assert!(!builder.is_reachable());

        builder.emit(InstrKind::Debugger);
        assert!(builder.is_reachable());
        assert_eq!(builder.function().blocks().len(), 2);
    }

    #[test]
    fn test_statement_counter() {
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("t.js", "a; b;");
        let mut interner = Interner::new();
        let mut module = Module::new();
        let mut builder = IrBuilder::new(&mut module);

        let f = builder.create_function(
            interner.intern("f"),
            DefinitionKind::Es5,
            false,
            SourceRange::new(buffer, 0, 5),
            false,
        );
        builder.set_function(f);
        builder.next_statement(SourceRange::new(buffer, 0, 2));
        builder.next_statement(SourceRange::new(buffer, 3, 5));
        let value = builder.emit(InstrKind::Debugger);
        let id = value.as_instr().unwrap();
        assert_eq!(builder.function().instr(id).location.statement, 2);

        builder.clear_statement_count();
        assert_eq!(builder.function().statement_count, None);
    }
}
