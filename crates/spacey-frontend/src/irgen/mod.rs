//! IR generation from the validated AST.
//!
//! [`IrGen`] walks a program or a single function and fills a [`Module`].
//! It assumes the AST already passed [`SemanticValidator`]: every
//! function-like node must carry its semantic record, and every loop,
//! switch, label and jump its label index. Input that breaks these
//! assumptions is a bug in the caller and panics.
//!
//! Lowering keeps one [`FunctionContext`] per function being generated.
//! Name resolution goes through a single [`NameTable`] shared by all of
//! them; each function and catch clause opens its own scope, and global
//! code binds nothing, so every unresolved name is a global property.
//!
//! [`SemanticValidator`]: crate::sema::SemanticValidator

mod expr;
mod function;
mod name_table;
mod stmt;

#[cfg(test)]
mod tests;

pub use name_table::{NameTable, SavedScope};

use crate::ast::{Ast, NodeId, NodeKind};
use crate::ident::{Atom, Interner, Keywords};
use crate::ir::{
    BlockId, BuilderState, DefinitionKind, FunctionId, IrBuilder, Module, Value, VariableId,
};
use crate::sema::{FunctionInfo, FunctionInfoId, SemContext};
use tracing::debug;

/// Where `break` and `continue` of one label go.
#[derive(Debug, Clone, Copy, Default)]
struct GotoLabel {
    break_target: Option<BlockId>,
    continue_target: Option<BlockId>,
}

/// An enclosing `try` statement of the code being lowered.
#[derive(Debug, Clone, Copy)]
struct TryFrame {
    node: NodeId,
    /// Emitted whenever control leaves the protected region
    finalizer: Option<NodeId>,
}

/// Lowering state of one function.
struct FunctionContext {
    function: FunctionId,
    sem_info: FunctionInfoId,
    is_arrow: bool,
    labels: Vec<GotoLabel>,
    captured_this: Option<VariableId>,
    captured_new_target: Option<VariableId>,
    captured_arguments: Option<VariableId>,
    /// The arguments object, once created
    created_arguments: Option<Value>,
    entry_block: Option<BlockId>,
    anonymous_label_counter: u32,
    try_stack: Vec<TryFrame>,
    /// Builder position of the enclosing function
    saved_builder: BuilderState,
}

/// Lowers validated functions into IR.
pub struct IrGen<'a> {
    ast: &'a Ast,
    sem: &'a SemContext,
    interner: &'a mut Interner,
    keywords: Keywords,
    builder: IrBuilder<'a>,
    names: NameTable,
    contexts: Vec<FunctionContext>,
}

impl<'a> IrGen<'a> {
    /// Creates a generator emitting into `module`.
    pub fn new(
        ast: &'a Ast,
        sem: &'a SemContext,
        interner: &'a mut Interner,
        keywords: Keywords,
        module: &'a mut Module,
    ) -> Self {
        Self {
            ast,
            sem,
            interner,
            keywords,
            builder: IrBuilder::new(module),
            names: NameTable::new(),
            contexts: Vec::new(),
        }
    }

    /// Lowers a validated `Program` into a global function, which becomes
    /// the module's top level.
    ///
    /// # Panics
    ///
    /// Panics if `root` is not a validated `Program`.
    pub fn lower_program(&mut self, root: NodeId) -> FunctionId {
        let _span = tracing::debug_span!("lower program").entered();
        let ast = self.ast;
        let NodeKind::Program { body } = &ast[root].kind else {
            panic!("lower_program called on {}", ast[root].kind.name());
        };
        let info = self.sem_info(root);
        let strict = ast[root].strictness().is_strict();

        let function = self.builder.create_function(
            self.keywords.global,
            DefinitionKind::Es5,
            strict,
            ast[root].range,
            true,
        );
        self.builder.module_mut().set_top_level(function);

        self.push_context(function, info, false);
        self.emit_function_prologue(&[]);
        self.init_capture_state_es5();
        for &statement in body {
            self.gen_statement(statement);
        }
        self.emit_function_epilogue(Some(Value::UNDEFINED));
        self.pop_context();

        debug!(functions = self.builder.module().len(), "lowered program");
        function
    }

    /// Lowers the body of a lazy stub from its re-parsed, validated node,
    /// replacing the stub in place.
    ///
    /// # Panics
    ///
    /// Panics if `function` has no lazy source or `node` is not an
    /// ordinary function.
    pub fn lower_lazy_function(&mut self, function: FunctionId, node: NodeId) {
        let _span = tracing::debug_span!("lower lazy function").entered();
        let Some(lazy) = self.builder.module_mut()[function].lazy_source.take() else {
            panic!("function {} is not lazy", function.index());
        };

        self.names = NameTable::from_saved(&lazy.scope);
        let alias = self.builder.module()[function].lazy_closure_alias;
        if let Some(alias) = alias
            && let Some((_, func)) = self.ast[node].kind.function_like()
            && let Some(name) = func.id.and_then(|id| self.ast.identifier(id))
        {
            self.names.begin_scope();
            self.names.declare(name, alias);
        }
        debug!(
            function = self.interner.resolve(self.builder.module()[function].name),
            bindings = lazy.scope.len(),
            "resuming lazy function"
        );

        let module = self.builder.module_mut();
        module[function].clear_body();
        module[function].params.clear();
        self.lower_es5_body(function, node);
        self.names = NameTable::new();
    }

    // ========================================================================
    // Context stack
    // ========================================================================

    fn push_context(&mut self, function: FunctionId, sem_info: FunctionInfoId, is_arrow: bool) {
        let saved_builder = self.builder.save_state();
        let labels = vec![GotoLabel::default(); self.sem[sem_info].labels.len()];
        let (captured_this, captured_new_target, captured_arguments) =
            match self.contexts.last() {
                Some(parent) if is_arrow => (
                    parent.captured_this,
                    parent.captured_new_target,
                    parent.captured_arguments,
                ),
                _ => (None, None, None),
            };

        self.contexts.push(FunctionContext {
            function,
            sem_info,
            is_arrow,
            labels,
            captured_this,
            captured_new_target,
            captured_arguments,
            created_arguments: None,
            entry_block: None,
            anonymous_label_counter: 0,
            try_stack: Vec::new(),
            saved_builder,
        });
        self.builder.set_function(function);
        self.names.begin_scope();
    }

    fn pop_context(&mut self) {
        self.names.end_scope();
        if let Some(context) = self.contexts.pop() {
            self.builder.restore_state(context.saved_builder);
        }
    }

    fn context(&self) -> &FunctionContext {
        match self.contexts.last() {
            Some(context) => context,
            None => panic!("no function is being lowered"),
        }
    }

    fn context_mut(&mut self) -> &mut FunctionContext {
        match self.contexts.last_mut() {
            Some(context) => context,
            None => panic!("no function is being lowered"),
        }
    }

    fn function_info(&self) -> &'a FunctionInfo {
        let sem = self.sem;
        &sem[self.context().sem_info]
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn sem_info(&self, node: NodeId) -> FunctionInfoId {
        match self.ast[node].sem_info() {
            Some(info) => info,
            None => panic!("{} lowered before validation", self.ast[node].kind.name()),
        }
    }

    fn label_index(&self, node: NodeId) -> usize {
        match self.ast[node].label_index() {
            Some(index) => index as usize,
            None => panic!("{} has no label index", self.ast[node].kind.name()),
        }
    }

    fn set_label(&mut self, index: usize, label: GotoLabel) {
        self.context_mut().labels[index] = label;
    }

    fn identifier(&self, node: NodeId) -> Atom {
        match self.ast.identifier(node) {
            Some(name) => name,
            None => panic!("expected an identifier, found {}", self.ast[node].kind.name()),
        }
    }

    fn is_strict(&self) -> bool {
        self.builder.function().strict
    }

    fn is_global_function(&self) -> bool {
        self.builder.function().global_scope
    }

    /// Interns a name no source identifier can spell, unique within the
    /// current function.
    fn anonymous_label_name(&mut self, hint: &str) -> Atom {
        let context = self.context_mut();
        let number = context.anonymous_label_counter;
        context.anonymous_label_counter += 1;
        self.interner.intern(&format!("?anon_{number}_{hint}"))
    }

    fn jump_if_reachable(&mut self, target: BlockId) {
        if self.builder.is_reachable() {
            self.builder.branch(target);
        }
    }
}
