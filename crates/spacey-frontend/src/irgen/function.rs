//! Function and closure lowering.

use super::IrGen;
use crate::ast::{FunctionLike, FunctionLikeKind, NodeId, NodeKind};
use crate::ident::Atom;
use crate::ir::{DefinitionKind, FunctionId, InstrKind, LazySource, Literal, Value, VariableId};
use crate::source::{BufferId, SourceRange};
use std::sync::Arc;
use tracing::debug;

impl IrGen<'_> {
    // ========================================================================
    // Function-like nodes
    // ========================================================================

    /// Lowers a function declaration, expression or arrow.
    pub(super) fn gen_function_like(&mut self, node: NodeId, name: Atom) -> FunctionId {
        let ast = self.ast;
        match &ast[node].kind {
            NodeKind::ArrowFunctionExpression(_) => self.gen_arrow_function(node, name),
            NodeKind::FunctionDeclaration(_) | NodeKind::FunctionExpression(_) => {
                self.gen_es5_function(node, name)
            }
            kind => panic!("{} is not a function", kind.name()),
        }
    }

    /// Lowers an ordinary function, or records a lazy stub if its body
    /// was not parsed.
    pub(super) fn gen_es5_function(&mut self, node: NodeId, name: Atom) -> FunctionId {
        let ast = self.ast;
        let Some((kind, func)) = ast[node].kind.function_like() else {
            panic!("{} is not a function", ast[node].kind.name());
        };
        let strict = ast[node].strictness().is_strict();
        let function =
            self.builder
                .create_function(name, DefinitionKind::Es5, strict, ast[node].range, false);

        if let NodeKind::BlockStatement {
            lazy: Some(buffer), ..
        } = ast[func.body].kind
        {
            self.gen_lazy_stub(function, node, kind, func, buffer);
        } else {
            self.lower_es5_body(function, node);
        }
        function
    }

    /// Lowers the body of an ordinary function into `function`.
    pub(super) fn lower_es5_body(&mut self, function: FunctionId, node: NodeId) {
        let ast = self.ast;
        let Some((_, func)) = ast[node].kind.function_like() else {
            panic!("{} is not a function", ast[node].kind.name());
        };
        let info = self.sem_info(node);
        debug!(
            name = self.interner.resolve(self.builder.module()[function].name),
            params = func.params.len(),
            "lowering function"
        );

        self.push_context(function, info, false);
        self.emit_function_prologue(&func.params);
        self.init_capture_state_es5();
        self.gen_function_body(func.body);
        self.emit_function_epilogue(Some(Value::UNDEFINED));
        self.pop_context();
    }

    fn gen_lazy_stub(
        &mut self,
        function: FunctionId,
        node: NodeId,
        kind: FunctionLikeKind,
        func: &FunctionLike,
        buffer: BufferId,
    ) {
        let saved = self.builder.save_state();
        self.builder.set_function(function);
        self.builder.add_parameter(self.keywords.this);
        for &param in &func.params {
            let name = self.identifier(param);
            self.builder.add_parameter(name);
        }
        self.builder.restore_state(saved);

        let scope = Arc::new(self.names.snapshot());
        debug!(
            params = func.params.len(),
            bindings = scope.len(),
            "created lazy stub"
        );
        self.builder.module_mut()[function].lazy_source = Some(LazySource {
            buffer,
            node_kind: kind,
            function_range: self.ast[node].range,
            scope,
        });
    }

    /// Lowers an arrow function. Its `this`, `new.target` and `arguments`
    /// come from the storage captured by the enclosing function.
    pub(super) fn gen_arrow_function(&mut self, node: NodeId, name: Atom) -> FunctionId {
        let ast = self.ast;
        let NodeKind::ArrowFunctionExpression(func) = &ast[node].kind else {
            panic!("{} is not an arrow function", ast[node].kind.name());
        };
        let strict = ast[node].strictness().is_strict();
        let function =
            self.builder
                .create_function(name, DefinitionKind::Arrow, strict, ast[node].range, false);
        let info = self.sem_info(node);

        self.push_context(function, info, true);
        self.emit_function_prologue(&func.params);
        if let NodeKind::BlockStatement { .. } = ast[func.body].kind {
            self.gen_function_body(func.body);
            self.emit_function_epilogue(Some(Value::UNDEFINED));
        } else {
            self.builder.set_location(ast[func.body].range);
            let value = self.gen_expression(func.body, None);
            self.builder.ret(value);
            self.emit_function_epilogue(None);
        }
        self.pop_context();
        function
    }

    /// Lowers a function expression. A named one sees its own name through
    /// an alias variable of the enclosing function, visible only inside.
    pub(super) fn gen_function_expression(&mut self, node: NodeId, hint: Option<Atom>) -> Value {
        let ast = self.ast;
        let NodeKind::FunctionExpression(func) = &ast[node].kind else {
            panic!("{} is not a function expression", ast[node].kind.name());
        };
        let Some(name) = func.id.map(|id| self.identifier(id)) else {
            let function = self.gen_es5_function(node, hint.unwrap_or(self.keywords.empty));
            return self.builder.emit(InstrKind::CreateFunction(function));
        };

        let alias_name = self.interner.resolve(name).to_string();
        let alias_name = self.anonymous_label_name(&alias_name);
        let alias = self.builder.add_variable(alias_name);

        self.names.begin_scope();
        self.names.declare(name, alias);
        let function = self.gen_es5_function(node, name);
        self.names.end_scope();

        self.builder.module_mut()[function].lazy_closure_alias = Some(alias);
        let closure = self.builder.emit(InstrKind::CreateFunction(function));
        self.builder.store_frame(alias, closure);
        closure
    }

    fn gen_function_body(&mut self, body: NodeId) {
        let ast = self.ast;
        let NodeKind::BlockStatement { body, .. } = &ast[body].kind else {
            panic!("function body is a {}", ast[body].kind.name());
        };
        for &statement in body {
            self.gen_statement(statement);
        }
    }

    // ========================================================================
    // Prologue and epilogue
    // ========================================================================

    /// Creates the entry block, binds hoisted names and parameters, then
    /// lowers the hoisted function declarations. Leaves the builder in a
    /// fresh body block.
    pub(super) fn emit_function_prologue(&mut self, params: &[NodeId]) {
        let info = self.function_info();
        let entry = self.builder.create_block();
        self.builder.set_insertion_block(Some(entry));
        self.context_mut().entry_block = Some(entry);

        for &decl in &info.decls {
            let name = self.identifier(decl);
            if let Some(variable) = self.declare_variable_or_global_property(name) {
                self.builder.store_frame(variable, Value::UNDEFINED);
            }
        }
        let closure_names: Vec<Atom> = info
            .closures
            .iter()
            .map(|&closure| self.function_name(closure))
            .collect();
        for &name in &closure_names {
            self.declare_variable_or_global_property(name);
        }
        debug!(
            vars = info.decls.len(),
            closures = info.closures.len(),
            "hoisted declarations"
        );

        self.builder.add_parameter(self.keywords.this);
        for &param in params {
            let name = self.identifier(param);
            let value = self.builder.add_parameter(name);
            let variable = self.builder.add_variable(name);
            self.names.declare(name, variable);
            self.builder.store_frame(variable, value);
        }
        debug!(count = params.len(), "registered parameters");

        for (&closure, &name) in info.closures.iter().zip(&closure_names) {
            self.builder.set_location(self.ast[closure].range);
            let function = self.gen_es5_function(closure, name);
            let value = self.builder.emit(InstrKind::CreateFunction(function));
            if self.is_global_function() {
                self.emit_global_store(name, value);
            } else {
                match self.names.resolve(name) {
                    Some(variable) => self.builder.store_frame(variable, value),
                    None => panic!(
                        "function '{}' was not hoisted",
                        self.interner.resolve(name)
                    ),
                }
            }
        }

        let body = self.builder.create_block();
        self.builder.branch(body);
        self.builder.set_insertion_block(Some(body));
    }

    /// Gives a hoisted name its storage: a global property in global code,
    /// otherwise a frame variable. Returns the variable only when it was
    /// created by this call.
    fn declare_variable_or_global_property(&mut self, name: Atom) -> Option<VariableId> {
        if self.is_global_function() {
            self.builder.module_mut().global_property(name, true);
            return None;
        }
        if self.names.is_declared_in_current_scope(name) {
            return None;
        }
        let variable = self.builder.add_variable(name);
        self.names.declare(name, variable);
        Some(variable)
    }

    /// Sets up the storage arrows read `this`, `new.target` and
    /// `arguments` from. Does nothing if the function contains no arrow.
    pub(super) fn init_capture_state_es5(&mut self) {
        let info = self.function_info();
        if !info.contains_arrow_functions {
            return;
        }

        let name = self.anonymous_label_name("this");
        let this = self.builder.add_variable(name);
        self.builder.store_frame(this, Value::Parameter(0));

        let name = self.anonymous_label_name("new.target");
        let new_target = self.builder.add_variable(name);
        let value = self.gen_new_target();
        self.builder.store_frame(new_target, value);

        let context = self.context_mut();
        context.captured_this = Some(this);
        context.captured_new_target = Some(new_target);

        // A parameter or var named `arguments` shadows the object.
        if info.contains_arrow_functions_using_arguments
            && self
                .function_scoped_variable(self.keywords.arguments)
                .is_none()
        {
            let name = self.anonymous_label_name("arguments");
            let arguments = self.builder.add_variable(name);
            let value = self.get_arguments_object();
            self.builder.store_frame(arguments, value);
            self.context_mut().captured_arguments = Some(arguments);
        }
        debug!(
            arguments = info.contains_arrow_functions_using_arguments,
            "initialized capture state"
        );
    }

    /// Returns the arguments object of the current function, creating it
    /// in the entry block the first time.
    pub(super) fn get_arguments_object(&mut self) -> Value {
        if let Some(value) = self.context().created_arguments {
            return value;
        }
        let Some(entry) = self.context().entry_block else {
            panic!("arguments requested before the prologue");
        };
        let value = self
            .builder
            .insert_before_terminator(entry, InstrKind::CreateArguments);
        self.context_mut().created_arguments = Some(value);
        value
    }

    /// Emits the implicit return, then folds the body block into the entry
    /// block when nothing else jumps to it.
    pub(super) fn emit_function_epilogue(&mut self, return_value: Option<Value>) {
        if let Some(value) = return_value
            && self.builder.is_reachable()
        {
            let range = self.builder.function().range;
            let end = range.end as usize;
            self.builder
                .set_location(SourceRange::new(range.buffer, end, end));
            self.builder.ret(value);
        }

        if let Some(entry) = self.context().entry_block {
            let merged = self.builder.function_mut().merge_successor(entry);
            debug!(merged, "entry block merge");
        }
        self.builder.clear_statement_count();
    }

    fn function_name(&self, node: NodeId) -> Atom {
        match self.ast[node].kind.function_like() {
            Some((_, func)) => match func.id {
                Some(id) => self.identifier(id),
                None => self.keywords.empty,
            },
            None => panic!("{} is not a function", self.ast[node].kind.name()),
        }
    }

    // ========================================================================
    // Degenerate functions
    // ========================================================================

    /// Adds a placeholder function whose body must never run.
    pub fn gen_dummy_function(&mut self, name: Atom, range: SourceRange) -> FunctionId {
        let function = self
            .builder
            .create_function(name, DefinitionKind::Es5, false, range, false);
        let saved = self.builder.save_state();
        self.builder.set_function(function);
        self.builder.add_parameter(self.keywords.this);
        self.builder.emit(InstrKind::Unreachable);
        self.builder.ret(Value::UNDEFINED);
        self.builder.restore_state(saved);
        function
    }

    /// Replaces the body of `function` with one that throws a
    /// `SyntaxError` carrying `message`. The parameters are kept.
    pub fn gen_syntax_error_function(&mut self, function: FunctionId, message: &str) {
        let syntax_error = self.keywords.syntax_error;
        let message = self.interner.intern(message);
        let module = self.builder.module_mut();
        module.global_property(syntax_error, false);
        let target = &mut module[function];
        target.clear_body();
        target.strict = true;
        target.lazy_source = None;

        let saved = self.builder.save_state();
        self.builder.set_function(function);
        if self.builder.function().params.is_empty() {
            self.builder.add_parameter(self.keywords.this);
        }
        let callee = self.builder.emit(InstrKind::TryLoadGlobal(syntax_error));
        let error = self.builder.emit(InstrKind::Call {
            callee,
            this: Value::UNDEFINED,
            arguments: vec![Literal::String(message).into()],
        });
        self.builder.emit(InstrKind::Throw(error));
        self.builder.restore_state(saved);
        debug!(function = function.index(), "emitted syntax error function");
    }
}
