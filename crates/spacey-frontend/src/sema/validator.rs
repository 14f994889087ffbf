//! The semantic validator.

use super::{FunctionInfo, FunctionInfoId, SemContext};
use crate::ast::{Ast, FunctionLike, NodeId, NodeKind, Strictness, UnaryOperator};
use crate::ident::{Atom, Interner, Keywords};
use crate::regexp;
use crate::source::Diagnostics;
use rustc_hash::FxHashMap;
use tracing::{debug, debug_span, trace};

/// An active label.
#[derive(Debug, Clone, Copy)]
struct Label {
    /// The label `Identifier`
    declaration: NodeId,
    /// The loop or labeled statement a jump to this label targets
    target: NodeId,
}

/// Per-function validation state; one per function being walked.
#[derive(Debug)]
struct FunctionContext {
    info: FunctionInfoId,
    strict: bool,
    is_arrow: bool,
    active_try: Option<NodeId>,
    active_loop: Option<NodeId>,
    active_switch_or_loop: Option<NodeId>,
    labels: FxHashMap<Atom, Label>,
}

impl FunctionContext {
    fn new(info: FunctionInfoId, strict: bool, is_arrow: bool) -> Self {
        Self {
            info,
            strict,
            is_arrow,
            active_try: None,
            active_loop: None,
            active_switch_or_loop: None,
            labels: FxHashMap::default(),
        }
    }
}

/// Checks scoping, strictness and control-flow rules and records what the
/// IR generator needs to know about each function.
///
/// Validation never stops at the first error: every problem found is
/// reported to the diagnostic sink, and the entry points return whether
/// the walk added any error.
pub struct SemanticValidator<'a> {
    ast: &'a Ast,
    sem: &'a mut SemContext,
    interner: &'a Interner,
    keywords: Keywords,
    diagnostics: &'a mut Diagnostics,
    /// Function contexts, innermost last. The first entry is the global scope.
    contexts: Vec<FunctionContext>,
}

impl<'a> SemanticValidator<'a> {
    /// Creates a validator writing records into `sem`.
    pub fn new(
        ast: &'a Ast,
        sem: &'a mut SemContext,
        interner: &'a Interner,
        keywords: Keywords,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            ast,
            sem,
            interner,
            keywords,
            diagnostics,
            contexts: Vec::new(),
        }
    }

    /// Validates a whole program. The program is strict if `strict` is set
    /// or its directive prologue says so.
    ///
    /// # Panics
    ///
    /// Panics if `root` is not a `Program` node.
    pub fn validate_program(&mut self, root: NodeId, strict: bool) -> bool {
        let _span = debug_span!("validate program").entered();
        let errors = self.diagnostics.error_count();
        let ast = self.ast;

        let NodeKind::Program { body } = &ast[root].kind else {
            panic!("validate_program called on {}", ast[root].kind.name());
        };
        let strict = strict || self.has_use_strict(body);
        let info = self.sem.create_function();
        self.sem[info].strict = strict;
        ast[root].set_sem_info(info);
        ast[root].set_strictness(Strictness::from_strict(strict));

        self.with_context(FunctionContext::new(info, strict, false), |this| {
            for &statement in body {
                this.visit(statement);
            }
        });

        let added = self.diagnostics.error_count() - errors;
        debug!(errors = added, strict, "validated program");
        added == 0
    }

    /// Validates one function-like node on its own, as if it were nested in
    /// a global scope of the given strictness.
    pub fn validate_function(&mut self, node: NodeId, strict: bool) -> bool {
        let _span = debug_span!("validate function").entered();
        let errors = self.diagnostics.error_count();

        let outer = self.sem.create_function();
        self.sem[outer].strict = strict;
        self.with_context(FunctionContext::new(outer, strict, false), |this| {
            this.visit(node)
        });

        let added = self.diagnostics.error_count() - errors;
        debug!(errors = added, strict, "validated function");
        added == 0
    }

    fn with_context<R>(
        &mut self,
        context: FunctionContext,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.contexts.push(context);
        let result = f(self);
        self.contexts.pop();
        result
    }

    fn current(&mut self) -> &mut FunctionContext {
        let top = self.contexts.len() - 1;
        &mut self.contexts[top]
    }

    fn current_info(&mut self) -> &mut FunctionInfo {
        let info = self.current().info;
        &mut self.sem[info]
    }

    fn strict(&self) -> bool {
        self.contexts.last().is_some_and(|context| context.strict)
    }

    fn is_global_scope(&self) -> bool {
        self.contexts.len() == 1
    }

    fn visit(&mut self, node: NodeId) {
        let ast = self.ast;
        match &ast[node].kind {
            NodeKind::FunctionDeclaration(func) => {
                self.current_info().closures.push(node);
                self.visit_function(node, func, false);
            }
            NodeKind::FunctionExpression(func) => self.visit_function(node, func, false),
            NodeKind::ArrowFunctionExpression(func) => {
                self.current_info().contains_arrow_functions = true;
                self.visit_function(node, func, true);
            }

            NodeKind::VariableDeclarator { id, init } => {
                self.validate_declaration_name(*id);
                self.current_info().decls.push(*id);
                if let Some(init) = init {
                    self.visit(*init);
                }
            }
            NodeKind::CatchClause { param, body } => {
                self.validate_declaration_name(*param);
                self.visit(*body);
            }
            NodeKind::Identifier(name) => self.visit_identifier(*name),
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                self.visit(*object);
                if *computed {
                    self.visit(*property);
                }
            }
            NodeKind::Property {
                key,
                value,
                computed,
            } => {
                if *computed {
                    self.visit(*key);
                }
                self.visit(*value);
            }

            NodeKind::AssignmentExpression { left, right, .. } => {
                if !self.is_lvalue(*left) {
                    self.error(*left, "invalid assignment left-hand side");
                }
                self.visit(*left);
                self.visit(*right);
            }
            NodeKind::UpdateExpression { argument, .. } => {
                if !self.is_lvalue(*argument) {
                    self.error(*argument, "invalid operand in update operation");
                }
                self.visit(*argument);
            }
            NodeKind::UnaryExpression {
                operator: UnaryOperator::Delete,
                argument,
            } => {
                if self.strict() && matches!(ast[*argument].kind, NodeKind::Identifier(_)) {
                    self.error(node, "'delete' of a variable is not allowed in strict mode");
                }
                self.visit(*argument);
            }
            NodeKind::RegExpLiteral { pattern, flags } => {
                let interner = self.interner;
                let pattern = interner.resolve(*pattern);
                if let Err(message) = regexp::check(pattern, interner.resolve(*flags)) {
                    self.error(
                        node,
                        format!("Invalid regular expression: /{pattern}/: {message}"),
                    );
                }
            }

            NodeKind::WhileStatement { .. }
            | NodeKind::DoWhileStatement { .. }
            | NodeKind::ForStatement { .. } => self.visit_loop(node),
            NodeKind::ForInStatement { left, .. } => {
                if !matches!(ast[*left].kind, NodeKind::VariableDeclaration { .. })
                    && !self.is_lvalue(*left)
                {
                    self.error(*left, "invalid left-hand side in for-in-loop");
                }
                self.visit_loop(node);
            }
            NodeKind::SwitchStatement { .. } => self.visit_switch(node),
            NodeKind::LabeledStatement { label, body } => self.visit_labeled(node, *label, *body),
            NodeKind::BreakStatement { label } => self.visit_break(node, *label),
            NodeKind::ContinueStatement { label } => self.visit_continue(node, *label),
            NodeKind::ReturnStatement { argument } => {
                if self.is_global_scope() {
                    self.error(node, "'return' not in a function");
                }
                if let Some(argument) = argument {
                    self.visit(*argument);
                }
            }
            NodeKind::TryStatement {
                block,
                handler,
                finalizer,
            } => self.visit_try(node, *block, *handler, *finalizer),

            _ => ast.for_each_child(node, |child| self.visit(child)),
        }
    }

    fn visit_function(&mut self, node: NodeId, func: &FunctionLike, is_arrow: bool) {
        let ast = self.ast;
        let info = self.sem.create_function();
        let strict = self.strict() || self.body_has_use_strict(func.body);
        self.sem[info].strict = strict;
        ast[node].set_sem_info(info);
        ast[node].set_strictness(Strictness::from_strict(strict));
        trace!(kind = ast[node].kind.name(), strict, "entering function");

        self.with_context(FunctionContext::new(info, strict, is_arrow), |this| {
            if let Some(id) = func.id {
                this.validate_declaration_name(id);
            }
            for &param in &func.params {
                this.validate_declaration_name(param);
            }
            this.visit(func.body);
        });
    }

    /// Records a use of `arguments` from an arrow. Arrows have none of
    /// their own, so the first enclosing ordinary function is marked.
    fn visit_identifier(&mut self, name: Atom) {
        if name != self.keywords.arguments || self.is_global_scope() {
            return;
        }

        let mut index = self.contexts.len() - 1;
        while self.contexts[index].is_arrow && index > 1 {
            index -= 1;
            let FunctionContext { info, is_arrow, .. } = self.contexts[index];
            if !is_arrow {
                self.sem[info].contains_arrow_functions_using_arguments = true;
            }
        }
    }

    fn visit_loop(&mut self, node: NodeId) {
        self.allocate_label(node);
        let context = self.current();
        let saved = (context.active_loop, context.active_switch_or_loop);
        context.active_loop = Some(node);
        context.active_switch_or_loop = Some(node);

        let ast = self.ast;
        ast.for_each_child(node, |child| self.visit(child));

        let context = self.current();
        (context.active_loop, context.active_switch_or_loop) = saved;
    }

    fn visit_switch(&mut self, node: NodeId) {
        self.allocate_label(node);
        let saved = self.current().active_switch_or_loop.replace(node);

        let ast = self.ast;
        ast.for_each_child(node, |child| self.visit(child));

        self.current().active_switch_or_loop = saved;
    }

    fn visit_labeled(&mut self, node: NodeId, label: NodeId, body: NodeId) {
        let ast = self.ast;
        let Some(name) = ast.identifier(label) else {
            return;
        };

        // Nested labels all name the innermost loop, if there is one.
        let mut target = body;
        while let NodeKind::LabeledStatement { body, .. } = ast[target].kind {
            target = body;
        }
        let target = if ast[target].kind.is_loop() {
            target
        } else {
            self.allocate_label(node);
            node
        };

        let previous = self.current().labels.get(&name).copied();
        if let Some(previous) = previous {
            let text = self.label_text(label);
            self.error(label, format!("label '{text}' is already defined"));
            self.note(previous.declaration, "previous definition");
        } else {
            self.current().labels.insert(
                name,
                Label {
                    declaration: label,
                    target,
                },
            );
        }

        self.visit(body);

        if previous.is_none() {
            self.current().labels.remove(&name);
        }
    }

    fn visit_break(&mut self, node: NodeId, label: Option<NodeId>) {
        if let Some(label) = label {
            if let Some(found) = self.resolve_label(label) {
                self.decorate_jump(node, found.target);
            }
        } else if let Some(target) = self.current().active_switch_or_loop {
            self.decorate_jump(node, target);
        } else {
            self.error(node, "'break' not within a loop or a switch");
        }
    }

    fn visit_continue(&mut self, node: NodeId, label: Option<NodeId>) {
        if let Some(label) = label {
            let Some(found) = self.resolve_label(label) else {
                return;
            };
            if self.ast[found.target].kind.is_loop() {
                self.decorate_jump(node, found.target);
            } else {
                let text = self.label_text(label);
                self.error(label, format!("'continue' label '{text}' is not a loop label"));
                self.note(found.declaration, "label defined here");
            }
        } else if let Some(target) = self.current().active_loop {
            self.decorate_jump(node, target);
        } else {
            self.error(node, "'continue' not within a loop");
        }
    }

    fn visit_try(
        &mut self,
        node: NodeId,
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    ) {
        let saved = self.current().active_try;
        self.ast[node].set_surrounding_try(saved);

        self.current().active_try = Some(node);
        self.visit(block);
        if let Some(handler) = handler {
            // A handler is still protected by its own finally block.
            self.current().active_try = if finalizer.is_some() { Some(node) } else { saved };
            self.visit(handler);
        }
        self.current().active_try = saved;
        if let Some(finalizer) = finalizer {
            self.visit(finalizer);
        }
    }

    /// Looks up a label in the current function, reporting it if missing.
    fn resolve_label(&mut self, label: NodeId) -> Option<Label> {
        let name = self.ast.identifier(label)?;
        let found = self.current().labels.get(&name).copied();
        if found.is_none() {
            let text = self.label_text(label);
            self.error(label, format!("label '{text}' is not defined"));
        }
        found
    }

    fn label_text(&self, label: NodeId) -> &'a str {
        let interner = self.interner;
        self.ast
            .identifier(label)
            .map_or("", |name| interner.resolve(name))
    }

    fn allocate_label(&mut self, node: NodeId) {
        let context = self.current();
        let (info, active_try) = (context.info, context.active_try);
        let index = self.sem[info].allocate_label(active_try);
        self.ast[node].set_label_index(index);
    }

    fn decorate_jump(&self, node: NodeId, target: NodeId) {
        if let Some(index) = self.ast[target].label_index() {
            self.ast[node].set_label_index(index);
        }
    }

    fn validate_declaration_name(&mut self, id: NodeId) {
        if let Some(name) = self.ast.identifier(id)
            && self.strict()
            && (name == self.keywords.eval || name == self.keywords.arguments)
        {
            let interner = self.interner;
            self.error(id, format!("cannot declare '{}'", interner.resolve(name)));
        }
    }

    fn is_lvalue(&self, node: NodeId) -> bool {
        match self.ast[node].kind {
            NodeKind::MemberExpression { .. } => true,
            NodeKind::Identifier(name) => {
                name != self.keywords.arguments && !(self.strict() && name == self.keywords.eval)
            }
            _ => false,
        }
    }

    fn body_has_use_strict(&self, body: NodeId) -> bool {
        match &self.ast[body].kind {
            NodeKind::BlockStatement { body, .. } => self.has_use_strict(body),
            _ => false,
        }
    }

    /// Scans the directive prologue of a statement list.
    fn has_use_strict(&self, statements: &[NodeId]) -> bool {
        statements
            .iter()
            .map_while(|&statement| match self.ast[statement].kind {
                NodeKind::ExpressionStatement {
                    directive: Some(directive),
                    ..
                } => Some(directive),
                _ => None,
            })
            .any(|directive| directive == self.keywords.use_strict)
    }

    fn error(&mut self, node: NodeId, message: impl Into<String>) {
        let message = message.into();
        trace!(%message, "semantic error");
        self.diagnostics.error(self.ast[node].range, message);
    }

    fn note(&mut self, node: NodeId, message: &str) {
        self.diagnostics.note(self.ast[node].range, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::source::{Severity, SourceManager};

    struct Validated {
        ast: Ast,
        sem: SemContext,
        root: NodeId,
        ok: bool,
        errors: Vec<String>,
        notes: Vec<String>,
    }

    impl Validated {
        fn body(&self) -> &[NodeId] {
            match &self.ast[self.root].kind {
                NodeKind::Program { body } => body,
                _ => unreachable!(),
            }
        }

        fn info(&self, node: NodeId) -> &FunctionInfo {
            &self.sem[self.ast[node].sem_info().unwrap()]
        }

        /// The single statement of a block or function body.
        fn only_statement(&self, node: NodeId) -> NodeId {
            let body = match &self.ast[node].kind {
                NodeKind::FunctionDeclaration(func) => func.body,
                NodeKind::LabeledStatement { body, .. } => *body,
                NodeKind::WhileStatement { body, .. } | NodeKind::ForStatement { body, .. } => {
                    *body
                }
                NodeKind::TryStatement { block, .. } => *block,
                _ => node,
            };
            match &self.ast[body].kind {
                NodeKind::BlockStatement { body, .. } => body[0],
                _ => body,
            }
        }
    }

    fn validate_with(src: &str, strict: bool) -> Validated {
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("test.js", src);
        let mut interner = Interner::new();
        let keywords = Keywords::new(&mut interner);
        let mut ast = Ast::new();
        let root = Parser::new(src, buffer, &mut ast, &mut interner)
            .parse_program()
            .unwrap();

        let mut sem = SemContext::new();
        let mut diagnostics = Diagnostics::default();
        let ok = SemanticValidator::new(&ast, &mut sem, &interner, keywords, &mut diagnostics)
            .validate_program(root, strict);

        let messages = |severity| {
            diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .map(|d| d.message.clone())
                .collect::<Vec<_>>()
        };
        let (errors, notes) = (messages(Severity::Error), messages(Severity::Note));
        Validated {
            ast,
            sem,
            root,
            ok,
            errors,
            notes,
        }
    }

    fn validate_src(src: &str) -> Validated {
        validate_with(src, false)
    }

    fn assert_valid(src: &str) {
        let validated = validate_src(src);
        assert!(validated.ok, "{src:?}: {:?}", validated.errors);
    }

    fn assert_error(src: &str, expected: &str) {
        let validated = validate_src(src);
        assert!(!validated.ok, "{src:?} should fail");
        assert!(
            validated.errors.iter().any(|e| e.contains(expected)),
            "{src:?}: {:?} does not mention {expected:?}",
            validated.errors
        );
    }

    #[test]
    fn test_duplicate_active_labels() {
        assert_error("a: { a: ; }", "label 'a' is already defined");
        let validated = validate_src("a: { a: ; }");
        assert_eq!(validated.notes, vec!["previous definition".to_string()]);
    }

    #[test]
    fn test_labels_are_scoped() {
        assert_valid("a: ; a: ;");
        assert_valid("function f() { a: ; } function g() { a: ; }");
        assert_valid("a: { function f() { a: ; } }");
    }

    #[test]
    fn test_break_and_continue_targets() {
        assert_valid("for (;;) { break; }");
        assert_valid("while (1) { continue; }");
        assert_valid("switch (1) { case 1: break; }");
        assert_valid("outer: { break outer; }");
        assert_valid("a: while (1) { for (;;) { continue a; } }");

        assert_error("break;", "'break' not within a loop or a switch");
        assert_error("switch (1) { case 1: continue; }", "'continue' not within a loop");
        assert_error("outer: { continue outer; }", "is not a loop label");
        assert_error("while (1) { break b; }", "label 'b' is not defined");
        assert_error("while (1) { function f() { break; } }", "'break' not within");
        assert_error("a: while (1) { function f() { continue a; } }", "is not defined");
    }

    #[test]
    fn test_continue_to_block_label_notes_definition() {
        let validated = validate_src("outer: { continue outer; }");
        assert_eq!(validated.notes, vec!["label defined here".to_string()]);
    }

    #[test]
    fn test_jumps_are_decorated_with_target_label() {
        let validated = validate_src("a: while (1) { break a; }");
        let labeled = validated.body()[0];
        let NodeKind::LabeledStatement { body: loop_node, .. } = validated.ast[labeled].kind else {
            panic!("expected a labeled statement");
        };
        let jump = validated.only_statement(loop_node);
        assert!(validated.ast[loop_node].label_index().is_some());
        assert_eq!(
            validated.ast[jump].label_index(),
            validated.ast[loop_node].label_index()
        );
        // The label reuses the loop's index.
        assert_eq!(validated.ast[labeled].label_index(), None);
    }

    #[test]
    fn test_return_outside_function() {
        assert_error("return 1;", "'return' not in a function");
        assert_valid("function f() { return 1; }");
    }

    #[test]
    fn test_strictness_inherited_from_program() {
        let validated = validate_src("'use strict'; function f() { function g() {} }");
        let f = validated.body()[1];
        let g = validated.only_statement(f);
        assert_eq!(validated.ast[validated.root].strictness(), Strictness::Strict);
        assert_eq!(validated.ast[f].strictness(), Strictness::Strict);
        assert_eq!(validated.ast[g].strictness(), Strictness::Strict);
        assert!(validated.info(g).strict);
    }

    #[test]
    fn test_own_directive_only_affects_that_function() {
        let validated = validate_src("function f() { 'use strict'; } function g() {}");
        let (f, g) = (validated.body()[0], validated.body()[1]);
        assert_eq!(validated.ast[validated.root].strictness(), Strictness::NonStrict);
        assert_eq!(validated.ast[f].strictness(), Strictness::Strict);
        assert_eq!(validated.ast[g].strictness(), Strictness::NonStrict);
    }

    #[test]
    fn test_directive_must_lead_the_body() {
        let validated = validate_src("function f() { var x; 'use strict'; }");
        assert_eq!(validated.ast[validated.body()[0]].strictness(), Strictness::NonStrict);
    }

    #[test]
    fn test_assignment_targets() {
        assert_error("1 = 2;", "invalid assignment left-hand side");
        assert_error("f() = 2;", "invalid assignment left-hand side");
        assert_error("1++;", "invalid operand in update operation");
        assert_error("for (a() in o);", "invalid left-hand side in for-in-loop");
        assert_error("arguments = 1;", "invalid assignment left-hand side");
        assert_valid("a.b = 2; a = 2; a[0] += 1; x++; for (k in o); for (var k in o);");
        assert_valid("eval = 1;");
        assert_error("'use strict'; eval = 1;", "invalid assignment left-hand side");
    }

    #[test]
    fn test_strict_reserved_declaration_names() {
        assert_error("'use strict'; var eval = 1;", "cannot declare 'eval'");
        assert_error("'use strict'; var arguments = 1;", "cannot declare 'arguments'");
        assert_error("'use strict'; function f(eval) {}", "cannot declare 'eval'");
        assert_error("function arguments() { 'use strict'; }", "cannot declare");
        assert_error("'use strict'; try {} catch (arguments) {}", "cannot declare");
        assert_valid("var eval = 1; var arguments = 2; function f(eval) {}");
    }

    #[test]
    fn test_strict_from_configuration() {
        let validated = validate_with("var eval;", true);
        assert!(!validated.ok);
        assert_eq!(validated.ast[validated.root].strictness(), Strictness::Strict);
    }

    #[test]
    fn test_strict_delete_of_identifier() {
        assert_error("'use strict'; delete x;", "'delete' of a variable");
        assert_valid("'use strict'; delete o.x; delete o['y'];");
        assert_valid("delete x;");
    }

    #[test]
    fn test_regexp_literals_checked() {
        assert_error("var r = /(a/;", "Invalid regular expression: /(a/");
        assert_error("var r = /a/gg;", "Invalid regular expression");
        assert_valid("var r = /[a-z]+/gi;");
    }

    #[test]
    fn test_validation_keeps_going() {
        let validated = validate_src("break; continue; 1 = 2; return;");
        assert_eq!(validated.errors.len(), 4);
    }

    #[test]
    fn test_revalidation_is_stable() {
        let src = "break; function f() { 'use strict'; var eval; }";
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("test.js", src);
        let mut interner = Interner::new();
        let keywords = Keywords::new(&mut interner);
        let mut ast = Ast::new();
        let root = Parser::new(src, buffer, &mut ast, &mut interner)
            .parse_program()
            .unwrap();

        let mut sem = SemContext::new();
        let mut diagnostics = Diagnostics::default();
        let mut validator =
            SemanticValidator::new(&ast, &mut sem, &interner, keywords, &mut diagnostics);
        assert!(!validator.validate_program(root, false));
        assert!(!validator.validate_program(root, false));
        assert_eq!(diagnostics.error_count(), 4);
    }

    #[test]
    fn test_hoisting_records() {
        let validated = validate_src("var a, b; function f() { var c; } { function g() {} }");
        let program = validated.info(validated.root);
        assert_eq!(program.decls.len(), 2);
        assert_eq!(program.closures.len(), 2);

        let f = validated.body()[1];
        assert_eq!(validated.info(f).decls.len(), 1);
        assert!(validated.info(f).closures.is_empty());
    }

    #[test]
    fn test_arrow_capture_flags() {
        let validated = validate_src("function f() { return 1; }");
        assert!(!validated.info(validated.body()[0]).contains_arrow_functions);

        let validated = validate_src("function f() { return () => this; }");
        let info = validated.info(validated.body()[0]);
        assert!(info.contains_arrow_functions);
        assert!(!info.contains_arrow_functions_using_arguments);

        let validated = validate_src("function f() { return () => () => arguments[0]; }");
        let info = validated.info(validated.body()[0]);
        assert!(info.contains_arrow_functions);
        assert!(info.contains_arrow_functions_using_arguments);
    }

    #[test]
    fn test_arguments_in_global_arrow() {
        let validated = validate_src("var f = () => arguments;");
        let program = validated.info(validated.root);
        assert!(program.contains_arrow_functions);
        assert!(!program.contains_arrow_functions_using_arguments);
    }

    #[test]
    fn test_try_nesting_decorations() {
        let validated = validate_src("try { try {} finally {} } catch (e) {}");
        let outer = validated.body()[0];
        let inner = validated.only_statement(outer);
        assert_eq!(validated.ast[outer].surrounding_try(), None);
        assert_eq!(validated.ast[inner].surrounding_try(), Some(outer));
    }

    #[test]
    fn test_labels_record_surrounding_try() {
        let validated = validate_src("for (;;) { try { while (1) break; } finally {} }");
        let program = validated.info(validated.root);
        assert_eq!(program.labels.len(), 2);
        assert_eq!(program.labels[0].surrounding_try, None);
        let try_node = validated.only_statement(validated.body()[0]);
        assert_eq!(program.labels[1].surrounding_try, Some(try_node));
    }

    #[test]
    fn test_validate_single_function() {
        let src = "function f(eval) { return arguments; }";
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("test.js", src);
        let mut interner = Interner::new();
        let keywords = Keywords::new(&mut interner);
        let mut ast = Ast::new();
        let root = Parser::new(src, buffer, &mut ast, &mut interner)
            .parse_program()
            .unwrap();
        let NodeKind::Program { body } = &ast[root].kind else {
            unreachable!()
        };
        let f = body[0];

        let mut sem = SemContext::new();
        let mut diagnostics = Diagnostics::default();
        let mut validator =
            SemanticValidator::new(&ast, &mut sem, &interner, keywords, &mut diagnostics);
        assert!(validator.validate_function(f, false));
        assert!(!validator.validate_function(f, true));
        assert_eq!(ast[f].strictness(), Strictness::Strict);
        assert!(!sem[ast[f].sem_info().unwrap()].contains_arrow_functions_using_arguments);
    }
}
