//! Statement lowering.
//!
//! | Statement | Blocks |
//! |-----------|--------|
//! | `if` | then, else, continuation |
//! | `while` | condition, body, exit |
//! | `do-while` | body, condition, exit |
//! | `for` | condition, body, update, exit |
//! | `for-in` | head (`ForInNext`), body, exit |
//! | `switch` | one per case, exit |
//! | `try` | body, catch, continuation |
//!
//! Loops record their exit and continue blocks under their label index;
//! `break` and `continue` jump there after running the finalizers of every
//! `try` they leave.

use super::{GotoLabel, IrGen, TryFrame};
use crate::ast::{Ast, BinaryOperator, NodeId, NodeKind};
use crate::ir::{BlockId, InstrKind, Value};

impl IrGen<'_> {
    /// Lowers one statement.
    pub(super) fn gen_statement(&mut self, node: NodeId) {
        let ast = self.ast;
        self.builder.next_statement(ast[node].range);
        match &ast[node].kind {
            // Hoisted by the prologue
            NodeKind::FunctionDeclaration(_) => {}
            NodeKind::BlockStatement { body, .. } => {
                for &statement in body {
                    self.gen_statement(statement);
                }
            }
            NodeKind::EmptyStatement => {}
            NodeKind::DebuggerStatement => {
                self.builder.emit(InstrKind::Debugger);
            }
            NodeKind::ExpressionStatement { expression, .. } => {
                self.gen_expression(*expression, None);
            }
            NodeKind::VariableDeclaration { declarations, .. } => {
                for &declarator in declarations {
                    self.gen_variable_declarator(declarator);
                }
            }
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            } => self.gen_if(*test, *consequent, *alternate),
            NodeKind::WhileStatement { test, body } => self.gen_while(node, *test, *body),
            NodeKind::DoWhileStatement { body, test } => self.gen_do_while(node, *body, *test),
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            } => self.gen_for(node, *init, *test, *update, *body),
            NodeKind::ForInStatement { left, right, body } => {
                self.gen_for_in(node, *left, *right, *body)
            }
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            } => self.gen_switch(node, *discriminant, cases),
            NodeKind::LabeledStatement { body, .. } => self.gen_labeled(node, *body),
            NodeKind::BreakStatement { .. } => self.gen_jump(node, false),
            NodeKind::ContinueStatement { .. } => self.gen_jump(node, true),
            NodeKind::ReturnStatement { argument } => {
                let value = match argument {
                    Some(argument) => self.gen_expression(*argument, None),
                    None => Value::UNDEFINED,
                };
                self.unwind_try_frames(None);
                self.builder.ret(value);
            }
            NodeKind::ThrowStatement { argument } => {
                let value = self.gen_expression(*argument, None);
                self.builder.emit(InstrKind::Throw(value));
            }
            NodeKind::TryStatement {
                block,
                handler,
                finalizer,
            } => self.gen_try(node, *block, *handler, *finalizer),
            kind => panic!("{} is not a statement", kind.name()),
        }
    }

    fn gen_variable_declarator(&mut self, declarator: NodeId) {
        let NodeKind::VariableDeclarator { id, init } = self.ast[declarator].kind else {
            panic!("{} is not a declarator", self.ast[declarator].kind.name());
        };
        if let Some(init) = init {
            let name = self.identifier(id);
            let value = self.gen_expression(init, Some(name));
            self.emit_store_to_name(name, value);
        }
    }

    // ========================================================================
    // Branches and loops
    // ========================================================================

    fn gen_if(&mut self, test: NodeId, consequent: NodeId, alternate: Option<NodeId>) {
        let then_block = self.builder.create_block();
        let else_block = alternate.map(|_| self.builder.create_block());
        let continuation = self.builder.create_block();

        let condition = self.gen_expression(test, None);
        self.builder
            .cond_branch(condition, then_block, else_block.unwrap_or(continuation));

        self.builder.set_insertion_block(Some(then_block));
        self.gen_statement(consequent);
        self.jump_if_reachable(continuation);

        if let (Some(alternate), Some(else_block)) = (alternate, else_block) {
            self.builder.set_insertion_block(Some(else_block));
            self.gen_statement(alternate);
            self.jump_if_reachable(continuation);
        }
        self.builder.set_insertion_block(Some(continuation));
    }

    fn set_loop_label(&mut self, node: NodeId, exit: BlockId, continue_target: Option<BlockId>) {
        let index = self.label_index(node);
        self.set_label(
            index,
            GotoLabel {
                break_target: Some(exit),
                continue_target,
            },
        );
    }

    fn gen_while(&mut self, node: NodeId, test: NodeId, body: NodeId) {
        let condition_block = self.builder.create_block();
        let body_block = self.builder.create_block();
        let exit = self.builder.create_block();
        self.set_loop_label(node, exit, Some(condition_block));

        self.builder.branch(condition_block);
        self.builder.set_insertion_block(Some(condition_block));
        let condition = self.gen_expression(test, None);
        self.builder.cond_branch(condition, body_block, exit);

        self.builder.set_insertion_block(Some(body_block));
        self.gen_statement(body);
        self.jump_if_reachable(condition_block);

        self.builder.set_insertion_block(Some(exit));
    }

    fn gen_do_while(&mut self, node: NodeId, body: NodeId, test: NodeId) {
        let body_block = self.builder.create_block();
        let condition_block = self.builder.create_block();
        let exit = self.builder.create_block();
        self.set_loop_label(node, exit, Some(condition_block));

        self.builder.branch(body_block);
        self.builder.set_insertion_block(Some(body_block));
        self.gen_statement(body);
        self.jump_if_reachable(condition_block);

        self.builder.set_insertion_block(Some(condition_block));
        let condition = self.gen_expression(test, None);
        self.builder.cond_branch(condition, body_block, exit);

        self.builder.set_insertion_block(Some(exit));
    }

    fn gen_for(
        &mut self,
        node: NodeId,
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    ) {
        if let Some(init) = init {
            if let NodeKind::VariableDeclaration { .. } = self.ast[init].kind {
                self.gen_statement(init);
            } else {
                self.gen_expression(init, None);
            }
        }

        let condition_block = self.builder.create_block();
        let body_block = self.builder.create_block();
        let update_block = self.builder.create_block();
        let exit = self.builder.create_block();
        self.set_loop_label(node, exit, Some(update_block));

        self.builder.branch(condition_block);
        self.builder.set_insertion_block(Some(condition_block));
        match test {
            Some(test) => {
                let condition = self.gen_expression(test, None);
                self.builder.cond_branch(condition, body_block, exit);
            }
            None => self.builder.branch(body_block),
        }

        self.builder.set_insertion_block(Some(body_block));
        self.gen_statement(body);
        self.jump_if_reachable(update_block);

        self.builder.set_insertion_block(Some(update_block));
        if let Some(update) = update {
            self.gen_expression(update, None);
        }
        self.builder.branch(condition_block);

        self.builder.set_insertion_block(Some(exit));
    }

    fn gen_for_in(&mut self, node: NodeId, left: NodeId, right: NodeId, body: NodeId) {
        let ast = self.ast;
        let object = self.gen_expression(right, None);
        let iterator = self.builder.emit(InstrKind::ForInStart(object));

        let head = self.builder.create_block();
        let body_block = self.builder.create_block();
        let exit = self.builder.create_block();
        self.set_loop_label(node, exit, Some(head));

        self.builder.branch(head);
        self.builder.set_insertion_block(Some(head));
        let key = self.builder.emit(InstrKind::ForInNext(iterator));
        let done = self.builder.emit(InstrKind::Binary {
            operator: BinaryOperator::StrictEqual,
            left: key,
            right: Value::UNDEFINED,
        });
        self.builder.cond_branch(done, exit, body_block);

        self.builder.set_insertion_block(Some(body_block));
        match &ast[left].kind {
            NodeKind::VariableDeclaration { declarations, .. } => {
                let Some(&declarator) = declarations.first() else {
                    panic!("for-in declaration without a declarator");
                };
                let NodeKind::VariableDeclarator { id, .. } = ast[declarator].kind else {
                    panic!("{} is not a declarator", ast[declarator].kind.name());
                };
                let name = self.identifier(id);
                self.emit_store_to_name(name, key);
            }
            _ => {
                let target = self.gen_lreference(left);
                self.emit_store(target, key);
            }
        }
        self.gen_statement(body);
        self.jump_if_reachable(head);

        self.builder.set_insertion_block(Some(exit));
    }

    fn gen_switch(&mut self, node: NodeId, discriminant: NodeId, cases: &[NodeId]) {
        let ast = self.ast;
        let value = self.gen_expression(discriminant, None);
        let exit = self.builder.create_block();
        self.set_loop_label(node, exit, None);

        let case_blocks: Vec<BlockId> = cases.iter().map(|_| self.builder.create_block()).collect();
        let mut default_block = None;
        for (&case, &block) in cases.iter().zip(&case_blocks) {
            let NodeKind::SwitchCase { test, .. } = ast[case].kind else {
                panic!("{} is not a switch case", ast[case].kind.name());
            };
            let Some(test) = test else {
                default_block = Some(block);
                continue;
            };
            let candidate = self.gen_expression(test, None);
            let matches = self.builder.emit(InstrKind::Binary {
                operator: BinaryOperator::StrictEqual,
                left: value,
                right: candidate,
            });
            let next = self.builder.create_block();
            self.builder.cond_branch(matches, block, next);
            self.builder.set_insertion_block(Some(next));
        }
        self.builder.branch(default_block.unwrap_or(exit));

        for (index, &case) in cases.iter().enumerate() {
            let NodeKind::SwitchCase { consequent, .. } = &ast[case].kind else {
                continue;
            };
            self.builder.set_insertion_block(Some(case_blocks[index]));
            for &statement in consequent {
                self.gen_statement(statement);
            }
            // Fall through into the next case
            let next = case_blocks.get(index + 1).copied().unwrap_or(exit);
            self.jump_if_reachable(next);
        }

        self.builder.set_insertion_block(Some(exit));
    }

    fn gen_labeled(&mut self, node: NodeId, body: NodeId) {
        let ast = self.ast;
        if is_loop_through_labels(ast, body) {
            self.gen_statement(body);
            return;
        }
        let exit = self.builder.create_block();
        self.set_loop_label(node, exit, None);
        self.gen_statement(body);
        self.jump_if_reachable(exit);
        self.builder.set_insertion_block(Some(exit));
    }

    fn gen_jump(&mut self, node: NodeId, is_continue: bool) {
        let index = self.label_index(node);
        let label = self.context().labels[index];
        let target = if is_continue {
            label.continue_target
        } else {
            label.break_target
        };
        let Some(target) = target else {
            panic!("{} target was not lowered", self.ast[node].kind.name());
        };
        let surrounding_try = self.function_info().labels[index].surrounding_try;
        self.unwind_try_frames(surrounding_try);
        self.builder.branch(target);
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    fn gen_try(
        &mut self,
        node: NodeId,
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    ) {
        match (handler, finalizer) {
            (Some(handler), None) => self.gen_protected(
                node,
                None,
                |this| this.gen_statement(block),
                |this, exception| this.gen_catch_clause(handler, exception),
            ),
            (handler, Some(finalizer)) => self.gen_protected(
                node,
                Some(finalizer),
                |this| match handler {
                    Some(handler) => this.gen_protected(
                        node,
                        None,
                        |this| this.gen_statement(block),
                        |this, exception| this.gen_catch_clause(handler, exception),
                    ),
                    None => this.gen_statement(block),
                },
                |this, exception| {
                    this.gen_statement(finalizer);
                    if this.builder.is_reachable() {
                        this.builder.emit(InstrKind::Throw(exception));
                    }
                },
            ),
            (None, None) => panic!("try statement without catch or finally"),
        }
    }

    /// Emits a try region around `body`. On normal exit the region is left
    /// and `finalizer` runs; `on_catch` receives the caught exception.
    fn gen_protected(
        &mut self,
        node: NodeId,
        finalizer: Option<NodeId>,
        body: impl FnOnce(&mut Self),
        on_catch: impl FnOnce(&mut Self, Value),
    ) {
        let body_block = self.builder.create_block();
        let catch_block = self.builder.create_block();
        let continuation = self.builder.create_block();
        self.builder.emit(InstrKind::TryStart {
            body: body_block,
            catch_block,
        });

        self.builder.set_insertion_block(Some(body_block));
        self.context_mut()
            .try_stack
            .push(TryFrame { node, finalizer });
        body(self);
        self.context_mut().try_stack.pop();
        if self.builder.is_reachable() {
            self.builder.emit(InstrKind::TryEnd);
            if let Some(finalizer) = finalizer {
                self.gen_statement(finalizer);
            }
            self.jump_if_reachable(continuation);
        }

        self.builder.set_insertion_block(Some(catch_block));
        let exception = self.builder.emit(InstrKind::Catch);
        on_catch(self, exception);
        self.jump_if_reachable(continuation);

        self.builder.set_insertion_block(Some(continuation));
    }

    fn gen_catch_clause(&mut self, handler: NodeId, exception: Value) {
        let NodeKind::CatchClause { param, body } = self.ast[handler].kind else {
            panic!("{} is not a catch clause", self.ast[handler].kind.name());
        };
        let name = self.identifier(param);
        self.names.begin_scope();
        let variable = self.builder.add_variable(name);
        self.names.declare(name, variable);
        self.builder.store_frame(variable, exception);
        self.gen_statement(body);
        self.names.end_scope();
    }

    /// Leaves every try region entered after `target`, innermost first,
    /// running their finalizers. `None` leaves them all.
    fn unwind_try_frames(&mut self, target: Option<NodeId>) {
        let frames = self.context().try_stack.clone();
        for depth in (0..frames.len()).rev() {
            let frame = frames[depth];
            if Some(frame.node) == target {
                break;
            }
            self.builder.emit(InstrKind::TryEnd);
            if let Some(finalizer) = frame.finalizer {
                // The finalizer itself runs outside the region it guards
                let inner = std::mem::replace(
                    &mut self.context_mut().try_stack,
                    frames[..depth].to_vec(),
                );
                self.gen_statement(finalizer);
                self.context_mut().try_stack = inner;
            }
        }
    }
}

fn is_loop_through_labels(ast: &Ast, node: NodeId) -> bool {
    match &ast[node].kind {
        NodeKind::LabeledStatement { body, .. } => is_loop_through_labels(ast, *body),
        kind => kind.is_loop(),
    }
}
