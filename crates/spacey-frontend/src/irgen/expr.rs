//! Expression lowering.

use super::IrGen;
use crate::ast::{
    BinaryOperator, CompoundOperation, LogicalOperator, NodeId, NodeKind, UnaryOperator,
    UpdateOperator,
};
use crate::ident::Atom;
use crate::ir::{InstrKind, Literal, Value, VariableId};

/// An assignment target with its object and key already evaluated.
#[derive(Debug, Clone, Copy)]
pub(super) enum LReference {
    /// A frame variable
    Variable(VariableId),
    /// A property of the global object
    Global(Atom),
    /// `object[property]`
    Member { object: Value, property: Value },
}

impl IrGen<'_> {
    /// Lowers an expression and returns its value. `hint` names anonymous
    /// functions after the variable or property they are assigned to.
    pub(super) fn gen_expression(&mut self, node: NodeId, hint: Option<Atom>) -> Value {
        let ast = self.ast;
        match &ast[node].kind {
            NodeKind::NullLiteral => Literal::Null.into(),
            NodeKind::BooleanLiteral(value) => Literal::Bool(*value).into(),
            NodeKind::NumericLiteral(value) => Literal::Number(*value).into(),
            NodeKind::StringLiteral(value) => Literal::String(*value).into(),
            NodeKind::BigIntLiteral(value) => {
                let digits = self.interner.intern(&value.to_string());
                Literal::BigInt(digits).into()
            }
            NodeKind::RegExpLiteral { pattern, flags } => {
                self.builder.emit(InstrKind::CreateRegExp {
                    pattern: *pattern,
                    flags: *flags,
                })
            }
            NodeKind::Identifier(name) => self.gen_identifier(*name, false),
            NodeKind::ThisExpression => self.gen_this(),
            NodeKind::NewTargetExpression => self.gen_new_target(),
            NodeKind::ArrayExpression { elements } => self.gen_array(elements),
            NodeKind::ObjectExpression { properties } => self.gen_object(properties),
            NodeKind::FunctionExpression(_) => self.gen_function_expression(node, hint),
            NodeKind::ArrowFunctionExpression(_) => {
                let function = self.gen_function_like(node, hint.unwrap_or(self.keywords.empty));
                self.builder.emit(InstrKind::CreateFunction(function))
            }
            NodeKind::UnaryExpression { operator, argument } => {
                self.gen_unary(*operator, *argument)
            }
            NodeKind::UpdateExpression {
                operator,
                argument,
                prefix,
            } => self.gen_update(*operator, *argument, *prefix),
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            } => {
                let left = self.gen_expression(*left, None);
                let right = self.gen_expression(*right, None);
                self.builder.emit(InstrKind::Binary {
                    operator: *operator,
                    left,
                    right,
                })
            }
            NodeKind::LogicalExpression {
                operator,
                left,
                right,
            } => {
                let left = self.gen_expression(*left, None);
                let right = *right;
                self.gen_logical(*operator, left, |this| this.gen_expression(right, None))
            }
            NodeKind::AssignmentExpression {
                operator,
                left,
                right,
            } => match operator.operation() {
                CompoundOperation::Plain => {
                    let target = self.gen_lreference(*left);
                    let value = self.gen_expression(*right, self.name_hint(*left));
                    self.emit_store(target, value);
                    value
                }
                CompoundOperation::Binary(operator) => {
                    let target = self.gen_lreference(*left);
                    let old = self.emit_load(target);
                    let right = self.gen_expression(*right, None);
                    let value = self.builder.emit(InstrKind::Binary {
                        operator,
                        left: old,
                        right,
                    });
                    self.emit_store(target, value);
                    value
                }
                CompoundOperation::Logical(operator) => {
                    let target = self.gen_lreference(*left);
                    let old = self.emit_load(target);
                    let (right, hint) = (*right, self.name_hint(*left));
                    self.gen_logical(operator, old, |this| {
                        let value = this.gen_expression(right, hint);
                        this.emit_store(target, value);
                        value
                    })
                }
            },
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => self.gen_conditional(*test, *consequent, *alternate),
            NodeKind::CallExpression { callee, arguments } => self.gen_call(*callee, arguments),
            NodeKind::NewExpression { callee, arguments } => {
                let callee = self.gen_expression(*callee, None);
                let arguments = self.gen_arguments(arguments);
                self.builder
                    .emit(InstrKind::Construct { callee, arguments })
            }
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                let object = self.gen_expression(*object, None);
                let property = self.gen_member_property(*property, *computed);
                self.builder
                    .emit(InstrKind::LoadProperty { object, property })
            }
            NodeKind::SequenceExpression { expressions } => {
                let mut value = Value::UNDEFINED;
                for &expression in expressions {
                    value = self.gen_expression(expression, None);
                }
                value
            }
            kind => panic!("{} is not an expression", kind.name()),
        }
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Returns the frame variable bound to `name` in the function being
    /// lowered or, from an arrow, in an enclosing function up to and
    /// including the first ordinary one.
    pub(super) fn function_scoped_variable(&self, name: Atom) -> Option<VariableId> {
        let variable = self.names.resolve(name)?;
        let owner = self.builder.module().variable(variable).owner;
        for context in self.contexts.iter().rev() {
            if context.function == owner {
                return Some(variable);
            }
            if !context.is_arrow {
                break;
            }
        }
        None
    }

    /// Reads a name. `typeof` reads of missing globals yield `undefined`
    /// instead of throwing.
    fn gen_identifier(&mut self, name: Atom, in_typeof: bool) -> Value {
        if name == self.keywords.arguments
            && !self.is_global_function()
            && self.function_scoped_variable(name).is_none()
        {
            if !self.context().is_arrow {
                return self.get_arguments_object();
            }
            if let Some(captured) = self.context().captured_arguments {
                return self.builder.load_frame(captured);
            }
        }

        match self.names.resolve(name) {
            Some(variable) => self.builder.load_frame(variable),
            None => {
                self.builder.module_mut().global_property(name, false);
                if in_typeof {
                    self.builder.emit(InstrKind::LoadGlobal(name))
                } else {
                    self.builder.emit(InstrKind::TryLoadGlobal(name))
                }
            }
        }
    }

    /// Stores to a name, binding it as a global property if unresolved.
    pub(super) fn emit_store_to_name(&mut self, name: Atom, value: Value) {
        match self.names.resolve(name) {
            Some(variable) => self.builder.store_frame(variable, value),
            None => {
                self.builder.module_mut().global_property(name, false);
                self.emit_global_store(name, value);
            }
        }
    }

    /// Writes a global property; strict code may not create one, so only
    /// stores to declared globals skip the existence check.
    pub(super) fn emit_global_store(&mut self, name: Atom, value: Value) {
        let declared = self
            .builder
            .module()
            .find_global(name)
            .is_some_and(|global| global.declared);
        if self.is_strict() && !declared {
            self.builder
                .emit(InstrKind::TryStoreGlobal { name, value });
        } else {
            self.builder.emit(InstrKind::StoreGlobal { name, value });
        }
    }

    fn gen_this(&mut self) -> Value {
        if !self.context().is_arrow {
            return Value::Parameter(0);
        }
        match self.context().captured_this {
            Some(captured) => self.builder.load_frame(captured),
            None => Value::UNDEFINED,
        }
    }

    pub(super) fn gen_new_target(&mut self) -> Value {
        if self.context().is_arrow {
            return match self.context().captured_new_target {
                Some(captured) => self.builder.load_frame(captured),
                None => Value::UNDEFINED,
            };
        }
        if self.is_global_function() {
            return Value::UNDEFINED;
        }
        self.builder.emit(InstrKind::GetNewTarget)
    }

    fn name_hint(&self, target: NodeId) -> Option<Atom> {
        match self.ast[target].kind {
            NodeKind::Identifier(name) => Some(name),
            NodeKind::MemberExpression {
                property,
                computed: false,
                ..
            } => self.ast.identifier(property),
            _ => None,
        }
    }

    // ========================================================================
    // References
    // ========================================================================

    /// Evaluates the parts of an assignment target.
    pub(super) fn gen_lreference(&mut self, node: NodeId) -> LReference {
        let ast = self.ast;
        match ast[node].kind {
            NodeKind::Identifier(name) => match self.names.resolve(name) {
                Some(variable) => LReference::Variable(variable),
                None => {
                    self.builder.module_mut().global_property(name, false);
                    LReference::Global(name)
                }
            },
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                let object = self.gen_expression(object, None);
                let property = self.gen_member_property(property, computed);
                LReference::Member { object, property }
            }
            ref kind => panic!("{} is not an assignment target", kind.name()),
        }
    }

    pub(super) fn emit_load(&mut self, target: LReference) -> Value {
        match target {
            LReference::Variable(variable) => self.builder.load_frame(variable),
            LReference::Global(name) => self.builder.emit(InstrKind::TryLoadGlobal(name)),
            LReference::Member { object, property } => self
                .builder
                .emit(InstrKind::LoadProperty { object, property }),
        }
    }

    pub(super) fn emit_store(&mut self, target: LReference, value: Value) {
        match target {
            LReference::Variable(variable) => self.builder.store_frame(variable, value),
            LReference::Global(name) => self.emit_global_store(name, value),
            LReference::Member { object, property } => {
                self.builder.emit(InstrKind::StoreProperty {
                    object,
                    property,
                    value,
                });
            }
        }
    }

    fn gen_member_property(&mut self, property: NodeId, computed: bool) -> Value {
        if computed {
            return self.gen_expression(property, None);
        }
        Literal::String(self.identifier(property)).into()
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn gen_unary(&mut self, operator: UnaryOperator, argument: NodeId) -> Value {
        let ast = self.ast;
        match (operator, &ast[argument].kind) {
            (UnaryOperator::Delete, _) => self.gen_delete(argument),
            (UnaryOperator::Typeof, NodeKind::Identifier(name)) => {
                let name = *name;
                let operand = self.gen_identifier(name, true);
                self.builder.emit(InstrKind::Unary { operator, operand })
            }
            _ => {
                let operand = self.gen_expression(argument, None);
                self.builder.emit(InstrKind::Unary { operator, operand })
            }
        }
    }

    fn gen_delete(&mut self, argument: NodeId) -> Value {
        let ast = self.ast;
        match ast[argument].kind {
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                let object = self.gen_expression(object, None);
                let property = self.gen_member_property(property, computed);
                self.builder
                    .emit(InstrKind::DeleteProperty { object, property })
            }
            // Frame variables cannot be deleted
            NodeKind::Identifier(name) if self.names.resolve(name).is_some() => {
                Literal::Bool(false).into()
            }
            NodeKind::Identifier(name) => self.builder.emit(InstrKind::DeleteProperty {
                object: Value::GlobalObject,
                property: Literal::String(name).into(),
            }),
            _ => {
                self.gen_expression(argument, None);
                Literal::Bool(true).into()
            }
        }
    }

    fn gen_update(&mut self, operator: UpdateOperator, argument: NodeId, prefix: bool) -> Value {
        let target = self.gen_lreference(argument);
        let old = self.emit_load(target);
        let old = self.builder.emit(InstrKind::AsNumeric(old));
        let operator = match operator {
            UpdateOperator::Increment => BinaryOperator::Add,
            UpdateOperator::Decrement => BinaryOperator::Subtract,
        };
        let new = self.builder.emit(InstrKind::Binary {
            operator,
            left: old,
            right: Literal::Number(1.0).into(),
        });
        self.emit_store(target, new);
        if prefix { new } else { old }
    }

    /// Short-circuits on `left`; `right` is lowered in its own block and
    /// the result joins both paths through a phi.
    fn gen_logical(
        &mut self,
        operator: LogicalOperator,
        left: Value,
        right: impl FnOnce(&mut Self) -> Value,
    ) -> Value {
        let right_block = self.builder.create_block();
        let continuation = self.builder.create_block();

        let condition = match operator {
            LogicalOperator::NullishCoalescing => self.builder.emit(InstrKind::Binary {
                operator: BinaryOperator::Equal,
                left,
                right: Literal::Null.into(),
            }),
            LogicalOperator::And | LogicalOperator::Or => left,
        };
        let left_block = self.builder.current_block();
        match operator {
            LogicalOperator::Or => self
                .builder
                .cond_branch(condition, continuation, right_block),
            LogicalOperator::And | LogicalOperator::NullishCoalescing => self
                .builder
                .cond_branch(condition, right_block, continuation),
        }

        self.builder.set_insertion_block(Some(right_block));
        let right = right(self);
        let right_end = self.builder.current_block();
        self.builder.branch(continuation);

        self.builder.set_insertion_block(Some(continuation));
        self.builder.emit(InstrKind::Phi {
            entries: vec![(left, left_block), (right, right_end)],
        })
    }

    fn gen_conditional(&mut self, test: NodeId, consequent: NodeId, alternate: NodeId) -> Value {
        let then_block = self.builder.create_block();
        let else_block = self.builder.create_block();
        let continuation = self.builder.create_block();

        let condition = self.gen_expression(test, None);
        self.builder.cond_branch(condition, then_block, else_block);

        self.builder.set_insertion_block(Some(then_block));
        let then_value = self.gen_expression(consequent, None);
        let then_end = self.builder.current_block();
        self.builder.branch(continuation);

        self.builder.set_insertion_block(Some(else_block));
        let else_value = self.gen_expression(alternate, None);
        let else_end = self.builder.current_block();
        self.builder.branch(continuation);

        self.builder.set_insertion_block(Some(continuation));
        self.builder.emit(InstrKind::Phi {
            entries: vec![(then_value, then_end), (else_value, else_end)],
        })
    }

    // ========================================================================
    // Calls and literals
    // ========================================================================

    fn gen_call(&mut self, callee: NodeId, arguments: &[NodeId]) -> Value {
        let ast = self.ast;
        let (callee, this) = match ast[callee].kind {
            NodeKind::MemberExpression {
                object,
                property,
                computed,
            } => {
                let object = self.gen_expression(object, None);
                let property = self.gen_member_property(property, computed);
                let function = self
                    .builder
                    .emit(InstrKind::LoadProperty { object, property });
                (function, object)
            }
            _ => (self.gen_expression(callee, None), Value::UNDEFINED),
        };
        let arguments = self.gen_arguments(arguments);
        self.builder.emit(InstrKind::Call {
            callee,
            this,
            arguments,
        })
    }

    fn gen_arguments(&mut self, arguments: &[NodeId]) -> Vec<Value> {
        arguments
            .iter()
            .map(|&argument| self.gen_expression(argument, None))
            .collect()
    }

    fn gen_array(&mut self, elements: &[Option<NodeId>]) -> Value {
        let array = self.builder.emit(InstrKind::AllocArray {
            length: elements.len() as u32,
        });
        for (index, element) in elements.iter().enumerate() {
            let Some(element) = *element else {
                continue;
            };
            let value = self.gen_expression(element, None);
            self.builder.emit(InstrKind::StoreOwnProperty {
                object: array,
                property: Literal::Number(index as f64).into(),
                value,
            });
        }
        array
    }

    fn gen_object(&mut self, properties: &[NodeId]) -> Value {
        let ast = self.ast;
        let object = self.builder.emit(InstrKind::AllocObject {
            size: properties.len() as u32,
        });
        for &property in properties {
            let NodeKind::Property {
                key,
                value,
                computed,
            } = ast[property].kind
            else {
                panic!("{} is not a property", ast[property].kind.name());
            };
            let (key, hint) = match &ast[key].kind {
                _ if computed => (self.gen_expression(key, None), None),
                NodeKind::Identifier(name) | NodeKind::StringLiteral(name) => {
                    (Literal::String(*name).into(), Some(*name))
                }
                NodeKind::NumericLiteral(number) => (Literal::Number(*number).into(), None),
                _ => (self.gen_expression(key, None), None),
            };
            let value = self.gen_expression(value, hint);
            self.builder.emit(InstrKind::StoreOwnProperty {
                object,
                property: key,
                value,
            });
        }
        object
    }
}
