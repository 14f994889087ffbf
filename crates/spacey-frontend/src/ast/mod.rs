//! Abstract Syntax Tree (AST) definitions for JavaScript.
//!
//! Node kinds follow ESTree naming. Nodes live in an [`Ast`] arena and refer
//! to each other through [`NodeId`]s. Besides its syntax every node carries
//! a [`Decoration`] that later passes write into: function-like nodes get
//! their strictness and semantic record, loops and labels get a label
//! index, and try statements remember the try they are nested in.

mod ops;

pub use ops::{
    AssignmentOperator, BinaryOperator, CompoundOperation, LogicalOperator, UnaryOperator,
    UpdateOperator,
};

use crate::ident::Atom;
use crate::sema::FunctionInfoId;
use crate::source::{BufferId, SourceRange};
use num_bigint::BigInt;
use std::cell::Cell;
use std::ops::Index;

/// Index of a node inside an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the raw index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a label allocated by the validator within one function.
pub type LabelIndex = u32;

/// Strictness recorded on a function-like node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Not decorated yet
    #[default]
    NotSet,
    /// Sloppy mode code
    NonStrict,
    /// Strict mode code
    Strict,
}

impl Strictness {
    /// Converts a strict flag.
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Strictness::Strict
        } else {
            Strictness::NonStrict
        }
    }

    /// Returns true only for [`Strictness::Strict`].
    pub fn is_strict(self) -> bool {
        self == Strictness::Strict
    }
}

/// Mutable annotations written by validation.
#[derive(Debug, Default)]
pub struct Decoration {
    strictness: Cell<Strictness>,
    sem_info: Cell<Option<FunctionInfoId>>,
    label_index: Cell<Option<LabelIndex>>,
    surrounding_try: Cell<Option<NodeId>>,
}

/// Variable declaration kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// var
    Var,
    /// let
    Let,
    /// const
    Const,
}

/// The shape shared by every function-like node.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLike {
    /// Optional name (an `Identifier` node)
    pub id: Option<NodeId>,
    /// Parameters (`Identifier` nodes)
    pub params: Vec<NodeId>,
    /// Body; a `BlockStatement`, or any expression for concise arrows
    pub body: NodeId,
}

/// Which kind of function-like node a function came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionLikeKind {
    /// The top-level program
    Program,
    /// `function f() {}` in statement position
    FunctionDeclaration,
    /// `function () {}` in expression position
    FunctionExpression,
    /// `() => {}`
    ArrowFunction,
}

/// Every kind of syntax node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A complete program
    Program {
        /// Top-level statements
        body: Vec<NodeId>,
    },
    /// Function declaration
    FunctionDeclaration(FunctionLike),
    /// Function expression
    FunctionExpression(FunctionLike),
    /// Arrow function
    ArrowFunctionExpression(FunctionLike),

    /// Block statement `{ ... }`
    BlockStatement {
        /// Statements in the block
        body: Vec<NodeId>,
        /// Set on a function body whose contents were not parsed
        lazy: Option<BufferId>,
    },
    /// `;`
    EmptyStatement,
    /// `debugger;`
    DebuggerStatement,
    /// An expression used as a statement
    ExpressionStatement {
        /// The expression
        expression: NodeId,
        /// Raw text of a directive prologue string
        directive: Option<Atom>,
    },
    /// `var a = 1, b;`
    VariableDeclaration {
        /// var, let or const
        kind: VariableKind,
        /// `VariableDeclarator` nodes
        declarations: Vec<NodeId>,
    },
    /// One `name = init` entry of a declaration
    VariableDeclarator {
        /// The declared `Identifier`
        id: NodeId,
        /// Optional initializer
        init: Option<NodeId>,
    },
    /// `if (test) consequent else alternate`
    IfStatement {
        /// Condition
        test: NodeId,
        /// Taken branch
        consequent: NodeId,
        /// Optional else branch
        alternate: Option<NodeId>,
    },
    /// `while (test) body`
    WhileStatement {
        /// Condition
        test: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// `do body while (test)`
    DoWhileStatement {
        /// Loop body
        body: NodeId,
        /// Condition
        test: NodeId,
    },
    /// `for (init; test; update) body`
    ForStatement {
        /// Declaration or expression
        init: Option<NodeId>,
        /// Condition
        test: Option<NodeId>,
        /// Update expression
        update: Option<NodeId>,
        /// Loop body
        body: NodeId,
    },
    /// `for (left in right) body`
    ForInStatement {
        /// Declaration or assignment target
        left: NodeId,
        /// Object being enumerated
        right: NodeId,
        /// Loop body
        body: NodeId,
    },
    /// `switch (discriminant) { cases }`
    SwitchStatement {
        /// Value being switched on
        discriminant: NodeId,
        /// `SwitchCase` nodes
        cases: Vec<NodeId>,
    },
    /// `case test:` or `default:`
    SwitchCase {
        /// None for `default`
        test: Option<NodeId>,
        /// Statements of the case
        consequent: Vec<NodeId>,
    },
    /// `label: body`
    LabeledStatement {
        /// The label `Identifier`
        label: NodeId,
        /// Labeled statement
        body: NodeId,
    },
    /// `break label;`
    BreakStatement {
        /// Optional label `Identifier`
        label: Option<NodeId>,
    },
    /// `continue label;`
    ContinueStatement {
        /// Optional label `Identifier`
        label: Option<NodeId>,
    },
    /// `return argument;`
    ReturnStatement {
        /// Returned value
        argument: Option<NodeId>,
    },
    /// `throw argument;`
    ThrowStatement {
        /// Thrown value
        argument: NodeId,
    },
    /// `try block catch finally`
    TryStatement {
        /// Protected block
        block: NodeId,
        /// Optional `CatchClause`
        handler: Option<NodeId>,
        /// Optional finally block
        finalizer: Option<NodeId>,
    },
    /// `catch (param) body`
    CatchClause {
        /// The bound `Identifier`
        param: NodeId,
        /// Handler block
        body: NodeId,
    },

    /// A name
    Identifier(Atom),
    /// `null`
    NullLiteral,
    /// `true` or `false`
    BooleanLiteral(bool),
    /// A number
    NumericLiteral(f64),
    /// A string
    StringLiteral(Atom),
    /// A BigInt
    BigIntLiteral(BigInt),
    /// `/pattern/flags`
    RegExpLiteral {
        /// Body between the slashes
        pattern: Atom,
        /// Flags after the closing slash
        flags: Atom,
    },
    /// `this`
    ThisExpression,
    /// `new.target`
    NewTargetExpression,
    /// `[a, , b]`
    ArrayExpression {
        /// Elements; None marks a hole
        elements: Vec<Option<NodeId>>,
    },
    /// `{ key: value }`
    ObjectExpression {
        /// `Property` nodes
        properties: Vec<NodeId>,
    },
    /// One `key: value` entry
    Property {
        /// Identifier, string or number for plain keys; any expression when computed
        key: NodeId,
        /// Property value
        value: NodeId,
        /// `[key]: value`
        computed: bool,
    },
    /// `op argument`
    UnaryExpression {
        /// The operator
        operator: UnaryOperator,
        /// The operand
        argument: NodeId,
    },
    /// `++a`, `a--`
    UpdateExpression {
        /// The operator
        operator: UpdateOperator,
        /// The operand
        argument: NodeId,
        /// Whether prefix (++x) or postfix (x++)
        prefix: bool,
    },
    /// `left op right`
    BinaryExpression {
        /// The operator
        operator: BinaryOperator,
        /// The left operand
        left: NodeId,
        /// The right operand
        right: NodeId,
    },
    /// `&&`, `||`, `??`
    LogicalExpression {
        /// The operator
        operator: LogicalOperator,
        /// The left operand
        left: NodeId,
        /// The right operand
        right: NodeId,
    },
    /// `left op= right`
    AssignmentExpression {
        /// The operator
        operator: AssignmentOperator,
        /// The target
        left: NodeId,
        /// The value
        right: NodeId,
    },
    /// `test ? consequent : alternate`
    ConditionalExpression {
        /// The condition
        test: NodeId,
        /// The consequent (if true)
        consequent: NodeId,
        /// The alternate (if false)
        alternate: NodeId,
    },
    /// `callee(arguments)`
    CallExpression {
        /// The function being called
        callee: NodeId,
        /// The arguments
        arguments: Vec<NodeId>,
    },
    /// `new callee(arguments)`
    NewExpression {
        /// The constructor
        callee: NodeId,
        /// The arguments
        arguments: Vec<NodeId>,
    },
    /// `object.property` or `object[property]`
    MemberExpression {
        /// The object
        object: NodeId,
        /// An `Identifier` unless computed
        property: NodeId,
        /// Whether this is computed (bracket notation)
        computed: bool,
    },
    /// `a, b, c`
    SequenceExpression {
        /// The expressions
        expressions: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Returns the ESTree name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::FunctionDeclaration(_) => "FunctionDeclaration",
            NodeKind::FunctionExpression(_) => "FunctionExpression",
            NodeKind::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
            NodeKind::BlockStatement { .. } => "BlockStatement",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::DebuggerStatement => "DebuggerStatement",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::ForInStatement { .. } => "ForInStatement",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::LabeledStatement { .. } => "LabeledStatement",
            NodeKind::BreakStatement { .. } => "BreakStatement",
            NodeKind::ContinueStatement { .. } => "ContinueStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::ThrowStatement { .. } => "ThrowStatement",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::NullLiteral => "NullLiteral",
            NodeKind::BooleanLiteral(_) => "BooleanLiteral",
            NodeKind::NumericLiteral(_) => "NumericLiteral",
            NodeKind::StringLiteral(_) => "StringLiteral",
            NodeKind::BigIntLiteral(_) => "BigIntLiteral",
            NodeKind::RegExpLiteral { .. } => "RegExpLiteral",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::NewTargetExpression => "MetaProperty",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::UpdateExpression { .. } => "UpdateExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::SequenceExpression { .. } => "SequenceExpression",
        }
    }

    /// Returns the function shape and kind of a function-like node.
    pub fn function_like(&self) -> Option<(FunctionLikeKind, &FunctionLike)> {
        match self {
            NodeKind::FunctionDeclaration(func) => Some((FunctionLikeKind::FunctionDeclaration, func)),
            NodeKind::FunctionExpression(func) => Some((FunctionLikeKind::FunctionExpression, func)),
            NodeKind::ArrowFunctionExpression(func) => Some((FunctionLikeKind::ArrowFunction, func)),
            _ => None,
        }
    }

    /// Returns true for the four loop statements.
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            NodeKind::WhileStatement { .. }
                | NodeKind::DoWhileStatement { .. }
                | NodeKind::ForStatement { .. }
                | NodeKind::ForInStatement { .. }
        )
    }
}

/// A node: its syntax, where it came from, and its decorations.
#[derive(Debug)]
pub struct Node {
    /// What the node is
    pub kind: NodeKind,
    /// Source range covered by the node
    pub range: SourceRange,
    deco: Decoration,
}

impl Node {
    /// Returns the recorded strictness of a function-like node.
    pub fn strictness(&self) -> Strictness {
        self.deco.strictness.get()
    }

    /// Records the strictness of a function-like node.
    pub fn set_strictness(&self, strictness: Strictness) {
        self.deco.strictness.set(strictness);
    }

    /// Returns the semantic record linked to a function-like node.
    pub fn sem_info(&self) -> Option<FunctionInfoId> {
        self.deco.sem_info.get()
    }

    /// Links a function-like node to its semantic record.
    pub fn set_sem_info(&self, info: FunctionInfoId) {
        self.deco.sem_info.set(Some(info));
    }

    /// Returns the label index of a loop, switch or labeled statement.
    pub fn label_index(&self) -> Option<LabelIndex> {
        self.deco.label_index.get()
    }

    /// Records the label index of a loop, switch or labeled statement.
    pub fn set_label_index(&self, index: LabelIndex) {
        self.deco.label_index.set(Some(index));
    }

    /// Returns the try statement enclosing a try statement.
    pub fn surrounding_try(&self) -> Option<NodeId> {
        self.deco.surrounding_try.get()
    }

    /// Records the try statement enclosing a try statement.
    pub fn set_surrounding_try(&self, node: Option<NodeId>) {
        self.deco.surrounding_try.set(node);
    }
}

/// The node arena.
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its id.
    pub fn alloc(&mut self, kind: NodeKind, range: SourceRange) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            range,
            deco: Decoration::default(),
        });
        id
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drops every node allocated at or after `len`.
    ///
    /// Used by the parser to discard the contents of a lazily parsed
    /// function body; no node below `len` may refer to the dropped ones.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    /// Returns the name of an `Identifier` node.
    pub fn identifier(&self, id: NodeId) -> Option<Atom> {
        match self[id].kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Calls `f` on every direct child of `id`, in source order.
    pub fn for_each_child(&self, id: NodeId, mut f: impl FnMut(NodeId)) {
        fn opt(child: &Option<NodeId>, f: &mut impl FnMut(NodeId)) {
            if let Some(child) = child {
                f(*child);
            }
        }

        match &self[id].kind {
            NodeKind::Program { body }
            | NodeKind::BlockStatement { body, .. } => body.iter().copied().for_each(f),
            NodeKind::FunctionDeclaration(func)
            | NodeKind::FunctionExpression(func)
            | NodeKind::ArrowFunctionExpression(func) => {
                opt(&func.id, &mut f);
                func.params.iter().copied().for_each(&mut f);
                f(func.body);
            }
            NodeKind::ExpressionStatement { expression, .. } => f(*expression),
            NodeKind::VariableDeclaration { declarations, .. } => {
                declarations.iter().copied().for_each(f)
            }
            NodeKind::VariableDeclarator { id, init } => {
                f(*id);
                opt(init, &mut f);
            }
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                f(*test);
                f(*consequent);
                opt(alternate, &mut f);
            }
            NodeKind::WhileStatement { test, body } => {
                f(*test);
                f(*body);
            }
            NodeKind::DoWhileStatement { body, test } => {
                f(*body);
                f(*test);
            }
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                opt(init, &mut f);
                opt(test, &mut f);
                opt(update, &mut f);
                f(*body);
            }
            NodeKind::ForInStatement { left, right, body } => {
                f(*left);
                f(*right);
                f(*body);
            }
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            } => {
                f(*discriminant);
                cases.iter().copied().for_each(f);
            }
            NodeKind::SwitchCase { test, consequent } => {
                opt(test, &mut f);
                consequent.iter().copied().for_each(f);
            }
            NodeKind::LabeledStatement { label, body } => {
                f(*label);
                f(*body);
            }
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } => {
                opt(label, &mut f)
            }
            NodeKind::ReturnStatement { argument } => opt(argument, &mut f),
            NodeKind::ThrowStatement { argument } => f(*argument),
            NodeKind::TryStatement {
                block,
                handler,
                finalizer,
            } => {
                f(*block);
                opt(handler, &mut f);
                opt(finalizer, &mut f);
            }
            NodeKind::CatchClause { param, body } => {
                f(*param);
                f(*body);
            }
            NodeKind::ArrayExpression { elements } => elements.iter().flatten().copied().for_each(f),
            NodeKind::ObjectExpression { properties } => properties.iter().copied().for_each(f),
            NodeKind::Property { key, value, .. } => {
                f(*key);
                f(*value);
            }
            NodeKind::UnaryExpression { argument, .. }
            | NodeKind::UpdateExpression { argument, .. } => f(*argument),
            NodeKind::BinaryExpression { left, right, .. }
            | NodeKind::LogicalExpression { left, right, .. }
            | NodeKind::AssignmentExpression { left, right, .. } => {
                f(*left);
                f(*right);
            }
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                f(*test);
                f(*consequent);
                f(*alternate);
            }
            NodeKind::CallExpression { callee, arguments }
            | NodeKind::NewExpression { callee, arguments } => {
                f(*callee);
                arguments.iter().copied().for_each(f);
            }
            NodeKind::MemberExpression {
                object, property, ..
            } => {
                f(*object);
                f(*property);
            }
            NodeKind::SequenceExpression { expressions } => expressions.iter().copied().for_each(f),
            NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::Identifier(_)
            | NodeKind::NullLiteral
            | NodeKind::BooleanLiteral(_)
            | NodeKind::NumericLiteral(_)
            | NodeKind::StringLiteral(_)
            | NodeKind::BigIntLiteral(_)
            | NodeKind::RegExpLiteral { .. }
            | NodeKind::ThisExpression
            | NodeKind::NewTargetExpression => {}
        }
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}
