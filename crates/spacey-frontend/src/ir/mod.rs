//! Intermediate representation produced by the IR generator.
//!
//! A [`Module`] owns every [`Function`], the frame [`Variable`]s of all
//! functions and the table of global properties. Each function owns its
//! basic blocks and instructions; blocks list instruction ids in order and
//! end with a terminator once complete.
//!
//! Instructions are created through an [`IrBuilder`], which tracks the
//! current function and insertion block. [`pretty`] renders the IR as text.

mod builder;
mod function;
mod instr;
mod module;
pub mod pretty;

pub use builder::{BuilderState, IrBuilder};
pub use function::{BasicBlock, DefinitionKind, Function, LazySource, Parameter};
pub use instr::{InstrKind, Instruction, Location};
pub use module::{GlobalProperty, Module, Variable};

use crate::ident::Atom;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Returns the raw index.
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

id_type!(
    /// Handle of a [`Function`] in a [`Module`].
    FunctionId
);
id_type!(
    /// Handle of a [`BasicBlock`] in a [`Function`].
    BlockId
);
id_type!(
    /// Handle of an [`Instruction`] in a [`Function`].
    InstrId
);
id_type!(
    /// Handle of a [`Variable`] in a [`Module`].
    VariableId
);

/// Constant operands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// A number
    Number(f64),
    /// A string
    String(Atom),
    /// A BigInt, as its decimal digits
    BigInt(Atom),
}

/// An instruction operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// A constant
    Literal(Literal),
    /// A parameter of the current function; 0 is the receiver
    Parameter(u32),
    /// The result of an instruction
    Instr(InstrId),
    /// The global object
    GlobalObject,
}

impl Value {
    /// `undefined`
    pub const UNDEFINED: Value = Value::Literal(Literal::Undefined);

    /// Returns the instruction producing this value, if any.
    pub fn as_instr(self) -> Option<InstrId> {
        match self {
            Value::Instr(id) => Some(id),
            _ => None,
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        Value::Literal(literal)
    }
}
