//! Instructions.

use super::{BlockId, FunctionId, Value, VariableId};
use crate::ast::{BinaryOperator, UnaryOperator};
use crate::ident::Atom;
use crate::source::SourceRange;

/// Where an instruction came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    /// Source range of the statement or expression being lowered
    pub range: Option<SourceRange>,
    /// Index of the statement within its function, counting from 1
    pub statement: u32,
}

/// An instruction and its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// What the instruction does
    pub kind: InstrKind,
    /// Where it came from
    pub location: Location,
}

/// Every kind of instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    // Storage
    /// Reads a frame variable
    LoadFrame(VariableId),
    /// Writes a frame variable
    StoreFrame {
        /// Target
        variable: VariableId,
        /// Stored value
        value: Value,
    },
    /// Reads a global property, yielding `undefined` if it is missing
    LoadGlobal(Atom),
    /// Reads a global property, throwing `ReferenceError` if it is missing
    TryLoadGlobal(Atom),
    /// Writes a global property, creating it if needed
    StoreGlobal {
        /// Property name
        name: Atom,
        /// Stored value
        value: Value,
    },
    /// Writes a global property, throwing `ReferenceError` if it is missing
    TryStoreGlobal {
        /// Property name
        name: Atom,
        /// Stored value
        value: Value,
    },

    // Objects
    /// `object[property]`
    LoadProperty {
        /// Receiver
        object: Value,
        /// Key
        property: Value,
    },
    /// `object[property] = value`
    StoreProperty {
        /// Receiver
        object: Value,
        /// Key
        property: Value,
        /// Stored value
        value: Value,
    },
    /// Defines an own property of a literal being built
    StoreOwnProperty {
        /// Receiver
        object: Value,
        /// Key
        property: Value,
        /// Stored value
        value: Value,
    },
    /// `delete object[property]`
    DeleteProperty {
        /// Receiver
        object: Value,
        /// Key
        property: Value,
    },
    /// A new object with room for `size` properties
    AllocObject {
        /// Expected property count
        size: u32,
    },
    /// A new array of the given length
    AllocArray {
        /// Array length, holes included
        length: u32,
    },
    /// A closure over a function
    CreateFunction(FunctionId),
    /// The `arguments` object of the current function
    CreateArguments,
    /// `new.target` of the current function
    GetNewTarget,
    /// A regular expression object
    CreateRegExp {
        /// Pattern text
        pattern: Atom,
        /// Flags
        flags: Atom,
    },

    // Operators
    /// A unary operator other than `delete`
    Unary {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        operand: Value,
    },
    /// A binary operator
    Binary {
        /// Operator
        operator: BinaryOperator,
        /// Left operand
        left: Value,
        /// Right operand
        right: Value,
    },
    /// Converts to a number or BigInt
    AsNumeric(Value),

    // Calls
    /// `callee.call(this, ...arguments)`
    Call {
        /// Function
        callee: Value,
        /// Receiver
        this: Value,
        /// Arguments
        arguments: Vec<Value>,
    },
    /// `new callee(...arguments)`
    Construct {
        /// Constructor
        callee: Value,
        /// Arguments
        arguments: Vec<Value>,
    },

    // Control flow helpers
    /// Selects a value by predecessor block
    Phi {
        /// `(value, incoming block)` pairs
        entries: Vec<(Value, BlockId)>,
    },
    /// Starts enumerating the keys of an object
    ForInStart(Value),
    /// Next key of an enumeration, or `undefined` when done
    ForInNext(Value),
    /// The exception caught on entry to a catch block
    Catch,
    /// Leaves the innermost try region
    TryEnd,
    /// `debugger`
    Debugger,
    /// Marks code that must never run
    Unreachable,

    // Terminators
    /// Unconditional jump
    Branch(BlockId),
    /// Two-way jump on truthiness
    CondBranch {
        /// Condition
        condition: Value,
        /// Taken when truthy
        then_block: BlockId,
        /// Taken when falsy
        else_block: BlockId,
    },
    /// Returns from the function
    Return(Value),
    /// Throws an exception
    Throw(Value),
    /// Enters a try region
    TryStart {
        /// First block of the protected region
        body: BlockId,
        /// Handler entered when the region throws
        catch_block: BlockId,
    },
}

impl InstrKind {
    /// Returns true if this instruction ends a block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstrKind::Branch(_)
                | InstrKind::CondBranch { .. }
                | InstrKind::Return(_)
                | InstrKind::Throw(_)
                | InstrKind::TryStart { .. }
        )
    }

    /// Returns the blocks a terminator can transfer control to.
    pub fn successors(&self) -> Vec<BlockId> {
        match *self {
            InstrKind::Branch(target) => vec![target],
            InstrKind::CondBranch {
                then_block,
                else_block,
                ..
            } => vec![then_block, else_block],
            InstrKind::TryStart { body, catch_block } => vec![body, catch_block],
            _ => Vec::new(),
        }
    }

    /// Returns the name used by the printer.
    pub fn name(&self) -> &'static str {
        match self {
            InstrKind::LoadFrame(_) => "LoadFrame",
            InstrKind::StoreFrame { .. } => "StoreFrame",
            InstrKind::LoadGlobal(_) => "LoadGlobal",
            InstrKind::TryLoadGlobal(_) => "TryLoadGlobal",
            InstrKind::StoreGlobal { .. } => "StoreGlobal",
            InstrKind::TryStoreGlobal { .. } => "TryStoreGlobal",
            InstrKind::LoadProperty { .. } => "LoadProperty",
            InstrKind::StoreProperty { .. } => "StoreProperty",
            InstrKind::StoreOwnProperty { .. } => "StoreOwnProperty",
            InstrKind::DeleteProperty { .. } => "DeleteProperty",
            InstrKind::AllocObject { .. } => "AllocObject",
            InstrKind::AllocArray { .. } => "AllocArray",
            InstrKind::CreateFunction(_) => "CreateFunction",
            InstrKind::CreateArguments => "CreateArguments",
            InstrKind::GetNewTarget => "GetNewTarget",
            InstrKind::CreateRegExp { .. } => "CreateRegExp",
            InstrKind::Unary { .. } => "Unary",
            InstrKind::Binary { .. } => "Binary",
            InstrKind::AsNumeric(_) => "AsNumeric",
            InstrKind::Call { .. } => "Call",
            InstrKind::Construct { .. } => "Construct",
            InstrKind::Phi { .. } => "Phi",
            InstrKind::ForInStart(_) => "ForInStart",
            InstrKind::ForInNext(_) => "ForInNext",
            InstrKind::Catch => "Catch",
            InstrKind::TryEnd => "TryEnd",
            InstrKind::Debugger => "Debugger",
            InstrKind::Unreachable => "Unreachable",
            InstrKind::Branch(_) => "Branch",
            InstrKind::CondBranch { .. } => "CondBranch",
            InstrKind::Return(_) => "Return",
            InstrKind::Throw(_) => "Throw",
            InstrKind::TryStart { .. } => "TryStart",
        }
    }

    /// Returns true if the instruction produces no value.
    pub fn is_void(&self) -> bool {
        self.is_terminator()
            || matches!(
                self,
                InstrKind::StoreFrame { .. }
                    | InstrKind::StoreGlobal { .. }
                    | InstrKind::TryStoreGlobal { .. }
                    | InstrKind::StoreProperty { .. }
                    | InstrKind::StoreOwnProperty { .. }
                    | InstrKind::TryEnd
                    | InstrKind::Debugger
                    | InstrKind::Unreachable
            )
    }

    /// Rewrites block references from `from` to `to`.
    pub(crate) fn replace_block(&mut self, from: BlockId, to: BlockId) {
        let swap = |block: &mut BlockId| {
            if *block == from {
                *block = to;
            }
        };
        match self {
            InstrKind::Phi { entries } => entries.iter_mut().for_each(|(_, block)| swap(block)),
            InstrKind::Branch(target) => swap(target),
            InstrKind::CondBranch {
                then_block,
                else_block,
                ..
            } => {
                swap(then_block);
                swap(else_block);
            }
            InstrKind::TryStart { body, catch_block } => {
                swap(body);
                swap(catch_block);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminators() {
        let block = BlockId::from_index(1);
        assert!(InstrKind::Branch(block).is_terminator());
        assert!(InstrKind::Return(Value::UNDEFINED).is_terminator());
        assert!(!InstrKind::Unreachable.is_terminator());
        assert!(InstrKind::Unreachable.is_void());
        assert!(!InstrKind::CreateArguments.is_void());
    }

    #[test]
    fn test_replace_block_in_phi() {
        let (a, b, c) = (
            BlockId::from_index(0),
            BlockId::from_index(1),
            BlockId::from_index(2),
        );
        let mut phi = InstrKind::Phi {
            entries: vec![(Value::UNDEFINED, a), (Value::UNDEFINED, b)],
        };
        phi.replace_block(b, c);
        assert_eq!(
            phi,
            InstrKind::Phi {
                entries: vec![(Value::UNDEFINED, a), (Value::UNDEFINED, c)],
            }
        );
    }
}
