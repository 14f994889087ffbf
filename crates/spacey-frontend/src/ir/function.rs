//! IR functions and their basic blocks.

use super::{BlockId, InstrId, InstrKind, Instruction, VariableId};
use crate::ast::FunctionLikeKind;
use crate::ident::Atom;
use crate::irgen::SavedScope;
use crate::source::{BufferId, SourceRange};
use std::sync::Arc;

/// How a function was defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// An ordinary function, or the global code
    Es5,
    /// An arrow function
    Arrow,
}

/// What is needed to lower a deferred function body later.
#[derive(Debug, Clone)]
pub struct LazySource {
    /// Buffer holding the function text
    pub buffer: BufferId,
    /// The kind of node to re-parse
    pub node_kind: FunctionLikeKind,
    /// Source range of the whole function
    pub function_range: SourceRange,
    /// Names visible where the function was defined
    pub scope: Arc<SavedScope>,
}

/// A formal parameter. Parameter 0 is always the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name
    pub name: Atom,
}

/// A straight-line sequence of instructions.
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    instrs: Vec<InstrId>,
}

impl BasicBlock {
    /// Returns the instructions in order.
    pub fn instrs(&self) -> &[InstrId] {
        &self.instrs
    }

    /// Returns true if the block holds no instruction.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
}

/// A function in the IR.
#[derive(Debug)]
pub struct Function {
    /// Function name; empty for anonymous functions
    pub name: Atom,
    /// Ordinary or arrow
    pub kind: DefinitionKind,
    /// Strict mode code
    pub strict: bool,
    /// The global code of a program
    pub global_scope: bool,
    /// Source range of the function
    pub range: SourceRange,
    /// Parameters, starting with the receiver
    pub params: Vec<Parameter>,
    /// Frame variables owned by this function
    pub variables: Vec<VariableId>,
    /// Set while the body has not been lowered
    pub lazy_source: Option<LazySource>,
    /// Variable holding the closure of a named function expression
    pub lazy_closure_alias: Option<VariableId>,
    /// Statements lowered so far, while the body is being generated
    pub statement_count: Option<u32>,
    blocks: Vec<BasicBlock>,
    order: Vec<BlockId>,
    instrs: Vec<Instruction>,
}

impl Function {
    pub(crate) fn new(
        name: Atom,
        kind: DefinitionKind,
        strict: bool,
        range: SourceRange,
        global_scope: bool,
    ) -> Self {
        Self {
            name,
            kind,
            strict,
            global_scope,
            range,
            params: Vec::new(),
            variables: Vec::new(),
            lazy_source: None,
            lazy_closure_alias: None,
            statement_count: None,
            blocks: Vec::new(),
            order: Vec::new(),
            instrs: Vec::new(),
        }
    }

    /// Returns the number of formal parameters, not counting the receiver.
    pub fn param_count(&self) -> usize {
        self.params.len().saturating_sub(1)
    }

    /// Returns true if the body still has to be lowered.
    pub fn is_lazy(&self) -> bool {
        self.lazy_source.is_some()
    }

    /// Returns the blocks in layout order.
    pub fn blocks(&self) -> &[BlockId] {
        &self.order
    }

    /// Returns the entry block.
    pub fn entry(&self) -> Option<BlockId> {
        self.order.first().copied()
    }

    /// Returns a block.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// Returns an instruction.
    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.index()]
    }

    /// Returns the instructions of `block` in order.
    pub fn instructions(&self, block: BlockId) -> impl Iterator<Item = (InstrId, &Instruction)> {
        self.block(block)
            .instrs
            .iter()
            .map(|&id| (id, &self.instrs[id.index()]))
    }

    /// Returns every instruction in layout order.
    pub fn all_instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.order
            .iter()
            .flat_map(|&block| self.block(block).instrs.iter())
            .map(|&id| &self.instrs[id.index()])
    }

    /// Returns the terminator of `block`, if it has one.
    pub fn terminator(&self, block: BlockId) -> Option<InstrId> {
        let last = *self.block(block).instrs.last()?;
        self.instr(last).kind.is_terminator().then_some(last)
    }

    /// Returns the blocks branching to `block`, once per edge.
    pub fn predecessors(&self, block: BlockId) -> Vec<BlockId> {
        self.order
            .iter()
            .copied()
            .filter_map(|pred| Some((pred, self.terminator(pred)?)))
            .flat_map(|(pred, term)| {
                self.instr(term)
                    .kind
                    .successors()
                    .into_iter()
                    .filter(move |&succ| succ == block)
                    .map(move |_| pred)
            })
            .collect()
    }

    pub(crate) fn create_block(&mut self) -> BlockId {
        let id = BlockId::from_index(self.blocks.len());
        self.blocks.push(BasicBlock::default());
        self.order.push(id);
        id
    }

    pub(crate) fn push_instr(&mut self, block: BlockId, instr: Instruction) -> InstrId {
        let id = InstrId::from_index(self.instrs.len());
        self.instrs.push(instr);
        self.blocks[block.index()].instrs.push(id);
        id
    }

    /// Inserts an instruction just before the terminator of `block`, or at
    /// its end if it has none.
    pub(crate) fn insert_before_terminator(
        &mut self,
        block: BlockId,
        instr: Instruction,
    ) -> InstrId {
        let position = match self.terminator(block) {
            Some(_) => self.block(block).instrs.len() - 1,
            None => self.block(block).instrs.len(),
        };
        let id = InstrId::from_index(self.instrs.len());
        self.instrs.push(instr);
        self.blocks[block.index()].instrs.insert(position, id);
        id
    }

    /// Folds the single successor of `block` into it when `block` ends in
    /// an unconditional branch and is that successor's only predecessor.
    /// Returns whether the blocks were merged.
    pub(crate) fn merge_successor(&mut self, block: BlockId) -> bool {
        let Some(term) = self.terminator(block) else {
            return false;
        };
        let InstrKind::Branch(successor) = self.instr(term).kind else {
            return false;
        };
        if successor == block || self.predecessors(successor) != [block] {
            return false;
        }

        let moved = std::mem::take(&mut self.blocks[successor.index()].instrs);
        let instrs = &mut self.blocks[block.index()].instrs;
        instrs.pop();
        instrs.extend(moved);
        self.order.retain(|&id| id != successor);
        for instr in &mut self.instrs {
            instr.kind.replace_block(successor, block);
        }
        true
    }

    /// Drops every block and instruction, keeping the signature.
    pub(crate) fn clear_body(&mut self) {
        self.blocks.clear();
        self.order.clear();
        self.instrs.clear();
        self.statement_count = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Interner;
    use crate::ir::{Location, Value};
    use crate::source::SourceManager;

    fn function() -> Function {
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("t.js", "");
        let name = Interner::new().intern("f");
        Function::new(
            name,
            DefinitionKind::Es5,
            false,
            SourceRange::new(buffer, 0, 0),
            false,
        )
    }

    fn emit(function: &mut Function, block: BlockId, kind: InstrKind) -> InstrId {
        function.push_instr(
            block,
            Instruction {
                kind,
                location: Location::default(),
            },
        )
    }

    #[test]
    fn test_merge_single_predecessor() {
        let mut f = function();
        let entry = f.create_block();
        let body = f.create_block();
        emit(&mut f, entry, InstrKind::Branch(body));
        emit(&mut f, body, InstrKind::Return(Value::UNDEFINED));

        assert!(f.merge_successor(entry));
        assert_eq!(f.blocks(), &[entry]);
        assert_eq!(f.block(entry).instrs().len(), 1);
        assert!(f.terminator(entry).is_some());
    }

    #[test]
    fn test_no_merge_with_second_predecessor() {
        let mut f = function();
        let entry = f.create_block();
        let body = f.create_block();
        let other = f.create_block();
        emit(&mut f, entry, InstrKind::Branch(body));
        emit(&mut f, body, InstrKind::Branch(other));
        emit(&mut f, other, InstrKind::Branch(body));

        assert!(!f.merge_successor(entry));
        assert_eq!(f.blocks().len(), 3);
    }

    #[test]
    fn test_insert_before_terminator() {
        let mut f = function();
        let entry = f.create_block();
        emit(&mut f, entry, InstrKind::Return(Value::UNDEFINED));
        let inserted = f.insert_before_terminator(
            entry,
            Instruction {
                kind: InstrKind::CreateArguments,
                location: Location::default(),
            },
        );
        assert_eq!(f.block(entry).instrs()[0], inserted);
        assert_eq!(f.predecessors(entry), Vec::<BlockId>::new());
    }
}
