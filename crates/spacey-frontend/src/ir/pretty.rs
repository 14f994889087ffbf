//! Textual rendering of the IR.
//!
//! ```text
//! function f(a) es5
//! frame = [a]
//! %BB0:
//!   StoreFrame %a, [a]
//!   %0 = LoadFrame [a]
//!   %1 = Binary +, %0, 1
//!   Return %1
//! ```
//!
//! Blocks and instruction results are numbered in layout order, so the
//! text does not depend on how the IR was built.

use super::{
    BlockId, DefinitionKind, Function, FunctionId, InstrId, InstrKind, Literal, Module, Value,
    VariableId,
};
use crate::ident::Interner;
use rustc_hash::FxHashMap;
use std::fmt::Write;

/// Renders one function.
pub fn function_to_string(module: &Module, function: FunctionId, interner: &Interner) -> String {
    let mut out = String::new();
    Printer::new(module, function, interner).print(&mut out);
    out
}

/// Renders the global properties and every function of a module.
pub fn module_to_string(module: &Module, interner: &Interner) -> String {
    let mut out = String::new();
    if !module.globals().is_empty() {
        let globals = module
            .globals()
            .iter()
            .map(|global| {
                let marker = if global.declared { "" } else { "?" };
                format!("{}{marker}", interner.resolve(global.name))
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "globals = [{globals}]");
        out.push('\n');
    }
    for (index, (id, _)) in module.functions().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        Printer::new(module, id, interner).print(&mut out);
    }
    out
}

struct Printer<'a> {
    module: &'a Module,
    id: FunctionId,
    function: &'a Function,
    interner: &'a Interner,
    blocks: FxHashMap<BlockId, usize>,
    instrs: FxHashMap<InstrId, usize>,
}

impl<'a> Printer<'a> {
    fn new(module: &'a Module, id: FunctionId, interner: &'a Interner) -> Self {
        let function = &module[id];
        let blocks = function
            .blocks()
            .iter()
            .enumerate()
            .map(|(number, &block)| (block, number))
            .collect();

        let mut instrs = FxHashMap::default();
        for &block in function.blocks() {
            for (instr, data) in function.instructions(block) {
                if !data.kind.is_void() {
                    let number = instrs.len();
                    instrs.insert(instr, number);
                }
            }
        }

        Self {
            module,
            id,
            function,
            interner,
            blocks,
            instrs,
        }
    }

    fn print(&self, out: &mut String) {
        let function = self.function;
        let params = function
            .params
            .iter()
            .skip(1)
            .map(|param| self.interner.resolve(param.name))
            .collect::<Vec<_>>()
            .join(", ");
        let mut flags = vec![match function.kind {
            DefinitionKind::Es5 => "es5",
            DefinitionKind::Arrow => "arrow",
        }];
        if function.strict {
            flags.push("strict");
        }
        if function.global_scope {
            flags.push("global");
        }
        if function.is_lazy() {
            flags.push("lazy");
        }
        let _ = writeln!(
            out,
            "function {}({params}) {}",
            self.function_name(function),
            flags.join(" ")
        );

        if !function.variables.is_empty() {
            let frame = function
                .variables
                .iter()
                .map(|&var| self.interner.resolve(self.module.variable(var).name))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "frame = [{frame}]");
        }

        for &block in function.blocks() {
            let _ = writeln!(out, "%BB{}:", self.blocks[&block]);
            for (id, instr) in function.instructions(block) {
                out.push_str("  ");
                if let Some(number) = self.instrs.get(&id) {
                    let _ = write!(out, "%{number} = ");
                }
                out.push_str(instr.kind.name());
                let operands = self.operands(&instr.kind);
                if !operands.is_empty() {
                    out.push(' ');
                    out.push_str(&operands.join(", "));
                }
                out.push('\n');
            }
        }
    }

    fn function_name(&self, function: &Function) -> &'a str {
        match self.interner.resolve(function.name) {
            "" => "anonymous",
            name => name,
        }
    }

    fn operands(&self, kind: &InstrKind) -> Vec<String> {
        let v = |value: &Value| self.value(*value);
        match kind {
            InstrKind::LoadFrame(var) => vec![self.variable(*var)],
            InstrKind::StoreFrame { variable, value } => vec![v(value), self.variable(*variable)],
            InstrKind::LoadGlobal(name) | InstrKind::TryLoadGlobal(name) => {
                vec![self.interner.resolve(*name).to_string()]
            }
            InstrKind::StoreGlobal { name, value } | InstrKind::TryStoreGlobal { name, value } => {
                vec![v(value), self.interner.resolve(*name).to_string()]
            }
            InstrKind::LoadProperty { object, property }
            | InstrKind::DeleteProperty { object, property } => vec![v(object), v(property)],
            InstrKind::StoreProperty {
                object,
                property,
                value,
            }
            | InstrKind::StoreOwnProperty {
                object,
                property,
                value,
            } => vec![v(value), v(object), v(property)],
            InstrKind::AllocObject { size } => vec![size.to_string()],
            InstrKind::AllocArray { length } => vec![length.to_string()],
            InstrKind::CreateFunction(function) => {
                vec![self.function_name(&self.module[*function]).to_string()]
            }
            InstrKind::CreateRegExp { pattern, flags } => vec![format!(
                "/{}/{}",
                self.interner.resolve(*pattern),
                self.interner.resolve(*flags)
            )],
            InstrKind::Unary { operator, operand } => vec![operator.to_string(), v(operand)],
            InstrKind::Binary {
                operator,
                left,
                right,
            } => vec![operator.to_string(), v(left), v(right)],
            InstrKind::AsNumeric(value)
            | InstrKind::ForInStart(value)
            | InstrKind::ForInNext(value)
            | InstrKind::Return(value)
            | InstrKind::Throw(value) => vec![v(value)],
            InstrKind::Call {
                callee,
                this,
                arguments,
            } => [v(callee), v(this)]
                .into_iter()
                .chain(arguments.iter().map(v))
                .collect(),
            InstrKind::Construct { callee, arguments } => std::iter::once(v(callee))
                .chain(arguments.iter().map(v))
                .collect(),
            InstrKind::Phi { entries } => entries
                .iter()
                .flat_map(|(value, block)| [v(value), self.block(*block)])
                .collect(),
            InstrKind::Branch(target) => vec![self.block(*target)],
            InstrKind::CondBranch {
                condition,
                then_block,
                else_block,
            } => vec![v(condition), self.block(*then_block), self.block(*else_block)],
            InstrKind::TryStart { body, catch_block } => {
                vec![self.block(*body), self.block(*catch_block)]
            }
            InstrKind::CreateArguments
            | InstrKind::GetNewTarget
            | InstrKind::Catch
            | InstrKind::TryEnd
            | InstrKind::Debugger
            | InstrKind::Unreachable => Vec::new(),
        }
    }

    fn value(&self, value: Value) -> String {
        match value {
            Value::Literal(Literal::Undefined) => "undefined".into(),
            Value::Literal(Literal::Null) => "null".into(),
            Value::Literal(Literal::Bool(value)) => value.to_string(),
            Value::Literal(Literal::Number(value)) => value.to_string(),
            Value::Literal(Literal::String(atom)) => format!("{:?}", self.interner.resolve(atom)),
            Value::Literal(Literal::BigInt(digits)) => {
                format!("{}n", self.interner.resolve(digits))
            }
            Value::Parameter(index) => match self.function.params.get(index as usize) {
                Some(param) if index > 0 => format!("%{}", self.interner.resolve(param.name)),
                _ => "%this".into(),
            },
            Value::Instr(id) => match self.instrs.get(&id) {
                Some(number) => format!("%{number}"),
                None => format!("%<dead {}>", id.index()),
            },
            Value::GlobalObject => "globalObject".into(),
        }
    }

    fn variable(&self, id: VariableId) -> String {
        let variable = self.module.variable(id);
        let name = self.interner.resolve(variable.name);
        if variable.owner == self.id {
            format!("[{name}]")
        } else {
            format!("[{name}@{}]", self.function_name(&self.module[variable.owner]))
        }
    }

    fn block(&self, block: BlockId) -> String {
        match self.blocks.get(&block) {
            Some(number) => format!("%BB{number}"),
            None => format!("%<deleted BB{}>", block.index()),
        }
    }
}
