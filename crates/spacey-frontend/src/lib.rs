// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-frontend
//!
//! The middle of a JavaScript compiler: semantic validation of a parsed
//! program, then lowering into a block-structured IR.
//!
//! ## Overview
//!
//! - [`parser`] builds an arena [`ast`] from source text, optionally
//!   deferring large function bodies.
//! - [`sema`] checks the rules a parser cannot (labels, jumps, assignment
//!   targets, strict mode names, regular expressions) and records what
//!   lowering needs about each function.
//! - [`irgen`] turns validated functions into [`ir`], including closure
//!   capture for arrows and on-demand lowering of deferred bodies.
//! - [`gc`] defines the header every heap object starts with.
//!
//! ## Quick Start
//!
//! ```rust
//! use spacey_frontend::{Frontend, FrontendConfig};
//!
//! let mut frontend = Frontend::new(FrontendConfig::default());
//! frontend.compile("add.js", "function f(a) { return a + 1; }").unwrap();
//! let f = frontend.find_function("f").unwrap();
//! assert_eq!(frontend.module()[f].param_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
#[cfg(feature = "async")]
pub mod async_frontend;
pub mod config;
pub mod error;
pub mod gc;
pub mod ident;
pub mod ir;
pub mod irgen;
pub mod lexer;
pub mod parser;
pub mod regexp;
pub mod sema;
pub mod source;

// Re-exports for convenience
#[cfg(feature = "async")]
pub use async_frontend::{AsyncFrontend, CompiledUnit};
pub use config::FrontendConfig;
pub use error::{Error, Result};

use ast::{Ast, NodeId};
use ident::{Interner, Keywords};
use ir::{FunctionId, Module};
use irgen::IrGen;
use parser::Parser;
use sema::{SemContext, SemanticValidator};
use source::{BufferId, Diagnostic, Diagnostics, Severity, SourceManager};
use std::sync::Arc;
use tracing::debug;

/// The front end pipeline.
///
/// Owns everything a compilation produces: source buffers, the AST arena,
/// semantic records, the IR module and the diagnostics. Sources compiled
/// one after another share the module, so functions of earlier programs
/// stay valid.
pub struct Frontend {
    config: FrontendConfig,
    sources: SourceManager,
    interner: Interner,
    keywords: Keywords,
    ast: Ast,
    sem: SemContext,
    module: Module,
    diagnostics: Diagnostics,
}

impl Frontend {
    /// Creates a front end with the given configuration.
    pub fn new(config: FrontendConfig) -> Self {
        let mut interner = Interner::new();
        let keywords = Keywords::new(&mut interner);
        let diagnostics = Diagnostics::new(config.max_errors);
        Self {
            config,
            sources: SourceManager::new(),
            interner,
            keywords,
            ast: Ast::new(),
            sem: SemContext::new(),
            module: Module::new(),
            diagnostics,
        }
    }

    /// Registers source text under `name`.
    pub fn add_source(&mut self, name: impl Into<String>, text: impl Into<Arc<str>>) -> BufferId {
        self.sources.add_buffer(name, text)
    }

    /// Parses a registered buffer into a `Program` node.
    pub fn parse(&mut self, buffer: BufferId) -> Result<NodeId> {
        let text = self.sources.shared_text(buffer);
        Parser::new(&text, buffer, &mut self.ast, &mut self.interner)
            .with_lazy_threshold(self.config.lazy_threshold())
            .parse_program()
    }

    /// Validates a parsed program. Errors are recorded in
    /// [`diagnostics`](Self::diagnostics); the returned error only counts
    /// them.
    pub fn validate(&mut self, root: NodeId) -> Result<()> {
        let before = self.diagnostics.error_count();
        let ok = SemanticValidator::new(
            &self.ast,
            &mut self.sem,
            &self.interner,
            self.keywords,
            &mut self.diagnostics,
        )
        .validate_program(root, self.config.strict);
        if ok {
            Ok(())
        } else {
            Err(Error::Validation {
                errors: self.diagnostics.error_count() - before,
            })
        }
    }

    /// Lowers a validated program and returns its global function.
    ///
    /// # Panics
    ///
    /// Panics if `root` was not validated.
    pub fn lower(&mut self, root: NodeId) -> FunctionId {
        IrGen::new(
            &self.ast,
            &self.sem,
            &mut self.interner,
            self.keywords,
            &mut self.module,
        )
        .lower_program(root)
    }

    /// Parses and validates `text` without lowering it.
    pub fn check(&mut self, name: impl Into<String>, text: impl Into<Arc<str>>) -> Result<NodeId> {
        let buffer = self.add_source(name, text);
        let root = self.parse(buffer)?;
        self.validate(root)?;
        Ok(root)
    }

    /// Parses, validates and lowers `text`, returning its global function.
    pub fn compile(
        &mut self,
        name: impl Into<String>,
        text: impl Into<Arc<str>>,
    ) -> Result<FunctionId> {
        let root = self.check(name, text)?;
        Ok(self.lower(root))
    }

    /// Lowers the deferred body of a lazy function in place.
    ///
    /// The body is parsed again from its recorded source range and
    /// validated on its own. If that fails, the function is replaced by
    /// one that throws the first error as a `SyntaxError` when called;
    /// the error is still recorded in the diagnostics.
    pub fn compile_lazy(&mut self, function: FunctionId) -> Result<()> {
        let Some(lazy) = self.module[function].lazy_source.clone() else {
            return Err(Error::NotLazy(self.function_name(function).to_string()));
        };
        let _span = tracing::debug_span!("compile lazy function").entered();

        let text = self.sources.shared_text(lazy.buffer);
        let parsed = Parser::new_at(
            &text,
            lazy.function_range.start as usize,
            lazy.buffer,
            &mut self.ast,
            &mut self.interner,
        )
        .with_lazy_threshold(self.config.lazy_threshold())
        .parse_lazy_function(lazy.node_kind);

        let node = match parsed {
            Ok(node) => node,
            Err(Error::Syntax { message, range }) => {
                self.diagnostics.error(range, message.clone());
                self.replace_with_syntax_error(function, &message);
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        let stored = self.diagnostics.len();
        let strict = self.module[function].strict;
        let ok = SemanticValidator::new(
            &self.ast,
            &mut self.sem,
            &self.interner,
            self.keywords,
            &mut self.diagnostics,
        )
        .validate_function(node, strict);
        if !ok {
            let message = self
                .diagnostics
                .since(stored)
                .iter()
                .find(|diagnostic| diagnostic.severity == Severity::Error)
                .map(|diagnostic| diagnostic.message.clone())
                .unwrap_or_else(|| "invalid function body".to_string());
            self.replace_with_syntax_error(function, &message);
            return Ok(());
        }

        IrGen::new(
            &self.ast,
            &self.sem,
            &mut self.interner,
            self.keywords,
            &mut self.module,
        )
        .lower_lazy_function(function, node);
        debug!(function = self.function_name(function), "compiled lazy function");
        Ok(())
    }

    /// Lowers every lazy function, including ones uncovered by earlier
    /// lazy bodies. Returns how many were compiled.
    pub fn compile_all_lazy(&mut self) -> Result<usize> {
        let mut compiled = 0;
        let mut next = 0;
        while next < self.module.len() {
            let function = FunctionId::from_index(next);
            if self.module[function].is_lazy() {
                self.compile_lazy(function)?;
                compiled += 1;
            }
            next += 1;
        }
        Ok(compiled)
    }

    fn replace_with_syntax_error(&mut self, function: FunctionId, message: &str) {
        IrGen::new(
            &self.ast,
            &self.sem,
            &mut self.interner,
            self.keywords,
            &mut self.module,
        )
        .gen_syntax_error_function(function, message);
    }

    /// Finds the first function with the given name.
    pub fn find_function(&self, name: &str) -> Option<FunctionId> {
        let name = self.interner.get(name)?;
        self.module.find_function(name)
    }

    /// Returns the name of a function, empty if anonymous.
    pub fn function_name(&self, function: FunctionId) -> &str {
        self.interner.resolve(self.module[function].name)
    }

    /// Renders one function as text.
    pub fn function_to_string(&self, function: FunctionId) -> String {
        ir::pretty::function_to_string(&self.module, function, &self.interner)
    }

    /// Renders the whole module as text.
    pub fn module_to_string(&self) -> String {
        ir::pretty::module_to_string(&self.module, &self.interner)
    }

    /// Formats a diagnostic as `file:line:col: severity: message`.
    pub fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let (line, column) = self.sources.line_col(diagnostic.range);
        format!(
            "{}:{line}:{column}: {}: {}",
            self.sources.name(diagnostic.range.buffer),
            diagnostic.severity,
            diagnostic.message
        )
    }

    /// Formats an error, with its location when it has one.
    pub fn format_error(&self, error: &Error) -> String {
        match error.range() {
            Some(range) => {
                let (line, column) = self.sources.line_col(range);
                format!("{}:{line}:{column}: {error}", self.sources.name(range.buffer))
            }
            None => error.to_string(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    /// Returns the IR module.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Returns the AST arena.
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Returns the semantic records.
    pub fn sem(&self) -> &SemContext {
        &self.sem
    }

    /// Returns the interner.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Returns the source buffers.
    pub fn sources(&self) -> &SourceManager {
        &self.sources
    }

    /// Returns the diagnostics recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl Default for Frontend {
    fn default() -> Self {
        Self::new(FrontendConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_default() {
        let frontend = Frontend::default();
        assert!(frontend.module().is_empty());
        assert_eq!(frontend.diagnostics().error_count(), 0);
    }

    #[test]
    fn test_compile_sets_top_level() {
        let mut frontend = Frontend::default();
        let global = frontend.compile("t.js", "var x = 1;").unwrap();
        assert_eq!(frontend.module().top_level(), Some(global));
        assert!(frontend.module()[global].global_scope);
        assert_eq!(frontend.function_name(global), "global");
    }

    #[test]
    fn test_validation_error_is_counted() {
        let mut frontend = Frontend::default();
        let error = frontend.compile("t.js", "break;").unwrap_err();
        assert!(matches!(error, Error::Validation { errors: 1 }));
        let diagnostic = frontend.diagnostics().iter().next().unwrap();
        assert!(frontend.format_diagnostic(diagnostic).starts_with("t.js:1:1: error:"));
    }

    #[test]
    fn test_syntax_error_has_location() {
        let mut frontend = Frontend::default();
        let error = frontend.compile("t.js", "var = ;").unwrap_err();
        assert!(matches!(error, Error::Syntax { .. }));
        assert!(frontend.format_error(&error).starts_with("t.js:1:"));
    }

    #[test]
    fn test_compile_lazy_rejects_eager_function() {
        let mut frontend = Frontend::default();
        frontend.compile("t.js", "function f() {}").unwrap();
        let f = frontend.find_function("f").unwrap();
        assert!(matches!(frontend.compile_lazy(f), Err(Error::NotLazy(name)) if name == "f"));
    }
}
