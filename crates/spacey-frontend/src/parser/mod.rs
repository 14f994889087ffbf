//! Parser for JavaScript source code.
//!
//! Transforms a stream of tokens into nodes of an [`Ast`] arena.
//!
//! ## Structure
//!
//! - `mod.rs` - The `Parser` struct, entry points and token helpers
//! - `statements` - Statement parsing (if, for, while, etc.)
//! - `expressions` - Expression parsing (operators, literals, calls)
//!
//! ## Lazy bodies
//!
//! With a lazy threshold set, the body of every non-arrow function at
//! least that many bytes long is parsed for syntax errors and then
//! discarded. Only its directive prologue survives, in a `BlockStatement`
//! marked `lazy`, so strictness can still be derived from it. The full
//! body is recovered later with [`Parser::parse_lazy_function`].
//!
//! ## Usage
//!
//! ```rust
//! use spacey_frontend::ast::Ast;
//! use spacey_frontend::ident::Interner;
//! use spacey_frontend::parser::Parser;
//! use spacey_frontend::source::SourceManager;
//!
//! let mut sources = SourceManager::new();
//! let buffer = sources.add_buffer("demo.js", "var x = 1 + 2;");
//! let (mut ast, mut interner) = (Ast::new(), Interner::new());
//!
//! let mut parser = Parser::new(sources.text(buffer), buffer, &mut ast, &mut interner);
//! let program = parser.parse_program().expect("Should parse");
//! ```

mod expressions;
mod statements;

use crate::ast::{Ast, FunctionLikeKind, NodeId, NodeKind};
use crate::error::{Error, Result};
use crate::ident::{Atom, Interner};
use crate::lexer::{Scanner, Span, Token, TokenKind};
use crate::source::{BufferId, SourceRange};

/// A recursive descent parser for JavaScript.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    previous: Token,
    buffer: BufferId,
    ast: &'a mut Ast,
    interner: &'a mut Interner,
    lazy_threshold: Option<usize>,
}

/// A saved parser position, used to try the arrow function parameter
/// grammar before falling back to a parenthesized expression.
struct Checkpoint<'a> {
    scanner: Scanner<'a>,
    current: Token,
    previous: Token,
    nodes: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser for the whole of `source`.
    pub fn new(
        source: &'a str,
        buffer: BufferId,
        ast: &'a mut Ast,
        interner: &'a mut Interner,
    ) -> Self {
        Self::new_at(source, 0, buffer, ast, interner)
    }

    /// Creates a parser that starts at byte `offset` of `source`.
    pub fn new_at(
        source: &'a str,
        offset: usize,
        buffer: BufferId,
        ast: &'a mut Ast,
        interner: &'a mut Interner,
    ) -> Self {
        let mut scanner = Scanner::new_at(source, offset);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(offset, offset), false),
            buffer,
            ast,
            interner,
            lazy_threshold: None,
        }
    }

    /// Defers function bodies of at least `threshold` bytes.
    pub fn with_lazy_threshold(mut self, threshold: Option<usize>) -> Self {
        self.lazy_threshold = threshold;
        self
    }

    /// Parses the source code into a `Program` node.
    pub fn parse_program(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        let body = self.parse_statement_list(None)?;
        if !self.is_at_end() {
            return Err(self.unexpected());
        }
        let end = self.scanner.source().len();
        let range = SourceRange::new(self.buffer, start.min(end), end);
        Ok(self.ast.alloc(NodeKind::Program { body }, range))
    }

    /// Parses one function starting at the current position, never
    /// deferring its own body. Used to recover a lazily parsed function.
    pub fn parse_lazy_function(&mut self, kind: FunctionLikeKind) -> Result<NodeId> {
        match kind {
            FunctionLikeKind::FunctionDeclaration | FunctionLikeKind::FunctionExpression => {
                self.parse_function(kind, false)
            }
            FunctionLikeKind::Program | FunctionLikeKind::ArrowFunction => Err(Error::Syntax {
                message: "only ordinary functions can be compiled lazily".into(),
                range: self.current_range(),
            }),
        }
    }

    // Helper methods

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.scanner.next_token());
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!(
                "Expected {:?}, found {:?}",
                kind, self.current.kind
            )))
        }
    }

    /// Returns the kind of the token after the current one.
    fn peek_kind(&self) -> TokenKind {
        self.scanner.clone().next_token().kind
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn check_contextual(&self, word: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(name) if name == word)
    }

    /// Accepts an explicit `;` or an automatically inserted one.
    fn consume_semicolon(&mut self) -> Result<()> {
        if self.eat(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn expect_identifier(&mut self) -> Result<NodeId> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let atom = self.interner.intern(name);
            let start = self.current.span.start;
            self.advance();
            Ok(self.finish(NodeKind::Identifier(atom), start))
        } else {
            Err(self.error(format!(
                "Expected identifier, found {:?}",
                self.current.kind
            )))
        }
    }

    /// Allocates a node spanning from `start` to the end of the previous token.
    fn finish(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let end = self.previous.span.end.max(start);
        self.ast.alloc(kind, SourceRange::new(self.buffer, start, end))
    }

    fn intern(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    /// Returns the raw text between the quotes of a string token.
    fn raw_string_contents(&self, token: &Token) -> &'a str {
        let source = self.scanner.source();
        &source[token.span.start + 1..token.span.end.saturating_sub(1).max(token.span.start + 1)]
    }

    fn checkpoint(&self) -> Checkpoint<'a> {
        Checkpoint {
            scanner: self.scanner.clone(),
            current: self.current.clone(),
            previous: self.previous.clone(),
            nodes: self.ast.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint<'a>) {
        self.scanner = checkpoint.scanner;
        self.current = checkpoint.current;
        self.previous = checkpoint.previous;
        self.ast.truncate(checkpoint.nodes);
    }

    fn current_range(&self) -> SourceRange {
        SourceRange::new(self.buffer, self.current.span.start, self.current.span.end)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            message: message.into(),
            range: self.current_range(),
        }
    }

    fn unexpected(&self) -> Error {
        match &self.current.kind {
            TokenKind::Invalid(reason) => self.error(*reason),
            TokenKind::Eof => self.error("unexpected end of input"),
            kind => self.error(format!("unexpected token {kind:?}")),
        }
    }

    fn unsupported(&self, what: &str) -> Error {
        self.error(format!("unsupported syntax: {what}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceManager;

    pub(super) struct Parsed {
        pub ast: Ast,
        pub interner: Interner,
        pub root: NodeId,
    }

    impl Parsed {
        pub fn body(&self) -> &[NodeId] {
            match &self.ast[self.root].kind {
                NodeKind::Program { body } => body,
                _ => unreachable!(),
            }
        }

        pub fn first(&self) -> &NodeKind {
            &self.ast[self.body()[0]].kind
        }
    }

    pub(super) fn parse_with(src: &str, lazy: Option<usize>) -> Result<Parsed> {
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("test.js", src);
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let root = Parser::new(src, buffer, &mut ast, &mut interner)
            .with_lazy_threshold(lazy)
            .parse_program()?;
        Ok(Parsed {
            ast,
            interner,
            root,
        })
    }

    pub(super) fn parse_ok(src: &str) -> Parsed {
        parse_with(src, None).unwrap()
    }

    pub(super) fn parse_err(src: &str) -> String {
        match parse_with(src, None) {
            Err(Error::Syntax { message, .. }) => message,
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected a syntax error for {src:?}"),
        }
    }

    #[test]
    fn test_parse_empty_program() {
        let parsed = parse_ok("");
        assert!(parsed.body().is_empty());
    }

    #[test]
    fn test_automatic_semicolons() {
        let parsed = parse_ok("var a = 1\nvar b = 2\n{ a }");
        assert_eq!(parsed.body().len(), 3);
        assert!(parse_err("var a = 1 var b = 2").contains("unexpected token"));
    }

    #[test]
    fn test_lazy_body_keeps_directives() {
        let src = "function f(a, b) { 'use strict'; var x = a + b; return x * x + a * b; }";
        let parsed = parse_with(src, Some(8)).unwrap();
        let NodeKind::FunctionDeclaration(func) = parsed.first() else {
            panic!("expected a function declaration");
        };
        assert_eq!(func.params.len(), 2);
        let NodeKind::BlockStatement { body, lazy } = &parsed.ast[func.body].kind else {
            panic!("expected a block body");
        };
        assert!(lazy.is_some());
        assert_eq!(body.len(), 1);
        assert!(matches!(
            parsed.ast[body[0]].kind,
            NodeKind::ExpressionStatement { directive: Some(d), .. }
                if parsed.interner.resolve(d) == "use strict"
        ));
    }

    #[test]
    fn test_small_bodies_stay_eager() {
        let parsed = parse_with("function f() { return 1; }", Some(1000)).unwrap();
        let NodeKind::FunctionDeclaration(func) = parsed.first() else {
            panic!("expected a function declaration");
        };
        assert!(matches!(
            parsed.ast[func.body].kind,
            NodeKind::BlockStatement { lazy: None, .. }
        ));
    }

    #[test]
    fn test_lazy_bodies_still_report_syntax_errors() {
        assert!(parse_with("function f() { var = ; }", Some(0)).is_err());
    }

    #[test]
    fn test_parse_lazy_function_at_offset() {
        let src = "var a; function g(x) { return x; }";
        let mut sources = SourceManager::new();
        let buffer = sources.add_buffer("test.js", src);
        let mut ast = Ast::new();
        let mut interner = Interner::new();
        let node = Parser::new_at(src, 7, buffer, &mut ast, &mut interner)
            .with_lazy_threshold(Some(0))
            .parse_lazy_function(FunctionLikeKind::FunctionDeclaration)
            .unwrap();
        let NodeKind::FunctionDeclaration(func) = &ast[node].kind else {
            panic!("expected a function declaration");
        };
        assert!(matches!(
            ast[func.body].kind,
            NodeKind::BlockStatement { lazy: None, ref body } if body.len() == 1
        ));
        assert_eq!(ast[node].range.start, 7);
    }
}
