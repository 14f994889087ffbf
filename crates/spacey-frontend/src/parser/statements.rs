//! Statement parsing.

use super::Parser;
use crate::ast::{FunctionLike, FunctionLikeKind, NodeId, NodeKind, VariableKind};
use crate::error::Result;
use crate::ident::Atom;
use crate::lexer::TokenKind;
use crate::source::SourceRange;

/// A directive found in a prologue, kept so a discarded lazy body can be
/// rebuilt with it.
struct Directive {
    value: Atom,
    raw: Atom,
    literal: SourceRange,
    statement: SourceRange,
}

impl<'a> Parser<'a> {
    /// Parses statements until `end` (or the end of input when `None`),
    /// tagging the leading directive prologue.
    pub(super) fn parse_statement_list(&mut self, end: Option<&TokenKind>) -> Result<Vec<NodeId>> {
        let mut directives = Vec::new();
        self.parse_statement_list_collecting(end, &mut directives)
    }

    fn parse_statement_list_collecting(
        &mut self,
        end: Option<&TokenKind>,
        directives: &mut Vec<Directive>,
    ) -> Result<Vec<NodeId>> {
        let mut body = Vec::new();
        let mut in_prologue = true;

        while !self.is_at_end() && !end.is_some_and(|end| self.check(end)) {
            if in_prologue {
                let token = self.current.clone();
                if let TokenKind::String(value) = &token.kind {
                    let value = self.interner.intern(value);
                    let raw_text = self.raw_string_contents(&token);
                    let raw = self.interner.intern(raw_text);
                    let statement = self.parse_expression_statement(Some(raw))?;

                    match self.ast[statement].kind {
                        NodeKind::ExpressionStatement {
                            directive: Some(_),
                            expression,
                        } => directives.push(Directive {
                            value,
                            raw,
                            literal: self.ast[expression].range,
                            statement: self.ast[statement].range,
                        }),
                        _ => in_prologue = false,
                    }
                    body.push(statement);
                    continue;
                }
                in_prologue = false;
            }
            body.push(self.parse_statement()?);
        }

        Ok(body)
    }

    /// Parses a single statement.
    pub(super) fn parse_statement(&mut self) -> Result<NodeId> {
        match &self.current.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration(false)?;
                self.consume_semicolon()?;
                Ok(declaration)
            }
            TokenKind::Function => self.parse_function(FunctionLikeKind::FunctionDeclaration, true),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => self.parse_jump_statement(true),
            TokenKind::Continue => self.parse_jump_statement(false),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::With => Err(self.unsupported("with statements")),
            TokenKind::Class => Err(self.unsupported("classes")),
            TokenKind::Import | TokenKind::Export => Err(self.unsupported("modules")),
            TokenKind::Debugger => {
                let start = self.current.span.start;
                self.advance();
                self.consume_semicolon()?;
                Ok(self.finish(NodeKind::DebuggerStatement, start))
            }
            TokenKind::LeftBrace => self.parse_block_statement(),
            TokenKind::Semicolon => {
                let start = self.current.span.start;
                self.advance();
                Ok(self.finish(NodeKind::EmptyStatement, start))
            }
            TokenKind::Identifier(_) if self.peek_kind() == TokenKind::Colon => {
                self.parse_labeled_statement()
            }
            _ => self.parse_expression_statement(None),
        }
    }

    /// Parses `function name(params) { body }` in either statement or
    /// expression position.
    pub(super) fn parse_function(&mut self, kind: FunctionLikeKind, allow_lazy: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        self.expect(&TokenKind::Function)?;
        if self.check(&TokenKind::Star) {
            return Err(self.unsupported("generator functions"));
        }

        let id = if matches!(self.current.kind, TokenKind::Identifier(_)) {
            Some(self.expect_identifier()?)
        } else if kind == FunctionLikeKind::FunctionDeclaration {
            return Err(self.error(format!(
                "Expected function name, found {:?}",
                self.current.kind
            )));
        } else {
            None
        };

        let params = self.parse_formal_parameters()?;
        let body = self.parse_function_body(allow_lazy)?;
        let func = FunctionLike { id, params, body };

        let kind = match kind {
            FunctionLikeKind::FunctionDeclaration => NodeKind::FunctionDeclaration(func),
            _ => NodeKind::FunctionExpression(func),
        };
        Ok(self.finish(kind, start))
    }

    pub(super) fn parse_formal_parameters(&mut self) -> Result<Vec<NodeId>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut params = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            match self.current.kind {
                TokenKind::Ellipsis => return Err(self.unsupported("rest parameters")),
                TokenKind::LeftBrace | TokenKind::LeftBracket => {
                    return Err(self.unsupported("destructuring patterns"));
                }
                _ => {}
            }
            params.push(self.expect_identifier()?);
            if self.check(&TokenKind::Equal) {
                return Err(self.unsupported("default parameters"));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(params)
    }

    /// Parses `{ body }` of a function. When the body is large enough and
    /// laziness is enabled, the parsed statements are discarded and only
    /// the directive prologue is kept.
    pub(super) fn parse_function_body(&mut self, allow_lazy: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LeftBrace)?;

        let mark = self.ast.len();
        let mut directives = Vec::new();
        let body = self.parse_statement_list_collecting(Some(&TokenKind::RightBrace), &mut directives)?;
        self.expect(&TokenKind::RightBrace)?;

        let size = self.previous.span.end - start;
        let deferred = allow_lazy && self.lazy_threshold.is_some_and(|threshold| size >= threshold);
        if !deferred {
            return Ok(self.finish(NodeKind::BlockStatement { body, lazy: None }, start));
        }

        self.ast.truncate(mark);
        let prologue = directives
            .into_iter()
            .map(|directive| {
                let expression = self
                    .ast
                    .alloc(NodeKind::StringLiteral(directive.value), directive.literal);
                self.ast.alloc(
                    NodeKind::ExpressionStatement {
                        expression,
                        directive: Some(directive.raw),
                    },
                    directive.statement,
                )
            })
            .collect();

        Ok(self.finish(
            NodeKind::BlockStatement {
                body: prologue,
                lazy: Some(self.buffer),
            },
            start,
        ))
    }

    /// Parses `var a = 1, b` without the trailing semicolon.
    pub(super) fn parse_variable_declaration(&mut self, no_in: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        let kind = match self.current.kind {
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => VariableKind::Var,
        };
        self.advance();

        let mut declarations = Vec::new();
        loop {
            let decl_start = self.current.span.start;
            if matches!(self.current.kind, TokenKind::LeftBrace | TokenKind::LeftBracket) {
                return Err(self.unsupported("destructuring patterns"));
            }
            let id = self.expect_identifier()?;
            let init = if self.eat(&TokenKind::Equal) {
                Some(self.parse_assignment(no_in)?)
            } else {
                None
            };
            declarations.push(self.finish(NodeKind::VariableDeclarator { id, init }, decl_start));

            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        Ok(self.finish(NodeKind::VariableDeclaration { kind, declarations }, start))
    }

    fn parse_if_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression(false)?;
        self.expect(&TokenKind::RightParen)?;

        let consequent = self.parse_statement()?;
        let alternate = if self.eat(&TokenKind::Else) {
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(self.finish(
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            },
            start,
        ))
    }

    fn parse_switch_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'switch'
        self.expect(&TokenKind::LeftParen)?;
        let discriminant = self.parse_expression(false)?;
        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::LeftBrace)?;

        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.check(&TokenKind::RightBrace) {
            let case_start = self.current.span.start;
            let test = if self.eat(&TokenKind::Case) {
                Some(self.parse_expression(false)?)
            } else if self.check(&TokenKind::Default) {
                if seen_default {
                    return Err(self.error("more than one default clause in switch statement"));
                }
                seen_default = true;
                self.advance();
                None
            } else {
                return Err(self.unexpected());
            };
            self.expect(&TokenKind::Colon)?;

            let mut consequent = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RightBrace | TokenKind::Eof
            ) {
                consequent.push(self.parse_statement()?);
            }
            cases.push(self.finish(NodeKind::SwitchCase { test, consequent }, case_start));
        }
        self.expect(&TokenKind::RightBrace)?;

        Ok(self.finish(
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            },
            start,
        ))
    }

    fn parse_while_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression(false)?;
        self.expect(&TokenKind::RightParen)?;
        let body = self.parse_statement()?;
        Ok(self.finish(NodeKind::WhileStatement { test, body }, start))
    }

    fn parse_do_while_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'do'
        let body = self.parse_statement()?;
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression(false)?;
        self.expect(&TokenKind::RightParen)?;
        // A semicolon after do-while is always optional.
        self.eat(&TokenKind::Semicolon);
        Ok(self.finish(NodeKind::DoWhileStatement { body, test }, start))
    }

    fn parse_for_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'for'
        if self.check_contextual("await") {
            return Err(self.unsupported("for-await loops"));
        }
        self.expect(&TokenKind::LeftParen)?;

        let init = match self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                Some(self.parse_variable_declaration(true)?)
            }
            _ => Some(self.parse_expression(true)?),
        };

        if self.check_contextual("of") {
            return Err(self.unsupported("for-of loops"));
        }

        if let Some(left) = init
            && self.eat(&TokenKind::In)
        {
            if let NodeKind::VariableDeclaration { declarations, .. } = &self.ast[left].kind
                && declarations.len() != 1
            {
                return Err(self.error("for-in loop may declare only one variable"));
            }
            let right = self.parse_expression(false)?;
            self.expect(&TokenKind::RightParen)?;
            let body = self.parse_statement()?;
            return Ok(self.finish(NodeKind::ForInStatement { left, right, body }, start));
        }

        self.expect(&TokenKind::Semicolon)?;
        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect(&TokenKind::RightParen)?;
        let body = self.parse_statement()?;

        Ok(self.finish(
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            },
            start,
        ))
    }

    fn parse_return_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'return'

        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
            || self.current.newline_before
        {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.consume_semicolon()?;

        Ok(self.finish(NodeKind::ReturnStatement { argument }, start))
    }

    /// Parses `break` (when `is_break`) or `continue` with an optional label.
    fn parse_jump_statement(&mut self, is_break: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance();

        let label = if matches!(self.current.kind, TokenKind::Identifier(_))
            && !self.current.newline_before
        {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        self.consume_semicolon()?;

        let kind = if is_break {
            NodeKind::BreakStatement { label }
        } else {
            NodeKind::ContinueStatement { label }
        };
        Ok(self.finish(kind, start))
    }

    fn parse_throw_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'throw'
        if self.current.newline_before {
            return Err(self.error("no line break is allowed after 'throw'"));
        }
        let argument = self.parse_expression(false)?;
        self.consume_semicolon()?;
        Ok(self.finish(NodeKind::ThrowStatement { argument }, start))
    }

    fn parse_try_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'try'
        let block = self.parse_block_statement()?;

        let handler = if self.check(&TokenKind::Catch) {
            let catch_start = self.current.span.start;
            self.advance();
            if !self.check(&TokenKind::LeftParen) {
                return Err(self.unsupported("catch clauses without a binding"));
            }
            self.advance();
            if matches!(self.current.kind, TokenKind::LeftBrace | TokenKind::LeftBracket) {
                return Err(self.unsupported("destructuring patterns"));
            }
            let param = self.expect_identifier()?;
            self.expect(&TokenKind::RightParen)?;
            let body = self.parse_block_statement()?;
            Some(self.finish(NodeKind::CatchClause { param, body }, catch_start))
        } else {
            None
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("missing catch or finally after try"));
        }

        Ok(self.finish(
            NodeKind::TryStatement {
                block,
                handler,
                finalizer,
            },
            start,
        ))
    }

    fn parse_labeled_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        let label = self.expect_identifier()?;
        self.expect(&TokenKind::Colon)?;
        let body = self.parse_statement()?;
        Ok(self.finish(NodeKind::LabeledStatement { label, body }, start))
    }

    fn parse_block_statement(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(self.finish(NodeKind::BlockStatement { body, lazy: None }, start))
    }

    /// Parses an expression statement. `directive` is the raw text of the
    /// string token starting the statement, if it is in a prologue.
    fn parse_expression_statement(&mut self, directive: Option<Atom>) -> Result<NodeId> {
        let start = self.current.span.start;
        let literal_end = self.current.span.end;
        let expression = self.parse_expression(false)?;
        self.consume_semicolon()?;

        let is_bare_string = matches!(self.ast[expression].kind, NodeKind::StringLiteral(_))
            && self.ast[expression].range.end as usize == literal_end;
        let directive = directive.filter(|_| is_bare_string);

        Ok(self.finish(
            NodeKind::ExpressionStatement {
                expression,
                directive,
            },
            start,
        ))
    }
}
