//! Expression parsing.
//!
//! Binary operators are parsed by precedence climbing; everything above
//! them (unary, postfix, call and member chains, primaries) is plain
//! recursive descent.

use super::Parser;
use crate::ast::{
    AssignmentOperator, BinaryOperator, FunctionLike, FunctionLikeKind, LogicalOperator, NodeId,
    NodeKind, UnaryOperator, UpdateOperator,
};
use crate::error::Result;
use crate::lexer::TokenKind;
use num_bigint::BigInt;
use num_traits::Num;

/// A binary or logical operator paired with its precedence.
#[derive(Clone, Copy)]
enum InfixOperator {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

/// Returns the operator for an infix token and its precedence (higher binds
/// tighter). `in` is withheld while parsing a for-loop head.
fn infix_operator(kind: &TokenKind, no_in: bool) -> Option<(u8, InfixOperator)> {
    use BinaryOperator as B;
    use InfixOperator::{Binary, Logical};

    let entry = match kind {
        TokenKind::QuestionQuestion => (1, Logical(LogicalOperator::NullishCoalescing)),
        TokenKind::PipePipe => (2, Logical(LogicalOperator::Or)),
        TokenKind::AmpersandAmpersand => (3, Logical(LogicalOperator::And)),
        TokenKind::Pipe => (4, Binary(B::BitwiseOr)),
        TokenKind::Caret => (5, Binary(B::BitwiseXor)),
        TokenKind::Ampersand => (6, Binary(B::BitwiseAnd)),
        TokenKind::EqualEqual => (7, Binary(B::Equal)),
        TokenKind::NotEqual => (7, Binary(B::NotEqual)),
        TokenKind::StrictEqual => (7, Binary(B::StrictEqual)),
        TokenKind::StrictNotEqual => (7, Binary(B::StrictNotEqual)),
        TokenKind::LessThan => (8, Binary(B::LessThan)),
        TokenKind::LessThanEqual => (8, Binary(B::LessThanEqual)),
        TokenKind::GreaterThan => (8, Binary(B::GreaterThan)),
        TokenKind::GreaterThanEqual => (8, Binary(B::GreaterThanEqual)),
        TokenKind::Instanceof => (8, Binary(B::InstanceOf)),
        TokenKind::In if !no_in => (8, Binary(B::In)),
        TokenKind::LeftShift => (9, Binary(B::LeftShift)),
        TokenKind::RightShift => (9, Binary(B::RightShift)),
        TokenKind::UnsignedRightShift => (9, Binary(B::UnsignedRightShift)),
        TokenKind::Plus => (10, Binary(B::Add)),
        TokenKind::Minus => (10, Binary(B::Subtract)),
        TokenKind::Star => (11, Binary(B::Multiply)),
        TokenKind::Slash => (11, Binary(B::Divide)),
        TokenKind::Percent => (11, Binary(B::Modulo)),
        TokenKind::StarStar => (12, Binary(B::Exponent)),
        _ => return None,
    };
    Some(entry)
}

fn assignment_operator(kind: &TokenKind) -> Option<AssignmentOperator> {
    use AssignmentOperator::*;
    let op = match kind {
        TokenKind::Equal => Assign,
        TokenKind::PlusEqual => AddAssign,
        TokenKind::MinusEqual => SubtractAssign,
        TokenKind::StarEqual => MultiplyAssign,
        TokenKind::SlashEqual => DivideAssign,
        TokenKind::PercentEqual => ModuloAssign,
        TokenKind::StarStarEqual => ExponentAssign,
        TokenKind::LeftShiftEqual => LeftShiftAssign,
        TokenKind::RightShiftEqual => RightShiftAssign,
        TokenKind::UnsignedRightShiftEqual => UnsignedRightShiftAssign,
        TokenKind::AmpersandEqual => BitwiseAndAssign,
        TokenKind::PipeEqual => BitwiseOrAssign,
        TokenKind::CaretEqual => BitwiseXorAssign,
        TokenKind::AmpersandAmpersandEqual => LogicalAndAssign,
        TokenKind::PipePipeEqual => LogicalOrAssign,
        TokenKind::QuestionQuestionEqual => NullishCoalescingAssign,
        _ => return None,
    };
    Some(op)
}

impl<'a> Parser<'a> {
    /// Parses a comma-separated expression.
    pub(super) fn parse_expression(&mut self, no_in: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        let first = self.parse_assignment(no_in)?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![first];
        while self.eat(&TokenKind::Comma) {
            expressions.push(self.parse_assignment(no_in)?);
        }
        Ok(self.finish(NodeKind::SequenceExpression { expressions }, start))
    }

    pub(super) fn parse_assignment(&mut self, no_in: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        let left = self.parse_conditional(no_in)?;

        if let Some(operator) = assignment_operator(&self.current.kind) {
            self.advance();
            let right = self.parse_assignment(no_in)?;
            return Ok(self.finish(
                NodeKind::AssignmentExpression {
                    operator,
                    left,
                    right,
                },
                start,
            ));
        }

        Ok(left)
    }

    /// Parse conditional (ternary) expression: test ? consequent : alternate
    fn parse_conditional(&mut self, no_in: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        let test = self.parse_binary(1, no_in)?;

        if self.eat(&TokenKind::Question) {
            let consequent = self.parse_assignment(false)?;
            self.expect(&TokenKind::Colon)?;
            let alternate = self.parse_assignment(no_in)?;

            return Ok(self.finish(
                NodeKind::ConditionalExpression {
                    test,
                    consequent,
                    alternate,
                },
                start,
            ));
        }

        Ok(test)
    }

    fn parse_binary(&mut self, min_precedence: u8, no_in: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        let mut left = self.parse_unary()?;

        while let Some((precedence, operator)) = infix_operator(&self.current.kind, no_in) {
            if precedence < min_precedence {
                break;
            }
            self.advance();

            // `**` is the only right-associative binary operator.
            let next = match operator {
                InfixOperator::Binary(BinaryOperator::Exponent) => precedence,
                _ => precedence + 1,
            };
            let right = self.parse_binary(next, no_in)?;

            let kind = match operator {
                InfixOperator::Binary(operator) => NodeKind::BinaryExpression {
                    operator,
                    left,
                    right,
                },
                InfixOperator::Logical(operator) => NodeKind::LogicalExpression {
                    operator,
                    left,
                    right,
                },
            };
            left = self.finish(kind, start);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;

        let operator = match self.current.kind {
            TokenKind::Delete => UnaryOperator::Delete,
            TokenKind::Void => UnaryOperator::Void,
            TokenKind::Typeof => UnaryOperator::Typeof,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Bang => UnaryOperator::LogicalNot,
            TokenKind::Tilde => UnaryOperator::BitwiseNot,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let operator = if self.check(&TokenKind::PlusPlus) {
                    UpdateOperator::Increment
                } else {
                    UpdateOperator::Decrement
                };
                self.advance();
                let argument = self.parse_unary()?;
                return Ok(self.finish(
                    NodeKind::UpdateExpression {
                        operator,
                        argument,
                        prefix: true,
                    },
                    start,
                ));
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let argument = self.parse_unary()?;
        Ok(self.finish(NodeKind::UnaryExpression { operator, argument }, start))
    }

    fn parse_postfix(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        let argument = self.parse_call_member(true)?;

        let operator = match self.current.kind {
            TokenKind::PlusPlus if !self.current.newline_before => UpdateOperator::Increment,
            TokenKind::MinusMinus if !self.current.newline_before => UpdateOperator::Decrement,
            _ => return Ok(argument),
        };
        self.advance();
        Ok(self.finish(
            NodeKind::UpdateExpression {
                operator,
                argument,
                prefix: false,
            },
            start,
        ))
    }

    /// Parses a primary expression followed by member accesses and, when
    /// `allow_call` is set, call suffixes.
    fn parse_call_member(&mut self, allow_call: bool) -> Result<NodeId> {
        let start = self.current.span.start;
        let mut expr = if self.check(&TokenKind::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary()?
        };

        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let property = self.parse_property_identifier()?;
                    expr = self.finish(
                        NodeKind::MemberExpression {
                            object: expr,
                            property,
                            computed: false,
                        },
                        start,
                    );
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let property = self.parse_expression(false)?;
                    self.expect(&TokenKind::RightBracket)?;
                    expr = self.finish(
                        NodeKind::MemberExpression {
                            object: expr,
                            property,
                            computed: true,
                        },
                        start,
                    );
                }
                TokenKind::LeftParen if allow_call => {
                    let arguments = self.parse_arguments()?;
                    expr = self.finish(
                        NodeKind::CallExpression {
                            callee: expr,
                            arguments,
                        },
                        start,
                    );
                }
                TokenKind::QuestionDot => return Err(self.unsupported("optional chaining")),
                TokenKind::Template => return Err(self.unsupported("tagged templates")),
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_new_expression(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume 'new'

        if self.eat(&TokenKind::Dot) {
            if !self.check_contextual("target") {
                return Err(self.error("Expected 'target' after 'new.'"));
            }
            self.advance();
            return Ok(self.finish(NodeKind::NewTargetExpression, start));
        }

        let callee = self.parse_call_member(false)?;
        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(self.finish(NodeKind::NewExpression { callee, arguments }, start))
    }

    fn parse_arguments(&mut self) -> Result<Vec<NodeId>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut arguments = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            if self.check(&TokenKind::Ellipsis) {
                return Err(self.unsupported("spread arguments"));
            }
            arguments.push(self.parse_assignment(false)?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(arguments)
    }

    /// Parses a name after `.`, where reserved words are allowed.
    fn parse_property_identifier(&mut self) -> Result<NodeId> {
        if let Some(text) = self.current.kind.keyword_text() {
            let start = self.current.span.start;
            let atom = self.intern(text);
            self.advance();
            return Ok(self.finish(NodeKind::Identifier(atom), start));
        }
        self.expect_identifier()
    }

    fn parse_primary(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;

        let kind = match &self.current.kind {
            TokenKind::Number(value) => NodeKind::NumericLiteral(*value),
            TokenKind::String(value) => NodeKind::StringLiteral(self.interner.intern(value)),
            TokenKind::BigInt(digits) => {
                let (radix, digits) = match digits.get(..2) {
                    Some("0x") => (16, &digits[2..]),
                    Some("0o") => (8, &digits[2..]),
                    Some("0b") => (2, &digits[2..]),
                    _ => (10, digits.as_str()),
                };
                match BigInt::from_str_radix(digits, radix) {
                    Ok(value) => NodeKind::BigIntLiteral(value),
                    Err(_) => return Err(self.error("invalid BigInt literal")),
                }
            }
            TokenKind::True => NodeKind::BooleanLiteral(true),
            TokenKind::False => NodeKind::BooleanLiteral(false),
            TokenKind::Null => NodeKind::NullLiteral,
            TokenKind::This => NodeKind::ThisExpression,
            TokenKind::Identifier(_) if self.peek_kind() == TokenKind::Arrow => {
                let param = self.expect_identifier()?;
                return self.parse_arrow_function(start, vec![param]);
            }
            TokenKind::Identifier(_) => return self.expect_identifier(),
            TokenKind::Function => {
                return self.parse_function(FunctionLikeKind::FunctionExpression, true);
            }
            TokenKind::LeftParen => return self.parse_parenthesized_or_arrow(),
            TokenKind::LeftBracket => return self.parse_array_literal(),
            TokenKind::LeftBrace => return self.parse_object_literal(),
            TokenKind::Slash | TokenKind::SlashEqual => return self.parse_regexp_literal(),
            TokenKind::Template => return Err(self.unsupported("template literals")),
            TokenKind::Class => return Err(self.unsupported("classes")),
            TokenKind::Super => return Err(self.unsupported("super")),
            _ => return Err(self.unexpected()),
        };

        self.advance();
        Ok(self.finish(kind, start))
    }

    fn parse_regexp_literal(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        let slash = self.current.clone();
        self.current = self.scanner.rescan_regexp(&slash);

        let TokenKind::RegExp { pattern, flags } = &self.current.kind else {
            return Err(self.unexpected());
        };
        let pattern = self.interner.intern(pattern);
        let flags = self.interner.intern(flags);
        self.advance();

        Ok(self.finish(NodeKind::RegExpLiteral { pattern, flags }, start))
    }

    /// Tries the arrow parameter list first and falls back to a
    /// parenthesized expression.
    fn parse_parenthesized_or_arrow(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        let checkpoint = self.checkpoint();

        if let Some(params) = self.try_arrow_parameters() {
            return self.parse_arrow_function(start, params);
        }
        self.restore(checkpoint);

        self.expect(&TokenKind::LeftParen)?;
        if self.check(&TokenKind::RightParen) {
            return Err(self.unexpected());
        }
        let expr = self.parse_expression(false)?;
        self.expect(&TokenKind::RightParen)?;
        Ok(expr)
    }

    /// Matches `( ident, ... ) =>` without reporting errors.
    fn try_arrow_parameters(&mut self) -> Option<Vec<NodeId>> {
        self.advance(); // consume '('
        let mut params = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            if !matches!(self.current.kind, TokenKind::Identifier(_)) {
                return None;
            }
            params.push(self.expect_identifier().ok()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        if !self.eat(&TokenKind::RightParen) {
            return None;
        }
        (self.check(&TokenKind::Arrow) && !self.current.newline_before).then_some(params)
    }

    fn parse_arrow_function(&mut self, start: usize, params: Vec<NodeId>) -> Result<NodeId> {
        self.expect(&TokenKind::Arrow)?;
        let body = if self.check(&TokenKind::LeftBrace) {
            self.parse_function_body(false)?
        } else {
            self.parse_assignment(false)?
        };

        Ok(self.finish(
            NodeKind::ArrowFunctionExpression(FunctionLike {
                id: None,
                params,
                body,
            }),
            start,
        ))
    }

    fn parse_array_literal(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume '['
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RightBracket) {
            if self.eat(&TokenKind::Comma) {
                elements.push(None);
                continue;
            }
            if self.check(&TokenKind::Ellipsis) {
                return Err(self.unsupported("spread elements"));
            }
            elements.push(Some(self.parse_assignment(false)?));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBracket)?;
        Ok(self.finish(NodeKind::ArrayExpression { elements }, start))
    }

    fn parse_object_literal(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;
        self.advance(); // consume '{'
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            properties.push(self.parse_property()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(self.finish(NodeKind::ObjectExpression { properties }, start))
    }

    fn parse_property(&mut self) -> Result<NodeId> {
        let start = self.current.span.start;

        if (self.check_contextual("get") || self.check_contextual("set"))
            && !matches!(
                self.peek_kind(),
                TokenKind::Colon | TokenKind::Comma | TokenKind::RightBrace | TokenKind::LeftParen
            )
        {
            return Err(self.unsupported("accessor properties"));
        }

        let mut shorthand = false;
        let (key, computed) = match &self.current.kind {
            TokenKind::Identifier(_) => {
                shorthand = true;
                (self.expect_identifier()?, false)
            }
            TokenKind::String(value) => {
                let atom = self.interner.intern(value);
                self.advance();
                (self.finish(NodeKind::StringLiteral(atom), start), false)
            }
            TokenKind::Number(value) => {
                let value = *value;
                self.advance();
                (self.finish(NodeKind::NumericLiteral(value), start), false)
            }
            TokenKind::LeftBracket => {
                self.advance();
                let key = self.parse_assignment(false)?;
                self.expect(&TokenKind::RightBracket)?;
                (key, true)
            }
            TokenKind::Ellipsis => return Err(self.unsupported("spread properties")),
            kind if kind.keyword_text().is_some() => (self.parse_property_identifier()?, false),
            _ => return Err(self.unexpected()),
        };

        let value = if self.eat(&TokenKind::Colon) {
            self.parse_assignment(false)?
        } else if self.check(&TokenKind::LeftParen) {
            return Err(self.unsupported("object methods"));
        } else if shorthand {
            let name = self.ast[key].kind.clone();
            let range = self.ast[key].range;
            self.ast.alloc(name, range)
        } else {
            return Err(self.unexpected());
        };

        Ok(self.finish(
            NodeKind::Property {
                key,
                value,
                computed,
            },
            start,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_ok};
    use crate::ast::{BinaryOperator, LogicalOperator, NodeKind};

    fn first_expression(src: &str) -> (super::super::tests::Parsed, crate::ast::NodeId) {
        let parsed = parse_ok(src);
        let NodeKind::ExpressionStatement { expression, .. } = *parsed.first() else {
            panic!("expected an expression statement");
        };
        (parsed, expression)
    }

    #[test]
    fn test_precedence() {
        let (parsed, expr) = first_expression("1 + 2 * 3;");
        let NodeKind::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } = parsed.ast[expr].kind
        else {
            panic!("expected addition at the root");
        };
        assert!(matches!(
            parsed.ast[right].kind,
            NodeKind::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let (parsed, expr) = first_expression("2 ** 3 ** 2;");
        let NodeKind::BinaryExpression { left, .. } = parsed.ast[expr].kind else {
            panic!("expected a binary expression");
        };
        assert!(matches!(parsed.ast[left].kind, NodeKind::NumericLiteral(n) if n == 2.0));
    }

    #[test]
    fn test_logical_operators() {
        let (parsed, expr) = first_expression("a || b && c;");
        assert!(matches!(
            parsed.ast[expr].kind,
            NodeKind::LogicalExpression {
                operator: LogicalOperator::Or,
                ..
            }
        ));
    }

    #[test]
    fn test_arrow_functions() {
        let (parsed, expr) = first_expression("(a, b) => a + b;");
        assert!(matches!(
            &parsed.ast[expr].kind,
            NodeKind::ArrowFunctionExpression(func) if func.params.len() == 2
        ));
        let (parsed, expr) = first_expression("x => { return x; };");
        assert!(matches!(
            &parsed.ast[expr].kind,
            NodeKind::ArrowFunctionExpression(func) if func.params.len() == 1
        ));
        let (parsed, expr) = first_expression("(a + b) * c;");
        assert!(matches!(
            parsed.ast[expr].kind,
            NodeKind::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_regexp_vs_division() {
        let (parsed, expr) = first_expression("a / b / c;");
        assert!(matches!(parsed.ast[expr].kind, NodeKind::BinaryExpression { .. }));
        let (parsed, expr) = first_expression("x = /ab+c/gi;");
        let NodeKind::AssignmentExpression { right, .. } = parsed.ast[expr].kind else {
            panic!("expected an assignment");
        };
        let NodeKind::RegExpLiteral { pattern, flags } = parsed.ast[right].kind else {
            panic!("expected a regexp literal");
        };
        assert_eq!(parsed.interner.resolve(pattern), "ab+c");
        assert_eq!(parsed.interner.resolve(flags), "gi");
    }

    #[test]
    fn test_member_call_and_new() {
        let (parsed, expr) = first_expression("new Foo(1).bar(2)[3];");
        assert!(matches!(
            parsed.ast[expr].kind,
            NodeKind::MemberExpression { computed: true, .. }
        ));
        let parsed = parse_ok("function f() { return new.target; }");
        assert_eq!(parsed.body().len(), 1);
        let (parsed, expr) = first_expression("a.default;");
        assert!(matches!(parsed.ast[expr].kind, NodeKind::MemberExpression { .. }));
    }

    #[test]
    fn test_object_and_array_literals() {
        let (parsed, expr) = first_expression("({ a: 1, 'b': 2, 3: c, [d]: 4, e, if: 5 });");
        assert!(matches!(
            &parsed.ast[expr].kind,
            NodeKind::ObjectExpression { properties } if properties.len() == 6
        ));
        let (parsed, expr) = first_expression("[1, , 2];");
        assert!(matches!(
            &parsed.ast[expr].kind,
            NodeKind::ArrayExpression { elements } if elements.len() == 3 && elements[1].is_none()
        ));
    }

    #[test]
    fn test_bigint_literal() {
        let (parsed, expr) = first_expression("0xffn;");
        assert!(matches!(
            &parsed.ast[expr].kind,
            NodeKind::BigIntLiteral(value) if value.to_string() == "255"
        ));
    }

    #[test]
    fn test_invalid_targets_still_parse() {
        // The validator, not the parser, rejects these.
        parse_ok("1 = 2;");
        parse_ok("f() = 2;");
        parse_ok("this++;");
    }

    #[test]
    fn test_unsupported_expressions() {
        assert!(parse_err("`x`;").contains("template"));
        assert!(parse_err("a?.b;").contains("optional chaining"));
        assert!(parse_err("f(...xs);").contains("spread"));
        assert!(parse_err("({ get x() {} });").contains("accessor"));
    }
}
