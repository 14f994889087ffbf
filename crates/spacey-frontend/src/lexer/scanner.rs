//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};

/// A scanner that tokenizes JavaScript source code.
///
/// Offsets in produced spans are always relative to the start of the full
/// source text, even when scanning starts in the middle of it.
#[derive(Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    base: usize,
    current_pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self::new_at(source, 0)
    }

    /// Creates a scanner that starts at byte `offset` of `source`.
    pub fn new_at(source: &'a str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        Self {
            source,
            chars: source[offset..].char_indices().peekable(),
            base: offset,
            current_pos: offset,
        }
    }

    /// Returns the source text being scanned.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = self.skip_whitespace_and_comments();

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), newline_before);
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,

            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.scan_number('.'),
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '+' => self.select(&[('+', TokenKind::PlusPlus), ('=', TokenKind::PlusEqual)], TokenKind::Plus),
            '-' => self.select(&[('-', TokenKind::MinusMinus), ('=', TokenKind::MinusEqual)], TokenKind::Minus),
            '%' => self.select(&[('=', TokenKind::PercentEqual)], TokenKind::Percent),
            '^' => self.select(&[('=', TokenKind::CaretEqual)], TokenKind::Caret),
            '/' => self.select(&[('=', TokenKind::SlashEqual)], TokenKind::Slash),
            '*' => {
                if self.eat('*') {
                    self.select(&[('=', TokenKind::StarStarEqual)], TokenKind::StarStar)
                } else {
                    self.select(&[('=', TokenKind::StarEqual)], TokenKind::Star)
                }
            }
            '<' => {
                if self.eat('<') {
                    self.select(&[('=', TokenKind::LeftShiftEqual)], TokenKind::LeftShift)
                } else {
                    self.select(&[('=', TokenKind::LessThanEqual)], TokenKind::LessThan)
                }
            }
            '>' => self.scan_greater_than(),
            '=' => {
                if self.eat('=') {
                    self.select(&[('=', TokenKind::StrictEqual)], TokenKind::EqualEqual)
                } else {
                    self.select(&[('>', TokenKind::Arrow)], TokenKind::Equal)
                }
            }
            '!' => {
                if self.eat('=') {
                    self.select(&[('=', TokenKind::StrictNotEqual)], TokenKind::NotEqual)
                } else {
                    TokenKind::Bang
                }
            }
            '&' => {
                if self.eat('&') {
                    self.select(&[('=', TokenKind::AmpersandAmpersandEqual)], TokenKind::AmpersandAmpersand)
                } else {
                    self.select(&[('=', TokenKind::AmpersandEqual)], TokenKind::Ampersand)
                }
            }
            '|' => {
                if self.eat('|') {
                    self.select(&[('=', TokenKind::PipePipeEqual)], TokenKind::PipePipe)
                } else {
                    self.select(&[('=', TokenKind::PipeEqual)], TokenKind::Pipe)
                }
            }
            '?' => {
                if self.eat('?') {
                    self.select(&[('=', TokenKind::QuestionQuestionEqual)], TokenKind::QuestionQuestion)
                } else if self.peek() == Some('.') && !self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                    TokenKind::QuestionDot
                } else {
                    TokenKind::Question
                }
            }

            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(),
            '0'..='9' => self.scan_number(ch),
            _ if is_id_start(ch) => self.scan_identifier(ch),

            _ => TokenKind::Invalid("unexpected character"),
        };

        Token::new(kind, Span::new(start, self.current_pos), newline_before)
    }

    /// Rescans a `/` or `/=` token as a regular expression literal.
    ///
    /// The parser calls this when a slash appears where an expression is
    /// expected.
    pub fn rescan_regexp(&mut self, slash: &Token) -> Token {
        self.reset_to(slash.span.start + 1);

        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.advance() {
                None | Some((_, '\n' | '\r' | '\u{2028}' | '\u{2029}')) => {
                    return Token::new(
                        TokenKind::Invalid("unterminated regular expression literal"),
                        Span::new(slash.span.start, self.current_pos),
                        slash.newline_before,
                    );
                }
                Some((_, '\\')) => {
                    pattern.push('\\');
                    match self.advance() {
                        Some((_, escaped)) if !is_line_terminator(escaped) => pattern.push(escaped),
                        _ => {
                            return Token::new(
                                TokenKind::Invalid("unterminated regular expression literal"),
                                Span::new(slash.span.start, self.current_pos),
                                slash.newline_before,
                            );
                        }
                    }
                }
                Some((_, '/')) if !in_class => break,
                Some((_, ch)) => {
                    match ch {
                        '[' => in_class = true,
                        ']' => in_class = false,
                        _ => {}
                    }
                    pattern.push(ch);
                }
            }
        }

        let mut flags = String::new();
        while let Some(ch) = self.peek() {
            if !is_id_continue(ch) {
                break;
            }
            flags.push(ch);
            self.advance();
        }

        Token::new(
            TokenKind::RegExp { pattern, flags },
            Span::new(slash.span.start, self.current_pos),
            slash.newline_before,
        )
    }

    fn reset_to(&mut self, offset: usize) {
        self.chars = self.source[offset..].char_indices().peekable();
        self.base = offset;
        self.current_pos = offset;
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let (pos, ch) = self.chars.next()?;
        let pos = pos + self.base;
        self.current_pos = pos + ch.len_utf8();
        Some((pos, ch))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the first matching follow character and returns its token,
    /// or returns `otherwise`.
    fn select(&mut self, options: &[(char, TokenKind)], otherwise: TokenKind) -> TokenKind {
        for (ch, kind) in options {
            if self.eat(*ch) {
                return kind.clone();
            }
        }
        otherwise
    }

    /// Skips trivia, returning true if a line terminator was crossed.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut newline = false;
        loop {
            match self.peek() {
                Some(ch) if is_line_terminator(ch) => {
                    newline = true;
                    self.advance();
                }
                Some(' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}') => {
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        while let Some(ch) = self.peek() {
                            if is_line_terminator(ch) {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        while let Some((_, ch)) = self.advance() {
                            if prev == '*' && ch == '/' {
                                break;
                            }
                            if is_line_terminator(ch) {
                                newline = true;
                            }
                            prev = ch;
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        newline
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if !self.eat('>') {
            return self.select(&[('=', TokenKind::GreaterThanEqual)], TokenKind::GreaterThan);
        }
        if self.eat('>') {
            self.select(
                &[('=', TokenKind::UnsignedRightShiftEqual)],
                TokenKind::UnsignedRightShift,
            )
        } else {
            self.select(&[('=', TokenKind::RightShiftEqual)], TokenKind::RightShift)
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return TokenKind::Invalid("unterminated string literal"),
                Some((_, ch)) if ch == quote => break,
                Some((_, ch)) if ch == '\n' || ch == '\r' => {
                    return TokenKind::Invalid("unterminated string literal");
                }
                Some((_, '\\')) => {
                    let Some((_, escaped)) = self.advance() else {
                        return TokenKind::Invalid("unterminated string literal");
                    };
                    match escaped {
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'b' => value.push('\u{0008}'),
                        'f' => value.push('\u{000C}'),
                        'v' => value.push('\u{000B}'),
                        '0' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => value.push('\0'),
                        'x' => match self.scan_hex_digits(2) {
                            Some(ch) => value.push(ch),
                            None => return TokenKind::Invalid("invalid hexadecimal escape"),
                        },
                        'u' => match self.scan_unicode_escape() {
                            Some(ch) => value.push(ch),
                            None => return TokenKind::Invalid("invalid unicode escape"),
                        },
                        '\r' => {
                            self.eat('\n');
                        }
                        ch if is_line_terminator(ch) => {}
                        _ => value.push(escaped),
                    }
                }
                Some((_, ch)) => value.push(ch),
            }
        }

        TokenKind::String(value)
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self.peek()?.to_digit(16)?;
            self.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code)
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        if !self.eat('{') {
            return self.scan_hex_digits(4);
        }
        let mut code = 0u32;
        let mut digits = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
            self.advance();
            code = code.checked_mul(16)?.checked_add(digit)?;
            digits += 1;
        }
        if digits == 0 || !self.eat('}') {
            return None;
        }
        char::from_u32(code)
    }

    fn scan_template(&mut self) -> TokenKind {
        while let Some((_, ch)) = self.advance() {
            match ch {
                '`' => return TokenKind::Template,
                '\\' => {
                    self.advance();
                }
                _ => {}
            }
        }
        TokenKind::Invalid("unterminated template literal")
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                return self.scan_radix_number(radix);
            }
        }

        let mut value = String::from(first);
        self.scan_digits(&mut value, 10);

        if first != '.' && self.peek() == Some('.') {
            value.push('.');
            self.advance();
            self.scan_digits(&mut value, 10);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                value.push(sign);
                self.advance();
            }
            if !self.scan_digits(&mut value, 10) {
                return TokenKind::Invalid("missing exponent");
            }
        }

        if self.peek() == Some('n') {
            self.advance();
            if value.contains(['.', 'e']) {
                return TokenKind::Invalid("invalid BigInt literal");
            }
            return TokenKind::BigInt(value);
        }

        if self.peek().is_some_and(is_id_start) {
            return TokenKind::Invalid("identifier directly after number");
        }

        match value.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid("invalid numeric literal"),
        }
    }

    fn scan_radix_number(&mut self, radix: u32) -> TokenKind {
        let mut digits = String::new();
        if !self.scan_digits(&mut digits, radix) {
            return TokenKind::Invalid("missing digits after radix prefix");
        }

        if self.peek() == Some('n') {
            self.advance();
            let prefix = match radix {
                16 => "0x",
                8 => "0o",
                _ => "0b",
            };
            return TokenKind::BigInt(format!("{prefix}{digits}"));
        }

        // Fold digit by digit so literals wider than 64 bits still round.
        let value = digits.chars().fold(0.0f64, |acc, ch| {
            acc * radix as f64 + ch.to_digit(radix).unwrap_or(0) as f64
        });
        TokenKind::Number(value)
    }

    /// Appends digits of `radix` to `out`, skipping numeric separators.
    /// Returns true if at least one digit was consumed.
    fn scan_digits(&mut self, out: &mut String, radix: u32) -> bool {
        let mut consumed = false;
        let mut after_digit = out.ends_with(|c: char| c.is_digit(radix));
        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                out.push(ch);
                consumed = true;
                after_digit = true;
                self.advance();
            } else if ch == '_' && after_digit {
                after_digit = false;
                self.advance();
            } else {
                break;
            }
        }
        consumed
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match name.as_str() {
            "break" => TokenKind::Break,
            "case" => TokenKind::Case,
            "catch" => TokenKind::Catch,
            "class" => TokenKind::Class,
            "const" => TokenKind::Const,
            "continue" => TokenKind::Continue,
            "debugger" => TokenKind::Debugger,
            "default" => TokenKind::Default,
            "delete" => TokenKind::Delete,
            "do" => TokenKind::Do,
            "else" => TokenKind::Else,
            "enum" => TokenKind::Enum,
            "export" => TokenKind::Export,
            "extends" => TokenKind::Extends,
            "false" => TokenKind::False,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "function" => TokenKind::Function,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "instanceof" => TokenKind::Instanceof,
            "let" => TokenKind::Let,
            "new" => TokenKind::New,
            "null" => TokenKind::Null,
            "return" => TokenKind::Return,
            "super" => TokenKind::Super,
            "switch" => TokenKind::Switch,
            "this" => TokenKind::This,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "try" => TokenKind::Try,
            "typeof" => TokenKind::Typeof,
            "var" => TokenKind::Var,
            "void" => TokenKind::Void,
            "while" => TokenKind::While,
            "with" => TokenKind::With,
            _ => TokenKind::Identifier(name),
        }
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_'
        || ch == '$'
        || ch == '\u{200C}'
        || ch == '\u{200D}'
        || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Scanner::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuators() {
        assert_eq!(
            kinds("{ } >>>= ?? ?. => ..."),
            vec![
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::UnsignedRightShiftEqual,
                TokenKind::QuestionQuestion,
                TokenKind::QuestionDot,
                TokenKind::Arrow,
                TokenKind::Ellipsis,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let mut scanner = Scanner::new("42 3.14 .5 0xff 0b1010 1_000 2e3");
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 42.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 3.14));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 0.5));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 255.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 10.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 1000.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 2000.0));
    }

    #[test]
    fn test_bigint() {
        assert_eq!(
            kinds("12n 0xffn"),
            vec![
                TokenKind::BigInt("12".into()),
                TokenKind::BigInt("0xff".into())
            ]
        );
        assert!(matches!(kinds("1.5n")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_strings() {
        let mut scanner = Scanner::new(r#""hello" 'wo\x72ld' "A\u{42}""#);
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "hello"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "world"));
        assert!(matches!(scanner.next_token().kind, TokenKind::String(s) if s == "AB"));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(kinds("'abc\n'")[0], TokenKind::Invalid(_)));
    }

    #[test]
    fn test_keywords() {
        let mut scanner = Scanner::new("function var let async");
        assert!(matches!(scanner.next_token().kind, TokenKind::Function));
        assert!(matches!(scanner.next_token().kind, TokenKind::Var));
        assert!(matches!(scanner.next_token().kind, TokenKind::Let));
        assert!(matches!(scanner.next_token().kind, TokenKind::Identifier(s) if s == "async"));
    }

    #[test]
    fn test_newline_tracking() {
        let mut scanner = Scanner::new("a /* x\n */ b c");
        assert!(!scanner.next_token().newline_before);
        assert!(scanner.next_token().newline_before);
        assert!(!scanner.next_token().newline_before);
    }

    #[test]
    fn test_comments() {
        let mut scanner = Scanner::new("1 // comment\n 2 /* multi\nline */ 3");
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 1.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 2.0));
        assert!(matches!(scanner.next_token().kind, TokenKind::Number(n) if n == 3.0));
    }

    #[test]
    fn test_regexp_rescan() {
        let mut scanner = Scanner::new("/a[/]b\\//gi;");
        let slash = scanner.next_token();
        assert_eq!(slash.kind, TokenKind::Slash);
        let regexp = scanner.rescan_regexp(&slash);
        assert_eq!(
            regexp.kind,
            TokenKind::RegExp {
                pattern: "a[/]b\\/".into(),
                flags: "gi".into()
            }
        );
        assert_eq!(scanner.next_token().kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_scan_from_offset() {
        let source = "var a; function f() {}";
        let mut scanner = Scanner::new_at(source, 7);
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::Function);
        assert_eq!(token.span, Span::new(7, 15));
    }
}
