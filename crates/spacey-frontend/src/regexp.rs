//! Syntax check for regular expression literals.
//!
//! Only the shape of the pattern is checked: groups balance, quantifiers
//! follow something they can repeat, classes are closed and their ranges
//! ordered, and the flags are known and unique. Compiling the pattern is
//! left to the runtime.

/// Checks a pattern and its flags, returning a description of the first
/// problem found.
pub fn check(pattern: &str, flags: &str) -> Result<(), String> {
    check_flags(flags)?;
    let unicode = flags.contains(['u', 'v']);
    Checker {
        chars: pattern.chars().collect(),
        pos: 0,
        unicode,
    }
    .check_pattern()
}

fn check_flags(flags: &str) -> Result<(), String> {
    let mut seen = String::new();
    for flag in flags.chars() {
        if !"dgimsuyv".contains(flag) || seen.contains(flag) {
            return Err(format!("invalid flags '{flags}'"));
        }
        seen.push(flag);
    }
    if seen.contains('u') && seen.contains('v') {
        return Err(format!("invalid flags '{flags}'"));
    }
    Ok(())
}

struct Checker {
    chars: Vec<char>,
    pos: usize,
    unicode: bool,
}

impl Checker {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn check_pattern(mut self) -> Result<(), String> {
        self.disjunction()?;
        match self.peek() {
            None => Ok(()),
            Some(')') => Err("unmatched ')'".into()),
            Some(ch) => Err(format!("unexpected '{ch}'")),
        }
    }

    fn disjunction(&mut self) -> Result<(), String> {
        self.alternative()?;
        while self.eat('|') {
            self.alternative()?;
        }
        Ok(())
    }

    fn alternative(&mut self) -> Result<(), String> {
        while let Some(ch) = self.peek() {
            if ch == '|' || ch == ')' {
                break;
            }
            let quantifiable = self.term()?;
            if self.quantifier()? && !quantifiable {
                return Err("nothing to repeat".into());
            }
        }
        Ok(())
    }

    /// Parses one term, returning whether it may be quantified.
    fn term(&mut self) -> Result<bool, String> {
        let Some(ch) = self.bump() else {
            return Ok(false);
        };
        match ch {
            '^' | '$' => Ok(false),
            '*' | '+' | '?' => Err("nothing to repeat".into()),
            '{' if self.unicode || self.braced_quantifier_ahead() => Err("nothing to repeat".into()),
            '}' | ']' if self.unicode => Err(format!("lone quantifier bracket '{ch}'")),
            '(' => self.group(),
            '[' => self.class().map(|_| true),
            '\\' => self.atom_escape(),
            _ => Ok(true),
        }
    }

    fn group(&mut self) -> Result<bool, String> {
        let mut quantifiable = true;
        if self.eat('?') {
            match self.bump() {
                Some(':') => {}
                Some('=' | '!') => quantifiable = !self.unicode,
                Some('<') if matches!(self.peek(), Some('=' | '!')) => {
                    self.pos += 1;
                    quantifiable = false;
                }
                Some('<') => {
                    let mut name_len = 0;
                    while let Some(ch) = self.bump() {
                        if ch == '>' {
                            break;
                        }
                        if !(ch == '$' || ch == '_' || ch.is_alphanumeric()) {
                            return Err("invalid capture group name".into());
                        }
                        name_len += 1;
                    }
                    if name_len == 0 || self.chars.get(self.pos - 1) != Some(&'>') {
                        return Err("invalid capture group name".into());
                    }
                }
                _ => return Err("invalid group".into()),
            }
        }

        self.disjunction()?;
        if !self.eat(')') {
            return Err("unterminated group".into());
        }
        Ok(quantifiable)
    }

    fn class(&mut self) -> Result<(), String> {
        self.eat('^');
        loop {
            let Some(ch) = self.bump() else {
                return Err("unterminated character class".into());
            };
            let atom = match ch {
                ']' => return Ok(()),
                '\\' => self.class_escape()?,
                _ => Some(ch),
            };

            if self.peek() == Some('-') && self.peek_at(1).is_some_and(|c| c != ']') {
                self.pos += 1;
                let end = match self.bump() {
                    Some('\\') => self.class_escape()?,
                    other => other,
                };
                if let (Some(from), Some(to)) = (atom, end)
                    && from > to
                {
                    return Err("character class range out of order".into());
                }
            }
        }
    }

    /// Parses an escape inside a class, returning the character it denotes
    /// when it denotes exactly one.
    fn class_escape(&mut self) -> Result<Option<char>, String> {
        let Some(ch) = self.bump() else {
            return Err("\\ at end of pattern".into());
        };
        Ok(match ch {
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => None,
            'p' | 'P' if self.unicode => {
                self.property_escape()?;
                None
            }
            'b' => Some('\u{0008}'),
            _ => self.character_escape(ch)?,
        })
    }

    fn atom_escape(&mut self) -> Result<bool, String> {
        let Some(ch) = self.bump() else {
            return Err("\\ at end of pattern".into());
        };
        match ch {
            'b' | 'B' => Ok(false),
            'd' | 'D' | 'w' | 'W' | 's' | 'S' => Ok(true),
            'p' | 'P' if self.unicode => self.property_escape().map(|_| true),
            'k' if self.unicode || self.peek() == Some('<') => {
                if !self.eat('<') {
                    return Err("invalid named reference".into());
                }
                while let Some(ch) = self.bump() {
                    if ch == '>' {
                        return Ok(true);
                    }
                }
                Err("invalid named reference".into())
            }
            '1'..='9' => {
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                Ok(true)
            }
            _ => self.character_escape(ch).map(|_| true),
        }
    }

    fn property_escape(&mut self) -> Result<(), String> {
        if !self.eat('{') {
            return Err("invalid property name".into());
        }
        let mut any = false;
        while let Some(ch) = self.bump() {
            if ch == '}' {
                return if any {
                    Ok(())
                } else {
                    Err("invalid property name".into())
                };
            }
            any = true;
        }
        Err("invalid property name".into())
    }

    fn character_escape(&mut self, ch: char) -> Result<Option<char>, String> {
        let escaped = match ch {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'f' => '\u{000C}',
            'v' => '\u{000B}',
            '0' => '\0',
            'c' => match self.peek() {
                Some(letter) if letter.is_ascii_alphabetic() => {
                    self.pos += 1;
                    char::from(letter as u8 % 32)
                }
                _ if self.unicode => return Err("invalid unicode escape".into()),
                _ => '\\',
            },
            'x' => match self.hex(2) {
                Some(ch) => ch,
                None if self.unicode => return Err("invalid escape".into()),
                None => 'x',
            },
            'u' => match self.unicode_escape() {
                Some(ch) => ch,
                None if self.unicode => return Err("invalid unicode escape".into()),
                None => 'u',
            },
            _ if self.unicode && ch.is_alphanumeric() => {
                return Err("invalid escape".into());
            }
            _ => ch,
        };
        Ok(Some(escaped))
    }

    fn hex(&mut self, count: usize) -> Option<char> {
        let digits: String = self.chars.get(self.pos..self.pos + count)?.iter().collect();
        let code = u32::from_str_radix(&digits, 16).ok()?;
        self.pos += count;
        char::from_u32(code)
    }

    fn unicode_escape(&mut self) -> Option<char> {
        if self.unicode && self.peek() == Some('{') {
            let close = self.chars[self.pos..].iter().position(|&c| c == '}')?;
            let digits: String = self.chars[self.pos + 1..self.pos + close].iter().collect();
            let code = u32::from_str_radix(&digits, 16).ok()?;
            self.pos += close + 1;
            return char::from_u32(code);
        }
        self.hex(4)
    }

    /// Parses a quantifier if one follows, returning whether one was found.
    fn quantifier(&mut self) -> Result<bool, String> {
        match self.peek() {
            Some('*' | '+' | '?') => {
                self.pos += 1;
            }
            Some('{') if self.braced_quantifier_ahead() => {
                self.pos += 1;
                let min = self.decimal();
                let max = if self.eat(',') { self.decimal() } else { min };
                self.eat('}');
                if let (Some(min), Some(max)) = (min, max)
                    && min > max
                {
                    return Err("numbers out of order in {} quantifier".into());
                }
            }
            _ => return Ok(false),
        }
        self.eat('?');
        Ok(true)
    }

    /// Returns true if `{` at the cursor starts `{n}`, `{n,}` or `{n,m}`.
    fn braced_quantifier_ahead(&self) -> bool {
        let start = if self.chars.get(self.pos) == Some(&'{') {
            self.pos + 1
        } else {
            self.pos
        };
        let rest = &self.chars[start.min(self.chars.len())..];
        let digits = rest.iter().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return false;
        }
        let rest = &rest[digits..];
        match rest.first() {
            Some('}') => true,
            Some(',') => {
                let more = rest[1..].iter().take_while(|c| c.is_ascii_digit()).count();
                rest.get(1 + more) == Some(&'}')
            }
            _ => false,
        }
    }

    fn decimal(&mut self) -> Option<u64> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::check;

    #[test]
    fn test_valid_patterns() {
        for pattern in [
            "abc",
            "a|b|",
            "^(?:a+)?$",
            "[a-z0-9_]+",
            "(?<year>\\d{4})-\\k<year>",
            "a{2,}b{1,3}c{4}",
            "(?=x)(?!y)(?<=z)(?<!w)",
            "[\\]\\-]",
            "x{",
        ] {
            assert_eq!(check(pattern, ""), Ok(()), "pattern {pattern}");
        }
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(check("(a", "").unwrap_err().contains("unterminated group"));
        assert!(check("a)", "").unwrap_err().contains("unmatched"));
        assert!(check("*a", "").unwrap_err().contains("nothing to repeat"));
        assert!(check("[z-a]", "").unwrap_err().contains("out of order"));
        assert!(check("[abc", "").unwrap_err().contains("unterminated character class"));
        assert!(check("a{3,1}", "").unwrap_err().contains("out of order"));
        assert!(check("\\", "").unwrap_err().contains("end of pattern"));
        assert!(check("^*", "").unwrap_err().contains("nothing to repeat"));
    }

    #[test]
    fn test_flags() {
        assert_eq!(check("a", "gimsuy"), Ok(()));
        assert!(check("a", "gg").is_err());
        assert!(check("a", "z").is_err());
        assert!(check("a", "uv").is_err());
    }

    #[test]
    fn test_unicode_mode_is_stricter() {
        assert_eq!(check("\\q", ""), Ok(()));
        assert!(check("\\q", "u").is_err());
        assert_eq!(check("\\u{1F600}", "u"), Ok(()));
        assert_eq!(check("\\p{Letter}", "u"), Ok(()));
    }
}
