//! Recursive-descent parser for relaxed object notation.
//!
//! Grammar accepted (whitespace allowed between all tokens):
//!
//! ```text
//! document := object | members            -- outer braces are optional
//! object   := '{' members '}'
//! members  := [ member { ',' member } [','] ]
//! member   := key [ ':' value ]           -- a key without value is `true`
//! key      := string | identifier
//! value    := object | array | string | number | true | false | null | word
//! array    := '[' [ value { ',' value } [','] ] ']'
//! ```
//!
//! Identifiers are letters, digits, `_` and `-`, optionally prefixed with
//! `$`. Bare words additionally accept `.` and `@`, so field paths
//! (`$meta.title`) and permission tokens (`@all`) need no quoting.

use crate::error::{NotationError, NotationResult};
use serde_json::{Map, Number, Value};

/// Maximum nesting of objects and arrays.
pub const MAX_DEPTH: usize = 64;

/// Parses relaxed notation into an object tree.
pub fn parse(text: &str) -> NotationResult<Map<String, Value>> {
    Parser::new(text).parse_document()
}

struct Parser<'a> {
    text: &'a str,
    cursor: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            cursor: 0,
            depth: 0,
        }
    }

    fn parse_document(&mut self) -> NotationResult<Map<String, Value>> {
        self.skip_ws();
        let members = if self.peek() == Some('{') {
            // Exactly one wrapping layer is stripped; anything after the
            // matching brace is an error.
            self.parse_object()?
        } else {
            self.parse_members(None)?
        };
        self.skip_ws();
        if self.cursor != self.text.len() {
            return Err(self.malformed("unexpected characters after document"));
        }
        Ok(members)
    }

    fn parse_object(&mut self) -> NotationResult<Map<String, Value>> {
        self.consume('{')?;
        self.enter()?;
        let members = self.parse_members(Some('}'))?;
        self.consume('}')?;
        self.depth -= 1;
        Ok(members)
    }

    /// Parses members up to `terminator` (or end of input when `None`)
    /// without consuming the terminator.
    fn parse_members(&mut self, terminator: Option<char>) -> NotationResult<Map<String, Value>> {
        let mut members = Map::new();
        loop {
            self.skip_ws();
            if self.at_terminator(terminator) {
                break;
            }
            let key = self.parse_key()?;
            self.skip_ws();
            let value = if self.peek() == Some(':') {
                self.cursor += 1;
                self.parse_value()?
            } else {
                Value::Bool(true)
            };
            members.insert(key, value);

            self.skip_ws();
            match self.peek() {
                Some(',') => self.cursor += 1,
                _ if self.at_terminator(terminator) => break,
                _ => return Err(self.malformed("expected ',' between members")),
            }
        }
        Ok(members)
    }

    fn parse_key(&mut self) -> NotationResult<String> {
        match self.peek() {
            Some('"') => self.parse_string(),
            Some(_) => {
                let start = self.cursor;
                let token = self.take_word();
                if token.is_empty() || !is_identifier(token) {
                    self.cursor = start;
                    return Err(self.malformed("expected a key"));
                }
                Ok(token.to_string())
            }
            None => Err(self.malformed("expected a key")),
        }
    }

    fn parse_value(&mut self) -> NotationResult<Value> {
        self.skip_ws();
        match self.peek() {
            Some('{') => Ok(Value::Object(self.parse_object()?)),
            Some('[') => self.parse_array(),
            Some('"') => Ok(Value::String(self.parse_string()?)),
            Some(_) => self.parse_bare(),
            None => Err(self.malformed("expected a value")),
        }
    }

    fn parse_array(&mut self) -> NotationResult<Value> {
        self.consume('[')?;
        self.enter()?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.cursor += 1,
                Some(']') => break,
                _ => return Err(self.malformed("expected ',' or ']' in array")),
            }
        }
        self.consume(']')?;
        self.depth -= 1;
        Ok(Value::Array(items))
    }

    /// Parses a double-quoted string with JSON escapes.
    fn parse_string(&mut self) -> NotationResult<String> {
        let start = self.cursor;
        self.consume('"')?;
        let mut escaped = false;
        while let Some(c) = self.peek() {
            self.cursor += c.len_utf8();
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    let text = self.text;
                    return match serde_json::from_str(&text[start..self.cursor]) {
                        Ok(s) => Ok(s),
                        Err(_) => {
                            self.cursor = start;
                            Err(self.malformed("invalid string escape"))
                        }
                    };
                }
                _ => escaped = false,
            }
        }
        self.cursor = start;
        Err(self.malformed("unterminated string"))
    }

    /// Parses a literal (`true`, `false`, `null`, number) or a bare word.
    fn parse_bare(&mut self) -> NotationResult<Value> {
        let start = self.cursor;
        let token = self.take_word();
        match token {
            "" => Err(self.malformed("expected a value")),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            _ => {
                if let Some(number) = parse_number(token) {
                    return Ok(Value::Number(number));
                }
                if !is_bare_word(token) {
                    self.cursor = start;
                    return Err(self.malformed("invalid bare word"));
                }
                Ok(Value::String(token.to_string()))
            }
        }
    }

    /// Advances over a run of characters that can belong to a bare token.
    fn take_word(&mut self) -> &'a str {
        let text = self.text;
        let start = self.cursor;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | ':' | '{' | '}' | '[' | ']' | '"') {
                break;
            }
            self.cursor += c.len_utf8();
        }
        &text[start..self.cursor]
    }

    fn at_terminator(&self, terminator: Option<char>) -> bool {
        match terminator {
            Some(t) => self.peek() == Some(t),
            None => self.peek().is_none(),
        }
    }

    fn enter(&mut self) -> NotationResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.malformed("nesting too deep"));
        }
        Ok(())
    }

    fn consume(&mut self, expected: char) -> NotationResult<()> {
        if self.peek() == Some(expected) {
            self.cursor += expected.len_utf8();
            Ok(())
        } else {
            Err(self.malformed(match expected {
                '{' => "expected '{'",
                '}' => "expected '}'",
                '[' => "expected '['",
                ']' => "expected ']'",
                _ => "expected '\"'",
            }))
        }
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.cursor += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.cursor..].chars().next()
    }

    fn malformed(&self, reason: &'static str) -> NotationError {
        NotationError::Malformed {
            text: self.text.to_string(),
            position: self.cursor,
            reason,
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// `$`? followed by one or more identifier characters.
fn is_identifier(token: &str) -> bool {
    let body = token.strip_prefix('$').unwrap_or(token);
    !body.is_empty() && body.chars().all(is_identifier_char)
}

fn is_bare_word(token: &str) -> bool {
    let body = token.strip_prefix('$').unwrap_or(token);
    !body.is_empty()
        && body
            .chars()
            .all(|c| is_identifier_char(c) || c == '.' || c == '@')
}

fn parse_number(token: &str) -> Option<Number> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if let Ok(n) = token.parse::<i64>() {
        return Some(Number::from(n));
    }
    if let Ok(n) = token.parse::<u64>() {
        return Some(Number::from(n));
    }
    token.parse::<f64>().ok().and_then(Number::from_f64)
}
