//! Small cursor over address strings shared by the `FromStr` impls.

use super::InstanceKey;
use crate::core::errors::{ImportError, Result};

pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ImportError {
        ImportError::invalid_address(self.input, message)
    }

    pub(crate) fn peek_is(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }

    pub(crate) fn eat(&mut self, s: &str) -> bool {
        if self.peek_is(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, s: &str) -> Result<()> {
        if self.eat(s) {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?} at offset {}", s, self.pos)))
        }
    }

    /// Identifier: letters, digits, `_` and `-`
    pub(crate) fn ident(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error(format!("expected a name at offset {}", self.pos)));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    /// Whether the next identifier equals `word` and is followed by `.`
    pub(crate) fn peek_keyword(&self, word: &str) -> bool {
        let rest = self.rest();
        rest.starts_with(word) && rest[word.len()..].starts_with('.')
    }

    /// Double-quoted string with `\"` and `\\` escapes
    pub(crate) fn quoted(&mut self) -> Result<String> {
        self.expect("\"")?;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                },
                other => out.push(other),
            }
        }
        Err(self.error("unterminated string"))
    }

    /// Optional `[N]` or `["key"]`
    pub(crate) fn instance_key(&mut self) -> Result<InstanceKey> {
        if !self.eat("[") {
            return Ok(InstanceKey::NoKey);
        }
        let key = if self.peek_is("\"") {
            InstanceKey::Str(self.quoted()?)
        } else {
            let rest = self.rest();
            let len = rest
                .char_indices()
                .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let n = rest[..len]
                .parse::<i64>()
                .map_err(|_| self.error("instance key must be an integer or a quoted string"))?;
            self.pos += len;
            InstanceKey::Int(n)
        };
        self.expect("]")?;
        Ok(key)
    }
}
