//! Raw lexer: first lexing pass
//!
//! Splits source text into coarse [`RawToken`]s. Names and numbers are not
//! classified yet, comments are dropped, quoted text becomes a single
//! `'...'` lexeme and every single-character operator or punctuation mark is
//! emitted on its own. The one decision made here is the decimal point:
//! a `.` directly after an integer continues the number (`1.5`, `0.25f`)
//! instead of becoming member access.

use super::ast::SourceLocation;
use super::buffer::TokenBuffer;
use super::error::ParseError;
use super::source::SourceCursor;
use super::token::{keyword_kind, RawToken, TokenKind};
use std::sync::Arc;
use tracing::debug;

/// Lexer for shader source
pub struct Lexer {
    cursor: SourceCursor,
    tokens: TokenBuffer<RawToken>,
    pending: String,
    pending_location: Option<SourceLocation>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(source: &str, file: impl Into<Arc<str>>) -> Self {
        Self::with_cursor(SourceCursor::new(source, file))
    }

    /// Create a lexer over already-split lines
    pub fn from_lines<I, S>(lines: I, file: impl Into<Arc<str>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_cursor(SourceCursor::from_lines(lines, file))
    }

    fn with_cursor(cursor: SourceCursor) -> Self {
        Self {
            cursor,
            tokens: TokenBuffer::new(),
            pending: String::new(),
            pending_location: None,
        }
    }

    /// Run the pass over the whole input
    pub fn tokenize(mut self) -> Result<TokenBuffer<RawToken>, ParseError> {
        loop {
            let location = self.cursor.location();
            let Some(ch) = self.cursor.get() else {
                break;
            };

            match ch {
                ' ' | '\t' | '\n' | '\r' => self.store_pending(),
                '"' | '\'' => {
                    self.store_pending();
                    let body = self.quoted(ch, &location)?;
                    self.tokens
                        .insert_back(RawToken::new(format!("'{}'", body), location));
                }
                '/' if self.cursor.peek() == Some('/') => {
                    self.store_pending();
                    self.cursor.remaining_on_line();
                }
                '/' if self.cursor.peek() == Some('*') => {
                    self.store_pending();
                    self.cursor.get();
                    self.skip_block_comment(location)?;
                }
                _ => self.symbol_or_pending(ch, location),
            }
        }

        self.store_pending();
        debug!(count = self.tokens.len(), "raw lexing finished");
        Ok(self.tokens)
    }

    fn symbol_or_pending(&mut self, ch: char, location: SourceLocation) {
        let mut utf8 = [0u8; 4];
        match keyword_kind(ch.encode_utf8(&mut utf8)) {
            Some(TokenKind::Access) if self.pending.parse::<i64>().is_ok() => {
                self.decimal_fraction();
            }
            Some(_) => {
                self.store_pending();
                self.tokens.insert_back(RawToken::new(ch, location));
            }
            None => {
                if self.pending.is_empty() {
                    self.pending_location = Some(location);
                }
                self.pending.push(ch);
            }
        }
    }

    /// Append `.digits` (and swallow an `f` suffix) to the pending integer
    fn decimal_fraction(&mut self) {
        self.pending.push('.');
        while let Some(next) = self.cursor.peek() {
            if next.is_ascii_digit() {
                self.pending.push(next);
                self.cursor.get();
            } else {
                if next == 'f' {
                    self.cursor.get();
                }
                break;
            }
        }
        self.store_pending();
    }

    fn store_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        let location = self
            .pending_location
            .take()
            .unwrap_or_else(|| self.cursor.location());
        self.tokens.insert_back(RawToken::new(text, location));
    }

    /// Consume through the matching unescaped quote, returning the text
    /// between the quotes
    fn quoted(&mut self, quote: char, start: &SourceLocation) -> Result<String, ParseError> {
        let mut body = String::new();
        let mut escaped = false;

        while let Some(ch) = self.cursor.get() {
            if ch == quote && !escaped {
                return Ok(body);
            }
            escaped = ch == '\\' && !escaped;
            body.push(ch);
        }

        Err(ParseError::exhausted(Some(start.clone())))
    }

    /// Skip block comment body (the opening `/*` is already consumed)
    fn skip_block_comment(&mut self, start: SourceLocation) -> Result<(), ParseError> {
        let mut previous = None;
        while let Some(ch) = self.cursor.get() {
            if previous == Some('*') && ch == '/' {
                return Ok(());
            }
            previous = Some(ch);
        }
        Err(ParseError::exhausted(Some(start)))
    }
}

/// Convenience wrapper: lex `source` in one call
pub fn preprocess(source: &str, file: impl Into<Arc<str>>) -> Result<TokenBuffer<RawToken>, ParseError> {
    Lexer::new(source, file).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::ErrorKind;
    use crate::parser::token::Lexeme;

    fn texts(source: &str) -> Vec<String> {
        preprocess(source, "<test>")
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        assert_eq!(
            texts("float x[4];"),
            ["float", "x", "[", "4", "]", ";"]
        );
    }

    #[test]
    fn test_decimal_point_vs_access() {
        assert_eq!(texts("a = 1.5 + b.y;"), ["a", "=", "1.5", "+", "b", ".", "y", ";"]);
        assert_eq!(texts("0.25f*t"), ["0.25", "*", "t"]);
        assert_eq!(texts("v2.x"), ["v2", ".", "x"]);
    }

    #[test]
    fn test_comments() {
        let tokens = texts("int x; // comment\nint y; /* block\ncomment */ int z;");
        assert_eq!(tokens, ["int", "x", ";", "int", "y", ";", "int", "z", ";"]);
    }

    #[test]
    fn test_string_literal() {
        let buffer = preprocess(r#"include "lib/common.ash";"#, "<test>").unwrap();
        let tokens: Vec<_> = buffer.into_iter().collect();
        assert_eq!(tokens[1].text, "'lib/common.ash'");
        assert_eq!(tokens[1].kind(), TokenKind::StringLiteral);
        assert_eq!(tokens[1].location.column, 9);
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        assert_eq!(texts(r#""a\"b" c"#), [r#"'a\"b'"#, "c"]);
    }

    #[test]
    fn test_locations() {
        let tokens: Vec<_> = preprocess("vertex {\n  layout", "<test>")
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!((tokens[0].location.line, tokens[0].location.column), (1, 1));
        assert_eq!((tokens[1].location.line, tokens[1].location.column), (1, 8));
        assert_eq!((tokens[2].location.line, tokens[2].location.column), (2, 3));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = preprocess("int x; /* open", "<test>").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExhaustedInput);
        assert_eq!(err.location().map(|l| l.column), Some(8));
    }
}
