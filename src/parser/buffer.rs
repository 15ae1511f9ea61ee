//! Double-ended token buffer shared by the lexer, retokenizer and parser
//!
//! Both ends can be peeked, popped and extended. Popping remembers the last
//! removed token so that running out of input can still be reported at a
//! real source location.
//!
//! [`TokenBuffer::consume_till`] is the scope-balanced slicing primitive every
//! stage uses to carve out call arguments, array literals, parenthesized
//! expressions, statements and `for` clauses.

use super::ast::SourceLocation;
use super::error::ParseError;
use super::token::{Lexeme, TokenKind};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenBuffer<T> {
    tokens: VecDeque<T>,
    last_removed: Option<SourceLocation>,
}

impl<T> Default for TokenBuffer<T> {
    fn default() -> Self {
        Self {
            tokens: VecDeque::new(),
            last_removed: None,
        }
    }
}

impl<T> FromIterator<T> for TokenBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
            last_removed: None,
        }
    }
}

impl<T> IntoIterator for TokenBuffer<T> {
    type Item = T;
    type IntoIter = std::collections::vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl<T: Lexeme> TokenBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tokens.iter()
    }

    /// Location of the most recently removed token
    pub fn last_location(&self) -> Option<&SourceLocation> {
        self.last_removed.as_ref()
    }

    /// The "ran out of input" error for this buffer
    pub fn exhausted(&self) -> ParseError {
        ParseError::exhausted(self.last_removed.clone())
    }

    pub fn front(&self) -> Result<&T, ParseError> {
        self.tokens.front().ok_or_else(|| self.exhausted())
    }

    pub fn back(&self) -> Result<&T, ParseError> {
        self.tokens.back().ok_or_else(|| self.exhausted())
    }

    /// Kind of the front token, `None` when empty
    pub fn front_kind(&self) -> Option<TokenKind> {
        self.tokens.front().map(Lexeme::kind)
    }

    /// Kind of the token after the front one
    pub fn second_kind(&self) -> Option<TokenKind> {
        self.tokens.get(1).map(Lexeme::kind)
    }

    /// True when the buffer is non-empty and the front token has `kind`
    pub fn front_is(&self, kind: TokenKind) -> bool {
        self.front_kind() == Some(kind)
    }

    pub fn remove_front(&mut self) -> Result<T, ParseError> {
        let token = self.tokens.pop_front().ok_or_else(|| self.exhausted())?;
        self.last_removed = Some(token.location().clone());
        Ok(token)
    }

    pub fn remove_back(&mut self) -> Result<T, ParseError> {
        let token = self.tokens.pop_back().ok_or_else(|| self.exhausted())?;
        self.last_removed = Some(token.location().clone());
        Ok(token)
    }

    /// Check that the front token is one of `kinds`
    pub fn expect_front(&self, kinds: &[TokenKind]) -> Result<&T, ParseError> {
        let token = self.front()?;
        check_kind(token, kinds)?;
        Ok(token)
    }

    /// Check that the back token is one of `kinds`
    pub fn expect_back(&self, kinds: &[TokenKind]) -> Result<&T, ParseError> {
        let token = self.back()?;
        check_kind(token, kinds)?;
        Ok(token)
    }

    /// Remove the front token if it is one of `kinds`, fail otherwise
    pub fn take_front(&mut self, kinds: &[TokenKind]) -> Result<T, ParseError> {
        self.expect_front(kinds)?;
        self.remove_front()
    }

    /// Remove the back token if it is one of `kinds`, fail otherwise
    pub fn take_back(&mut self, kinds: &[TokenKind]) -> Result<T, ParseError> {
        self.expect_back(kinds)?;
        self.remove_back()
    }

    pub fn insert_front(&mut self, token: T) -> &mut Self {
        self.tokens.push_front(token);
        self
    }

    pub fn insert_back(&mut self, token: T) -> &mut Self {
        self.tokens.push_back(token);
        self
    }

    /// Drain `other` onto the front, keeping its order
    pub fn splice_front(&mut self, other: &mut TokenBuffer<T>) -> &mut Self {
        while let Some(token) = other.tokens.pop_back() {
            self.tokens.push_front(token);
        }
        self
    }

    /// Drain `other` onto the back, keeping its order
    pub fn splice_back(&mut self, other: &mut TokenBuffer<T>) -> &mut Self {
        self.tokens.append(&mut other.tokens);
        self
    }

    /// Remove and return every token before the first `stop` kind found at
    /// depth 0.
    ///
    /// Depth starts at `initial_scope`, goes up on `(`/`[`/`{` and down on
    /// `)`/`]`/`}`. A closing token is checked against `stop` both before and
    /// after it lowers the depth, so with `initial_scope = 1` the close that
    /// balances an already-consumed open ends the run. The stop token itself
    /// is never consumed. Runs to the end of input if no stop is found.
    pub fn consume_till(&mut self, initial_scope: i32, stop: &[TokenKind]) -> TokenBuffer<T> {
        let mut scope = initial_scope;
        let mut taken = 0;

        for token in &self.tokens {
            let kind = token.kind();
            let stops = stop.contains(&kind);

            if kind.is_open() || kind.is_close() {
                if stops && scope == 0 {
                    break;
                }
                scope += if kind.is_open() { 1 } else { -1 };
            }

            if stops && scope == 0 {
                break;
            }
            taken += 1;
        }

        let rest = self.tokens.split_off(taken);
        let run = std::mem::replace(&mut self.tokens, rest);
        if let Some(last) = run.back() {
            self.last_removed = Some(last.location().clone());
        }
        TokenBuffer {
            tokens: run,
            last_removed: self.last_removed.clone(),
        }
    }
}

fn check_kind<T: Lexeme>(token: &T, kinds: &[TokenKind]) -> Result<(), ParseError> {
    if kinds.contains(&token.kind()) {
        Ok(())
    } else {
        Err(ParseError::unexpected_kind(
            kinds,
            token.kind(),
            token.location().clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::ErrorKind;
    use crate::parser::token::Token;
    use std::sync::Arc;

    fn tokens(spec: &[(TokenKind, &str)]) -> TokenBuffer<Token> {
        spec.iter()
            .enumerate()
            .map(|(i, (kind, text))| {
                Token::new(*kind, *text, SourceLocation::new(Arc::from("<test>"), 1, i + 1))
            })
            .collect()
    }

    fn kinds(buffer: &TokenBuffer<Token>) -> Vec<TokenKind> {
        buffer.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_front_back_and_removal() {
        let mut buffer = tokens(&[
            (TokenKind::Identifier, "a"),
            (TokenKind::OpAdd, "+"),
            (TokenKind::Identifier, "b"),
        ]);
        assert_eq!(buffer.front().unwrap().lexeme, "a");
        assert_eq!(buffer.back().unwrap().lexeme, "b");
        assert_eq!(buffer.remove_back().unwrap().lexeme, "b");
        assert_eq!(buffer.remove_front().unwrap().lexeme, "a");
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_exhausted_reports_last_removed() {
        let mut buffer = tokens(&[(TokenKind::Identifier, "x")]);
        buffer.remove_front().unwrap();
        let err = buffer.remove_front().unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExhaustedInput);
        assert_eq!(err.location().map(|l| l.column), Some(1));

        let empty: TokenBuffer<Token> = TokenBuffer::new();
        assert!(empty.front().unwrap_err().location().is_none());
    }

    #[test]
    fn test_expect_front_reports_found_kind() {
        let buffer = tokens(&[(TokenKind::CloseBrace, "}")]);
        let err = buffer.expect_front(&[TokenKind::StatementEnd]).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedKind {
                expected: vec![TokenKind::StatementEnd],
                found: TokenKind::CloseBrace,
            }
        );
    }

    #[test]
    fn test_back_checks_and_single_inserts() {
        let mut buffer = tokens(&[(TokenKind::Identifier, "x"), (TokenKind::StatementEnd, ";")]);
        assert_eq!(buffer.expect_back(&[TokenKind::StatementEnd]).unwrap().lexeme, ";");
        let err = buffer.expect_back(&[TokenKind::CloseBrace]).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnexpectedKind { found: TokenKind::StatementEnd, .. }
        ));
        assert_eq!(err.location().map(|l| l.column), Some(2));

        // A failed take leaves the buffer alone
        assert!(buffer.take_back(&[TokenKind::Identifier]).is_err());
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.take_back(&[TokenKind::StatementEnd]).unwrap().lexeme, ";");

        let open = Token::new(TokenKind::OpenParen, "(", SourceLocation::new(Arc::from("<test>"), 1, 9));
        let close = Token::new(TokenKind::CloseParen, ")", SourceLocation::new(Arc::from("<test>"), 1, 10));
        buffer.insert_front(open).insert_back(close);
        assert_eq!(
            kinds(&buffer),
            [TokenKind::OpenParen, TokenKind::Identifier, TokenKind::CloseParen]
        );
        assert_eq!(buffer.take_front(&[TokenKind::OpenParen]).unwrap().location.column, 9);
    }

    #[test]
    fn test_splice_preserves_order() {
        let mut dest = tokens(&[(TokenKind::Identifier, "m")]);
        let mut front = tokens(&[(TokenKind::Identifier, "a"), (TokenKind::Identifier, "b")]);
        let mut back = tokens(&[(TokenKind::Identifier, "y"), (TokenKind::Identifier, "z")]);
        dest.splice_front(&mut front).splice_back(&mut back);
        let text: Vec<_> = dest.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(text, ["a", "b", "m", "y", "z"]);
        assert!(front.is_empty());
        assert!(back.is_empty());
    }

    #[test]
    fn test_consume_till_skips_nested_stops() {
        // f(a, g(b, c)), d
        let mut buffer = tokens(&[
            (TokenKind::Identifier, "f"),
            (TokenKind::OpenParen, "("),
            (TokenKind::Identifier, "a"),
            (TokenKind::Comma, ","),
            (TokenKind::Identifier, "g"),
            (TokenKind::OpenParen, "("),
            (TokenKind::Identifier, "b"),
            (TokenKind::Comma, ","),
            (TokenKind::Identifier, "c"),
            (TokenKind::CloseParen, ")"),
            (TokenKind::CloseParen, ")"),
            (TokenKind::Comma, ","),
            (TokenKind::Identifier, "d"),
        ]);
        let run = buffer.consume_till(0, &[TokenKind::Comma]);
        assert_eq!(run.len(), 11);
        assert_eq!(kinds(&buffer), [TokenKind::Comma, TokenKind::Identifier]);
    }

    #[test]
    fn test_consume_till_stops_at_balancing_close() {
        // ( a ) ) -- the open is consumed, the balancing close is left
        let mut buffer = tokens(&[
            (TokenKind::OpenParen, "("),
            (TokenKind::Identifier, "a"),
            (TokenKind::CloseParen, ")"),
            (TokenKind::OpAdd, "+"),
        ]);
        let run = buffer.consume_till(0, &[TokenKind::CloseParen]);
        assert_eq!(kinds(&run), [TokenKind::OpenParen, TokenKind::Identifier]);
        assert_eq!(kinds(&buffer), [TokenKind::CloseParen, TokenKind::OpAdd]);
    }

    #[test]
    fn test_consume_till_with_initial_scope() {
        // (after an already-consumed '[') i [ j ] ] x
        let mut buffer = tokens(&[
            (TokenKind::Identifier, "i"),
            (TokenKind::OpenBracket, "["),
            (TokenKind::Identifier, "j"),
            (TokenKind::CloseBracket, "]"),
            (TokenKind::CloseBracket, "]"),
            (TokenKind::Identifier, "x"),
        ]);
        let run = buffer.consume_till(1, &[TokenKind::CloseBracket]);
        assert_eq!(run.len(), 4);
        assert_eq!(kinds(&buffer), [TokenKind::CloseBracket, TokenKind::Identifier]);
    }

    #[test]
    fn test_consume_till_without_stop_takes_everything() {
        let mut buffer = tokens(&[(TokenKind::Identifier, "a"), (TokenKind::OpAdd, "+")]);
        let run = buffer.consume_till(0, &[TokenKind::StatementEnd]);
        assert_eq!(run.len(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.last_location().is_some());
    }
}
