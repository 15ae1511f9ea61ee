//! Error type shared by the raw lexer, the retokenizer and the parser
//!
//! Every stage is fail-fast: the first [`ParseError`] aborts the whole run and
//! no partial tree is returned.

use super::ast::SourceLocation;
use super::token::TokenKind;
use thiserror::Error;

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The next token's kind is not one the grammar allows here
    #[error("expected {} but got {found}", expected_list(.expected))]
    UnexpectedKind {
        expected: Vec<TokenKind>,
        found: TokenKind,
    },

    /// A read was attempted after the input ran out
    #[error("expected more input")]
    ExhaustedInput,

    /// A token at a dispatch point starts no known construct
    #[error("unexpected {found} {context}")]
    UnrecognizedConstruct {
        found: TokenKind,
        context: &'static str,
    },

    /// A count or literal failed numeric conversion
    #[error("malformed {expected} '{lexeme}'")]
    MalformedLiteral {
        lexeme: String,
        expected: &'static str,
    },
}

fn expected_list(kinds: &[TokenKind]) -> String {
    match kinds {
        [single] => single.to_string(),
        _ => {
            let names: Vec<String> = kinds.iter().map(ToString::to_string).collect();
            format!("one of [{}]", names.join(", "))
        }
    }
}

/// Located front-end error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.kind, .location))]
pub struct ParseError {
    pub kind: ErrorKind,
    pub location: Option<SourceLocation>,
}

fn render(kind: &ErrorKind, location: &Option<SourceLocation>) -> String {
    match location {
        Some(location) => format!("{}: {}", location, kind),
        None => "no input".to_string(),
    }
}

impl ParseError {
    pub fn new(kind: ErrorKind, location: SourceLocation) -> Self {
        Self {
            kind,
            location: Some(location),
        }
    }

    pub fn unexpected_kind(
        expected: &[TokenKind],
        found: TokenKind,
        location: SourceLocation,
    ) -> Self {
        Self::new(
            ErrorKind::UnexpectedKind {
                expected: expected.to_vec(),
                found,
            },
            location,
        )
    }

    /// Input ran out; cite the last consumed token if there was one
    pub fn exhausted(last: Option<SourceLocation>) -> Self {
        Self {
            kind: ErrorKind::ExhaustedInput,
            location: last,
        }
    }

    pub fn unrecognized(found: TokenKind, context: &'static str, location: SourceLocation) -> Self {
        Self::new(ErrorKind::UnrecognizedConstruct { found, context }, location)
    }

    pub fn malformed(
        lexeme: impl Into<String>,
        expected: &'static str,
        location: SourceLocation,
    ) -> Self {
        Self::new(
            ErrorKind::MalformedLiteral {
                lexeme: lexeme.into(),
                expected,
            },
            location,
        )
    }

    /// Human-readable message without the location prefix
    pub fn message(&self) -> String {
        match self.location {
            Some(_) => self.kind.to_string(),
            None => "no input".to_string(),
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}
