//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, the helpers shared by every
//! grammar routine and the module-level entry point.
//!
//! # Parser Architecture
//!
//! The Parser is a recursive descent over the retokenized buffer:
//! - This module: Parser struct, helper methods, top-level and stage dispatch
//! - `declarations`: declarations, structs, functions, layouts, push constants
//! - `statements`: scopes, statements, `for` and `if`
//! - `expressions`: expressions by precedence level
//!
//! # Token runs
//!
//! The [`Parser`] only owns the module buffer until [`Parser::parse_module`]
//! starts. Grammar routines are associated functions that take the buffer
//! they read from as an argument. Statements,
//! parenthesized expressions, call arguments and array literals are first cut
//! out of their parent buffer with
//! [`TokenBuffer::consume_till`](super::buffer::TokenBuffer::consume_till)
//! and then parsed as an independent run which must be used up completely.

use crate::parser::ast::*;
use crate::parser::buffer::TokenBuffer;
use crate::parser::error::ParseError;
use crate::parser::retokenize;
use crate::parser::token::{keyword_kind, Token, TokenKind};
use tracing::{debug, instrument, trace};

/// Typed token buffer the parser reads from
pub type Tokens = TokenBuffer<Token>;

/// Recursive descent parser for shader modules
pub struct Parser {
    tokens: Tokens,
    path: String,
}

impl Parser {
    /// Tokenize `source` and prepare to parse it
    pub fn new(source: &str, path: &str) -> Result<Self, ParseError> {
        let tokens = retokenize::tokenize(source, path)?;
        Ok(Self::from_tokens(tokens))
    }

    /// Same as [`Parser::new`] for already-split lines
    pub fn from_lines<I, S>(lines: I, path: &str) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens = retokenize::tokenize_lines(lines, path)?;
        Ok(Self::from_tokens(tokens))
    }

    /// Parse an existing retokenized buffer
    pub fn from_tokens(tokens: Tokens) -> Self {
        let path = tokens
            .iter()
            .next()
            .map(|token| token.location.file.to_string())
            .unwrap_or_default();
        Self { tokens, path }
    }

    /// Parse the entire module.
    ///
    /// An empty buffer yields an empty module with an empty path.
    #[instrument(skip_all, fields(path = %self.path))]
    pub fn parse_module(&mut self) -> Result<ModuleNode, ParseError> {
        let mut tokens = std::mem::take(&mut self.tokens);
        let mut module = ModuleNode {
            path: self.path.clone(),
            statements: Vec::new(),
        };

        while let Some(kind) = tokens.front_kind() {
            module.statements.push(Self::parse_top_level(&mut tokens, kind)?);
        }

        debug!(items = module.statements.len(), "parsed module");
        Ok(module)
    }

    fn parse_top_level(input: &mut Tokens, kind: TokenKind) -> Result<Node, ParseError> {
        trace!(%kind, "top level item");
        match kind {
            TokenKind::VertexScope | TokenKind::FragmentScope => {
                Ok(Node::NamedScope(Self::parse_named_scope(input)?))
            }
            _ => Self::parse_item(input, kind, "at top level"),
        }
    }

    /// Items allowed both at top level and inside a stage scope
    fn parse_item(
        input: &mut Tokens,
        kind: TokenKind,
        context: &'static str,
    ) -> Result<Node, ParseError> {
        match kind {
            TokenKind::Include => Ok(Node::Include(Self::parse_include(input)?)),
            TokenKind::Define => Ok(Node::Define(Self::parse_define(input)?)),
            TokenKind::TypeStruct => Ok(Node::Struct(Self::parse_struct(input)?)),
            TokenKind::Layout => Ok(Node::Layout(Self::parse_layout(input)?)),
            TokenKind::PushConstant => Ok(Node::PushConstant(Self::parse_push_constant(input)?)),
            TokenKind::Function => Ok(Node::Function(Self::parse_function(input)?)),
            TokenKind::Const => Self::parse_statement(input),
            _ => Err(ParseError::unrecognized(
                kind,
                context,
                input.front()?.location.clone(),
            )),
        }
    }

    /// `vertex { ... }` / `fragment { ... }`
    pub(crate) fn parse_named_scope(input: &mut Tokens) -> Result<NamedScopeNode, ParseError> {
        let open = input.take_front(&[TokenKind::VertexScope, TokenKind::FragmentScope])?;
        let stage = match open.kind {
            TokenKind::VertexScope => Stage::Vertex,
            _ => Stage::Fragment,
        };
        trace!(?stage, "stage scope");
        Self::expect_front(input, TokenKind::OpenBrace)?;

        let mut statements = Vec::new();
        while let Some(kind) = Self::front_before(input, TokenKind::CloseBrace) {
            statements.push(Self::parse_item(input, kind, "in stage scope")?);
        }
        Self::expect_front(input, TokenKind::CloseBrace)?;

        Ok(NamedScopeNode {
            stage,
            statements,
            location: open.location,
        })
    }

    // ===== Helper methods =====

    /// Remove the front token, which must have `kind`
    pub(crate) fn expect_front(input: &mut Tokens, kind: TokenKind) -> Result<Token, ParseError> {
        input.take_front(&[kind])
    }

    /// Remove an identifier token and return its name
    pub(crate) fn expect_identifier(input: &mut Tokens) -> Result<(String, SourceLocation), ParseError> {
        let token = input.take_front(&[TokenKind::Identifier])?;
        Ok((token.lexeme, token.location))
    }

    /// Kind of the front token unless it is `end` (or the buffer is empty)
    pub(crate) fn front_before(input: &Tokens, end: TokenKind) -> Option<TokenKind> {
        input.front_kind().filter(|kind| *kind != end)
    }

    /// Fail if a run still has tokens after it was parsed
    pub(crate) fn finish_run(run: &Tokens, context: &'static str) -> Result<(), ParseError> {
        match run.front() {
            Ok(token) => Err(ParseError::unrecognized(
                token.kind,
                context,
                token.location.clone(),
            )),
            Err(_) => Ok(()),
        }
    }

    /// Element count or return arity synthesized by the retokenizer
    pub(crate) fn parse_count(token: &Token) -> Result<u32, ParseError> {
        token
            .lexeme
            .parse::<u32>()
            .map_err(|_| ParseError::malformed(&token.lexeme, "element count", token.location.clone()))
    }

    /// Map a type name to a primitive type or a (yet unresolved) struct
    pub(crate) fn resolve_type_name(name: &str) -> DeclarationType {
        match keyword_kind(name).and_then(TokenKind::primitive_type) {
            Some(primitive) => DeclarationType::Primitive(primitive),
            None => DeclarationType::Struct(StructReference::new(name)),
        }
    }

    /// Path of the module being parsed
    pub fn path(&self) -> &str {
        &self.path
    }
}
