//! Retokenizer: second lexing pass
//!
//! Re-walks the raw lexemes with grammar context and emits typed [`Token`]s.
//! The output is shaped so the parser never needs more than one token of
//! lookahead past a bracket:
//!
//! - every declaration becomes `[const] [qualifier] type [{ fields }] name count`
//!   where `count` is a synthesized [`TokenKind::DeclarationCount`]
//!   (`1` scalar, `0` unsized, `n` array);
//! - every function header becomes `Function(return type) ReturnArity name ( args )`;
//! - the `)` of a `for` header is replaced by a `;`, so all three clauses end
//!   the same way;
//! - adjacent symbol lexemes are merged into multi-character operators.
//!
//! # Grammar
//!
//! ```text
//! root        ::= (include | layout | define | push_constant | struct
//!                 | const_def | function | stage_scope)*
//! stage_scope ::= ("vertex" | "fragment") "{" stage_item* "}"
//! layout      ::= "layout" tags qualifier* declaration ";"
//! tags        ::= "(" (tag ("," tag)* ","?)? ")"
//! tag         ::= name ("=" name)?
//! function    ::= type ("[" n "]")? name "(" (argument ("," argument)*)? ")" scope
//! scope       ::= "{" (scope | "return" statement | for | if | statement)* "}"
//! ```

use super::ast::SourceLocation;
use super::buffer::TokenBuffer;
use super::error::ParseError;
use super::lexer::Lexer;
use super::token::{keyword_kind, Lexeme, RawToken, Token, TokenKind};
use tracing::{debug, instrument, trace};

type RawBuffer = TokenBuffer<RawToken>;

/// Tokenize `source` through both lexing passes
#[instrument(skip_all, fields(path = %path))]
pub fn tokenize(source: &str, path: &str) -> Result<TokenBuffer<Token>, ParseError> {
    let raw = Lexer::new(source, path).tokenize()?;
    Retokenizer::new().run(raw)
}

/// Tokenize already-split source lines through both lexing passes
#[instrument(skip_all, fields(path = %path))]
pub fn tokenize_lines<I, S>(lines: I, path: &str) -> Result<TokenBuffer<Token>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let raw = Lexer::from_lines(lines, path).tokenize()?;
    Retokenizer::new().run(raw)
}

/// Grammar-aware second pass over the raw lexemes
#[derive(Default)]
pub struct Retokenizer {
    output: TokenBuffer<Token>,
}

impl Retokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retokenize a whole module
    pub fn run(mut self, mut input: RawBuffer) -> Result<TokenBuffer<Token>, ParseError> {
        self.root(&mut input)?;
        debug!(count = self.output.len(), "retokenizing finished");
        Ok(self.output)
    }

    // ===== Helper methods =====

    fn emit(&mut self, token: Token) {
        self.output.insert_back(token);
    }

    /// Move the front token to the output if it has one of `kinds`
    fn pass(&mut self, input: &mut RawBuffer, kinds: &[TokenKind]) -> Result<(), ParseError> {
        let token = input.take_front(kinds)?;
        self.emit(Token::from_raw(token));
        Ok(())
    }

    fn emit_identifier(&mut self, raw: RawToken) {
        self.emit(Token::with_kind(TokenKind::Identifier, raw));
    }

    /// Take the front token as a name (an unclassified lexeme)
    fn take_name(input: &mut RawBuffer) -> Result<RawToken, ParseError> {
        input.take_front(&[TokenKind::Unknown])
    }

    /// Take the front token as a type: a primitive type keyword or a name
    fn take_type(input: &mut RawBuffer) -> Result<RawToken, ParseError> {
        let front = input.front()?;
        let kind = front.kind();
        if kind.is_type() || kind == TokenKind::Unknown {
            input.remove_front()
        } else {
            Err(ParseError::unrecognized(
                kind,
                "where a type was expected",
                front.location().clone(),
            ))
        }
    }

    fn type_token(raw: RawToken) -> Token {
        match raw.kind() {
            TokenKind::Unknown => Token::with_kind(TokenKind::Identifier, raw),
            _ => Token::from_raw(raw),
        }
    }

    /// Optional `[n]` / `[]` suffix; returns the count lexeme and its location
    fn element_count(
        input: &mut RawBuffer,
        default_location: &SourceLocation,
    ) -> Result<(String, SourceLocation), ParseError> {
        if !input.front_is(TokenKind::OpenBracket) {
            return Ok(("1".to_string(), default_location.clone()));
        }
        let open = input.remove_front()?;
        let count = if input.front_is(TokenKind::CloseBracket) {
            ("0".to_string(), open.location)
        } else {
            let token = input.remove_front()?;
            (token.text, token.location)
        };
        input.take_front(&[TokenKind::CloseBracket])?;
        Ok(count)
    }

    fn emit_count(&mut self, kind: TokenKind, (count, location): (String, SourceLocation)) {
        self.emit(Token::new(kind, count, location));
    }

    fn is_type_start(kind: TokenKind) -> bool {
        kind.is_type() || kind == TokenKind::Unknown
    }

    fn before(input: &RawBuffer, kind: TokenKind) -> bool {
        input.front_kind().is_some_and(|k| k != kind)
    }

    /// Drop the `,` after a list item; otherwise the list must close here
    fn list_separator(input: &mut RawBuffer) -> Result<(), ParseError> {
        let next = input.expect_front(&[TokenKind::Comma, TokenKind::CloseParen])?.kind();
        if next == TokenKind::Comma {
            input.remove_front()?;
        }
        Ok(())
    }

    // ===== Module level =====

    fn root(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        while let Some(kind) = input.front_kind() {
            match kind {
                TokenKind::Include => self.include(input)?,
                TokenKind::Layout => self.layout(input)?,
                TokenKind::Define => self.define(input)?,
                TokenKind::PushConstant => self.push_constant(input)?,
                TokenKind::TypeStruct => self.struct_definition(input)?,
                TokenKind::Const => self.const_definition(input)?,
                TokenKind::VertexScope | TokenKind::FragmentScope => self.named_scope(input)?,
                k if Self::is_type_start(k) => self.function(input)?,
                _ => {
                    return Err(ParseError::unrecognized(
                        kind,
                        "at top level",
                        input.front()?.location().clone(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn named_scope(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("stage scope");
        self.pass(input, &[TokenKind::VertexScope, TokenKind::FragmentScope])?;
        self.pass(input, &[TokenKind::OpenBrace])?;

        while let Some(kind) = input.front_kind().filter(|k| *k != TokenKind::CloseBrace) {
            match kind {
                TokenKind::Layout => self.layout(input)?,
                TokenKind::Define => self.define(input)?,
                TokenKind::PushConstant => self.push_constant(input)?,
                TokenKind::Include => self.include(input)?,
                TokenKind::TypeStruct => self.struct_definition(input)?,
                TokenKind::Const => self.const_definition(input)?,
                k if Self::is_type_start(k) => self.function(input)?,
                _ => {
                    return Err(ParseError::unrecognized(
                        kind,
                        "in stage scope",
                        input.front()?.location().clone(),
                    ))
                }
            }
        }

        self.pass(input, &[TokenKind::CloseBrace])
    }

    /// `include "file"` with an optional trailing `;`
    fn include(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        self.pass(input, &[TokenKind::Include])?;
        let mut file = input.take_front(&[TokenKind::StringLiteral])?;
        file.text = file
            .text
            .trim_start_matches('\'')
            .trim_end_matches('\'')
            .trim()
            .to_string();
        self.emit_identifier(file);
        if input.front_is(TokenKind::StatementEnd) {
            input.remove_front()?;
        }
        Ok(())
    }

    /// `#define NAME value`, passed through untouched
    fn define(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        self.pass(input, &[TokenKind::Define])?;
        let name = Self::take_name(input)?;
        self.emit_identifier(name);
        let value = input.remove_front()?;
        self.emit(Self::type_token(value));
        Ok(())
    }

    /// `const type name = value;`
    fn const_definition(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("const definition");
        self.declaration(input)?;
        self.pass(input, &[TokenKind::Assign])?;
        self.statement(input)
    }

    fn struct_definition(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("struct definition");
        self.pass(input, &[TokenKind::TypeStruct])?;
        let name = Self::take_name(input)?;
        self.emit_identifier(name);
        self.struct_body(input)?;
        input.take_front(&[TokenKind::StatementEnd])?;
        Ok(())
    }

    /// `{ declaration; ... }` with at least one field
    fn struct_body(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        self.pass(input, &[TokenKind::OpenBrace])?;
        if input.front_is(TokenKind::CloseBrace) {
            let front = input.front()?;
            return Err(ParseError::unrecognized(
                front.kind(),
                "where a field declaration was expected",
                front.location().clone(),
            ));
        }

        while Self::before(input, TokenKind::CloseBrace) {
            self.declaration(input)?;
            self.pass(input, &[TokenKind::StatementEnd])?;
        }

        self.pass(input, &[TokenKind::CloseBrace])
    }

    /// `(tag, tag = value, ...)`; each tag is emitted as a name/value pair
    fn tags(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        self.pass(input, &[TokenKind::OpenParen])?;

        while Self::before(input, TokenKind::CloseParen) {
            let tag = Self::take_name(input)?;
            let value = if input.front_is(TokenKind::Assign) {
                input.remove_front()?;
                Self::take_name(input)?
            } else {
                tag.clone()
            };
            self.emit_identifier(tag);
            self.emit_identifier(value);
            Self::list_separator(input)?;
        }

        self.pass(input, &[TokenKind::CloseParen])
    }

    fn layout(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("layout");
        self.pass(input, &[TokenKind::Layout])?;
        self.tags(input)?;
        while matches!(
            input.front_kind(),
            Some(TokenKind::DataIn | TokenKind::DataOut | TokenKind::Uniform | TokenKind::ReadOnly)
        ) {
            let qualifier = input.remove_front()?;
            self.emit(Token::from_raw(qualifier));
        }
        self.declaration(input)?;
        self.pass(input, &[TokenKind::StatementEnd])
    }

    fn push_constant(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("push constant");
        self.pass(input, &[TokenKind::PushConstant])?;
        self.tags(input)?;
        self.struct_body(input)?;
        self.pass(input, &[TokenKind::StatementEnd])
    }

    // ===== Declarations and functions =====

    fn declaration(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        if input.front_is(TokenKind::Const) {
            self.pass(input, &[TokenKind::Const])?;
        }
        if matches!(
            input.front_kind(),
            Some(TokenKind::DataIn | TokenKind::DataOut | TokenKind::ReadOnly)
        ) {
            let qualifier = input.remove_front()?;
            self.emit(Token::from_raw(qualifier));
        }

        let ty = Self::take_type(input)?;
        let is_buffer = ty.kind() == TokenKind::TypeBuffer;
        let type_name = ty.clone();
        self.emit(Self::type_token(ty));

        if is_buffer {
            // buffer name { fields }
            let name = Self::take_name(input)?;
            if input.front_is(TokenKind::OpenBrace) {
                self.struct_body(input)?;
            }
            let location = name.location.clone();
            self.emit_identifier(name);
            self.emit_count(TokenKind::DeclarationCount, ("1".to_string(), location));
            return Ok(());
        }

        let has_body = input.front_is(TokenKind::OpenBrace);
        if has_body {
            self.struct_body(input)?;
        }

        // A block with no instance name is named after its type
        let name = if has_body && !input.front_is(TokenKind::Unknown) {
            type_name
        } else {
            Self::take_name(input)?
        };
        let count = Self::element_count(input, &name.location)?;
        self.emit_identifier(name);
        self.emit_count(TokenKind::DeclarationCount, count);
        Ok(())
    }

    /// `[in|out] type [n]? name [n]?`
    fn function_argument(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        if matches!(
            input.front_kind(),
            Some(TokenKind::DataIn | TokenKind::DataOut)
        ) {
            let direction = input.remove_front()?;
            self.emit(Token::from_raw(direction));
        }

        let ty = Self::take_type(input)?;
        let type_count = input
            .front_is(TokenKind::OpenBracket)
            .then(|| Self::element_count(input, &ty.location))
            .transpose()?;
        let name = Self::take_name(input)?;
        let count = match type_count {
            Some(count) => count,
            None => Self::element_count(input, &name.location)?,
        };

        self.emit(Self::type_token(ty));
        self.emit_identifier(name);
        self.emit_count(TokenKind::DeclarationCount, count);
        Ok(())
    }

    fn function(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("function");
        let ty = Self::take_type(input)?;
        let arity = Self::element_count(input, &ty.location)?;
        let name = Self::take_name(input)?;

        self.emit(Token::with_kind(TokenKind::Function, ty));
        self.emit_count(TokenKind::ReturnArity, arity);
        self.emit_identifier(name);

        self.pass(input, &[TokenKind::OpenParen])?;
        while Self::before(input, TokenKind::CloseParen) {
            self.function_argument(input)?;
            Self::list_separator(input)?;
        }
        self.pass(input, &[TokenKind::CloseParen])?;

        self.scope(input)
    }

    // ===== Statements =====

    fn scope(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        self.pass(input, &[TokenKind::OpenBrace])?;

        while let Some(kind) = input.front_kind().filter(|k| *k != TokenKind::CloseBrace) {
            match kind {
                TokenKind::OpenBrace => self.scope(input)?,
                TokenKind::Return => {
                    self.pass(input, &[TokenKind::Return])?;
                    self.statement(input)?;
                }
                TokenKind::For => self.for_loop(input)?,
                TokenKind::If => self.if_chain(input)?,
                _ => self.statement(input)?,
            }
        }

        self.pass(input, &[TokenKind::CloseBrace])
    }

    /// Everything up to the next depth-0 `;`, plus the `;`
    fn statement(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        let mut run = input.consume_till(0, &[TokenKind::StatementEnd]);
        let end = input.take_front(&[TokenKind::StatementEnd])?;
        self.expression(&mut run)?;
        self.emit(Token::from_raw(end));
        Ok(())
    }

    fn for_loop(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("for loop");
        self.pass(input, &[TokenKind::For])?;
        self.pass(input, &[TokenKind::OpenParen])?;

        for _ in 0..2 {
            let mut clause = input.consume_till(0, &[TokenKind::StatementEnd]);
            let end = input.take_front(&[TokenKind::StatementEnd])?;
            self.expression(&mut clause)?;
            self.emit(Token::from_raw(end));
        }

        let mut update = input.consume_till(1, &[TokenKind::CloseParen]);
        let close = input.take_front(&[TokenKind::CloseParen])?;
        self.expression(&mut update)?;
        self.emit(Token::new(TokenKind::StatementEnd, ";", close.location));

        self.scope(input)
    }

    fn if_chain(&mut self, input: &mut RawBuffer) -> Result<(), ParseError> {
        trace!("if");
        self.pass(input, &[TokenKind::If])?;
        self.pass(input, &[TokenKind::OpenParen])?;

        let mut condition = input.consume_till(1, &[TokenKind::CloseParen]);
        let close = input.take_front(&[TokenKind::CloseParen])?;
        self.expression(&mut condition)?;
        self.emit(Token::from_raw(close));

        self.scope(input)?;

        if input.front_is(TokenKind::Else) {
            self.pass(input, &[TokenKind::Else])?;
            let next = input.expect_front(&[TokenKind::OpenBrace, TokenKind::If])?.kind();
            match next {
                TokenKind::If => self.if_chain(input)?,
                _ => self.scope(input)?,
            }
        }
        Ok(())
    }

    /// Retokenize an expression run (which may start with a declaration)
    fn expression(&mut self, run: &mut RawBuffer) -> Result<(), ParseError> {
        while let Some(kind) = run.front_kind() {
            if Self::is_type_start(kind) && run.second_kind() == Some(TokenKind::Unknown) {
                self.declaration(run)?;
                continue;
            }

            let first = run.remove_front()?;
            if let Some(merged) = Self::merge_operator(&first, run.front().ok()) {
                run.remove_front()?;
                self.emit(merged);
                continue;
            }

            self.emit(Self::type_token(first));
        }
        Ok(())
    }

    /// Two adjacent symbol lexemes that spell a known operator
    fn merge_operator(first: &RawToken, second: Option<&RawToken>) -> Option<Token> {
        let second = second?;
        if !first.kind().is_symbol() || !second.kind().is_symbol() {
            return None;
        }
        let adjacent = first.location.line == second.location.line
            && first.location.column + first.text.chars().count() == second.location.column;
        if !adjacent {
            return None;
        }

        let text = format!("{}{}", first.text, second.text);
        let kind = keyword_kind(&text)?;
        Some(Token::new(kind, text, first.location.clone()))
    }
}
