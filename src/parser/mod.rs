//! Shader source front end
//!
//! This module transforms shader source text into a syntax tree in three
//! passes:
//! - [`lexer`]: raw lexing (characters → coarse lexemes), over a [`source`] cursor
//! - [`retokenize`]: grammar-aware retokenization (lexemes → typed [`token`]s)
//! - [`parse`]: recursive descent parsing (tokens → [`ast`])
//!
//! Every pass reads from and writes to a [`buffer::TokenBuffer`] and fails on
//! the first [`error::ParseError`]. [`link`] is an optional pass over a
//! finished tree.
//!
//! # Supported language
//!
//! - Stage scopes: `vertex { ... }`, `fragment { ... }`
//! - Layouts with tags and directions, push constants, uniform buffers
//! - Structs, functions with `in`/`out` arguments and array return types
//! - Statements: declarations, `const`, `return`, `for`, `if`/`else`
//! - Expressions: arithmetic, comparison, logical, `++`/`--`, calls,
//!   member access, indexing and array literals
//! - `include "name"` and `#define NAME value`, kept as unresolved nodes
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser. No external parser generator
//! dependencies.

pub mod ast;
pub mod buffer;
mod declarations;
pub mod error;
mod expressions;
pub mod lexer;
pub mod link;
pub mod parse;
pub mod retokenize;
pub mod source;
mod statements;
pub mod token;

#[cfg(test)]
mod property_tests;
