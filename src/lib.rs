//! # Introduction
//!
//! ashl is the front end of a small shading language. It turns shader
//! source into a typed syntax tree of vertex/fragment stage blocks,
//! layout-qualified inputs and outputs, uniform buffers, push constants,
//! structs, functions, statements and expressions.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Raw lexer → Retokenizer → Parser → ModuleNode
//! ```
//!
//! 1. [`parser::lexer`] splits characters into coarse lexemes, drops
//!    comments and keeps decimal numbers together.
//! 2. [`parser::retokenize`] walks the lexemes with grammar context and
//!    emits typed tokens, synthesizing declaration counts and function
//!    headers.
//! 3. [`parser::parse`] builds the [`ModuleNode`] by recursive descent.
//! 4. [`parser::link`] optionally resolves struct-typed declarations to
//!    their definitions.
//!
//! Every stage is fail-fast: the caller gets either a complete tree or the
//! first [`ParseError`], with its source location.
//!
//! Resolving `include` directives, type checking and code generation are
//! left to the consumers of the tree.

pub mod parser;

pub use parser::ast::{ModuleNode, Node, NodeRef, NodeTag, SourceLocation};
pub use parser::error::{ErrorKind, ParseError};
pub use parser::link::StructTable;
pub use parser::parse::Parser;

/// Parse a whole shader module from source text.
///
/// `path` is only used to tag locations and the resulting module.
///
/// ```
/// let module = ashl::parse_source("struct Light { vec3 color; };", "light.ash").unwrap();
/// assert_eq!(module.path, "light.ash");
/// assert_eq!(module.statements.len(), 1);
/// ```
pub fn parse_source(source: &str, path: &str) -> Result<ModuleNode, ParseError> {
    Parser::new(source, path)?.parse_module()
}

/// Same as [`parse_source`] for source already split into lines
pub fn parse_lines<I, S>(lines: I, path: &str) -> Result<ModuleNode, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Parser::from_lines(lines, path)?.parse_module()
}
