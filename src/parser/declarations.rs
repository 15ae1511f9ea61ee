//! Declaration parsing implementation
//!
//! This module handles the declaration-shaped constructs of a shader module:
//!
//! - Typed declarations: `type [{ fields }] name count`
//! - Struct definitions: `struct Name { fields }`
//! - Function definitions: `Function(type) arity name ( args ) { ... }`
//! - Layouts and push constants with their tag lists
//! - `include` and `#define`
//!
//! # Grammar
//!
//! ```text
//! declaration   ::= "const"? ("in" | "out" | "readonly")? type struct_body? identifier count
//! struct_body   ::= "{" (declaration ";")+ "}"
//! struct_def    ::= "struct" identifier struct_body
//! function_def  ::= function arity identifier "(" argument* ")" scope
//! argument      ::= ("in" | "out")? declaration
//! layout        ::= "layout" tags qualifier+ declaration ";"
//! push_constant ::= "push_constant" tags struct_body ";"
//! tags          ::= "(" (identifier identifier)* ")"
//! ```
//!
//! All parsing routines are `pub(crate)` associated functions on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::error::ParseError;
use crate::parser::parse::{Parser, Tokens};
use crate::parser::token::TokenKind;
use rustc_hash::FxHashMap;
use tracing::trace;

impl Parser {
    /// Parse a declaration as emitted by the retokenizer
    pub(crate) fn parse_declaration(input: &mut Tokens) -> Result<DeclarationNode, ParseError> {
        let location = input.front()?.location.clone();
        let is_const = input.front_is(TokenKind::Const);
        if is_const {
            input.remove_front()?;
        }
        let qualifier = match input.front_kind() {
            Some(TokenKind::DataIn) => Some(DeclarationQualifier::In),
            Some(TokenKind::DataOut) => Some(DeclarationQualifier::Out),
            Some(TokenKind::ReadOnly) => Some(DeclarationQualifier::ReadOnly),
            _ => None,
        };
        if qualifier.is_some() {
            input.remove_front()?;
        }

        let type_token = input.remove_front()?;
        let ty = match type_token.kind {
            TokenKind::Identifier => DeclarationType::Struct(StructReference::new(type_token.lexeme)),
            kind => match kind.primitive_type() {
                Some(primitive) => DeclarationType::Primitive(primitive),
                None => {
                    return Err(ParseError::unrecognized(
                        kind,
                        "where a type was expected",
                        type_token.location,
                    ))
                }
            },
        };

        let body = if input.front_is(TokenKind::OpenBrace) {
            Some(Self::parse_struct_body(input)?)
        } else {
            None
        };

        let (name, _) = Self::expect_identifier(input)?;
        let count = Self::expect_front(input, TokenKind::DeclarationCount)?;
        let element_count = Self::parse_count(&count)?;

        Ok(DeclarationNode {
            is_const,
            qualifier,
            ty,
            name,
            element_count,
            body,
            location,
        })
    }

    /// Parse `{ declaration; ... }`
    pub(crate) fn parse_struct_body(input: &mut Tokens) -> Result<Vec<DeclarationNode>, ParseError> {
        Self::expect_front(input, TokenKind::OpenBrace)?;

        let mut fields = Vec::new();
        while Self::front_before(input, TokenKind::CloseBrace).is_some() {
            fields.push(Self::parse_declaration(input)?);
            Self::expect_front(input, TokenKind::StatementEnd)?;
        }

        Self::expect_front(input, TokenKind::CloseBrace)?;
        Ok(fields)
    }

    /// Parse struct definition: struct Name { fields }
    pub(crate) fn parse_struct(input: &mut Tokens) -> Result<StructNode, ParseError> {
        let keyword = Self::expect_front(input, TokenKind::TypeStruct)?;
        let (name, _) = Self::expect_identifier(input)?;
        trace!(%name, "struct");
        let fields = Self::parse_struct_body(input)?;

        Ok(StructNode {
            name,
            fields,
            location: keyword.location,
        })
    }

    /// Parse a function definition.
    ///
    /// The return declaration keeps the header's type and arity with an
    /// empty name.
    pub(crate) fn parse_function(input: &mut Tokens) -> Result<FunctionNode, ParseError> {
        let header = Self::expect_front(input, TokenKind::Function)?;
        let arity = Self::expect_front(input, TokenKind::ReturnArity)?;
        let (name, _) = Self::expect_identifier(input)?;
        trace!(%name, "function");

        let return_declaration = DeclarationNode {
            is_const: false,
            qualifier: None,
            ty: Self::resolve_type_name(&header.lexeme),
            name: String::new(),
            element_count: Self::parse_count(&arity)?,
            body: None,
            location: header.location.clone(),
        };

        Self::expect_front(input, TokenKind::OpenParen)?;
        let mut arguments = Vec::new();
        while Self::front_before(input, TokenKind::CloseParen).is_some() {
            arguments.push(Self::parse_function_argument(input)?);
        }
        Self::expect_front(input, TokenKind::CloseParen)?;

        let body = Self::parse_scope(input)?;

        Ok(FunctionNode {
            name,
            return_declaration,
            arguments,
            body,
            location: header.location,
        })
    }

    /// `[in|out] declaration`; arguments without a direction are inputs
    fn parse_function_argument(input: &mut Tokens) -> Result<FunctionArgumentNode, ParseError> {
        let direction = match input.front_kind() {
            Some(TokenKind::DataOut) => {
                input.remove_front()?;
                ArgumentDirection::Out
            }
            Some(TokenKind::DataIn) => {
                input.remove_front()?;
                ArgumentDirection::In
            }
            _ => ArgumentDirection::In,
        };

        Ok(FunctionArgumentNode {
            direction,
            declaration: Self::parse_declaration(input)?,
        })
    }

    /// Parse `( key value key value ... )`
    fn parse_tags(input: &mut Tokens) -> Result<FxHashMap<String, String>, ParseError> {
        Self::expect_front(input, TokenKind::OpenParen)?;

        let mut tags = FxHashMap::default();
        while Self::front_before(input, TokenKind::CloseParen).is_some() {
            let (key, location) = Self::expect_identifier(input)?;
            let (value, _) = Self::expect_identifier(input)?;
            if tags.contains_key(&key) {
                return Err(ParseError::unrecognized(
                    TokenKind::Identifier,
                    "repeated in a tag list",
                    location,
                ));
            }
            tags.insert(key, value);
        }

        Self::expect_front(input, TokenKind::CloseParen)?;
        Ok(tags)
    }

    pub(crate) fn parse_layout(input: &mut Tokens) -> Result<LayoutNode, ParseError> {
        let keyword = Self::expect_front(input, TokenKind::Layout)?;
        let tags = Self::parse_tags(input)?;

        let mut direction = None;
        let mut read_only = false;
        loop {
            let front = input.front()?;
            let (kind, location) = (front.kind, front.location.clone());
            let next = match kind {
                TokenKind::DataIn => Some(LayoutDirection::In),
                TokenKind::DataOut => Some(LayoutDirection::Out),
                TokenKind::Uniform => Some(LayoutDirection::Uniform),
                TokenKind::ReadOnly if !read_only => {
                    read_only = true;
                    None
                }
                TokenKind::ReadOnly => {
                    return Err(ParseError::unrecognized(kind, "repeated in a layout", location));
                }
                _ => break,
            };
            if next.is_some() {
                if direction.is_some() {
                    return Err(ParseError::unrecognized(kind, "after a layout direction", location));
                }
                direction = next;
            }
            input.remove_front()?;
        }

        let direction = match direction {
            Some(direction) => direction,
            None => {
                let front = input.front()?;
                return Err(ParseError::unexpected_kind(
                    &[TokenKind::DataIn, TokenKind::DataOut, TokenKind::Uniform],
                    front.kind,
                    front.location.clone(),
                ));
            }
        };

        let declaration = Self::parse_declaration(input)?;
        Self::expect_front(input, TokenKind::StatementEnd)?;
        trace!(name = %declaration.name, ?direction, "layout");

        Ok(LayoutNode {
            tags,
            direction,
            read_only,
            declaration,
            location: keyword.location,
        })
    }

    pub(crate) fn parse_push_constant(input: &mut Tokens) -> Result<PushConstantNode, ParseError> {
        let keyword = Self::expect_front(input, TokenKind::PushConstant)?;
        let tags = Self::parse_tags(input)?;
        let fields = Self::parse_struct_body(input)?;
        Self::expect_front(input, TokenKind::StatementEnd)?;

        Ok(PushConstantNode {
            tags,
            fields,
            location: keyword.location,
        })
    }

    /// `include name`; `file` records the including module
    pub(crate) fn parse_include(input: &mut Tokens) -> Result<IncludeNode, ParseError> {
        let keyword = Self::expect_front(input, TokenKind::Include)?;
        let (name, _) = Self::expect_identifier(input)?;

        Ok(IncludeNode {
            file: keyword.location.file.to_string(),
            name,
            location: keyword.location,
        })
    }

    pub(crate) fn parse_define(input: &mut Tokens) -> Result<DefineNode, ParseError> {
        let keyword = Self::expect_front(input, TokenKind::Define)?;
        let (name, _) = Self::expect_identifier(input)?;
        let value = input.remove_front()?;

        Ok(DefineNode {
            name,
            value: value.lexeme,
            location: keyword.location,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::error::ErrorKind;
    use crate::parser::parse::Parser;
    use crate::parser::retokenize::tokenize;
    use crate::parser::token::TokenKind;

    fn parse(source: &str) -> ModuleNode {
        Parser::new(source, "test.ash").unwrap().parse_module().unwrap()
    }

    #[test]
    fn test_parse_struct() {
        let module = parse("struct Vertex { vec3 position; vec2 uv; float weights[4]; };");
        match &module.statements[0] {
            Node::Struct(s) => {
                assert_eq!(s.name, "Vertex");
                let fields: Vec<_> = s
                    .fields
                    .iter()
                    .map(|f| (f.name.as_str(), f.primitive(), f.element_count))
                    .collect();
                assert_eq!(
                    fields,
                    [
                        ("position", Some(PrimitiveType::Vec3f), 1),
                        ("uv", Some(PrimitiveType::Vec2f), 1),
                        ("weights", Some(PrimitiveType::Float), 4),
                    ]
                );
            }
            _ => panic!("Expected struct definition"),
        }
    }

    #[test]
    fn test_parse_function_shape() {
        let module = parse("vec4[1] main(in vec3 pos, out vec2 uv) { return pos; }");
        match &module.statements[0] {
            Node::Function(f) => {
                assert_eq!(f.name, "main");
                assert_eq!(f.return_declaration.element_count, 1);
                assert_eq!(f.return_declaration.primitive(), Some(PrimitiveType::Vec4f));
                assert_eq!(f.arguments.len(), 2);
                assert_eq!(f.arguments[0].direction, ArgumentDirection::In);
                assert_eq!(f.arguments[0].declaration.name, "pos");
                assert_eq!(f.arguments[1].direction, ArgumentDirection::Out);
                assert_eq!(f.arguments[1].declaration.primitive(), Some(PrimitiveType::Vec2f));
                assert_eq!(f.body.statements.len(), 1);
                assert!(matches!(f.body.statements[0], Node::Return(_)));
            }
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_struct_return_type() {
        let module = parse("Light make() { }");
        match &module.statements[0] {
            Node::Function(f) => {
                let reference = f.return_declaration.struct_reference().unwrap();
                assert_eq!(reference.name, "Light");
                assert!(f.arguments.is_empty());
            }
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_parse_layout_tags_and_direction() {
        let module = parse("layout(set = 1, binding = 2, scalar) uniform readonly buffer Lights { vec4 color; };");
        match &module.statements[0] {
            Node::Layout(layout) => {
                assert_eq!(layout.direction, LayoutDirection::Uniform);
                assert!(layout.read_only);
                assert_eq!(layout.tags.get("set").map(String::as_str), Some("1"));
                assert_eq!(layout.tags.get("binding").map(String::as_str), Some("2"));
                assert_eq!(layout.tags.get("scalar").map(String::as_str), Some("scalar"));
                assert_eq!(layout.declaration.primitive(), Some(PrimitiveType::Buffer));
                assert_eq!(layout.declaration.name, "Lights");
                assert_eq!(layout.declaration.body.as_ref().map(Vec::len), Some(1));
            }
            _ => panic!("Expected layout"),
        }
    }

    #[test]
    fn test_unsized_sampler_array() {
        let module = parse("layout(set = 0, binding = 0) uniform sampler2D TEXTURES[];");
        match &module.statements[0] {
            Node::Layout(layout) => {
                assert_eq!(layout.declaration.element_count, 0);
                assert_eq!(layout.declaration.primitive(), Some(PrimitiveType::Sampler2D));
            }
            _ => panic!("Expected layout"),
        }
    }

    #[test]
    fn test_layout_without_direction() {
        let err = Parser::new("layout(location = 0) vec3 pos;", "test.ash")
            .unwrap()
            .parse_module()
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedKind { .. }));
    }

    #[test]
    fn test_parse_push_constant() {
        let module = parse("push_constant(offset = 0) { mat4 model; int index; };");
        match &module.statements[0] {
            Node::PushConstant(p) => {
                assert_eq!(p.tags.len(), 1);
                assert_eq!(p.fields.len(), 2);
                assert_eq!(p.fields[1].primitive(), Some(PrimitiveType::Int));
            }
            _ => panic!("Expected push constant"),
        }
    }

    #[test]
    fn test_parse_include_and_define() {
        let module = parse("include \"common.ash\";\n#define MAX_LIGHTS 16");
        match &module.statements[0] {
            Node::Include(include) => {
                assert_eq!(include.name, "common.ash");
                assert_eq!(include.file, "test.ash");
            }
            _ => panic!("Expected include"),
        }
        match &module.statements[1] {
            Node::Define(define) => {
                assert_eq!(define.name, "MAX_LIGHTS");
                assert_eq!(define.value, "16");
                assert_eq!(define.location.line, 2);
            }
            _ => panic!("Expected define"),
        }
    }

    #[test]
    fn test_struct_field_qualifiers() {
        let module = parse("struct A { readonly float x; const int n; out vec4 c; vec2 uv; };");
        match &module.statements[0] {
            Node::Struct(s) => {
                let fields: Vec<_> = s
                    .fields
                    .iter()
                    .map(|f| (f.name.as_str(), f.is_const, f.qualifier))
                    .collect();
                assert_eq!(
                    fields,
                    [
                        ("x", false, Some(DeclarationQualifier::ReadOnly)),
                        ("n", true, None),
                        ("c", false, Some(DeclarationQualifier::Out)),
                        ("uv", false, None),
                    ]
                );
                assert_eq!(s.fields[0].primitive(), Some(PrimitiveType::Float));
                assert_eq!(s.fields[0].location.column, 12);
            }
            _ => panic!("Expected struct definition"),
        }
    }

    #[test]
    fn test_struct_from_token_buffer() {
        let mut tokens = tokenize("struct Ray { in vec3 dir; };", "test.ash").unwrap();
        let node = Parser::parse_struct(&mut tokens).unwrap();
        assert!(tokens.is_empty());
        assert_eq!(node.name, "Ray");
        assert_eq!(node.fields[0].qualifier, Some(DeclarationQualifier::In));
    }

    #[test]
    fn test_const_qualified_field() {
        let module = parse("struct A { const readonly float limit; };");
        match &module.statements[0] {
            Node::Struct(s) => {
                assert!(s.fields[0].is_const);
                assert_eq!(s.fields[0].qualifier, Some(DeclarationQualifier::ReadOnly));
                assert_eq!(s.fields[0].name, "limit");
            }
            _ => panic!("Expected struct definition"),
        }
    }

    #[test]
    fn test_repeated_layout_tag() {
        let err = Parser::new("layout(binding = 0, binding = 1) uniform sampler2D tex;", "test.ash")
            .and_then(|mut p| p.parse_module())
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnrecognizedConstruct { found: TokenKind::Identifier, .. }
        ));
        assert_eq!(err.location().map(|l| (l.line, l.column)), Some((1, 21)));
    }

    #[test]
    fn test_second_layout_direction() {
        let err = Parser::new("layout(location = 0) in out vec3 p;", "test.ash")
            .and_then(|mut p| p.parse_module())
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnrecognizedConstruct { found: TokenKind::DataOut, .. }
        ));
        assert_eq!(err.location().map(|l| l.column), Some(25));

        let err = Parser::new("layout(set = 0) uniform readonly readonly buffer B { int x; };", "test.ash")
            .and_then(|mut p| p.parse_module())
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnrecognizedConstruct { found: TokenKind::ReadOnly, .. }
        ));
    }

    #[test]
    fn test_malformed_element_count() {
        let err = Parser::new("struct A { float x[N]; };", "test.ash")
            .unwrap()
            .parse_module()
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::MalformedLiteral { ref lexeme, .. } if lexeme == "N"
        ));
    }
}
