//! Property-based tests for the front end.
//!
//! 1. **`consume_till` stops at depth 0**: on any bracket-balanced run the
//!    taken prefix is exactly the tokens before the first depth-0 stop, and
//!    the stop token stays on the buffer
//! 2. **The raw lexer never panics**: arbitrary text either lexes or fails
//!    with a located error
//! 3. **The full pipeline never panics** on mutated shader fragments

use proptest::prelude::*;
use std::sync::Arc;

use super::ast::SourceLocation;
use super::buffer::TokenBuffer;
use super::lexer::preprocess;
use super::parse::Parser;
use super::token::{Token, TokenKind};

// ============================================================================
// Generators
// ============================================================================

/// A bracket-balanced group of token kinds, without commas at its own depth
fn balanced_group() -> impl Strategy<Value = Vec<TokenKind>> {
    let leaf = prop::sample::select(vec![
        TokenKind::Identifier,
        TokenKind::OpAdd,
        TokenKind::OpMultiply,
        TokenKind::Access,
    ])
    .prop_map(|kind| vec![kind]);

    leaf.prop_recursive(4, 32, 6, |inner| {
        (
            prop::sample::select(vec![
                (TokenKind::OpenParen, TokenKind::CloseParen),
                (TokenKind::OpenBracket, TokenKind::CloseBracket),
                (TokenKind::OpenBrace, TokenKind::CloseBrace),
            ]),
            prop::collection::vec(inner, 0..4),
            any::<bool>(),
        )
            .prop_map(|((open, close), children, with_comma)| {
                let mut kinds = vec![open];
                for (i, child) in children.into_iter().enumerate() {
                    if with_comma && i > 0 {
                        kinds.push(TokenKind::Comma);
                    }
                    kinds.extend(child);
                }
                kinds.push(close);
                kinds
            })
    })
}

fn buffer_of(kinds: &[TokenKind]) -> TokenBuffer<Token> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| Token::new(*kind, "", SourceLocation::new(Arc::from("<prop>"), 1, i + 1)))
        .collect()
}

const FRAGMENTS: &[&str] = &[
    "struct Light { vec3 color; float range; };",
    "vertex { layout(location = 0) in vec3 pos; }",
    "fragment { layout(location = 0) out vec4 color; }",
    "vec4[1] main(in vec3 pos, out vec2 uv) { return pos; }",
    "void f() { for (int i = 0; i < 4; i++) { x = x * 2; } }",
    "void f() { if (a < b) { return; } else { a = -b; } }",
    "push_constant(offset = 0) { mat4 model; };",
    "include \"common.ash\";",
    "#define COUNT 4",
    "const float PI = 3.14159;",
];

fn near_valid_source() -> impl Strategy<Value = String> {
    let fragment = prop::sample::select(FRAGMENTS).prop_map(ToString::to_string);
    prop_oneof![
        fragment.clone(),
        // Truncated at a char boundary
        (fragment.clone(), any::<prop::sample::Index>()).prop_map(|(s, cut)| {
            let at = cut.index(s.len() + 1);
            let at = (0..=at).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0);
            s[..at].to_string()
        }),
        (fragment.clone(), fragment).prop_map(|(a, b)| format!("{a}\n{b}")),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn consume_till_takes_prefix_before_depth_zero_stop(
        groups in prop::collection::vec(balanced_group(), 0..5),
        tail in prop::collection::vec(balanced_group(), 0..3),
    ) {
        let prefix: Vec<TokenKind> = groups.into_iter().flatten().collect();
        let mut kinds = prefix.clone();
        kinds.push(TokenKind::Comma);
        kinds.extend(tail.into_iter().flatten());

        let mut buffer = buffer_of(&kinds);
        let run = buffer.consume_till(0, &[TokenKind::Comma]);

        let taken: Vec<TokenKind> = run.iter().map(|t| t.kind).collect();
        prop_assert_eq!(taken, prefix);
        prop_assert_eq!(buffer.front_kind(), Some(TokenKind::Comma));
        prop_assert_eq!(run.len() + buffer.len(), kinds.len());
    }

    #[test]
    fn lexer_never_panics(source in "\\PC{0,200}") {
        let _ = preprocess(&source, "<prop>");
    }

    #[test]
    fn lexer_errors_are_located(source in "[a-z /*\"'\n]{0,80}") {
        if let Err(err) = preprocess(&source, "<prop>") {
            prop_assert!(err.location().is_some());
        }
    }

    #[test]
    fn pipeline_never_panics(source in near_valid_source()) {
        let _ = Parser::new(&source, "<prop>").and_then(|mut parser| parser.parse_module());
    }
}
