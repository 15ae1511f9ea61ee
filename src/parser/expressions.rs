//! Expression parsing implementation
//!
//! This module handles parsing of shader expressions by recursive descent,
//! one method per precedence level.
//!
//! # Supported Expressions
//!
//! - Literals: integers and floats
//! - Identifiers, including type names used as constructors (`vec3(...)`)
//! - Declarations and `const` declarations in expression position
//! - Binary operators: logical, comparison, arithmetic
//! - Prefix: `-`, `++`, `--`
//! - Postfix: `.`, `[]`, `()`, `++`, `--`
//! - Parenthesized expressions and `{ ... }` array literals
//!
//! # Precedence
//!
//! Loosest to tightest: assignment (right-associative), logical, comparison,
//! additive, multiplicative, access/postfix, primary. Every binary level
//! folds to the left.
//!
//! All parsing routines are `pub(crate)` associated functions on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::error::ParseError;
use crate::parser::parse::{Parser, Tokens};
use crate::parser::token::{Token, TokenKind};

const LOGICAL_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::OpAnd, BinaryOp::And),
    (TokenKind::OpOr, BinaryOp::Or),
    (TokenKind::OpNot, BinaryOp::Not),
];

const COMPARISON_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::OpEqual, BinaryOp::Eq),
    (TokenKind::OpNotEqual, BinaryOp::Ne),
    (TokenKind::OpLess, BinaryOp::Lt),
    (TokenKind::OpLessEqual, BinaryOp::Le),
    (TokenKind::OpGreater, BinaryOp::Gt),
    (TokenKind::OpGreaterEqual, BinaryOp::Ge),
];

const ADDITIVE_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::OpAdd, BinaryOp::Add),
    (TokenKind::OpSubtract, BinaryOp::Sub),
];

const MULTIPLICATIVE_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::OpMultiply, BinaryOp::Mul),
    (TokenKind::OpDivide, BinaryOp::Div),
    (TokenKind::OpMod, BinaryOp::Mod),
];

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(input: &mut Tokens) -> Result<Node, ParseError> {
        Self::parse_assignment(input)
    }

    /// Parse a whole run as one expression; leftover tokens are an error
    pub(crate) fn parse_expression_run(run: &mut Tokens) -> Result<Node, ParseError> {
        let expression = Self::parse_expression(run)?;
        Self::finish_run(run, "after expression")?;
        Ok(expression)
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(input: &mut Tokens) -> Result<Node, ParseError> {
        let target = Self::parse_logical(input)?;

        if input.front_is(TokenKind::Assign) {
            let operator = input.remove_front()?;
            let value = Self::parse_assignment(input)?;
            return Ok(Node::Assign(AssignNode {
                target: Box::new(target),
                value: Box::new(value),
                location: operator.location,
            }));
        }

        Ok(target)
    }

    /// Remove the front token if it is one of the level's operators
    fn match_operator(
        input: &mut Tokens,
        operators: &[(TokenKind, BinaryOp)],
    ) -> Result<Option<(BinaryOp, SourceLocation)>, ParseError> {
        let Some(kind) = input.front_kind() else {
            return Ok(None);
        };
        match operators.iter().find(|(k, _)| *k == kind) {
            Some(&(_, op)) => {
                let token = input.remove_front()?;
                Ok(Some((op, token.location)))
            }
            None => Ok(None),
        }
    }

    fn binary(op: BinaryOp, left: Node, right: Node, location: SourceLocation) -> Node {
        Node::BinaryOp(BinaryOpNode {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location,
        })
    }

    /// Parse logical (&& || !)
    fn parse_logical(input: &mut Tokens) -> Result<Node, ParseError> {
        let mut left = Self::parse_comparison(input)?;

        while let Some((op, location)) = Self::match_operator(input, LOGICAL_OPERATORS)? {
            let right = Self::parse_comparison(input)?;
            left = Self::binary(op, left, right, location);
        }

        Ok(left)
    }

    /// Parse comparison (== != < <= > >=)
    fn parse_comparison(input: &mut Tokens) -> Result<Node, ParseError> {
        let mut left = Self::parse_additive(input)?;

        while let Some((op, location)) = Self::match_operator(input, COMPARISON_OPERATORS)? {
            let right = Self::parse_additive(input)?;
            left = Self::binary(op, left, right, location);
        }

        Ok(left)
    }

    /// Parse additive (+ -)
    fn parse_additive(input: &mut Tokens) -> Result<Node, ParseError> {
        let mut left = Self::parse_multiplicative(input)?;

        while let Some((op, location)) = Self::match_operator(input, ADDITIVE_OPERATORS)? {
            let right = Self::parse_multiplicative(input)?;
            left = Self::binary(op, left, right, location);
        }

        Ok(left)
    }

    /// Parse multiplicative (* / %)
    fn parse_multiplicative(input: &mut Tokens) -> Result<Node, ParseError> {
        let mut left = Self::parse_postfix(input)?;

        while let Some((op, location)) = Self::match_operator(input, MULTIPLICATIVE_OPERATORS)? {
            let right = Self::parse_postfix(input)?;
            left = Self::binary(op, left, right, location);
        }

        Ok(left)
    }

    /// Parse postfix operators: `.`, `[]`, `()`, `++`, `--`
    fn parse_postfix(input: &mut Tokens) -> Result<Node, ParseError> {
        let mut expr = Self::parse_primary(input)?;

        loop {
            match input.front_kind() {
                Some(TokenKind::Access) => {
                    let dot = input.remove_front()?;
                    let right = Self::parse_primary(input)?;
                    expr = Node::Access(AccessNode {
                        left: Box::new(expr),
                        right: Box::new(right),
                        location: dot.location,
                    });
                }
                Some(TokenKind::OpenBracket) => {
                    let open = input.remove_front()?;
                    let mut run = input.consume_till(1, &[TokenKind::CloseBracket]);
                    Self::expect_front(input, TokenKind::CloseBracket)?;
                    let index = Self::parse_expression_run(&mut run)?;
                    expr = Node::Index(IndexNode {
                        left: Box::new(expr),
                        index: Box::new(index),
                        location: open.location,
                    });
                }
                // Only a bare name can be called
                Some(TokenKind::OpenParen) => match expr {
                    Node::Identifier(callee) => expr = Self::parse_call(input, callee)?,
                    other => {
                        expr = other;
                        break;
                    }
                },
                Some(TokenKind::OpIncrement) => {
                    let operator = input.remove_front()?;
                    expr = Node::Increment(IncrementNode {
                        target: Box::new(expr),
                        is_pre: false,
                        location: operator.location,
                    });
                }
                Some(TokenKind::OpDecrement) => {
                    let operator = input.remove_front()?;
                    expr = Node::Decrement(DecrementNode {
                        target: Box::new(expr),
                        is_pre: false,
                        location: operator.location,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_call(input: &mut Tokens, callee: IdentifierNode) -> Result<Node, ParseError> {
        Self::expect_front(input, TokenKind::OpenParen)?;
        let mut run = input.consume_till(1, &[TokenKind::CloseParen]);
        Self::expect_front(input, TokenKind::CloseParen)?;

        let arguments = Self::parse_call_arguments(&mut run)?;
        let location = callee.location.clone();
        Ok(Node::Call(CallNode {
            callee,
            arguments,
            location,
        }))
    }

    /// Split a run on depth-0 commas and parse each piece
    fn parse_call_arguments(run: &mut Tokens) -> Result<Vec<Node>, ParseError> {
        let mut arguments = Vec::new();

        while !run.is_empty() {
            let mut argument = run.consume_till(0, &[TokenKind::Comma]);
            if run.front_is(TokenKind::Comma) {
                run.remove_front()?;
            }
            arguments.push(Self::parse_expression_run(&mut argument)?);
        }

        Ok(arguments)
    }

    /// Parse primary expression
    fn parse_primary(input: &mut Tokens) -> Result<Node, ParseError> {
        let front = input.front()?;
        let kind = front.kind;
        let location = front.location.clone();
        let next_is_name = input.second_kind() == Some(TokenKind::Identifier);

        match kind {
            TokenKind::Const => {
                let declaration = Self::parse_declaration(input)?;
                Ok(Node::Const(ConstNode {
                    declaration,
                    location,
                }))
            }

            // Two names in a row only start a declaration
            TokenKind::Identifier if next_is_name => {
                Ok(Node::Declaration(Self::parse_declaration(input)?))
            }
            k if k.is_type() && next_is_name => Ok(Node::Declaration(Self::parse_declaration(input)?)),
            k if k.is_type() || k == TokenKind::Identifier => {
                let token = input.remove_front()?;
                Self::resolve_literal(token)
            }

            TokenKind::OpenParen => {
                input.remove_front()?;
                let mut run = input.consume_till(1, &[TokenKind::CloseParen]);
                Self::expect_front(input, TokenKind::CloseParen)?;
                let expression = Self::parse_expression_run(&mut run)?;
                Ok(Node::Precedence(PrecedenceNode {
                    expression: Box::new(expression),
                    location,
                }))
            }

            TokenKind::OpenBrace => {
                input.remove_front()?;
                let mut run = input.consume_till(1, &[TokenKind::CloseBrace]);
                Self::expect_front(input, TokenKind::CloseBrace)?;
                let expressions = Self::parse_call_arguments(&mut run)?;
                Ok(Node::ArrayLiteral(ArrayLiteralNode {
                    expressions,
                    location,
                }))
            }

            TokenKind::OpSubtract => {
                input.remove_front()?;
                let expression = Self::parse_primary(input)?;
                Ok(Node::Negate(NegateNode {
                    expression: Box::new(expression),
                    location,
                }))
            }

            TokenKind::OpIncrement => {
                input.remove_front()?;
                let target = Self::parse_postfix(input)?;
                Ok(Node::Increment(IncrementNode {
                    target: Box::new(target),
                    is_pre: true,
                    location,
                }))
            }

            TokenKind::OpDecrement => {
                input.remove_front()?;
                let target = Self::parse_postfix(input)?;
                Ok(Node::Decrement(DecrementNode {
                    target: Box::new(target),
                    is_pre: true,
                    location,
                }))
            }

            _ => Err(ParseError::unrecognized(kind, "in expression", location)),
        }
    }

    /// Integer if it parses as one, then float, otherwise a name
    fn resolve_literal(token: Token) -> Result<Node, ParseError> {
        if let Ok(value) = token.lexeme.parse::<i64>() {
            return Ok(Node::IntLiteral(IntLiteralNode {
                value,
                location: token.location,
            }));
        }

        let numeric = token
            .lexeme
            .starts_with(|c: char| c.is_ascii_digit() || c == '.');
        if numeric {
            let value = token.lexeme.parse::<f64>().map_err(|_| {
                ParseError::malformed(&token.lexeme, "number", token.location.clone())
            })?;
            return Ok(Node::FloatLiteral(FloatLiteralNode {
                value,
                location: token.location,
            }));
        }

        Ok(Node::Identifier(IdentifierNode {
            name: token.lexeme,
            location: token.location,
        }))
    }
}
