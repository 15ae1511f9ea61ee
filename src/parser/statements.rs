//! Statement parsing implementation
//!
//! This module handles the statement forms allowed inside a function body:
//!
//! - Nested scopes: `{ ... }`
//! - Expression statements, including declarations: `float x = 1.0;`
//! - `return expr;` and `return;`
//! - `for (init; condition; update) { ... }` with optional clauses
//! - `if (condition) { ... } else if (...) { ... } else { ... }`
//!
//! # Grammar
//!
//! ```text
//! statement ::= scope | for_stmt | if_stmt | "return" expression? ";" | expression ";"
//! scope     ::= "{" statement* "}"
//! for_stmt  ::= "for" "(" expression? ";" expression? ";" expression? ";" scope
//! if_stmt   ::= "if" "(" expression ")" scope ("else" (if_stmt | scope))?
//! ```
//!
//! The `for` header's third `;` is the one the retokenizer puts in place of
//! the closing paren.
//!
//! All parsing routines are `pub(crate)` associated functions on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::error::ParseError;
use crate::parser::parse::{Parser, Tokens};
use crate::parser::token::TokenKind;

impl Parser {
    /// Parse a brace-delimited scope
    pub(crate) fn parse_scope(input: &mut Tokens) -> Result<ScopeNode, ParseError> {
        let open = Self::expect_front(input, TokenKind::OpenBrace)?;

        let mut statements = Vec::new();
        while let Some(kind) = Self::front_before(input, TokenKind::CloseBrace) {
            let statement = match kind {
                TokenKind::OpenBrace => Node::Scope(Self::parse_scope(input)?),
                TokenKind::For => Node::For(Self::parse_for(input)?),
                TokenKind::If => Node::If(Self::parse_if(input)?),
                _ => Self::parse_statement(input)?,
            };
            statements.push(statement);
        }

        Self::expect_front(input, TokenKind::CloseBrace)?;
        Ok(ScopeNode {
            statements,
            location: open.location,
        })
    }

    /// Parse everything up to the next depth-0 `;`
    pub(crate) fn parse_statement(input: &mut Tokens) -> Result<Node, ParseError> {
        let mut run = input.consume_till(0, &[TokenKind::StatementEnd]);
        Self::expect_front(input, TokenKind::StatementEnd)?;

        if run.front_is(TokenKind::Return) {
            let keyword = run.remove_front()?;
            let expression = if run.is_empty() {
                None
            } else {
                Some(Box::new(Self::parse_expression_run(&mut run)?))
            };
            return Ok(Node::Return(ReturnNode {
                expression,
                location: keyword.location,
            }));
        }

        Self::parse_expression_run(&mut run)
    }

    /// One `for` header clause; an empty clause is `None`
    fn parse_for_clause(input: &mut Tokens) -> Result<Option<Box<Node>>, ParseError> {
        let mut run = input.consume_till(0, &[TokenKind::StatementEnd]);
        Self::expect_front(input, TokenKind::StatementEnd)?;

        if run.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(Self::parse_expression_run(&mut run)?)))
    }

    pub(crate) fn parse_for(input: &mut Tokens) -> Result<ForNode, ParseError> {
        let keyword = Self::expect_front(input, TokenKind::For)?;
        Self::expect_front(input, TokenKind::OpenParen)?;

        let initial = Self::parse_for_clause(input)?;
        let condition = Self::parse_for_clause(input)?;
        let update = Self::parse_for_clause(input)?;
        let body = Self::parse_scope(input)?;

        Ok(ForNode {
            initial,
            condition,
            update,
            body,
            location: keyword.location,
        })
    }

    pub(crate) fn parse_if(input: &mut Tokens) -> Result<IfNode, ParseError> {
        let keyword = Self::expect_front(input, TokenKind::If)?;
        Self::expect_front(input, TokenKind::OpenParen)?;

        let mut run = input.consume_till(1, &[TokenKind::CloseParen]);
        Self::expect_front(input, TokenKind::CloseParen)?;
        let condition = Box::new(Self::parse_expression_run(&mut run)?);

        let then_scope = Self::parse_scope(input)?;

        let else_branch = if input.front_is(TokenKind::Else) {
            input.remove_front()?;
            let next = input.expect_front(&[TokenKind::OpenBrace, TokenKind::If])?.kind;
            match next {
                TokenKind::If => Some(ElseBranch::If(Box::new(Self::parse_if(input)?))),
                _ => Some(ElseBranch::Scope(Self::parse_scope(input)?)),
            }
        } else {
            None
        };

        Ok(IfNode {
            condition,
            then_scope,
            else_branch,
            location: keyword.location,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::error::ErrorKind;
    use crate::parser::parse::Parser;

    /// Parse `body` as the body of `void f()` and return its statements
    fn body(body: &str) -> Vec<Node> {
        let source = format!("void f() {{ {} }}", body);
        let module = Parser::new(&source, "test.ash").unwrap().parse_module().unwrap();
        match module.statements.into_iter().next() {
            Some(Node::Function(f)) => f.body.statements,
            _ => panic!("Expected function definition"),
        }
    }

    #[test]
    fn test_return_with_and_without_value() {
        let statements = body("return;");
        match &statements[0] {
            Node::Return(r) => assert!(r.expression.is_none()),
            _ => panic!("Expected return"),
        }

        let statements = body("return a + 1;");
        match &statements[0] {
            Node::Return(r) => assert!(matches!(r.expression.as_deref(), Some(Node::BinaryOp(_)))),
            _ => panic!("Expected return"),
        }
    }

    #[test]
    fn test_for_loop() {
        let statements = body("for (int i = 0; i < 4; i++) { total = total + i; }");
        match &statements[0] {
            Node::For(f) => {
                assert!(matches!(f.initial.as_deref(), Some(Node::Assign(_))));
                assert!(matches!(f.condition.as_deref(), Some(Node::BinaryOp(_))));
                match f.update.as_deref() {
                    Some(Node::Increment(inc)) => assert!(!inc.is_pre),
                    _ => panic!("Expected postfix increment"),
                }
                assert_eq!(f.body.statements.len(), 1);
            }
            _ => panic!("Expected for loop"),
        }
    }

    #[test]
    fn test_for_loop_with_empty_clauses() {
        let statements = body("for (;;) { }");
        match &statements[0] {
            Node::For(f) => {
                assert!(f.initial.is_none());
                assert!(f.condition.is_none());
                assert!(f.update.is_none());
            }
            _ => panic!("Expected for loop"),
        }
    }

    #[test]
    fn test_if_else_chain() {
        let statements = body("if (a < b) { x = 1; } else if (a > b) { x = 2; } else { x = 3; }");
        match &statements[0] {
            Node::If(first) => {
                assert_eq!(first.then_scope.statements.len(), 1);
                match &first.else_branch {
                    Some(ElseBranch::If(second)) => {
                        assert!(matches!(second.else_branch, Some(ElseBranch::Scope(_))));
                    }
                    _ => panic!("Expected chained if"),
                }
            }
            _ => panic!("Expected if statement"),
        }
    }

    #[test]
    fn test_nested_scope() {
        let statements = body("{ float y = 2.0; } x = 1;");
        assert_eq!(statements.len(), 2);
        assert!(matches!(statements[0], Node::Scope(_)));
        assert!(matches!(statements[1], Node::Assign(_)));
    }

    #[test]
    fn test_missing_terminator_is_an_error() {
        let err = Parser::new("void f() { float x }", "test.ash")
            .and_then(|mut p| p.parse_module())
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::ExhaustedInput | ErrorKind::UnexpectedKind { .. }
        ));
        assert!(err.location().is_some());
    }
}
