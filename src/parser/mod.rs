//! Script parser and compiler
//!
//! Recursive-descent parser over a [`Scanner`]. Every production starts at
//! the current cursor and returns a [`Parsed`] result: a node, no match
//! (cursor untouched), or a syntax error for a committed but malformed
//! construct. Where several alternatives can match at the same position,
//! the one spanning the most source wins.
//!
//! Nested constructs (parentheses, unary operands, `**` exponents,
//! conditional branches, call arguments, function bodies) count against a
//! nesting limit; going past it is a syntax error rather than a native
//! stack overflow.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod scanner;

mod expression;
mod statement;

use std::collections::HashMap;

use ast::Node;
use error::{Parsed, SyntaxError, SyntaxErrorKind};
use scanner::Scanner;

use crate::util::unicode::is_line_terminator;

// Re-exports
pub use ast::{BinaryOp, Literal, Span, UnaryOp};
pub use compiler::{CompileError, Compiler};

/// Productions whose results are cached per start position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Rule {
    BitwiseOr,
    Member,
}

/// Parser state for one compilation unit
pub struct Parser {
    scanner: Scanner,
    /// Successful and no-match results of shared cover-grammar prefixes
    memo: HashMap<(Rule, usize), Option<Node>>,
    /// Nested constructs currently open
    depth: usize,
    max_depth: usize,
}

impl Parser {
    /// Default nesting limit
    pub const DEFAULT_MAX_DEPTH: usize = 48;

    /// Create a parser for the given source
    pub fn new(source: &str) -> Self {
        Self::with_max_depth(source, Self::DEFAULT_MAX_DEPTH)
    }

    /// Create a parser with a custom nesting limit
    pub fn with_max_depth(source: &str, max_depth: usize) -> Self {
        Parser {
            scanner: Scanner::new(source),
            memo: HashMap::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Current cursor position in code points
    #[inline]
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    fn error(&self, kind: SyntaxErrorKind, start: usize) -> SyntaxError {
        SyntaxError::new(kind, start, self.scanner.position())
    }

    /// Run a production, rewinding the cursor if it does not match
    fn attempt<T>(&mut self, production: impl FnOnce(&mut Self) -> Parsed<T>) -> Parsed<T> {
        let start = self.scanner.position();
        let result = production(self);
        if matches!(result, Ok(None)) {
            self.scanner.set_position(start);
        }
        result
    }

    /// Run a production one nesting level deeper
    ///
    /// `start` is where the enclosing construct began; it opens the error
    /// span when the nesting limit is exceeded.
    fn nested<T>(
        &mut self,
        start: usize,
        production: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= self.max_depth {
            return Err(self.error(SyntaxErrorKind::NestingTooDeep, start));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    /// Run a lookahead check and always rewind the cursor afterwards
    fn lookahead<T>(&mut self, check: impl FnOnce(&mut Self) -> T) -> T {
        let start = self.scanner.position();
        let result = check(self);
        self.scanner.set_position(start);
        result
    }

    /// Try every alternative from the same start and commit to the longest
    fn longest(&mut self, alternatives: &[fn(&mut Self) -> Parsed<Node>]) -> Parsed<Node> {
        let start = self.scanner.position();
        let mut best: Option<Node> = None;

        for alternative in alternatives {
            self.scanner.set_position(start);
            if let Some(node) = alternative(self)? {
                if best
                    .as_ref()
                    .is_none_or(|b| node.span().end > b.span().end)
                {
                    best = Some(node);
                }
            }
        }

        match best {
            Some(node) => {
                self.scanner.set_position(node.span().end);
                Ok(Some(node))
            }
            None => {
                self.scanner.set_position(start);
                Ok(None)
            }
        }
    }

    /// Cache a production's result by start position
    ///
    /// Both alternatives of a cover grammar usually begin with the same
    /// sub-expression; caching it keeps longest-match selection linear.
    fn memoized(&mut self, rule: Rule, production: fn(&mut Self) -> Parsed<Node>) -> Parsed<Node> {
        let start = self.scanner.position();
        if let Some(hit) = self.memo.get(&(rule, start)).cloned() {
            if let Some(node) = &hit {
                self.scanner.set_position(node.span().end);
            }
            return Ok(hit);
        }

        let result = production(self)?;
        self.memo.insert((rule, start), result.clone());
        Ok(result)
    }

    /// Skip whitespace and comments, and line terminators if allowed
    ///
    /// Returns `false` when a disallowed line terminator (or a multi-line
    /// comment containing one) stops the skip.
    fn skip_trivia(&mut self, allow_line_terminator: bool) -> bool {
        loop {
            let before = self.scanner.position();
            if lexer::whitespace(&mut self.scanner).is_some() {
                continue;
            }
            if let Some(comment) = lexer::comment(&mut self.scanner) {
                if !allow_line_terminator && comment.chars().any(is_line_terminator) {
                    self.scanner.set_position(before);
                    return false;
                }
                continue;
            }
            if allow_line_terminator {
                if lexer::line_terminator_sequence(&mut self.scanner).is_some() {
                    continue;
                }
            } else if self.scanner.peek().is_some_and(is_line_terminator) {
                return false;
            }
            return true;
        }
    }

    /// Skip trivia and match one token from `table`
    ///
    /// Tokens are matched longest-first, so `<` never matches the start of
    /// `<<` and `in` never matches the start of `instanceof`. Returns the
    /// table value and the token's start position; on failure the cursor is
    /// unchanged.
    fn eat_token<T: Copy>(&mut self, table: &[(&str, T)]) -> Option<(T, usize)> {
        let origin = self.scanner.position();
        self.skip_trivia(true);
        let start = self.scanner.position();

        let s = &mut self.scanner;
        let token = lexer::punctuator(s)
            .or_else(|| lexer::div_punctuator(s))
            .or_else(|| lexer::right_brace_punctuator(s))
            .or_else(|| lexer::identifier_name(s));

        let found = token.and_then(|token| {
            table
                .iter()
                .find(|(text, _)| *text == token)
                .map(|&(_, value)| (value, start))
        });
        if found.is_none() {
            self.scanner.set_position(origin);
        }
        found
    }

    /// Match a single punctuator, returning its start position
    fn eat(&mut self, punctuator: &str) -> Option<usize> {
        self.eat_token(&[(punctuator, ())]).map(|(_, start)| start)
    }

    /// Match a whole keyword, returning its start position
    fn eat_keyword(&mut self, keyword: &str) -> Option<usize> {
        let origin = self.scanner.position();
        self.skip_trivia(true);
        let start = self.scanner.position();
        match lexer::keyword(&mut self.scanner, keyword) {
            Some(_) => Some(start),
            None => {
                self.scanner.set_position(origin);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse_expr(src: &str) -> Parsed<Node> {
        Parser::new(src).parse_expression()
    }

    fn binary(node: &Node) -> (BinaryOp, &Node, &Node) {
        match node {
            Node::Binary {
                op, left, right, ..
            } => (*op, left, right),
            other => panic!("expected binary node, got {:?}", other),
        }
    }

    #[test]
    fn test_skip_trivia_line_terminators() {
        let mut p = Parser::new("  /* a */ \n x");
        assert!(!p.skip_trivia(false));
        assert_eq!(p.position(), 10);
        assert!(p.skip_trivia(true));
        assert_eq!(p.position(), 12);

        let mut p = Parser::new("/* a\nb */x");
        assert!(!p.skip_trivia(false));
        assert_eq!(p.position(), 0);
    }

    #[test]
    fn test_eat_token_is_longest_match() {
        let mut p = Parser::new(" << 1");
        assert_eq!(p.eat("<"), None);
        assert_eq!(p.position(), 0);
        assert_eq!(p.eat("<<"), Some(1));
        assert_eq!(p.position(), 3);

        let mut p = Parser::new("instanceof");
        assert_eq!(p.eat_keyword("in"), None);
        assert_eq!(p.eat_keyword("instanceof"), Some(0));
    }

    #[test]
    fn test_precedence_multiplicative_over_additive() {
        let node = parse_expr("100 + 9 * 7").unwrap().unwrap();
        let (op, left, right) = binary(&node);
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(left, Node::Literal { .. }));
        assert_eq!(binary(right).0, BinaryOp::Mul);
        assert_eq!(node.span(), Span::new(0, 11));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let node = parse_expr("2 ** 3 ** 2").unwrap().unwrap();
        let (op, left, right) = binary(&node);
        assert_eq!(op, BinaryOp::Exp);
        assert!(matches!(left, Node::Literal { .. }));
        assert_eq!(binary(right).0, BinaryOp::Exp);
    }

    #[test]
    fn test_additive_is_left_associative() {
        let node = parse_expr("1 - 2 - 3").unwrap().unwrap();
        let (op, left, _) = binary(&node);
        assert_eq!(op, BinaryOp::Sub);
        assert_eq!(binary(left).0, BinaryOp::Sub);
    }

    #[test]
    fn test_shift_binds_looser_than_additive() {
        let node = parse_expr("16 << 2 + 1").unwrap().unwrap();
        let (op, _, right) = binary(&node);
        assert_eq!(op, BinaryOp::Shl);
        assert_eq!(binary(right).0, BinaryOp::Add);
    }

    #[test]
    fn test_relational_keywords() {
        let node = parse_expr("a instanceof b in c").unwrap().unwrap();
        let (op, left, _) = binary(&node);
        assert_eq!(op, BinaryOp::In);
        assert_eq!(binary(left).0, BinaryOp::InstanceOf);
    }

    #[test]
    fn test_unary_chain() {
        let node = parse_expr("!~-typeof 1").unwrap().unwrap();
        let Node::Unary { op, operand, span } = &node else {
            panic!("expected unary");
        };
        assert_eq!(*op, UnaryOp::Not);
        assert_eq!(*span, Span::new(0, 11));
        assert!(matches!(**operand, Node::Unary { op: UnaryOp::BitNot, .. }));
    }

    #[test]
    fn test_coalesce_and_logical_or_longest_match() {
        let node = parse_expr("null ?? 2").unwrap().unwrap();
        assert_eq!(binary(&node).0, BinaryOp::Coalesce);

        let node = parse_expr("a || b && c").unwrap().unwrap();
        let (op, _, right) = binary(&node);
        assert_eq!(op, BinaryOp::Or);
        assert_eq!(binary(right).0, BinaryOp::And);

        // Mixing without parentheses keeps the longer chain and stops
        let mut p = Parser::new("a || b ?? c");
        let node = p.parse_expression().unwrap().unwrap();
        assert_eq!(binary(&node).0, BinaryOp::Or);
        assert_eq!(p.position(), 6);
    }

    #[test]
    fn test_conditional() {
        let node = parse_expr("true ? 1 : false ? 2 : 3").unwrap().unwrap();
        let Node::Conditional { alternate, .. } = &node else {
            panic!("expected conditional");
        };
        assert!(matches!(**alternate, Node::Conditional { .. }));
    }

    #[test]
    fn test_comma_is_left_leaning() {
        let node = parse_expr("34, 35, 69").unwrap().unwrap();
        let Node::Comma { left, right, span } = &node else {
            panic!("expected comma");
        };
        assert_eq!(*span, Span::new(0, 10));
        assert!(matches!(**left, Node::Comma { .. }));
        assert!(matches!(**right, Node::Literal { .. }));
    }

    #[test]
    fn test_call_expression() {
        let node = parse_expr("f(1, 2)(3,)").unwrap().unwrap();
        let Node::Call {
            callee, arguments, ..
        } = &node
        else {
            panic!("expected call");
        };
        assert_eq!(arguments.len(), 1);
        let Node::Call { arguments, .. } = &**callee else {
            panic!("expected inner call");
        };
        assert_eq!(arguments.len(), 2);
    }

    #[test]
    fn test_parenthesized_span() {
        let node = parse_expr(" ( 1 ) ").unwrap().unwrap();
        assert!(matches!(node, Node::Parenthesized { .. }));
        assert_eq!(node.span(), Span::new(1, 6));
    }

    #[test]
    fn test_errors_propagate() {
        let err = parse_expr("(1").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingCloseParen);
        assert_eq!(err.span, Span::new(0, 2));

        let err = parse_expr("1 ? 2").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingColon);

        let err = parse_expr("1 +").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingExpression);

        let err = parse_expr("f(1").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingCloseParen);

        // An error inside one longest-match alternative is not retried
        let err = parse_expr("a ?? (b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::MissingCloseParen);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |open: &str, close: &str, n: usize| {
            format!("{}1{}", open.repeat(n), close.repeat(n))
        };

        let mut p = Parser::with_max_depth(&nested("(", ")", 4), 4);
        assert!(p.parse_expression().unwrap().is_some());

        let cases = [
            nested("(", ")", 5),
            nested("!", "", 5),
            nested("f(", ")", 5),
            nested("2 ** ", "", 5),
            nested("true ? 1 : ", "", 5),
        ];
        for src in &cases {
            let err = Parser::with_max_depth(src, 4).parse_expression().unwrap_err();
            assert_eq!(err.kind, SyntaxErrorKind::NestingTooDeep, "{}", src);
        }

        // Recursion limit only; flat chains of any length are fine
        let src = format!("{}1", "1 + ".repeat(100));
        let node = Parser::with_max_depth(&src, 4).parse_expression().unwrap().unwrap();
        assert_eq!(node.span().end, src.len());
    }

    #[test]
    fn test_nesting_depth_unwinds() {
        let src = "((1)) + ((2)) + ((3))";
        let mut p = Parser::with_max_depth(src, 2);
        assert!(p.parse_expression().unwrap().is_some());
        assert_eq!(p.depth, 0);

        let mut p = Parser::with_max_depth("(((1)))", 2);
        assert!(p.parse_expression().is_err());
        assert_eq!(p.depth, 0);
    }

    #[test]
    fn test_no_match_leaves_cursor() {
        for src in ["", "  ", ")", "; 1", "=> x", "-2 ** 2"] {
            let mut p = Parser::new(src);
            let start = p.position();
            if let Ok(None) = p.parse_primary() {
                assert_eq!(p.position(), start, "{:?}", src);
            }
        }
        let mut p = Parser::new("  ;");
        assert_eq!(p.parse_expression(), Ok(None));
        assert_eq!(p.position(), 0);
    }

    proptest! {
        #[test]
        fn prop_three_way_result(src in "[0-9a-z ()?:;,+*&|!~<>=.{}\n-]{0,24}") {
            type Production = fn(&mut Parser) -> Parsed<Node>;
            let productions: [Production; 4] = [
                Parser::parse_primary,
                Parser::parse_unary,
                Parser::parse_expression,
                Parser::parse_statement,
            ];
            for production in productions {
                let mut p = Parser::new(&src);
                match production(&mut p) {
                    Ok(None) => prop_assert_eq!(p.position(), 0),
                    Ok(Some(node)) => {
                        prop_assert!(p.position() > 0);
                        prop_assert_eq!(node.span().end, p.position());
                    }
                    Err(_) => {}
                }
            }
        }
    }
}
