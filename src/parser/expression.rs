//! Expression grammar
//!
//! One method per precedence level, tightest last. Binary levels fold a
//! left-associative chain; `**` recurses for right associativity.

use std::rc::Rc;

use super::Parser;
use super::Rule;
use super::ast::{BinaryOp, Literal, Node, Span, UnaryOp};
use super::error::{Parsed, SyntaxError, SyntaxErrorKind};
use super::lexer;
use super::scanner::Scanner;

const UNARY: &[(&str, UnaryOp)] = &[
    ("+", UnaryOp::Plus),
    ("-", UnaryOp::Minus),
    ("~", UnaryOp::BitNot),
    ("!", UnaryOp::Not),
    ("delete", UnaryOp::Delete),
    ("void", UnaryOp::Void),
    ("typeof", UnaryOp::TypeOf),
    ("await", UnaryOp::Await),
];

const EXPONENT: &[(&str, BinaryOp)] = &[("**", BinaryOp::Exp)];

const MULTIPLICATIVE: &[(&str, BinaryOp)] = &[
    ("*", BinaryOp::Mul),
    ("/", BinaryOp::Div),
    ("%", BinaryOp::Mod),
];

const ADDITIVE: &[(&str, BinaryOp)] = &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)];

const SHIFT: &[(&str, BinaryOp)] = &[
    ("<<", BinaryOp::Shl),
    (">>", BinaryOp::Sar),
    (">>>", BinaryOp::Shr),
];

const RELATIONAL: &[(&str, BinaryOp)] = &[
    ("<", BinaryOp::Lt),
    (">", BinaryOp::Gt),
    ("<=", BinaryOp::Lte),
    (">=", BinaryOp::Gte),
    ("instanceof", BinaryOp::InstanceOf),
    ("in", BinaryOp::In),
];

const EQUALITY: &[(&str, BinaryOp)] = &[
    ("==", BinaryOp::Eq),
    ("!=", BinaryOp::Neq),
    ("===", BinaryOp::StrictEq),
    ("!==", BinaryOp::StrictNeq),
];

const BITWISE_AND: &[(&str, BinaryOp)] = &[("&", BinaryOp::BitAnd)];
const BITWISE_XOR: &[(&str, BinaryOp)] = &[("^", BinaryOp::BitXor)];
const BITWISE_OR: &[(&str, BinaryOp)] = &[("|", BinaryOp::BitOr)];
const LOGICAL_AND: &[(&str, BinaryOp)] = &[("&&", BinaryOp::And)];
const LOGICAL_OR: &[(&str, BinaryOp)] = &[("||", BinaryOp::Or)];
const COALESCE: &[(&str, BinaryOp)] = &[("??", BinaryOp::Coalesce)];

fn binary_node(op: BinaryOp, left: Node, right: Node) -> Node {
    let span = Span::new(left.span().start, right.span().end);
    Node::Binary {
        op,
        left: Rc::new(left),
        right: Rc::new(right),
        span,
    }
}

impl Parser {
    /// Expression: assignment expressions joined by the comma operator
    pub fn parse_expression(&mut self) -> Parsed<Node> {
        let Some(mut left) = self.parse_assignment()? else {
            return Ok(None);
        };
        while self.eat(",").is_some() {
            let Some(right) = self.parse_assignment()? else {
                return Err(self.error(SyntaxErrorKind::MissingExpression, left.span().start));
            };
            let span = Span::new(left.span().start, right.span().end);
            left = Node::Comma {
                left: Rc::new(left),
                right: Rc::new(right),
                span,
            };
        }
        Ok(Some(left))
    }

    /// Assignment expression (no assignment operators yet)
    pub(super) fn parse_assignment(&mut self) -> Parsed<Node> {
        self.parse_conditional()
    }

    pub(super) fn parse_conditional(&mut self) -> Parsed<Node> {
        let Some(test) = self.parse_short_circuit()? else {
            return Ok(None);
        };
        let start = test.span().start;
        if self.eat("?").is_none() {
            return Ok(Some(test));
        }

        let Some(consequent) = self.nested(start, Self::parse_assignment)? else {
            return Err(self.error(SyntaxErrorKind::MissingExpression, start));
        };
        if self.eat(":").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingColon, start));
        }
        let Some(alternate) = self.nested(start, Self::parse_assignment)? else {
            return Err(self.error(SyntaxErrorKind::MissingExpression, start));
        };

        let span = Span::new(start, alternate.span().end);
        Ok(Some(Node::Conditional {
            test: Rc::new(test),
            consequent: Rc::new(consequent),
            alternate: Rc::new(alternate),
            span,
        }))
    }

    /// Logical-OR chain or coalescing chain, whichever spans more
    pub(super) fn parse_short_circuit(&mut self) -> Parsed<Node> {
        self.longest(&[Self::parse_logical_or, Self::parse_coalesce])
    }

    /// `a ?? b ?? c`; needs at least one `??`
    pub(super) fn parse_coalesce(&mut self) -> Parsed<Node> {
        self.attempt(|p| {
            let Some(head) = p.parse_bitwise_or()? else {
                return Ok(None);
            };
            let head_end = head.span().end;
            let chain = p.fold_binary(head, COALESCE, Self::parse_bitwise_or)?;
            Ok((chain.span().end > head_end).then_some(chain))
        })
    }

    pub(super) fn parse_logical_or(&mut self) -> Parsed<Node> {
        self.parse_binary(LOGICAL_OR, Self::parse_logical_and)
    }

    pub(super) fn parse_logical_and(&mut self) -> Parsed<Node> {
        self.parse_binary(LOGICAL_AND, Self::parse_bitwise_or)
    }

    pub(super) fn parse_bitwise_or(&mut self) -> Parsed<Node> {
        self.memoized(Rule::BitwiseOr, |p| {
            p.parse_binary(BITWISE_OR, Self::parse_bitwise_xor)
        })
    }

    pub(super) fn parse_bitwise_xor(&mut self) -> Parsed<Node> {
        self.parse_binary(BITWISE_XOR, Self::parse_bitwise_and)
    }

    pub(super) fn parse_bitwise_and(&mut self) -> Parsed<Node> {
        self.parse_binary(BITWISE_AND, Self::parse_equality)
    }

    pub(super) fn parse_equality(&mut self) -> Parsed<Node> {
        self.parse_binary(EQUALITY, Self::parse_relational)
    }

    pub(super) fn parse_relational(&mut self) -> Parsed<Node> {
        self.parse_binary(RELATIONAL, Self::parse_shift)
    }

    pub(super) fn parse_shift(&mut self) -> Parsed<Node> {
        self.parse_binary(SHIFT, Self::parse_additive)
    }

    pub(super) fn parse_additive(&mut self) -> Parsed<Node> {
        self.parse_binary(ADDITIVE, Self::parse_multiplicative)
    }

    pub(super) fn parse_multiplicative(&mut self) -> Parsed<Node> {
        self.parse_binary(MULTIPLICATIVE, Self::parse_exponentiation)
    }

    /// Left-associative chain of `operand (op operand)*`
    fn parse_binary(
        &mut self,
        operators: &[(&str, BinaryOp)],
        operand: fn(&mut Self) -> Parsed<Node>,
    ) -> Parsed<Node> {
        let Some(head) = operand(self)? else {
            return Ok(None);
        };
        self.fold_binary(head, operators, operand).map(Some)
    }

    fn fold_binary(
        &mut self,
        mut left: Node,
        operators: &[(&str, BinaryOp)],
        operand: fn(&mut Self) -> Parsed<Node>,
    ) -> Result<Node, SyntaxError> {
        while let Some((op, _)) = self.eat_token(operators) {
            let Some(right) = operand(self)? else {
                return Err(self.error(SyntaxErrorKind::MissingExpression, left.span().start));
            };
            left = binary_node(op, left, right);
        }
        Ok(left)
    }

    /// `update ** exponentiation`, or a unary expression
    ///
    /// A unary expression is never the base of `**`, so `-2 ** 2` stops
    /// after `-2`.
    pub(super) fn parse_exponentiation(&mut self) -> Parsed<Node> {
        if let Some(unary) = self.parse_prefix_unary()? {
            return Ok(Some(unary));
        }
        let Some(base) = self.parse_update()? else {
            return Ok(None);
        };
        if self.eat_token(EXPONENT).is_none() {
            return Ok(Some(base));
        }
        let Some(exponent) = self.nested(base.span().start, Self::parse_exponentiation)? else {
            return Err(self.error(SyntaxErrorKind::MissingExpression, base.span().start));
        };
        Ok(Some(binary_node(BinaryOp::Exp, base, exponent)))
    }

    pub(super) fn parse_unary(&mut self) -> Parsed<Node> {
        if let Some(unary) = self.parse_prefix_unary()? {
            return Ok(Some(unary));
        }
        self.parse_update()
    }

    fn parse_prefix_unary(&mut self) -> Parsed<Node> {
        let Some((op, start)) = self.eat_token(UNARY) else {
            return Ok(None);
        };
        let Some(operand) = self.nested(start, Self::parse_unary)? else {
            return Err(self.error(SyntaxErrorKind::MissingExpression, start));
        };
        let span = Span::new(start, operand.span().end);
        Ok(Some(Node::Unary {
            op,
            operand: Rc::new(operand),
            span,
        }))
    }

    /// Update expression (no `++`/`--` yet)
    pub(super) fn parse_update(&mut self) -> Parsed<Node> {
        self.parse_left_hand_side()
    }

    /// New expression or call expression, whichever spans more
    pub(super) fn parse_left_hand_side(&mut self) -> Parsed<Node> {
        self.longest(&[Self::parse_new, Self::parse_call])
    }

    /// New expression (no `new` operator yet)
    pub(super) fn parse_new(&mut self) -> Parsed<Node> {
        self.parse_member()
    }

    /// `member arguments arguments*`
    pub(super) fn parse_call(&mut self) -> Parsed<Node> {
        self.attempt(|p| {
            let Some(mut callee) = p.parse_member()? else {
                return Ok(None);
            };
            let mut called = false;
            while let Some((arguments, end)) = p.parse_arguments()? {
                let span = Span::new(callee.span().start, end);
                callee = Node::Call {
                    callee: Rc::new(callee),
                    arguments,
                    span,
                };
                called = true;
            }
            Ok(called.then_some(callee))
        })
    }

    /// `( [assignment {, assignment} [,]] )`, with the end position
    fn parse_arguments(&mut self) -> Parsed<(Vec<Node>, usize)> {
        let Some(start) = self.eat("(") else {
            return Ok(None);
        };
        let mut arguments = Vec::new();
        while let Some(argument) = self.nested(start, Self::parse_assignment)? {
            arguments.push(argument);
            if self.eat(",").is_none() {
                break;
            }
        }
        if self.eat(")").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingCloseParen, start));
        }
        Ok(Some((arguments, self.position())))
    }

    /// Member expression (no property access yet)
    pub(super) fn parse_member(&mut self) -> Parsed<Node> {
        self.memoized(Rule::Member, Self::parse_primary)
    }

    /// Identifier reference, literal or parenthesized expression
    pub(super) fn parse_primary(&mut self) -> Parsed<Node> {
        self.attempt(|p| {
            p.skip_trivia(true);
            let start = p.position();
            let s = &mut p.scanner;

            if let Some(name) = lexer::identifier(s) {
                let span = Span::new(start, s.position());
                return Ok(Some(Node::IdentifierReference { name, span }));
            }
            if let Some(value) = Self::literal(s) {
                let span = Span::new(start, s.position());
                return Ok(Some(Node::Literal { value, span }));
            }
            p.parse_parenthesized()
        })
    }

    fn literal(s: &mut Scanner) -> Option<Literal> {
        if lexer::null_literal(s).is_some() {
            return Some(Literal::Null);
        }
        if let Some(text) = lexer::boolean_literal(s) {
            return Some(Literal::Boolean(text == "true"));
        }
        if let Some((text, kind)) = lexer::numeric_literal(s) {
            return Some(Literal::Number(lexer::numeric_value(&text, kind)));
        }
        lexer::string_literal(s).map(Literal::String)
    }

    /// `( expression )`
    pub(super) fn parse_parenthesized(&mut self) -> Parsed<Node> {
        let Some(start) = self.eat("(") else {
            return Ok(None);
        };
        let Some(expression) = self.nested(start, Self::parse_expression)? else {
            return Err(self.error(SyntaxErrorKind::MissingExpression, start));
        };
        if self.eat(")").is_none() {
            return Err(self.error(SyntaxErrorKind::MissingCloseParen, start));
        }
        let span = Span::new(start, self.position());
        Ok(Some(Node::Parenthesized {
            expression: Rc::new(expression),
            span,
        }))
    }
}
