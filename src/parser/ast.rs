//! Abstract syntax tree
//!
//! The node set is closed, so nodes are a single enum and lowering to
//! bytecode is one exhaustive match. Every node carries the code-point span
//! of the source it was parsed from.
//!
//! Children are reference counted so the parser's memo can hand out a
//! subtree without copying it. Lowering and dropping walk the tree with an
//! explicit work list, so a long operator chain never deepens the native
//! stack.

use std::rc::Rc;

use super::compiler::CompileError;
use crate::value::{Number, Value};
use crate::vm::opcode::{Bytecode, OpCode};

/// Half-open code-point range `[start, end)` in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.end == self.start
    }
}

/// Literal payload
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(Number),
    /// Raw source text, quotes included
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    Not,
    Delete,
    Void,
    TypeOf,
    Await,
}

impl UnaryOp {
    pub const fn opcode(self) -> OpCode {
        match self {
            UnaryOp::Plus => OpCode::Plus,
            UnaryOp::Minus => OpCode::Neg,
            UnaryOp::BitNot => OpCode::Not,
            UnaryOp::Not => OpCode::LNot,
            UnaryOp::Delete => OpCode::Delete,
            UnaryOp::Void => OpCode::Void,
            UnaryOp::TypeOf => OpCode::TypeOf,
            UnaryOp::Await => OpCode::Await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Exp,
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Sar,
    Shr,
    Lt,
    Gt,
    Lte,
    Gte,
    InstanceOf,
    In,
    Eq,
    Neq,
    StrictEq,
    StrictNeq,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub const fn opcode(self) -> OpCode {
        match self {
            BinaryOp::Exp => OpCode::Pow,
            BinaryOp::Mul => OpCode::Mul,
            BinaryOp::Div => OpCode::Div,
            BinaryOp::Mod => OpCode::Mod,
            BinaryOp::Add => OpCode::Add,
            BinaryOp::Sub => OpCode::Sub,
            BinaryOp::Shl => OpCode::Shl,
            BinaryOp::Sar => OpCode::Sar,
            BinaryOp::Shr => OpCode::Shr,
            BinaryOp::Lt => OpCode::Lt,
            BinaryOp::Gt => OpCode::Gt,
            BinaryOp::Lte => OpCode::Lte,
            BinaryOp::Gte => OpCode::Gte,
            BinaryOp::InstanceOf => OpCode::InstanceOf,
            BinaryOp::In => OpCode::In,
            BinaryOp::Eq => OpCode::Eq,
            BinaryOp::Neq => OpCode::Neq,
            BinaryOp::StrictEq => OpCode::StrictEq,
            BinaryOp::StrictNeq => OpCode::StrictNeq,
            BinaryOp::BitAnd => OpCode::And,
            BinaryOp::BitXor => OpCode::Xor,
            BinaryOp::BitOr => OpCode::Or,
            BinaryOp::And => OpCode::LAnd,
            BinaryOp::Or => OpCode::LOr,
            BinaryOp::Coalesce => OpCode::Coalesce,
        }
    }
}

/// AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    IdentifierReference {
        name: String,
        span: Span,
    },
    BindingIdentifier {
        name: String,
        span: Span,
    },
    Parenthesized {
        expression: Rc<Node>,
        span: Span,
    },
    Literal {
        value: Literal,
        span: Span,
    },
    Call {
        callee: Rc<Node>,
        arguments: Vec<Node>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Rc<Node>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Rc<Node>,
        right: Rc<Node>,
        span: Span,
    },
    Conditional {
        test: Rc<Node>,
        consequent: Rc<Node>,
        alternate: Rc<Node>,
        span: Span,
    },
    Comma {
        left: Rc<Node>,
        right: Rc<Node>,
        span: Span,
    },
    ExpressionStatement {
        expression: Rc<Node>,
        span: Span,
    },
    Return {
        argument: Option<Rc<Node>>,
        span: Span,
    },
    FunctionDeclaration {
        /// `None` only for a default-export placeholder
        name: Option<Rc<Node>>,
        params: Vec<Node>,
        rest: Option<Rc<Node>>,
        body: Vec<Node>,
        span: Span,
    },
}

impl Node {
    /// Source span of this node
    pub fn span(&self) -> Span {
        match self {
            Node::IdentifierReference { span, .. }
            | Node::BindingIdentifier { span, .. }
            | Node::Parenthesized { span, .. }
            | Node::Literal { span, .. }
            | Node::Call { span, .. }
            | Node::Unary { span, .. }
            | Node::Binary { span, .. }
            | Node::Conditional { span, .. }
            | Node::Comma { span, .. }
            | Node::ExpressionStatement { span, .. }
            | Node::Return { span, .. }
            | Node::FunctionDeclaration { span, .. } => *span,
        }
    }

    /// Append this node's instructions to `out`, children first
    pub fn lower(&self, out: &mut Bytecode) -> Result<(), CompileError> {
        let mut work = vec![Lower::Visit(self)];
        while let Some(item) = work.pop() {
            let node = match item {
                Lower::Visit(node) => node,
                Lower::Emit(opcode) => {
                    out.emit(opcode);
                    continue;
                }
            };
            // Pushed in reverse: the work list is LIFO
            match node {
                Node::Literal { value, .. } => {
                    let value = match value {
                        Literal::Null => Value::Null,
                        Literal::Boolean(b) => Value::Boolean(*b),
                        Literal::Number(n) => Value::Number(*n),
                        Literal::String(_) => {
                            return Err(CompileError::Unsupported("string literal evaluation"));
                        }
                    };
                    out.emit_operand(OpCode::Push, value);
                }
                Node::Parenthesized { expression, .. } => work.push(Lower::Visit(expression)),
                Node::Unary { op, operand, .. } => {
                    work.push(Lower::Emit(op.opcode()));
                    work.push(Lower::Visit(operand));
                }
                Node::Binary {
                    op, left, right, ..
                } => {
                    work.push(Lower::Emit(op.opcode()));
                    work.push(Lower::Visit(right));
                    work.push(Lower::Visit(left));
                }
                Node::Conditional {
                    test,
                    consequent,
                    alternate,
                    ..
                } => {
                    work.push(Lower::Emit(OpCode::Conditional));
                    work.push(Lower::Visit(alternate));
                    work.push(Lower::Visit(consequent));
                    work.push(Lower::Visit(test));
                }
                Node::Comma { left, right, .. } => {
                    work.push(Lower::Emit(OpCode::Comma));
                    work.push(Lower::Visit(right));
                    work.push(Lower::Visit(left));
                }
                Node::ExpressionStatement { expression, .. }
                | Node::Return {
                    argument: Some(expression),
                    ..
                } => {
                    work.push(Lower::Emit(OpCode::SetResult));
                    work.push(Lower::Emit(OpCode::Resolve));
                    work.push(Lower::Visit(expression));
                }
                Node::Return { argument: None, .. } => {}
                Node::IdentifierReference { .. } => {
                    return Err(CompileError::Unsupported("identifier reference"));
                }
                Node::BindingIdentifier { .. } => {
                    return Err(CompileError::Unsupported("binding identifier"));
                }
                Node::Call { .. } => return Err(CompileError::Unsupported("call expression")),
                Node::FunctionDeclaration { .. } => {
                    return Err(CompileError::Unsupported("function declaration"));
                }
            }
        }
        Ok(())
    }

    /// Childless stand-in left behind by [`Node::detach_children`]
    fn placeholder() -> Node {
        Node::Literal {
            value: Literal::Null,
            span: Span::default(),
        }
    }

    /// Move every child this node owns alone into `out`
    fn detach_children(&mut self, out: &mut Vec<Node>) {
        fn detach(child: &mut Rc<Node>, out: &mut Vec<Node>) {
            // Shared children are still reachable from the parser's memo
            if let Some(node) = Rc::get_mut(child) {
                if !node.is_leaf() {
                    out.push(std::mem::replace(node, Node::placeholder()));
                }
            }
        }

        match self {
            Node::IdentifierReference { .. }
            | Node::BindingIdentifier { .. }
            | Node::Literal { .. }
            | Node::Return { argument: None, .. } => {}
            Node::Parenthesized { expression, .. }
            | Node::ExpressionStatement { expression, .. }
            | Node::Return {
                argument: Some(expression),
                ..
            } => detach(expression, out),
            Node::Unary { operand, .. } => detach(operand, out),
            Node::Binary { left, right, .. } | Node::Comma { left, right, .. } => {
                detach(left, out);
                detach(right, out);
            }
            Node::Conditional {
                test,
                consequent,
                alternate,
                ..
            } => {
                detach(test, out);
                detach(consequent, out);
                detach(alternate, out);
            }
            Node::Call {
                callee, arguments, ..
            } => {
                detach(callee, out);
                out.append(arguments);
            }
            Node::FunctionDeclaration {
                name,
                params,
                rest,
                body,
                ..
            } => {
                for child in [name, rest].into_iter().flatten() {
                    detach(child, out);
                }
                out.append(params);
                out.append(body);
            }
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(
            self,
            Node::IdentifierReference { .. }
                | Node::BindingIdentifier { .. }
                | Node::Literal { .. }
                | Node::Return { argument: None, .. }
        )
    }
}

/// Pending step of [`Node::lower`]
enum Lower<'a> {
    Visit(&'a Node),
    Emit(OpCode),
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::opcode::Instruction;

    fn num(n: f64, start: usize) -> Rc<Node> {
        Rc::new(Node::Literal {
            value: Literal::Number(Number::Float(n)),
            span: Span::new(start, start + 1),
        })
    }

    fn opcodes(bc: &Bytecode) -> Vec<OpCode> {
        bc.iter().map(|i| i.opcode).collect()
    }

    #[test]
    fn test_span_of_every_variant() {
        let node = Node::Comma {
            left: num(1.0, 0),
            right: num(2.0, 3),
            span: Span::new(0, 4),
        };
        assert_eq!(node.span(), Span::new(0, 4));
        assert_eq!(node.span().len(), 4);
        assert!(Span::new(2, 2).is_empty());
    }

    #[test]
    fn test_lower_binary_left_to_right() {
        let node = Node::Binary {
            op: BinaryOp::Sub,
            left: num(5.0, 0),
            right: num(3.0, 4),
            span: Span::new(0, 5),
        };
        let mut bc = Bytecode::new();
        node.lower(&mut bc).unwrap();
        assert_eq!(
            bc.instructions,
            vec![
                Instruction::with_operand(OpCode::Push, Value::float(5.0)),
                Instruction::with_operand(OpCode::Push, Value::float(3.0)),
                Instruction::new(OpCode::Sub),
            ]
        );
    }

    #[test]
    fn test_lower_expression_statement() {
        let node = Node::ExpressionStatement {
            expression: Rc::new(Node::Unary {
                op: UnaryOp::Minus,
                operand: num(1.0, 1),
                span: Span::new(0, 2),
            }),
            span: Span::new(0, 3),
        };
        let mut bc = Bytecode::new();
        node.lower(&mut bc).unwrap();
        assert_eq!(
            opcodes(&bc),
            vec![OpCode::Push, OpCode::Neg, OpCode::Resolve, OpCode::SetResult]
        );
    }

    #[test]
    fn test_lower_bare_return_is_empty() {
        let node = Node::Return {
            argument: None,
            span: Span::new(0, 7),
        };
        let mut bc = Bytecode::new();
        node.lower(&mut bc).unwrap();
        assert!(bc.is_empty());
    }

    #[test]
    fn test_lower_conditional_order() {
        let node = Node::Conditional {
            test: Rc::new(Node::Literal {
                value: Literal::Boolean(true),
                span: Span::new(0, 4),
            }),
            consequent: num(1.0, 7),
            alternate: num(2.0, 11),
            span: Span::new(0, 12),
        };
        let mut bc = Bytecode::new();
        node.lower(&mut bc).unwrap();
        assert_eq!(
            opcodes(&bc),
            vec![OpCode::Push, OpCode::Push, OpCode::Push, OpCode::Conditional]
        );
        assert_eq!(
            bc.instructions[0].operand,
            Some(Value::Boolean(true).into())
        );
    }

    #[test]
    fn test_deep_chain_lowers_and_drops() {
        let mut node = Node::Literal {
            value: Literal::Number(Number::Float(0.0)),
            span: Span::new(0, 1),
        };
        for i in 1..=100_000 {
            node = Node::Binary {
                op: BinaryOp::Add,
                left: Rc::new(node),
                right: num(1.0, i),
                span: Span::new(0, i + 1),
            };
        }
        let mut bc = Bytecode::new();
        node.lower(&mut bc).unwrap();
        assert_eq!(bc.len(), 200_001);
        assert_eq!(bc.instructions[200_000].opcode, OpCode::Add);

        // A shallow copy shares the chain; the last owner tears it down
        let copy = node.clone();
        drop(node);
        assert_eq!(copy.span(), Span::new(0, 100_001));
        drop(copy);
    }

    #[test]
    fn test_lower_unsupported_nodes() {
        let ident = Node::IdentifierReference {
            name: "x".into(),
            span: Span::new(0, 1),
        };
        let call = Node::Call {
            callee: Rc::new(ident.clone()),
            arguments: vec![],
            span: Span::new(0, 3),
        };
        let string = Node::Literal {
            value: Literal::String("'a'".into()),
            span: Span::new(0, 3),
        };
        for node in [ident, call, string] {
            let mut bc = Bytecode::new();
            assert!(matches!(
                node.lower(&mut bc),
                Err(CompileError::Unsupported(_))
            ));
        }
    }
}
