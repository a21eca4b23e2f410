//! Operand stack for the VM

use crate::value::Operand;

/// Operand stack for bytecode execution
pub struct Stack {
    /// Stack storage
    operands: Vec<Operand>,
    /// Largest number of operands the stack may hold
    max_depth: usize,
}

impl Stack {
    /// Create a new stack with the given initial capacity and depth limit
    pub fn new(capacity: usize, max_depth: usize) -> Self {
        Stack {
            operands: Vec::with_capacity(capacity.min(max_depth)),
            max_depth,
        }
    }

    /// Push an operand onto the stack
    ///
    /// Returns `None` when the depth limit is reached.
    #[inline]
    pub fn push(&mut self, operand: impl Into<Operand>) -> Option<()> {
        if self.operands.len() >= self.max_depth {
            return None;
        }
        self.operands.push(operand.into());
        Some(())
    }

    /// Pop an operand from the stack
    #[inline]
    pub fn pop(&mut self) -> Option<Operand> {
        self.operands.pop()
    }

    /// Peek at the top operand without removing it
    #[inline]
    pub fn peek(&self) -> Option<&Operand> {
        self.operands.last()
    }

    /// Peek at an operand at offset from top (0 = top)
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<&Operand> {
        let len = self.operands.len();
        if offset < len {
            Some(&self.operands[len - 1 - offset])
        } else {
            None
        }
    }

    /// Get the current stack depth
    #[inline]
    pub fn len(&self) -> usize {
        self.operands.len()
    }

    /// Check if the stack is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Drop every operand
    pub fn clear(&mut self) {
        self.operands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Reference, Value};

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new(16, 16);

        stack.push(Value::int(1)).unwrap();
        stack.push(Value::int(2)).unwrap();
        stack.push(Value::int(3)).unwrap();

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some(Value::int(3).into()));
        assert_eq!(stack.pop(), Some(Value::int(2).into()));
        assert_eq!(stack.pop(), Some(Value::int(1).into()));
        assert!(stack.is_empty());
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_peek() {
        let mut stack = Stack::new(16, 16);

        stack.push(Value::int(1)).unwrap();
        stack.push(Reference::new("x")).unwrap();

        assert!(matches!(stack.peek(), Some(Operand::Reference(_))));
        assert!(matches!(stack.peek_at(0), Some(Operand::Reference(_))));
        assert_eq!(stack.peek_at(1), Some(&Value::int(1).into()));
        assert!(stack.peek_at(2).is_none());
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = Stack::new(1024, 2);
        assert_eq!(stack.max_depth(), 2);

        assert!(stack.push(Value::Null).is_some());
        assert!(stack.push(Value::Null).is_some());
        assert!(stack.push(Value::Null).is_none());
        assert_eq!(stack.len(), 2);

        stack.clear();
        assert!(stack.is_empty());
    }
}
