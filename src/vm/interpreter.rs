//! Bytecode interpreter
//!
//! Executes one flat instruction sequence on an operand stack. There are no
//! frames and no jumps: the loop runs every instruction once, in order,
//! and either reaches the end or fails.

use crate::value::{Number, Operand, Tag, TypeError, Value};
use crate::vm::opcode::{Bytecode, Instruction, OpCode};
use crate::vm::stack::Stack;

/// Interpreter error
///
/// All of these abort execution; they point at a construct the engine
/// does not implement or at a compiler bug, never at malformed input.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InterpreterError {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("invalid opcode: {0}")]
    InvalidOpcode(OpCode),
    #[error("missing operand for {0}")]
    MissingOperand(OpCode),
    #[error(transparent)]
    Type(#[from] TypeError),
    /// Loose equality across kinds needs coercion
    #[error("cannot compare {left} with {right}")]
    IncomparableTypes { left: Tag, right: Tag },
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

/// Result type for interpreter operations
pub type InterpreterResult<T> = Result<T, InterpreterError>;

/// Interpreter state
pub struct Interpreter {
    /// Operand stack
    stack: Stack,
    /// Value of the last executed expression statement
    result: Value,
}

impl Interpreter {
    /// Default stack capacity
    pub const DEFAULT_STACK_SIZE: usize = 1024;
    /// Default stack depth limit
    pub const DEFAULT_MAX_STACK_DEPTH: usize = 64 * 1024;

    /// Create a new interpreter
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_STACK_SIZE, Self::DEFAULT_MAX_STACK_DEPTH)
    }

    /// Create an interpreter with custom settings
    pub fn with_config(stack_size: usize, max_stack_depth: usize) -> Self {
        Interpreter {
            stack: Stack::new(stack_size, max_stack_depth),
            result: Value::Undefined,
        }
    }

    /// Execute bytecode and return the value of the last expression
    /// statement, or undefined if none ran
    pub fn execute(&mut self, bytecode: &Bytecode) -> InterpreterResult<Value> {
        self.stack.clear();
        self.result = Value::Undefined;

        for (pc, instruction) in bytecode.iter().enumerate() {
            log::trace!("{:4}  {}", pc, instruction);
            if let Err(err) = self.step(instruction) {
                log::warn!("execution aborted at {} ({}): {}", pc, instruction.opcode, err);
                return Err(err);
            }
        }

        log::debug!(
            "executed {} instructions, result {}",
            bytecode.len(),
            self.result
        );
        Ok(std::mem::take(&mut self.result))
    }

    fn push(&mut self, operand: impl Into<Operand>) -> InterpreterResult<()> {
        self.stack.push(operand).ok_or(InterpreterError::StackOverflow)
    }

    fn pop(&mut self) -> InterpreterResult<Operand> {
        self.stack.pop().ok_or(InterpreterError::StackUnderflow)
    }

    /// Pop an operand and resolve it to a concrete value
    fn pop_value(&mut self) -> InterpreterResult<Value> {
        match self.pop()? {
            Operand::Value(value) => Ok(value),
            Operand::Reference(reference) => {
                reference.resolve().map_err(InterpreterError::Unsupported)
            }
        }
    }

    /// Pop the right operand, then the left
    fn pop_pair(&mut self) -> InterpreterResult<(Value, Value)> {
        let b = self.pop_value()?;
        let a = self.pop_value()?;
        Ok((a, b))
    }

    fn step(&mut self, instruction: &Instruction) -> InterpreterResult<()> {
        let opcode = instruction.opcode;
        match opcode {
            OpCode::Invalid => return Err(InterpreterError::InvalidOpcode(opcode)),

            OpCode::Push => {
                let operand = instruction
                    .operand
                    .clone()
                    .ok_or(InterpreterError::MissingOperand(opcode))?;
                self.push(operand)?;
            }
            OpCode::Resolve => {
                let val = self.pop_value()?;
                self.push(val)?;
            }
            OpCode::SetResult => {
                self.result = self.pop_value()?;
            }

            // Unary
            OpCode::Plus => {
                let val = self.pop_value()?;
                self.push(Value::float(val.expect_f64()?))?;
            }
            OpCode::Neg => {
                let val = self.pop_value()?;
                self.push(Value::float(-val.expect_f64()?))?;
            }
            OpCode::Not => {
                let val = self.pop_value()?;
                let result = Self::op_bitwise_not(val.expect_number()?);
                self.push(result)?;
            }
            OpCode::LNot => {
                let val = self.pop_value()?;
                self.push(Value::bool(!val.expect_bool()?))?;
            }
            OpCode::Delete => {
                self.pop()?;
                self.push(Value::bool(true))?;
            }
            OpCode::Void => {
                self.pop_value()?;
                self.push(Value::Undefined)?;
            }
            OpCode::TypeOf => {
                let val = self.pop_value()?;
                self.push(Value::String(val.type_of().to_string()))?;
            }
            OpCode::Await => return Err(InterpreterError::Unsupported("await")),

            // Arithmetic
            OpCode::Add => {
                let (a, b) = self.pop_pair()?;
                let result = Self::op_add(a, b)?;
                self.push(result)?;
            }
            OpCode::Pow | OpCode::Mul | OpCode::Div | OpCode::Mod | OpCode::Sub => {
                let (a, b) = self.pop_pair()?;
                let result = Self::op_arithmetic(opcode, a.expect_f64()?, b.expect_f64()?);
                self.push(result)?;
            }

            // Shift and bitwise
            OpCode::Shl | OpCode::Sar | OpCode::Shr | OpCode::And | OpCode::Xor | OpCode::Or => {
                let (a, b) = self.pop_pair()?;
                let result = Self::op_bitwise(opcode, a.expect_number()?, b.expect_number()?);
                self.push(result)?;
            }

            // Comparison
            OpCode::Lt | OpCode::Lte | OpCode::Gt | OpCode::Gte => {
                let (a, b) = self.pop_pair()?;
                let result = Self::op_relational(opcode, &a, &b)?;
                self.push(result)?;
            }
            OpCode::Eq | OpCode::Neq => {
                let (a, b) = self.pop_pair()?;
                let equal = Self::op_eq(&a, &b)?;
                self.push(Value::bool(equal == (opcode == OpCode::Eq)))?;
            }
            OpCode::StrictEq | OpCode::StrictNeq => {
                return Err(InterpreterError::Unsupported("strict equality"));
            }
            OpCode::InstanceOf => return Err(InterpreterError::Unsupported("instanceof")),
            OpCode::In => return Err(InterpreterError::Unsupported("in operator")),

            // Logical
            OpCode::LAnd => {
                let (a, b) = self.pop_pair()?;
                self.push(Value::bool(a.expect_bool()? && b.expect_bool()?))?;
            }
            OpCode::LOr => {
                let (a, b) = self.pop_pair()?;
                self.push(Value::bool(a.expect_bool()? || b.expect_bool()?))?;
            }
            OpCode::Coalesce => {
                let (a, b) = self.pop_pair()?;
                self.push(if a.is_nullish() { b } else { a })?;
            }

            // Sequencing
            OpCode::Comma => {
                let (_, b) = self.pop_pair()?;
                self.push(b)?;
            }
            OpCode::Conditional => {
                let alternate = self.pop_value()?;
                let consequent = self.pop_value()?;
                let test = self.pop_value()?;
                self.push(if test.expect_bool()? {
                    consequent
                } else {
                    alternate
                })?;
            }
        }
        Ok(())
    }

    // Arithmetic operations

    fn op_add(a: Value, b: Value) -> InterpreterResult<Value> {
        match (&a, &b) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", a, b)))
            }
            _ => Ok(Value::float(a.expect_f64()? + b.expect_f64()?)),
        }
    }

    fn op_arithmetic(opcode: OpCode, a: f64, b: f64) -> Value {
        let result = match opcode {
            OpCode::Pow => a.powf(b),
            OpCode::Mul => a * b,
            OpCode::Div => a / b,
            // Floating-point remainder, sign of the dividend
            OpCode::Mod => a % b,
            _ => a - b,
        };
        Value::float(result)
    }

    // Bitwise operations

    fn op_bitwise_not(n: Number) -> Value {
        Value::int(!n.to_uint32() as i32 as i64)
    }

    /// 32-bit integer operators; shift counts use the low five bits
    fn op_bitwise(opcode: OpCode, a: Number, b: Number) -> Value {
        let va = a.to_int32();
        let vb = b.to_int32();
        let shift = b.to_uint32() & 0x1f;
        let result = match opcode {
            OpCode::Shl => va.wrapping_shl(shift) as i64,
            OpCode::Sar => (va >> shift) as i64,
            // Unsigned result, widened without going through i32
            OpCode::Shr => (a.to_uint32() >> shift) as i64,
            OpCode::And => (va & vb) as i64,
            OpCode::Xor => (va ^ vb) as i64,
            _ => (va | vb) as i64,
        };
        Value::int(result)
    }

    // Comparison operations

    fn op_relational(opcode: OpCode, a: &Value, b: &Value) -> InterpreterResult<Value> {
        let ordering = match (a, b) {
            (Value::String(x), Value::String(y)) => Some(x.encode_utf16().cmp(y.encode_utf16())),
            _ => a.expect_f64()?.partial_cmp(&b.expect_f64()?),
        };
        // Any comparison with NaN is false
        let result = ordering.is_some_and(|ordering| match opcode {
            OpCode::Lt => ordering.is_lt(),
            OpCode::Lte => ordering.is_le(),
            OpCode::Gt => ordering.is_gt(),
            _ => ordering.is_ge(),
        });
        Ok(Value::bool(result))
    }

    /// Loose equality between values of the same kind
    fn op_eq(a: &Value, b: &Value) -> InterpreterResult<bool> {
        if a.tag() != b.tag() {
            return Err(InterpreterError::IncomparableTypes {
                left: a.tag(),
                right: b.tag(),
            });
        }
        Ok(a == b)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
