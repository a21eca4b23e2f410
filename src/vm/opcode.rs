//! Bytecode opcode definitions
//!
//! The instruction set is stack-based and straight-line: there are no
//! jumps, calls or frames. Each opcode has:
//! - Number of operands popped from the stack (n_pop)
//! - Number of operands pushed to the stack (n_push)
//! - An operand format (whether the instruction carries an inline operand)

use std::fmt;

use crate::value::Operand;

/// Opcode operand formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpFormat {
    /// No operand
    None,
    /// Inline operand value
    Operand,
}

/// Script bytecode opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Invalid opcode (never emitted)
    Invalid = 0,

    // Push values
    /// Push the inline operand
    Push,
    /// Resolve a reference to a value: ref -> val
    Resolve,
    /// Pop into the last-result register: a ->
    SetResult,

    // Unary operations
    /// Unary plus: +a
    Plus,
    /// Negate: -a
    Neg,
    /// Bitwise NOT: ~a
    Not,
    /// Logical NOT: !a
    LNot,
    /// delete operator
    Delete,
    /// void operator
    Void,
    /// typeof operator
    TypeOf,
    /// await operator
    Await,

    // Binary arithmetic
    /// Power: a ** b
    Pow,
    /// Multiply: a * b
    Mul,
    /// Divide: a / b
    Div,
    /// Modulo: a % b
    Mod,
    /// Add: a + b
    Add,
    /// Subtract: a - b
    Sub,
    /// Left shift: a << b
    Shl,
    /// Arithmetic right shift: a >> b
    Sar,
    /// Logical right shift: a >>> b
    Shr,

    // Comparison
    /// Less than: a < b
    Lt,
    /// Less than or equal: a <= b
    Lte,
    /// Greater than: a > b
    Gt,
    /// Greater than or equal: a >= b
    Gte,
    /// instanceof operator
    InstanceOf,
    /// in operator
    In,
    /// Equal: a == b
    Eq,
    /// Not equal: a != b
    Neq,
    /// Strict equal: a === b
    StrictEq,
    /// Strict not equal: a !== b
    StrictNeq,

    // Bitwise
    /// Bitwise AND: a & b
    And,
    /// Bitwise XOR: a ^ b
    Xor,
    /// Bitwise OR: a | b
    Or,

    // Logical
    /// Logical AND over booleans: a && b
    LAnd,
    /// Logical OR over booleans: a || b
    LOr,
    /// Nullish coalescing: a ?? b
    Coalesce,

    // Sequencing
    /// Comma: a b -> b
    Comma,
    /// Conditional: test a b -> (test ? a : b)
    Conditional,
}

impl OpCode {
    pub const COUNT: usize = OpCode::Conditional as usize + 1;

    /// Static metadata for this opcode
    #[inline]
    pub fn info(self) -> &'static OpCodeInfo {
        &OPCODE_INFO[self as usize]
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Opcode metadata
#[derive(Debug, Clone, Copy)]
pub struct OpCodeInfo {
    pub name: &'static str,
    pub n_pop: u8,
    pub n_push: u8,
    pub format: OpFormat,
}

impl OpCodeInfo {
    const fn new(name: &'static str, n_pop: u8, n_push: u8, format: OpFormat) -> Self {
        OpCodeInfo { name, n_pop, n_push, format }
    }

    const fn unary(name: &'static str) -> Self {
        Self::new(name, 1, 1, OpFormat::None)
    }

    const fn binary(name: &'static str) -> Self {
        Self::new(name, 2, 1, OpFormat::None)
    }
}

/// Opcode information table
pub static OPCODE_INFO: [OpCodeInfo; OpCode::COUNT] = [
    OpCodeInfo::new("invalid", 0, 0, OpFormat::None),
    OpCodeInfo::new("push", 0, 1, OpFormat::Operand),
    OpCodeInfo::unary("resolve"),
    OpCodeInfo::new("set_result", 1, 0, OpFormat::None),
    OpCodeInfo::unary("plus"),
    OpCodeInfo::unary("neg"),
    OpCodeInfo::unary("not"),
    OpCodeInfo::unary("lnot"),
    OpCodeInfo::unary("delete"),
    OpCodeInfo::unary("void"),
    OpCodeInfo::unary("typeof"),
    OpCodeInfo::unary("await"),
    OpCodeInfo::binary("pow"),
    OpCodeInfo::binary("mul"),
    OpCodeInfo::binary("div"),
    OpCodeInfo::binary("mod"),
    OpCodeInfo::binary("add"),
    OpCodeInfo::binary("sub"),
    OpCodeInfo::binary("shl"),
    OpCodeInfo::binary("sar"),
    OpCodeInfo::binary("shr"),
    OpCodeInfo::binary("lt"),
    OpCodeInfo::binary("lte"),
    OpCodeInfo::binary("gt"),
    OpCodeInfo::binary("gte"),
    OpCodeInfo::binary("instanceof"),
    OpCodeInfo::binary("in"),
    OpCodeInfo::binary("eq"),
    OpCodeInfo::binary("neq"),
    OpCodeInfo::binary("strict_eq"),
    OpCodeInfo::binary("strict_neq"),
    OpCodeInfo::binary("and"),
    OpCodeInfo::binary("xor"),
    OpCodeInfo::binary("or"),
    OpCodeInfo::binary("land"),
    OpCodeInfo::binary("lor"),
    OpCodeInfo::binary("coalesce"),
    OpCodeInfo::binary("comma"),
    OpCodeInfo::new("conditional", 3, 1, OpFormat::None),
];

/// A single instruction: an opcode and its optional inline operand
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Option<Operand>,
}

impl Instruction {
    /// Instruction without an operand
    #[inline]
    pub const fn new(opcode: OpCode) -> Self {
        Instruction {
            opcode,
            operand: None,
        }
    }

    /// Instruction carrying an inline operand
    #[inline]
    pub fn with_operand(opcode: OpCode, operand: impl Into<Operand>) -> Self {
        Instruction {
            opcode,
            operand: Some(operand.into()),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Some(operand) => write!(f, "{} {}", self.opcode, operand),
            None => write!(f, "{}", self.opcode),
        }
    }
}

/// A flat, ordered instruction sequence for one statement list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub instructions: Vec<Instruction>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn emit(&mut self, opcode: OpCode) {
        self.instructions.push(Instruction::new(opcode));
    }

    #[inline]
    pub fn emit_operand(&mut self, opcode: OpCode, operand: impl Into<Operand>) {
        self.instructions.push(Instruction::with_operand(opcode, operand));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }
}

/// Disassembly, one instruction per line
impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:4}  {}", pc, instruction)?;
        }
        Ok(())
    }
}
