//! Virtual machine module
//!
//! The VM executes straight-line bytecode on an operand stack.

pub mod interpreter;
pub mod opcode;
pub mod stack;

pub use interpreter::{Interpreter, InterpreterError, InterpreterResult};
pub use opcode::{Bytecode, Instruction, OpCode};
pub use stack::Stack;
