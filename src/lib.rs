//! MScript - a small script engine core
//!
//! Compiles an ECMAScript-like expression and statement language to flat
//! bytecode and runs it on a stack machine, yielding the value of the last
//! expression statement.
//!
//! # Features
//! - Speculative recursive-descent parser with longest-match disambiguation
//! - Full ECMAScript operator precedence over literal values
//! - 32-bit integer coercion for shift and bitwise operators
//! - Stack-based bytecode VM with a readable disassembly
//!
//! # Example
//! ```
//! use mscript::{Context, Value};
//!
//! let mut ctx = Context::new();
//! let result = ctx.eval("100 + 9 * 7;").unwrap();
//! assert_eq!(result, Value::float(163.0));
//! ```

// Core modules
pub mod value;
pub mod context;

// Virtual machine
pub mod vm;

// Parser and compiler
pub mod parser;

// Utilities
pub mod util;

// Re-export main types
pub use context::{Context, ContextConfig, EvalError};
pub use parser::compiler::{CompileError, compile};
pub use parser::error::{SyntaxError, SyntaxErrorKind};
pub use value::Value;
pub use vm::{Bytecode, InterpreterError};
