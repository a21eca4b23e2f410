//! Script execution context
//!
//! The Context is the main entry point for the engine: it compiles a
//! script body to bytecode and runs it, yielding the value of the last
//! expression statement.

use crate::parser::Parser;
use crate::parser::compiler::{CompileError, Compiler};
use crate::value::Value;
use crate::vm::Interpreter;
use crate::vm::interpreter::InterpreterError;
use crate::vm::opcode::Bytecode;

/// Context settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    /// Operand stack capacity reserved up front
    pub stack_capacity: usize,
    /// Operand stack depth at which execution fails with a stack overflow
    pub max_stack_depth: usize,
    /// Nested constructs the parser accepts before a syntax error
    pub max_parse_depth: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            stack_capacity: Interpreter::DEFAULT_STACK_SIZE,
            max_stack_depth: Interpreter::DEFAULT_MAX_STACK_DEPTH,
            max_parse_depth: Parser::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Script execution context
pub struct Context {
    config: ContextConfig,
    /// Bytecode interpreter
    interpreter: Interpreter,
}

/// Error from script evaluation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Compilation error
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Runtime error
    #[error("runtime error: {0}")]
    Runtime(#[from] InterpreterError),
}

impl Context {
    /// Create a context with default settings
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Context {
            config,
            interpreter: Interpreter::with_config(config.stack_capacity, config.max_stack_depth),
        }
    }

    #[inline]
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Evaluate script source code
    ///
    /// Returns the value of the last expression statement, or undefined if
    /// none ran.
    pub fn eval(&mut self, source: &str) -> Result<Value, EvalError> {
        let bytecode = self.compile(source)?;
        self.execute(&bytecode)
    }

    /// Compile script source code without executing
    pub fn compile(&self, source: &str) -> Result<Bytecode, CompileError> {
        let bytecode = Compiler::with_max_depth(source, self.config.max_parse_depth).compile()?;
        log::debug!("compiled {} instructions", bytecode.len());
        #[cfg(feature = "dump")]
        log::debug!("bytecode:\n{}", bytecode);
        Ok(bytecode)
    }

    /// Execute pre-compiled bytecode
    pub fn execute(&mut self, bytecode: &Bytecode) -> Result<Value, EvalError> {
        Ok(self.interpreter.execute(bytecode)?)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
