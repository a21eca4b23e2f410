//! Script compiler
//!
//! Parses a whole script body and lowers each statement, in order, into
//! one flat instruction sequence.

use super::Parser;
use super::error::SyntaxError;
use crate::vm::opcode::Bytecode;

/// Compiler state
pub struct Compiler {
    parser: Parser,
    bytecode: Bytecode,
}

impl Compiler {
    /// Create a new compiler for the given source
    pub fn new(source: &str) -> Self {
        Self::with_max_depth(source, Parser::DEFAULT_MAX_DEPTH)
    }

    /// Create a compiler whose parser stops at `max_depth` nested constructs
    pub fn with_max_depth(source: &str, max_depth: usize) -> Self {
        Compiler {
            parser: Parser::with_max_depth(source, max_depth),
            bytecode: Bytecode::new(),
        }
    }

    /// Compile the source and return bytecode
    pub fn compile(mut self) -> Result<Bytecode, CompileError> {
        let statements = self.parser.parse_script()?;
        log::debug!("parsed {} statements", statements.len());

        for statement in &statements {
            statement.lower(&mut self.bytecode)?;
        }
        Ok(self.bytecode)
    }
}

/// Compile `source` in one call
pub fn compile(source: &str) -> Result<Bytecode, CompileError> {
    Compiler::new(source).compile()
}

/// Compilation error
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// Lowering reached a construct with no code generation
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::error::SyntaxErrorKind;
    use crate::value::Value;
    use crate::vm::opcode::{Instruction, OpCode};
    use proptest::prelude::*;

    fn opcodes(bc: &Bytecode) -> Vec<OpCode> {
        bc.iter().map(|i| i.opcode).collect()
    }

    #[test]
    fn test_compile_literal_statement() {
        let bc = compile("123;").unwrap();
        assert_eq!(
            bc.instructions,
            vec![
                Instruction::with_operand(OpCode::Push, Value::float(123.0)),
                Instruction::new(OpCode::Resolve),
                Instruction::new(OpCode::SetResult),
            ]
        );
    }

    #[test]
    fn test_compile_operands_left_to_right() {
        let bc = compile("2 * 3 ** 2;").unwrap();
        assert_eq!(
            opcodes(&bc),
            vec![
                OpCode::Push,
                OpCode::Push,
                OpCode::Push,
                OpCode::Pow,
                OpCode::Mul,
                OpCode::Resolve,
                OpCode::SetResult,
            ]
        );
        assert_eq!(bc.instructions[0].operand, Some(Value::float(2.0).into()));
    }

    #[test]
    fn test_compile_statement_sequence() {
        let bc = compile("1; return; 2;").unwrap();
        assert_eq!(bc.len(), 6);
        assert!(compile("").unwrap().is_empty());
    }

    #[test]
    fn test_syntax_error_passes_through() {
        let err = compile("(1;").unwrap_err();
        let CompileError::Syntax(err) = err else {
            panic!("expected syntax error");
        };
        assert_eq!(err.kind, SyntaxErrorKind::MissingCloseParen);
        assert_eq!(err.tag(), "missing )");
    }

    #[test]
    fn test_unsupported_constructs() {
        for src in ["x;", "f();", "'s';", "function f() {}"] {
            assert!(
                matches!(compile(src), Err(CompileError::Unsupported(_))),
                "{:?}",
                src
            );
        }
        assert_eq!(
            compile("x;").unwrap_err().to_string(),
            "identifier reference is not supported"
        );
    }

    #[test]
    fn test_long_chain_lowers_flat() {
        let src = format!("{}1;", "1 - ".repeat(20_000));
        let bc = compile(&src).unwrap();
        // 20001 pushes, 20000 subtractions, resolve, set result
        assert_eq!(bc.len(), 40_003);
        assert_eq!(bc.instructions[40_000].opcode, OpCode::Sub);
    }

    #[test]
    fn test_nesting_limit_is_configurable() {
        let src = "((((1))));";
        assert!(Compiler::with_max_depth(src, 4).compile().is_ok());

        let err = Compiler::with_max_depth(src, 3).compile().unwrap_err();
        assert!(matches!(err, CompileError::Syntax(e) if e.kind == SyntaxErrorKind::NestingTooDeep));
    }

    proptest! {
        #[test]
        fn prop_compile_is_idempotent(src in "[0-9 ()?:;,+*%&|^!~<>=-]{0,32}") {
            prop_assert_eq!(compile(&src), compile(&src));
        }
    }
}
