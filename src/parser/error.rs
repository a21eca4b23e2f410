//! Syntax errors and the three-way parse result

use std::fmt;

use super::ast::Span;

/// What the parser found missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    MissingOpenParen,
    MissingCloseParen,
    MissingOpenBrace,
    MissingCloseBrace,
    MissingSemicolon,
    MissingColon,
    MissingExpression,
    MissingIdentifier,
    UnexpectedToken,
    /// Nested constructs exceed the parser's nesting limit
    NestingTooDeep,
}

impl SyntaxErrorKind {
    /// Message tag reported to callers
    pub const fn tag(self) -> &'static str {
        match self {
            Self::MissingOpenParen => "missing (",
            Self::MissingCloseParen => "missing )",
            Self::MissingOpenBrace => "missing {",
            Self::MissingCloseBrace => "missing }",
            Self::MissingSemicolon => "missing ;",
            Self::MissingColon => "missing :",
            Self::MissingExpression => "missing expression",
            Self::MissingIdentifier => "missing identifier",
            Self::UnexpectedToken => "unexpected token",
            Self::NestingTooDeep => "nesting too deep",
        }
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A committed parse that turned out malformed
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("SyntaxError: {kind} at {}..{}", .span.start, .span.end)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, start: usize, end: usize) -> Self {
        SyntaxError {
            kind,
            span: Span::new(start, end),
        }
    }

    /// Message tag, such as `missing )`
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}

/// Outcome of a grammar production
///
/// - `Ok(Some(node))`: matched
/// - `Ok(None)`: nothing matches here; the cursor has not moved
/// - `Err(error)`: a partial match was committed and is malformed
pub type Parsed<T> = Result<Option<T>, SyntaxError>;
