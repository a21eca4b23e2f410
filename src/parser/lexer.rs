//! Lexical matchers
//!
//! Each production of the lexical grammar is a free function over a
//! [`Scanner`]. A matcher either consumes input and returns the matched
//! source text, or returns `None` and leaves the cursor where it was.
//! Nothing here skips whitespace implicitly; the parser decides where
//! trivia and line terminators are allowed.

use lazy_static::lazy_static;
use regex::Regex;

use super::scanner::Scanner;
use crate::util::unicode::{
    is_decimal_digit, is_id_continue, is_id_start, is_line_terminator, is_whitespace,
};
use crate::value::Number;

/// Punctuators, excluding `/`, `/=`, `}` and the optional-chaining `?.`
pub const PUNCTUATORS: &[&str] = &[
    "{", "(", ")", "[", "]", ".", "...", ";", ",", "<", ">", "<=", ">=", "==", "!=", "===",
    "!==", "+", "-", "*", "%", "**", "++", "--", "<<", ">>", ">>>", "&", "|", "^", "!", "~",
    "&&", "||", "??", "?", ":", "=", "+=", "-=", "*=", "%=", "**=", "<<=", ">>=", ">>>=", "&=",
    "|=", "^=", "&&=", "||=", "??=", "=>",
];

pub const DIV_PUNCTUATORS: &[&str] = &["/", "/="];

/// Words that can never be identifiers
pub const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

lazy_static! {
    static ref DECIMAL_LITERAL: Regex =
        Regex::new(r"^(?:(?:0|[1-9][0-9]*)(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap();
    static ref NON_OCTAL_DECIMAL_LITERAL: Regex =
        Regex::new(r"^0[0-7]*[89][0-9]*(?:\.[0-9]*)?(?:[eE][+-]?[0-9]+)?").unwrap();
    static ref LEGACY_OCTAL_LITERAL: Regex = Regex::new(r"^0[0-7]+").unwrap();
    static ref BINARY_LITERAL: Regex = Regex::new(r"^0[bB][01]+").unwrap();
    static ref OCTAL_LITERAL: Regex = Regex::new(r"^0[oO][0-7]+").unwrap();
    static ref HEX_LITERAL: Regex = Regex::new(r"^0[xX][0-9a-fA-F]+").unwrap();
}

/// Which numeric sub-grammar produced a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    Decimal,
    NonOctalDecimal,
    Binary,
    Octal,
    Hex,
    LegacyOctal,
}

impl NumericKind {
    fn pattern(self) -> &'static Regex {
        match self {
            NumericKind::Decimal => &*DECIMAL_LITERAL,
            NumericKind::NonOctalDecimal => &*NON_OCTAL_DECIMAL_LITERAL,
            NumericKind::Binary => &*BINARY_LITERAL,
            NumericKind::Octal => &*OCTAL_LITERAL,
            NumericKind::Hex => &*HEX_LITERAL,
            NumericKind::LegacyOctal => &*LEGACY_OCTAL_LITERAL,
        }
    }

    const ALL: [NumericKind; 6] = [
        NumericKind::Decimal,
        NumericKind::NonOctalDecimal,
        NumericKind::Binary,
        NumericKind::Octal,
        NumericKind::Hex,
        NumericKind::LegacyOctal,
    ];
}

pub fn punctuator(s: &mut Scanner) -> Option<String> {
    let start = s.position();
    let text = s.match_literal(PUNCTUATORS, false)?;

    // `?.` is only optional chaining when no digit follows (`a?.5:1`)
    if text == "?" && s.peek() == Some('.') && !s.peek_at(1).is_some_and(is_decimal_digit) {
        s.advance();
        return Some(s.slice(start, s.position()).to_string());
    }
    Some(text)
}

pub fn div_punctuator(s: &mut Scanner) -> Option<String> {
    if matches!(s.peek_at(1), Some('/' | '*')) && s.peek() == Some('/') {
        return None;
    }
    s.match_literal(DIV_PUNCTUATORS, false)
}

pub fn right_brace_punctuator(s: &mut Scanner) -> Option<String> {
    s.match_literal(&["}"], false)
}

pub fn line_terminator(s: &mut Scanner) -> Option<String> {
    s.advance_if(is_line_terminator).map(String::from)
}

/// `<CR><LF>` or any single line terminator
pub fn line_terminator_sequence(s: &mut Scanner) -> Option<String> {
    s.match_literal(&["\r\n"], false)
        .or_else(|| line_terminator(s))
}

/// A run of one or more whitespace code points
pub fn whitespace(s: &mut Scanner) -> Option<String> {
    let start = s.position();
    while s.advance_if(is_whitespace).is_some() {}
    if s.position() == start {
        return None;
    }
    Some(s.slice(start, s.position()).to_string())
}

/// `// ...` up to (not including) the line terminator
pub fn single_line_comment(s: &mut Scanner) -> Option<String> {
    let start = s.position();
    s.match_literal(&["//"], false)?;
    while s.advance_if(|c| !is_line_terminator(c)).is_some() {}
    Some(s.slice(start, s.position()).to_string())
}

/// `/* ... */`; an unterminated comment does not match
pub fn multi_line_comment(s: &mut Scanner) -> Option<String> {
    s.attempt(|s| {
        let start = s.position();
        s.match_literal(&["/*"], false)?;
        loop {
            if s.match_literal(&["*/"], false).is_some() {
                return Some(s.slice(start, s.position()).to_string());
            }
            s.advance()?;
        }
    })
}

pub fn comment(s: &mut Scanner) -> Option<String> {
    multi_line_comment(s).or_else(|| single_line_comment(s))
}

pub fn null_literal(s: &mut Scanner) -> Option<String> {
    keyword(s, "null")
}

pub fn boolean_literal(s: &mut Scanner) -> Option<String> {
    keyword(s, "true").or_else(|| keyword(s, "false"))
}

/// Raw identifier name, reserved words included
pub fn identifier_name(s: &mut Scanner) -> Option<String> {
    let start = s.position();
    s.advance_if(is_id_start)?;
    while s.advance_if(is_id_continue).is_some() {}
    Some(s.slice(start, s.position()).to_string())
}

/// Identifier name that is not a reserved word
pub fn identifier(s: &mut Scanner) -> Option<String> {
    s.attempt(|s| identifier_name(s).filter(|name| !is_reserved_word(name)))
}

#[inline]
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Match exactly `word` as a whole identifier name
///
/// `in` does not match the start of `instanceof` or `index`.
pub fn keyword(s: &mut Scanner, word: &str) -> Option<String> {
    s.attempt(|s| identifier_name(s).filter(|name| name == word))
}

/// Match one numeric sub-grammar at the cursor
pub fn numeric_literal_of(s: &mut Scanner, kind: NumericKind) -> Option<String> {
    s.attempt(|s| {
        let text = s.match_pattern(&[kind.pattern()])?;
        // The source character after a numeric literal must not be an
        // identifier start or a digit
        match s.peek() {
            Some(c) if is_id_start(c) || is_decimal_digit(c) => None,
            _ => Some(text),
        }
    })
}

/// Longest numeric literal across every numeric sub-grammar
pub fn numeric_literal(s: &mut Scanner) -> Option<(String, NumericKind)> {
    let start = s.position();
    let mut best: Option<(String, NumericKind, usize)> = None;

    for kind in NumericKind::ALL {
        s.set_position(start);
        if let Some(text) = numeric_literal_of(s, kind) {
            let end = s.position();
            if best.as_ref().is_none_or(|(_, _, best_end)| end > *best_end) {
                best = Some((text, kind, end));
            }
        }
    }

    match best {
        Some((text, kind, end)) => {
            s.set_position(end);
            Some((text, kind))
        }
        None => {
            s.set_position(start);
            None
        }
    }
}

/// Numeric value of a literal matched by [`numeric_literal`]
///
/// Decimal forms are floats; radix forms are integers unless they overflow
/// 64 bits.
pub fn numeric_value(text: &str, kind: NumericKind) -> Number {
    let (digits, radix) = match kind {
        NumericKind::Decimal | NumericKind::NonOctalDecimal => {
            return Number::Float(text.parse().unwrap_or(f64::NAN));
        }
        NumericKind::Binary => (&text[2..], 2),
        NumericKind::Octal => (&text[2..], 8),
        NumericKind::Hex => (&text[2..], 16),
        NumericKind::LegacyOctal => (&text[1..], 8),
    };

    match i64::from_str_radix(digits, radix) {
        Ok(i) => Number::Int(i),
        Err(_) => Number::Float(digits.chars().fold(0.0, |acc, c| {
            acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64
        })),
    }
}

/// String literal including its quotes
///
/// A backslash followed by a line terminator sequence is a line
/// continuation. Any other backslash must begin a valid escape sequence.
pub fn string_literal(s: &mut Scanner) -> Option<String> {
    s.attempt(|s| {
        let start = s.position();
        let quote = s.advance_if(|c| c == '"' || c == '\'')?;
        loop {
            match s.advance()? {
                c if c == quote => break,
                '\\' => {
                    if line_terminator_sequence(s).is_none() {
                        escape_sequence(s)?;
                    }
                }
                // LS and PS are allowed in string literals
                '\u{2028}' | '\u{2029}' => {}
                c if is_line_terminator(c) => return None,
                _ => {}
            }
        }
        Some(s.slice(start, s.position()).to_string())
    })
}

/// Escape sequence after the backslash
fn escape_sequence(s: &mut Scanner) -> Option<()> {
    match s.advance()? {
        '\'' | '"' | '\\' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' => Some(()),
        // \0 or a legacy octal escape such as \12 or \377
        '0'..='3' => {
            if s.advance_if(|c| matches!(c, '0'..='7')).is_some() {
                s.advance_if(|c| matches!(c, '0'..='7'));
            }
            Some(())
        }
        '4'..='7' => {
            s.advance_if(|c| matches!(c, '0'..='7'));
            Some(())
        }
        // NonOctalDecimalEscapeSequence
        '8' | '9' => Some(()),
        'x' => {
            s.advance_if(|c| c.is_ascii_hexdigit())?;
            s.advance_if(|c| c.is_ascii_hexdigit())?;
            Some(())
        }
        'u' => unicode_escape(s),
        c if is_line_terminator(c) => None,
        // NonEscapeCharacter
        _ => Some(()),
    }
}

/// `XXXX` or `{X...}` after `\u`
fn unicode_escape(s: &mut Scanner) -> Option<()> {
    if s.advance_if(|c| c == '{').is_some() {
        let mut value: u32 = 0;
        let mut digits = 0;
        while let Some(c) = s.advance_if(|c| c.is_ascii_hexdigit()) {
            value = value.saturating_mul(16).saturating_add(c.to_digit(16)?);
            digits += 1;
        }
        s.advance_if(|c| c == '}')?;
        return (digits > 0 && value <= 0x10FFFF).then_some(());
    }
    for _ in 0..4 {
        s.advance_if(|c| c.is_ascii_hexdigit())?;
    }
    Some(())
}
