//! Script value representation
//!
//! Value is a tagged union over the primitive kinds the engine can produce.
//! Numbers keep two sub-representations: a 64-bit integer (produced by
//! radix literals and the 32-bit bitwise operators) and a 64-bit float
//! (produced by decimal literals and arithmetic). Converting between them
//! is an explicit numeric cast, not `ToNumber`.

use std::fmt;

/// Kind tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Null,
    Undefined,
    Boolean,
    Number,
    String,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tag::Null => "null",
            Tag::Undefined => "undefined",
            Tag::Boolean => "boolean",
            Tag::Number => "number",
            Tag::String => "string",
        };
        f.write_str(name)
    }
}

/// Accessor called on a value of the wrong kind
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("TypeError: expected {expected}, found {found}")]
pub struct TypeError {
    pub expected: Tag,
    pub found: Tag,
}

/// Numeric payload: either an integer or a float, never both
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Numeric cast to float
    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Numeric cast to integer (saturating, NaN becomes 0)
    #[inline]
    pub fn as_i64(self) -> i64 {
        match self {
            Number::Int(i) => i,
            Number::Float(f) => f as i64,
        }
    }

    /// ECMAScript ToInt32
    pub fn to_int32(self) -> i32 {
        match self {
            Number::Int(i) => i as i32,
            Number::Float(f) => {
                if !f.is_finite() {
                    return 0;
                }
                f.trunc().rem_euclid(4_294_967_296.0) as u32 as i32
            }
        }
    }

    /// ECMAScript ToUint32
    #[inline]
    pub fn to_uint32(self) -> u32 {
        self.to_int32() as u32
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) if x.is_nan() => f.write_str("NaN"),
            Number::Float(x) if x.is_infinite() => {
                f.write_str(if x > 0.0 { "Infinity" } else { "-Infinity" })
            }
            // -0 prints as 0, like Number.prototype.toString
            Number::Float(x) if x == 0.0 => f.write_str("0"),
            Number::Float(x) => write_float(f, x),
        }
    }
}

/// Shortest round-trip digits of a finite, non-zero float
///
/// Positional when the decimal exponent is in `-7..21`, otherwise
/// scientific with an explicit exponent sign (`1e+21`, `1.5e-7`).
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let scientific = format!("{:e}", x.abs());
    let Some((mantissa, exponent)) = scientific
        .split_once('e')
        .and_then(|(m, e)| Some((m, e.parse::<i32>().ok()?)))
    else {
        return write!(f, "{}", x);
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Digits before the decimal point
    let n = exponent + 1;

    if x < 0.0 {
        f.write_str("-")?;
    }
    if k <= n && n <= 21 {
        write!(f, "{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (whole, fraction) = digits.split_at(n as usize);
        write!(f, "{}.{}", whole, fraction)
    } else if -6 < n && n <= 0 {
        write!(f, "0.{}{}", "0".repeat(n.unsigned_abs() as usize), digits)
    } else {
        let (first, rest) = digits.split_at(1);
        let sign = if exponent < 0 { '-' } else { '+' };
        if rest.is_empty() {
            write!(f, "{}e{}{}", first, sign, exponent.unsigned_abs())
        } else {
            write!(f, "{}.{}e{}{}", first, rest, sign, exponent.unsigned_abs())
        }
    }
}

/// A concrete script value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Undefined,
    Boolean(bool),
    Number(Number),
    String(String),
}

impl Value {
    /// Integer number value
    #[inline]
    pub const fn int(i: i64) -> Self {
        Value::Number(Number::Int(i))
    }

    /// Float number value
    #[inline]
    pub const fn float(f: f64) -> Self {
        Value::Number(Number::Float(f))
    }

    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value::Boolean(b)
    }

    /// Get the kind tag
    pub const fn tag(&self) -> Tag {
        match self {
            Value::Null => Tag::Null,
            Value::Undefined => Tag::Undefined,
            Value::Boolean(_) => Tag::Boolean,
            Value::Number(_) => Tag::Number,
            Value::String(_) => Tag::String,
        }
    }

    #[inline]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null or undefined
    #[inline]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    fn mismatch(&self, expected: Tag) -> TypeError {
        TypeError {
            expected,
            found: self.tag(),
        }
    }

    /// Expect a boolean
    pub fn expect_bool(&self) -> Result<bool, TypeError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(Tag::Boolean)),
        }
    }

    /// Expect a number, in either sub-representation
    pub fn expect_number(&self) -> Result<Number, TypeError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(other.mismatch(Tag::Number)),
        }
    }

    /// Expect a number and cast it to float
    pub fn expect_f64(&self) -> Result<f64, TypeError> {
        self.expect_number().map(Number::as_f64)
    }

    /// Expect a number and cast it to integer
    pub fn expect_i64(&self) -> Result<i64, TypeError> {
        self.expect_number().map(Number::as_i64)
    }

    /// Expect a string
    pub fn expect_str(&self) -> Result<&str, TypeError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch(Tag::String)),
        }
    }

    /// Result of the `typeof` operator
    pub const fn type_of(&self) -> &'static str {
        match self {
            Value::Null => "object",
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Undefined => f.write_str("undefined"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
        }
    }
}

/// An unresolved binding, such as an identifier
///
/// Resolving a reference needs environment records, which the engine does
/// not have yet, so [`Reference::resolve`] always fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub name: String,
}

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Reference { name: name.into() }
    }

    pub fn resolve(&self) -> Result<Value, &'static str> {
        Err("reference resolution")
    }
}

/// Anything that can sit on the operand stack
///
/// Whatever is not a concrete [`Value`] is a [`Reference`].
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Reference(Reference),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl From<Reference> for Operand {
    fn from(reference: Reference) -> Self {
        Operand::Reference(reference)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(Value::String(s)) => write!(f, "{:?}", s),
            Operand::Value(v) => write!(f, "{}", v),
            Operand::Reference(r) => write!(f, "<ref {}>", r.name),
        }
    }
}
