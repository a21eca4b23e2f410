//! Unicode utilities
//!
//! Code-point classification for the lexical grammar.

/// Check if a code point is a line terminator
#[inline]
pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\u{000A}' | '\u{000D}' | '\u{2028}' | '\u{2029}')
}

/// Check if a code point is whitespace (line terminators excluded)
#[inline]
pub fn is_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'  // Tab
        | '\u{000B}' // Vertical Tab
        | '\u{000C}' // Form Feed
        | '\u{0020}' // Space
        | '\u{00A0}' // No-Break Space
        | '\u{FEFF}' // BOM
    ) || is_unicode_space(c)
}

/// Check if a code point is a Unicode space separator (Zs) outside ASCII
#[inline]
pub fn is_unicode_space(c: char) -> bool {
    matches!(c, '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}')
}

/// Check if a code point can start an identifier
#[inline]
pub fn is_id_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$' || (!c.is_ascii() && c.is_alphabetic())
}

/// Check if a code point can continue an identifier
#[inline]
pub fn is_id_continue(c: char) -> bool {
    is_id_start(c)
        || c.is_ascii_digit()
        || (!c.is_ascii() && c.is_alphanumeric())
        || is_combining_mark(c)
        || matches!(c, '\u{200C}' | '\u{200D}') // ZWNJ, ZWJ
}

/// Combining diacritical marks (simplified Mn/Mc check)
fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{20D0}'..='\u{20FF}')
}

/// Check if a code point is a decimal digit
#[inline]
pub fn is_decimal_digit(c: char) -> bool {
    c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_terminators() {
        assert!(is_line_terminator('\n'));
        assert!(is_line_terminator('\r'));
        assert!(is_line_terminator('\u{2028}'));
        assert!(!is_line_terminator(' '));
    }

    #[test]
    fn test_whitespace_excludes_line_terminators() {
        assert!(is_whitespace(' '));
        assert!(is_whitespace('\t'));
        assert!(is_whitespace('\u{3000}'));
        assert!(!is_whitespace('\n'));
        assert!(!is_whitespace('a'));
    }

    #[test]
    fn test_identifier_chars() {
        assert!(is_id_start('$'));
        assert!(is_id_start('_'));
        assert!(is_id_start('é'));
        assert!(!is_id_start('1'));
        assert!(is_id_continue('1'));
        assert!(is_id_continue('\u{0301}'));
        assert!(!is_id_continue('-'));
    }
}
