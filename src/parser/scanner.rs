//! Cursor scanner
//!
//! A position-tracking view over source text. Positions are code-point
//! indices into a buffer decoded once up front, so saving and restoring the
//! cursor is plain integer assignment.

use regex::Regex;

/// Cursor over a pre-decoded code-point buffer
#[derive(Debug, Clone)]
pub struct Scanner {
    source: String,
    chars: Vec<char>,
    /// Byte offset of each code point in `source`, plus one past the end
    offsets: Vec<usize>,
    pos: usize,
}

impl Scanner {
    /// Create a scanner positioned at the start of `source`
    pub fn new(source: &str) -> Self {
        let mut chars = Vec::with_capacity(source.len());
        let mut offsets = Vec::with_capacity(source.len() + 1);
        for (offset, c) in source.char_indices() {
            chars.push(c);
            offsets.push(offset);
        }
        offsets.push(source.len());

        Scanner {
            source: source.to_string(),
            chars,
            offsets,
            pos: 0,
        }
    }

    /// Current code-point position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor to a previously observed position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.chars.len());
        self.pos = pos.min(self.chars.len());
    }

    /// Number of code points in the source
    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Check if the cursor is past the last code point
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Peek at the current code point; `None` past EOF
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Peek `n` code points ahead of the cursor
    #[inline]
    pub fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    /// Consume the current code point
    #[inline]
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Consume the current code point if `pred` accepts it
    pub fn advance_if(&mut self, pred: impl FnOnce(char) -> bool) -> Option<char> {
        match self.peek() {
            Some(c) if pred(c) => {
                self.pos += 1;
                Some(c)
            }
            _ => None,
        }
    }

    /// Source text between two code-point positions
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        &self.source[self.offsets[start]..self.offsets[end]]
    }

    /// Remaining source from the cursor
    fn rest(&self) -> &str {
        &self.source[self.offsets[self.pos.min(self.chars.len())]..]
    }

    /// Match the longest literal candidate at the cursor
    ///
    /// On success the cursor moves past the match and the matched source
    /// text is returned. On failure the cursor is unchanged.
    pub fn match_literal(&mut self, candidates: &[&str], ignore_case: bool) -> Option<String> {
        let mut best: Option<usize> = None;

        for candidate in candidates {
            let len = candidate.chars().count();
            if len == 0 || best.is_some_and(|b| b >= len) {
                continue;
            }
            let Some(window) = self.chars.get(self.pos..self.pos + len) else {
                continue;
            };
            let matched = window.iter().zip(candidate.chars()).all(|(&a, b)| {
                if ignore_case {
                    a.to_lowercase().eq(b.to_lowercase())
                } else {
                    a == b
                }
            });
            if matched {
                best = Some(len);
            }
        }

        let len = best?;
        let text = self.slice(self.pos, self.pos + len).to_string();
        self.pos += len;
        Some(text)
    }

    /// Match the longest pattern candidate at the cursor
    ///
    /// Patterns must be anchored with `^`; they are run against the source
    /// remaining after the cursor.
    pub fn match_pattern(&mut self, patterns: &[&Regex]) -> Option<String> {
        let rest = self.rest();
        let best = patterns
            .iter()
            .filter_map(|re| re.find(rest))
            .filter(|m| m.start() == 0 && !m.as_str().is_empty())
            .map(|m| m.as_str())
            .max_by_key(|s| s.len())?
            .to_string();

        self.pos += best.chars().count();
        Some(best)
    }

    /// Run `check` against the cursor, then restore the original position
    pub fn lookahead<T>(&mut self, check: impl FnOnce(&mut Scanner) -> T) -> T {
        let start = self.pos;
        let result = check(self);
        self.pos = start;
        result
    }

    /// Run `production` and keep its progress only if it produced a value
    pub fn attempt<T>(&mut self, production: impl FnOnce(&mut Scanner) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = production(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_are_code_points() {
        let mut s = Scanner::new("é中x");
        assert_eq!(s.len(), 3);
        assert_eq!(s.advance(), Some('é'));
        assert_eq!(s.position(), 1);
        assert_eq!(s.peek(), Some('中'));
        assert_eq!(s.slice(1, 3), "中x");
    }

    #[test]
    fn test_peek_past_eof() {
        let mut s = Scanner::new("a");
        assert_eq!(s.advance(), Some('a'));
        assert!(s.is_eof());
        assert_eq!(s.peek(), None);
        assert_eq!(s.advance(), None);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn test_match_literal_longest() {
        let mut s = Scanner::new(">>>=1");
        let text = s.match_literal(&[">", ">>", ">>>", ">="], false);
        assert_eq!(text.as_deref(), Some(">>>"));
        assert_eq!(s.position(), 3);
    }

    #[test]
    fn test_match_literal_no_match_keeps_cursor() {
        let mut s = Scanner::new("abc");
        s.advance();
        assert_eq!(s.match_literal(&["x", "bcd"], false), None);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn test_match_literal_ignore_case() {
        let mut s = Scanner::new("NULL");
        assert_eq!(s.match_literal(&["null"], false), None);
        assert_eq!(s.match_literal(&["null"], true).as_deref(), Some("NULL"));
    }

    #[test]
    fn test_match_pattern_longest() {
        let short = Regex::new(r"^[0-9]").unwrap();
        let long = Regex::new(r"^[0-9]+").unwrap();
        let mut s = Scanner::new("é123;");
        s.advance();
        assert_eq!(s.match_pattern(&[&short, &long]).as_deref(), Some("123"));
        assert_eq!(s.position(), 4);
        assert_eq!(s.match_pattern(&[&short, &long]), None);
        assert_eq!(s.position(), 4);
    }

    #[test]
    fn test_lookahead_restores() {
        let mut s = Scanner::new("hello");
        let seen = s.lookahead(|s| {
            s.advance();
            s.advance();
            s.peek()
        });
        assert_eq!(seen, Some('l'));
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn test_attempt_rolls_back_on_none() {
        let mut s = Scanner::new("ab");
        let r: Option<()> = s.attempt(|s| {
            s.advance();
            None
        });
        assert!(r.is_none());
        assert_eq!(s.position(), 0);
        assert_eq!(s.attempt(|s| s.advance()), Some('a'));
        assert_eq!(s.position(), 1);
    }
}
