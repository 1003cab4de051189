//! The regular-expression backend.
//!
//! Wraps the `regex` crate behind the narrow interface the regex commands
//! need: validity, a match cursor over one input string, group access, and
//! the unmatched head/tail around the current match.

use tglng::error::EvalError;

/// The name surfaced by `rx-support`.
pub const SUPPORT_NAME: &str = "rust-regex";

pub struct Rx {
    regex: Result<regex::Regex, String>,
    input: String,
    /// Byte offset where the next match attempt starts.
    cursor: usize,
    /// Spans of the groups of the last successful match.
    groups: Vec<Option<(usize, usize)>>,
    /// Span of unmatched text skipped by the last match.
    head: (usize, usize),
}

impl Rx {
    /// Compiles a pattern. Option characters: `i` for case-insensitive, `l`
    /// for multi-line.
    pub fn new(pattern: &str, options: &str) -> Rx {
        let mut builder = regex::RegexBuilder::new(pattern);
        for option in options.chars() {
            match option {
                'i' => {
                    builder.case_insensitive(true);
                }
                'l' => {
                    builder.multi_line(true);
                }
                _ => (),
            }
        }
        Rx {
            regex: builder.build().map_err(|error| error.to_string()),
            input: String::new(),
            cursor: 0,
            groups: Vec::new(),
            head: (0, 0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_ok()
    }

    /// A compile error suitable for propagation.
    pub fn why(&self, pattern: &str) -> EvalError {
        match &self.regex {
            Ok(_) => EvalError::new(format!("regex unexpectedly valid: {pattern}")),
            Err(error) => EvalError::new(format!("invalid regex {pattern}: {error}")),
        }
    }

    /// The offset within the pattern of the compile error. Zero when
    /// unknown; the backend does not report positions.
    pub fn error_offset(&self) -> usize {
        0
    }

    /// Sets a new input string, resetting the match cursor.
    pub fn set_input<T: Into<String>>(&mut self, input: T) {
        self.input = input.into();
        self.cursor = 0;
        self.groups.clear();
        self.head = (0, 0);
    }

    /// Tries to match at or after the cursor; successive calls walk the
    /// input.
    pub fn advance(&mut self) -> bool {
        let Ok(regex) = &self.regex else {
            return false;
        };
        if self.cursor > self.input.len() {
            return false;
        }
        match regex.captures_at(&self.input, self.cursor) {
            Some(captures) => {
                let whole = captures.get(0).expect("group 0 always participates");
                self.head = (self.cursor, whole.start());
                self.groups = captures
                    .iter()
                    .map(|group| group.map(|m| (m.start(), m.end())))
                    .collect();
                self.cursor = if whole.end() == whole.start() {
                    // An empty match must still advance the cursor.
                    next_char_boundary(&self.input, whole.end())
                } else {
                    whole.end()
                };
                true
            }
            None => {
                self.groups.clear();
                false
            }
        }
    }

    /// The number of groups in the last match, including group 0.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The text of a group of the last match; the empty string for groups
    /// that did not participate.
    pub fn group(&self, index: usize) -> String {
        match self.groups.get(index) {
            Some(Some((start, end))) => self.input[*start..*end].to_string(),
            _ => String::new(),
        }
    }

    /// The input skipped between the previous cursor position and the last
    /// match.
    pub fn head(&self) -> String {
        self.input[self.head.0..self.head.1].to_string()
    }

    /// The input after the last match.
    pub fn tail(&self) -> String {
        self.input[self.cursor.min(self.input.len())..].to_string()
    }
}

fn next_char_boundary(s: &str, from: usize) -> usize {
    let mut index = from + 1;
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index.min(s.len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_match_and_groups() {
        let mut rx = Rx::new("(f)(o+)", "");
        assert!(rx.is_valid());
        rx.set_input("xfoox");
        assert!(rx.advance());
        assert_eq!(rx.group_count(), 3);
        assert_eq!(rx.group(0), "foo");
        assert_eq!(rx.group(1), "f");
        assert_eq!(rx.group(2), "oo");
        assert_eq!(rx.head(), "x");
        assert_eq!(rx.tail(), "x");
        assert!(!rx.advance());
    }

    #[test]
    fn successive_matches_walk_the_input() {
        let mut rx = Rx::new("[0-9]+", "");
        rx.set_input("a1b22c333");
        assert!(rx.advance());
        assert_eq!(rx.group(0), "1");
        assert_eq!(rx.head(), "a");
        assert!(rx.advance());
        assert_eq!(rx.group(0), "22");
        assert_eq!(rx.head(), "b");
        assert!(rx.advance());
        assert_eq!(rx.group(0), "333");
        assert_eq!(rx.tail(), "");
        assert!(!rx.advance());
    }

    #[test]
    fn case_insensitive_option() {
        let mut rx = Rx::new("abc", "i");
        rx.set_input("xABCx");
        assert!(rx.advance());
        assert_eq!(rx.group(0), "ABC");
    }

    #[test]
    fn multi_line_option() {
        let mut rx = Rx::new("^b", "l");
        rx.set_input("a\nb");
        assert!(rx.advance());
    }

    #[test]
    fn invalid_pattern() {
        let rx = Rx::new("(unclosed", "");
        assert!(!rx.is_valid());
        assert_eq!(rx.error_offset(), 0);
    }

    #[test]
    fn empty_match_advances() {
        let mut rx = Rx::new("x?", "");
        rx.set_input("ab");
        assert!(rx.advance());
        assert!(rx.advance());
        assert!(rx.advance());
        assert!(!rx.advance());
    }
}
