//! The default word tokeniser and its option DSL.
//!
//! Options are a stream of directives, each an optional sign (`+` assumed)
//! followed by a code character; some codes consume one or two operand
//! characters. The defaults split on whitespace, coalesce consecutive
//! delimiters, and treat `()`, `[]` and `{}` as balanced pairs which both
//! suppress delimiters and are trimmed when they enclose a whole token.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tglng::error::EvalError;
use tglng::prelude::*;

#[derive(Clone, Default)]
pub struct Options {
    spaces_are_delims: bool,
    lines_are_delims: bool,
    nuls_are_delims: bool,
    additional_delims: HashSet<char>,
    coalesce_delims: bool,
    /// Open character to close character; delimiters inside a balanced pair
    /// do not split.
    parentheses: HashMap<char, char>,
    /// Pairs stripped when they enclose the whole token. Always also in
    /// `parentheses`.
    trim_parentheses: HashMap<char, char>,
    escape_sequences: bool,
}

impl Options {
    /// Parses an option specification on top of the defaults.
    pub fn new(spec: &str, interp: &mut Interpreter) -> Options {
        let mut options = Options::default();
        options.set_defaults();
        options.parse(spec, interp);
        options
    }

    fn set_defaults(&mut self) {
        self.nuke();
        self.spaces_are_delims = true;
        self.coalesce_delims = true;
        for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
            self.parentheses.insert(open, close);
            self.trim_parentheses.insert(open, close);
        }
    }

    fn nuke(&mut self) {
        *self = Options::default();
    }

    /// Applies the directives in `spec`. Unknown codes are ignored.
    pub fn parse(&mut self, spec: &str, interp: &mut Interpreter) {
        let chars: Vec<char> = spec.chars().collect();
        let mut positive = true;
        let mut i = 0;
        while i < chars.len() {
            let code = chars[i];
            match code {
                '+' => positive = true,
                '-' => positive = false,
                's' => self.spaces_are_delims = positive,
                'l' => self.lines_are_delims = positive,
                'n' => self.nuls_are_delims = positive,
                'c' => self.coalesce_delims = positive,
                'e' => self.escape_sequences = positive,
                '_' => self.nuke(),
                '!' => self.set_defaults(),
                'd' => {
                    i += 1;
                    if let Some(&c) = chars.get(i) {
                        if positive {
                            self.additional_delims.insert(c);
                        } else {
                            self.additional_delims.remove(&c);
                        }
                    }
                }
                'D' => self.additional_delims.clear(),
                'S' => {
                    self.spaces_are_delims = true;
                    self.lines_are_delims = false;
                    self.nuls_are_delims = false;
                    self.additional_delims.clear();
                    self.coalesce_delims = true;
                }
                'L' => {
                    self.lines_are_delims = true;
                    self.spaces_are_delims = false;
                    self.nuls_are_delims = false;
                    self.additional_delims.clear();
                    self.coalesce_delims = false;
                }
                '0' => {
                    self.nuke();
                    self.nuls_are_delims = true;
                }
                'b' => {
                    i += 2;
                    if i < chars.len() {
                        let (open, close) = (chars[i - 1], chars[i]);
                        if positive {
                            self.parentheses.insert(open, close);
                        } else {
                            self.parentheses.remove(&open);
                            self.trim_parentheses.remove(&open);
                        }
                    }
                }
                't' => {
                    i += 2;
                    if i < chars.len() {
                        let (open, close) = (chars[i - 1], chars[i]);
                        if positive {
                            self.parentheses.insert(open, close);
                            self.trim_parentheses.insert(open, close);
                        } else {
                            self.trim_parentheses.remove(&open);
                        }
                    }
                }
                '#' => {
                    // `#name#` runs the `tokfmt-name` command, a `(1 ← 0)`
                    // function, and parses its output recursively.
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && chars[end] != '#' {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    i = end;
                    let command = format!("tokfmt-{name}");
                    if let Ok(function) = Function::get(interp, &command, 1, 0, true) {
                        let mut out = vec![String::new()];
                        if function.invoke(&mut out, &[], interp).is_ok() {
                            self.parse(&out[0], interp);
                        }
                    }
                }
                _ => (),
            }
            if code != '-' {
                positive = true;
            }
            i += 1;
        }
    }

    fn is_delim(&self, c: char) -> bool {
        (self.spaces_are_delims && c.is_whitespace())
            || (self.lines_are_delims && (c == '\n' || c == '\r'))
            || (self.nuls_are_delims && c == '\0')
            || self.additional_delims.contains(&c)
    }
}

/// Substitutes C-style backslash escapes.
fn decode_escapes(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;
        match chars[i] {
            'a' => {
                out.push('\u{7}');
                i += 1;
            }
            'b' => {
                out.push('\u{8}');
                i += 1;
            }
            'e' => {
                out.push('\u{1b}');
                i += 1;
            }
            'f' => {
                out.push('\u{c}');
                i += 1;
            }
            'n' => {
                out.push('\n');
                i += 1;
            }
            'r' => {
                out.push('\r');
                i += 1;
            }
            't' => {
                out.push('\t');
                i += 1;
            }
            'v' => {
                out.push('\u{b}');
                i += 1;
            }
            '0'..='7' => {
                // Octal, greedy.
                let mut value: u32 = 0;
                while i < chars.len() && ('0'..='7').contains(&chars[i]) {
                    value = value.wrapping_mul(8) + chars[i].to_digit(8).unwrap();
                    i += 1;
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            c @ ('x' | 'X' | 'u' | 'U') => {
                i += 1;
                let mut value: u32 = 0;
                if chars.get(i) == Some(&'{') {
                    // Braced form: any number of hex digits.
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_hexdigit() {
                        value = value.wrapping_mul(16) + chars[i].to_digit(16).unwrap();
                        i += 1;
                    }
                    if chars.get(i) == Some(&'}') {
                        i += 1;
                    }
                } else {
                    let mut fixed = match c {
                        'x' | 'X' => 2,
                        'u' => 4,
                        _ => 8,
                    };
                    while i < chars.len() && chars[i].is_ascii_hexdigit() && fixed > 0 {
                        value = value.wrapping_mul(16) + chars[i].to_digit(16).unwrap();
                        i += 1;
                        fixed -= 1;
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// The default `next` function: `(token remainder ← remainder options)`.
pub fn next_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let text: Vec<char> = input[0].chars().collect();
    let options = Options::new(&input[1], interp);

    let mut off = 0;
    while off < text.len() && !options.is_delim(text[off]) {
        if options.escape_sequences && text[off] == '\\' {
            // The character after a backslash never delimits.
            off += 1;
        } else if let Some(&close) = options.parentheses.get(&text[off]) {
            // Scan to the matching close; only the outermost pair counts.
            let open = text[off];
            off += 1;
            let mut count = 1;
            while count > 0 && off < text.len() {
                if text[off] == close {
                    count -= 1;
                } else if text[off] == open {
                    count += 1;
                }
                if count > 0 {
                    off += 1;
                }
            }
        }
        off += 1;
    }

    let mut token: Vec<char> = text[..off.min(text.len())].to_vec();

    // Move past one delimiter, treating \r\n as one in line mode, then
    // coalesce any further delimiters.
    if off < text.len() {
        off += 1;
        if options.lines_are_delims
            && off < text.len()
            && text[off - 1] == '\r'
            && text[off] == '\n'
        {
            off += 1;
        }
        if options.coalesce_delims {
            while off < text.len() && options.is_delim(text[off]) {
                off += 1;
            }
        }
    }
    out[1] = text[off.min(text.len())..].iter().collect();

    // Strip a trim pair that encloses the whole token.
    if token.len() >= 2 {
        if let Some(&close) = options.trim_parentheses.get(&token[0]) {
            let open = token[0];
            let mut count = 1;
            let mut i = 1;
            while i < token.len() && count > 0 {
                if token[i] == close {
                    count -= 1;
                } else if token[i] == open {
                    count += 1;
                }
                i += 1;
            }
            if count == 0 && i == token.len() {
                token = token[1..token.len() - 1].to_vec();
            }
        }
    }

    let token: String = token.into_iter().collect();
    out[0] = if options.escape_sequences {
        decode_escapes(&token)
    } else {
        token
    };
    Ok(())
}

/// The default preprocessor: `(str ← str options)`. Drops leading
/// delimiters when coalescing is on.
pub fn pre_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let options = Options::new(&input[1], interp);
    if options.coalesce_delims {
        let text: Vec<char> = input[0].chars().collect();
        let mut off = 0;
        while off < text.len() && options.is_delim(text[off]) {
            off += 1;
        }
        out[0] = text[off..].iter().collect();
    } else {
        out[0] = input[0].clone();
    }
    Ok(())
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("default-tokeniser", Rc::new(FunctionParser::new(2, 2, next_fn)));
    interp.bind_long(
        "default-tokeniser-pre",
        Rc::new(FunctionParser::new(1, 2, pre_fn)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::quiet_interpreter;

    fn tokenise(input: &str, options: &str) -> Vec<String> {
        let mut interp = quiet_interpreter();
        let mut tokens = Vec::new();
        let mut remainder = {
            let mut out = vec![String::new()];
            pre_fn(
                &mut out,
                &[input.to_string(), options.to_string()],
                &mut interp,
                0,
            )
            .unwrap();
            out.remove(0)
        };
        while !remainder.is_empty() {
            let mut out = vec![String::new(), String::new()];
            next_fn(
                &mut out,
                &[remainder.clone(), options.to_string()],
                &mut interp,
                0,
            )
            .unwrap();
            let mut out = out.into_iter();
            tokens.push(out.next().unwrap());
            remainder = out.next().unwrap();
        }
        tokens
    }

    #[test]
    fn default_splits_words() {
        assert_eq!(tokenise("foo  bar baz", ""), ["foo", "bar", "baz"]);
    }

    #[test]
    fn leading_delimiters_dropped_by_preprocessor() {
        assert_eq!(tokenise("   foo bar", ""), ["foo", "bar"]);
    }

    #[test]
    fn balanced_pairs_suppress_delimiters_and_trim() {
        assert_eq!(tokenise("(foo bar) baz", ""), ["foo bar", "baz"]);
        assert_eq!(tokenise("(a (b c)) d", ""), ["a (b c)", "d"]);
    }

    #[test]
    fn unbalanced_wrapper_is_kept() {
        assert_eq!(tokenise("(foo)bar baz", ""), ["(foo)bar", "baz"]);
    }

    #[test]
    fn custom_delimiter_without_coalescing() {
        assert_eq!(tokenise("a,,b", "-s-c+d,"), ["a", "", "b"]);
    }

    #[test]
    fn coalescing_merges_consecutive_delimiters() {
        assert_eq!(tokenise("a,,b", "-s+d,"), ["a", "b"]);
    }

    #[test]
    fn line_mode_understands_crlf() {
        assert_eq!(tokenise("a\r\nb\nc", "L"), ["a", "b", "c"]);
    }

    #[test]
    fn escapes_protect_delimiters_and_decode() {
        assert_eq!(tokenise(r"a\ b c", "e"), ["a b", "c"]);
        assert_eq!(tokenise(r"x\n y", "e"), ["x\n", "y"]);
        assert_eq!(tokenise(r"\x41 B \101", "e"), ["A", "B", "A"]);
        assert_eq!(tokenise(r"\u{1F600}", "e"), ["\u{1f600}"]);
        assert_eq!(tokenise(r"\q", "e"), ["q"]);
    }

    #[test]
    fn zero_option_splits_on_nul_only() {
        assert_eq!(tokenise("a b\0c d", "0"), ["a b", "c d"]);
    }

    #[test]
    fn reset_and_nuke() {
        // `_` clears everything, then `+s` restores word splitting without
        // the bracket pairs.
        assert_eq!(tokenise("(a b) c", "_+s"), ["(a", "b)", "c"]);
        // `!` resets to the defaults.
        assert_eq!(tokenise("(a b) c", "_+s!"), ["a b", "c"]);
    }

    #[test]
    fn tokfmt_macro_expansion() {
        let mut interp = quiet_interpreter();
        use tglng::interp::ParseMode;
        // tokfmt-commas is a (1<-0) function expanding to the comma options.
        interp
            .run("`defun tokfmt-commas#(){-s+d,}", ParseMode::Literal)
            .unwrap();
        let mut out = vec![String::new(), String::new()];
        next_fn(
            &mut out,
            &["a,b".to_string(), "#commas#".to_string()],
            &mut interp,
            0,
        )
        .unwrap();
        assert_eq!(out[0], "a");
        assert_eq!(out[1], "b");
    }
}
