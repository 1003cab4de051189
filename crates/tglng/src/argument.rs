//! Argument extraction for command parsers.
//!
//! The surface syntax of each command parser is expressed by composing a
//! small algebra of matchers. Every matcher supports a non-consuming
//! [matches](Matcher::matches) look-ahead (which may skip whitespace) and a
//! consuming [get](Matcher::get) that stores the captured value through a
//! mutable binding taken at construction.
//!
//! Sequences are written as tuples, alternation with [alt], optional pieces
//! with [opt] and offset capture with [at]:
//!
//! ```ignore
//! let mut name = String::new();
//! let mut value = None;
//! let mut a = ArgumentParser::new(interp, accum, text, offset);
//! if !a.scan((ch(), to(&mut name, '#'), exact('='), arith(&mut value))) {
//!     return ParseResult::Error;
//! }
//! ```

use crate::command::{push, Command, ReadRegister, SelfInsert, Section};
use crate::interp::{Interpreter, ParseMode};
use crate::parse_result::ParseResult;
use crate::text;

/// The characters that may introduce a section.
pub const SECTION_TYPES: &str = "<>:|([{$";

/// Whether a character is one of the section-type characters.
pub fn is_section_char(c: char) -> bool {
    SECTION_TYPES.contains(c)
}

/// The parsing context shared by all matchers: the interpreter, the source
/// text, the cursor, and the accumulated left-hand chain (which the `<` and
/// `|` section forms may take).
pub struct Scan<'a> {
    pub interp: &'a mut Interpreter,
    pub accum: &'a mut Option<Box<Command>>,
    pub text: &'a [char],
    pub offset: &'a mut usize,
}

impl Scan<'_> {
    /// Advances past whitespace; true if a character remains.
    fn skip_whitespace(&mut self) -> bool {
        while *self.offset < self.text.len() && self.text[*self.offset].is_whitespace() {
            *self.offset += 1;
        }
        *self.offset < self.text.len()
    }
}

/// One argument matcher.
pub trait Matcher {
    /// Look-ahead: whether the input at the cursor could be this argument.
    /// May advance the cursor past whitespace only.
    fn matches(&self, cx: &mut Scan) -> bool;
    /// Consumes the argument, storing the captured value. Assumes a
    /// successful [matches](Matcher::matches) ran first.
    fn get(&mut self, cx: &mut Scan) -> bool;
}

// Sequences are tuples: match is the first element's match; get runs each
// element in turn, requiring every subsequent element to match.
macro_rules! tuple_matcher {
    ($first:ident $($rest:ident)+) => {
        #[allow(non_snake_case)]
        impl<$first: Matcher, $($rest: Matcher),+> Matcher for ($first, $($rest),+) {
            fn matches(&self, cx: &mut Scan) -> bool {
                let ($first, ..) = self;
                $first.matches(cx)
            }
            fn get(&mut self, cx: &mut Scan) -> bool {
                let ($first, $($rest),+) = self;
                if !$first.get(cx) {
                    return false;
                }
                $(
                    if !$rest.matches(cx) {
                        cx.interp.error(
                            "could not match next part of argument sequence",
                            cx.text,
                            *cx.offset,
                        );
                        return false;
                    }
                    if !$rest.get(cx) {
                        return false;
                    }
                )+
                true
            }
        }
    };
}

tuple_matcher!(A B);
tuple_matcher!(A B C);
tuple_matcher!(A B C D);
tuple_matcher!(A B C D E);
tuple_matcher!(A B C D E F);
tuple_matcher!(A B C D E F G);

/// Tries the first matcher, falling back on the second.
pub struct Alt<A, B>(A, B);

pub fn alt<A: Matcher, B: Matcher>(a: A, b: B) -> Alt<A, B> {
    Alt(a, b)
}

impl<A: Matcher, B: Matcher> Matcher for Alt<A, B> {
    fn matches(&self, cx: &mut Scan) -> bool {
        self.0.matches(cx) || self.1.matches(cx)
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        if self.0.matches(cx) {
            self.0.get(cx)
        } else {
            self.1.get(cx)
        }
    }
}

/// Makes a matcher optional: always matches, consumes only when the inner
/// matcher would.
pub struct Opt<A>(A);

pub fn opt<A: Matcher>(a: A) -> Opt<A> {
    Opt(a)
}

impl<A: Matcher> Matcher for Opt<A> {
    fn matches(&self, _: &mut Scan) -> bool {
        true
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        if self.0.matches(cx) {
            self.0.get(cx)
        } else {
            true
        }
    }
}

/// Saves the cursor position just before the inner matcher consumes, for
/// diagnostics about the exact argument position.
pub struct At<'s, A>(A, &'s mut usize);

pub fn at<A: Matcher>(a: A, slot: &mut usize) -> At<'_, A> {
    At(a, slot)
}

impl<A: Matcher> Matcher for At<'_, A> {
    fn matches(&self, cx: &mut Scan) -> bool {
        self.0.matches(cx)
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        *self.1 = *cx.offset;
        self.0.get(cx)
    }
}

/// A single non-whitespace character; see [ch] and [ch_into].
pub struct Ch<'d> {
    dst: Option<&'d mut char>,
}

/// Matches one non-whitespace character and discards it. Nearly every
/// command parser starts with this to consume its own command character.
pub fn ch<'d>() -> Ch<'d> {
    Ch { dst: None }
}

/// Matches one non-whitespace character and stores it.
pub fn ch_into(dst: &mut char) -> Ch<'_> {
    Ch { dst: Some(dst) }
}

impl Matcher for Ch<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        cx.skip_whitespace()
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        let c = cx.text[*cx.offset];
        *cx.offset += 1;
        if let Some(dst) = self.dst.as_deref_mut() {
            *dst = c;
        }
        true
    }
}

/// A signed integer literal; see [num].
pub struct Num<'d> {
    dst: &'d mut i64,
}

/// Matches a signed integer literal (base prefixes `0b`/`0o`/`0x`
/// recognised) and stores its value.
pub fn num(dst: &mut i64) -> Num<'_> {
    Num { dst }
}

impl Matcher for Num<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        if !cx.skip_whitespace() {
            return false;
        }
        matches!(cx.text[*cx.offset], '0'..='9' | '+' | '-')
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        match text::parse_integer(cx.text, *cx.offset, Some(cx.offset)) {
            Some(value) => {
                *self.dst = value;
                true
            }
            None => {
                cx.interp.error("invalid integer", cx.text, *cx.offset);
                false
            }
        }
    }
}

/// A command argument: integer literal or nested command; see [arith].
pub struct Arith<'d> {
    dst: &'d mut Option<Box<Command>>,
}

/// Matches either an integer literal, which is wrapped as a self-insert
/// command preserving its original spelling, or one recursively parsed
/// command.
pub fn arith(dst: &mut Option<Box<Command>>) -> Arith<'_> {
    Arith { dst }
}

impl Matcher for Arith<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        cx.skip_whitespace()
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        let first = cx.text[*cx.offset];
        let signed_digit = matches!(first, '+' | '-')
            && cx
                .text
                .get(*cx.offset + 1)
                .is_some_and(|c| c.is_ascii_digit());
        if first.is_ascii_digit() || signed_digit {
            let start = *cx.offset;
            if text::parse_integer(cx.text, start, Some(cx.offset)).is_none() {
                cx.interp.error("invalid integer", cx.text, *cx.offset);
                return false;
            }
            let spelling: String = cx.text[start..*cx.offset].iter().collect();
            // Keep the original spelling in case it matters downstream.
            *self.dst = Some(Command::leaf(SelfInsert::new(spelling.trim_end())));
            true
        } else {
            parse_one_command(cx, self.dst)
        }
    }
}

/// One nested command, delegated to Command-mode parsing; see [command].
pub struct Cmd<'d> {
    dst: &'d mut Option<Box<Command>>,
}

/// Matches one nested command.
pub fn command(dst: &mut Option<Box<Command>>) -> Cmd<'_> {
    Cmd { dst }
}

impl Matcher for Cmd<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        cx.skip_whitespace()
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        parse_one_command(cx, self.dst)
    }
}

fn parse_one_command(cx: &mut Scan, dst: &mut Option<Box<Command>>) -> bool {
    let mut sub = None;
    match cx.interp.parse(&mut sub, cx.text, cx.offset, ParseMode::Command) {
        ParseResult::Continue => {
            *dst = sub;
            true
        }
        ParseResult::Error => false,
        _ => {
            cx.interp
                .error("expected a command argument", cx.text, *cx.offset);
            false
        }
    }
}

/// A section argument; see [section].
pub struct SectionArg<'d> {
    dst: &'d mut Section,
}

/// Matches one of the seven section forms.
pub fn section(dst: &mut Section) -> SectionArg<'_> {
    SectionArg { dst }
}

impl Matcher for SectionArg<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        cx.skip_whitespace() && is_section_char(cx.text[*cx.offset])
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        let introducer = cx.text[*cx.offset];
        *cx.offset += 1;
        let out = &mut *self.dst;
        match introducer {
            '<' => {
                out.left = cx.accum.take();
                true
            }
            '>' => {
                let result =
                    cx.interp
                        .parse_all(&mut out.right, cx.text, cx.offset, ParseMode::Literal);
                match result {
                    ParseResult::Error => false,
                    r if r.is_stop_close() => {
                        // The caller reclaims the closing character.
                        cx.interp.backup(cx.offset);
                        true
                    }
                    _ => true,
                }
            }
            ':' => {
                match cx
                    .interp
                    .parse(&mut out.right, cx.text, cx.offset, ParseMode::Command)
                {
                    ParseResult::Continue => true,
                    ParseResult::Error => false,
                    _ => {
                        cx.interp
                            .error("expected a command after ':'", cx.text, *cx.offset);
                        false
                    }
                }
            }
            '|' => {
                let result =
                    cx.interp
                        .parse_all(&mut out.right, cx.text, cx.offset, ParseMode::Literal);
                match result {
                    // On failure the left chain stays with the caller.
                    ParseResult::Error => false,
                    r => {
                        if r.is_stop_close() {
                            cx.interp.backup(cx.offset);
                        }
                        out.left = cx.accum.take();
                        true
                    }
                }
            }
            '(' => {
                cx.interp
                    .parse_all(&mut out.right, cx.text, cx.offset, ParseMode::Command)
                    == ParseResult::StopCloseParen
            }
            '[' => {
                cx.interp
                    .parse_all(&mut out.right, cx.text, cx.offset, ParseMode::Literal)
                    == ParseResult::StopCloseBracket
            }
            '{' => {
                let start = *cx.offset;
                let mut depth = 1usize;
                while depth > 0 && *cx.offset < cx.text.len() {
                    match cx.text[*cx.offset] {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => (),
                    }
                    *cx.offset += 1;
                }
                if depth > 0 {
                    cx.interp.error("unbalanced brace", cx.text, start - 1);
                    return false;
                }
                // The cursor sits one past the closing brace, which is not
                // part of the captured text.
                let contents: String = cx.text[start..*cx.offset - 1].iter().collect();
                out.right = Some(Command::leaf(SelfInsert::new(contents)));
                true
            }
            '$' => {
                if !cx.skip_whitespace() {
                    cx.interp
                        .error("expected a register name after '$'", cx.text, *cx.offset);
                    return false;
                }
                out.right = Some(Command::leaf(ReadRegister::new(cx.text[*cx.offset])));
                *cx.offset += 1;
                true
            }
            // matches() admits exactly the characters handled above.
            _ => unreachable!("unhandled section type: {introducer}"),
        }
    }
}

/// A string up to a sentinel character; see [to].
pub struct SentinelStr<'d> {
    dst: &'d mut String,
    sentinel: char,
}

/// Matches a non-empty string running up to (and consuming, but not
/// capturing) the sentinel character. Does not match if the sentinel is
/// absent from the rest of the text.
pub fn to(dst: &mut String, sentinel: char) -> SentinelStr<'_> {
    SentinelStr { dst, sentinel }
}

impl Matcher for SentinelStr<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        if !cx.skip_whitespace() {
            return false;
        }
        if cx.text[*cx.offset] == self.sentinel {
            // An empty capture is not allowed.
            return false;
        }
        cx.text[*cx.offset + 1..].contains(&self.sentinel)
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        let start = *cx.offset;
        while cx.text[*cx.offset] != self.sentinel {
            *cx.offset += 1;
        }
        *self.dst = cx.text[start..*cx.offset].iter().collect();
        *cx.offset += 1;
        true
    }
}

/// A maximal run of 7-bit alphanumeric characters; see [alnum].
pub struct AlnumStr<'d> {
    dst: &'d mut String,
}

/// Matches a non-empty run of 7-bit alphanumeric characters. Restricted to
/// ASCII because it is used by commands which assign special meaning to
/// each character.
pub fn alnum(dst: &mut String) -> AlnumStr<'_> {
    AlnumStr { dst }
}

impl Matcher for AlnumStr<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        cx.skip_whitespace() && cx.text[*cx.offset].is_ascii_alphanumeric()
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        let start = *cx.offset;
        while *cx.offset < cx.text.len() && cx.text[*cx.offset].is_ascii_alphanumeric() {
            *cx.offset += 1;
        }
        *self.dst = cx.text[start..*cx.offset].iter().collect();
        true
    }
}

/// A maximal run of non-section characters; see [non_section].
pub struct NonSectionStr<'d> {
    dst: &'d mut String,
}

/// Matches a non-empty run of characters containing no section-type
/// character.
pub fn non_section(dst: &mut String) -> NonSectionStr<'_> {
    NonSectionStr { dst }
}

impl Matcher for NonSectionStr<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        cx.skip_whitespace() && !is_section_char(cx.text[*cx.offset])
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        let start = *cx.offset;
        while *cx.offset < cx.text.len() && !is_section_char(cx.text[*cx.offset]) {
            *cx.offset += 1;
        }
        *self.dst = cx.text[start..*cx.offset].iter().collect();
        true
    }
}

/// One exact character; see [exact] and [exact_flag].
pub struct Exact<'d> {
    expect: char,
    dst: Option<&'d mut bool>,
}

/// Matches one exact character, discarding it.
pub fn exact<'d>(expect: char) -> Exact<'d> {
    Exact { expect, dst: None }
}

/// Matches one exact character, setting the flag to true when consumed.
/// The flag is left untouched when the matcher does not run, so callers
/// initialise it to false.
pub fn exact_flag(dst: &mut bool, expect: char) -> Exact<'_> {
    Exact {
        expect,
        dst: Some(dst),
    }
}

impl Matcher for Exact<'_> {
    fn matches(&self, cx: &mut Scan) -> bool {
        cx.skip_whitespace() && cx.text[*cx.offset] == self.expect
    }
    fn get(&mut self, cx: &mut Scan) -> bool {
        *cx.offset += 1;
        if let Some(dst) = self.dst.as_deref_mut() {
            *dst = true;
        }
        true
    }
}

/// Bundles the parsing context and drives compound matchers, emitting the
/// standard diagnostics on failure.
pub struct ArgumentParser<'a> {
    cx: Scan<'a>,
    starting_offset: usize,
}

impl<'a> ArgumentParser<'a> {
    pub fn new(
        interp: &'a mut Interpreter,
        accum: &'a mut Option<Box<Command>>,
        text: &'a [char],
        offset: &'a mut usize,
    ) -> ArgumentParser<'a> {
        let starting_offset = *offset;
        ArgumentParser {
            cx: Scan {
                interp,
                accum,
                text,
                offset,
            },
            starting_offset,
        }
    }

    /// Tries to match and consume the given compound argument. On failure a
    /// diagnostic is printed and false returned.
    pub fn scan<M: Matcher>(&mut self, mut matcher: M) -> bool {
        if !matcher.matches(&mut self.cx) {
            self.cx.interp.error(
                "could not match initial argument",
                self.cx.text,
                *self.cx.offset,
            );
            return false;
        }
        if !matcher.get(&mut self.cx) {
            self.cx.interp.error(
                "error reading argument for command",
                self.cx.text,
                self.starting_offset,
            );
            return false;
        }
        true
    }

    /// Non-consuming look-ahead (whitespace excepted), for hand-written
    /// alternation ladders whose branches capture into the same binding.
    pub fn peek<M: Matcher>(&mut self, matcher: M) -> bool {
        matcher.matches(&mut self.cx)
    }

    pub fn offset(&self) -> usize {
        *self.cx.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandParser;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quiet_interp() -> Interpreter {
        let mut interp = Interpreter::new();
        interp.set_diagnostics(Rc::new(RefCell::new(std::io::sink())));
        interp
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    struct CloseParser(ParseResult);
    impl CommandParser for CloseParser {
        fn parse(
            &self,
            _: &mut Interpreter,
            _: &mut Option<Box<Command>>,
            _: &[char],
            offset: &mut usize,
        ) -> ParseResult {
            *offset += 1;
            self.0
        }
    }

    #[test]
    fn char_skips_whitespace() {
        let mut interp = quiet_interp();
        let text = chars("   x");
        let mut offset = 0;
        let mut accum = None;
        let mut got = ' ';
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(ch_into(&mut got)));
        assert_eq!(got, 'x');
        assert_eq!(offset, 4);
    }

    #[test]
    fn sequence_diagnoses_unmatched_tail() {
        let mut interp = quiet_interp();
        let text = chars("x   ");
        let mut offset = 0;
        let mut accum = None;
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(!a.scan((ch(), exact('='))));
    }

    #[test]
    fn alternation_prefers_first() {
        let mut interp = quiet_interp();
        let text = chars("=");
        let mut offset = 0;
        let mut accum = None;
        let mut hit_first = false;
        let mut hit_second = false;
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(alt(
            exact_flag(&mut hit_first, '='),
            exact_flag(&mut hit_second, '=')
        )));
        assert!(hit_first);
        assert!(!hit_second);
    }

    #[test]
    fn optional_consumes_nothing_on_mismatch() {
        let mut interp = quiet_interp();
        let text = chars("x");
        let mut offset = 0;
        let mut accum = None;
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(opt(exact('='))));
        assert_eq!(offset, 0);
    }

    #[test]
    fn save_offset_reports_argument_position() {
        let mut interp = quiet_interp();
        let text = chars("x  name#");
        let mut offset = 0;
        let mut accum = None;
        let mut name = String::new();
        let mut name_offset = 0;
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan((ch(), at(to(&mut name, '#'), &mut name_offset))));
        assert_eq!(name, "name");
        assert_eq!(name_offset, 3);
    }

    #[test]
    fn nested_command_argument() {
        let mut interp = quiet_interp();
        interp.bind_long("self-insert", Rc::new(crate::command::SelfInsertParser));
        interp.bind_short('x', "self-insert").unwrap();
        let text = chars(" x rest");
        let mut offset = 0;
        let mut accum = None;
        let mut sub = None;
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(command(&mut sub)));
        assert_eq!(interp.exec(sub.as_ref().unwrap()).unwrap(), "x");
    }

    #[test]
    fn non_section_run_stops_at_section_characters() {
        let mut interp = quiet_interp();
        let text = chars("ab cd(ef");
        let mut offset = 0;
        let mut accum = None;
        let mut dst = String::new();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(non_section(&mut dst)));
        assert_eq!(dst, "ab cd");
        assert_eq!(text[offset], '(');
    }

    #[test]
    fn sentinel_requires_sentinel_ahead() {
        let mut interp = quiet_interp();
        let text = chars("abc");
        let mut offset = 0;
        let mut accum = None;
        let mut dst = String::new();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(!a.scan(to(&mut dst, '#')));
    }

    #[test]
    fn numeric_literals() {
        let mut interp = quiet_interp();
        let text = chars(" -0x10 rest");
        let mut offset = 0;
        let mut accum = None;
        let mut value = 0i64;
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(num(&mut value)));
        assert_eq!(value, -16);
        assert_eq!(text[offset], 'r');
    }

    #[test]
    fn arith_wraps_integer_literal_preserving_spelling() {
        let mut interp = quiet_interp();
        let text = chars("007");
        let mut offset = 0;
        let mut accum = None;
        let mut value = None;
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(arith(&mut value)));
        let got = interp.exec(value.as_ref().unwrap()).unwrap();
        assert_eq!(got, "007");
    }

    #[test]
    fn section_left_capture_takes_accumulator() {
        let mut interp = quiet_interp();
        let text = chars("<");
        let mut offset = 0;
        let mut accum = Some(Command::leaf(SelfInsert::new("acc")));
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(section(&mut sec)));
        assert!(accum.is_none());
        assert_eq!(sec.evaluate(&mut interp).unwrap(), "acc");
    }

    #[test]
    fn bracket_section_parses_literal_body() {
        let mut interp = quiet_interp();
        let text = chars("[body]after");
        let mut offset = 0;
        let mut accum = None;
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(section(&mut sec)));
        assert_eq!(offset, 6);
        assert_eq!(sec.evaluate(&mut interp).unwrap(), "body");
    }

    #[test]
    fn unterminated_bracket_section_fails() {
        let mut interp = quiet_interp();
        let text = chars("[body");
        let mut offset = 0;
        let mut accum = None;
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(!a.scan(section(&mut sec)));
    }

    #[test]
    fn paren_section_requires_matching_close() {
        let mut interp = quiet_interp();
        interp.bind_long("close-paren", Rc::new(CloseParser(ParseResult::StopCloseParen)));
        interp.bind_short(')', "close-paren").unwrap();
        interp.bind_long("self-insert", Rc::new(crate::command::SelfInsertParser));
        interp.bind_short('x', "self-insert").unwrap();
        let text = chars("(x)after");
        let mut offset = 0;
        let mut accum = None;
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(section(&mut sec)));
        assert_eq!(offset, 3);
        assert_eq!(sec.evaluate(&mut interp).unwrap(), "x");
    }

    #[test]
    fn rest_section_backs_up_to_the_closer() {
        let mut interp = quiet_interp();
        let text = chars(">tail]x");
        let mut offset = 0;
        let mut accum = None;
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(section(&mut sec)));
        // The closing bracket is reclaimed by the caller.
        assert_eq!(text[offset], ']');
        assert_eq!(sec.evaluate(&mut interp).unwrap(), "tail");
    }

    #[test]
    fn brace_section_captures_verbatim_excluding_closer() {
        let mut interp = quiet_interp();
        let text = chars("{a{b}`c}after");
        let mut offset = 0;
        let mut accum = None;
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(section(&mut sec)));
        assert_eq!(sec.evaluate(&mut interp).unwrap(), "a{b}`c");
        assert_eq!(text[offset], 'a');
    }

    #[test]
    fn unbalanced_brace_fails() {
        let mut interp = quiet_interp();
        let text = chars("{a{b}");
        let mut offset = 0;
        let mut accum = None;
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(!a.scan(section(&mut sec)));
    }

    #[test]
    fn register_section_reads_register() {
        let mut interp = quiet_interp();
        interp.registers.insert('r', "value".to_string());
        let text = chars("$ r");
        let mut offset = 0;
        let mut accum = None;
        let mut sec = Section::default();
        let mut a = ArgumentParser::new(&mut interp, &mut accum, &text, &mut offset);
        assert!(a.scan(section(&mut sec)));
        assert_eq!(sec.evaluate(&mut interp).unwrap(), "value");
    }
}
