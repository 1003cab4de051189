//! Heuristic case conversion.
//!
//! Conversion runs in two passes. The first scans the input for hints: are
//! lower/upper-case characters present, and are there separators (spaces,
//! hyphens, underscores)? The second walks the characters through a small
//! state machine that detects token starts, word starts and case boundaries
//! and applies the style's per-position case functions.
//!
//! When the input contains separators they define the word boundaries;
//! otherwise a case or digit change inside a run starts a new word
//! (`fooBar`, `foo9bar`).

use std::rc::Rc;
use tglng::error::EvalError;
use tglng::prelude::*;

const HINT_LC: u32 = 1 << 0;
const HINT_UC: u32 = 1 << 1;
const HINT_MC: u32 = 1 << 2;
const HINT_SEP: u32 = 1 << 4;

type CaseFn = fn(char) -> char;

fn to_upper(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}

fn to_lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn identity(c: char) -> char {
    c
}

/// One naming style: the delimiter written between words (if any), whether
/// input separators are rewritten, and the case applied at the start of a
/// token, at the start of each word, and in word interiors.
struct Style {
    delimiter: Option<char>,
    replace_separators: bool,
    token_init: CaseFn,
    word_init: CaseFn,
    word_rest: CaseFn,
    /// Simple styles map every character unconditionally.
    uniform: Option<CaseFn>,
}

const fn uniform(case: CaseFn) -> Style {
    Style {
        delimiter: None,
        replace_separators: false,
        token_init: identity,
        word_init: identity,
        word_rest: identity,
        uniform: Some(case),
    }
}

const fn delimited(
    delimiter: Option<char>,
    replace_separators: bool,
    token_init: CaseFn,
    word_init: CaseFn,
    word_rest: CaseFn,
) -> Style {
    Style {
        delimiter,
        replace_separators,
        token_init,
        word_init,
        word_rest,
        uniform: None,
    }
}

static STYLES: &[(&str, Style)] = &[
    ("str-tolower", uniform(to_lower)),
    ("str-toupper", uniform(to_upper)),
    ("str-totitle", delimited(Some(' '), false, to_upper, to_upper, to_lower)),
    ("str-tosent", delimited(Some(' '), false, to_upper, to_lower, to_lower)),
    ("str-tocamel", delimited(None, true, to_lower, to_upper, to_lower)),
    ("str-topascal", delimited(None, true, to_upper, to_upper, to_lower)),
    ("str-toscream", delimited(Some('_'), true, to_upper, to_upper, to_upper)),
    ("str-tocstyle", delimited(Some('_'), true, to_lower, to_lower, to_lower)),
    ("str-tocaspal", delimited(Some('_'), true, to_upper, to_upper, to_lower)),
    ("str-tolisp", delimited(Some('-'), true, to_lower, to_lower, to_lower)),
    ("str-tocobol", delimited(Some('-'), true, to_upper, to_upper, to_upper)),
];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '_' || c == '-'
}

#[derive(Clone, Copy, PartialEq)]
enum Position {
    TokenStart,
    WordStart,
    AfterUpper,
    AfterLower,
    AfterDigit,
}

fn convert(style: &Style, input: &str) -> String {
    if let Some(case) = style.uniform {
        return input.chars().map(case).collect();
    }

    let mut hint = 0;
    for c in input.chars() {
        if c.is_lowercase() {
            hint |= HINT_LC;
        }
        if c.is_uppercase() {
            hint |= HINT_UC;
        }
        if is_separator(c) {
            hint |= HINT_SEP;
        }
    }
    if hint & (HINT_LC | HINT_UC) == (HINT_LC | HINT_UC) {
        hint |= HINT_MC;
    }

    let mut out = String::with_capacity(input.len());
    let mut position = Position::TokenStart;
    for c in input.chars() {
        let was_upper = c.is_uppercase();
        let was_digit = c.is_ascii_digit();
        if was_digit || c.is_alphabetic() {
            // A case or digit change splits words only when the input has
            // no separators of its own.
            let boundary = hint & HINT_SEP == 0
                && match position {
                    Position::AfterLower => was_upper || was_digit,
                    Position::AfterDigit => !was_digit,
                    _ => false,
                };
            match position {
                Position::TokenStart => out.push((style.token_init)(c)),
                Position::WordStart => out.push((style.word_init)(c)),
                _ if boundary => {
                    if let Some(d) = style.delimiter {
                        out.push(d);
                    }
                    out.push((style.word_init)(c));
                }
                _ => out.push((style.word_rest)(c)),
            }
            position = if was_upper {
                Position::AfterUpper
            } else if was_digit {
                Position::AfterDigit
            } else {
                // Caseless letters count as lower case.
                Position::AfterLower
            };
        } else if is_separator(c) {
            if style.replace_separators {
                if let Some(d) = style.delimiter {
                    out.push(d);
                }
                // A NUL-style delimiter simply removes the separator.
            } else {
                out.push(c);
            }
            position = Position::WordStart;
        } else {
            out.push(c);
            position = Position::TokenStart;
        }
    }
    out
}

fn magic_case_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    parm: u32,
) -> Result<(), EvalError> {
    let (_, style) = &STYLES[parm as usize];
    out[0] = convert(style, &input[0]);
    Ok(())
}

pub fn register(interp: &mut Interpreter) {
    for (index, (name, _)) in STYLES.iter().enumerate() {
        interp.bind_long(
            *name,
            Rc::new(FunctionParser::from_function(Function::with_parm(
                1,
                1,
                magic_case_fn,
                index as u32,
            ))),
        );
    }
}
