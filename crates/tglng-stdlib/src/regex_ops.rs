//! Regular-expression commands.
//!
//! The function forms take pattern, options and input as ordinary
//! arguments. The inline forms read a sed-style specification straight from
//! the source text and capture the accumulated left chain as their input,
//! so `xfoox`rx-match-inline s/foo/bar` matches against the output of
//! everything to the left.

use std::rc::Rc;
use tglng::error::{EvalError, EvalResult};
use tglng::prelude::*;

use crate::list::append_item;
use crate::rx::{Rx, SUPPORT_NAME};

fn rx_support(
    out: &mut [String],
    _: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    out[0] = SUPPORT_NAME.to_string();
    Ok(())
}

fn compile(pattern: &str, options: &str) -> Result<Rx, EvalError> {
    let rx = Rx::new(pattern, options);
    if rx.is_valid() {
        Ok(rx)
    } else {
        Err(rx.why(pattern))
    }
}

/// `rx-match(PATTERN, OPTIONS, INPUT)` — `(matched groups ← pattern options
/// input)`; the groups of the first match as a list.
fn rx_match(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let mut rx = compile(&input[0], &input[1])?;
    rx.set_input(input[2].clone());
    if rx.advance() {
        out[0] = "1".to_string();
        let mut groups = String::new();
        for index in 0..rx.group_count() {
            append_item(&mut groups, &rx.group(index));
        }
        out[1] = groups;
    } else {
        out[0] = "0".to_string();
        out[1].clear();
    }
    Ok(())
}

/// Substitutes `$0`–`$9` group references (`$$` for a literal dollar) into
/// a replacement template.
fn expand_replacement(template: &str, rx: &Rx) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                out.push('$');
                chars.next();
            }
            Some(d) if d.is_ascii_digit() => {
                let index = d.to_digit(10).unwrap() as usize;
                out.push_str(&rx.group(index));
                chars.next();
            }
            _ => out.push('$'),
        }
    }
    out
}

fn replace(pattern: &str, replacement: &str, options: &str, input: &str, all: bool) -> EvalResult {
    let mut rx = compile(pattern, options)?;
    rx.set_input(input.to_string());
    let mut out = String::new();
    let mut matched = false;
    while rx.advance() {
        out.push_str(&rx.head());
        out.push_str(&expand_replacement(replacement, &rx));
        matched = true;
        if !all {
            break;
        }
    }
    if matched {
        out.push_str(&rx.tail());
        Ok(out)
    } else {
        Ok(input.to_string())
    }
}

/// `rx-repl(PATTERN, REPLACEMENT, OPTIONS, INPUT)` — replaces the first
/// match.
fn rx_repl(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    out[0] = replace(&input[0], &input[1], &input[2], &input[3], false)?;
    Ok(())
}

/// `rx-repl-each(PATTERN, REPLACEMENT, OPTIONS, INPUT)` — replaces every
/// match.
fn rx_repl_each(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    out[0] = replace(&input[0], &input[1], &input[2], &input[3], true)?;
    Ok(())
}

/// An inline specification: `/pat/opts`, `m/pat/opts` or `s/pat/repl/opts`,
/// with any ASCII-punctuation delimiter.
struct InlineSpec {
    pattern: String,
    replacement: String,
    options: String,
}

fn parse_inline_spec(
    interp: &mut Interpreter,
    text: &[char],
    offset: &mut usize,
) -> Result<InlineSpec, ()> {
    while *offset < text.len() && text[*offset].is_whitespace() {
        *offset += 1;
    }
    // Optional operation marker, as in sed's `s`.
    if *offset + 1 < text.len()
        && matches!(text[*offset], 'm' | 's')
        && text[*offset + 1].is_ascii_punctuation()
    {
        *offset += 1;
    }
    if *offset >= text.len() || !text[*offset].is_ascii_punctuation() {
        interp.error("expected a delimited regex specification", text, *offset);
        return Err(());
    }
    let delimiter = text[*offset];
    *offset += 1;

    // The pattern must be closed by the delimiter and may contain
    // whitespace.
    let start = *offset;
    while *offset < text.len() && text[*offset] != delimiter {
        *offset += 1;
    }
    if *offset >= text.len() {
        interp.error("unterminated regex pattern", text, *offset);
        return Err(());
    }
    let pattern: String = text[start..*offset].iter().collect();
    *offset += 1;

    // The replacement ends at the delimiter, at whitespace, or at the end
    // of the text.
    let start = *offset;
    while *offset < text.len() && text[*offset] != delimiter && !text[*offset].is_whitespace() {
        *offset += 1;
    }
    let replacement: String = text[start..*offset].iter().collect();
    if *offset < text.len() && text[*offset] == delimiter {
        *offset += 1;
    }

    let mut options = String::new();
    while *offset < text.len() && text[*offset].is_ascii_alphanumeric() {
        options.push(text[*offset]);
        *offset += 1;
    }
    Ok(InlineSpec {
        pattern,
        replacement,
        options,
    })
}

/// `rx-match-inline SPEC` — matches the left chain's output; evaluates to
/// `1`/`0` and, on a match, sets registers `<` (head), `>` (tail) and
/// `0`–`9` (groups).
struct RxMatchInline {
    spec: InlineSpec,
    input: Option<Box<Command>>,
}

impl Node for RxMatchInline {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let input = interp.exec_opt(&self.input)?;
        let mut rx = compile(&self.spec.pattern, &self.spec.options)?;
        rx.set_input(input);
        if !rx.advance() {
            return Ok("0".to_string());
        }
        interp.registers.insert('<', rx.head());
        interp.registers.insert('>', rx.tail());
        for index in 0..rx.group_count().min(10) {
            let register = char::from_digit(index as u32, 10).expect("index below ten");
            interp.registers.insert(register, rx.group(index));
        }
        Ok("1".to_string())
    }
}

/// `rx-replace-inline SPEC` — rewrites the left chain's output, replacing
/// the first match (every match with option `g`).
struct RxReplaceInline {
    spec: InlineSpec,
    input: Option<Box<Command>>,
}

impl Node for RxReplaceInline {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let input = interp.exec_opt(&self.input)?;
        let all = self.spec.options.contains('g');
        let options: String = self.spec.options.chars().filter(|&c| c != 'g').collect();
        replace(
            &self.spec.pattern,
            &self.spec.replacement,
            &options,
            &input,
            all,
        )
    }
}

struct InlineParser {
    replace: bool,
}

impl CommandParser for InlineParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        *offset += 1;
        let Ok(spec) = parse_inline_spec(interp, text, offset) else {
            return ParseResult::Error;
        };
        let input = accum.take();
        *accum = Some(if self.replace {
            Command::leaf(RxReplaceInline { spec, input })
        } else {
            Command::leaf(RxMatchInline { spec, input })
        });
        ParseResult::Continue
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("rx-support", Rc::new(FunctionParser::new(1, 0, rx_support)));
    interp.bind_long("rx-match", Rc::new(FunctionParser::new(2, 3, rx_match)));
    interp.bind_long("rx-repl", Rc::new(FunctionParser::new(1, 4, rx_repl)));
    interp.bind_long(
        "rx-repl-each",
        Rc::new(FunctionParser::new(1, 4, rx_repl_each)),
    );
    interp.bind_long("rx-match-inline", Rc::new(InlineParser { replace: false }));
    interp.bind_long(
        "rx-replace-inline",
        Rc::new(InlineParser { replace: true }),
    );
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![support_names_backend, "`rx-support()", "rust-regex"];
    exec_test![match_reports_success, "`rx-match({fo+}, {}, {xfoox})", "1"];
    exec_test![
        match_groups_into_register,
        "`rx-match[g]({(f)(o+)}, {}, {xfoox})!`#g#",
        "1!foo f oo"
    ];
    exec_test![match_miss, "`rx-match({z}, {}, {xfoox})", "0"];
    exec_test![match_case_insensitive, "`rx-match({foo}, i, {XFOOX})", "1"];
    exec_failure_test![invalid_pattern, "`rx-match({(unclosed}, {}, {x})"];
    exec_test![repl_first_only, "`rx-repl({o}, {0}, {}, {foo})", "f0o"];
    exec_test![repl_each_all, "`rx-repl-each({o}, {0}, {}, {foo})", "f00"];
    exec_test![
        repl_group_references,
        "`rx-repl({(a+)(b+)}, {$2$1}, {}, {xaabbx})",
        "xbbaax"
    ];
    exec_test![repl_no_match_returns_input, "`rx-repl({z}, {q}, {}, {abc})", "abc"];
    exec_test![
        match_inline_sets_registers,
        "xfoox`rx-match-inline s/foo/bar/;`#<#;`#>#;`#0#",
        "1;x;x;foo"
    ];
    exec_test![match_inline_miss, "xyz`rx-match-inline /q/", "0"];
    exec_test![
        replace_inline_first,
        "xfoofoox`rx-replace-inline s/foo/bar",
        "xbarfoox"
    ];
    exec_test![
        replace_inline_global,
        "xfoofoox`rx-replace-inline s/foo/bar/g",
        "xbarbarx"
    ];
    exec_test![
        replace_inline_groups,
        "aabb`rx-replace-inline s/(a+)(b+)/$2-$1",
        "bb-aa"
    ];
}
