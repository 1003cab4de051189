//! List operations.
//!
//! A list is a string of whitespace-separated items; items containing
//! whitespace or bracket characters are quoted with a balanced pair, and
//! backslash escapes protect the rest. Tokenisation of a list is the
//! default tokeniser with escapes enabled.

use std::rc::Rc;
use tglng::error::EvalError;
use tglng::prelude::*;
use tglng::text::{parse_bool, parse_integer_str};

use crate::default_tokeniser;

/// The tokeniser options lists are read with.
const LIST_OPTIONS: &str = "e";

/// Escapes one item so it can be appended to a list with a space
/// separator.
pub fn escape_item(item: &str) -> String {
    let mut has_space = false;
    let mut has_paren = false;
    let mut has_bracket = false;
    let mut has_brace = false;
    let mut has_backslash = false;
    for c in item.chars() {
        has_space |= c.is_whitespace();
        has_paren |= c == '(' || c == ')';
        has_bracket |= c == '[' || c == ']';
        has_brace |= c == '{' || c == '}';
        has_backslash |= c == '\\';
    }

    // Wrap in whichever pair is absent from the item; when all three kinds
    // appear, use braces and escape them.
    let escape_braces = has_paren && has_bracket && has_brace;
    let mut escaped = String::with_capacity(item.len());
    for c in item.chars() {
        if c == '\\' || (escape_braces && (c == '{' || c == '}')) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    if has_space || has_paren || has_bracket || has_brace {
        if !has_paren {
            format!("({escaped})")
        } else if !has_bracket {
            format!("[{escaped}]")
        } else {
            format!("{{{escaped}}}")
        }
    } else {
        escaped
    }
}

/// Appends an unescaped item to a list string.
pub fn append_item(list: &mut String, item: &str) {
    let escaped = escape_item(item);
    if !list.is_empty() {
        list.push(' ');
    }
    list.push_str(&escaped);
}

/// Splits a list into its first item and the remainder. `None` for the
/// empty list.
pub fn split_first(
    interp: &mut Interpreter,
    list: &str,
) -> Result<Option<(String, String)>, EvalError> {
    let trimmed = {
        let mut out = vec![String::new()];
        default_tokeniser::pre_fn(
            &mut out,
            &[list.to_string(), LIST_OPTIONS.to_string()],
            interp,
            0,
        )?;
        out.remove(0)
    };
    if trimmed.is_empty() {
        return Ok(None);
    }
    let mut out = vec![String::new(), String::new()];
    default_tokeniser::next_fn(
        &mut out,
        &[trimmed, LIST_OPTIONS.to_string()],
        interp,
        0,
    )?;
    let mut out = out.into_iter();
    let car = out.next().unwrap_or_default();
    let cdr = out.next().unwrap_or_default();
    Ok(Some((car, cdr)))
}

/// Collects every item of a list.
pub fn items(interp: &mut Interpreter, list: &str) -> Result<Vec<String>, EvalError> {
    let mut items = Vec::new();
    let mut rest = list.to_string();
    while let Some((car, cdr)) = split_first(interp, &rest)? {
        items.push(car);
        rest = cdr;
    }
    Ok(items)
}

/// `list-car(L)` — `(car cdr ← list)`; fails on the empty list.
fn car_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    match split_first(interp, &input[0])? {
        Some((car, cdr)) => {
            out[0] = car;
            out[1] = cdr;
            Ok(())
        }
        None => Err(EvalError::new("list-car: empty list")),
    }
}

/// `list-escape(S)` — `(escaped ← item)`.
fn escape_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    out[0] = escape_item(&input[0]);
    Ok(())
}

/// `list-append(L, X)` — `(list ← list item)`.
fn append_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let mut list = input[0].clone();
    append_item(&mut list, &input[1]);
    out[0] = list;
    Ok(())
}

/// `list-length(L)`.
fn length_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    out[0] = items(interp, &input[0])?.len().to_string();
    Ok(())
}

/// `list-ix(L, N)` — the item at index `N`.
fn ix_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let index = parse_integer_str(&input[1])
        .ok_or_else(|| EvalError::new(format!("invalid integer: {}", input[1])))?;
    let items = items(interp, &input[0])?;
    let item = usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or_else(|| {
            EvalError::new(format!(
                "list index {index} out of range for list of {} items",
                items.len()
            ))
        })?;
    out[0] = item.clone();
    Ok(())
}

/// `list-map(F, L)` — applies the `(1 ← 1)` function `F` to every item.
fn map_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let function = Function::get(interp, input[0].trim(), 1, 1, true)?;
    let mut result = String::new();
    for item in items(interp, &input[1])? {
        let mut mapped = vec![String::new()];
        function.invoke(&mut mapped, &[item], interp)?;
        append_item(&mut result, &mapped[0]);
    }
    out[0] = result;
    Ok(())
}

/// `list-fold(F, L, INIT)` — folds with the `(1 ← 2)` function `F`, called
/// as `F(item, accumulator)`.
fn fold_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let function = Function::get(interp, input[0].trim(), 1, 2, true)?;
    let mut accumulator = input[2].clone();
    for item in items(interp, &input[1])? {
        let mut folded = vec![String::new()];
        function.invoke(&mut folded, &[item, accumulator], interp)?;
        accumulator = folded.remove(0);
    }
    out[0] = accumulator;
    Ok(())
}

/// `list-filter(F, L)` — keeps the items the `(1 ← 1)` function accepts.
fn filter_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let function = Function::get(interp, input[0].trim(), 1, 1, true)?;
    let mut result = String::new();
    for item in items(interp, &input[1])? {
        let mut verdict = vec![String::new()];
        function.invoke(&mut verdict, &[item.clone()], interp)?;
        if parse_bool(&verdict[0]) {
            append_item(&mut result, &item);
        }
    }
    out[0] = result;
    Ok(())
}

/// `list-zip(LS)` — interleaves the items of a list of lists:
/// `{a b c} {d e f}` becomes `a d b e c f`.
fn zip_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let mut lists = Vec::new();
    for list in items(interp, &input[0])? {
        lists.push(items(interp, &list)?);
    }
    let longest = lists.iter().map(Vec::len).max().unwrap_or(0);
    let mut result = String::new();
    for index in 0..longest {
        for list in &lists {
            if let Some(item) = list.get(index) {
                append_item(&mut result, item);
            }
        }
    }
    out[0] = result;
    Ok(())
}

/// `list-flatten(LS)` — concatenates the element lists:
/// `{a b} {c d}` becomes `a b c d`.
fn flatten_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let mut result = String::new();
    for list in items(interp, &input[0])? {
        for item in items(interp, &list)? {
            append_item(&mut result, &item);
        }
    }
    out[0] = result;
    Ok(())
}

/// `list-unzip(L, STRIDE)` — deinterleaves into `STRIDE` lists (2 when the
/// stride is empty): `a b c d e f` with stride 3 becomes
/// `{a d} {b e} {c f}`.
fn unzip_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let stride = if input[1].trim().is_empty() {
        2
    } else {
        match parse_integer_str(&input[1]) {
            Some(n) if n > 0 => n as usize,
            _ => {
                return Err(EvalError::new(format!(
                    "invalid unzip stride: {}",
                    input[1]
                )))
            }
        }
    };
    let items = items(interp, &input[0])?;
    let mut result = String::new();
    for lane in 0..stride {
        let mut sublist = String::new();
        for item in items.iter().skip(lane).step_by(stride) {
            append_item(&mut sublist, item);
        }
        append_item(&mut result, &sublist);
    }
    out[0] = result;
    Ok(())
}

/// `list-assign(REGS, L)` — assigns the i-th item to the register named by
/// the i-th character; registers beyond the list's length are unset.
fn assign_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let items = items(interp, &input[1])?;
    for (index, register) in input[0].chars().enumerate() {
        match items.get(index) {
            Some(item) => interp.registers.insert(register, item.clone()),
            None => interp.registers.remove(&register),
        };
    }
    out[0].clear();
    Ok(())
}

/// `list-convert(S, OPTS)` — tokenises `S` under the given tokeniser
/// options and re-emits the tokens as a canonical list.
fn convert_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let mut result = String::new();
    let mut remainder = {
        let mut pre = vec![String::new()];
        default_tokeniser::pre_fn(&mut pre, &[input[0].clone(), input[1].clone()], interp, 0)?;
        pre.remove(0)
    };
    while !remainder.is_empty() {
        let mut next = vec![String::new(), String::new()];
        default_tokeniser::next_fn(
            &mut next,
            &[remainder, input[1].clone()],
            interp,
            0,
        )?;
        let mut next = next.into_iter();
        append_item(&mut result, &next.next().unwrap_or_default());
        remainder = next.next().unwrap_or_default();
    }
    out[0] = result;
    Ok(())
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("list-car", Rc::new(FunctionParser::new(2, 1, car_fn)));
    interp.bind_long("list-escape", Rc::new(FunctionParser::new(1, 1, escape_fn)));
    interp.bind_long("list-append", Rc::new(FunctionParser::new(1, 2, append_fn)));
    interp.bind_long("list-length", Rc::new(FunctionParser::new(1, 1, length_fn)));
    interp.bind_long("list-ix", Rc::new(FunctionParser::new(1, 2, ix_fn)));
    interp.bind_long("list-map", Rc::new(FunctionParser::new(1, 2, map_fn)));
    interp.bind_long("list-fold", Rc::new(FunctionParser::new(1, 3, fold_fn)));
    interp.bind_long("list-filter", Rc::new(FunctionParser::new(1, 2, filter_fn)));
    interp.bind_long("list-zip", Rc::new(FunctionParser::new(1, 1, zip_fn)));
    interp.bind_long("list-flatten", Rc::new(FunctionParser::new(1, 1, flatten_fn)));
    interp.bind_long("list-unzip", Rc::new(FunctionParser::new(1, 2, unzip_fn)));
    interp.bind_long("list-assign", Rc::new(FunctionParser::new(1, 2, assign_fn)));
    interp.bind_long("list-convert", Rc::new(FunctionParser::new(1, 2, convert_fn)));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![car_splits_head, "`list-car[r]({a b c}):`#r#", "a:b c"];
    exec_failure_test![car_of_empty_list, "`list-car[r]({})"];
    exec_test![escape_plain_item_unchanged, "`list-escape(abc)", "abc"];
    exec_test![escape_quotes_spaces, "`list-escape({a b})", "(a b)"];
    exec_test![
        escape_picks_an_absent_pair,
        "`list-escape({(a b)})",
        "[(a b)]"
    ];
    exec_test![append_to_empty, "`list-append({}, x)", "x"];
    exec_test![append_quoted, "`list-append({a b}, {c d})", "a b (c d)"];
    exec_test![length_counts_items, "`list-length({a (b c) d})", "3"];
    exec_test![ix_selects, "`list-ix({a b c}, 1)", "b"];
    exec_failure_test![ix_out_of_range, "`list-ix({a b}, 5)"];
    // Function-name arguments are quoted; a bare bound name would parse as
    // an invocation.
    exec_test![
        map_applies_function,
        "`defun up#(x)[`str-toupper(`#x#)]`list-map({up}, {a b c})",
        "A B C"
    ];
    exec_test![
        fold_accumulates,
        "`defun plus#(ab)[`num-add(`#a#, `#b#)]`list-fold({plus}, {1 2 3}, 10)",
        "16"
    ];
    exec_test![
        filter_keeps_accepted,
        "`defun digit#(x)[`str-is(d, `#x#)]`list-filter({digit}, {1 a 2 b})",
        "1 2"
    ];
    exec_test![zip_interleaves, "`list-zip({(a b c) (d e f)})", "a d b e c f"];
    exec_test![flatten_concatenates, "`list-flatten({(a b) (c d)})", "a b c d"];
    exec_test![
        unzip_deinterleaves,
        "`list-unzip({a b c d e f}, 3)",
        "(a d) (b e) (c f)"
    ];
    exec_test![
        unzip_default_stride,
        "`list-unzip({a b c d}, {})",
        "(a c) (b d)"
    ];
    exec_test![
        assign_to_registers,
        "`list-assign(xy, {1 2})`#x#`#y#",
        "12"
    ];
    exec_test![
        convert_csv_to_list,
        "`list-convert({a,b c}, {-s+d,})",
        "a (b c)"
    ];
    exec_test![
        flatten_of_escaped_map_restores_list,
        "`list-flatten(`list-map({list-escape}, {a (b c) d}))",
        "a (b c) d"
    ];
}
