//! String comparison, search, slicing and classification.

use std::rc::Rc;
use tglng::error::EvalError;
use tglng::prelude::*;
use tglng::text::parse_integer_str;

fn bool_str(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

macro_rules! comparison_fn {
    ($name:ident, $op:tt) => {
        fn $name(
            out: &mut [String],
            input: &[String],
            _: &mut Interpreter,
            _: u32,
        ) -> Result<(), EvalError> {
            out[0] = bool_str(input[0] $op input[1]);
            Ok(())
        }
    };
}

comparison_fn![equ, ==];
comparison_fn![slt, <];
comparison_fn![sgt, >];

/// `str-str(NEEDLE, HAYSTACK)` — the character index of the first
/// occurrence, or the empty string when absent.
fn search(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let needle: Vec<char> = input[0].chars().collect();
    let haystack: Vec<char> = input[1].chars().collect();
    out[0] = match haystack
        .windows(needle.len().max(1))
        .position(|window| window == needle.as_slice())
    {
        Some(index) if !needle.is_empty() => index.to_string(),
        Some(_) => "0".to_string(),
        None => String::new(),
    };
    if needle.is_empty() {
        out[0] = "0".to_string();
    }
    Ok(())
}

/// `str-len(S)` — the number of characters.
fn length(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    out[0] = input[0].chars().count().to_string();
    Ok(())
}

/// `str-ix(S, BEGIN, END)` — the characters in `[BEGIN, END)`.
///
/// Negative indices count from the end: `BEGIN` is offset by the length and
/// `END` by the length plus one, so an end of `-0` cannot be written but
/// `-1` means "up to and including the last character". Both are clamped
/// into range.
fn index(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let string: Vec<char> = input[0].chars().collect();
    let len = string.len() as i64;
    let mut begin = parse_integer_str(&input[1])
        .ok_or_else(|| EvalError::new(format!("invalid integer: {}", input[1])))?;
    let mut end = parse_integer_str(&input[2])
        .ok_or_else(|| EvalError::new(format!("invalid integer: {}", input[2])))?;

    if begin < 0 {
        begin += len;
    }
    if end < 0 {
        end += len + 1;
    }
    let begin = begin.clamp(0, len);
    let end = end.clamp(begin, len);
    out[0] = string[begin as usize..end as usize].iter().collect();
    Ok(())
}

/// `str-is(CLASS, S)` — whether the string is non-empty and every character
/// belongs to the class named by the class letter.
fn is_class(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let class = input[0].trim().chars().next().unwrap_or('\0');
    let predicate: fn(char) -> bool = match class {
        'a' => |c| c.is_alphabetic(),
        'd' => |c| c.is_ascii_digit(),
        'n' => |c| c.is_alphanumeric(),
        's' => |c| c.is_whitespace(),
        'u' => |c| c.is_uppercase(),
        'l' => |c| c.is_lowercase(),
        'x' => |c| c.is_ascii_hexdigit(),
        'p' => |c| c.is_ascii_punctuation(),
        'w' => |c: char| c.is_alphanumeric() || c == '_',
        _ => {
            return Err(EvalError::new(format!(
                "unknown character class: {}",
                input[0]
            )))
        }
    };
    let s = &input[1];
    out[0] = bool_str(!s.is_empty() && s.chars().all(predicate));
    Ok(())
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("str-equ", Rc::new(FunctionParser::new(1, 2, equ)));
    interp.bind_long("str-slt", Rc::new(FunctionParser::new(1, 2, slt)));
    interp.bind_long("str-sgt", Rc::new(FunctionParser::new(1, 2, sgt)));
    interp.bind_long("str-str", Rc::new(FunctionParser::new(1, 2, search)));
    interp.bind_long("str-len", Rc::new(FunctionParser::new(1, 1, length)));
    interp.bind_long("str-ix", Rc::new(FunctionParser::new(1, 3, index)));
    interp.bind_long("str-is", Rc::new(FunctionParser::new(1, 2, is_class)));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![equality, "`str-equ(abc, abc)`str-equ(abc, abd)", "10"];
    exec_test![lexicographic_order, "`str-slt(abc, abd)`str-sgt(abc, abd)", "10"];
    exec_test![search_found, "`str-str(oo, foobar)", "1"];
    exec_test![search_missing, "`str-str(zz, foobar)!", "!"];
    exec_test![length_in_characters, "`str-len(hello)", "5"];
    exec_test![length_of_empty, "`str-len({})", "0"];
    exec_test![slice_basic, "`str-ix({abcdef}, 1, 3)", "bc"];
    exec_test![slice_negative_begin, "`str-ix({abcdef}, -2, -1)", "ef"];
    exec_test![slice_clamps_out_of_range, "`str-ix({abc}, 1, 99)", "bc"];
    exec_test![slice_end_before_begin_is_empty, "`str-ix({abc}, 2, 1)!", "!"];
    exec_test![class_digits, "`str-is(d, 123)`str-is(d, 12a)", "10"];
    exec_test![class_alpha_upper, "`str-is(a, abc)`str-is(u, ABC)", "11"];
    exec_test![class_empty_string_is_false, "`str-is(d, {})", "0"];
    exec_failure_test![unknown_class, "`str-is(q, abc)"];
}
