//! File-system commands.
//!
//! All access goes through the interpreter's [FileSystem] handle so tests
//! run against the in-memory implementation. The binary variants map bytes
//! to the characters U+0000–U+00FF, so arbitrary file contents round-trip
//! through string values.

use std::path::Path;
use std::rc::Rc;
use tglng::error::EvalError;
use tglng::prelude::*;

use crate::list::append_item;

fn io_error(action: &str, path: &str, error: std::io::Error) -> EvalError {
    EvalError::new(format!("{action} {path}: {error}"))
}

/// Translates a glob pattern component (`*`, `?`, `[…]`) into a regex.
fn glob_to_regex(pattern: &str) -> Result<regex::Regex, EvalError> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            '[' => {
                translated.push('[');
                if chars.peek() == Some(&'!') {
                    translated.push('^');
                    chars.next();
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    if regex_syntax_char(inner) && inner != '-' {
                        translated.push('\\');
                    }
                    translated.push(inner);
                }
                translated.push(']');
            }
            c if regex_syntax_char(c) => {
                translated.push('\\');
                translated.push(c);
            }
            c => translated.push(c),
        }
    }
    translated.push('$');
    regex::Regex::new(&translated)
        .map_err(|error| EvalError::new(format!("invalid glob pattern {pattern}: {error}")))
}

fn regex_syntax_char(c: char) -> bool {
    "\\.+*?()|[]{}^$#&-~".contains(c)
}

/// `ls(PATTERN)` — the files matching a glob pattern, as a list. Wildcards
/// apply to the final path component; a failed glob is an empty list.
fn ls_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let pattern = input[0].trim();
    let (directory, name_pattern) = match pattern.rfind('/') {
        Some(slash) => (&pattern[..slash + 1], &pattern[slash + 1..]),
        None => ("", pattern),
    };
    let matcher = glob_to_regex(name_pattern)?;

    let directory_path = if directory.is_empty() { "." } else { directory };
    let mut names = match interp.file_system.read_dir(Path::new(directory_path)) {
        Ok(names) => names,
        Err(_) => {
            out[0].clear();
            return Ok(());
        }
    };
    names.retain(|name| matcher.is_match(name));
    names.sort();

    let mut list = String::new();
    for name in names {
        append_item(&mut list, &format!("{directory}{name}"));
    }
    out[0] = list;
    Ok(())
}

/// `read(PATH)` — the file's contents as text.
fn read_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let path = input[0].trim();
    out[0] = interp
        .file_system
        .read_to_string(Path::new(path))
        .map_err(|error| io_error("reading", path, error))?;
    Ok(())
}

/// `read-binary(PATH)` — the file's bytes, one character per byte.
fn read_binary_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let path = input[0].trim();
    let bytes = interp
        .file_system
        .read_bytes(Path::new(path))
        .map_err(|error| io_error("reading", path, error))?;
    out[0] = bytes.iter().map(|&b| b as char).collect();
    Ok(())
}

fn encode_binary(contents: &str) -> Result<Vec<u8>, EvalError> {
    contents
        .chars()
        .map(|c| {
            u8::try_from(c as u32)
                .map_err(|_| EvalError::new(format!("character {c:?} does not fit in a byte")))
        })
        .collect()
}

macro_rules! write_fn {
    ($name:ident, $binary:expr, $append:expr) => {
        fn $name(
            out: &mut [String],
            input: &[String],
            interp: &mut Interpreter,
            _: u32,
        ) -> Result<(), EvalError> {
            let path = input[0].trim();
            let bytes = if $binary {
                encode_binary(&input[1])?
            } else {
                input[1].clone().into_bytes()
            };
            let result = if $append {
                interp.file_system.append_bytes(Path::new(path), &bytes)
            } else {
                interp.file_system.write_bytes(Path::new(path), &bytes)
            };
            result.map_err(|error| io_error("writing", path, error))?;
            out[0].clear();
            Ok(())
        }
    };
}

write_fn![write_text_fn, false, false];
write_fn![write_binary_fn, true, false];
write_fn![append_text_fn, false, true];
write_fn![append_binary_fn, true, true];

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("ls", Rc::new(FunctionParser::new(1, 1, ls_fn)));
    interp.bind_long("read", Rc::new(FunctionParser::new(1, 1, read_fn)));
    interp.bind_long(
        "read-binary",
        Rc::new(FunctionParser::new(1, 1, read_binary_fn)),
    );
    interp.bind_long("write", Rc::new(FunctionParser::new(1, 2, write_text_fn)));
    interp.bind_long(
        "write-binary",
        Rc::new(FunctionParser::new(1, 2, write_binary_fn)),
    );
    interp.bind_long("append", Rc::new(FunctionParser::new(1, 2, append_text_fn)));
    interp.bind_long(
        "append-binary",
        Rc::new(FunctionParser::new(1, 2, append_binary_fn)),
    );
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};
    use std::rc::Rc;
    use tglng::interp::{InMemoryFileSystem, Interpreter};

    fn mock_fs(interp: &mut Interpreter) {
        let fs = InMemoryFileSystem::new();
        fs.add("notes.txt", "hello file");
        fs.add("a.tgl", "");
        fs.add("b.tgl", "");
        fs.add("c.txt", "");
        fs.add("dir/inner.tgl", "");
        fs.add("bytes.bin", vec![0u8, 255, 65]);
        interp.file_system = Rc::new(fs);
    }

    exec_test![read_file, mock_fs, "`read({notes.txt})", "hello file"];
    exec_failure_test![read_missing_file, "`read({no-such-file-anywhere})"];
    exec_test![
        ls_globs_and_sorts,
        mock_fs,
        "`ls({*.tgl})",
        "a.tgl b.tgl"
    ];
    exec_test![
        ls_with_directory_prefix,
        mock_fs,
        "`ls({dir/*.tgl})",
        "dir/inner.tgl"
    ];
    exec_test![ls_question_mark, mock_fs, "`ls({?.tgl})", "a.tgl b.tgl"];
    exec_test![ls_no_matches_is_empty, mock_fs, "`ls({*.nope})!", "!"];
    exec_test![
        write_then_read_back,
        mock_fs,
        "`write({out.txt}, {payload})`read({out.txt})",
        "payload"
    ];
    exec_test![
        append_extends,
        mock_fs,
        "`write({o}, ab)`append({o}, cd)`read({o})",
        "abcd"
    ];
    exec_test![
        binary_round_trip,
        mock_fs,
        "`write-binary({copy}, `read-binary({bytes.bin}))`str-equ(`read-binary({copy}), `read-binary({bytes.bin}))",
        "1"
    ];
    exec_failure_test![write_binary_rejects_wide_characters, "`write-binary({f}, {€})"];
}
