//! Fundamental commands: registry access, escape-character control, and the
//! small glue commands every program ends up using.

use std::rc::Rc;
use tglng::argument::{arith, at, ch, ch_into, to, ArgumentParser};
use tglng::error::{EvalError, EvalResult};
use tglng::prelude::*;
use tglng::text;

/// `bind NAME# c` — binds the character `c` to the existing long-name
/// parser `NAME`. Rebinding overwrites silently; scoped (`let`) names are
/// refused. There is no command at evaluation time.
struct BindParser;

impl CommandParser for BindParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut long_name = String::new();
        let mut short_name = ' ';
        let mut name_offset = 0;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                at(to(&mut long_name, '#'), &mut name_offset),
                ch_into(&mut short_name),
            )) {
                return ParseResult::Error;
            }
        }
        match interp.bind_short(short_name, long_name.trim()) {
            Ok(()) => ParseResult::Continue,
            Err(error) => {
                interp.error(error.message(), text, name_offset);
                ParseResult::Error
            }
        }
    }
}

/// `no-op` — parses to nothing; as a `(1 ← 0)` function it returns the
/// empty string.
struct NoOpParser;

fn no_op_fn(out: &mut [String], _: &[String], _: &mut Interpreter, _: u32) -> Result<(), EvalError> {
    out[0].clear();
    Ok(())
}

impl CommandParser for NoOpParser {
    fn parse(
        &self,
        _: &mut Interpreter,
        _: &mut Option<Box<Command>>,
        _: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        *offset += 1;
        ParseResult::Continue
    }

    fn function(&self) -> Option<Function> {
        Some(Function::new(1, 0, no_op_fn))
    }
}

/// `meta` — evaluates to the current escape character.
struct Meta;

impl Node for Meta {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        Ok(interp.escape.to_string())
    }
}

struct MetaParser;

impl CommandParser for MetaParser {
    fn parse(
        &self,
        _: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        _: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        *offset += 1;
        tglng::command::push(accum, Meta);
        ParseResult::Continue
    }
}

/// `set-meta c` — changes the escape character, effective immediately for
/// the rest of the parse.
struct SetMetaParser;

impl CommandParser for SetMetaParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut new_escape = ' ';
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), ch_into(&mut new_escape))) {
                return ParseResult::Error;
            }
        }
        interp.escape = new_escape;
        ParseResult::Continue
    }
}

/// `ignore ARG` — evaluates its argument for its effects and discards the
/// output.
struct Ignore {
    sub: Option<Box<Command>>,
}

impl Node for Ignore {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        interp.exec_opt(&self.sub)?;
        Ok(String::new())
    }
}

/// `eval ARG` — evaluates its argument, then parses and runs the result as
/// a program in Literal mode.
struct Eval {
    sub: Option<Box<Command>>,
}

impl Node for Eval {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let source = interp.exec_opt(&self.sub)?;
        match interp.run(&source, ParseMode::Literal) {
            Ok(output) => Ok(output),
            Err(tglng::interp::RunError::Parse) => {
                Err(EvalError::new("eval: generated program failed to parse"))
            }
            Err(tglng::interp::RunError::Eval(error)) => Err(error),
        }
    }
}

/// `error ARG` / `warn ARG` — report a user-authored message; `error` fails
/// evaluation, `warn` continues with empty output.
struct Report {
    fatal: bool,
    sub: Option<Box<Command>>,
}

impl Node for Report {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let message = interp.exec_opt(&self.sub)?;
        if self.fatal {
            Err(EvalError::new(message))
        } else {
            eprintln!("tglng: warning: {message}");
            Ok(String::new())
        }
    }
}

// The unary commands differ only in the node they build and the `(1 ← 1)`
// function they expose, so each gets a dedicated parser type: one command
// character, one arithmetic argument.
macro_rules! unary_parser {
    ($parser:ident, $node:expr, $function:ident) => {
        struct $parser;

        impl CommandParser for $parser {
            fn parse(
                &self,
                interp: &mut Interpreter,
                accum: &mut Option<Box<Command>>,
                text: &[char],
                offset: &mut usize,
            ) -> ParseResult {
                let mut sub = None;
                {
                    let mut a = ArgumentParser::new(interp, accum, text, offset);
                    if !a.scan((ch(), arith(&mut sub))) {
                        return ParseResult::Error;
                    }
                }
                tglng::command::push(accum, ($node)(sub));
                ParseResult::Continue
            }

            fn function(&self) -> Option<Function> {
                Some(Function::new(1, 1, $function))
            }
        }
    };
}

fn ignore_fn(out: &mut [String], _: &[String], _: &mut Interpreter, _: u32) -> Result<(), EvalError> {
    out[0].clear();
    Ok(())
}

fn eval_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    match interp.run(&input[0], ParseMode::Literal) {
        Ok(output) => {
            out[0] = output;
            Ok(())
        }
        Err(tglng::interp::RunError::Parse) => {
            Err(EvalError::new("eval: generated program failed to parse"))
        }
        Err(tglng::interp::RunError::Eval(error)) => Err(error),
    }
}

fn error_fn(_: &mut [String], input: &[String], _: &mut Interpreter, _: u32) -> Result<(), EvalError> {
    Err(EvalError::new(input[0].clone()))
}

fn warn_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    eprintln!("tglng: warning: {}", input[0]);
    out[0].clear();
    Ok(())
}

unary_parser![IgnoreParser, |sub| Ignore { sub }, ignore_fn];
unary_parser![EvalParser, |sub| Eval { sub }, eval_fn];
unary_parser![ErrorParser, |sub| Report { fatal: true, sub }, error_fn];
unary_parser![WarnParser, |sub| Report { fatal: false, sub }, warn_fn];

/// `character(CODE)` — the character with the given code.
fn character_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let code = text::parse_integer_str(&input[0])
        .ok_or_else(|| EvalError::new(format!("invalid character code: {}", input[0])))?;
    let c = u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| EvalError::new(format!("no character with code {code}")))?;
    out[0] = c.to_string();
    Ok(())
}

/// `character-code(C)` — the decimal code of the first character.
fn character_code_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let c = input[0]
        .chars()
        .next()
        .ok_or_else(|| EvalError::new("character-code: empty input"))?;
    out[0] = (c as u32).to_string();
    Ok(())
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("bind", Rc::new(BindParser));
    interp.bind_long("no-op", Rc::new(NoOpParser));
    interp.bind_long("meta", Rc::new(MetaParser));
    interp.bind_long("set-meta", Rc::new(SetMetaParser));
    interp.bind_long("ignore", Rc::new(IgnoreParser));
    interp.bind_long("eval", Rc::new(EvalParser));
    interp.bind_long("error", Rc::new(ErrorParser));
    interp.bind_long("warn", Rc::new(WarnParser));
    interp.bind_long("character", Rc::new(FunctionParser::new(1, 1, character_fn)));
    interp.bind_long(
        "character-code",
        Rc::new(FunctionParser::new(1, 1, character_code_fn)),
    );
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![self_insert_fidelity, "Hello, world", "Hello, world"];
    exec_test![bind_gives_short_name, "`bind no-op#nok`n", "ok"];
    exec_failure_test![bind_unknown_long_name, "`bind missing#m"];
    exec_test![meta_emits_escape, "`meta!", "`!"];
    exec_test![set_meta_changes_escape, "`set-meta @a@meta", "a@"];
    exec_test![ignore_discards, "a`ignore{zzz}b", "ab"];
    exec_test![eval_runs_generated_code, "`eval{x`#meta#y}", "x`y"];
    exec_test![warn_is_not_fatal, "a`warn{message}b", "ab"];
    exec_failure_test![error_is_fatal, "`error{boom}"];
    exec_test![character_from_code, "`character(65)", "A"];
    exec_test![character_from_hex_code, "`character(0x41)", "A"];
    exec_test![character_code_of, "`character-code(A)", "65"];
    exec_failure_test![character_invalid_code, "`character(0x110000)"];
}
