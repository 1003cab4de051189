//! Section execution and the structural close commands.

use std::rc::Rc;
use tglng::argument::{section, ArgumentParser};
use tglng::error::EvalResult;
use tglng::prelude::*;

/// Command which just evaluates a section.
///
/// The parser takes the section starting from its own command character, so
/// binding `section-command` to the section-type characters makes `(…)`,
/// `[…]`, `{…}`, `:cmd` and `$r` usable as commands in their own right.
struct SectionCommand {
    section: Section,
}

impl Node for SectionCommand {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        self.section.evaluate(interp)
    }
}

struct SectionCommandParser;

impl CommandParser for SectionCommandParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut sec = Section::default();
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan(section(&mut sec)) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(accum, SectionCommand { section: sec });
        ParseResult::Continue
    }
}

/// Consumes its command character and stops the enclosing parse loop with a
/// structural close signal.
struct CloseParser {
    result: ParseResult,
}

impl CommandParser for CloseParser {
    fn parse(
        &self,
        _: &mut Interpreter,
        _: &mut Option<Box<Command>>,
        _: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        *offset += 1;
        self.result
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("section-command", Rc::new(SectionCommandParser));
    interp.bind_long(
        "close-paren",
        Rc::new(CloseParser {
            result: ParseResult::StopCloseParen,
        }),
    );
    interp.bind_long(
        "close-bracket",
        Rc::new(CloseParser {
            result: ParseResult::StopCloseBracket,
        }),
    );
    interp.bind_long(
        "close-brace",
        Rc::new(CloseParser {
            result: ParseResult::StopCloseBrace,
        }),
    );
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![paren_group_evaluates_contents, "`(abc)", "abc"];
    exec_test![bracket_group_is_literal, "`[a`#meta#c]", "a`c"];
    exec_test![brace_group_is_verbatim, "`{a`meta c}", "a`meta c"];
    exec_test![nested_groups, "`(`(x))", "x"];
    exec_test![left_capture_takes_preceding_output, "ab`<!", "ab!"];
    exec_failure_test![unbalanced_paren, "`(abc"];
    exec_failure_test![stray_close_bracket, "abc]"];
}
