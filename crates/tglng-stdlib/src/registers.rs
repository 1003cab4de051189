//! Register access commands.
//!
//! Registers are single-character slots global to one interpreter. The
//! read command node itself lives in the core crate because the `$` section
//! form produces it too.

use std::rc::Rc;
use tglng::argument::{ch, ch_into, section, ArgumentParser};
use tglng::command::ReadRegister;
use tglng::error::EvalResult;
use tglng::prelude::*;

/// `read-reg r` — evaluates to the register's value; unset is an error.
struct ReadRegisterParser;

impl CommandParser for ReadRegisterParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut register = ' ';
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), ch_into(&mut register))) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(accum, ReadRegister::new(register));
        ParseResult::Continue
    }
}

/// `write-reg r SECTION` — stores the section's output in the register.
struct WriteRegister {
    register: char,
    section: Section,
}

impl Node for WriteRegister {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let value = self.section.evaluate(interp)?;
        interp.registers.insert(self.register, value);
        Ok(String::new())
    }
}

struct WriteRegisterParser;

impl CommandParser for WriteRegisterParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut register = ' ';
        let mut sec = Section::default();
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), ch_into(&mut register), section(&mut sec))) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(
            accum,
            WriteRegister {
                register,
                section: sec,
            },
        );
        ParseResult::Continue
    }
}

/// `unset-reg r` — removes the register.
struct UnsetRegister {
    register: char,
}

impl Node for UnsetRegister {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        interp.registers.remove(&self.register);
        Ok(String::new())
    }
}

struct UnsetRegisterParser;

impl CommandParser for UnsetRegisterParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut register = ' ';
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), ch_into(&mut register))) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(accum, UnsetRegister { register });
        ParseResult::Continue
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("read-reg", Rc::new(ReadRegisterParser));
    interp.bind_long("write-reg", Rc::new(WriteRegisterParser));
    interp.bind_long("unset-reg", Rc::new(UnsetRegisterParser));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![write_then_read, "`write-reg x{hi}`read-reg x", "hi"];
    exec_test![dollar_section_reads_register, "`write-reg x{hi}`$x", "hi"];
    exec_test![hash_reference_reads_register, "`write-reg x{hi}`#x#", "hi"];
    exec_failure_test![read_unset_register, "`read-reg q"];
    exec_failure_test![unset_then_read, "`write-reg x{v}`unset-reg x`read-reg x"];
    exec_test![
        write_reg_left_section_captures,
        "prefix`write-reg x<`#x#!",
        "prefix!"
    ];
}
