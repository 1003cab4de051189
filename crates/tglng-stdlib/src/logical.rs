//! Boolean connectives.
//!
//! `logical-and` and `logical-or` evaluate their second argument only when
//! the first does not decide the result, so side effects in the skipped
//! argument never run. The function facets evaluate eagerly (the calling
//! convention passes evaluated strings).

use std::rc::Rc;
use tglng::argument::{arith, ch, ArgumentParser};
use tglng::error::{EvalError, EvalResult};
use tglng::prelude::*;
use tglng::text::parse_bool;

#[derive(Clone, Copy, PartialEq)]
enum Connective {
    And,
    Or,
    Xor,
}

impl Connective {
    fn needs_rhs(self, lhs: bool) -> bool {
        match self {
            Connective::And => lhs,
            Connective::Or => !lhs,
            Connective::Xor => true,
        }
    }

    fn eval(self, lhs: bool, rhs: bool) -> bool {
        match self {
            Connective::And => lhs && rhs,
            Connective::Or => lhs || rhs,
            Connective::Xor => lhs ^ rhs,
        }
    }
}

struct Logical {
    connective: Connective,
    lhs: Option<Box<Command>>,
    rhs: Option<Box<Command>>,
}

impl Node for Logical {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let lhs = parse_bool(&interp.exec_opt(&self.lhs)?);
        let rhs = if self.connective.needs_rhs(lhs) {
            parse_bool(&interp.exec_opt(&self.rhs)?)
        } else {
            false
        };
        Ok(if self.connective.eval(lhs, rhs) { "1" } else { "0" }.to_string())
    }
}

struct LogicalParser {
    connective: Connective,
}

impl CommandParser for LogicalParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut lhs = None;
        let mut rhs = None;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), arith(&mut lhs), arith(&mut rhs))) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(
            accum,
            Logical {
                connective: self.connective,
                lhs,
                rhs,
            },
        );
        ParseResult::Continue
    }

    fn function(&self) -> Option<Function> {
        Some(match self.connective {
            Connective::And => Function::new(1, 2, and_fn),
            Connective::Or => Function::new(1, 2, or_fn),
            Connective::Xor => Function::new(1, 2, xor_fn),
        })
    }
}

macro_rules! connective_fn {
    ($name:ident, $connective:expr) => {
        fn $name(
            out: &mut [String],
            input: &[String],
            _: &mut Interpreter,
            _: u32,
        ) -> Result<(), EvalError> {
            let lhs = parse_bool(&input[0]);
            let rhs = parse_bool(&input[1]);
            out[0] = if $connective.eval(lhs, rhs) { "1" } else { "0" }.to_string();
            Ok(())
        }
    };
}

connective_fn![and_fn, Connective::And];
connective_fn![or_fn, Connective::Or];
connective_fn![xor_fn, Connective::Xor];

/// `logical-not ARG` — boolean negation, `(1 ← 1)` as a function.
struct Not {
    sub: Option<Box<Command>>,
}

impl Node for Not {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let value = parse_bool(&interp.exec_opt(&self.sub)?);
        Ok(if value { "0" } else { "1" }.to_string())
    }
}

struct NotParser;

fn not_fn(out: &mut [String], input: &[String], _: &mut Interpreter, _: u32) -> Result<(), EvalError> {
    out[0] = if parse_bool(&input[0]) { "0" } else { "1" }.to_string();
    Ok(())
}

impl CommandParser for NotParser {
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
        tglng::command::push(accum, Not { sub });
        ParseResult::Continue
    }

    fn function(&self) -> Option<Function> {
        Some(Function::new(1, 1, not_fn))
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long(
        "logical-and",
        Rc::new(LogicalParser {
            connective: Connective::And,
        }),
    );
    interp.bind_long(
        "logical-or",
        Rc::new(LogicalParser {
            connective: Connective::Or,
        }),
    );
    interp.bind_long(
        "logical-xor",
        Rc::new(LogicalParser {
            connective: Connective::Xor,
        }),
    );
    interp.bind_long("logical-not", Rc::new(NotParser));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![and_table, "`logical-and 1 1`logical-and 1 0`logical-and 0 1", "100"];
    exec_test![or_table, "`logical-or 0 0`logical-or 0 1`logical-or 1 0", "011"];
    exec_test![xor_table, "`logical-xor 1 1`logical-xor 1 0", "01"];
    exec_test![not_negates, "`logical-not 0`logical-not 7", "10"];
    // The second argument is skipped entirely when the first decides the
    // result, so its evaluation error never happens.
    exec_test![and_short_circuits, "`logical-and 0 (`error{boom})", "0"];
    exec_failure_test![and_evaluates_rhs_when_needed, "`logical-and 1 (`error{boom})"];
}
