//! Lexically scoped named variables.
//!
//! `let` introduces a name for the duration of its body by temporarily
//! binding a variable parser under that name; the previous binding (if any)
//! is restored when the body has been parsed, whether or not parsing
//! succeeded. The value cell is shared between the reader commands and the
//! `set` command.

use std::cell::RefCell;
use std::rc::Rc;
use tglng::argument::{arith, at, ch, exact, to, ArgumentParser};
use tglng::error::EvalResult;
use tglng::prelude::*;

type Variable = Rc<RefCell<String>>;

/// Reads the variable cell.
struct VariableGet {
    variable: Variable,
}

impl Node for VariableGet {
    fn evaluate(&self, _: &mut Interpreter) -> EvalResult {
        Ok(self.variable.borrow().clone())
    }
}

/// The parser bound under the variable's name for the scope of the `let`
/// body. Temporary, so it can never be bound to a short name.
pub(crate) struct VariableGetParser {
    pub(crate) variable: Variable,
}

impl CommandParser for VariableGetParser {
    fn parse(
        &self,
        _: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        _: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        *offset += 1;
        tglng::command::push(
            accum,
            VariableGet {
                variable: Rc::clone(&self.variable),
            },
        );
        ParseResult::Continue
    }

    fn is_temporary(&self) -> bool {
        true
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }
}

/// Evaluates the value command and stores the result in the cell.
struct VariableSet {
    variable: Variable,
    value: Option<Box<Command>>,
}

impl Node for VariableSet {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let value = interp.exec_opt(&self.value)?;
        *self.variable.borrow_mut() = value;
        Ok(String::new())
    }
}

/// Sets the cell, runs the body, restores the cell's previous value whether
/// or not the body succeeded.
struct VariableLet {
    variable: Variable,
    value: Option<Box<Command>>,
    body: Option<Box<Command>>,
}

impl Node for VariableLet {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let saved = self.variable.borrow().clone();
        let value = interp.exec_opt(&self.value)?;
        *self.variable.borrow_mut() = value;
        let result = interp.exec_opt(&self.body);
        *self.variable.borrow_mut() = saved;
        result
    }
}

/// `let NAME# = VALUE BODY…` — binds `NAME` for the rest of the current
/// parse context.
struct LetParser;

impl CommandParser for LetParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut name = String::new();
        let mut value = None;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), to(&mut name, '#'), exact('='), arith(&mut value))) {
                return ParseResult::Error;
            }
        }
        let name = name.trim().to_string();
        let variable: Variable = Default::default();

        // Temporarily shadow whatever held the name before.
        let old = interp.replace_long(
            &name,
            Rc::new(VariableGetParser {
                variable: Rc::clone(&variable),
            }),
        );

        let mut body = None;
        let result = interp.parse_all(&mut body, text, offset, ParseMode::Command);

        interp.restore_long(&name, old);

        if result != ParseResult::Error {
            tglng::command::push(
                accum,
                VariableLet {
                    variable,
                    value,
                    body,
                },
            );
        }
        result
    }
}

/// `set NAME# = VALUE` — assigns to a variable in scope.
struct SetParser;

impl CommandParser for SetParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut name = String::new();
        let mut name_offset = 0;
        let mut value = None;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                at(to(&mut name, '#'), &mut name_offset),
                exact('='),
                arith(&mut value),
            )) {
                return ParseResult::Error;
            }
        }
        let name = name.trim().to_string();

        let Some(parser) = interp.long_command(&name) else {
            interp.error(&format!("no such command: {name}"), text, name_offset);
            return ParseResult::Error;
        };
        let Some(getter) = parser
            .as_any()
            .and_then(|any| any.downcast_ref::<VariableGetParser>())
        else {
            interp.error(
                &format!("not a variable (in this scope): {name}"),
                text,
                name_offset,
            );
            return ParseResult::Error;
        };
        let variable = Rc::clone(&getter.variable);
        tglng::command::push(accum, VariableSet { variable, value });
        ParseResult::Continue
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("let", Rc::new(LetParser));
    interp.bind_long("set", Rc::new(SetParser));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![let_binds_value, "`let x # = 5 : `#x#", "5"];
    exec_test![let_body_runs_in_command_mode, "`(`let v # = {hi} `#v#`#v#)", "hihi"];
    exec_test![set_mutates_in_scope, "`(`let x # = 1 `set x # = 2 `#x#)", "2"];
    exec_test![
        let_shadows_and_restores,
        "`(`let x # = {a} `let x # = {b} `#x#)", "b"
    ];
    exec_failure_test![variable_out_of_scope, "`(`let x # = 1 )`#x#"];
    exec_failure_test![set_requires_a_variable, "`set no-op # = 1"];
}
