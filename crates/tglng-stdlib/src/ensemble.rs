//! Ensembles: named sub-registries of single-character commands.
//!
//! An ensemble is itself a command parser; invoking it reads one more
//! character and dispatches to the parser bound to that character, with the
//! offset backed up so the delegate sees the character as its own command
//! character.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tglng::argument::{at, ch, ch_into, to, ArgumentParser};
use tglng::prelude::*;

struct Ensemble {
    commands: RefCell<HashMap<char, Rc<dyn CommandParser>>>,
}

impl CommandParser for Ensemble {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut subcommand = ' ';
        let mut subcommand_offset = 0;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), at(ch_into(&mut subcommand), &mut subcommand_offset))) {
                return ParseResult::Error;
            }
        }
        // The delegate re-reads the subcommand character.
        *offset = subcommand_offset;

        let delegate = self.commands.borrow().get(&subcommand).cloned();
        match delegate {
            Some(parser) => parser.parse(interp, accum, text, offset),
            None => {
                interp.error(
                    &format!("no such ensemble subcommand: {subcommand}"),
                    text,
                    subcommand_offset,
                );
                ParseResult::Error
            }
        }
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }
}

/// `ensemble-new NAME#` — registers an empty ensemble under a long name.
struct EnsembleNewParser;

impl CommandParser for EnsembleNewParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut name = String::new();
        let mut name_offset = 0;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), at(to(&mut name, '#'), &mut name_offset))) {
                return ParseResult::Error;
            }
        }
        let name = name.trim().to_string();
        if interp.contains_long(&name) {
            interp.error(
                &format!("command name already in use: {name}"),
                text,
                name_offset,
            );
            return ParseResult::Error;
        }
        interp.bind_long(
            name,
            Rc::new(Ensemble {
                commands: RefCell::new(HashMap::new()),
            }),
        );
        ParseResult::Continue
    }
}

/// `ensemble-bind ENSEMBLE# COMMAND# c` — binds the character `c` to a
/// long-named command inside the ensemble.
struct EnsembleBindParser;

impl CommandParser for EnsembleBindParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut ensemble_name = String::new();
        let mut ensemble_offset = 0;
        let mut command_name = String::new();
        let mut command_offset = 0;
        let mut short_name = ' ';
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                at(to(&mut ensemble_name, '#'), &mut ensemble_offset),
                at(to(&mut command_name, '#'), &mut command_offset),
                ch_into(&mut short_name),
            )) {
                return ParseResult::Error;
            }
        }
        let ensemble_name = ensemble_name.trim();
        let command_name = command_name.trim();

        let Some(ensemble_parser) = interp.long_command(ensemble_name) else {
            interp.error(
                &format!("no such ensemble: {ensemble_name}"),
                text,
                ensemble_offset,
            );
            return ParseResult::Error;
        };
        let Some(ensemble) = ensemble_parser
            .as_any()
            .and_then(|any| any.downcast_ref::<Ensemble>())
        else {
            interp.error(
                &format!("not an ensemble: {ensemble_name}"),
                text,
                ensemble_offset,
            );
            return ParseResult::Error;
        };
        let Some(command) = interp.long_command(command_name) else {
            interp.error(
                &format!("no such command: {command_name}"),
                text,
                command_offset,
            );
            return ParseResult::Error;
        };
        ensemble.commands.borrow_mut().insert(short_name, command);
        ParseResult::Continue
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("ensemble-new", Rc::new(EnsembleNewParser));
    interp.bind_long("ensemble-bind", Rc::new(EnsembleBindParser));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![
        ensemble_dispatches_subcommand,
        "`ensemble-new ops#`ensemble-bind ops#num-add#a`ops a(1, 2)",
        "3"
    ];
    exec_failure_test![
        unbound_subcommand,
        "`ensemble-new ops#`ops q"
    ];
    exec_failure_test![name_collision, "`ensemble-new no-op#"];
    exec_failure_test![
        bind_to_non_ensemble,
        "`ensemble-bind no-op#num-add#a"
    ];
}
