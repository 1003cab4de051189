//! The fixed-arity function calling convention.
//!
//! A [Function] is a command variant which is dynamically invokable: it is
//! immutable, has a fixed arity and takes and returns only strings. The
//! arity is written `outputs ← inputs`; a function may return several
//! values, of which the first is the command's evaluation result and the
//! rest are written to caller-named output registers.

use crate::argument::{alt, arith, ch, exact, exact_flag, opt, to, ArgumentParser};
use crate::command::{push, Command, CommandParser};
use crate::error::{EvalError, EvalResult};
use crate::interp::Interpreter;
use crate::parse_result::ParseResult;

/// The implementation of a function.
///
/// `out` and `input` are sized exactly to the function's arities. `parm` is
/// an opaque integer fixed at construction, typically an external-object id.
pub type FunctionImpl =
    fn(out: &mut [String], input: &[String], interp: &mut Interpreter, parm: u32) -> Result<(), EvalError>;

/// A dynamically invokable `(outputs ← inputs)` string function.
#[derive(Clone, Copy)]
pub struct Function {
    pub output_arity: usize,
    pub input_arity: usize,
    imp: FunctionImpl,
    pub parm: u32,
}

impl Function {
    pub fn new(output_arity: usize, input_arity: usize, imp: FunctionImpl) -> Function {
        Function {
            output_arity,
            input_arity,
            imp,
            parm: 0,
        }
    }

    pub fn with_parm(
        output_arity: usize,
        input_arity: usize,
        imp: FunctionImpl,
        parm: u32,
    ) -> Function {
        Function {
            output_arity,
            input_arity,
            imp,
            parm,
        }
    }

    /// Whether this function has exactly the expected arity.
    pub fn matches(&self, output_arity: usize, input_arity: usize) -> bool {
        self.output_arity == output_arity && self.input_arity == input_arity
    }

    /// Whether this function can be called where the expected arity is
    /// assumed: it may ignore some inputs and leave some outputs untouched,
    /// so callers relying on this pre-fill the outputs.
    pub fn compatible(&self, output_arity: usize, input_arity: usize) -> bool {
        self.output_arity <= output_arity && self.input_arity <= input_arity
    }

    /// Invokes the function. The slices must be sized to the arities.
    pub fn invoke(
        &self,
        out: &mut [String],
        input: &[String],
        interp: &mut Interpreter,
    ) -> Result<(), EvalError> {
        debug_assert_eq!(out.len(), self.output_arity);
        debug_assert_eq!(input.len(), self.input_arity);
        (self.imp)(out, input, interp, self.parm)
    }

    /// Looks up a long command name and requires it to expose a function
    /// facet with the expected arity (exactly, or compatibly when `exact` is
    /// false).
    pub fn get(
        interp: &Interpreter,
        name: &str,
        output_arity: usize,
        input_arity: usize,
        exact: bool,
    ) -> Result<Function, EvalError> {
        let parser = interp
            .long_command(name)
            .ok_or_else(|| EvalError::new(format!("no such command: {name}")))?;
        let function = parser
            .function()
            .ok_or_else(|| EvalError::new(format!("not a function: {name}")))?;
        let ok = if exact {
            function.matches(output_arity, input_arity)
        } else {
            function.compatible(output_arity, input_arity)
        };
        if !ok {
            return Err(EvalError::new(format!(
                "function {name} has arity ({} <- {}), expected ({output_arity} <- {input_arity})",
                function.output_arity, function.input_arity
            )));
        }
        Ok(function)
    }
}

/// Evaluates argument commands, invokes the function, and distributes the
/// secondary outputs to the named registers. Shared by the static and
/// dynamic invocation commands.
pub fn invoke_function(
    interp: &mut Interpreter,
    function: &Function,
    outregs: &[char],
    arguments: &[Option<Box<Command>>],
) -> EvalResult {
    let mut inputs = vec![String::new(); function.input_arity];
    for (i, argument) in arguments.iter().enumerate() {
        let value = interp.exec_opt(argument)?;
        // Extra arguments are evaluated for their effects and discarded.
        if let Some(slot) = inputs.get_mut(i) {
            *slot = value;
        }
    }

    let mut outputs = vec![String::new(); function.output_arity];
    function.invoke(&mut outputs, &inputs, interp)?;

    for (i, output) in outputs.iter().enumerate().skip(1) {
        if let Some(&register) = outregs.get(i - 1) {
            interp.registers.insert(register, output.clone());
        }
    }
    Ok(outputs.into_iter().next().unwrap_or_default())
}

/// Command holding a function and its parsed call site.
pub struct FunctionInvocation {
    function: Function,
    outregs: Vec<char>,
    arguments: Vec<Option<Box<Command>>>,
}

impl crate::command::Node for FunctionInvocation {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        invoke_function(interp, &self.function, &self.outregs, &self.arguments)
    }
}

/// The generic parser for function-backed commands.
///
/// Reads the call surface `name[OUTREGS](arg, arg, …)`: an optional
/// bracketed output-register string, then a parenthesised comma-separated
/// argument list, `()` for none.
pub struct FunctionParser {
    function: Function,
}

impl FunctionParser {
    pub fn new(output_arity: usize, input_arity: usize, imp: FunctionImpl) -> FunctionParser {
        FunctionParser {
            function: Function::new(output_arity, input_arity, imp),
        }
    }

    pub fn from_function(function: Function) -> FunctionParser {
        FunctionParser { function }
    }
}

impl CommandParser for FunctionParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut outregs = String::new();
        let mut arguments: Vec<Option<Box<Command>>> = Vec::new();
        let mut done = false;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                opt((exact('['), to(&mut outregs, ']'))),
                exact('('),
                opt(exact_flag(&mut done, ')')),
            )) {
                return ParseResult::Error;
            }
            while !done {
                let mut argument = None;
                if !a.scan((
                    arith(&mut argument),
                    alt(exact(','), exact_flag(&mut done, ')')),
                )) {
                    return ParseResult::Error;
                }
                arguments.push(argument);
            }
        }
        push(
            accum,
            FunctionInvocation {
                function: self.function,
                outregs: outregs.chars().collect(),
                arguments,
            },
        );
        ParseResult::Continue
    }

    fn function(&self) -> Option<Function> {
        Some(self.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ParseMode;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn concat(
        out: &mut [String],
        input: &[String],
        _: &mut Interpreter,
        _: u32,
    ) -> Result<(), EvalError> {
        out[0] = format!("{}{}", input[0], input[1]);
        Ok(())
    }

    fn swap(
        out: &mut [String],
        input: &[String],
        _: &mut Interpreter,
        _: u32,
    ) -> Result<(), EvalError> {
        out[0] = input[1].clone();
        out[1] = input[0].clone();
        Ok(())
    }

    fn quiet_interp() -> Interpreter {
        let mut interp = Interpreter::new();
        interp.set_diagnostics(Rc::new(RefCell::new(std::io::sink())));
        interp
    }

    #[test]
    fn arity_predicates() {
        let f = Function::new(1, 2, concat);
        assert!(f.matches(1, 2));
        assert!(!f.matches(2, 2));
        assert!(f.compatible(1, 2));
        assert!(f.compatible(2, 3));
        assert!(!f.compatible(0, 2));
    }

    #[test]
    fn call_surface_parses_and_invokes() {
        let mut interp = quiet_interp();
        // Long mode so that bare words in argument position are literal.
        interp.long_mode = true;
        interp.bind_long("cat", Rc::new(FunctionParser::new(1, 2, concat)));
        interp.bind_short('c', "cat").unwrap();
        let out = interp.run("`c(foo, bar)", ParseMode::Literal).unwrap();
        assert_eq!(out, "foobar");
    }

    #[test]
    fn empty_argument_list() {
        fn nullary(
            out: &mut [String],
            _: &[String],
            _: &mut Interpreter,
            _: u32,
        ) -> Result<(), EvalError> {
            out[0] = "n".to_string();
            Ok(())
        }
        let mut interp = quiet_interp();
        interp.bind_long("n", Rc::new(FunctionParser::new(1, 0, nullary)));
        interp.bind_short('n', "n").unwrap();
        assert_eq!(interp.run("`n()", ParseMode::Literal).unwrap(), "n");
    }

    #[test]
    fn secondary_outputs_go_to_named_registers() {
        let mut interp = quiet_interp();
        interp.long_mode = true;
        interp.bind_long("swap", Rc::new(FunctionParser::new(2, 2, swap)));
        interp.bind_short('s', "swap").unwrap();
        let out = interp.run("`s[r](a, b)", ParseMode::Literal).unwrap();
        assert_eq!(out, "b");
        assert_eq!(interp.registers[&'r'], "a");
    }

    #[test]
    fn missing_close_paren_is_an_error() {
        let mut interp = quiet_interp();
        interp.long_mode = true;
        interp.bind_long("cat", Rc::new(FunctionParser::new(1, 2, concat)));
        interp.bind_short('c', "cat").unwrap();
        assert!(interp.run("`c(foo, bar", ParseMode::Literal).is_err());
    }

    #[test]
    fn function_get_validates_arity() {
        let mut interp = quiet_interp();
        interp.bind_long("cat", Rc::new(FunctionParser::new(1, 2, concat)));
        assert!(Function::get(&interp, "cat", 1, 2, true).is_ok());
        assert!(Function::get(&interp, "cat", 1, 1, true).is_err());
        assert!(Function::get(&interp, "cat", 1, 3, false).is_ok());
        assert!(Function::get(&interp, "missing", 1, 2, true).is_err());
        assert!(Function::get(&interp, "self-insert", 1, 2, true).is_err());
    }
}
