//! User-defined functions: `defun`, `lambda` and dynamic invocation.

use std::rc::Rc;
use tglng::argument::{alt, arith, at, ch, ch_into, exact, exact_flag, opt, to, ArgumentParser};
use tglng::command::SelfInsert;
use tglng::error::{EvalError, EvalResult};
use tglng::function::{invoke_function, FunctionParser};
use tglng::prelude::*;

/// A user function body with its register-mapped parameter lists, stored as
/// an interpreter external and invoked through the function calling
/// convention with the external id as `parm`.
struct UserFunction {
    body: Option<Box<Command>>,
    outputs: Vec<char>,
    inputs: Vec<char>,
}

fn execute_user_function(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    parm: u32,
) -> Result<(), EvalError> {
    let function = interp
        .external::<UserFunction>(parm)
        .ok_or_else(|| EvalError::new("user function body has been destroyed"))?;

    // The whole register map is saved around the call and restored whether
    // or not the body succeeds.
    let saved_registers = interp.registers.clone();

    for (register, value) in function.inputs.iter().zip(input.iter()) {
        interp.registers.insert(*register, value.clone());
    }

    let result = interp.exec_opt(&function.body);

    if let Ok(value) = &result {
        out[0] = value.clone();
        for (i, register) in function.outputs.iter().enumerate() {
            out[i + 1] = interp.registers.get(register).cloned().unwrap_or_default();
        }
    }

    interp.registers = saved_registers;
    result.map(|_| ())
}

/// Installs a user function under `long_name`, with an optional short
/// binding. Fails if the name is taken.
fn define_function(
    interp: &mut Interpreter,
    short_name: Option<char>,
    long_name: &str,
    outputs: Vec<char>,
    inputs: Vec<char>,
    body: Option<Box<Command>>,
    text: &[char],
    name_offset: usize,
) -> bool {
    if interp.contains_long(long_name) {
        interp.error(
            &format!("command name already in use: {long_name}"),
            text,
            name_offset,
        );
        return false;
    }

    let output_arity = outputs.len() + 1;
    let input_arity = inputs.len();
    let id = interp.bind_external(UserFunction {
        body,
        outputs,
        inputs,
    });
    interp.bind_long(
        long_name,
        Rc::new(FunctionParser::from_function(Function::with_parm(
            output_arity,
            input_arity,
            execute_user_function,
            id,
        ))),
    );
    if let Some(c) = short_name {
        interp
            .bind_short(c, long_name)
            .expect("the function was just bound");
    }
    true
}

/// `defun NAME# [:c] [OUTREGS] (INREGS) BODY` — defines a named function.
struct DefunParser;

impl CommandParser for DefunParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut name = String::new();
        let mut name_offset = 0;
        let mut short_name = '\0';
        let mut outputs = String::new();
        let mut inputs = String::new();
        let mut body = None;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                at(to(&mut name, '#'), &mut name_offset),
                opt((exact(':'), ch_into(&mut short_name))),
                opt((exact('['), alt(to(&mut outputs, ']'), exact(']')))),
                opt((exact('('), alt(to(&mut inputs, ')'), exact(')')))),
                arith(&mut body),
            )) {
                return ParseResult::Error;
            }
        }
        let name = name.trim().to_string();
        let short_name = (short_name != '\0').then_some(short_name);

        if define_function(
            interp,
            short_name,
            &name,
            outputs.chars().collect(),
            inputs.chars().collect(),
            body,
            text,
            name_offset,
        ) {
            ParseResult::Continue
        } else {
            ParseResult::Error
        }
    }
}

static NEXT_LAMBDA: std::sync::atomic::AtomicU32 = std::sync::atomic::AtomicU32::new(0);

/// `lambda [OUTREGS] (INREGS) BODY` — defines an anonymous function and
/// evaluates to its synthesized name. The name embeds a `#`, which users
/// cannot write in their own names, so collisions are impossible.
struct LambdaParser;

impl CommandParser for LambdaParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let original_offset = *offset;
        let mut outputs = String::new();
        let mut inputs = String::new();
        let mut body = None;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                opt((exact('['), alt(to(&mut outputs, ']'), exact(']')))),
                opt((exact('('), alt(to(&mut inputs, ')'), exact(')')))),
                arith(&mut body),
            )) {
                return ParseResult::Error;
            }
        }

        let name = format!(
            "lambda#{}",
            NEXT_LAMBDA.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
        );
        debug_assert!(!interp.contains_long(&name));
        if !define_function(
            interp,
            None,
            &name,
            outputs.chars().collect(),
            inputs.chars().collect(),
            body,
            text,
            original_offset,
        ) {
            return ParseResult::Error;
        }
        tglng::command::push(accum, SelfInsert::new(name));
        ParseResult::Continue
    }
}

/// The runtime half of `call`: the function is named by the output of a
/// command evaluated at call time.
struct DynamicInvocation {
    function_name: Option<Box<Command>>,
    outregs: Vec<char>,
    arguments: Vec<Option<Box<Command>>>,
}

impl Node for DynamicInvocation {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let name = interp.exec_opt(&self.function_name)?;
        let name = name.trim();
        let parser = interp.long_command(name).ok_or_else(|| {
            EvalError::new(format!("in dynamic function invocation: no such command: {name}"))
        })?;
        let function = parser.function().ok_or_else(|| {
            EvalError::new(format!("in dynamic function invocation: not a function: {name}"))
        })?;
        invoke_function(interp, &function, &self.outregs, &self.arguments)
    }
}

/// `call FNAME [OUTREGS] (arg, …)` — invokes the function whose name is the
/// output of `FNAME`.
struct CallParser;

impl CommandParser for CallParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut function_name = None;
        let mut outregs = String::new();
        let mut arguments = Vec::new();
        let mut done = false;
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                arith(&mut function_name),
                opt((exact('['), alt(exact(']'), to(&mut outregs, ']')))),
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
        tglng::command::push(
            accum,
            DynamicInvocation {
                function_name,
                outregs: outregs.chars().collect(),
                arguments,
            },
        );
        ParseResult::Continue
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("defun", Rc::new(DefunParser));
    interp.bind_long("lambda", Rc::new(LambdaParser));
    interp.bind_long("call", Rc::new(CallParser));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    // Function bodies are written in bracket sections: parsed in Literal
    // mode, with `#r#` references reading the parameter registers at call
    // time.
    exec_test![
        defun_and_invoke,
        "`defun twice#(x)[`#x#`#x#]`twice(ab)",
        "abab"
    ];
    exec_test![
        defun_with_output_registers,
        "`defun div#[r](nd)[`num-div(`#n#, `#d#)`write-reg r(`num-mod(`#n#, `#d#))]`div[m](7, 2):`#m#",
        "3:1"
    ];
    exec_test![
        registers_restored_after_call,
        "`write-reg x{outer}`defun f#(x)[`#x#]`f(inner)`read-reg x",
        "innerouter"
    ];
    exec_failure_test![defun_name_collision, "`defun no-op#() 1"];
    exec_test![
        call_invokes_by_computed_name,
        "`defun g#(x)[<`#x#>]`call {g}(y)",
        "<y>"
    ];
    exec_test![
        lambda_evaluates_to_invokable_name,
        "`let f # = `lambda(x)[<`#x#>] : `call `#f#(z)",
        "<z>"
    ];
}
