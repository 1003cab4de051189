//! Environment and subprocess commands.

use std::rc::Rc;
use tglng::error::EvalError;
use tglng::prelude::*;
use tglng::text::parse_bool;

/// `getenv(NAME)` — `(value found ← name)`.
fn getenv_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    match std::env::var(input[0].trim()) {
        Ok(value) => {
            out[0] = value;
            out[1] = "1".to_string();
        }
        Err(_) => {
            out[0].clear();
            out[1] = "0".to_string();
        }
    }
    Ok(())
}

/// `setenv(NAME, VALUE)`.
fn setenv_fn(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let name = input[0].trim();
    if name.is_empty() || name.contains('=') {
        return Err(EvalError::new(format!(
            "invalid environment variable name: {name}"
        )));
    }
    std::env::set_var(name, &input[1]);
    out[0].clear();
    Ok(())
}

/// `exec(COMMAND, INPUT, TOLERATE)` — `(output status ← command input
/// tolerate)`. Runs the command under `$SHELL -c`, piping `INPUT` to its
/// standard input. A non-zero exit status is an error unless `TOLERATE` is
/// true.
fn exec_fn(
    out: &mut [String],
    input: &[String],
    interp: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let argv = vec![shell, "-c".to_string(), input[0].clone()];
    let runner = Rc::clone(&interp.process_runner);
    let (output, status) = runner
        .run(&argv, &input[1])
        .map_err(|error| EvalError::new(format!("running command {:?}: {error}", input[0])))?;

    if status != 0 && !parse_bool(&input[2]) {
        return Err(EvalError::new(format!(
            "command {:?} returned exit status {status}",
            input[0]
        )));
    }
    out[0] = output;
    out[1] = status.to_string();
    Ok(())
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("getenv", Rc::new(FunctionParser::new(2, 1, getenv_fn)));
    interp.bind_long("setenv", Rc::new(FunctionParser::new(1, 2, setenv_fn)));
    interp.bind_long("exec", Rc::new(FunctionParser::new(2, 3, exec_fn)));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};
    use std::rc::Rc;
    use tglng::interp::{Interpreter, MockProcessRunner};

    fn ok_runner(interp: &mut Interpreter) {
        interp.process_runner = Rc::new(MockProcessRunner::new("captured", 0));
    }

    fn failing_runner(interp: &mut Interpreter) {
        interp.process_runner = Rc::new(MockProcessRunner::new("", 3));
    }

    exec_test![
        setenv_then_getenv,
        "`setenv(TGLNG_TEST_VAR, {some value})`getenv[f](TGLNG_TEST_VAR)/`#f#",
        "some value/1"
    ];
    exec_test![getenv_missing, "`getenv[f](TGLNG_TEST_UNSET_VAR)`#f#", "0"];
    exec_failure_test![setenv_invalid_name, "`setenv({A=B}, x)"];
    exec_test![exec_captures_output, ok_runner, "`exec({cat}, {in}, 0)", "captured"];
    exec_test![
        exec_reports_status,
        failing_runner,
        "`exec[s]({false}, {}, 1)`#s#",
        "3"
    ];
    exec_failure_test![
        exec_nonzero_status_is_fatal_by_default,
        failing_runner,
        "`exec({false}, {}, 0)"
    ];
}
