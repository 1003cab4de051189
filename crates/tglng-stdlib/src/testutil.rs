//! Utilities for writing unit tests.

use std::cell::RefCell;
use std::rc::Rc;
use tglng::interp::{Interpreter, ParseMode, RunError};

/// Creates a fully equipped interpreter with diagnostics discarded.
pub fn quiet_interpreter() -> Interpreter {
    let mut interp = crate::new_interpreter();
    interp.set_diagnostics(Rc::new(RefCell::new(std::io::sink())));
    interp
}

/// Runs one program in Literal mode against a fresh interpreter.
pub fn run(input: &str) -> Result<String, String> {
    run_with(|_| (), input)
}

/// Runs one program against a fresh interpreter after applying a setup
/// function (presetting registers, swapping the file system, and so on).
pub fn run_with(setup: fn(&mut Interpreter), input: &str) -> Result<String, String> {
    let mut interp = quiet_interpreter();
    setup(&mut interp);
    match interp.run(input, ParseMode::Literal) {
        Ok(output) => Ok(output),
        Err(RunError::Parse) => Err("parse error".to_string()),
        Err(RunError::Eval(error)) => Err(error.to_string()),
    }
}

/// Asserts that a program evaluates to the expected output.
#[macro_export]
macro_rules! exec_test {
    ($name:ident, $input:expr, $expected:expr) => {
        #[test]
        fn $name() {
            match $crate::testutil::run($input) {
                Ok(output) => assert_eq!(output, $expected),
                Err(error) => panic!("program failed: {error}\n  input: {}", $input),
            }
        }
    };
    ($name:ident, $setup:expr, $input:expr, $expected:expr) => {
        #[test]
        fn $name() {
            match $crate::testutil::run_with($setup, $input) {
                Ok(output) => assert_eq!(output, $expected),
                Err(error) => panic!("program failed: {error}\n  input: {}", $input),
            }
        }
    };
}

/// Asserts that a program fails to parse or evaluate.
#[macro_export]
macro_rules! exec_failure_test {
    ($name:ident, $input:expr) => {
        #[test]
        fn $name() {
            if let Ok(output) = $crate::testutil::run($input) {
                panic!("program unexpectedly succeeded with {output:?}\n  input: {}", $input);
            }
        }
    };
    ($name:ident, $setup:expr, $input:expr) => {
        #[test]
        fn $name() {
            if let Ok(output) = $crate::testutil::run_with($setup, $input) {
                panic!("program unexpectedly succeeded with {output:?}\n  input: {}", $input);
            }
        }
    };
}

pub use exec_failure_test;
pub use exec_test;
