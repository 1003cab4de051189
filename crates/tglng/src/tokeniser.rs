//! The pluggable two-function tokeniser protocol.
//!
//! A tokeniser iterates over a textual sequence using two [Function]s. The
//! `init` function, of shape `(str ← str options)`, normalises the input
//! string; it runs lazily on the first use. The `next` function, of shape
//! `(token remainder ← remainder options)`, extracts one token; the
//! sequence is exhausted when the returned remainder is empty.
//!
//! The default word-splitting implementation of `next` lives in the command
//! library; this module only fixes the protocol.

use crate::error::EvalError;
use crate::function::Function;
use crate::interp::Interpreter;

fn default_init(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    out[0] = input[0].clone();
    Ok(())
}

/// Iterates tokens out of a string using an `init` and a `next` function.
pub struct Tokeniser {
    init: Function,
    next: Function,
    options: String,
    remainder: String,
    has_init: bool,
    failed: bool,
}

impl Tokeniser {
    /// The default `init`: the input string is passed through unchanged.
    pub fn default_init() -> Function {
        Function::new(1, 2, default_init)
    }

    /// Constructs a tokeniser over `text` with the given `next` function and
    /// the default `init`.
    pub fn new<T: Into<String>, O: Into<String>>(next: Function, text: T, options: O) -> Tokeniser {
        Tokeniser::with_init(Tokeniser::default_init(), next, text, options)
    }

    /// Constructs a tokeniser with an explicit `init` function, which will
    /// not run until the first [next](Tokeniser::next) or
    /// [has_more](Tokeniser::has_more) call.
    pub fn with_init<T: Into<String>, O: Into<String>>(
        init: Function,
        next: Function,
        text: T,
        options: O,
    ) -> Tokeniser {
        Tokeniser {
            init,
            next,
            options: options.into(),
            remainder: text.into(),
            has_init: false,
            failed: false,
        }
    }

    /// Extracts the next token, or `None` when the sequence is exhausted.
    ///
    /// A function failure poisons the tokeniser: the error is returned and
    /// every later call reports exhaustion.
    pub fn next(&mut self, interp: &mut Interpreter) -> Result<Option<String>, EvalError> {
        if !self.has_more(interp)? {
            return Ok(None);
        }
        let mut inputs = vec![String::new(); self.next.input_arity];
        if let Some(slot) = inputs.get_mut(0) {
            *slot = self.remainder.clone();
        }
        if let Some(slot) = inputs.get_mut(1) {
            *slot = self.options.clone();
        }
        let mut outputs = vec![String::new(); self.next.output_arity];
        if let Err(error) = self.next.invoke(&mut outputs, &inputs, interp) {
            self.failed = true;
            return Err(error);
        }
        let mut outputs = outputs.into_iter();
        let token = outputs.next().unwrap_or_default();
        self.remainder = outputs.next().unwrap_or_default();
        Ok(Some(token))
    }

    /// Whether another token can be extracted. Runs `init` if it has not run
    /// yet, so this may modify the interpreter.
    pub fn has_more(&mut self, interp: &mut Interpreter) -> Result<bool, EvalError> {
        if self.failed {
            return Ok(false);
        }
        if !self.has_init {
            let mut inputs = vec![String::new(); self.init.input_arity];
            if let Some(slot) = inputs.get_mut(0) {
                *slot = self.remainder.clone();
            }
            if let Some(slot) = inputs.get_mut(1) {
                *slot = self.options.clone();
            }
            let mut outputs = vec![String::new(); self.init.output_arity];
            if let Err(error) = self.init.invoke(&mut outputs, &inputs, interp) {
                self.failed = true;
                return Err(error);
            }
            self.remainder = outputs.into_iter().next().unwrap_or_default();
            self.has_init = true;
        }
        Ok(!self.remainder.is_empty())
    }

    /// Whether the sequence is known to be exhausted. Before `init` has run
    /// the condition is unknown and this returns false.
    pub fn is_exhausted(&self) -> bool {
        if self.failed {
            return true;
        }
        self.has_init && self.remainder.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Splits off one character per call.
    fn split_first(
        out: &mut [String],
        input: &[String],
        _: &mut Interpreter,
        _: u32,
    ) -> Result<(), EvalError> {
        let mut chars = input[0].chars();
        out[0] = chars.next().map(String::from).unwrap_or_default();
        out[1] = chars.collect();
        Ok(())
    }

    fn failing(
        _: &mut [String],
        _: &[String],
        _: &mut Interpreter,
        _: u32,
    ) -> Result<(), EvalError> {
        Err(EvalError::new("boom"))
    }

    #[test]
    fn iterates_to_exhaustion() {
        let mut interp = Interpreter::new();
        let mut t = Tokeniser::new(Function::new(2, 2, split_first), "abc", "");
        assert!(!t.is_exhausted());
        assert_eq!(t.next(&mut interp).unwrap(), Some("a".to_string()));
        assert_eq!(t.next(&mut interp).unwrap(), Some("b".to_string()));
        assert_eq!(t.next(&mut interp).unwrap(), Some("c".to_string()));
        assert_eq!(t.next(&mut interp).unwrap(), None);
        assert!(t.is_exhausted());
    }

    #[test]
    fn init_runs_once_and_lazily() {
        fn reverse_init(
            out: &mut [String],
            input: &[String],
            _: &mut Interpreter,
            _: u32,
        ) -> Result<(), EvalError> {
            out[0] = input[0].chars().rev().collect();
            Ok(())
        }
        let mut interp = Interpreter::new();
        let mut t = Tokeniser::with_init(
            Function::new(1, 2, reverse_init),
            Function::new(2, 2, split_first),
            "abc",
            "",
        );
        assert_eq!(t.next(&mut interp).unwrap(), Some("c".to_string()));
        assert_eq!(t.next(&mut interp).unwrap(), Some("b".to_string()));
    }

    #[test]
    fn failure_poisons_the_tokeniser() {
        let mut interp = Interpreter::new();
        let mut t = Tokeniser::new(Function::new(2, 2, failing), "abc", "");
        assert!(t.next(&mut interp).is_err());
        assert!(t.is_exhausted());
        assert_eq!(t.next(&mut interp).unwrap(), None);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut interp = Interpreter::new();
        let mut t = Tokeniser::new(Function::new(2, 2, split_first), "", "");
        assert!(!t.has_more(&mut interp).unwrap());
        assert_eq!(t.next(&mut interp).unwrap(), None);
    }
}
