//! # TglNG: a string-oriented macro language interpreter.
//!
//! This crate implements the core of the TglNG language: the tokenising
//! parser, the command tree and its evaluator, the command-parser registry,
//! the register machinery, the function calling convention and the tokeniser
//! protocol.
//!
//! Every value in TglNG is a string. A program is a single text; parsing it
//! produces a tree of commands and evaluating the tree produces the output
//! text. The concrete command library lives in the `tglng-stdlib` crate;
//! this crate only knows how to parse, hold and evaluate commands.

pub mod argument;
pub mod command;
pub mod error;
pub mod function;
pub mod interp;
pub mod parse_result;
pub mod text;
pub mod tokeniser;

/// Module that re-exports the names needed by almost every command
/// implementation.
///
/// ```
/// use tglng::prelude::*;
/// ```
pub mod prelude {
    pub use super::argument::ArgumentParser;
    pub use super::command::{Command, CommandParser, Node, Section};
    pub use super::error::EvalError;
    pub use super::function::{Function, FunctionParser};
    pub use super::interp::{Interpreter, ParseMode};
    pub use super::parse_result::ParseResult;
}
