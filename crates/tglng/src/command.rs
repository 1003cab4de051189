//! The command tree and the parser interface.
//!
//! A command is a node with an optional owned *left* back-link; writing `AB`
//! in source produces "B with A as its left". Evaluation of a node first
//! evaluates every link of the left chain in insertion order, then the node
//! itself, and concatenates the results. The chain walk is iterative (see
//! [Interpreter::exec](crate::interp::Interpreter::exec)) so degenerate
//! sources cannot overflow the stack.

use crate::error::{EvalError, EvalResult};
use crate::function::Function;
use crate::interp::Interpreter;
use crate::parse_result::ParseResult;
use std::any::Any;

/// The behaviour of a concrete command kind.
///
/// Implementations evaluate themselves against the interpreter and produce a
/// string or an error. They must not walk their own left chain; the
/// evaluator does that.
pub trait Node {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult;
}

/// A node in the evaluation tree.
pub struct Command {
    left: Option<Box<Command>>,
    node: Box<dyn Node>,
}

impl Command {
    /// Wraps a node, taking ownership of the accumulated left chain.
    pub fn new<N: Node + 'static>(left: Option<Box<Command>>, node: N) -> Box<Command> {
        Box::new(Command {
            left,
            node: Box::new(node),
        })
    }

    /// Wraps a node with no left sibling.
    pub fn leaf<N: Node + 'static>(node: N) -> Box<Command> {
        Command::new(None, node)
    }

    pub fn left(&self) -> Option<&Command> {
        self.left.as_deref()
    }

    /// Evaluates this node only, ignoring the left chain.
    pub fn evaluate_node(&self, interp: &mut Interpreter) -> EvalResult {
        self.node.evaluate(interp)
    }
}

/// Appends a node to the accumulator chain: the new command takes ownership
/// of the current chain as its left and becomes the new chain head.
pub fn push<N: Node + 'static>(accum: &mut Option<Box<Command>>, node: N) {
    let left = accum.take();
    *accum = Some(Command::new(left, node));
}

/// An ordered pair of optional command trees.
///
/// Sections are the canonical body-argument shape for commands that
/// distinguish a "before" and an "after" piece. They originate from the
/// seven surface forms handled in [crate::argument].
#[derive(Default)]
pub struct Section {
    pub left: Option<Box<Command>>,
    pub right: Option<Box<Command>>,
}

impl Section {
    /// Evaluates the left part, then the right part, and concatenates.
    pub fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let mut out = interp.exec_opt(&self.left)?;
        out.push_str(&interp.exec_opt(&self.right)?);
        Ok(out)
    }
}

/// Converts input text into a command.
///
/// Parsers are shared between interpreters ([std::rc::Rc] clones); `parse`
/// therefore takes `&self` and all mutable state lives in the interpreter or
/// behind interior mutability.
pub trait CommandParser {
    /// Tries to parse one command at `text[*offset]`.
    ///
    /// `accum` holds the left-hand chain; on success the parser either
    /// pushes a new head onto it (see [push]) or leaves it untouched for
    /// commands that exist only at parse time. `offset` is left at the next
    /// command on success, or at the problem point on error.
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult;

    /// The fixed-arity pure-function facet, if this parser exposes one.
    fn function(&self) -> Option<Function> {
        None
    }

    /// Temporary parsers are scoped (installed by `let`) and may be dropped
    /// before the interpreter is; they must never be bound to short names.
    fn is_temporary(&self) -> bool {
        false
    }

    /// Concrete-type access for the few parsers other commands must
    /// recognise (`set` finds variable parsers, `ensemble-bind` finds
    /// ensembles).
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Command which evaluates to a fixed string.
pub struct SelfInsert {
    value: String,
}

impl SelfInsert {
    pub fn new<T: Into<String>>(value: T) -> SelfInsert {
        SelfInsert {
            value: value.into(),
        }
    }

    pub fn from_char(c: char) -> SelfInsert {
        SelfInsert {
            value: c.to_string(),
        }
    }
}

impl Node for SelfInsert {
    fn evaluate(&self, _: &mut Interpreter) -> EvalResult {
        Ok(self.value.clone())
    }
}

/// Parser for [SelfInsert]: emits the character at the cursor literally.
pub struct SelfInsertParser;

impl CommandParser for SelfInsertParser {
    fn parse(
        &self,
        _: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        push(accum, SelfInsert::from_char(text[*offset]));
        *offset += 1;
        ParseResult::Continue
    }
}

/// Command which reads a register at evaluation time.
///
/// Produced by the `$` section form, by `read-reg`, and by `#c#` references
/// to single characters with no bound command.
pub struct ReadRegister {
    register: char,
}

impl ReadRegister {
    pub fn new(register: char) -> ReadRegister {
        ReadRegister { register }
    }
}

impl Node for ReadRegister {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        match interp.registers.get(&self.register) {
            Some(value) => Ok(value.clone()),
            None => Err(EvalError::new(format!(
                "attempt to read from unset register: {}",
                self.register
            ))),
        }
    }
}

/// Parser for long-name references of the form `name#`.
///
/// The default interpreter binds this to the short name `#`, so `#name#`
/// reads the name, then delegates to its parser with the offset left on the
/// closing hash (which plays the role of the command character). A name
/// bound in neither map parses as a register read when it is a single
/// character, and is an error otherwise.
pub struct LongCommandParser;

impl CommandParser for LongCommandParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut name = String::new();
        {
            let mut a = crate::argument::ArgumentParser::new(interp, accum, text, offset);
            use crate::argument::{ch, to};
            if !a.scan((ch(), to(&mut name, '#'))) {
                return ParseResult::Error;
            }
        }
        // Back to the closing hash, the effective command character.
        *offset -= 1;

        match interp.long_command(&name) {
            Some(parser) => parser.parse(interp, accum, text, offset),
            None => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        *offset += 1;
                        push(accum, ReadRegister::new(c));
                        ParseResult::Continue
                    }
                    _ => {
                        interp.error(&format!("unknown command: {name}"), text, *offset);
                        ParseResult::Error
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);
    impl Node for Fixed {
        fn evaluate(&self, _: &mut Interpreter) -> EvalResult {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn push_builds_left_chain() {
        let mut accum = None;
        push(&mut accum, Fixed("a"));
        push(&mut accum, Fixed("b"));
        push(&mut accum, Fixed("c"));
        let head = accum.unwrap();
        let mid = head.left().unwrap();
        let tail = mid.left().unwrap();
        assert!(tail.left().is_none());
    }

    #[test]
    fn left_chain_evaluates_in_insertion_order() {
        let mut interp = Interpreter::new();
        let mut accum = None;
        push(&mut accum, Fixed("a"));
        push(&mut accum, Fixed("b"));
        push(&mut accum, Fixed("c"));
        assert_eq!(interp.exec(accum.as_ref().unwrap()).unwrap(), "abc");
    }

    #[test]
    fn section_concatenates_both_parts() {
        let mut interp = Interpreter::new();
        let section = Section {
            left: Some(Command::leaf(Fixed("l"))),
            right: Some(Command::leaf(Fixed("r"))),
        };
        assert_eq!(section.evaluate(&mut interp).unwrap(), "lr");
    }

    #[test]
    fn empty_section_is_empty_string() {
        let mut interp = Interpreter::new();
        let section = Section::default();
        assert_eq!(section.evaluate(&mut interp).unwrap(), "");
    }

    #[test]
    fn read_register_unset_is_an_error() {
        let mut interp = Interpreter::new();
        assert!(ReadRegister::new('x').evaluate(&mut interp).is_err());
        interp.registers.insert('x', "value".to_string());
        assert_eq!(
            ReadRegister::new('x').evaluate(&mut interp).unwrap(),
            "value"
        );
    }
}
