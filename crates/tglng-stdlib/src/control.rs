//! Control flow: conditionals and loops.

use std::rc::Rc;
use tglng::argument::{arith, ch, ch_into, exact, opt, section, to, ArgumentParser};
use tglng::error::{EvalError, EvalResult};
use tglng::prelude::*;
use tglng::text::{parse_bool, parse_integer_str};
use tglng::tokeniser::Tokeniser;

/// `if COND-SECTION THEN-SECTION [ELSE-SECTION]`.
struct If {
    condition: Section,
    then: Section,
    otherwise: Section,
}

impl Node for If {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let condition = self.condition.evaluate(interp)?;
        if parse_bool(&condition) {
            self.then.evaluate(interp)
        } else {
            self.otherwise.evaluate(interp)
        }
    }
}

struct IfParser;

impl CommandParser for IfParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut condition = Section::default();
        let mut then = Section::default();
        let mut otherwise = Section::default();
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                section(&mut condition),
                section(&mut then),
                opt(section(&mut otherwise)),
            )) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(
            accum,
            If {
                condition,
                then,
                otherwise,
            },
        );
        ParseResult::Continue
    }
}

/// `false-coalesce A-SECTION B-SECTION` — evaluates to A's output unless it
/// is false, in which case B's.
struct FalseCoalesce {
    lhs: Section,
    rhs: Section,
}

impl Node for FalseCoalesce {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let lhs = self.lhs.evaluate(interp)?;
        if parse_bool(&lhs) {
            Ok(lhs)
        } else {
            self.rhs.evaluate(interp)
        }
    }
}

struct FalseCoalesceParser;

impl CommandParser for FalseCoalesceParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut lhs = Section::default();
        let mut rhs = Section::default();
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((ch(), section(&mut lhs), section(&mut rhs))) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(accum, FalseCoalesce { lhs, rhs });
        ParseResult::Continue
    }
}

/// Counted loop over an integer register.
struct ForInteger {
    /// Emit the register between the body's left and right parts on every
    /// iteration (`for-int-print`).
    emit_counter: bool,
    register: char,
    init: Option<Box<Command>>,
    limit: Option<Box<Command>>,
    increment: Option<Box<Command>>,
    body: Section,
}

impl ForInteger {
    fn read_counter(&self, interp: &Interpreter) -> Result<i64, EvalError> {
        let value = interp.registers.get(&self.register).ok_or_else(|| {
            EvalError::new(format!(
                "loop register {} was unset during execution",
                self.register
            ))
        })?;
        parse_integer_str(value).ok_or_else(|| {
            EvalError::new(format!(
                "loop register {} was set to invalid integer {value} during execution",
                self.register
            ))
        })
    }
}

impl Node for ForInteger {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let mut out = String::new();

        // The left part of the body runs once, before the loop.
        out.push_str(&interp.exec_opt(&self.body.left)?);

        let limit = match &self.limit {
            Some(limit) => {
                let value = interp.exec(limit)?;
                parse_integer_str(&value).ok_or_else(|| {
                    EvalError::new(format!("invalid integer for loop limit: {value}"))
                })?
            }
            None => 10,
        };

        let init = match &self.init {
            Some(init) => {
                let value = interp.exec(init)?;
                let parsed = parse_integer_str(&value).ok_or_else(|| {
                    EvalError::new(format!("invalid integer for loop start: {value}"))
                })?;
                interp.registers.insert(self.register, value);
                parsed
            }
            None => {
                interp.registers.insert(self.register, "0".to_string());
                0
            }
        };

        let increment = match &self.increment {
            Some(increment) => {
                let value = interp.exec(increment)?;
                match parse_integer_str(&value) {
                    Some(0) | None => {
                        return Err(EvalError::new(format!(
                            "invalid integer for loop increment: {value}"
                        )))
                    }
                    Some(parsed) => parsed,
                }
            }
            None => {
                if init <= limit {
                    1
                } else {
                    -1
                }
            }
        };

        let mut current = init;
        while (increment > 0 && current < limit) || (increment < 0 && current > limit) {
            if self.emit_counter {
                let value = self.read_counter(interp)?;
                out.push_str(&value.to_string());
            }
            out.push_str(&interp.exec_opt(&self.body.right)?);

            // The body may rewrite the register; it is re-read every
            // iteration.
            current = self.read_counter(interp)? + increment;
            interp.registers.insert(self.register, current.to_string());
        }

        Ok(out)
    }
}

/// Parser for `for-integer` and `for-int-print`.
///
/// The argument ladder, by alternation: `SECTION`, `LIMIT SECTION`,
/// `LIMIT REG SECTION`, `LIMIT REG INIT SECTION`, or `LIMIT REG INIT
/// INCREMENT SECTION`. The register defaults to `i`.
struct ForIntegerParser {
    emit_counter: bool,
}

impl CommandParser for ForIntegerParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut register = 'i';
        let mut init = None;
        let mut limit = None;
        let mut increment = None;
        let mut body = Section::default();
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan(ch()) {
                return ParseResult::Error;
            }
            if !a.peek(section(&mut body)) {
                if !a.scan(arith(&mut limit)) {
                    return ParseResult::Error;
                }
                if !a.peek(section(&mut body)) {
                    if !a.scan(ch_into(&mut register)) {
                        return ParseResult::Error;
                    }
                    if !a.peek(section(&mut body)) {
                        if !a.scan(arith(&mut init)) {
                            return ParseResult::Error;
                        }
                        if !a.peek(section(&mut body)) && !a.scan(arith(&mut increment)) {
                            return ParseResult::Error;
                        }
                    }
                }
            }
            if !a.scan(section(&mut body)) {
                return ParseResult::Error;
            }
        }
        tglng::command::push(
            accum,
            ForInteger {
                emit_counter: self.emit_counter,
                register,
                init,
                limit,
                increment,
                body,
            },
        );
        ParseResult::Continue
    }
}

/// Iteration over the tokens of a string.
struct ForEach {
    /// Emit each token between the body's left and right parts
    /// (`for-each-print`).
    emit_token: bool,
    register: char,
    tokeniser_name: String,
    options: Option<Box<Command>>,
    input: Option<Box<Command>>,
    body: Section,
}

impl Node for ForEach {
    fn evaluate(&self, interp: &mut Interpreter) -> EvalResult {
        let options = interp.exec_opt(&self.options)?;
        let input = interp.exec_opt(&self.input)?;

        let next = Function::get(interp, &self.tokeniser_name, 2, 2, true)?;
        let pre_name = format!("{}-pre", self.tokeniser_name);
        let init = if interp.contains_long(&pre_name) {
            Function::get(interp, &pre_name, 1, 2, true)?
        } else {
            Tokeniser::default_init()
        };
        let mut tokeniser = Tokeniser::with_init(init, next, input, options);

        let mut out = interp.exec_opt(&self.body.left)?;
        while let Some(token) = tokeniser.next(interp)? {
            interp.registers.insert(self.register, token.clone());
            if self.emit_token {
                out.push_str(&token);
            }
            out.push_str(&interp.exec_opt(&self.body.right)?);
        }
        Ok(out)
    }
}

/// Parser for `for-each` and `for-each-print`: `REG [#TOKENISER#]`, then by
/// alternation `INPUT SECTION` or `OPTIONS INPUT SECTION`.
struct ForEachParser {
    emit_token: bool,
}

impl CommandParser for ForEachParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let mut register = ' ';
        let mut tokeniser_name = String::new();
        let mut options = None;
        let mut input = None;
        let mut body = Section::default();
        {
            let mut a = ArgumentParser::new(interp, accum, text, offset);
            if !a.scan((
                ch(),
                ch_into(&mut register),
                opt((exact('#'), to(&mut tokeniser_name, '#'))),
            )) {
                return ParseResult::Error;
            }
            if !a.scan(arith(&mut input)) {
                return ParseResult::Error;
            }
            if !a.peek(section(&mut body)) {
                // Two arithmetic arguments: the first was the options.
                options = input.take();
                if !a.scan(arith(&mut input)) {
                    return ParseResult::Error;
                }
            }
            if !a.scan(section(&mut body)) {
                return ParseResult::Error;
            }
        }
        if tokeniser_name.is_empty() {
            tokeniser_name = "default-tokeniser".to_string();
        }
        tglng::command::push(
            accum,
            ForEach {
                emit_token: self.emit_token,
                register,
                tokeniser_name: tokeniser_name.trim().to_string(),
                options,
                input,
                body,
            },
        );
        ParseResult::Continue
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("if", Rc::new(IfParser));
    interp.bind_long("false-coalesce", Rc::new(FalseCoalesceParser));
    interp.bind_long(
        "for-integer",
        Rc::new(ForIntegerParser {
            emit_counter: false,
        }),
    );
    interp.bind_long(
        "for-int-print",
        Rc::new(ForIntegerParser { emit_counter: true }),
    );
    interp.bind_long("for-each", Rc::new(ForEachParser { emit_token: false }));
    interp.bind_long(
        "for-each-print",
        Rc::new(ForEachParser { emit_token: true }),
    );
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![if_true_branch, "`if{1}:yes:no", "yes"];
    exec_test![if_false_branch, "`if{0}:yes:no", "no"];
    exec_test![if_missing_else_is_empty, "`if{0}:yes!", "!"];
    exec_test![if_with_command_condition, "`if(`num-slt(3, 5)):yes:no", "yes"];
    exec_test![false_coalesce_keeps_truthy, "`false-coalesce{7}{9}", "7"];
    exec_test![false_coalesce_falls_back, "`false-coalesce{0}{9}", "9"];
    exec_test![for_integer_counts, "`for-integer 3:[`#i#-]", "0-1-2-"];
    exec_test![for_int_print_emits_counter, "`for-int-print 4:{,}", "0,1,2,3,"];
    exec_test![
        for_integer_explicit_register_and_init,
        "`for-integer 5 c 2 : [`#c#]",
        "234"
    ];
    exec_test![
        for_integer_counts_down,
        "`for-integer 3 c 6 -1 : [`#c#]",
        "654"
    ];
    exec_test![for_integer_empty_range, "`for-integer 0:{x}", ""];
    exec_failure_test![for_integer_zero_increment, "`for-integer 3 c 0 0 : {x}"];
    exec_test![
        for_each_sets_register,
        "`for-each w {a bb ccc} : [<`#w#>]",
        "<a><bb><ccc>"
    ];
    exec_test![
        for_each_print_with_options,
        "`for-each-print w {-s+d,} {a,b,c} : {.}",
        "a.b.c."
    ];
    exec_test![
        for_each_named_tokeniser,
        "`for-each w #default-tokeniser# {x y} : [`#w#!]",
        "x!y!"
    ];
}
