//! Long-mode control.
//!
//! In long mode every bare run of name characters parses as a long command
//! name; in short mode every character is a command by itself. The name
//! parser itself lives in the core crate (it is part of command dispatch);
//! these commands toggle the flag around an inner parse.

use std::rc::Rc;
use tglng::interp::LongNameParser;
use tglng::prelude::*;

/// `long-mode …` / `short-mode …` — parses the rest of the current context
/// in Command mode with the flag set, restoring it afterwards.
struct LongModeParser {
    enable: bool,
}

impl CommandParser for LongModeParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        *offset += 1;

        let was_long = interp.long_mode;
        interp.long_mode = self.enable;
        let result = interp.parse_all(accum, text, offset, ParseMode::Command);
        interp.long_mode = was_long;
        result
    }
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("long-mode", Rc::new(LongModeParser { enable: true }));
    interp.bind_long("short-mode", Rc::new(LongModeParser { enable: false }));
    interp.bind_long("long-mode-cmd", Rc::new(LongNameParser));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    // Inside short-mode, bare words are no longer long names; only bound
    // short characters work.
    exec_test![
        short_mode_dispatches_single_characters,
        "`bind no-op#n`(`#short-mode#nnn)done",
        "done"
    ];
    exec_failure_test![short_mode_rejects_unbound_characters, "`(`#short-mode#q)"];
    exec_test![
        long_mode_restored_after_section,
        "`(`#short-mode#)`meta",
        "`"
    ];
}
