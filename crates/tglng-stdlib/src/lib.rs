//! TglNG standard library of built-in commands.
//!
//! Each module implements one command family and exposes a `register`
//! function that installs its parsers into an interpreter under their long
//! names. [new_interpreter] builds a fully equipped interpreter: every
//! built-in registered, the conventional short bindings for the section and
//! closing characters installed, and long mode enabled.

use tglng::interp::Interpreter;

pub mod arithmetic;
pub mod control;
pub mod default_tokeniser;
pub mod defun;
pub mod ensemble;
pub mod external;
pub mod fs;
pub mod fundamental;
pub mod list;
pub mod logical;
pub mod long_mode;
pub mod magic_case;
pub mod parens;
pub mod regex_ops;
pub mod registers;
pub mod rx;
pub mod strings;
pub mod testutil;
pub mod variable;

/// Registers every built-in command under its long name.
///
/// The core `self-insert` and `long-command` parsers are installed by
/// [Interpreter::new] itself.
pub fn register_builtins(interp: &mut Interpreter) {
    arithmetic::register(interp);
    control::register(interp);
    default_tokeniser::register(interp);
    defun::register(interp);
    ensemble::register(interp);
    external::register(interp);
    fs::register(interp);
    fundamental::register(interp);
    list::register(interp);
    logical::register(interp);
    long_mode::register(interp);
    magic_case::register(interp);
    parens::register(interp);
    regex_ops::register(interp);
    registers::register(interp);
    strings::register(interp);
    variable::register(interp);
}

/// Installs the conventional short-name bindings and enables long mode.
///
/// This is the programmatic equivalent of the startup library shipped with
/// the interpreter: the section-type characters dispatch to
/// `section-command`, the closing characters to the close commands, and
/// bare words parse as long command names.
pub fn install_prelude(interp: &mut Interpreter) {
    for c in [':', '(', '[', '{', '<', '>', '|', '$'] {
        interp
            .bind_short(c, "section-command")
            .expect("section-command is registered");
    }
    interp
        .bind_short(')', "close-paren")
        .expect("close-paren is registered");
    interp
        .bind_short(']', "close-bracket")
        .expect("close-bracket is registered");
    interp
        .bind_short('}', "close-brace")
        .expect("close-brace is registered");
    interp.long_mode = true;
}

/// Creates an interpreter with the whole standard library available.
pub fn new_interpreter() -> Interpreter {
    let mut interp = Interpreter::new();
    register_builtins(&mut interp);
    install_prelude(&mut interp);
    interp
}
