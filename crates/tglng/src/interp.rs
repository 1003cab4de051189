//! The interpreter: registries, registers, parse driving and evaluation.

use crate::command::{
    push, Command, CommandParser, LongCommandParser, SelfInsert, SelfInsertParser,
};
use crate::error::{self, EvalError, EvalResult};
use crate::parse_result::ParseResult;
use crate::text::is_name_char;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

/// The possible modes of parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// Every character is treated as self-insert.
    Verbatim,
    /// Characters other than the escape character are self-insert; the
    /// escape character introduces exactly one command. The three structural
    /// closing characters `)`, `]`, `}` terminate parsing with their
    /// `StopClose*` results.
    Literal,
    /// Every character is a command character, resolved through the
    /// short-name map or, in long mode, the long-name parser. Escape
    /// characters are skipped.
    Command,
}

/// Why a [Interpreter::run] call failed.
#[derive(Debug)]
pub enum RunError {
    /// The text did not parse; a diagnostic has already been emitted.
    Parse,
    /// The command tree failed to evaluate.
    Eval(EvalError),
}

/// File system operations commands may need to perform.
///
/// Extracted to a trait so they can be mocked out in unit tests.
pub trait FileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String>;
    fn read_bytes(&self, path: &std::path::Path) -> std::io::Result<Vec<u8>>;
    fn write_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()>;
    fn append_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()>;
    /// The names of the entries of a directory.
    fn read_dir(&self, path: &std::path::Path) -> std::io::Result<Vec<String>>;
}

/// Implementation of [FileSystem] that uses the real file system.
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
    fn read_bytes(&self, path: &std::path::Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
    fn write_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, contents)
    }
    fn append_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(contents)
    }
    fn read_dir(&self, path: &std::path::Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }
}

/// In-memory file system for unit tests.
#[derive(Default)]
pub struct InMemoryFileSystem {
    files: RefCell<HashMap<std::path::PathBuf, Vec<u8>>>,
}

impl InMemoryFileSystem {
    pub fn new() -> InMemoryFileSystem {
        Default::default()
    }

    pub fn add<P: Into<std::path::PathBuf>, C: Into<Vec<u8>>>(&self, path: P, contents: C) {
        self.files.borrow_mut().insert(path.into(), contents.into());
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(std::path::Path::new(path)).cloned()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &std::path::Path) -> std::io::Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidData, "not utf-8"))
    }
    fn read_bytes(&self, path: &std::path::Path) -> std::io::Result<Vec<u8>> {
        match self.files.borrow().get(path) {
            Some(contents) => Ok(contents.clone()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "not found",
            )),
        }
    }
    fn write_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
    fn append_bytes(&self, path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
        self.files
            .borrow_mut()
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(contents);
        Ok(())
    }
    fn read_dir(&self, path: &std::path::Path) -> std::io::Result<Vec<String>> {
        // "." and "" both mean the root of the mock tree.
        let target = if path == std::path::Path::new(".") {
            std::path::Path::new("")
        } else {
            path
        };
        let mut names = Vec::new();
        for file in self.files.borrow().keys() {
            if file.parent() == Some(target) {
                if let Some(name) = file.file_name() {
                    names.push(name.to_string_lossy().into_owned());
                }
            }
        }
        Ok(names)
    }
}

/// Runs a subprocess, piping `input` to its standard input and capturing its
/// standard output. Standard error is inherited from the parent.
pub trait ProcessRunner {
    fn run(&self, argv: &[String], input: &str) -> std::io::Result<(String, i32)>;
}

/// Implementation of [ProcessRunner] that spawns real subprocesses.
pub struct RealProcessRunner;

impl ProcessRunner for RealProcessRunner {
    fn run(&self, argv: &[String], input: &str) -> std::io::Result<(String, i32)> {
        use std::process::{Command, Stdio};
        let (program, args) = argv.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv")
        })?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        child
            .stdin
            .take()
            .expect("stdin was piped")
            .write_all(input.as_bytes())?;
        let output = child.wait_with_output()?;
        let status = output.status.code().unwrap_or(-1);
        Ok((String::from_utf8_lossy(&output.stdout).into_owned(), status))
    }
}

/// A [ProcessRunner] that records invocations and replies with a canned
/// response, for unit tests.
pub struct MockProcessRunner {
    pub calls: RefCell<Vec<(Vec<String>, String)>>,
    pub output: String,
    pub status: i32,
}

impl MockProcessRunner {
    pub fn new<T: Into<String>>(output: T, status: i32) -> MockProcessRunner {
        MockProcessRunner {
            calls: RefCell::new(Vec::new()),
            output: output.into(),
            status,
        }
    }
}

impl ProcessRunner for MockProcessRunner {
    fn run(&self, argv: &[String], input: &str) -> std::io::Result<(String, i32)> {
        self.calls
            .borrow_mut()
            .push((argv.to_vec(), input.to_string()));
        Ok((self.output.clone(), self.status))
    }
}

/// Encapsulates the data associated with one TglNG interpreter as well as
/// its higher-level behaviours.
pub struct Interpreter {
    /// Long command names. These parsers are shared; binding the same name
    /// in two interpreters clones the handle, not the parser.
    commands_long: HashMap<String, Rc<dyn CommandParser>>,
    /// Short (single-character) command names. Every entry also exists in
    /// `commands_long`, here or in the interpreter this one was cloned from.
    commands_short: HashMap<char, Rc<dyn CommandParser>>,
    /// Single-character registers. An absent entry is an unset register.
    pub registers: HashMap<char, String>,
    /// The current escape character.
    pub escape: char,
    /// Whether "long mode" is in use: bare alphanumeric runs parse as long
    /// command names instead of single-character commands.
    pub long_mode: bool,
    /// Print the offset of the first parse error to standard output, once.
    pub locate_parse_error: bool,
    /// The starting index of the most recently parsed command; see
    /// [Interpreter::backup].
    backup_dest: usize,
    externals: HashMap<u32, Rc<dyn Any>>,
    next_external: u32,
    diagnostics: Rc<RefCell<dyn Write>>,
    pub file_system: Rc<dyn FileSystem>,
    pub process_runner: Rc<dyn ProcessRunner>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with only the core machinery bound: the
    /// `self-insert` and `long-command` parsers, and the single short name
    /// `#` referring to the latter. Long mode is off and the escape
    /// character is a backtick.
    pub fn new() -> Interpreter {
        let mut interp = Interpreter {
            commands_long: HashMap::new(),
            commands_short: HashMap::new(),
            registers: HashMap::new(),
            escape: '`',
            long_mode: false,
            locate_parse_error: false,
            backup_dest: 0,
            externals: HashMap::new(),
            next_external: 0,
            diagnostics: Rc::new(RefCell::new(std::io::stderr())),
            file_system: Rc::new(RealFileSystem),
            process_runner: Rc::new(RealProcessRunner),
        };
        interp.bind_long("self-insert", Rc::new(SelfInsertParser));
        interp.bind_long("long-command", Rc::new(LongCommandParser));
        interp
            .bind_short('#', "long-command")
            .expect("long-command was just bound");
        interp
    }

    /// Creates a subordinate copy: parser handles are shared, registers are
    /// copied by value, external ids survive, file system and process
    /// runner handles are shared.
    pub fn subordinate(&self) -> Interpreter {
        Interpreter {
            commands_long: self.commands_long.clone(),
            commands_short: self.commands_short.clone(),
            registers: self.registers.clone(),
            escape: self.escape,
            long_mode: self.long_mode,
            locate_parse_error: false,
            backup_dest: 0,
            externals: self.externals.clone(),
            next_external: self.next_external,
            diagnostics: Rc::clone(&self.diagnostics),
            file_system: Rc::clone(&self.file_system),
            process_runner: Rc::clone(&self.process_runner),
        }
    }

    /// Redirects diagnostics (used by tests to capture them).
    pub fn set_diagnostics(&mut self, sink: Rc<RefCell<dyn Write>>) {
        self.diagnostics = sink;
    }

    // Registry operations.

    /// Binds a parser under a long name, replacing any previous binding.
    pub fn bind_long<T: Into<String>>(&mut self, name: T, parser: Rc<dyn CommandParser>) {
        self.commands_long.insert(name.into(), parser);
    }

    /// Binds a parser under a long name, stashing the previous binding for
    /// [Interpreter::restore_long]. Used for scoped (`let`) bindings.
    pub fn replace_long(
        &mut self,
        name: &str,
        parser: Rc<dyn CommandParser>,
    ) -> Option<Rc<dyn CommandParser>> {
        self.commands_long.insert(name.to_string(), parser)
    }

    /// Restores a binding stashed by [Interpreter::replace_long].
    pub fn restore_long(&mut self, name: &str, old: Option<Rc<dyn CommandParser>>) {
        match old {
            Some(parser) => {
                self.commands_long.insert(name.to_string(), parser);
            }
            None => {
                self.commands_long.remove(name);
            }
        }
    }

    pub fn long_command(&self, name: &str) -> Option<Rc<dyn CommandParser>> {
        self.commands_long.get(name).cloned()
    }

    pub fn contains_long(&self, name: &str) -> bool {
        self.commands_long.contains_key(name)
    }

    pub fn short_command(&self, c: char) -> Option<Rc<dyn CommandParser>> {
        self.commands_short.get(&c).cloned()
    }

    /// Binds a character to an existing, non-temporary long-name parser.
    /// Rebinding overwrites silently.
    pub fn bind_short(&mut self, c: char, long_name: &str) -> Result<(), EvalError> {
        let parser = self
            .long_command(long_name)
            .ok_or_else(|| EvalError::new(format!("unknown command: {long_name}")))?;
        if parser.is_temporary() {
            return Err(EvalError::new(format!(
                "cannot bind a short name to a scoped command: {long_name}"
            )));
        }
        self.commands_short.insert(c, parser);
        Ok(())
    }

    // Externals.

    /// Binds an object to this interpreter, returning an integer id by which
    /// it can be retrieved. Ids are unique within the interpreter and never
    /// zero.
    pub fn bind_external<T: 'static>(&mut self, value: T) -> u32 {
        loop {
            self.next_external = self.next_external.wrapping_add(1);
            if self.next_external != 0 && !self.externals.contains_key(&self.next_external) {
                break;
            }
        }
        self.externals.insert(self.next_external, Rc::new(value));
        self.next_external
    }

    /// Retrieves the external with the given id, if it exists and has the
    /// requested type.
    pub fn external<T: 'static>(&self, id: u32) -> Option<Rc<T>> {
        self.externals.get(&id)?.clone().downcast::<T>().ok()
    }

    // Parsing.

    /// Parses one command from the input text, advancing `offset` past it.
    ///
    /// `accum` holds the left-hand chain and is either unmodified or
    /// replaced by the new chain head. Returns the encountered parser's
    /// result, or [ParseResult::Error] if no command could be found.
    pub fn parse(
        &mut self,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
        mode: ParseMode,
    ) -> ParseResult {
        if *offset >= text.len() {
            return ParseResult::StopEndOfInput;
        }
        self.backup_dest = *offset;

        match mode {
            ParseMode::Verbatim => {
                push(accum, SelfInsert::from_char(text[*offset]));
                *offset += 1;
                ParseResult::Continue
            }
            ParseMode::Literal => match text[*offset] {
                c if c == self.escape => {
                    *offset += 1;
                    self.parse_command(accum, text, offset, true)
                }
                ')' => {
                    *offset += 1;
                    ParseResult::StopCloseParen
                }
                ']' => {
                    *offset += 1;
                    ParseResult::StopCloseBracket
                }
                '}' => {
                    *offset += 1;
                    ParseResult::StopCloseBrace
                }
                c => {
                    push(accum, SelfInsert::from_char(c));
                    *offset += 1;
                    ParseResult::Continue
                }
            },
            ParseMode::Command => self.parse_command(accum, text, offset, false),
        }
    }

    /// Command-character dispatch, shared by Command mode and the
    /// escape-introduced command of Literal mode.
    fn parse_command(
        &mut self,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
        after_escape: bool,
    ) -> ParseResult {
        loop {
            while *offset < text.len() && text[*offset].is_whitespace() {
                *offset += 1;
            }
            if *offset >= text.len() {
                if after_escape {
                    self.error("expected command after escape character", text, *offset);
                    return ParseResult::Error;
                }
                return ParseResult::StopEndOfInput;
            }
            if text[*offset] == self.escape {
                if after_escape {
                    // A doubled escape in Literal mode inserts the escape
                    // character itself.
                    push(accum, SelfInsert::from_char(self.escape));
                    *offset += 1;
                    return ParseResult::Continue;
                }
                // In Command mode an escape character is a no-op.
                *offset += 1;
                continue;
            }
            break;
        }

        self.backup_dest = *offset;
        let c = text[*offset];
        // Names cannot start with '-' so that it stays available as the
        // subtraction sign.
        let parser: Rc<dyn CommandParser> = if self.long_mode && is_name_char(c) && c != '-' {
            Rc::new(LongNameParser)
        } else {
            match self.short_command(c) {
                Some(parser) => parser,
                None => {
                    self.error(&format!("no such command: {c}"), text, *offset);
                    return ParseResult::Error;
                }
            }
        };
        parser.parse(self, accum, text, offset)
    }

    /// Parses commands until the text is consumed or a parser signals a
    /// stop; returns that signal (or [ParseResult::StopEndOfInput]).
    pub fn parse_all(
        &mut self,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
        mode: ParseMode,
    ) -> ParseResult {
        loop {
            let result = self.parse(accum, text, offset, mode);
            if result != ParseResult::Continue {
                return result;
            }
        }
    }

    /// "Backs up" the given offset to the index of the most recently parsed
    /// command character.
    ///
    /// Used when a closing character is encountered in a context which
    /// cannot handle it but where it is not an error, such as in the `>`
    /// section form: the caller backs up so its own caller reclaims the
    /// character.
    pub fn backup(&self, offset: &mut usize) {
        *offset = self.backup_dest;
    }

    // Evaluation.

    /// Evaluates a command tree: walks the left chain iteratively, evaluates
    /// each node in insertion order and concatenates the results.
    pub fn exec(&mut self, root: &Command) -> EvalResult {
        let mut chain = Vec::new();
        let mut current = Some(root);
        while let Some(command) = current {
            chain.push(command);
            current = command.left();
        }
        let mut out = String::new();
        for command in chain.into_iter().rev() {
            out.push_str(&command.evaluate_node(self)?);
        }
        Ok(out)
    }

    /// Evaluates an optional command tree; absent trees evaluate to the
    /// empty string.
    pub fn exec_opt(&mut self, root: &Option<Box<Command>>) -> EvalResult {
        match root {
            Some(command) => self.exec(command),
            None => Ok(String::new()),
        }
    }

    /// Parses and evaluates a whole text in the given mode.
    pub fn run(&mut self, source: &str, mode: ParseMode) -> Result<String, RunError> {
        let text: Vec<char> = source.chars().collect();
        let mut root = None;
        let mut offset = 0;
        match self.parse_all(&mut root, &text, &mut offset, mode) {
            ParseResult::Continue | ParseResult::StopEndOfInput => (),
            ParseResult::StopCloseParen => {
                self.error("unexpected closing parenthesis", &text, offset - 1);
                return Err(RunError::Parse);
            }
            ParseResult::StopCloseBracket => {
                self.error("unexpected closing bracket", &text, offset - 1);
                return Err(RunError::Parse);
            }
            ParseResult::StopCloseBrace => {
                self.error("unexpected closing brace", &text, offset - 1);
                return Err(RunError::Parse);
            }
            ParseResult::Error => return Err(RunError::Parse),
        }
        self.exec_opt(&root).map_err(RunError::Eval)
    }

    /// Prints a diagnostic showing the error message and the context around
    /// the position where the error occurred.
    pub fn error(&mut self, why: &str, text: &[char], offset: usize) {
        let rendered = error::render_diagnostic(why, text, offset);
        let _ = writeln!(self.diagnostics.borrow_mut(), "{rendered}");
        if self.locate_parse_error {
            // Only the first error's position is reported.
            self.locate_parse_error = false;
            println!("{offset}");
        }
    }
}

/// Parser used in long mode for bare names: reads a maximal run of name
/// characters and delegates to the named parser with the offset on the last
/// name character. A single-character name falls back to the short map; a
/// name bound nowhere parses as a self-insert of itself.
pub struct LongNameParser;

impl CommandParser for LongNameParser {
    fn parse(
        &self,
        interp: &mut Interpreter,
        accum: &mut Option<Box<Command>>,
        text: &[char],
        offset: &mut usize,
    ) -> ParseResult {
        let start = *offset;
        if *offset >= text.len() || !is_name_char(text[*offset]) {
            interp.error("invalid long-mode command", text, *offset);
            return ParseResult::Error;
        }
        while *offset < text.len() && is_name_char(text[*offset]) {
            *offset += 1;
        }
        let name: String = text[start..*offset].iter().collect();

        if let Some(parser) = interp.long_command(&name) {
            // The last name character plays the role of the command
            // character for the delegate.
            *offset -= 1;
            return parser.parse(interp, accum, text, offset);
        }
        if name.chars().count() == 1 {
            if let Some(parser) = interp.short_command(text[start]) {
                *offset -= 1;
                return parser.parse(interp, accum, text, offset);
            }
        }
        // Unknown bare words are literal text.
        push(accum, SelfInsert::new(name));
        ParseResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(interp: &mut Interpreter) {
        interp.set_diagnostics(Rc::new(RefCell::new(std::io::sink())));
    }

    #[test]
    fn literal_text_round_trips() {
        let mut interp = Interpreter::new();
        let out = interp.run("Hello, world", ParseMode::Literal).unwrap();
        assert_eq!(out, "Hello, world");
    }

    #[test]
    fn verbatim_inserts_everything() {
        let mut interp = Interpreter::new();
        let out = interp.run("`)]}", ParseMode::Verbatim).unwrap();
        assert_eq!(out, "`)]}");
    }

    #[test]
    fn doubled_escape_inserts_escape() {
        let mut interp = Interpreter::new();
        let out = interp.run("a``b", ParseMode::Literal).unwrap();
        assert_eq!(out, "a`b");
    }

    #[test]
    fn trailing_escape_is_an_error() {
        let mut interp = Interpreter::new();
        quiet(&mut interp);
        assert!(matches!(
            interp.run("abc`", ParseMode::Literal),
            Err(RunError::Parse)
        ));
    }

    #[test]
    fn unexpected_closer_at_top_level() {
        let mut interp = Interpreter::new();
        quiet(&mut interp);
        assert!(matches!(
            interp.run("a)b", ParseMode::Literal),
            Err(RunError::Parse)
        ));
    }

    #[test]
    fn unknown_command_character() {
        let mut interp = Interpreter::new();
        quiet(&mut interp);
        assert!(matches!(
            interp.run("`q", ParseMode::Literal),
            Err(RunError::Parse)
        ));
    }

    #[test]
    fn long_command_reference_reads_register() {
        let mut interp = Interpreter::new();
        interp.registers.insert('x', "42".to_string());
        let out = interp.run("`#x#!", ParseMode::Literal).unwrap();
        assert_eq!(out, "42!");
    }

    #[test]
    fn unknown_multi_character_reference_is_an_error() {
        let mut interp = Interpreter::new();
        quiet(&mut interp);
        assert!(matches!(
            interp.run("`#nope#", ParseMode::Literal),
            Err(RunError::Parse)
        ));
    }

    #[test]
    fn externals_are_typed_and_ids_never_zero() {
        let mut interp = Interpreter::new();
        let id = interp.bind_external(7usize);
        assert_ne!(id, 0);
        assert_eq!(*interp.external::<usize>(id).unwrap(), 7);
        assert!(interp.external::<String>(id).is_none());
        assert!(interp.external::<usize>(id + 1).is_none());
    }

    #[test]
    fn subordinate_copies_registers_and_shares_parsers() {
        let mut parent = Interpreter::new();
        parent.registers.insert('a', "1".to_string());
        let mut child = parent.subordinate();
        child.registers.insert('a', "2".to_string());
        assert_eq!(parent.registers[&'a'], "1");
        assert!(child.long_command("long-command").is_some());
    }

    #[test]
    fn bind_short_requires_existing_long_name() {
        let mut interp = Interpreter::new();
        assert!(interp.bind_short('!', "self-insert").is_ok());
        assert!(interp.bind_short('!', "missing").is_err());
    }
}
