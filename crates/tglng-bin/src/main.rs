use clap::Parser;
use std::io::Read;
use std::process::exit;
use tglng::interp::{Interpreter, ParseMode, RunError};
use tglng::parse_result::ParseResult;

mod exit;
mod startup;

use exit::*;

/// A string-oriented macro/template interpreter.
///
/// The primary input (standard input, or the --script files) is parsed as
/// literal text in which the escape character (backtick by default)
/// introduces commands; the result of evaluating it is written to the
/// output.
#[derive(Parser)]
#[command(name = "tglng", version, disable_help_flag = true)]
struct Opts {
    /// Print help and exit.
    #[arg(short = 'h', short_alias = '?', long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,

    /// Output file; also changes directory to the file's directory.
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Suppress the implicit chdir of --file.
    #[arg(short = 'H', long = "no-chdir")]
    no_chdir: bool,

    /// User configuration file, replacing ~/.tglng; repeatable.
    #[arg(short = 'c', long = "config")]
    configs: Vec<String>,

    /// Suppress the system configuration files.
    #[arg(short = 'C', long = "no-system-config")]
    no_system_config: bool,

    /// Primary input file instead of standard input; repeatable.
    #[arg(short = 'e', long = "script")]
    scripts: Vec<String>,

    /// Preset register X to VALUE, written X=VALUE; repeatable.
    #[arg(short = 'D', long = "register", value_name = "X=VALUE")]
    registers: Vec<String>,

    /// Parse the input but do not execute it.
    #[arg(short = 'd', long = "dry-run")]
    dry_run: bool,

    /// Additionally print the offset of the first parse error to standard
    /// output.
    #[arg(short = 'l', long = "locate-parse-error")]
    locate_parse_error: bool,
}

fn main() {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(error) => {
            let code = match error.kind() {
                clap::error::ErrorKind::DisplayHelp
                | clap::error::ErrorKind::DisplayVersion => 0,
                _ => INCORRECT_USAGE,
            };
            let _ = error.print();
            exit(code);
        }
    };

    let mut interp = tglng_stdlib::new_interpreter();
    interp.locate_parse_error = opts.locate_parse_error;

    for preset in &opts.registers {
        let mut chars = preset.chars();
        match (chars.next(), chars.next()) {
            (Some(register), Some('=')) => {
                interp.registers.insert(register, chars.collect());
            }
            _ => {
                eprintln!("tglng: --register needs an argument of the form X=VALUE");
                exit(INCORRECT_USAGE);
            }
        }
    }

    // Resolve the output target before the implicit chdir moves us.
    let output_target = opts.file.as_ref().map(|file| {
        let path = std::path::Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    });

    startup::start_up(
        &mut interp,
        &startup::StartupOptions {
            operational_file: opts.file.clone(),
            implicit_chdir: !opts.no_chdir,
            user_configs: opts.configs.clone(),
            enable_system_config: !opts.no_system_config,
        },
    );

    let input = read_primary_input(&opts.scripts);

    if opts.dry_run {
        if !parses(&mut interp, &input) {
            exit(PARSE_ERROR_IN_INPUT);
        }
        return;
    }

    let output = match interp.run(&input, ParseMode::Literal) {
        Ok(output) => output,
        Err(RunError::Parse) => exit(PARSE_ERROR_IN_INPUT),
        Err(RunError::Eval(error)) => {
            eprintln!("tglng: error: {error}");
            exit(EXEC_ERROR_IN_INPUT);
        }
    };

    match &output_target {
        Some(file) => {
            if let Err(error) = std::fs::write(file, &output) {
                eprintln!("tglng: error: writing {}: {error}", file.display());
                exit(PLATFORM_ERROR);
            }
        }
        None => print!("{output}"),
    }
}

/// The concatenated --script files, or standard input.
fn read_primary_input(scripts: &[String]) -> String {
    if scripts.is_empty() {
        let mut input = String::new();
        if let Err(error) = std::io::stdin().read_to_string(&mut input) {
            eprintln!("tglng: error: reading standard input: {error}");
            exit(PLATFORM_ERROR);
        }
        return input;
    }
    let mut input = String::new();
    for script in scripts {
        match std::fs::read_to_string(script) {
            Ok(contents) => input.push_str(&contents),
            Err(error) => {
                eprintln!("tglng: error: reading {script}: {error}");
                exit(PLATFORM_ERROR);
            }
        }
    }
    input
}

/// Parses without executing, reporting structural errors the same way a
/// full run would.
fn parses(interp: &mut Interpreter, source: &str) -> bool {
    let text: Vec<char> = source.chars().collect();
    let mut root = None;
    let mut offset = 0;
    match interp.parse_all(&mut root, &text, &mut offset, ParseMode::Literal) {
        ParseResult::Continue | ParseResult::StopEndOfInput => true,
        ParseResult::StopCloseParen => {
            interp.error("unexpected closing parenthesis", &text, offset - 1);
            false
        }
        ParseResult::StopCloseBracket => {
            interp.error("unexpected closing bracket", &text, offset - 1);
            false
        }
        ParseResult::StopCloseBrace => {
            interp.error("unexpected closing brace", &text, offset - 1);
            false
        }
        ParseResult::Error => false,
    }
}
