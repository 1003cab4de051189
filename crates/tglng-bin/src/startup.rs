//! Configuration discovery and interpreter startup.
//!
//! Configuration files are TglNG source executed in Command mode. Three
//! layers run in order: the system files, the per-directory `.tglng` files
//! found walking from the working directory up to the home directory, and
//! the user configuration (`~/.tglng`, or the `--config` files).
//!
//! Per-directory files only run when their directory is listed in
//! `~/.tglng_permitted`; otherwise the user is warned once, and the
//! directory is recorded in `~/.tglng_known` so the warning is not
//! repeated.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::exit;
use tglng::interp::{Interpreter, ParseMode, RunError};

use crate::exit::*;

pub struct StartupOptions {
    pub operational_file: Option<String>,
    pub implicit_chdir: bool,
    pub user_configs: Vec<String>,
    pub enable_system_config: bool,
}

const SYSTEM_CONFIGS: &[&str] = &["/usr/local/etc/tglngrc", "/usr/etc/tglngrc", "/etc/tglngrc"];

pub fn start_up(interp: &mut Interpreter, options: &StartupOptions) {
    chdir_to_operational_file(options);

    if options.enable_system_config {
        for path in SYSTEM_CONFIGS {
            read_config(interp, Path::new(path));
        }
    }

    let mut known = slurp_set(&home_rel(".tglng_known"));
    let permitted = slurp_set(&home_rel(".tglng_permitted"));
    match std::env::current_dir() {
        Ok(cwd) => {
            if read_aux_configs(interp, &mut known, &permitted, &cwd) {
                spit_set(&home_rel(".tglng_known"), &known);
            }
        }
        Err(error) => {
            eprintln!("tglng: error: determining working directory: {error}");
            exit(PLATFORM_ERROR);
        }
    }

    if options.user_configs.is_empty() {
        read_config(interp, &home_rel(".tglng"));
    } else {
        for path in &options.user_configs {
            read_config(interp, Path::new(path));
        }
    }
}

fn chdir_to_operational_file(options: &StartupOptions) {
    if !options.implicit_chdir {
        return;
    }
    let Some(file) = &options.operational_file else {
        return;
    };
    let Some(directory) = Path::new(file).parent() else {
        return;
    };
    if directory.as_os_str().is_empty() {
        return;
    }
    if let Err(error) = std::env::set_current_dir(directory) {
        eprintln!(
            "tglng: error: changing directory to {}: {error}",
            directory.display()
        );
        exit(PLATFORM_ERROR);
    }
}

/// Runs one configuration file, silently skipping absent or unreadable
/// files. A failing configuration terminates the process.
fn read_config(interp: &mut Interpreter, path: &Path) {
    let Ok(source) = std::fs::read_to_string(path) else {
        return;
    };
    match interp.run(&source, ParseMode::Command) {
        Ok(_) => (),
        Err(RunError::Parse) => {
            eprintln!("tglng: error: in library {}", path.display());
            exit(PARSE_ERROR_IN_USER_LIBRARY);
        }
        Err(RunError::Eval(error)) => {
            eprintln!("tglng: error: in library {}: {error}", path.display());
            exit(EXEC_ERROR_IN_USER_LIBRARY);
        }
    }
}

/// Walks from `start` towards the root, running each directory's `.tglng`
/// if permitted. Returns whether the known set gained entries.
fn read_aux_configs(
    interp: &mut Interpreter,
    known: &mut BTreeSet<String>,
    permitted: &BTreeSet<String>,
    start: &Path,
) -> bool {
    let home = std::env::var("HOME").map(PathBuf::from).ok();
    let mut new_known = false;

    let mut directory = Some(start);
    while let Some(current) = directory {
        if current.as_os_str().is_empty()
            || current == Path::new("/")
            || Some(current) == home.as_deref()
        {
            break;
        }
        let config = current.join(".tglng");
        if config.is_file() {
            let name = current.display().to_string();
            if permitted.contains(&name) {
                read_config(interp, &config);
            } else if !known.contains(&name) {
                eprintln!(
                    "tglng: note: {} exists, but is not marked as permitted.",
                    config.display()
                );
                eprintln!(
                    "tglng: add \"{name}\" to ~/.tglng_permitted if you trust this script."
                );
                known.insert(name);
                new_known = true;
            }
        }
        directory = current.parent();
    }

    new_known
}

fn home_rel(name: &str) -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_default();
    Path::new(&home).join(name)
}

fn slurp_set(path: &Path) -> BTreeSet<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.lines().map(str::to_string).collect(),
        Err(_) => BTreeSet::new(),
    }
}

fn spit_set(path: &Path, set: &BTreeSet<String>) {
    let mut contents = String::new();
    for entry in set {
        contents.push_str(entry);
        contents.push('\n');
    }
    let _ = std::fs::write(path, contents);
}
