//! One optsh run: compile, scan, then decide what to print.

use crate::compiler::Compiler;
use crate::config::Settings;
use crate::constraint;
use crate::defaults::Environment;
use crate::error::Fatal;
use crate::help;
use crate::manpage;
use crate::output;
use crate::scanner::{ArgScanner, Binder, ClapScanner};
use crate::table::Declarations;
use std::ffi::OsString;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

/// What a successful run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Help text for standard output.
    Help(String),
    /// Version line for standard output.
    Version(String),
    /// The option table as JSON, for standard output.
    Table(String),
    /// The man page, for standard output.
    ManPage(String),
    /// Shell statements for the distinguished channel. Bytes, since
    /// arguments needn't be UTF-8.
    Exports(Vec<u8>),
}

/// Program name used until the declarations name one: the basename of
/// `argv[0]`.
pub fn default_program(argv: &[OsString]) -> String {
    argv.first()
        .map(|arg0| {
            Path::new(arg0)
                .file_name()
                .unwrap_or(arg0.as_os_str())
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "optsh".to_string())
}

/// Read declarations from `input` and process `argv` (program name first)
/// with the Clap scanner.
pub fn run<R: BufRead>(
    input: R,
    argv: &[OsString],
    env: &Environment,
    settings: &Settings,
) -> Result<Outcome, Fatal> {
    let mut compiler = Compiler::new(default_program(argv))
        .with_dialect(settings.dialect)
        .with_max_options(settings.max_options);
    let decl = compiler
        .compile(input, env)
        .map_err(|e| Fatal::new(compiler.program(), e))?;

    let args: Vec<OsString> = if decl.forced_help {
        vec![OsString::from("--help")]
    } else {
        argv.iter().skip(1).cloned().collect()
    };

    let mut scanner = ClapScanner::new(&decl);
    dispatch(decl, &args, &mut scanner, settings.dump_table)
}

/// Scan `args` into the table and produce the outcome.
///
/// Help wins over version, version over the table dump, the dump over the
/// man page. Only when none was asked for are the values validated and
/// the exports generated.
pub fn dispatch(
    mut decl: Declarations,
    args: &[OsString],
    scanner: &mut dyn ArgScanner,
    dump_table: bool,
) -> Result<Outcome, Fatal> {
    for spec in decl.options.iter() {
        scanner.register(spec);
    }

    let mut binder = Binder::new(&mut decl.options);
    if let Err(err) = scanner.scan(args, &mut binder) {
        return Err(Fatal::new(decl.program, err));
    }
    debug!(seen = ?binder.seen(), "scan complete");

    let wants_help = binder.saw("help");
    let wants_version = binder.saw("version");
    let wants_man_page = binder.saw("print-man-page");
    let remaining = binder.into_remaining();

    if wants_help {
        return Ok(Outcome::Help(help::generate_help(&decl)));
    }
    if wants_version {
        return Ok(Outcome::Version(help::generate_version(&decl)));
    }
    if dump_table {
        let json = serde_json::to_string_pretty(&decl)
            .map_err(|e| Fatal::new(decl.program.clone(), e))?;
        return Ok(Outcome::Table(json + "\n"));
    }
    if wants_man_page {
        return Ok(Outcome::ManPage(manpage::render(&decl)));
    }

    for spec in decl.options.iter() {
        constraint::validate(spec).map_err(|e| Fatal::new(decl.program.clone(), e))?;
    }

    Ok(Outcome::Exports(output::generate_output(
        &decl.options,
        &remaining,
    )))
}
