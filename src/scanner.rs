//! Scanning the calling script's arguments against the option table.
//!
//! The scanner is a collaborator behind [`ArgScanner`]: options are
//! registered with it, then it walks argv and reports every recognized
//! option and every leftover positional argument to a [`ScanSink`], left to
//! right. [`ClapScanner`] is the production scanner; [`Binder`] is the sink
//! that stores the values in the table.

use crate::help;
use crate::table::{Declarations, OptionKey, OptionSpec, OptionTable, OptionType, OptionValue};
use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::{OsStr, OsString};
use thiserror::Error;
use tracing::debug;

/// Clap id of the positional catch-all. Option names start with a letter,
/// so it can't collide with one.
const REMAINING_ID: &str = "_remaining";

/// Errors reported while scanning argv.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// The scanner refused the command line (unknown option, missing value).
    #[error("{0}")]
    Rejected(String),

    #[error("option {option}: invalid {expected} value '{value}'")]
    InvalidValue {
        option: String,
        value: String,
        expected: &'static str,
    },

    #[error("no option registered for key {0:?}")]
    UnknownKey(OptionKey),
}

/// Receives what the scanner finds, in argv order.
pub trait ScanSink {
    /// An option was given; `value` is its argument for value-taking options.
    fn on_option(&mut self, key: OptionKey, value: Option<&OsStr>) -> Result<(), ScanError>;

    /// An argument that is not an option or an option's value.
    fn on_positional(&mut self, arg: &OsStr);
}

/// An argv scanner the option table is handed to.
pub trait ArgScanner {
    /// Make an option known to the scanner. Returns the key it will be
    /// reported under.
    fn register(&mut self, spec: &OptionSpec) -> OptionKey;

    /// Scan `args` (without the program name) and report to `sink`.
    fn scan(&mut self, args: &[OsString], sink: &mut dyn ScanSink) -> Result<(), ScanError>;
}

#[derive(Debug, Clone)]
struct Registered {
    id: String,
    key: OptionKey,
    takes_value: bool,
}

/// What clap found at one argv position.
#[derive(Debug)]
enum Event {
    Option(OptionKey, Option<OsString>),
    Positional(OsString),
}

/// Scanner backed by a Clap command built from the declarations.
#[derive(Debug, Clone)]
pub struct ClapScanner {
    command: Command,
    registered: Vec<Registered>,
}

impl ClapScanner {
    pub fn new(decl: &Declarations) -> Self {
        let remaining = Arg::new(REMAINING_ID)
            .index(1)
            .action(ArgAction::Append)
            .num_args(1..)
            .value_parser(value_parser!(OsString))
            .hide(true);

        ClapScanner {
            command: help::base_command(decl).arg(remaining),
            registered: Vec::new(),
        }
    }

    fn events(&self, matches: &ArgMatches) -> Vec<(usize, Event)> {
        let mut events = Vec::new();

        for reg in &self.registered {
            if matches.value_source(&reg.id) != Some(ValueSource::CommandLine) {
                continue;
            }
            let index = matches.index_of(&reg.id).unwrap_or_default();
            let value = if reg.takes_value {
                matches.get_one::<OsString>(&reg.id).cloned()
            } else {
                None
            };
            events.push((index, Event::Option(reg.key, value)));
        }

        if let (Some(indices), Some(values)) = (
            matches.indices_of(REMAINING_ID),
            matches.get_many::<OsString>(REMAINING_ID),
        ) {
            for (index, value) in indices.zip(values) {
                events.push((index, Event::Positional(value.clone())));
            }
        }

        events.sort_by_key(|(index, _)| *index);
        events
    }
}

impl ArgScanner for ClapScanner {
    fn register(&mut self, spec: &OptionSpec) -> OptionKey {
        self.command = self.command.clone().arg(help::build_arg(spec));
        self.registered.push(Registered {
            id: spec.name.clone(),
            key: spec.key,
            takes_value: spec.option_type.takes_value(),
        });
        spec.key
    }

    fn scan(&mut self, args: &[OsString], sink: &mut dyn ScanSink) -> Result<(), ScanError> {
        let argv = std::iter::once(OsString::from(self.command.get_name())).chain(args.iter().cloned());
        let matches = self
            .command
            .try_get_matches_from_mut(argv)
            .map_err(|e| ScanError::Rejected(first_line(&e.render().to_string())))?;

        for (index, event) in self.events(&matches) {
            debug!(index, ?event, "scanned");
            match event {
                Event::Option(key, value) => sink.on_option(key, value.as_deref())?,
                Event::Positional(arg) => sink.on_positional(&arg),
            }
        }
        Ok(())
    }
}

/// The first line of a rendered Clap error, without the `error: ` prefix.
fn first_line(rendered: &str) -> String {
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

/// Stores scanned values in the option table.
///
/// Command line values are parsed strictly; the last occurrence of an
/// option wins.
#[derive(Debug)]
pub struct Binder<'a> {
    table: &'a mut OptionTable,
    seen: Vec<String>,
    remaining: Vec<OsString>,
}

impl<'a> Binder<'a> {
    pub fn new(table: &'a mut OptionTable) -> Self {
        Binder {
            table,
            seen: Vec::new(),
            remaining: Vec::new(),
        }
    }

    /// True when `name` was given on the command line.
    pub fn saw(&self, name: &str) -> bool {
        self.seen.iter().any(|s| s == name)
    }

    /// Names of the options given on the command line, in argv order.
    pub fn seen(&self) -> &[String] {
        &self.seen
    }

    /// Consume the binder, returning the positional arguments left over.
    pub fn into_remaining(self) -> Vec<OsString> {
        self.remaining
    }
}

impl ScanSink for Binder<'_> {
    fn on_option(&mut self, key: OptionKey, value: Option<&OsStr>) -> Result<(), ScanError> {
        let spec = self
            .table
            .by_key_mut(key)
            .ok_or(ScanError::UnknownKey(key))?;

        let text = value.unwrap_or_default();
        let invalid = || ScanError::InvalidValue {
            option: spec.name.clone(),
            value: text.to_string_lossy().into_owned(),
            expected: spec.option_type.describe(),
        };

        let parsed = match spec.option_type {
            OptionType::Boolean => OptionValue::Bool(!spec.flags.reversed),
            OptionType::Integer => OptionValue::Int(
                text.to_str()
                    .and_then(|n| n.trim().parse().ok())
                    .ok_or_else(invalid)?,
            ),
            OptionType::Double => OptionValue::Double(
                text.to_str()
                    .and_then(|x| x.trim().parse().ok())
                    .ok_or_else(invalid)?,
            ),
            OptionType::String(_) | OptionType::StringArray => {
                OptionValue::Text(text.to_os_string())
            }
        };

        spec.value = parsed;
        if !self.seen.contains(&spec.name) {
            self.seen.push(spec.name.clone());
        }
        Ok(())
    }

    fn on_positional(&mut self, arg: &OsStr) {
        self.remaining.push(arg.to_os_string());
    }
}
