//! Settings for optsh itself.
//!
//! The command line belongs to the calling script, so optsh reads its own
//! settings from environment variables only.

use crate::error::SettingsError;
use crate::table::MAX_OPTIONS;
use clap::builder::FalseyValueParser;
use clap::{Parser, ValueEnum};

/// Descriptor the shell statements are written to.
pub const DEFAULT_FD: u32 = 3;

/// Which option record syntax is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Dialect {
    /// Each record's keyword picks its own syntax.
    #[default]
    Auto,
    /// `OPTION: name short flags type arg range description`
    #[value(name = "option")]
    OptionLine,
    /// `add_opt name description short short-arg long-name long-arg type range`
    #[value(name = "add-opt")]
    AddOpt,
}

impl Dialect {
    /// True when records written in `record` syntax may be read.
    pub fn accepts(self, record: Dialect) -> bool {
        self == Dialect::Auto || self == record
    }

    /// The `OPTSH_DIALECT` value selecting this dialect.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Auto => "auto",
            Dialect::OptionLine => "option",
            Dialect::AddOpt => "add-opt",
        }
    }
}

/// optsh settings.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "optsh",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Settings {
    /// Option record syntax
    #[arg(long, env = "OPTSH_DIALECT", value_enum, default_value_t = Dialect::Auto)]
    pub dialect: Dialect,

    /// File descriptor receiving the shell statements
    #[arg(long, env = "OPTSH_FD", default_value_t = DEFAULT_FD)]
    pub fd: u32,

    /// Maximum number of options, automatic ones included
    #[arg(long, env = "OPTSH_MAX_OPTIONS", default_value_t = MAX_OPTIONS)]
    pub max_options: usize,

    /// Print the option table as JSON instead of shell statements
    #[arg(long, env = "OPTSH_DUMP_TABLE", value_parser = FalseyValueParser::new())]
    pub dump_table: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dialect: Dialect::Auto,
            fd: DEFAULT_FD,
            max_options: MAX_OPTIONS,
            dump_table: false,
        }
    }
}

impl Settings {
    /// Read settings from the `OPTSH_*` environment variables.
    pub fn from_env() -> Result<Self, SettingsError> {
        Ok(Self::try_parse_from(std::iter::empty::<String>())?)
    }
}
