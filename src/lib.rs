//! optsh - declarative option parsing for shell scripts.
//!
//! A script pipes a small option notation into optsh along with its own
//! arguments. optsh compiles the notation into a typed option table, scans
//! the arguments, validates the values and writes `export` statements to
//! file descriptor 3 for the script to evaluate.

pub mod compiler;
pub mod config;
pub mod constraint;
pub mod defaults;
pub mod driver;
pub mod error;
pub mod help;
pub mod manpage;
pub mod output;
pub mod scanner;
pub mod table;
pub mod tokenizer;

pub use compiler::{CompileError, Compiler};
pub use config::{Dialect, Settings};
pub use constraint::{Constraint, RangeError};
pub use defaults::Environment;
pub use driver::{dispatch, run, Outcome};
pub use error::{Error, Fatal};
pub use help::{generate_help, generate_version};
pub use output::generate_output;
pub use scanner::{ArgScanner, Binder, ClapScanner, ScanError, ScanSink};
pub use table::{Declarations, OptionSpec, OptionTable, OptionType, OptionValue};
