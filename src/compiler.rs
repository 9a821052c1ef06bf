//! Compiles option declarations read from standard input.
//!
//! The input is line oriented. Outside the usage block, blank lines and
//! `#` comments are skipped and every other line is a record:
//!
//! ```text
//! PROG: demo
//! VERSION: 1.2
//! OPTION: bars b - integer count 2-6 number of bars
//! add_opt name "description" s short-arg long-name long-arg type range
//! USAGE:
//! [--] [file]
//! Free text up to the end of input.
//! ```

use crate::config::Dialect;
use crate::constraint::{self, RangeField, RangeSyntaxError};
use crate::defaults::{self, Environment};
use crate::table::{
    Declarations, OptionFlags, OptionKey, OptionSpec, OptionTable, OptionType, UsageText,
    ANONYMOUS_KEY_BASE, MAX_OPTIONS,
};
use crate::tokenizer::Tokens;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::debug;

/// Usage shown when nothing usable was declared.
pub const FALLBACK_USAGE: &str = "\
[--] [args]

Declarative option parsing for shell scripts.

optsh reads option declarations on standard input, parses the script's own
arguments given on its command line, and writes shell statements to file
descriptor 3 for the script to evaluate:

    ARGS='
    PROG: my_prog
    #       name      short flags type    arg     range    description
    OPTION: bool      b     -     boolean -       -        foo the bar
    OPTION: bars      n     -     integer count   2-6      number of bars
    OPTION: colour    c     -     string  name    \"red green\" colour to use
    USAGE:
    [--] [file...]
    Short description of the script.
    Longer description of the script.'
    exec 4>&1
    RES=$(echo \"$ARGS\" | optsh \"$@\" 3>&1 1>&4) || exit 1
    [ \"$RES\" ] || exit 0
    eval \"$RES\"

Afterwards every option is available as an upper-case shell variable and
\"$@\" holds the remaining arguments.

OPTION fields:
  name   long option name, also the variable name
  short  single character short option, '-' for none
  flags  any of H (hidden) and R (reversed boolean), '-' for none
  type   boolean, integer, double, string, url, path or array
         (the first letter is enough)
  arg    name of the value shown in --help, '-' for none
  range  numeric: min-max; string: a regex, or a quoted list of
         alternatives; '-' for none
  description  the rest of the line; leave empty to hide the option

The older record form is also understood:
    add_opt name \"description\" short short-arg long-name long-arg type range

USAGE may also be exported in the environment; the block on standard input
takes precedence. The options help, version, verbose and the hidden
print-man-page are always added; --print-man-page writes a skeleton man(1)
page built from the declarations.";

/// Errors found while compiling declarations.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read declarations: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: unknown record '{keyword}'")]
    UnknownRecord { line: usize, keyword: String },

    #[error("line {line}: '{keyword}' records are not accepted when OPTSH_DIALECT={dialect}")]
    InactiveDialect {
        line: usize,
        keyword: String,
        dialect: &'static str,
    },

    #[error("line {line}: option record has no name")]
    MissingName { line: usize },

    #[error("{0}: illegal character")]
    IllegalName(String),

    #[error("{option}: invalid short option '{key}': must be a single printable character")]
    InvalidShortKey { option: String, key: String },

    #[error("illegal flag character in '{0}'")]
    IllegalFlag(String),

    #[error("{0}: only boolean options can be reversed")]
    ReversedNonBoolean(String),

    #[error("{option}: {source}")]
    BadRange {
        option: String,
        source: RangeSyntaxError,
    },

    #[error("duplicate option name '{0}'")]
    DuplicateOption(String),

    #[error("{option}: short option '-{key}' is already used by '{other}'")]
    DuplicateShortKey {
        option: String,
        key: char,
        other: String,
    },

    #[error("too many options (limit {0})")]
    TooManyOptions(usize),
}

/// Dialect-independent fields of one option record.
#[derive(Debug, Default)]
struct RawOption {
    name: String,
    short: Option<String>,
    flags: Option<String>,
    type_word: Option<String>,
    arg: Option<String>,
    range: RangeField,
    description: String,
}

/// Reads declarations and builds the option table.
#[derive(Debug)]
pub struct Compiler {
    dialect: Dialect,
    max_options: usize,
    program: String,
    version: Option<String>,
    usage: Option<String>,
    table: OptionTable,
    declared: usize,
    next_anonymous: u32,
}

impl Compiler {
    /// `program` is the name used until a `PROG:` record says otherwise.
    pub fn new(program: impl Into<String>) -> Self {
        Compiler {
            dialect: Dialect::Auto,
            max_options: MAX_OPTIONS,
            program: program.into(),
            version: None,
            usage: None,
            table: OptionTable::new(),
            declared: 0,
            next_anonymous: ANONYMOUS_KEY_BASE,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_max_options(mut self, max_options: usize) -> Self {
        self.max_options = max_options;
        self
    }

    /// The program name as known so far, for error messages.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Read all declarations from `input` and build the option table.
    ///
    /// Defaults are seeded from `env`, which also supplies `USAGE` when the
    /// input has no usage block.
    pub fn compile<R: BufRead>(
        &mut self,
        input: R,
        env: &Environment,
    ) -> Result<Declarations, CompileError> {
        let mut lines = input.lines().enumerate();

        while let Some((index, line)) = lines.next() {
            let line = line?;
            let line_no = index + 1;
            let record = line.trim();
            if record.is_empty() || record.starts_with('#') {
                continue;
            }

            let (keyword, rest) = record
                .split_once([' ', '\t'])
                .map(|(k, r)| (k, r.trim()))
                .unwrap_or((record, ""));

            match keyword {
                "PROG:" | "PROG" => {
                    if !rest.is_empty() {
                        self.program = rest.to_string();
                    }
                }
                "VERSION:" | "VERSION" => self.version = Some(rest.to_string()),
                "OPTION:" | "OPTION" => {
                    self.check_dialect(Dialect::OptionLine, line_no, keyword)?;
                    let raw = parse_option_record(rest, line_no)?;
                    self.declare(raw, env)?;
                }
                "add_opt" => {
                    self.check_dialect(Dialect::AddOpt, line_no, keyword)?;
                    let raw = parse_add_opt_record(rest, line_no)?;
                    self.declare(raw, env)?;
                }
                "USAGE:" | "USAGE" => {
                    let mut usage = String::new();
                    if !rest.is_empty() {
                        usage.push_str(rest);
                        usage.push('\n');
                    }
                    for (_, line) in lines.by_ref() {
                        usage.push_str(&line?);
                        usage.push('\n');
                    }
                    self.usage = Some(usage);
                }
                _ => {
                    return Err(CompileError::UnknownRecord {
                        line: line_no,
                        keyword: keyword.to_string(),
                    })
                }
            }
        }

        self.finish(env)
    }

    /// Compile declarations held in a string.
    pub fn compile_str(
        &mut self,
        text: &str,
        env: &Environment,
    ) -> Result<Declarations, CompileError> {
        self.compile(text.as_bytes(), env)
    }

    fn check_dialect(&self, record: Dialect, line: usize, keyword: &str) -> Result<(), CompileError> {
        if self.dialect.accepts(record) {
            Ok(())
        } else {
            Err(CompileError::InactiveDialect {
                line,
                keyword: keyword.to_string(),
                dialect: self.dialect.name(),
            })
        }
    }

    fn declare(&mut self, raw: RawOption, env: &Environment) -> Result<(), CompileError> {
        let spec = self.build_spec(raw)?;
        self.register(spec, env)?;
        self.declared += 1;
        Ok(())
    }

    fn build_spec(&mut self, raw: RawOption) -> Result<OptionSpec, CompileError> {
        let name = raw.name.to_lowercase();
        if !is_valid_name(&name) {
            return Err(CompileError::IllegalName(raw.name));
        }

        let key = match placeholder(raw.short) {
            None => self.anonymous_key(),
            Some(short) => {
                let mut chars = short.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_graphic() && c != '-' => OptionKey::Short(c),
                    _ => {
                        return Err(CompileError::InvalidShortKey {
                            option: name,
                            key: short,
                        })
                    }
                }
            }
        };

        let flags = parse_flags(raw.flags.as_deref().unwrap_or_default())?;
        let option_type = OptionType::from_word(raw.type_word.as_deref().unwrap_or("b"));
        if flags.reversed && option_type != OptionType::Boolean {
            return Err(CompileError::ReversedNonBoolean(name));
        }

        let arg_placeholder = if option_type.takes_value() {
            Some(placeholder(raw.arg).unwrap_or_else(|| name.to_uppercase()))
        } else {
            None
        };

        let (constraint, range_text) =
            constraint::compile(option_type, &raw.range).map_err(|source| {
                CompileError::BadRange {
                    option: name.clone(),
                    source,
                }
            })?;

        let hidden = flags.hidden || raw.description.is_empty();
        Ok(OptionSpec {
            value: option_type.zero_value(),
            name,
            key,
            option_type,
            flags: OptionFlags { hidden, ..flags },
            arg_placeholder,
            description: raw.description,
            range_text,
            constraint,
        })
    }

    fn anonymous_key(&mut self) -> OptionKey {
        let key = OptionKey::Anonymous(self.next_anonymous);
        self.next_anonymous += 1;
        key
    }

    /// Check table-wide invariants, seed the default and append `spec`.
    fn register(&mut self, mut spec: OptionSpec, env: &Environment) -> Result<(), CompileError> {
        if self.table.len() >= self.max_options {
            return Err(CompileError::TooManyOptions(self.max_options));
        }
        if self.table.get(&spec.name).is_some() {
            return Err(CompileError::DuplicateOption(spec.name));
        }
        if let Some(other) = self.table.by_key(spec.key) {
            if let OptionKey::Short(key) = spec.key {
                return Err(CompileError::DuplicateShortKey {
                    option: spec.name,
                    key,
                    other: other.name.clone(),
                });
            }
        }

        defaults::seed(&mut spec, env);
        debug!(
            option = %spec.name,
            key = ?spec.key,
            kind = spec.option_type.describe(),
            hidden = spec.flags.hidden,
            "registered option"
        );
        self.table.push(spec);
        Ok(())
    }

    fn automatic(&mut self, name: &str, key: Option<char>, description: &str) -> OptionSpec {
        let key = match key {
            Some(c) => OptionKey::Short(c),
            None => self.anonymous_key(),
        };
        OptionSpec {
            name: name.to_string(),
            key,
            option_type: OptionType::Boolean,
            flags: OptionFlags {
                hidden: description.is_empty(),
                reversed: false,
            },
            arg_placeholder: None,
            description: description.to_string(),
            range_text: String::new(),
            constraint: None,
            value: OptionType::Boolean.zero_value(),
        }
    }

    fn finish(&mut self, env: &Environment) -> Result<Declarations, CompileError> {
        let usage = self
            .usage
            .take()
            .or_else(|| env.get("USAGE").map(|usage| usage.to_string_lossy().into_owned()));

        let (usage, forced_help) = match usage {
            Some(usage) if self.declared > 0 => (usage, false),
            _ => {
                debug!("no usable declarations, showing built-in help");
                (FALLBACK_USAGE.to_string(), true)
            }
        };

        for (name, key, description) in [
            ("help", Some('h'), "print this help message"),
            ("version", Some('V'), "print program version"),
            ("verbose", Some('v'), "be verbose"),
            ("print-man-page", None, ""),
        ] {
            let spec = self.automatic(name, key, description);
            self.register(spec, env)?;
        }

        Ok(Declarations {
            program: self.program.clone(),
            version: self.version.clone(),
            usage: UsageText::new(usage),
            options: std::mem::take(&mut self.table),
            forced_help,
        })
    }
}

/// `-` and the empty string stand for "not given".
fn placeholder(field: Option<String>) -> Option<String> {
    field.filter(|f| !f.is_empty() && f != "-")
}

/// Option names look like `^[[:alpha:]][[:alnum:]_-]*$`.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn parse_flags(text: &str) -> Result<OptionFlags, CompileError> {
    let mut flags = OptionFlags::default();
    for c in text.chars() {
        match c.to_ascii_lowercase() {
            'h' => flags.hidden = true,
            'r' => flags.reversed = true,
            '-' | '0' => {}
            _ => return Err(CompileError::IllegalFlag(text.to_string())),
        }
    }
    Ok(flags)
}

/// Read the range field; the quoting of the field is kept because it
/// decides between a pattern and an enumeration.
fn next_range(tokens: &mut Tokens<'_>) -> RangeField {
    let quoted = tokens.next_is_quoted();
    tokens
        .next()
        .map(|text| RangeField::new(text, quoted))
        .unwrap_or_default()
}

/// `OPTION: name short flags type arg range description...`
fn parse_option_record(rest: &str, line: usize) -> Result<RawOption, CompileError> {
    let mut tokens = Tokens::new(rest);
    let name = tokens.next().ok_or(CompileError::MissingName { line })?;

    let short = tokens.next();
    let flags = tokens.next();
    let type_word = tokens.next();
    let arg = tokens.next();
    let range = next_range(&mut tokens);
    let description = tokens.remainder().trim_end().to_string();

    Ok(RawOption {
        name,
        short,
        flags,
        type_word,
        arg,
        range,
        description,
    })
}

/// `add_opt name description short short-arg long-name long-arg type range`
///
/// The long name wins over `name`, and the long argument name fills in for
/// a missing short one.
fn parse_add_opt_record(rest: &str, line: usize) -> Result<RawOption, CompileError> {
    let mut tokens = Tokens::new(rest);
    let name = tokens.next().ok_or(CompileError::MissingName { line })?;

    let description = tokens.next().unwrap_or_default();
    let short = tokens.next();
    let short_arg = placeholder(tokens.next());
    let long_name = placeholder(tokens.next());
    let long_arg = placeholder(tokens.next());
    let type_word = tokens.next();
    let range = next_range(&mut tokens);

    Ok(RawOption {
        name: long_name.unwrap_or(name),
        short,
        flags: None,
        type_word,
        arg: short_arg.or(long_arg),
        range,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::table::{OptionValue, StringKind};

    const SCENARIO: &str = "PROG: demo\nOPTION: bars b - integer count 2-6 number of bars\nUSAGE:\n[--] [f]\nDemo tool.";

    fn compile(text: &str) -> Result<Declarations, CompileError> {
        Compiler::new("optsh").compile_str(text, &Environment::default())
    }

    fn compile_env(text: &str, env: &[(&str, &str)]) -> Declarations {
        let env: Environment = env.iter().copied().collect();
        Compiler::new("optsh").compile_str(text, &env).unwrap()
    }

    fn names(decl: &Declarations) -> Vec<&str> {
        decl.options.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_scenario_declarations() {
        let decl = compile(SCENARIO).unwrap();
        assert_eq!(decl.program, "demo");
        assert!(!decl.forced_help);
        assert_eq!(decl.usage.synopsis(), "[--] [f]");
        assert_eq!(decl.usage.description(), "Demo tool.");
        assert_eq!(
            names(&decl),
            vec!["bars", "help", "version", "verbose", "print-man-page"]
        );

        let bars = decl.options.get("bars").unwrap();
        assert_eq!(bars.key, OptionKey::Short('b'));
        assert_eq!(bars.option_type, OptionType::Integer);
        assert_eq!(bars.arg_placeholder.as_deref(), Some("count"));
        assert_eq!(bars.description, "number of bars");
        assert_eq!(bars.range_text, "2-6");
        assert_eq!(bars.value, OptionValue::Int(0));
        assert!(!bars.is_hidden());
    }

    #[test]
    fn test_automatic_options() {
        let decl = compile(SCENARIO).unwrap();
        assert_eq!(decl.options.get("help").unwrap().key, OptionKey::Short('h'));
        assert_eq!(decl.options.get("version").unwrap().key, OptionKey::Short('V'));
        assert_eq!(decl.options.get("verbose").unwrap().key, OptionKey::Short('v'));

        let man = decl.options.get("print-man-page").unwrap();
        assert!(man.is_hidden());
        assert!(matches!(man.key, OptionKey::Anonymous(n) if n >= ANONYMOUS_KEY_BASE));
    }

    #[test]
    fn test_option_record_string_enumeration() {
        let decl = compile(
            "OPTION: colour c - string name \"red green blue\" colour to use\nUSAGE:\nx",
        )
        .unwrap();
        let colour = decl.options.get("colour").unwrap();
        assert_eq!(colour.option_type, OptionType::String(StringKind::Plain));
        assert_eq!(colour.description, "colour to use");
        match &colour.constraint {
            Some(Constraint::Enumeration(values)) => {
                assert_eq!(values, &vec!["red", "green", "blue"])
            }
            other => panic!("Expected Enumeration, got {:?}", other),
        }
    }

    #[test]
    fn test_option_record_string_pattern() {
        let decl = compile("OPTION: id - - string ID ^[0-9]+$ numeric id\nUSAGE:\nx").unwrap();
        let id = decl.options.get("id").unwrap();
        assert!(matches!(id.constraint, Some(Constraint::Pattern(_))));
        assert!(matches!(id.key, OptionKey::Anonymous(_)));
        assert_eq!(id.description, "numeric id");
    }

    #[test]
    fn test_option_record_truncated() {
        let decl = compile("OPTION: quiet\nUSAGE:\nx").unwrap();
        let quiet = decl.options.get("quiet").unwrap();
        assert_eq!(quiet.option_type, OptionType::Boolean);
        assert!(quiet.is_hidden());
        assert!(quiet.arg_placeholder.is_none());
    }

    #[test]
    fn test_option_record_flags() {
        let decl = compile(
            "OPTION: colour c R boolean - - use colour\nOPTION: debug d H boolean - - debug mode\nUSAGE:\nx",
        )
        .unwrap();
        let colour = decl.options.get("colour").unwrap();
        assert!(colour.flags.reversed);
        assert_eq!(colour.value, OptionValue::Bool(true));
        assert!(decl.options.get("debug").unwrap().is_hidden());
    }

    #[test]
    fn test_illegal_flag() {
        let err = compile("OPTION: x x Q boolean - - desc\nUSAGE:\nx").unwrap_err();
        assert!(matches!(err, CompileError::IllegalFlag(ref f) if f == "Q"));
    }

    #[test]
    fn test_reversed_requires_boolean() {
        let err = compile("OPTION: n n r integer N - desc\nUSAGE:\nx").unwrap_err();
        assert!(matches!(err, CompileError::ReversedNonBoolean(ref n) if n == "n"));
    }

    #[test]
    fn test_add_opt_record() {
        let decl = compile(
            "add_opt ignored \"number of bars\" b - bars count integer 2-6\nUSAGE:\nx",
        )
        .unwrap();
        let bars = decl.options.get("bars").unwrap();
        assert_eq!(bars.key, OptionKey::Short('b'));
        assert_eq!(bars.arg_placeholder.as_deref(), Some("count"));
        assert_eq!(bars.description, "number of bars");
        assert_eq!(bars.range_text, "2-6");
        assert!(decl.options.get("ignored").is_none());
    }

    #[test]
    fn test_add_opt_long_name_from_name() {
        let decl = compile("add_opt Verbose2 \"extra output\" - - \"\" - boolean\nUSAGE:\nx").unwrap();
        let spec = decl.options.get("verbose2").unwrap();
        assert!(matches!(spec.key, OptionKey::Anonymous(_)));
        assert_eq!(spec.option_type, OptionType::Boolean);
    }

    #[test]
    fn test_add_opt_empty_description_hides() {
        let decl = compile("add_opt secret \"\" s - secret - string\nUSAGE:\nx").unwrap();
        assert!(decl.options.get("secret").unwrap().is_hidden());
    }

    #[test]
    fn test_add_opt_array_enumeration() {
        let decl = compile("add_opt fmt \"format\" f FMT fmt - array \"json yaml\"\nUSAGE:\nx").unwrap();
        let fmt = decl.options.get("fmt").unwrap();
        assert_eq!(fmt.option_type, OptionType::StringArray);
        assert!(matches!(fmt.constraint, Some(Constraint::Enumeration(_))));
    }

    #[test]
    fn test_url_type() {
        let decl = compile("OPTION: site s - url URL - where to go\nUSAGE:\nx").unwrap();
        let site = decl.options.get("site").unwrap();
        assert_eq!(site.option_type, OptionType::String(StringKind::Url));
        assert_eq!(site.range_text, constraint::URL_PATTERN);
    }

    #[test]
    fn test_name_is_lowercased() {
        let decl = compile("OPTION: Count c - integer N - count\nUSAGE:\nx").unwrap();
        assert!(decl.options.get("count").is_some());
    }

    #[test]
    fn test_missing_arg_placeholder_uses_name() {
        let decl = compile("OPTION: out-dir o - path - - where\nUSAGE:\nx").unwrap();
        assert_eq!(
            decl.options.get("out-dir").unwrap().arg_placeholder.as_deref(),
            Some("OUT-DIR")
        );
    }

    #[test]
    fn test_duplicate_option_in_both_dialects() {
        let err = compile(
            "OPTION: count a - integer N - first\nOPTION: count b - integer N - second\nUSAGE:\nx",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateOption(ref n) if n == "count"));

        let err = compile(
            "add_opt count \"first\" a N count N integer\nadd_opt count \"second\" b N count N integer\nUSAGE:\nx",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateOption(ref n) if n == "count"));
    }

    #[test]
    fn test_duplicate_with_automatic_option() {
        let err = compile("OPTION: verbose x - boolean - - mine\nUSAGE:\nx").unwrap_err();
        assert!(matches!(err, CompileError::DuplicateOption(ref n) if n == "verbose"));
    }

    #[test]
    fn test_duplicate_short_key() {
        let err = compile(
            "OPTION: alpha a - boolean - - one\nOPTION: apple a - boolean - - two\nUSAGE:\nx",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateShortKey { ref option, key: 'a', ref other }
                if option == "apple" && other == "alpha"
        ));
    }

    #[test]
    fn test_invalid_short_key() {
        let err = compile("OPTION: alpha ab - boolean - - one\nUSAGE:\nx").unwrap_err();
        assert!(matches!(err, CompileError::InvalidShortKey { ref key, .. } if key == "ab"));
    }

    #[test]
    fn test_illegal_name() {
        let err = compile("OPTION: 9lives - - boolean - - cat\nUSAGE:\nx").unwrap_err();
        assert!(matches!(err, CompileError::IllegalName(ref n) if n == "9lives"));
    }

    #[test]
    fn test_bad_regex_names_option_and_pattern() {
        let err = compile("OPTION: id i - string ID ([a-z numeric id\nUSAGE:\nx").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("id"), "{}", message);
        assert!(message.contains("([a-z"), "{}", message);
    }

    #[test]
    fn test_too_many_options() {
        let mut text = String::new();
        for i in 0..5 {
            text.push_str(&format!("OPTION: opt{} - - boolean - - option {}\n", i, i));
        }
        text.push_str("USAGE:\nx\n");

        let err = Compiler::new("optsh")
            .with_max_options(6)
            .compile_str(&text, &Environment::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::TooManyOptions(6)));

        let decl = Compiler::new("optsh")
            .with_max_options(9)
            .compile_str(&text, &Environment::default())
            .unwrap();
        assert_eq!(decl.options.len(), 9);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let decl = compile("\n# comment\n   \nPROG: p\n  # indented comment\nOPTION: a a - boolean - - x\nUSAGE:\ny").unwrap();
        assert_eq!(decl.program, "p");
        assert!(decl.options.get("a").is_some());
    }

    #[test]
    fn test_usage_block_is_verbatim() {
        let decl = compile("OPTION: a a - boolean - - x\nUSAGE:\n[file]\n# not a comment\nOPTION: b b\n  indented\n").unwrap();
        assert_eq!(decl.usage.as_str(), "[file]\n# not a comment\nOPTION: b b\n  indented");
        assert!(decl.options.get("b").is_none());
    }

    #[test]
    fn test_keywords_without_colon() {
        let decl = compile("PROG demo\nOPTION bars b - integer count 2-6 number of bars\nUSAGE\n[f]").unwrap();
        assert_eq!(decl.program, "demo");
        assert_eq!(decl.options.get("bars").unwrap().range_text, "2-6");
        assert_eq!(decl.usage.synopsis(), "[f]");
        assert!(!decl.forced_help);
    }

    #[test]
    fn test_unknown_record() {
        let err = compile("FROB: x\n").unwrap_err();
        assert!(matches!(err, CompileError::UnknownRecord { line: 1, ref keyword } if keyword == "FROB:"));
    }

    #[test]
    fn test_inactive_dialect() {
        let err = Compiler::new("optsh")
            .with_dialect(Dialect::OptionLine)
            .compile_str("add_opt a \"b\" c - - - boolean\n", &Environment::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::InactiveDialect { line: 1, .. }));

        let err = Compiler::new("optsh")
            .with_dialect(Dialect::AddOpt)
            .compile_str("\nOPTION: a a\n", &Environment::default())
            .unwrap_err();
        assert!(matches!(err, CompileError::InactiveDialect { line: 2, .. }));
    }

    #[test]
    fn test_missing_name() {
        let err = compile("OPTION:\n").unwrap_err();
        assert!(matches!(err, CompileError::MissingName { line: 1 }));
    }

    #[test]
    fn test_fallback_without_input() {
        let decl = compile("").unwrap();
        assert!(decl.forced_help);
        assert_eq!(decl.usage.as_str(), FALLBACK_USAGE);
        assert_eq!(decl.program, "optsh");
        assert_eq!(
            names(&decl),
            vec!["help", "version", "verbose", "print-man-page"]
        );
    }

    #[test]
    fn test_fallback_without_usage() {
        let decl = compile("OPTION: a a - boolean - - x\n").unwrap();
        assert!(decl.forced_help);
    }

    #[test]
    fn test_fallback_without_options() {
        let decl = compile("USAGE:\n[file]\n").unwrap();
        assert!(decl.forced_help);
    }

    #[test]
    fn test_usage_from_environment() {
        let decl = compile_env("OPTION: a a - boolean - - x\n", &[("USAGE", "[x]\nfrom env")]);
        assert!(!decl.forced_help);
        assert_eq!(decl.usage.synopsis(), "[x]");
    }

    #[test]
    fn test_stdin_usage_beats_environment() {
        let decl = compile_env(
            "OPTION: a a - boolean - - x\nUSAGE:\n[stdin]\n",
            &[("USAGE", "[env]")],
        );
        assert_eq!(decl.usage.synopsis(), "[stdin]");
    }

    #[test]
    fn test_defaults_seeded_from_environment() {
        let decl = compile_env(SCENARIO, &[("BARS", "5"), ("VERBOSE", "1")]);
        assert_eq!(decl.options.get("bars").unwrap().value, OptionValue::Int(5));
        assert_eq!(decl.options.get("verbose").unwrap().value, OptionValue::Bool(true));
    }

    #[test]
    fn test_compiling_twice_gives_same_values() {
        let env = [("BARS", "3")];
        let a = compile_env(SCENARIO, &env);
        let b = compile_env(SCENARIO, &env);
        let values = |d: &Declarations| d.options.iter().map(|s| s.value.clone()).collect::<Vec<_>>();
        assert_eq!(values(&a), values(&b));
    }

    #[test]
    fn test_version_record() {
        let decl = compile("VERSION: 2.0\nOPTION: a a - boolean - - x\nUSAGE:\nx").unwrap();
        assert_eq!(decl.version.as_deref(), Some("2.0"));
    }

    #[test]
    fn test_program_known_after_error() {
        let mut compiler = Compiler::new("optsh");
        let result = compiler.compile_str("PROG: demo\nFROB\n", &Environment::default());
        assert!(result.is_err());
        assert_eq!(compiler.program(), "demo");
    }
}
