//! Compiled option table and the types it is made of.

use crate::constraint::Constraint;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::ffi::OsString;
use std::fmt;
use std::os::unix::ffi::OsStrExt;

/// Historical limit on the number of options, automatic ones included.
pub const MAX_OPTIONS: usize = 100;

/// First value handed out for options without a short key. Far above any
/// printable character so it can never clash with a real key.
pub const ANONYMOUS_KEY_BASE: u32 = 0x30_0001;

/// Identity of an option as seen by the argv scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKey {
    /// A printable short key (e.g. 'v' for -v).
    Short(char),
    /// Placeholder for a long-only option.
    Anonymous(u32),
}

impl OptionKey {
    /// The short flag character, if this key has one.
    pub fn short(&self) -> Option<char> {
        match self {
            OptionKey::Short(c) => Some(*c),
            OptionKey::Anonymous(_) => None,
        }
    }

    /// The short flag character when it is a letter.
    pub fn alphabetic(&self) -> Option<char> {
        self.short().filter(|c| c.is_ascii_alphabetic())
    }
}

/// Flavor of a string option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StringKind {
    Plain,
    /// Checked against the built-in URL pattern.
    Url,
    Path,
}

/// The declared type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Boolean,
    Integer,
    Double,
    String(StringKind),
    StringArray,
}

impl OptionType {
    /// Resolve a type word by its first letter, case-insensitively.
    ///
    /// Unknown, empty and `-` all mean boolean.
    pub fn from_word(word: &str) -> OptionType {
        match word.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('i') => OptionType::Integer,
            Some('f' | 'd') => OptionType::Double,
            Some('s') => OptionType::String(StringKind::Plain),
            Some('u') => OptionType::String(StringKind::Url),
            Some('p') => OptionType::String(StringKind::Path),
            Some('a') => OptionType::StringArray,
            _ => OptionType::Boolean,
        }
    }

    pub fn takes_value(&self) -> bool {
        !matches!(self, OptionType::Boolean)
    }

    /// The value an option holds before any default is applied.
    pub fn zero_value(&self) -> OptionValue {
        match self {
            OptionType::Boolean => OptionValue::Bool(false),
            OptionType::Integer => OptionValue::Int(0),
            OptionType::Double => OptionValue::Double(0.0),
            OptionType::String(_) | OptionType::StringArray => OptionValue::Text(OsString::new()),
        }
    }

    /// Human readable name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            OptionType::Boolean => "boolean",
            OptionType::Integer => "integer",
            OptionType::Double => "double",
            OptionType::String(StringKind::Url) => "url",
            OptionType::String(StringKind::Path) => "path",
            OptionType::String(StringKind::Plain) => "string",
            OptionType::StringArray => "array",
        }
    }
}

/// Option flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptionFlags {
    /// Left out of help and the man page, still parsed and exported.
    pub hidden: bool,
    /// Boolean that starts out true and is cleared by its flag.
    pub reversed: bool,
}

/// The current value of an option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    /// Arguments and environment values are kept byte for byte.
    Text(#[serde(serialize_with = "lossy")] OsString),
}

fn lossy<S: Serializer>(text: &OsString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&text.to_string_lossy())
}

impl OptionValue {
    /// The value as the shell should see it. Text goes through unchanged,
    /// everything else in its `Display` form.
    pub fn to_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            OptionValue::Text(text) => Cow::Borrowed(text.as_bytes()),
            other => Cow::Owned(other.to_string().into_bytes()),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(true) => f.write_str("yes"),
            OptionValue::Bool(false) => Ok(()),
            OptionValue::Int(n) => write!(f, "{}", n),
            OptionValue::Double(x) => write!(f, "{:.6}", x),
            OptionValue::Text(s) => f.write_str(&s.to_string_lossy()),
        }
    }
}

/// One declared option.
#[derive(Debug, Clone, Serialize)]
pub struct OptionSpec {
    /// Canonical lowercase name, also the long flag.
    pub name: String,
    pub key: OptionKey,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub flags: OptionFlags,
    /// Display name of the value in help text; `None` for booleans.
    pub arg_placeholder: Option<String>,
    pub description: String,
    /// The range text exactly as declared, for error messages.
    pub range_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    pub value: OptionValue,
}

impl OptionSpec {
    /// Name of the shell variable this option is exported as.
    pub fn var_name(&self) -> String {
        crate::defaults::env_var_name(&self.name)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.hidden
    }
}

/// Options in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OptionTable {
    specs: Vec<OptionSpec>,
}

impl OptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Append a spec. Uniqueness is the compiler's job.
    pub(crate) fn push(&mut self, spec: OptionSpec) {
        self.specs.push(spec);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionSpec> {
        self.specs.iter()
    }

    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn by_key(&self, key: OptionKey) -> Option<&OptionSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    pub fn by_key_mut(&mut self, key: OptionKey) -> Option<&mut OptionSpec> {
        self.specs.iter_mut().find(|s| s.key == key)
    }

    /// Options that appear in help and the man page.
    pub fn visible(&self) -> impl Iterator<Item = &OptionSpec> {
        self.specs.iter().filter(|s| !s.is_hidden())
    }
}

impl<'a> IntoIterator for &'a OptionTable {
    type Item = &'a OptionSpec;
    type IntoIter = std::slice::Iter<'a, OptionSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.specs.iter()
    }
}

/// Free-form usage: a synopsis line followed by a description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UsageText {
    text: String,
}

impl UsageText {
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        text.truncate(text.trim_end().len());
        UsageText { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The argument synopsis, e.g. `[--] [file...]`.
    pub fn synopsis(&self) -> &str {
        self.text.lines().next().unwrap_or_default()
    }

    /// Everything after the synopsis line.
    pub fn description(&self) -> &str {
        match self.text.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        }
    }

    /// The first non-blank description line, used as a one-line summary.
    pub fn summary(&self) -> &str {
        self.description()
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
    }
}

/// Everything read from the declarations.
#[derive(Debug, Clone, Serialize)]
pub struct Declarations {
    pub program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub usage: UsageText,
    pub options: OptionTable,
    /// Nothing usable was declared, so help is shown instead of parsing.
    pub forced_help: bool,
}
