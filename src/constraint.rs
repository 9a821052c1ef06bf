//! Value constraints: numeric ranges, enumerations and patterns.

use crate::table::{OptionSpec, OptionType, OptionValue, StringKind};
use crate::tokenizer;
use regex::bytes::Regex;
use serde::{Serialize, Serializer};
use std::os::unix::ffi::OsStrExt;
use thiserror::Error;

/// Pattern every `url` option must match.
pub const URL_PATTERN: &str = r"^(nfs|http|https|ftp|file)://[[:alnum:]_.-]*[^[:space:]]*$";

/// Raised when an option's final value breaks its constraint.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("option {option}: value '{value}' out of range ('{range}')")]
pub struct RangeError {
    pub option: String,
    pub value: String,
    pub range: String,
}

/// Reasons a range field can't be compiled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeSyntaxError {
    #[error("malformed range '{0}': expected <min>-<max>")]
    Malformed(String),

    #[error("illegal regex ('{pattern}'): {reason}")]
    BadPattern { pattern: String, reason: String },

    #[error("empty enumeration")]
    EmptyEnumeration,
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumericRange {
    Integer { min: i64, max: i64 },
    Double { min: f64, max: f64 },
}

/// A validation rule attached to an option.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    Range(NumericRange),
    /// Allowed values, in declaration order.
    Enumeration(Vec<String>),
    Pattern(#[serde(serialize_with = "serialize_regex")] Regex),
}

fn serialize_regex<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

/// A range field as it appeared in a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeField {
    /// Text with quotes removed.
    pub text: String,
    /// The field was written inside `'...'` or `"..."`.
    pub quoted: bool,
}

impl RangeField {
    pub fn new(text: impl Into<String>, quoted: bool) -> Self {
        RangeField {
            text: text.into(),
            quoted,
        }
    }

    /// True for an absent range (empty, or the `-` placeholder).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() || (!self.quoted && self.text == "-")
    }
}

/// Compile the range field for an option of type `option_type`.
///
/// Returns the constraint together with the range text to report in
/// error messages. Url options always get [`URL_PATTERN`].
pub fn compile(
    option_type: OptionType,
    field: &RangeField,
) -> Result<(Option<Constraint>, String), RangeSyntaxError> {
    if option_type == OptionType::String(StringKind::Url) {
        let regex = compile_pattern(URL_PATTERN)?;
        return Ok((Some(Constraint::Pattern(regex)), URL_PATTERN.to_string()));
    }

    if field.is_empty() {
        return Ok((None, String::new()));
    }

    let text = field.text.clone();
    let constraint = match option_type {
        OptionType::Boolean => return Ok((None, String::new())),
        OptionType::Integer => {
            let (min, max) = split_bounds(&text)?;
            Constraint::Range(NumericRange::Integer {
                min: parse_bound(min, &text)?,
                max: parse_bound(max, &text)?,
            })
        }
        OptionType::Double => {
            let (min, max) = split_bounds(&text)?;
            Constraint::Range(NumericRange::Double {
                min: parse_bound(min, &text)?,
                max: parse_bound(max, &text)?,
            })
        }
        OptionType::String(_) if !field.quoted => Constraint::Pattern(compile_pattern(&text)?),
        OptionType::String(_) | OptionType::StringArray => {
            let allowed = tokenizer::split(&text);
            if allowed.is_empty() {
                return Err(RangeSyntaxError::EmptyEnumeration);
            }
            Constraint::Enumeration(allowed)
        }
    };

    Ok((Some(constraint), text))
}

fn compile_pattern(pattern: &str) -> Result<Regex, RangeSyntaxError> {
    Regex::new(pattern).map_err(|e| RangeSyntaxError::BadPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Split `min-max` on the separating dash. A leading sign on `min` and the
/// sign of an exponent are not separators.
fn split_bounds(text: &str) -> Result<(&str, &str), RangeSyntaxError> {
    let bytes = text.as_bytes();
    let dash = (1..bytes.len())
        .find(|&i| bytes[i] == b'-' && !matches!(bytes[i - 1], b'e' | b'E'))
        .ok_or_else(|| RangeSyntaxError::Malformed(text.to_string()))?;
    Ok((&text[..dash], &text[dash + 1..]))
}

fn parse_bound<T: std::str::FromStr>(bound: &str, text: &str) -> Result<T, RangeSyntaxError> {
    bound
        .trim()
        .parse()
        .map_err(|_| RangeSyntaxError::Malformed(text.to_string()))
}

impl Constraint {
    /// Check `value` against this constraint.
    pub fn admits(&self, value: &OptionValue) -> bool {
        match (self, value) {
            (Constraint::Range(NumericRange::Integer { min, max }), OptionValue::Int(n)) => {
                (*min..=*max).contains(n)
            }
            (Constraint::Range(NumericRange::Double { min, max }), OptionValue::Double(x)) => {
                *min <= *x && *x <= *max
            }
            (Constraint::Enumeration(allowed), OptionValue::Text(s)) => {
                allowed.iter().any(|a| s == a.as_str())
            }
            (Constraint::Pattern(regex), OptionValue::Text(s)) => regex.is_match(s.as_bytes()),
            (constraint, value) => {
                unreachable!("constraint {constraint:?} attached to a {value:?} value")
            }
        }
    }
}

/// Check the current value of `spec` against its constraint, if any.
pub fn validate(spec: &OptionSpec) -> Result<(), RangeError> {
    match &spec.constraint {
        Some(constraint) if !constraint.admits(&spec.value) => Err(RangeError {
            option: spec.name.clone(),
            value: spec.value.to_string(),
            range: spec.range_text.clone(),
        }),
        _ => Ok(()),
    }
}
