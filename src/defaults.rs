//! Environment-sourced default values.

use crate::table::{OptionSpec, OptionType, OptionValue};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use tracing::debug;

/// A snapshot of the process environment.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, OsString>,
}

impl Environment {
    /// Capture the current process environment. Values are kept as they
    /// are; a variable whose name isn't UTF-8 can't belong to an option and
    /// is skipped.
    pub fn snapshot() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&OsStr> {
        self.vars.get(name).map(OsString::as_os_str)
    }
}

impl<K: Into<String>, V: Into<OsString>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Environment {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Convert an option name to a shell variable name.
///
/// Upper-cases it and replaces anything that isn't alphanumeric with `_`.
pub fn env_var_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// The initial value of `spec`, before any command line is seen.
pub fn initial_value(spec: &OptionSpec, env: &Environment) -> OptionValue {
    let var = spec.var_name();
    let from_env = env.get(&var).filter(|v| !v.is_empty());

    let value = match (spec.option_type, from_env) {
        (OptionType::Boolean, Some(_)) => OptionValue::Bool(true),
        (OptionType::Boolean, None) => OptionValue::Bool(spec.flags.reversed),
        (OptionType::Integer, Some(text)) => OptionValue::Int(lenient_int(&text.to_string_lossy())),
        (OptionType::Double, Some(text)) => {
            OptionValue::Double(lenient_double(&text.to_string_lossy()))
        }
        (OptionType::String(_) | OptionType::StringArray, Some(text)) => {
            OptionValue::Text(text.to_os_string())
        }
        (option_type, None) => option_type.zero_value(),
    };

    if from_env.is_some() {
        debug!(option = %spec.name, %var, %value, "default taken from environment");
    }
    value
}

/// Seed `spec.value` from the environment.
pub fn seed(spec: &mut OptionSpec, env: &Environment) {
    spec.value = initial_value(spec, env);
}

/// Parse the longest integer prefix of `text` like `strtoll`, saturating on
/// overflow. Text without digits yields zero.
pub fn lenient_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let mut n: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(b - b'0');
        n = match n.checked_mul(10).and_then(|n| {
            if negative {
                n.checked_sub(d)
            } else {
                n.checked_add(d)
            }
        }) {
            Some(n) => n,
            None if negative => return i64::MIN,
            None => return i64::MAX,
        };
    }
    n
}

/// Parse the longest decimal floating point prefix of `text` like `strtod`.
/// Text without a number yields zero.
pub fn lenient_double(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_end = int_end;
    let mut seen_digits = int_end > end;
    if bytes.get(int_end) == Some(&b'.') {
        let frac_end = digits_from(int_end + 1);
        seen_digits |= frac_end > int_end + 1;
        mantissa_end = frac_end;
    }
    if !seen_digits {
        return 0.0;
    }
    end = mantissa_end;

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    text[..end].parse().unwrap_or(0.0)
}
