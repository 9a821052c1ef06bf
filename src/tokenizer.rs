//! Shell-like word splitting for declaration lines and enumeration lists.
//!
//! Understands `'...'`, `"..."` and backslash escapes the way a POSIX shell
//! does, but never expands `$name` or command substitutions: `$` and
//! backticks are ordinary characters here.

/// Returns true for the characters that separate words.
fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Read the next word of `input`, starting at byte offset `cursor`.
///
/// Returns the unquoted word and the offset just past the whitespace that
/// ended it (or the end of input). Returns `None` when only whitespace is
/// left, so an empty quoted word (`''`) is still reported as a word.
pub fn next_token(input: &str, cursor: usize) -> Option<(String, usize)> {
    let rest = input.get(cursor..)?;
    let start = rest.find(|c: char| !is_blank(c))?;

    let mut token = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in rest[start..].char_indices() {
        if escaped {
            token.push(c);
            escaped = false;
            continue;
        }

        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => token.push(c),
            (_, '\\') => escaped = true,
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => token.push(c),
            (None, '\'' | '"') => quote = Some(c),
            (None, _) if is_blank(c) => {
                let end = cursor + start + offset + c.len_utf8();
                return Some((token, end));
            }
            (None, _) => token.push(c),
        }
    }

    Some((token, input.len()))
}

/// Iterator over the words of a line.
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    input: &'a str,
    cursor: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokens { input, cursor: 0 }
    }

    /// Byte offset of the first unread character.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// The unread part of the input, leading whitespace removed.
    pub fn remainder(&self) -> &'a str {
        self.input
            .get(self.cursor..)
            .unwrap_or_default()
            .trim_start_matches(is_blank)
    }

    /// True when the next word starts with a quote character.
    pub fn next_is_quoted(&self) -> bool {
        self.remainder().starts_with(['\'', '"'])
    }
}

impl Iterator for Tokens<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let (token, cursor) = next_token(self.input, self.cursor)?;
        self.cursor = cursor;
        Some(token)
    }
}

/// Split a whole line into words.
pub fn split(input: &str) -> Vec<String> {
    Tokens::new(input).collect()
}

/// Quote `word` so that [`next_token`] reads it back unchanged.
pub fn shell_quote(word: &str) -> String {
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('\'');
    for c in word.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
