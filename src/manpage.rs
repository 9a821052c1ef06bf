//! Skeleton man(1) page generated from the declarations.
//!
//! The page is meant as a starting point: the trailer sections are emitted
//! empty for the script's author to fill in.

use crate::table::{Declarations, OptionSpec};
use std::fmt;

const TRAILER_SECTIONS: [&str; 9] = [
    "EXIT STATUS",
    "ENVIRONMENT",
    "FILES",
    "EXAMPLES",
    "NOTES",
    "BUGS",
    "SEE ALSO",
    "AUTHOR",
    "COPYRIGHT",
];

/// Escape a word for use inside a roff line: backslashes and hyphens.
fn word(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\e"),
            '-' => escaped.push_str("\\-"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A roff macro argument kept in one piece by double quotes.
fn quoted(text: &str) -> String {
    format!("\"{}\"", word(text).replace('"', "\\(dq"))
}

/// Escape a free text line so roff prints it as is.
fn text_line(line: &str) -> String {
    let escaped = line.replace('\\', "\\e");
    if escaped.starts_with(['.', '\'']) {
        format!("\\&{}", escaped)
    } else {
        escaped
    }
}

/// Renders the man page of a set of declarations.
pub struct ManPage<'a> {
    decl: &'a Declarations,
}

impl<'a> ManPage<'a> {
    pub fn new(decl: &'a Declarations) -> Self {
        ManPage { decl }
    }

    fn synopsis(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: Vec<&OptionSpec> = self.decl.options.visible().collect();

        write!(f, ".B {}", word(&self.decl.program))?;

        let cluster: String = visible
            .iter()
            .filter(|s| !s.option_type.takes_value())
            .filter_map(|s| s.key.alphabetic())
            .collect();
        if !cluster.is_empty() {
            write!(f, "\n.RB \"[\" \\-{} \"]\"", cluster)?;
        }

        let long_flags: Vec<String> = visible
            .iter()
            .filter(|s| !s.option_type.takes_value())
            .map(|s| format!("\\-\\-{}", word(&s.name)))
            .collect();
        if !long_flags.is_empty() {
            write!(f, "\n[\n.B {}\n]", long_flags.join(" "))?;
        }

        for spec in visible.iter().filter(|s| s.option_type.takes_value()) {
            let arg = word(spec.arg_placeholder.as_deref().unwrap_or_default());
            write!(f, "\n [")?;
            if let Some(c) = spec.key.alphabetic() {
                write!(f, "\\fB\\-{}\\fP \\fI{}\\fP,", c, arg)?;
            }
            write!(f, "\\fB\\-\\-{}\\fP=\\fI{}\\fP]", word(&spec.name), arg)?;
        }

        writeln!(f, " {}", text_line(self.decl.usage.synopsis()))
    }

    fn option_entry(spec: &OptionSpec, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arg = spec.arg_placeholder.as_deref().map(word);

        write!(f, ".TP\n.B ")?;
        if let Some(c) = spec.key.alphabetic() {
            write!(f, "\\fB\\-{}\\fP", c)?;
            if let Some(ref arg) = arg {
                write!(f, " \\fI{}\\fR", arg)?;
            }
            write!(f, ", ")?;
        }
        write!(f, "\\fB\\-\\-{}\\fP", word(&spec.name))?;
        if let Some(ref arg) = arg {
            write!(f, "\\fI={}\\fR", arg)?;
        }
        writeln!(f)?;

        for line in spec.description.lines() {
            writeln!(f, "{}", text_line(line))?;
        }
        Ok(())
    }
}

impl fmt::Display for ManPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = &self.decl.program;

        writeln!(f, ".TH {} 1 \\\" -*- nroff -*-", quoted(&program.to_uppercase()))?;
        writeln!(f, ".SH NAME")?;
        writeln!(f, "{} \\- {}", word(program), text_line(self.decl.usage.summary()))?;

        writeln!(f, ".SH SYNOPSIS\n.hy 0\n.na")?;
        self.synopsis(f)?;
        writeln!(f, ".ad b\n.hy 0")?;

        writeln!(f, ".SH DESCRIPTION")?;
        for line in self.decl.usage.description().lines() {
            if line.trim().is_empty() {
                writeln!(f, ".P")?;
            } else {
                writeln!(f, "{}", text_line(line))?;
            }
        }

        writeln!(f, ".SH OPTIONS")?;
        for spec in self.decl.options.visible() {
            Self::option_entry(spec, f)?;
        }

        for section in TRAILER_SECTIONS {
            writeln!(f, ".SH \"{}\"", section)?;
        }
        Ok(())
    }
}

/// Render the man page as a string.
pub fn render(decl: &Declarations) -> String {
    ManPage::new(decl).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::defaults::Environment;

    const DECLS: &str = "PROG: demo\n\
        OPTION: bars b - integer count 2-6 number of bars\n\
        OPTION: dry-run n - boolean - - do nothing\n\
        OPTION: secret s - string - -\n\
        OPTION: internal i H boolean - - internal use\n\
        USAGE:\n[--] [f]\nDemo tool.\n\n.dot line\nback\\slash";

    fn page() -> String {
        let decl = Compiler::new("optsh")
            .compile_str(DECLS, &Environment::default())
            .unwrap();
        render(&decl)
    }

    #[test]
    fn test_header_and_name() {
        let page = page();
        assert!(page.starts_with(".TH \"DEMO\" 1 \\\" -*- nroff -*-\n.SH NAME\ndemo \\- Demo tool.\n"), "{}", page);
    }

    #[test]
    fn test_title_with_spaces_stays_one_argument() {
        let decl = Compiler::new("optsh")
            .compile_str("PROG: my tool\nOPTION: a a - boolean - - x\nUSAGE:\nx", &Environment::default())
            .unwrap();
        let page = render(&decl);
        assert!(page.starts_with(".TH \"MY TOOL\" 1 "), "{}", page);
        assert_eq!(quoted("say \"hi\""), "\"say \\(dqhi\\(dq\"");
    }

    #[test]
    fn test_synopsis() {
        let page = page();
        assert!(page.contains(".B demo\n.RB \"[\" \\-nhVv \"]\""), "{}", page);
        assert!(
            page.contains("[\n.B \\-\\-dry\\-run \\-\\-help \\-\\-version \\-\\-verbose\n]"),
            "{}",
            page
        );
        assert!(
            page.contains("\n [\\fB\\-b\\fP \\fIcount\\fP,\\fB\\-\\-bars\\fP=\\fIcount\\fP] [--] [f]\n"),
            "{}",
            page
        );
    }

    #[test]
    fn test_option_entries() {
        let page = page();
        assert!(
            page.contains(".TP\n.B \\fB\\-b\\fP \\fIcount\\fR, \\fB\\-\\-bars\\fP\\fI=count\\fR\nnumber of bars\n"),
            "{}",
            page
        );
        assert!(page.contains(".TP\n.B \\fB\\-n\\fP, \\fB\\-\\-dry\\-run\\fP\ndo nothing\n"), "{}", page);
    }

    #[test]
    fn test_hidden_options_left_out() {
        let page = page();
        assert!(!page.contains("secret"), "{}", page);
        assert!(!page.contains("internal"), "{}", page);
        assert!(!page.contains("print\\-man\\-page"), "{}", page);
    }

    #[test]
    fn test_description_is_escaped() {
        let page = page();
        assert!(page.contains(".SH DESCRIPTION\nDemo tool.\n.P\n\\&.dot line\nback\\eslash\n.SH OPTIONS"), "{}", page);
    }

    #[test]
    fn test_trailer_sections() {
        let page = page();
        let tail: Vec<&str> = page.lines().rev().take(9).collect();
        assert_eq!(tail.first(), Some(&".SH \"COPYRIGHT\""));
        assert_eq!(tail.last(), Some(&".SH \"EXIT STATUS\""));
    }

    #[test]
    fn test_text_line_guards_control_characters() {
        assert_eq!(text_line(".x"), "\\&.x");
        assert_eq!(text_line("'x"), "\\&'x");
        assert_eq!(text_line("a.b"), "a.b");
    }
}
