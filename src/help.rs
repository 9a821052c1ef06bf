//! Help and version text for the calling script, rendered with Clap.

use crate::table::{Declarations, OptionSpec};
use clap::{value_parser, Arg, ArgAction, ColorChoice, Command};
use std::ffi::OsString;

/// The Clap command shared by help rendering and argv scanning, without
/// any option arguments.
pub fn base_command(decl: &Declarations) -> Command {
    let usage = format!("{} [OPTION...] {}", decl.program, decl.usage.synopsis());
    let mut cmd = Command::new(decl.program.clone())
        .override_usage(usage.trim_end().to_string())
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .args_override_self(true)
        .infer_long_args(true)
        .color(ColorChoice::Never);

    let about = decl.usage.description().trim();
    if !about.is_empty() {
        cmd = cmd.about(about.to_string());
    }

    cmd
}

/// Build a Clap Arg from an OptionSpec.
///
/// Every option gets its name as long flag. Value-taking options accept
/// values that begin with `-`, and take them as raw OS strings.
pub fn build_arg(spec: &OptionSpec) -> Arg {
    let mut arg = Arg::new(spec.name.clone()).long(spec.name.clone());

    if let Some(short) = spec.key.short() {
        arg = arg.short(short);
    }

    if spec.option_type.takes_value() {
        arg = arg
            .action(ArgAction::Set)
            .value_parser(value_parser!(OsString))
            .allow_hyphen_values(true);
        if let Some(ref placeholder) = spec.arg_placeholder {
            arg = arg.value_name(placeholder.clone());
        }
    } else {
        arg = arg.action(ArgAction::SetTrue);
    }

    if !spec.description.is_empty() {
        arg = arg.help(spec.description.clone());
    }

    if spec.is_hidden() {
        arg = arg.hide(true);
    }

    arg
}

/// Build the full Clap command for the declarations.
pub fn build_command(decl: &Declarations) -> Command {
    base_command(decl).args(decl.options.iter().map(build_arg))
}

/// Generate the `--help` text.
pub fn generate_help(decl: &Declarations) -> String {
    build_command(decl).render_help().to_string()
}

/// Generate the `--version` text: the program name, then the declared
/// version if there is one.
pub fn generate_version(decl: &Declarations) -> String {
    let mut version = decl.program.clone();
    if let Some(ref v) = decl.version {
        version.push(' ');
        version.push_str(v);
    }
    version.push('\n');
    version
}
