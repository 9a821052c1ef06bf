//! Shell statements written to the distinguished output channel.

use crate::table::OptionTable;
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{BorrowedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use tracing::{debug, warn};

/// What the channel receives when optsh fails, so that a caller evaluating
/// it exits too.
pub const FAILURE_STATEMENT: &str = "exit 1";

/// Escape bytes for safe use in a POSIX shell double-quoted context.
///
/// Escapes: $, `, \ and "
pub fn escape_shell_value(value: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(value.len());
    for &b in value {
        match b {
            b'$' | b'`' | b'\\' | b'"' => escaped.extend_from_slice(&[b'\\', b]),
            _ => escaped.push(b),
        }
    }
    escaped
}

/// Generate the export statements for every option, in table order,
/// followed by a `set --` restoring the remaining positional arguments.
///
/// Values and arguments are copied byte for byte.
pub fn generate_output(table: &OptionTable, remaining: &[OsString]) -> Vec<u8> {
    let mut output = Vec::new();

    for spec in table {
        output.extend_from_slice(format!("export {}=\"", spec.var_name()).as_bytes());
        output.extend(escape_shell_value(&spec.value.to_bytes()));
        output.extend_from_slice(b"\"; ");
    }

    output.extend_from_slice(b"set -- ");
    for arg in remaining {
        output.push(b'"');
        output.extend(escape_shell_value(arg.as_bytes()));
        output.extend_from_slice(b"\" ");
    }
    output.extend_from_slice(b";\n");

    output
}

/// Duplicate the inherited descriptor `fd`. The duplicate shares its file
/// description, so the offset and `O_APPEND` of a `3>>file` are kept.
fn inherited(fd: u32) -> io::Result<File> {
    let raw = RawFd::try_from(fd).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    // SAFETY: the borrow only lives for the dup; a descriptor that isn't
    // open makes the dup fail with EBADF.
    let borrowed = unsafe { BorrowedFd::borrow_raw(raw) };
    Ok(File::from(borrowed.try_clone_to_owned()?))
}

/// Writer for file descriptor `fd`.
///
/// Falls back to standard output when the descriptor isn't open, so the
/// statements are never silently lost.
pub fn open_channel(fd: u32) -> Box<dyn Write> {
    match inherited(fd) {
        Ok(file) => {
            debug!(fd, "writing to inherited output channel");
            Box::new(file)
        }
        Err(err) => {
            warn!(fd, error = %err, "output channel unavailable, using standard output");
            Box::new(io::stdout())
        }
    }
}

/// Write `bytes` to the channel and flush it.
pub fn write_channel(channel: &mut dyn Write, bytes: &[u8]) -> io::Result<()> {
    channel.write_all(bytes)?;
    channel.flush()
}
