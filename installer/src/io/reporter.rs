//! User-visible error reporting.

use std::io::Write;

use tracing::error;

/// Surfaces a fatal error to the person at the machine.
///
/// Called synchronously from the pipeline thread. `allow_continue` tells the
/// reporter whether the user may choose to carry on; the pipeline always
/// passes `false`.
pub trait ErrorReporter {
    fn report(&self, message: &str, allow_continue: bool);
}

/// Reporter that prints a framed message to stderr.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ErrorReporter for ConsoleReporter {
    fn report(&self, message: &str, allow_continue: bool) {
        error!(allow_continue, "{message}");
        let mut stderr = std::io::stderr().lock();
        let _ = write_report(&mut stderr, message, allow_continue);
    }
}

fn write_report<W: Write>(out: &mut W, message: &str, allow_continue: bool) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "==== installation error ====")?;
    for line in message.lines() {
        writeln!(out, "  {line}")?;
    }
    if allow_continue {
        writeln!(out, "  (the installer will continue)")?;
    } else {
        writeln!(out, "  (the installer cannot continue)")?;
    }
    writeln!(out, "============================")?;
    out.flush()
}
