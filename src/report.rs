//! Rendering the leak log for humans, and writing it to disk for tools.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tracing::info;

use crate::errors::{Result, TestLeakError};
use crate::log::LeakLog;

/// Color only when the stream is a terminal.
pub fn color_choice(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

pub fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice(atty::Stream::Stdout))
}

// ============================================================================
// END-OF-RUN SUMMARY
// ============================================================================

/// The summary printed when a tracked run finishes.
pub fn render_summary(log: &LeakLog, out: &mut dyn WriteColor) -> io::Result<()> {
    if log.is_empty() {
        colored(out, Color::Green, |out| {
            writeln!(out, "\nTestLeak: No test pollution detected!")
        })?;
        return Ok(());
    }

    colored(out, Color::Red, |out| {
        writeln!(out, "\nTestLeak: {} leak(s) detected!", log.len())
    })?;
    render_units(log, out)
}

/// The listing printed by `testleak show`.
pub fn render_report(log: &LeakLog, out: &mut dyn WriteColor) -> io::Result<()> {
    if log.is_empty() {
        colored(out, Color::Green, |out| {
            writeln!(out, "Clean, no pollution found.")
        })?;
        return Ok(());
    }

    colored(out, Color::Red, |out| writeln!(out, "{} leak(s) found:", log.len()))?;
    render_units(log, out)
}

fn render_units(log: &LeakLog, out: &mut dyn WriteColor) -> io::Result<()> {
    for group in log.group_by_unit() {
        colored(out, Color::Yellow, |out| writeln!(out, "\n  {}", group.unit_id))?;
        for record in group.records {
            writeln!(out, "     {record}")?;
        }
    }
    Ok(())
}

fn colored<F>(out: &mut dyn WriteColor, color: Color, body: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn WriteColor) -> io::Result<()>,
{
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    let result = body(out);
    out.reset()?;
    result
}

// ============================================================================
// JSON REPORT
// ============================================================================

/// Append the log to the report at `path`, creating it if needed.
///
/// One run may span several test processes sharing one report path; each
/// process merges its records into what earlier processes wrote.
pub fn write_report(log: &LeakLog, path: &Path) -> Result<()> {
    let mut merged = if path.is_file() {
        read_report(path)?
    } else {
        LeakLog::new()
    };
    merged.append(log.all().iter().cloned());

    let bytes = merged.serialize()?;
    fs::write(path, bytes).map_err(|source| TestLeakError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), leaks = log.len(), total = merged.len(), "wrote leak report");
    Ok(())
}

/// Delete a report left over from an earlier run.
pub fn clear_report(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TestLeakError::ReportWrite {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

pub fn read_report(path: &Path) -> Result<LeakLog> {
    let bytes = fs::read(path).map_err(|e| TestLeakError::io(path, e))?;
    LeakLog::deserialize(&bytes)
}
