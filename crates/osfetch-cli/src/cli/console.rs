//! Progress lines on stdout, one per descriptor and per download outcome.

use osfetch_core::events::{BatchEvent, EventSink, Stage};
use std::io::{self, Write};

pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleSink<W> {
    #[cfg(test)]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn failure_prefix(stage: Stage) -> &'static str {
    match stage {
        Stage::Resolve => "Error getting target path",
        Stage::CreateDir => "Error creating directory",
        Stage::Transfer => "Error downloading file",
        Stage::Commit => "Error saving file",
    }
}

/// Formats one event as a console line (without trailing newline).
pub fn render(event: &BatchEvent) -> String {
    match event {
        BatchEvent::LoadFailed { error, .. } => format!("Error loading operating system: {}", error),
        BatchEvent::Descriptor { name, .. } => name.clone(),
        BatchEvent::Skipped { path, .. } => format!("  \"{}\" already exists", path.display()),
        BatchEvent::Downloaded { bytes, .. } => format!("  {} bytes written", bytes),
        BatchEvent::Failed { stage, error, .. } => {
            format!("  {}: {}", failure_prefix(*stage), error)
        }
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: BatchEvent) {
        // A closed stdout must not abort the batch.
        let _ = writeln!(self.out, "{}", render(&event));
        let _ = self.out.flush();
    }
}
