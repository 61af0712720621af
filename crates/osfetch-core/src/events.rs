//! Batch events and the sinks that receive them.
//!
//! The batch never prints; it emits `BatchEvent`s to an injected `EventSink`.
//! The CLI turns them into progress lines, tests collect them into a `Vec`.

use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc;

/// Pipeline step at which a URL failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Destination template could not be evaluated.
    Resolve,
    /// Parent directories could not be created.
    CreateDir,
    /// Temp file, network, HTTP status or write failure.
    Transfer,
    /// Temp-to-final rename failed after a complete transfer.
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Resolve => "resolve",
            Stage::CreateDir => "create-dir",
            Stage::Transfer => "transfer",
            Stage::Commit => "commit",
        };
        f.write_str(s)
    }
}

/// One observable step of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// An identifier could not be loaded into a descriptor; it is skipped.
    LoadFailed { identifier: String, error: String },
    /// Processing of a descriptor's URLs begins.
    Descriptor { name: String, urls: usize },
    /// Destination already present; no request made.
    Skipped { url: String, path: PathBuf },
    /// Transfer completed and promoted to `path`.
    Downloaded { url: String, path: PathBuf, bytes: u64 },
    /// This URL failed at `stage`; the batch continues.
    Failed { url: String, stage: Stage, error: String },
}

/// Receiver of batch events.
pub trait EventSink {
    fn emit(&mut self, event: BatchEvent);
}

impl<F: FnMut(BatchEvent)> EventSink for F {
    fn emit(&mut self, event: BatchEvent) {
        self(event)
    }
}

impl EventSink for Vec<BatchEvent> {
    fn emit(&mut self, event: BatchEvent) {
        self.push(event);
    }
}

impl EventSink for mpsc::Sender<BatchEvent> {
    fn emit(&mut self, event: BatchEvent) {
        // Receiver gone means nobody is listening; the batch still runs.
        let _ = self.send(event);
    }
}

/// Sink that writes each event to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: BatchEvent) {
        match &event {
            BatchEvent::LoadFailed { identifier, error } => {
                tracing::warn!(identifier = %identifier, "error loading operating system: {}", error)
            }
            BatchEvent::Descriptor { name, urls } => {
                tracing::info!(name = %name, urls, "processing descriptor")
            }
            BatchEvent::Skipped { url, path } => {
                tracing::info!(url = %url, "{} already exists", path.display())
            }
            BatchEvent::Downloaded { url, path, bytes } => {
                tracing::info!(url = %url, bytes, "downloaded {}", path.display())
            }
            BatchEvent::Failed { url, stage, error } => {
                tracing::warn!(url = %url, stage = %stage, "download failed: {}", error)
            }
        }
    }
}

/// Forwards every event to two sinks in order.
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&mut self, event: BatchEvent) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}
