//! Batch orchestration: descriptors → URLs → resolve → skip-if-exists → fetch.
//!
//! Every failure is isolated to its URL (or, for load errors, its identifier)
//! and reported through the event sink; the batch always runs to the end.

use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::config::OsFetchConfig;
use crate::descriptor::{MetadataSource, OsDescriptor};
use crate::events::{BatchEvent, EventSink, Stage};
use crate::fetch::{self, FetchError, FetchOptions};
use crate::gate;
use crate::template::{PathTemplate, TemplateError};

/// Counts for one batch run. Informational; callers do not derive exit codes from it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub descriptors: usize,
    pub load_failures: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

/// Result of processing a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlOutcome {
    Skipped(PathBuf),
    Downloaded { path: PathBuf, bytes: u64 },
    Failed(Stage),
}

/// Sequential download batch with a fixed template and output directory.
#[derive(Debug, Clone)]
pub struct Batch {
    template: PathTemplate,
    output_dir: PathBuf,
    options: FetchOptions,
    cancel: Option<CancelToken>,
}

impl Batch {
    pub fn new(template: PathTemplate, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            template,
            output_dir: output_dir.into(),
            options: FetchOptions::default(),
            cancel: None,
        }
    }

    /// Build from config: parses `destination_template` and applies transfer options.
    pub fn from_config(cfg: &OsFetchConfig, output_dir: impl Into<PathBuf>) -> Result<Self, TemplateError> {
        let template = PathTemplate::parse(&cfg.destination_template)?;
        Ok(Self::new(template, output_dir).with_options(cfg.fetch_options()))
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Load each identifier through `source`, then process every loaded descriptor.
    /// Identifiers that fail to load are reported and skipped.
    pub fn run<M, I>(&self, source: &M, identifiers: &[I], sink: &mut dyn EventSink) -> BatchSummary
    where
        M: MetadataSource,
        I: AsRef<str>,
    {
        let mut descriptors = Vec::with_capacity(identifiers.len());
        let mut load_failures = 0;
        for id in identifiers {
            let id = id.as_ref();
            match source.load(id) {
                Ok(os) => descriptors.push(os),
                Err(e) => {
                    tracing::debug!(identifier = %id, "load failed: {}", e);
                    load_failures += 1;
                    sink.emit(BatchEvent::LoadFailed {
                        identifier: id.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut summary = self.run_descriptors(&descriptors, sink);
        summary.load_failures = load_failures;
        summary
    }

    /// Process already-loaded descriptors in order.
    pub fn run_descriptors<D: OsDescriptor>(&self, descriptors: &[D], sink: &mut dyn EventSink) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for os in descriptors {
            summary.descriptors += 1;
            let urls = os.download_urls();
            sink.emit(BatchEvent::Descriptor {
                name: os.name().to_string(),
                urls: urls.len(),
            });
            for url in urls {
                match self.process_url(os, url, sink) {
                    UrlOutcome::Skipped(_) => summary.skipped += 1,
                    UrlOutcome::Downloaded { bytes, .. } => {
                        summary.downloaded += 1;
                        summary.bytes += bytes;
                    }
                    UrlOutcome::Failed(_) => summary.failed += 1,
                }
            }
        }
        tracing::info!(
            descriptors = summary.descriptors,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            "batch finished"
        );
        summary
    }

    /// Resolve, gate and fetch one URL. Never panics or propagates; failures become events.
    pub fn process_url<D: OsDescriptor + ?Sized>(
        &self,
        os: &D,
        url: &str,
        sink: &mut dyn EventSink,
    ) -> UrlOutcome {
        let relative = match self.template.resolve(os, url) {
            Ok(p) => p,
            Err(e) => return fail(sink, url, Stage::Resolve, &e),
        };
        let path = self.output_dir.join(relative);

        if gate::exists(&path) {
            sink.emit(BatchEvent::Skipped {
                url: url.to_string(),
                path: path.clone(),
            });
            return UrlOutcome::Skipped(path);
        }

        let cancel = self.cancel.as_ref();
        if cancel.map_or(false, CancelToken::is_cancelled) {
            let e = FetchError::Cancelled {
                url: url.to_string(),
            };
            return fail(sink, url, e.stage(), &e);
        }

        if let Err(e) = fetch::ensure_parent_dir(&path) {
            return fail(sink, url, e.stage(), &e);
        }

        match fetch::fetch(url, &path, &self.options, cancel) {
            Ok(bytes) => {
                sink.emit(BatchEvent::Downloaded {
                    url: url.to_string(),
                    path: path.clone(),
                    bytes,
                });
                UrlOutcome::Downloaded { path, bytes }
            }
            Err(e) => fail(sink, url, e.stage(), &e),
        }
    }
}

fn fail(sink: &mut dyn EventSink, url: &str, stage: Stage, error: &dyn std::error::Error) -> UrlOutcome {
    tracing::debug!(url = %url, stage = %stage, "{}", error);
    sink.emit(BatchEvent::Failed {
        url: url.to_string(),
        stage,
        error: error.to_string(),
    });
    UrlOutcome::Failed(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MetadataError, OperatingSystem};

    fn os(name: &str, urls: &[&str]) -> OperatingSystem {
        OperatingSystem {
            name: name.to_string(),
            release: None,
            architecture: "x86_64".to_string(),
            download_urls: urls.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// In-memory metadata source keyed by descriptor name.
    struct MapSource(Vec<OperatingSystem>);

    impl MetadataSource for MapSource {
        type Descriptor = OperatingSystem;

        fn load(&self, identifier: &str) -> Result<OperatingSystem, MetadataError> {
            self.0
                .iter()
                .find(|o| o.name == identifier)
                .cloned()
                .ok_or_else(|| MetadataError::Invalid {
                    path: PathBuf::from(identifier),
                    reason: "unknown descriptor",
                })
        }
    }

    #[test]
    fn empty_url_list_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let batch = Batch::new(PathTemplate::default(), dir.path());
        let mut events: Vec<BatchEvent> = Vec::new();
        let summary = batch.run_descriptors(&[os("plan9", &[])], &mut events);
        assert_eq!(summary.descriptors, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            events,
            vec![BatchEvent::Descriptor {
                name: "plan9".into(),
                urls: 0
            }]
        );
    }

    #[test]
    fn existing_destination_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("arch/x86_64/arch.iso");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"").unwrap();

        let batch = Batch::new(PathTemplate::default(), dir.path());
        let mut events: Vec<BatchEvent> = Vec::new();
        let summary = batch.run_descriptors(
            &[os("arch", &["http://127.0.0.1:9/arch.iso"])],
            &mut events,
        );
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            events[1],
            BatchEvent::Skipped {
                url: "http://127.0.0.1:9/arch.iso".into(),
                path: existing,
            }
        );
    }

    #[test]
    fn template_error_only_fails_that_url() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("arch/ok.iso");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"x").unwrap();

        let template = PathTemplate::parse("{{ .OS.Name }}/{{ .Base }}").unwrap();
        let batch = Batch::new(template, dir.path());
        let mut events: Vec<BatchEvent> = Vec::new();
        let summary = batch.run_descriptors(
            &[os("arch", &["http://x.example/dir/", "http://x.example/ok.iso"])],
            &mut events,
        );
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert!(matches!(
            events[1],
            BatchEvent::Failed {
                stage: Stage::Resolve,
                ..
            }
        ));
    }

    #[test]
    fn load_failures_are_reported_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let batch = Batch::new(PathTemplate::default(), dir.path());
        let source = MapSource(vec![os("alpine", &[])]);
        let mut events: Vec<BatchEvent> = Vec::new();
        let summary = batch.run(&source, &["missing", "alpine"], &mut events);
        assert_eq!(summary.load_failures, 1);
        assert_eq!(summary.descriptors, 1);
        assert!(matches!(&events[0], BatchEvent::LoadFailed { identifier, .. } if identifier == "missing"));
        assert!(matches!(&events[1], BatchEvent::Descriptor { name, .. } if name == "alpine"));
    }

    #[test]
    fn cancelled_batch_fails_remaining_urls_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let batch = Batch::new(PathTemplate::default(), dir.path()).with_cancel(cancel);
        let mut events: Vec<BatchEvent> = Vec::new();
        let summary = batch.run_descriptors(
            &[os("arch", &["http://127.0.0.1:9/a.iso", "http://127.0.0.1:9/b.iso"])],
            &mut events,
        );
        assert_eq!(summary.failed, 2);
        assert!(!dir.path().join("arch/x86_64/a.iso.download").exists());
        assert!(!dir.path().join("arch/x86_64/a.iso").exists());
    }

    #[test]
    fn from_config_rejects_bad_template() {
        let cfg = OsFetchConfig {
            destination_template: "{{ .OS.Name".to_string(),
            ..OsFetchConfig::default()
        };
        assert!(matches!(
            Batch::from_config(&cfg, "."),
            Err(TemplateError::Syntax { .. })
        ));
    }
}
