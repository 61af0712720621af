//! CLI for osfetch.

mod console;

use anyhow::{Context, Result};
use clap::Parser;
use osfetch_core::cancel::CancelToken;
use osfetch_core::config;
use osfetch_core::events::{Tee, TracingSink};
use osfetch_core::{Batch, FileMetadataSource};
use std::path::PathBuf;
use std::time::Duration;

use console::ConsoleSink;

/// Fetch operating-system installation artifacts into a template-driven layout.
#[derive(Debug, Parser)]
#[command(name = "osfetch")]
#[command(
    about = "osfetch: download OS installation artifacts described by descriptor files",
    long_about = None
)]
pub struct Cli {
    /// Descriptor files (TOML or JSON), processed in order.
    #[arg(required = true, value_name = "DESCRIPTOR")]
    pub descriptors: Vec<String>,

    /// Root directory for downloads (default: config `output_dir`, else the current directory).
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cancel downloads still running after SECS seconds.
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        Cli::parse().run()
    }

    /// Run the batch. Partial failure still returns Ok; only startup errors are Err.
    pub fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        let output_dir = match self.output_dir.or_else(|| cfg.output_dir.clone()) {
            Some(dir) => dir,
            None => std::env::current_dir().context("resolve current directory")?,
        };
        let mut batch = Batch::from_config(&cfg, output_dir)
            .with_context(|| format!("invalid destination_template {:?}", cfg.destination_template))?;

        if let Some(secs) = self.deadline {
            let token = CancelToken::new();
            token.cancel_after(Duration::from_secs(secs));
            batch = batch.with_cancel(token);
        }

        tracing::info!(
            descriptors = self.descriptors.len(),
            "fetching into {}",
            batch.output_dir().display()
        );
        let mut sink = Tee(ConsoleSink::stdout(), TracingSink);
        let summary = batch.run(&FileMetadataSource::new(), self.descriptors.as_slice(), &mut sink);
        tracing::debug!("summary: {:?}", summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
