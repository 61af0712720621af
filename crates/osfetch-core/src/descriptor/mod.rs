//! Operating-system descriptors and the metadata-source interface.
//!
//! The download core only depends on the `OsDescriptor` and `MetadataSource`
//! traits and does not know about any specific on-disk descriptor format.

mod file;

pub use file::{DescriptorFormat, FileMetadataSource, OperatingSystem};

use std::path::PathBuf;

/// Read-only view of one operating system and its downloadable artifacts.
pub trait OsDescriptor {
    fn name(&self) -> &str;

    /// Release string, if the descriptor has one. Empty counts as absent.
    fn release(&self) -> Option<&str>;

    fn architecture(&self) -> &str;

    /// Artifact URLs in download order. Empty means nothing to fetch.
    fn download_urls(&self) -> &[String];
}

/// Turns an identifier (e.g. a descriptor file path) into a descriptor.
pub trait MetadataSource {
    type Descriptor: OsDescriptor;

    fn load(&self, identifier: &str) -> Result<Self::Descriptor, MetadataError>;
}

/// Failure to turn an identifier into a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("failed to read descriptor {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse descriptor {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid descriptor {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: &'static str },
}
