//! Descriptor files on disk (TOML or JSON).

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{MetadataError, MetadataSource, OsDescriptor};

/// Concrete descriptor as stored in a descriptor file.
///
/// Unknown keys are ignored so richer descriptor formats still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub name: String,
    #[serde(default)]
    pub release: Option<String>,
    pub architecture: String,
    #[serde(default, alias = "urls")]
    pub download_urls: Vec<String>,
}

impl OsDescriptor for OperatingSystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&self) -> Option<&str> {
        self.release.as_deref().filter(|r| !r.is_empty())
    }

    fn architecture(&self) -> &str {
        &self.architecture
    }

    fn download_urls(&self) -> &[String] {
        &self.download_urls
    }
}

/// Serialization format of a descriptor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Toml,
    Json,
}

impl DescriptorFormat {
    /// Picks the format from the file extension: `.toml` is TOML, anything else JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => DescriptorFormat::Toml,
            _ => DescriptorFormat::Json,
        }
    }

    fn parse(self, data: &str) -> Result<OperatingSystem, String> {
        match self {
            DescriptorFormat::Toml => toml::from_str(data).map_err(|e| e.to_string()),
            DescriptorFormat::Json => serde_json::from_str(data).map_err(|e| e.to_string()),
        }
    }
}

/// Metadata source that treats each identifier as a path to a descriptor file.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetadataSource {
    format: Option<DescriptorFormat>,
}

impl FileMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a format instead of guessing from the extension.
    pub fn with_format(format: DescriptorFormat) -> Self {
        Self {
            format: Some(format),
        }
    }
}

impl MetadataSource for FileMetadataSource {
    type Descriptor = OperatingSystem;

    fn load(&self, identifier: &str) -> Result<OperatingSystem, MetadataError> {
        let path = Path::new(identifier);
        let data = std::fs::read_to_string(path).map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let format = self.format.unwrap_or_else(|| DescriptorFormat::from_path(path));
        let os = format.parse(&data).map_err(|message| MetadataError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        if os.name.trim().is_empty() {
            return Err(MetadataError::Invalid {
                path: path.to_path_buf(),
                reason: "name is empty",
            });
        }
        if os.architecture.trim().is_empty() {
            return Err(MetadataError::Invalid {
                path: path.to_path_buf(),
                reason: "architecture is empty",
            });
        }
        tracing::debug!(
            name = %os.name,
            urls = os.download_urls.len(),
            "loaded descriptor {}",
            path.display()
        );
        Ok(os)
    }
}
