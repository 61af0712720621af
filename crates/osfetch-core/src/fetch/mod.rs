//! Atomic fetch-to-disk.
//!
//! `fetch` downloads one URL into `<dest>.download` and renames it to `<dest>`
//! only after a complete 200 response. A stale temp file from an interrupted
//! run is removed first and never resumed. On every failure path the temp
//! file is deleted (see `storage::TempFile`), so observers of `<dest>` only
//! ever see it absent or complete.

mod transfer;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::events::Stage;
use crate::storage::{self, TempFile};
use transfer::TransferError;

/// libcurl knobs for one GET. Defaults: no timeouts, 10 redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub connect_timeout: Option<Duration>,
    pub timeout: Option<Duration>,
    pub max_redirections: u32,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            timeout: None,
            max_redirections: 10,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("error creating directory for {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error creating file {}: {source}", .path.display())]
    CreateTemp {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("error downloading file {url:?}: {source}")]
    Transfer {
        url: String,
        #[source]
        source: curl::Error,
    },

    #[error("error downloading file {url:?}: HTTP status {code}")]
    HttpStatus { url: String, code: u32 },

    #[error("error saving file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("download of {url:?} cancelled")]
    Cancelled { url: String },

    #[error("error renaming {} to {}: {source}", .from.display(), .to.display())]
    Commit {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    /// Pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            FetchError::CreateDir { .. } => Stage::CreateDir,
            FetchError::Commit { .. } => Stage::Commit,
            FetchError::CreateTemp { .. }
            | FetchError::InvalidUrl { .. }
            | FetchError::Transfer { .. }
            | FetchError::HttpStatus { .. }
            | FetchError::Write { .. }
            | FetchError::Cancelled { .. } => Stage::Transfer,
        }
    }
}

/// Create the parent directory of `destination`.
pub fn ensure_parent_dir(destination: &Path) -> Result<(), FetchError> {
    storage::ensure_parent_dir(destination).map_err(|source| FetchError::CreateDir {
        path: destination.to_path_buf(),
        source,
    })
}

/// Only plain http/https URLs are fetched.
fn validate_url(url: &str) -> Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}

/// Download `url` to `destination` atomically. Returns bytes written.
///
/// No retries: any failure is final for this call.
pub fn fetch(
    url: &str,
    destination: &Path,
    opts: &FetchOptions,
    cancel: Option<&CancelToken>,
) -> Result<u64, FetchError> {
    ensure_parent_dir(destination)?;
    validate_url(url)?;

    let temp_path = storage::temp_path(destination);
    if storage::remove_stale(&temp_path).map_err(|source| FetchError::CreateTemp {
        path: temp_path.clone(),
        source,
    })? {
        tracing::debug!("removed stale temp file {}", temp_path.display());
    }

    let mut temp = TempFile::create(&temp_path).map_err(|source| FetchError::CreateTemp {
        path: temp_path.clone(),
        source,
    })?;

    tracing::debug!(url = %url, "GET -> {}", temp_path.display());
    let written = transfer::http_get(url, opts, cancel, &mut temp).map_err(|e| match e {
        TransferError::Curl(source) => FetchError::Transfer {
            url: url.to_string(),
            source,
        },
        TransferError::HttpStatus(code) => FetchError::HttpStatus {
            url: url.to_string(),
            code,
        },
        TransferError::Write(source) => FetchError::Write {
            path: temp_path.clone(),
            source,
        },
        TransferError::Cancelled => FetchError::Cancelled {
            url: url.to_string(),
        },
    })?;

    temp.sync().map_err(|source| FetchError::Write {
        path: temp_path.clone(),
        source,
    })?;
    temp.commit(destination).map_err(|source| FetchError::Commit {
        from: temp_path.clone(),
        to: destination.to_path_buf(),
        source,
    })?;

    tracing::debug!(url = %url, bytes = written, "committed {}", destination.display());
    Ok(written)
}
