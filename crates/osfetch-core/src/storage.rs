//! Disk side of a download: parent directories, the `.download` temp file,
//! and atomic promotion (rename) to the final name.
//!
//! A `TempFile` removes itself when dropped unless it was committed, so every
//! early return on the fetch path cleans up the partial artifact.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".download";

/// Mode for created directories (owner rwx, group/other rx).
pub const DIR_MODE: u32 = 0o755;

/// Path for the temp file: appends `.download` to the final path
/// (e.g. `file.iso` → `file.iso.download`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Create the parent directory of `path` (recursively). No-op if it has no parent.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir)
}

/// Remove a leftover temp file from an interrupted run. Returns whether one existed.
pub fn remove_stale(temp_path: &Path) -> io::Result<bool> {
    match fs::remove_file(temp_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// In-flight temp artifact. Deleted on drop unless `commit` succeeded.
pub struct TempFile {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    written: u64,
}

impl TempFile {
    /// Create (or truncate) the temp file at `path`.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(file)),
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush buffered data and sync the file to disk.
    pub fn sync(&mut self) -> io::Result<()> {
        if let Some(w) = self.writer.as_mut() {
            w.flush()?;
            w.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Close the file and atomically rename it to `final_path`.
    /// On failure the temp file is removed when `self` drops.
    pub fn commit(mut self, final_path: &Path) -> io::Result<()> {
        if let Some(mut w) = self.writer.take() {
            w.flush()?;
        }
        fs::rename(&self.path, final_path)?;
        // Renamed away; nothing left for Drop to clean.
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Write for TempFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let w = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "temp file already closed"))?;
        let n = w.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        drop(self.writer.take());
        if self.path.as_os_str().is_empty() {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("removed partial download {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("error deleting file {}: {}", self.path.display(), e),
        }
    }
}
