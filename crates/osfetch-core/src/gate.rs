//! Skip-if-exists check for destination paths.

use std::path::Path;

/// Returns true if anything exists at `path` (symlinks followed).
///
/// This is a presence check only: a truncated or wrong file still counts as
/// downloaded. Any stat failure other than "found" yields `false`, so the
/// caller goes on to attempt the download.
pub fn exists(path: &Path) -> bool {
    match path.try_exists() {
        Ok(found) => found,
        Err(e) => {
            tracing::debug!("cannot stat {}: {}; treating as absent", path.display(), e);
            false
        }
    }
}
