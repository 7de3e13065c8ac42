//! gzip + tar extraction.

use flate2::read::GzDecoder;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("archive is empty")]
    Empty,

    #[error("cannot load archive {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot extract archive: {0}")]
    Extract(#[from] std::io::Error),
}

/// Unpack a `.tar.gz` held in memory into `dest`, returning the number of entries.
///
/// Entries that would land outside `dest` are skipped by `tar` itself.
pub fn extract_targz(bytes: &[u8], dest: &Path) -> Result<usize, ArchiveError> {
    if bytes.is_empty() {
        return Err(ArchiveError::Empty);
    }

    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    archive.set_preserve_permissions(true);

    let mut count = 0;
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.unpack_in(dest)? {
            count += 1;
        }
    }
    Ok(count)
}

/// Load `path` and unpack it into `dest`.
pub fn extract_file(path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let bytes = crate::paths::load_file(path).map_err(|source| ArchiveError::Load {
        path: path.display().to_string(),
        source,
    })?;
    extract_targz(&bytes, dest)
}
