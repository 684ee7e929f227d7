//! Destinations for the rendered configuration.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConvertError;

/// Writes `content` to `path`, replacing any existing file atomically.
///
/// The text goes to a temporary file in the same directory, is synced to
/// disk, then renamed over the destination, so `path` holds either its
/// previous contents or the complete new document. The temporary file is
/// removed on every failure path.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ConvertError> {
    let write_err = |source: std::io::Error| ConvertError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let temp_path = temp_path_for(path);

    // SEC-009: create_new refuses to follow a pre-planted file or symlink.
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .map_err(write_err)?;

    let written = file
        .write_all(content.as_bytes())
        .and_then(|()| file.sync_all());
    drop(file);

    if let Err(e) = written {
        let _ = std::fs::remove_file(&temp_path);
        return Err(write_err(e));
    }

    // On Windows, rename fails if destination exists, so remove it first
    #[cfg(windows)]
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(write_err(e));
        }
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(write_err(e));
    }

    tracing::info!(path = %path.display(), bytes = content.len(), "Wrote feed configuration");
    Ok(())
}

/// Writes `content` to `out` exactly as rendered, without a trailing newline.
pub fn write_stream<W: Write>(mut out: W, content: &str) -> Result<(), ConvertError> {
    let write_err = |source: std::io::Error| ConvertError::OutputWrite {
        path: PathBuf::from("<stdout>"),
        source,
    };
    out.write_all(content.as_bytes()).map_err(write_err)?;
    out.flush().map_err(write_err)
}

/// SEC-009: Randomized temp filename next to `path` to prevent TOCTOU races.
fn temp_path_for(path: &Path) -> PathBuf {
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".tmp.{:016x}", random_suffix));
    path.with_file_name(name)
}
