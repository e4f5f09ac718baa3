use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Writes `bytes` to `dir/file_name` through a temp file in the same
/// directory, renamed over the target once fully written. A failure at any
/// point leaves an existing target untouched.
pub fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(Error::MissingOutputDir(dir.to_path_buf()));
    }

    let target = dir.join(file_name);
    let write_err = |source| Error::Write {
        path: target.clone(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".archdiagram-")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    if let Some(permissions) = target_permissions(&target) {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;

    tracing::debug!(path = %target.display(), bytes = bytes.len(), "output written");
    Ok(target)
}

/// Temp files are created owner-only. Keep the mode of a file being replaced,
/// and give new files the usual world-readable mode.
fn target_permissions(target: &Path) -> Option<fs::Permissions> {
    if let Ok(meta) = fs::metadata(target) {
        return Some(meta.permissions());
    }
    default_permissions()
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
