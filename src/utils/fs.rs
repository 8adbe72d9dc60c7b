use crate::error::{Result, SetupError};
use std::io::Read;
use std::path::Path;

fn extraction_error(path: &Path, source: std::io::Error) -> SetupError {
    SetupError::ExtractionIo {
        path: path.to_path_buf(),
        source,
    }
}

/// Creates `path` (and any missing parents). Returns `false` without touching anything
/// when the final directory already exists.
pub fn create_fresh_dir(path: &Path) -> Result<bool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir_exists(parent)?;
        }
    }

    match std::fs::create_dir(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(extraction_error(path, e)),
    }
}

pub fn ensure_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| extraction_error(path, e))?;
    }
    Ok(())
}

/// Streams `reader` into a new file at `path`, creating parent directories first.
pub fn write_entry<R: Read>(reader: &mut R, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }

    let mut outfile = std::fs::File::create(path).map_err(|e| extraction_error(path, e))?;
    std::io::copy(reader, &mut outfile).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => SetupError::CorruptArchive {
            reason: format!("{}: {e}", path.display()),
        },
        _ => extraction_error(path, e),
    })?;
    Ok(())
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| extraction_error(path, e))
}
