//! Overlay the immediate children of a source directory onto a working tree.
//!
//! Same-named entries in the destination are removed before copying, so a
//! directory is replaced wholesale rather than merged.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::warn;

use crate::error::PropagateError;

/// Entry that is never propagated; copying it would clobber the repository.
const GIT_DIR: &str = ".git";

/// Copy every immediate child of `source` into `dest`, replacing existing
/// entries of the same name. Returns the names that were copied, sorted.
pub fn overlay_entries(source: &Path, dest: &Path) -> Result<Vec<String>, PropagateError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(source).map_err(|e| PropagateError::copy(source, e))? {
        let entry = entry.map_err(|e| PropagateError::copy(source, e))?;
        names.push(entry.file_name());
    }
    names.sort();
    let source_real = source
        .canonicalize()
        .map_err(|e| PropagateError::copy(source, e))?;

    let mut copied = Vec::with_capacity(names.len());
    for name in names {
        if name == GIT_DIR {
            warn!("Skipping {} in {}", GIT_DIR, source.display());
            continue;
        }

        let from = source.join(&name);
        let to = dest.join(&name);

        // Removing the destination would delete the source itself
        if real_path(&to).is_some_and(|to_real| source_real.starts_with(to_real)) {
            warn!("Skipping {}: it contains {}", to.display(), source.display());
            continue;
        }
        if links_to_ancestor(&from) {
            warn!("Skipping {}: it links to one of its parents", from.display());
            continue;
        }

        remove_path(&to)?;
        copy_path(&from, &to)?;

        debug!("Copied {} to {}", from.display(), to.display());
        copied.push(name.to_string_lossy().into_owned());
    }

    Ok(copied)
}

/// Remove `path` if it exists, recursing into directories. Symlinks are
/// removed, never followed.
pub fn remove_path(path: &Path) -> Result<(), PropagateError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(PropagateError::copy(path, e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| PropagateError::copy(path, e))
}

/// Copy a file or directory tree, keeping permissions and modification times
/// where the platform allows it.
pub fn copy_path(from: &Path, to: &Path) -> Result<(), PropagateError> {
    let metadata = fs::metadata(from).map_err(|e| PropagateError::copy(from, e))?;

    if metadata.is_dir() {
        fs::create_dir(to).map_err(|e| PropagateError::copy(to, e))?;
        for entry in fs::read_dir(from).map_err(|e| PropagateError::copy(from, e))? {
            let entry = entry.map_err(|e| PropagateError::copy(from, e))?;
            let path = entry.path();
            if links_to_ancestor(&path) {
                warn!("Skipping {}: it links to one of its parents", path.display());
                continue;
            }
            copy_path(&path, &to.join(entry.file_name()))?;
        }
        fs::set_permissions(to, metadata.permissions())
            .map_err(|e| PropagateError::copy(to, e))?;
    } else {
        // fs::copy carries the permission bits over
        fs::copy(from, to).map_err(|e| PropagateError::copy(from, e))?;
    }

    if let Ok(modified) = metadata.modified() {
        let result = fs::File::open(to).and_then(|file| file.set_modified(modified));
        if let Err(e) = result {
            debug!("Could not preserve mtime on {}: {}", to.display(), e);
        }
    }

    Ok(())
}

fn real_path(path: &Path) -> Option<PathBuf> {
    path.canonicalize().ok()
}

/// Whether `path` is a symlink to a directory that contains it. Following
/// such a link copies the same tree into itself forever.
fn links_to_ancestor(path: &Path) -> bool {
    let is_link = fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink());
    if !is_link {
        return false;
    }
    let Some(target) = real_path(path).filter(|t| t.is_dir()) else {
        return false;
    };
    path.parent()
        .and_then(real_path)
        .is_some_and(|parent| parent.starts_with(&target))
}
