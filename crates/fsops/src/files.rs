// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local filesystem operations.

use crate::FsError;
use std::fs;
use std::io::Write as _;
use std::path::Path;

/// Atomically write `content` to `path`.
///
/// Stages into a sibling temp file, fsyncs, then renames over the
/// target, so readers observe either the previous content or all of the
/// new content, never a partial mix.
pub fn write(path: &Path, content: &str) -> Result<(), FsError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| FsError::Io {
        op: "create parent directory",
        path: parent.to_path_buf(),
        source,
    })?;

    let mut staged = tempfile::NamedTempFile::new_in(parent).map_err(|source| FsError::Io {
        op: "stage temp file",
        path: parent.to_path_buf(),
        source,
    })?;
    staged
        .write_all(content.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|source| FsError::Io {
            op: "write temp file",
            path: staged.path().to_path_buf(),
            source,
        })?;
    staged
        .persist(path)
        .map_err(|e| FsError::Commit { path: path.to_path_buf(), source: e.error })?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "atomic write complete");
    Ok(())
}

/// Copy a file or recursively copy a directory.
///
/// Permission bits travel with each entry; an existing destination
/// directory is replaced.
pub fn copy(src: &Path, dst: &Path) -> Result<(), FsError> {
    if !src.exists() {
        return Err(FsError::SourceMissing { path: src.to_path_buf() });
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|source| FsError::Io {
            op: "create parent directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let pair = |source| FsError::IoPair {
        op: "copy",
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    };
    if src.is_dir() {
        if dst.exists() {
            remove(dst)?;
        }
        copy_dir(src, dst).map_err(pair)?;
    } else {
        fs::copy(src, dst).map_err(pair)?;
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Remove a file, symlink, or directory tree. Silent success if absent.
pub fn remove(path: &Path) -> Result<(), FsError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(FsError::Io { op: "stat for remove", path: path.to_path_buf(), source })
        }
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|source| FsError::Io { op: "remove", path: path.to_path_buf(), source })
}

/// Create a symlink at `dst` pointing to `src`, replacing any existing
/// entry at `dst`.
#[cfg(unix)]
pub fn link(src: &Path, dst: &Path) -> Result<(), FsError> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|source| FsError::Io {
            op: "create parent directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    remove(dst)?;
    std::os::unix::fs::symlink(src, dst).map_err(|source| FsError::IoPair {
        op: "link",
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
pub fn link(src: &Path, dst: &Path) -> Result<(), FsError> {
    Err(FsError::IoPair {
        op: "link",
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symlinks require a unix platform",
        ),
    })
}

/// Create a directory; with `create_parents`, the whole chain.
/// Idempotent: an existing directory is success.
pub fn mkdir(path: &Path, create_parents: bool) -> Result<(), FsError> {
    if path.is_dir() {
        return Ok(());
    }
    let result = if create_parents { fs::create_dir_all(path) } else { fs::create_dir(path) };
    result.map_err(|source| FsError::Io { op: "mkdir", path: path.to_path_buf(), source })
}

pub fn exists(path: &Path) -> bool {
    path.exists()
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
