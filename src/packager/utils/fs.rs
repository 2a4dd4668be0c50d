//! File system utilities for packaging.
//!
//! Provides safe copy operations with automatic directory creation,
//! symlink preservation, and idempotent removal.

use crate::packager::error::{Error, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Removes the directory and its contents if it exists.
///
/// Safe to call on a path that does not exist (no-op, not an error).
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(Error::FsError {
            operation: "removing directory".to_string(),
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Copies a regular file from one path to another, creating any parent
/// directories of the destination path as necessary.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Preserves symlinks on platforms that support them. Copying into an
/// existing destination merges into it.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    copy_dir_inner(from, to, None).await
}

/// Recursively copies a directory, skipping every entry contained in
/// `exclude`.
///
/// The exclusion matches by path containment against `exclude`, not by file
/// name, so directories that merely share the excluded directory's name
/// elsewhere in the tree are still copied.
pub async fn copy_dir_excluding(from: &Path, to: &Path, exclude: &Path) -> Result<()> {
    copy_dir_inner(from, to, Some(exclude.to_path_buf())).await
}

async fn copy_dir_inner(from: &Path, to: &Path, exclude: Option<PathBuf>) -> Result<()> {
    // Validate in async context (cheap, doesn't need spawn_blocking)
    if !from.exists() {
        return Err(Error::FsError {
            operation: "copying directory".to_string(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "source does not exist"),
        });
    }
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{from:?} is not a directory")));
    }

    // Clone paths for move into blocking closure
    let from = from.to_path_buf();
    let to = to.to_path_buf();

    // Offload blocking work to dedicated thread pool
    tokio::task::spawn_blocking(move || {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut walker = walkdir::WalkDir::new(&from).into_iter();
        while let Some(entry) = walker.next() {
            let entry = entry?;
            debug_assert!(entry.path().starts_with(&from));

            if let Some(excluded) = &exclude {
                if entry.path().starts_with(excluded) {
                    if entry.file_type().is_dir() {
                        walker.skip_current_dir();
                    }
                    continue;
                }
            }

            let rel_path = entry.path().strip_prefix(&from)?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())?;
                symlink(&target, &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(dest_path)?;
            } else {
                std::fs::copy(entry.path(), dest_path)?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {}", e)))?
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}
