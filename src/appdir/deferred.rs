//! Command buffer for file operations requested during deployment.
//!
//! Deployers never touch the filesystem directly; they enqueue operations
//! here. Requests are keyed by destination, so two deployers needing the
//! same file collapse into a single applied operation. The queue is flushed
//! exactly once per run, after all modules have been processed.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::AppDirError;

/// A queued filesystem change, applied at flush time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredOperation {
    /// Copy a single file.
    CopyFile { from: PathBuf, to: PathBuf },
    /// Copy a directory tree recursively.
    CopyTree { from: PathBuf, to: PathBuf },
    /// Copy a single file and mark it executable.
    CopyExecutable { from: PathBuf, to: PathBuf },
}

impl DeferredOperation {
    pub fn destination(&self) -> &Path {
        match self {
            DeferredOperation::CopyFile { to, .. }
            | DeferredOperation::CopyTree { to, .. }
            | DeferredOperation::CopyExecutable { to, .. } => to,
        }
    }
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    operations: Vec<DeferredOperation>,
    destinations: HashSet<PathBuf>,
    flushed: bool,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues an operation. Returns false when an operation targeting the
    /// same destination is already queued; the first request wins.
    pub fn request(&mut self, operation: DeferredOperation) -> bool {
        if !self.destinations.insert(operation.destination().to_path_buf()) {
            debug!(
                "Skipping duplicate request for {}",
                operation.destination().display()
            );
            return false;
        }
        self.operations.push(operation);
        true
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    pub fn operations(&self) -> &[DeferredOperation] {
        &self.operations
    }

    /// Applies all queued operations in insertion order and returns how many
    /// were applied. Calling flush a second time is an error.
    pub fn flush(&mut self) -> Result<usize, AppDirError> {
        if self.flushed {
            return Err(AppDirError::AlreadyFlushed);
        }
        self.flushed = true;

        let mut applied = 0;
        for operation in &self.operations {
            match operation {
                DeferredOperation::CopyFile { from, to } => {
                    copy_file(from, to)?;
                    applied += 1;
                }
                DeferredOperation::CopyExecutable { from, to } => {
                    copy_file(from, to)?;
                    mark_executable(to)?;
                    applied += 1;
                }
                DeferredOperation::CopyTree { from, to } => {
                    applied += copy_tree(from, to)?;
                }
            }
        }

        Ok(applied)
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<(), AppDirError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|cause| AppDirError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            cause,
        })?;
    }
    debug!("Copying {} to {}", from.display(), to.display());
    fs::copy(from, to).map_err(|cause| AppDirError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        cause,
    })?;
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize, AppDirError> {
    let mut copied = 0;
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(|cause| AppDirError::Walk {
            path: from.to_path_buf(),
            cause,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        copy_file(entry.path(), &to.join(relative))?;
        copied += 1;
    }
    Ok(copied)
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), AppDirError> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)
        .map_err(AppDirError::Io)?
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).map_err(AppDirError::Io)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), AppDirError> {
    Ok(())
}
