//! Handle onto the AppDir bundle being augmented.
//!
//! The handle knows the bundle layout, lists the shared libraries already
//! present, and owns the deferred operation queue that deployers feed.

pub mod deferred;
pub mod elf;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub use deferred::{DeferredOperation, DeferredQueue};
pub use elf::{ElfError, ElfInspector, LddInspector};

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No such directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Deferred operations have already been executed")]
    AlreadyFlushed,

    #[error("Failed to copy {from} to {to}: {cause}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Failed to walk {path}: {cause}")]
    Walk {
        path: PathBuf,
        #[source]
        cause: walkdir::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct AppDir {
    root: PathBuf,
    queue: DeferredQueue,
    disable_copyright_deployment: bool,
}

impl AppDir {
    /// Opens an existing AppDir. The root must already be a directory;
    /// qtdeploy augments bundles, it does not create them.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AppDirError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(AppDirError::NotADirectory { path: root });
        }
        Ok(Self {
            root,
            queue: DeferredQueue::new(),
            disable_copyright_deployment: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The licensing-file deployment belongs to the outer bundling tool;
    /// qtdeploy only records the toggle so the bundle state is explicit.
    pub fn set_disable_copyright_deployment(&mut self, disable: bool) {
        if disable {
            warn!("Copyright files deployment disabled");
        }
        self.disable_copyright_deployment = disable;
    }

    pub fn disable_copyright_deployment(&self) -> bool {
        self.disable_copyright_deployment
    }

    // Bundle layout. Qt resources are relocated under usr/ so that qt.conf
    // can address them relative to the main binaries.

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("usr/bin")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("usr/lib")
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join("usr/plugins")
    }

    pub fn qml_dir(&self) -> PathBuf {
        self.root.join("usr/qml")
    }

    pub fn translations_dir(&self) -> PathBuf {
        self.root.join("usr/translations")
    }

    pub fn libexec_dir(&self) -> PathBuf {
        self.root.join("usr/libexec")
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.root.join("usr/resources")
    }

    pub fn hooks_dir(&self) -> PathBuf {
        self.root.join("apprun-hooks")
    }

    /// Lists every shared object bundled under the AppDir root, sorted for
    /// deterministic processing.
    pub fn list_shared_libraries(&self) -> Vec<PathBuf> {
        let mut libraries = Vec::new();
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if is_shared_object(&name) {
                libraries.push(entry.into_path());
            }
        }
        debug!("Found {} shared libraries in bundle", libraries.len());
        libraries
    }

    // Deferred operation requests.

    pub fn request_copy(&mut self, from: PathBuf, to: PathBuf) {
        self.queue.request(DeferredOperation::CopyFile { from, to });
    }

    pub fn request_copy_tree(&mut self, from: PathBuf, to: PathBuf) {
        self.queue.request(DeferredOperation::CopyTree { from, to });
    }

    pub fn request_executable(&mut self, from: PathBuf, to: PathBuf) {
        self.queue
            .request(DeferredOperation::CopyExecutable { from, to });
    }

    pub fn pending_operations(&self) -> &[DeferredOperation] {
        self.queue.operations()
    }

    pub fn is_flushed(&self) -> bool {
        self.queue.is_flushed()
    }

    /// Applies the deferred queue. Valid exactly once per run.
    pub fn flush_deferred(&mut self) -> Result<usize, AppDirError> {
        self.queue.flush()
    }
}

fn is_shared_object(name: &str) -> bool {
    name.ends_with(".so") || name.contains(".so.")
}
