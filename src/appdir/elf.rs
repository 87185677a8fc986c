//! Shared-library dependency tracing.
//!
//! The deployment engine only needs the names of the libraries a bundled
//! binary links against; the tracing itself is delegated to the system
//! loader via `ldd`. Files the loader does not recognize are reported as
//! parse errors and excluded from the closure by the caller.

use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::qt::ToolEnv;

#[derive(Debug, Error)]
pub enum ElfError {
    #[error("Failed to run ldd on {path}: {cause}")]
    Spawn {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Not a recognizable dynamic object: {path}")]
    Unrecognized { path: PathBuf },
}

/// Resolves the transitive shared-library dependencies of a bundled binary.
pub trait ElfInspector {
    /// Returns the basenames of every shared library `library` depends on.
    fn dynamic_dependencies(&self, library: &Path) -> Result<Vec<String>, ElfError>;
}

// Matches both `libfoo.so.6 => /lib/libfoo.so.6 (0x...)` and the loader
// line `/lib64/ld-linux-x86-64.so.2 (0x...)`.
static LDD_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(\S+\.so\S*)").expect("Failed to compile ldd line pattern"));

/// Inspector backed by the system loader.
pub struct LddInspector {
    env: ToolEnv,
}

impl LddInspector {
    pub fn new(env: ToolEnv) -> Self {
        Self { env }
    }
}

impl ElfInspector for LddInspector {
    fn dynamic_dependencies(&self, library: &Path) -> Result<Vec<String>, ElfError> {
        let mut command = Command::new("ldd");
        command.arg(library);
        self.env.apply(&mut command);

        debug!("Calling ldd {}", library.display());
        let output = command.output().map_err(|cause| ElfError::Spawn {
            path: library.to_path_buf(),
            cause,
        })?;

        if !output.status.success() {
            return Err(ElfError::Unrecognized {
                path: library.to_path_buf(),
            });
        }

        Ok(parse_ldd_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn parse_ldd_output(output: &str) -> Vec<String> {
    LDD_LINE
        .captures_iter(output)
        .filter_map(|capture| {
            let token = capture.get(1)?.as_str();
            Path::new(token)
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
        })
        .collect()
}
