//! Discovery of the Qt installation: locating qmake, querying it for the
//! installation layout, and carrying the augmented search paths handed to
//! external tools.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Candidate binary names searched on PATH, in priority order.
const QMAKE_CANDIDATES: &[&str] = &["qmake-qt5", "qmake"];

pub const QT_INSTALL_PLUGINS: &str = "QT_INSTALL_PLUGINS";
pub const QT_INSTALL_LIBEXECS: &str = "QT_INSTALL_LIBEXECS";
pub const QT_INSTALL_DATA: &str = "QT_INSTALL_DATA";
pub const QT_INSTALL_TRANSLATIONS: &str = "QT_INSTALL_TRANSLATIONS";
pub const QT_INSTALL_BINS: &str = "QT_INSTALL_BINS";
pub const QT_INSTALL_LIBS: &str = "QT_INSTALL_LIBS";
pub const QT_INSTALL_QML: &str = "QT_INSTALL_QML";

#[derive(Debug, Error)]
pub enum QmakeError {
    #[error("Could not find qmake, please install it or provide the path via $QMAKE")]
    NotFound,

    #[error("No such file or directory: {path}")]
    Missing { path: PathBuf },

    #[error("Failed to run {path}: {cause}")]
    Spawn {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Call to qmake failed: {stderr}")]
    QueryFailed { stderr: String },

    #[error("qmake -query returned no entries")]
    EmptyQuery,

    #[error("qmake -query output is missing {key}")]
    MissingKey { key: &'static str },
}

/// Search paths passed explicitly to every external-tool invocation instead
/// of mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct ToolEnv {
    pub path: String,
    pub ld_library_path: String,
}

impl ToolEnv {
    /// Captures the search paths the deploying process was started with.
    pub fn current() -> Self {
        Self {
            path: std::env::var("PATH").unwrap_or_default(),
            ld_library_path: std::env::var("LD_LIBRARY_PATH").unwrap_or_default(),
        }
    }

    /// Returns a copy with the Qt installation's lib and bin directories
    /// prepended, so tools invoked afterwards resolve the bundled Qt first.
    pub fn with_qt(&self, paths: &QtPaths) -> Self {
        Self {
            path: prepend(&paths.bins, &self.path),
            ld_library_path: prepend(&paths.libs, &self.ld_library_path),
        }
    }

    pub fn apply(&self, command: &mut Command) {
        command.env("PATH", &self.path);
        command.env("LD_LIBRARY_PATH", &self.ld_library_path);
    }
}

fn prepend(dir: &Path, existing: &str) -> String {
    if existing.is_empty() {
        dir.display().to_string()
    } else {
        format!("{}:{}", dir.display(), existing)
    }
}

/// The named installation directories deployment needs. Constructed from a
/// `qmake -query` result; construction fails on the first missing key so no
/// deployer can silently no-op against an empty path.
#[derive(Debug, Clone)]
pub struct QtPaths {
    pub plugins: PathBuf,
    pub libexecs: PathBuf,
    pub data: PathBuf,
    pub translations: PathBuf,
    pub bins: PathBuf,
    pub libs: PathBuf,
    pub qml: PathBuf,
}

impl QtPaths {
    pub fn from_query(vars: &BTreeMap<String, String>) -> Result<Self, QmakeError> {
        if vars.is_empty() {
            return Err(QmakeError::EmptyQuery);
        }

        let lookup = |key: &'static str| -> Result<PathBuf, QmakeError> {
            vars.get(key)
                .map(PathBuf::from)
                .ok_or(QmakeError::MissingKey { key })
        };

        Ok(Self {
            plugins: lookup(QT_INSTALL_PLUGINS)?,
            libexecs: lookup(QT_INSTALL_LIBEXECS)?,
            data: lookup(QT_INSTALL_DATA)?,
            translations: lookup(QT_INSTALL_TRANSLATIONS)?,
            bins: lookup(QT_INSTALL_BINS)?,
            libs: lookup(QT_INSTALL_LIBS)?,
            qml: lookup(QT_INSTALL_QML)?,
        })
    }
}

/// Resolves the qmake binary to use: an explicit override first, then the
/// candidate names on PATH in priority order.
pub fn find_qmake(override_path: Option<&Path>) -> Result<PathBuf, QmakeError> {
    if let Some(path) = override_path {
        info!("Using user specified qmake: {}", path.display());
        if !path.exists() {
            return Err(QmakeError::Missing {
                path: path.to_path_buf(),
            });
        }
        return Ok(path.to_path_buf());
    }

    for candidate in QMAKE_CANDIDATES {
        match which::which(candidate) {
            Ok(path) => {
                debug!("Found {} at {}", candidate, path.display());
                return Ok(path);
            }
            Err(error) => debug!("Lookup for {} failed: {}", candidate, error),
        }
    }

    Err(QmakeError::NotFound)
}

/// Runs `qmake -query` and parses its output into a key/value map.
pub fn query_qmake(
    qmake: &Path,
    env: &ToolEnv,
) -> Result<BTreeMap<String, String>, QmakeError> {
    let mut command = Command::new(qmake);
    command.arg("-query");
    env.apply(&mut command);

    let output = command.output().map_err(|cause| QmakeError::Spawn {
        path: qmake.to_path_buf(),
        cause,
    })?;

    if !output.status.success() {
        return Err(QmakeError::QueryFailed {
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(parse_query_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `key:value` lines; lines that do not split into exactly two
/// colon-delimited parts are silently dropped.
pub fn parse_query_output(output: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    for line in output.lines() {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != 2 {
            continue;
        }
        vars.insert(parts[0].to_string(), parts[1].to_string());
    }
    vars
}
