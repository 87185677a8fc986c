//! Runtime configuration written into the bundle: a qt.conf that points
//! the bundled Qt at its relocated resources, and an AppRun hook that
//! augments the search paths when the bundle is launched. Both files are
//! regenerated deterministically, so re-running deployment is idempotent.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::appdir::AppDir;
use crate::deploy::{DeployError, Result};

const QT_CONF: &str = "\
[Paths]
Prefix = ../
Plugins = plugins
Imports = qml
Qml2Imports = qml
Translations = translations
Data = .
";

const APPRUN_HOOK: &str = "\
#!/usr/bin/env bash
# generated by qtdeploy; sourced by AppRun at launch

export LD_LIBRARY_PATH=\"$APPDIR/usr/lib:$LD_LIBRARY_PATH\"
export PATH=\"$APPDIR/usr/bin:$PATH\"
export QT_PLUGIN_PATH=\"$APPDIR/usr/plugins\"
export QML2_IMPORT_PATH=\"$APPDIR/usr/qml\"
";

pub const HOOK_FILE_NAME: &str = "qtdeploy-hook.sh";

/// Writes qt.conf next to the bundled binaries so the relocated Qt finds
/// its own plugins, QML imports and translations.
pub fn create_qt_conf(appdir: &AppDir) -> Result<()> {
    let path = appdir.bin_dir().join("qt.conf");
    write_file(&path, QT_CONF)?;
    info!("Created {}", path.display());
    Ok(())
}

/// Writes the launch hook that makes the search-path augmentation
/// permanent inside the bundle.
pub fn create_apprun_hook(appdir: &AppDir) -> Result<()> {
    let path = appdir.hooks_dir().join(HOOK_FILE_NAME);
    write_file(&path, APPRUN_HOOK)?;
    mark_executable(&path)?;
    info!("Created {}", path.display());
    Ok(())
}

fn write_file(path: &PathBuf, contents: &str) -> Result<()> {
    let file = || path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|cause| DeployError::RuntimeConfig {
            file: file(),
            cause,
        })?;
    }
    fs::write(path, contents).map_err(|cause| DeployError::RuntimeConfig {
        file: file(),
        cause,
    })
}

#[cfg(unix)]
fn mark_executable(path: &PathBuf) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let map_cause = |cause| DeployError::RuntimeConfig {
        file: path.display().to_string(),
        cause,
    };
    let mut permissions = fs::metadata(path).map_err(map_cause)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).map_err(map_cause)
}

#[cfg(not(unix))]
fn mark_executable(_path: &PathBuf) -> Result<()> {
    Ok(())
}
