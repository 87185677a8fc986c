//! Sequential, fail-fast execution of planned deployment actions.
//!
//! Modules are processed strictly in resolution order; the first action
//! that fails aborts the run with no rollback, leaving the deferred queue
//! unflushed. Missing optional sources (a plugin subdirectory or QML
//! import the installation simply does not ship) are skipped, not errors;
//! a missing libexec helper is a hard failure because the module cannot
//! work without it.

use std::fs;

use tracing::{debug, info};

use crate::appdir::AppDir;
use crate::deploy::planner::{DeployerAction, DeployerKind, DeployerPlanner};
use crate::deploy::resolver::ResolvedModules;
use crate::deploy::{DeployError, Result};

pub struct DeploymentExecutor<'a> {
    planner: &'a DeployerPlanner,
}

impl<'a> DeploymentExecutor<'a> {
    pub fn new(planner: &'a DeployerPlanner) -> Self {
        Self { planner }
    }

    pub fn execute(&self, appdir: &mut AppDir, modules: &ResolvedModules) -> Result<()> {
        for module in modules.deployment_order() {
            info!("-- Deploying module: {} --", module.name);
            for action in self.planner.plan(module) {
                apply(appdir, &action).map_err(|reason| DeployError::ModuleDeployment {
                    module: module.name.to_string(),
                    reason,
                })?;
            }
        }
        Ok(())
    }
}

fn apply(appdir: &mut AppDir, action: &DeployerAction) -> std::result::Result<(), String> {
    match &action.kind {
        DeployerKind::Plugins { subdir } => {
            if !action.source.is_dir() {
                debug!(
                    "Plugin directory {} does not exist, skipping",
                    action.source.display()
                );
                return Ok(());
            }
            let entries = fs::read_dir(&action.source)
                .map_err(|error| format!("Failed to list {}: {error}", action.source.display()))?;
            for entry in entries {
                let entry = entry
                    .map_err(|error| format!("Failed to list {}: {error}", action.source.display()))?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if !name.contains(".so") {
                    continue;
                }
                debug!("Deploying {} plugin {}", subdir, name);
                appdir.request_copy(entry.path(), action.destination.join(name.as_ref()));
            }
            Ok(())
        }

        DeployerKind::QmlImports { dir } => {
            if !action.source.is_dir() {
                debug!(
                    "QML import {} does not exist, skipping",
                    action.source.display()
                );
                return Ok(());
            }
            debug!("Deploying QML import {}", dir);
            appdir.request_copy_tree(action.source.clone(), action.destination.clone());
            Ok(())
        }

        DeployerKind::Libexec { helper } => {
            if !action.source.is_file() {
                return Err(format!(
                    "Helper {} not found at {}",
                    helper,
                    action.source.display()
                ));
            }
            debug!("Deploying helper executable {}", helper);
            appdir.request_executable(action.source.clone(), action.destination.clone());
            Ok(())
        }

        DeployerKind::DataResources { subdir } => {
            if !action.source.is_dir() {
                debug!(
                    "Resource directory {} does not exist, skipping",
                    action.source.display()
                );
                return Ok(());
            }
            debug!("Deploying resource directory {}", subdir);
            appdir.request_copy_tree(action.source.clone(), action.destination.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_module;
    use crate::qt::QtPaths;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn qt_paths(root: &Path) -> QtPaths {
        let vars: BTreeMap<String, String> = [
            ("QT_INSTALL_PLUGINS", root.join("plugins")),
            ("QT_INSTALL_LIBEXECS", root.join("libexec")),
            ("QT_INSTALL_DATA", root.to_path_buf()),
            ("QT_INSTALL_TRANSLATIONS", root.join("translations")),
            ("QT_INSTALL_BINS", root.join("bin")),
            ("QT_INSTALL_LIBS", root.join("lib")),
            ("QT_INSTALL_QML", root.join("qml")),
        ]
        .iter()
        .map(|(key, value)| (key.to_string(), value.display().to_string()))
        .collect();
        QtPaths::from_query(&vars).unwrap()
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"stub").unwrap();
    }

    #[test]
    fn test_plugin_files_are_requested() {
        let qt = tempfile::tempdir().unwrap();
        let bundle = tempfile::tempdir().unwrap();
        touch(&qt.path().join("plugins/sqldrivers/libqsqlite.so"));
        touch(&qt.path().join("plugins/sqldrivers/README"));

        let mut appdir = AppDir::open(bundle.path()).unwrap();
        let paths = qt_paths(qt.path());
        let planner = DeployerPlanner::new(&paths, &appdir);
        let executor = DeploymentExecutor::new(&planner);

        let modules = ResolvedModules {
            found: vec![],
            extra: vec![find_module("sqlite").unwrap()],
        };
        executor.execute(&mut appdir, &modules).unwrap();

        let destinations: Vec<String> = appdir
            .pending_operations()
            .iter()
            .map(|operation| operation.destination().display().to_string())
            .collect();
        assert_eq!(destinations.len(), 1);
        assert!(destinations[0].ends_with("usr/plugins/sqldrivers/libqsqlite.so"));
    }

    #[test]
    fn test_missing_plugin_directory_is_skipped() {
        let qt = tempfile::tempdir().unwrap();
        let bundle = tempfile::tempdir().unwrap();

        let mut appdir = AppDir::open(bundle.path()).unwrap();
        let paths = qt_paths(qt.path());
        let planner = DeployerPlanner::new(&paths, &appdir);
        let executor = DeploymentExecutor::new(&planner);

        let modules = ResolvedModules {
            found: vec![find_module("gui").unwrap()],
            extra: vec![],
        };
        executor.execute(&mut appdir, &modules).unwrap();
        assert!(appdir.pending_operations().is_empty());
    }

    #[test]
    fn test_missing_helper_fails_the_module() {
        let qt = tempfile::tempdir().unwrap();
        let bundle = tempfile::tempdir().unwrap();

        let mut appdir = AppDir::open(bundle.path()).unwrap();
        let paths = qt_paths(qt.path());
        let planner = DeployerPlanner::new(&paths, &appdir);
        let executor = DeploymentExecutor::new(&planner);

        let modules = ResolvedModules {
            found: vec![],
            extra: vec![find_module("webenginecore").unwrap()],
        };
        let error = executor.execute(&mut appdir, &modules).unwrap_err();
        match error {
            DeployError::ModuleDeployment { module, .. } => assert_eq!(module, "webenginecore"),
            other => panic!("expected ModuleDeployment, got {other:?}"),
        }
    }

    #[test]
    fn test_failure_aborts_before_later_modules() {
        let qt = tempfile::tempdir().unwrap();
        let bundle = tempfile::tempdir().unwrap();
        // webenginecore will fail (no helper); widgets would deploy this.
        touch(&qt.path().join("plugins/styles/libqcleanlooks.so"));

        let mut appdir = AppDir::open(bundle.path()).unwrap();
        let paths = qt_paths(qt.path());
        let planner = DeployerPlanner::new(&paths, &appdir);
        let executor = DeploymentExecutor::new(&planner);

        let modules = ResolvedModules {
            found: vec![],
            extra: vec![
                find_module("webenginecore").unwrap(),
                find_module("widgets").unwrap(),
            ],
        };
        assert!(executor.execute(&mut appdir, &modules).is_err());

        // Nothing from the widgets module was requested and nothing was
        // applied to the bundle.
        assert!(appdir.pending_operations().is_empty());
        assert!(!appdir.is_flushed());
        assert!(!bundle.path().join("usr/plugins/styles").exists());
    }

    #[test]
    fn test_repeat_deployment_is_harmless() {
        let qt = tempfile::tempdir().unwrap();
        let bundle = tempfile::tempdir().unwrap();
        touch(&qt.path().join("plugins/sqldrivers/libqsqlite.so"));

        let mut appdir = AppDir::open(bundle.path()).unwrap();
        let paths = qt_paths(qt.path());
        let planner = DeployerPlanner::new(&paths, &appdir);
        let executor = DeploymentExecutor::new(&planner);

        let module = find_module("sqlite").unwrap();
        let modules = ResolvedModules {
            found: vec![module],
            extra: vec![module],
        };
        executor.execute(&mut appdir, &modules).unwrap();

        // Both passes requested the same destination; the queue collapsed
        // them into one pending operation.
        assert_eq!(appdir.pending_operations().len(), 1);
    }
}
