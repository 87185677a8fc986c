//! Maps resolved module names to concrete deployment actions.
//!
//! The per-module knowledge lives in a static rule table; adding a module
//! is a data change. The planner itself only binds rule parameters to the
//! discovered Qt installation paths and the bundle layout, it never touches
//! the filesystem.

use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;

use crate::appdir::AppDir;
use crate::catalog::QtModule;
use crate::qt::QtPaths;

/// One kind of deployment work a module can require.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployerKind {
    /// Copy every shared object under a plugin subdirectory.
    Plugins { subdir: &'static str },
    /// Copy a whole QML import directory tree.
    QmlImports { dir: &'static str },
    /// Copy a helper executable from the libexec directory.
    Libexec { helper: &'static str },
    /// Copy a resource directory from the Qt data directory.
    DataResources { subdir: &'static str },
}

const fn plugins(subdir: &'static str) -> DeployerKind {
    DeployerKind::Plugins { subdir }
}

const fn qml_imports(dir: &'static str) -> DeployerKind {
    DeployerKind::QmlImports { dir }
}

static DEPLOYER_RULES: Lazy<HashMap<&'static str, Vec<DeployerKind>>> = Lazy::new(|| {
    HashMap::from([
        (
            "gui",
            vec![
                plugins("platforms"),
                plugins("platforminputcontexts"),
                plugins("iconengines"),
                plugins("imageformats"),
                plugins("xcbglintegrations"),
            ],
        ),
        ("widgets", vec![plugins("styles"), plugins("platformthemes")]),
        ("network", vec![plugins("bearer")]),
        ("svg", vec![plugins("iconengines"), plugins("imageformats")]),
        ("sql", vec![plugins("sqldrivers")]),
        ("sqlite", vec![plugins("sqldrivers")]),
        (
            "multimedia",
            vec![plugins("mediaservice"), plugins("audio")],
        ),
        ("printsupport", vec![plugins("printsupport")]),
        ("positioning", vec![plugins("position")]),
        ("sensors", vec![plugins("sensors"), plugins("sensorgestures")]),
        ("serialbus", vec![plugins("canbus")]),
        ("location", vec![plugins("geoservices")]),
        ("texttospeech", vec![plugins("texttospeech")]),
        ("gamepad", vec![plugins("gamepads")]),
        (
            "webenginecore",
            vec![
                DeployerKind::Libexec {
                    helper: "QtWebEngineProcess",
                },
                DeployerKind::DataResources { subdir: "resources" },
            ],
        ),
        ("qml", vec![qml_imports("QtQml")]),
        ("quick", vec![qml_imports("QtQuick"), qml_imports("QtQuick.2")]),
        ("quickcontrols2", vec![qml_imports("QtQuick/Controls.2")]),
    ])
});

/// One unit of deployment work: a source inside the Qt installation bound
/// to a destination inside the bundle.
#[derive(Debug, Clone)]
pub struct DeployerAction {
    pub module: &'static str,
    pub kind: DeployerKind,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Binds the rule table to one Qt installation and one bundle.
pub struct DeployerPlanner {
    qt_plugins: PathBuf,
    qt_libexecs: PathBuf,
    qt_qml: PathBuf,
    qt_data: PathBuf,
    appdir_plugins: PathBuf,
    appdir_qml: PathBuf,
    appdir_libexec: PathBuf,
    appdir_resources: PathBuf,
}

impl DeployerPlanner {
    pub fn new(qt_paths: &QtPaths, appdir: &AppDir) -> Self {
        Self {
            qt_plugins: qt_paths.plugins.clone(),
            qt_libexecs: qt_paths.libexecs.clone(),
            qt_qml: qt_paths.qml.clone(),
            qt_data: qt_paths.data.clone(),
            appdir_plugins: appdir.plugins_dir(),
            appdir_qml: appdir.qml_dir(),
            appdir_libexec: appdir.libexec_dir(),
            appdir_resources: appdir.resources_dir(),
        }
    }

    /// Returns the action sequence for one module. Modules without an
    /// entry in the rule table are advisory and yield no actions.
    pub fn plan(&self, module: &QtModule) -> Vec<DeployerAction> {
        DEPLOYER_RULES
            .get(module.name)
            .map(|kinds| {
                kinds
                    .iter()
                    .map(|kind| self.bind(module.name, kind.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn bind(&self, module: &'static str, kind: DeployerKind) -> DeployerAction {
        let (source, destination) = match &kind {
            DeployerKind::Plugins { subdir } => (
                self.qt_plugins.join(subdir),
                self.appdir_plugins.join(subdir),
            ),
            DeployerKind::QmlImports { dir } => {
                (self.qt_qml.join(dir), self.appdir_qml.join(dir))
            }
            DeployerKind::Libexec { helper } => (
                self.qt_libexecs.join(helper),
                self.appdir_libexec.join(helper),
            ),
            DeployerKind::DataResources { subdir } => (
                self.qt_data.join(subdir),
                self.appdir_resources.clone(),
            ),
        };

        DeployerAction {
            module,
            kind,
            source,
            destination,
        }
    }
}
