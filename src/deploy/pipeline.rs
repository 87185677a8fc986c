//! The deployment run as an explicit ordered pipeline.
//!
//! Each stage returns a tagged result; the first failure short-circuits
//! the run with its error kind intact. There are no retries and no
//! rollback: a failed run leaves the bundle partially deployed and is
//! expected to be re-run from a clean bundle.

use std::path::PathBuf;

use tracing::info;

use crate::appdir::{AppDir, LddInspector};
use crate::deploy::executor::DeploymentExecutor;
use crate::deploy::planner::DeployerPlanner;
use crate::deploy::resolver::{collect_library_names, resolve_modules};
use crate::deploy::runtime_config::{create_apprun_hook, create_qt_conf};
use crate::deploy::translations::deploy_translations;
use crate::deploy::{DeployError, Result};
use crate::qt::{find_qmake, query_qmake, QtPaths, ToolEnv};

/// Everything a deployment run needs, gathered by the CLI layer.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Root of the AppDir bundle to augment.
    pub appdir: PathBuf,
    /// Extra module tokens from repeated `-p`/`--extra-plugin` flags.
    pub extra_plugins: Vec<String>,
    /// Extra module tokens from `$EXTRA_QT_PLUGINS`, already split.
    pub env_plugins: Vec<String>,
    /// Absolute qmake path from `$QMAKE`, overriding the PATH search.
    pub qmake_override: Option<PathBuf>,
    /// Set when `$DISABLE_COPYRIGHT_FILES_DEPLOYMENT` is present.
    pub disable_copyright_deployment: bool,
}

/// Runs a full deployment against the bundle named in `options`.
pub fn run(options: &DeployOptions) -> Result<()> {
    let mut appdir = AppDir::open(&options.appdir)?;
    if options.disable_copyright_deployment {
        appdir.set_disable_copyright_deployment(true);
    }

    let qmake = find_qmake(options.qmake_override.as_deref())?;
    info!("Using qmake: {}", qmake.display());

    let base_env = ToolEnv::current();
    let vars = query_qmake(&qmake, &base_env)?;
    let qt_paths = QtPaths::from_query(&vars)?;

    // Tools launched from here on resolve the discovered Qt first; the
    // AppRun hook later makes the same augmentation permanent in-bundle.
    let tool_env = base_env.with_qt(&qt_paths);

    let inspector = LddInspector::new(tool_env);
    let library_names = collect_library_names(&appdir, &inspector);
    let modules = resolve_modules(&library_names, &options.extra_plugins, &options.env_plugins)?;

    let planner = DeployerPlanner::new(&qt_paths, &appdir);
    let executor = DeploymentExecutor::new(&planner);
    executor.execute(&mut appdir, &modules)?;

    info!("-- Deploying translations --");
    deploy_translations(&mut appdir, &qt_paths.translations, &modules)?;

    info!("-- Executing deferred operations --");
    let applied = appdir
        .flush_deferred()
        .map_err(|error| DeployError::DeferredOperations {
            reason: error.to_string(),
        })?;
    info!("Applied {} deferred operations", applied);

    info!("-- Creating qt.conf --");
    create_qt_conf(&appdir)?;

    info!("-- Creating AppRun hook --");
    create_apprun_hook(&appdir)?;

    Ok(())
}
