//! Resolution of the Qt modules in use: the bundle's library closure is
//! matched against the catalog, and explicit user tokens are matched
//! independently. The two lists are concatenated, never deduplicated
//! against each other; deployment of a module is idempotent, so a module
//! appearing in both is harmless.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::appdir::{AppDir, ElfInspector};
use crate::catalog::{matches_module, QtModule, QT_MODULES};
use crate::deploy::{DeployError, Result};

/// The ordered outcome of module resolution.
#[derive(Debug, Clone)]
pub struct ResolvedModules {
    /// Modules discovered through the bundle's library closure.
    pub found: Vec<&'static QtModule>,
    /// Modules requested explicitly via CLI flags or the environment.
    pub extra: Vec<&'static QtModule>,
}

impl ResolvedModules {
    /// Deployment order: found-list modules before extra-list modules,
    /// each sublist in catalog order.
    pub fn deployment_order(&self) -> impl Iterator<Item = &'static QtModule> + '_ {
        self.found.iter().chain(self.extra.iter()).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty() && self.extra.is_empty()
    }
}

/// Gathers the unique basenames of the bundle's shared libraries and their
/// transitive dependencies. Files the inspector cannot parse are excluded
/// from the closure; not every shared object need be a loadable image.
pub fn collect_library_names(appdir: &AppDir, inspector: &dyn ElfInspector) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for library in appdir.list_shared_libraries() {
        if let Some(name) = library.file_name().and_then(|name| name.to_str()) {
            names.insert(name.to_string());
        }
        match inspector.dynamic_dependencies(&library) {
            Ok(dependencies) => names.extend(dependencies),
            Err(error) => debug!(
                "Failed to trace dependencies of {}: {}",
                library.display(),
                error
            ),
        }
    }

    debug!(
        "Libraries to consider: {}",
        names.iter().cloned().collect::<Vec<_>>().join(" ")
    );
    names
}

/// Resolves the modules to deploy from the library closure and the two
/// explicit token sources. Fails only when nothing at all resolved.
pub fn resolve_modules(
    library_names: &BTreeSet<String>,
    cli_tokens: &[String],
    env_tokens: &[String],
) -> Result<ResolvedModules> {
    let found: Vec<&'static QtModule> = QT_MODULES
        .iter()
        .filter(|module| {
            library_names
                .iter()
                .any(|name| matches_module(name, module))
        })
        .collect();

    let mut extra = Vec::new();
    for tokens in [cli_tokens, env_tokens] {
        extra.extend(QT_MODULES.iter().filter(|module| {
            tokens.iter().any(|token| matches_module(token, module))
        }));
    }

    info!("Found Qt modules: {}", joined_names(&found));
    info!("Extra Qt modules: {}", joined_names(&extra));

    let resolved = ResolvedModules { found, extra };
    if resolved.is_empty() {
        return Err(DeployError::NoModules);
    }
    Ok(resolved)
}

fn joined_names(modules: &[&'static QtModule]) -> String {
    modules
        .iter()
        .map(|module| module.name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
}
