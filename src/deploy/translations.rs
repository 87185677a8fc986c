//! Translation deployment.
//!
//! Translations are organized by locale, not by module, so this runs once
//! after all per-module deployers: the resolved modules are reduced to
//! their translation-file prefixes and every matching `.qm` file is
//! queued. The web-engine locale set ships as its own directory and is
//! pulled in whenever the webenginecore module resolved.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::appdir::AppDir;
use crate::deploy::resolver::ResolvedModules;
use crate::deploy::{DeployError, Result};

pub fn deploy_translations(
    appdir: &mut AppDir,
    translations_path: &Path,
    modules: &ResolvedModules,
) -> Result<()> {
    if !translations_path.is_dir() {
        return Err(DeployError::Translations {
            reason: format!("No such directory: {}", translations_path.display()),
        });
    }

    let prefixes: BTreeSet<&str> = modules
        .deployment_order()
        .filter_map(|module| module.translation_file_prefix)
        .collect();

    if prefixes.is_empty() {
        debug!("No resolved module requires translations");
        return Ok(());
    }

    let entries = fs::read_dir(translations_path).map_err(|error| DeployError::Translations {
        reason: format!("Failed to list {}: {error}", translations_path.display()),
    })?;

    let mut deployed = 0;
    for entry in entries {
        let entry = entry.map_err(|error| DeployError::Translations {
            reason: format!("Failed to list {}: {error}", translations_path.display()),
        })?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.ends_with(".qm") {
            continue;
        }
        if prefixes
            .iter()
            .any(|prefix| name.starts_with(&format!("{prefix}_")))
        {
            appdir.request_copy(entry.path(), appdir.translations_dir().join(name));
            deployed += 1;
        }
    }

    if modules
        .deployment_order()
        .any(|module| module.name == "webenginecore")
    {
        let locales = translations_path.join("qtwebengine_locales");
        if locales.is_dir() {
            appdir.request_copy_tree(
                locales,
                appdir.translations_dir().join("qtwebengine_locales"),
            );
            deployed += 1;
        }
    }

    if deployed == 0 {
        return Err(DeployError::Translations {
            reason: format!(
                "No translation files found in {} for modules {}",
                translations_path.display(),
                prefixes.into_iter().collect::<Vec<_>>().join(" ")
            ),
        });
    }

    info!("Queued {} translation sets", deployed);
    Ok(())
}
