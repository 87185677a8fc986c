use thiserror::Error;

use crate::appdir::AppDirError;
use crate::qt::QmakeError;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Could not find Qt modules to deploy")]
    NoModules,

    #[error(transparent)]
    Qmake(#[from] QmakeError),

    #[error(transparent)]
    AppDir(#[from] AppDirError),

    #[error("Failed to deploy module {module}: {reason}")]
    ModuleDeployment { module: String, reason: String },

    #[error("Failed to deploy translations: {reason}")]
    Translations { reason: String },

    #[error("Failed to execute deferred operations: {reason}")]
    DeferredOperations { reason: String },

    #[error("Failed to create {file}: {cause}")]
    RuntimeConfig {
        file: String,
        #[source]
        cause: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DeployError>;
