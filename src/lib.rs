//! qtdeploy - Qt resource deployment for AppDir bundles
//!
//! This crate discovers which Qt modules an already-assembled AppDir uses,
//! plans the plugin, QML import, libexec and translation deployments those
//! modules require, and applies them against a discovered Qt installation.

pub mod appdir;
pub mod catalog;
pub mod cli;
pub mod deploy;
pub mod qt;

pub use deploy::{DeployError, DeployOptions};
