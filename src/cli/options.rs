use clap::Parser;
use std::path::PathBuf;

/// Deploys Qt plugins, QML imports and translations into an existing AppDir.
#[derive(Debug, Parser)]
#[command(name = "qtdeploy")]
#[command(about = "Deploys Qt resources into an existing AppDir bundle")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct QtDeployCli {
    /// Root of the AppDir bundle to augment
    #[arg(long)]
    pub appdir: Option<PathBuf>,

    /// Deploy an additional Qt module; accepts a module name, a library
    /// filename, or a path to a library
    #[arg(short = 'p', long = "extra-plugin")]
    pub extra_plugin: Vec<String>,

    /// Print the plugin protocol type and exit
    #[arg(long)]
    pub plugin_type: bool,

    /// Print the plugin API version and exit
    #[arg(long)]
    pub plugin_api_version: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
