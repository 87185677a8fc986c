use anyhow::{Context, Result};
use clap::Parser;
use qtdeploy::cli::QtDeployCli;
use qtdeploy::deploy::{self, DeployOptions};
use std::path::PathBuf;
use tracing::info;

fn main() -> Result<()> {
    let cli = QtDeployCli::parse();

    // Host plugin protocol: answer and exit before any other processing.
    if cli.plugin_type {
        println!("input");
        return Ok(());
    }
    if cli.plugin_api_version {
        println!("0");
        return Ok(());
    }

    let verbose = cli.verbose || std::env::var_os("DEBUG").is_some();
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting qtdeploy v{}", env!("CARGO_PKG_VERSION"));

    let appdir = cli.appdir.context("--appdir is required")?;

    let options = DeployOptions {
        appdir,
        extra_plugins: cli.extra_plugin,
        env_plugins: env_plugin_tokens(),
        qmake_override: std::env::var_os("QMAKE").map(PathBuf::from),
        disable_copyright_deployment: std::env::var_os("DISABLE_COPYRIGHT_FILES_DEPLOYMENT")
            .is_some(),
    };

    deploy::run(&options)?;

    info!("Deployment finished");
    Ok(())
}

/// `$EXTRA_QT_PLUGINS` carries additional module tokens, semicolon-separated,
/// matched as a second token source independent of the `-p` flags.
fn env_plugin_tokens() -> Vec<String> {
    std::env::var("EXTRA_QT_PLUGINS")
        .map(|value| {
            value
                .split(';')
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
