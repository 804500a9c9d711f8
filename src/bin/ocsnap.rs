//! ocsnap CLI Binary
//!
//! Command-line interface for snapshotting and validating OpenCore config.plist files.

use anyhow::Context;
use clap::Parser;
use ocsnap::cli::{map_error, Cli, RunContext};
use ocsnap::config::{ConfigLoader, OcsnapConfig};
use ocsnap::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(1);
        }
    };

    // Initialize logging early
    let logging_config = build_logging_config(&cli, &config.logging);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("ocsnap starting");

    let context = RunContext::with_config(cli.workspace.clone(), config);
    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output.rendered);
            if !output.success {
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<OcsnapConfig> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ConfigLoader::load(&cli.workspace).with_context(|| {
            format!(
                "Failed to load configuration for workspace {}",
                cli.workspace.display()
            )
        }),
    }
}

/// Build logging configuration from CLI flags on top of the loaded config.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, base: &LoggingConfig) -> LoggingConfig {
    let mut config = base.clone();

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }

    config
}
