//! devup-coordinator: a build coordination service for devup-ui.
//!
//! One long-lived coordinator process owns the style registry; bundler
//! workers hand it source files over loopback HTTP and fall back to local
//! extraction when it is not running.

mod cli;
mod client;
mod config;
mod coordinator;
mod logger;
mod output;
mod pipeline;
mod registry;
mod shutdown;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::DevupConfig;
use coordinator::CssQuery;
use std::sync::Arc;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    shutdown::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Arc::new(DevupConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(config),
        Commands::Extract {
            file,
            resource_path,
            no_fallback,
        } => cli::extract::extract_file(&config, file, resource_path.as_deref(), *no_fallback),
        Commands::Css {
            file_num,
            import_main_css,
            wait,
        } => cli::css::print_css(
            &config,
            CssQuery {
                file_num: *file_num,
                import_main_css: *import_main_css,
                wait_for_idle: *wait,
            },
        ),
        Commands::Health => {
            if !cli::health::check(&config) {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
