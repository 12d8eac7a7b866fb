//! assetman - versioned asset manifests and incremental bundle compilation.

mod cli;
mod compiler;
mod config;
mod core;
mod deps;
mod freshness;
mod logger;
mod manifest;
mod utils;

use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use cli::Cli;
use cli::build::BuildOutcome;
use core::BuildError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    logger::set_verbose(cli.verbose);
    logger::set_color(match cli.color {
        ColorChoice::Always => Some(true),
        ColorChoice::Never => Some(false),
        ColorChoice::Auto => None,
    });

    // Before any worker starts, so Ctrl+C reaches the pool's token
    if let Err(e) = core::setup_shutdown_handler() {
        log!("warning"; "cannot install Ctrl+C handler: {:#}", e);
    }

    match cli::build::run(&cli) {
        Ok(BuildOutcome::UpToDate) => ExitCode::SUCCESS,
        Ok(BuildOutcome::Rebuilt { .. }) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<BuildError>() {
                Some(BuildError::NeedsRebuild) => {}
                Some(BuildError::Compile { operation, message }) => {
                    log!("error"; "{} failed", operation);
                    eprintln!("{message}");
                }
                _ => log!("error"; "{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
