mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, Result};
use crate::utils::timing::Stopwatch;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("autoreact CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let stopwatch = Stopwatch::start();
    let (timed, command_result) = match cli.command {
        Commands::Run(args) => {
            info!("Dispatching to 'run' command.");
            (true, commands::run::run(args))
        }
        Commands::Conformers(args) => {
            info!("Dispatching to 'conformers' command.");
            (true, commands::conformers::run(args))
        }
        Commands::Split(args) => (false, commands::split::run(args)),
        Commands::Measure(args) => (false, commands::measure::run(args)),
    };

    match &command_result {
        Ok(_) => {
            info!("Command completed successfully.");
            if timed {
                println!("\n{}", stopwatch.summary());
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
        }
    }

    command_result
}
