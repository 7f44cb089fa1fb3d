use crate::cli::RunArgs;
use crate::config::{CommandOverrides, PartialPipelineConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use autoreact::engine::invoker::ProcessEngine;
use autoreact::engine::progress::ProgressReporter;
use autoreact::workflows::reaction_path::{self, InputLocations, PipelineInputs, ReactionPathReport};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SUMMARY_FILE: &str = "pipeline_summary.toml";

pub fn run(args: RunArgs) -> Result<()> {
    let partial_config = PartialPipelineConfig::load(args.options.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(
        &args.options,
        CommandOverrides {
            scan_target: args.scan_target,
            scan_steps: args.scan_steps,
            orca: args.orca.clone(),
            ..Default::default()
        },
    )?;

    let locations = InputLocations {
        active_atoms: args.active_atoms.clone(),
        constraints: args.constraints.clone(),
        precomplex: args.precomplex.clone(),
    };
    let inputs = PipelineInputs::discover(&args.dir, &locations)?;
    info!("Precomplex: {:?}", inputs.precomplex);

    let engine = ProcessEngine::new(config.executables.quantum_chemistry.clone());
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting reaction-path pipeline for {}...",
        inputs.precomplex.display()
    );
    let report = reaction_path::run(&args.dir, &inputs, &config, &engine, &reporter)?;

    for endpoint in &report.endpoints {
        println!(
            "  {} -> {} ({:.3} Å), optimized in {}",
            endpoint.endpoint,
            endpoint.class,
            endpoint.distance,
            endpoint.directory.display()
        );
    }
    for skipped in &report.skipped_single_points {
        println!(
            "  Skipped {}: no endpoint landed in that branch.",
            skipped.definition().name
        );
    }

    let summary_path = write_summary(&args.dir, &report)?;
    println!("Summary written to {}", summary_path.display());
    Ok(())
}

fn write_summary(dir: &Path, report: &ReactionPathReport) -> Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    let content = toml::to_string(report).map_err(|e| CliError::FileParsing {
        path: path.clone(),
        source: e.into(),
    })?;
    std::fs::write(&path, content)?;
    Ok(path)
}
