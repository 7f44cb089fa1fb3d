use crate::cli::ConformersArgs;
use crate::config::{CommandOverrides, PartialPipelineConfig};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use autoreact::engine::invoker::ProcessEngine;
use autoreact::engine::progress::ProgressReporter;
use autoreact::workflows::conformers::{self, ConformerInputs};
use tracing::info;

pub fn run(args: ConformersArgs) -> Result<()> {
    let partial_config = PartialPipelineConfig::load(args.options.config.as_deref())?;
    let max_conformers = if args.all_conformers {
        Some(None)
    } else {
        args.max_conformers.map(Some)
    };
    let config = partial_config.merge_with_cli(
        &args.options,
        CommandOverrides {
            crest: args.crest.clone(),
            max_conformers,
            propagate: args.propagate.clone(),
            ..Default::default()
        },
    )?;

    let inputs = ConformerInputs {
        structure: args.dir.join(&args.molecule),
        active_atoms: args.dir.join(&args.active_atoms),
        constraints: args.dir.join(&args.constraints),
    };

    let engine = ProcessEngine::new(config.executables.conformer_search.clone())
        .with_args(conformers::search_arguments(&config));
    info!(
        "Conformer search via {:?} with {} processors.",
        engine.program(),
        config.chemistry.processors
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting conformer search for {}...", inputs.structure.display());
    let report = conformers::run(&args.dir, &inputs, &config, &engine, &reporter)?;

    println!(
        "Prepared {} conformation directories; listing in {}",
        report.directories.len(),
        report.path_list.display()
    );
    Ok(())
}
