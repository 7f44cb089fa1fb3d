use crate::core::io::ensemble::EnsembleSplitter;
use crate::core::models::reaction::ActiveAtomPair;
use crate::engine::config::{ConfigError, PipelineConfig};
use crate::engine::error::EngineError;
use crate::engine::invoker::ExternalEngine;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::stage::STAGE_LOG;
use crate::engine::workspace::{Workspace, WorkspaceError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

pub const SEARCH_DIRECTORY: &str = "conformer_search";
pub const CONFORMATIONS_DIRECTORY: &str = "conformations";
pub const ENSEMBLE_FILE: &str = "crest_conformers.xyz";
pub const PATH_LIST_FILE: &str = "path.txt";

const STAGE_NAME: &str = "conformer search";

/// Files that seed a conformer fan-out.
#[derive(Debug, Clone)]
pub struct ConformerInputs {
    pub structure: PathBuf,
    pub active_atoms: PathBuf,
    /// Copied into every conformation directory when the file exists.
    pub constraints: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConformerReport {
    pub ensemble: PathBuf,
    pub directories: Vec<PathBuf>,
    pub path_list: PathBuf,
}

/// Command-line arguments that follow the input structure for the conformer-search engine.
pub fn search_arguments(config: &PipelineConfig) -> Vec<String> {
    vec![
        "-opt".to_string(),
        "vtight".to_string(),
        "-gfn2".to_string(),
        "-T".to_string(),
        config.chemistry.processors.to_string(),
    ]
}

/// Runs a conformer search on `inputs.structure` and prepares one pipeline directory per
/// conformer under `root/conformations/`.
///
/// Relative propagate paths from the configuration are resolved against `root`.
#[instrument(skip_all, name = "conformer_workflow")]
pub fn run<E: ExternalEngine>(
    root: &Path,
    inputs: &ConformerInputs,
    config: &PipelineConfig,
    engine: &E,
    reporter: &ProgressReporter,
) -> Result<ConformerReport, EngineError> {
    for required in [&inputs.structure, &inputs.active_atoms] {
        if !required.is_file() {
            return Err(ConfigError::MissingInput(required.clone()).into());
        }
    }
    let record = fs::read_to_string(&inputs.active_atoms)?;
    ActiveAtomPair::parse(&record).map_err(|source| ConfigError::ActiveAtoms {
        path: inputs.active_atoms.clone(),
        source,
    })?;

    let propagate: Vec<PathBuf> = config
        .conformers
        .propagate
        .iter()
        .map(|p| root.join(p))
        .collect();
    if let Some(missing) = propagate.iter().find(|p| !p.is_file()) {
        return Err(WorkspaceError::MissingArtifact(missing.clone()).into());
    }

    let mut shared = vec![inputs.active_atoms.clone()];
    if inputs.constraints.is_file() {
        shared.push(inputs.constraints.clone());
    } else {
        info!(
            "Constraint file {:?} not found; conformations will run unconstrained.",
            inputs.constraints
        );
    }
    shared.extend(propagate);

    let workspace = Workspace::new(root);
    let structure_name = inputs
        .structure
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ConfigError::MissingInput(inputs.structure.clone()))?;
    let label = format!("conformer_search_{}", structure_name);

    reporter.report(Progress::StageStart {
        name: STAGE_NAME,
        label: label.clone(),
    });
    let search_dir = workspace.create_stage(SEARCH_DIRECTORY)?;
    let input = workspace.import_artifact(&inputs.structure, &search_dir, None)?;
    engine.run(&input, &search_dir.join(STAGE_LOG), &label)?;

    let ensemble = search_dir.join(ENSEMBLE_FILE);
    if !ensemble.is_file() {
        return Err(EngineError::MissingOutput {
            stage: STAGE_NAME,
            path: ensemble,
        });
    }
    reporter.report(Progress::StageFinish { name: STAGE_NAME });

    let conformers = EnsembleSplitter::new()
        .max_count(config.conformers.max_conformers)
        .split(&ensemble, &search_dir)?;
    if conformers.is_empty() {
        warn!("Conformer search produced no conformers.");
    }

    workspace.create_stage(CONFORMATIONS_DIRECTORY)?;
    let mut directories = Vec::with_capacity(conformers.len());
    for conformer in &conformers {
        let stem = conformer
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| WorkspaceError::MissingArtifact(conformer.clone()))?;
        let dir = workspace.create_stage(&format!("{}/{}", CONFORMATIONS_DIRECTORY, stem))?;
        workspace.import_artifact(conformer, &dir, None)?;
        for file in &shared {
            workspace.import_artifact(file, &dir, None)?;
        }
        reporter.report(Progress::Message(format!("Prepared {}", stem)));
        directories.push(dir);
    }

    let path_list = workspace.root().join(CONFORMATIONS_DIRECTORY).join(PATH_LIST_FILE);
    let listing: String = directories
        .iter()
        .map(|d| format!("{}\n", d.display()))
        .collect();
    fs::write(&path_list, listing)?;

    info!(
        "Prepared {} conformation directories; listing written to {:?}.",
        directories.len(),
        path_list
    );
    Ok(ConformerReport {
        ensemble,
        directories,
        path_list,
    })
}
