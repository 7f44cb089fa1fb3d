use crate::core::io::traits::StructureFile;
use crate::core::io::xyz::XyzFile;
use crate::core::models::reaction::{ActiveAtomPair, ConstraintSet};
use crate::core::utils::geometry::{EndpointClass, active_distance, atom_distance};
use crate::engine::config::{ConfigError, PipelineConfig};
use crate::engine::decks::InputDeck;
use crate::engine::error::EngineError;
use crate::engine::invoker::ExternalEngine;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::stage::{
    IRC_BACKWARD_XYZ, IRC_FORWARD_XYZ, NEB_END_XYZ, NEB_START_XYZ, NEB_TS_GUESS_XYZ,
    OPTIMIZED_XYZ, SCAN_XYZ, STAGE_LOG, Stage, StageInput, StageKind, TS_XYZ,
};
use crate::engine::workspace::Workspace;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_ACTIVE_ATOMS_FILE: &str = "act_atom.txt";
pub const DEFAULT_CONSTRAINTS_FILE: &str = "constrain";

/// Where the pipeline inputs live, relative to the run directory unless absolute.
#[derive(Debug, Clone)]
pub struct InputLocations {
    pub active_atoms: PathBuf,
    pub constraints: PathBuf,
    /// Explicit precomplex; when `None` the single `conf*.xyz` of the run directory is used.
    pub precomplex: Option<PathBuf>,
}

impl Default for InputLocations {
    fn default() -> Self {
        Self {
            active_atoms: PathBuf::from(DEFAULT_ACTIVE_ATOMS_FILE),
            constraints: PathBuf::from(DEFAULT_CONSTRAINTS_FILE),
            precomplex: None,
        }
    }
}

/// Everything a pipeline run needs besides the configuration.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub precomplex: PathBuf,
    pub active_atoms: ActiveAtomPair,
    pub constraints: ConstraintSet,
}

impl PipelineInputs {
    /// Reads the active-atom record and the optional constraint file, and locates the
    /// precomplex, all relative to `dir`.
    pub fn discover(dir: &Path, locations: &InputLocations) -> Result<Self, EngineError> {
        let active_path = dir.join(&locations.active_atoms);
        if !active_path.is_file() {
            return Err(ConfigError::MissingInput(active_path).into());
        }
        let record = fs::read_to_string(&active_path)?;
        let active_atoms =
            ActiveAtomPair::parse(&record).map_err(|source| ConfigError::ActiveAtoms {
                path: active_path.clone(),
                source,
            })?;
        info!("Active atoms: {} (from {:?})", active_atoms, active_path);

        let constraints = ConstraintSet::load_optional(&dir.join(&locations.constraints))?;

        let precomplex = match &locations.precomplex {
            Some(path) => {
                let path = dir.join(path);
                if !path.is_file() {
                    return Err(ConfigError::MissingInput(path).into());
                }
                path
            }
            None => locate_precomplex(dir)?,
        };

        Ok(Self {
            precomplex,
            active_atoms,
            constraints,
        })
    }
}

/// Finds the single `conf*.xyz` structure in `dir`.
pub fn locate_precomplex(dir: &Path) -> Result<PathBuf, ConfigError> {
    let entries = fs::read_dir(dir).map_err(|_| ConfigError::MissingPrecomplex(dir.to_path_buf()))?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("conf") && n.ends_with(".xyz"))
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(ConfigError::MissingPrecomplex(dir.to_path_buf())),
        1 => Ok(candidates.remove(0)),
        _ => Err(ConfigError::AmbiguousPrecomplex(candidates)),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: StageKind,
    pub label: String,
    pub directory: PathBuf,
    pub exit_code: i32,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedEndpoint {
    pub endpoint: String,
    pub distance: f64,
    pub class: EndpointClass,
    /// Directory of the optimization this endpoint was sent to.
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionPathReport {
    pub precomplex: PathBuf,
    pub active_atoms: [usize; 2],
    /// Branch single points not run because no endpoint was classified into the branch.
    pub skipped_single_points: Vec<StageKind>,
    pub stages: Vec<StageRecord>,
    pub endpoints: Vec<ClassifiedEndpoint>,
}

struct Pipeline<'a, E: ExternalEngine> {
    workspace: Workspace,
    config: &'a PipelineConfig,
    engine: &'a E,
    reporter: &'a ProgressReporter<'a>,
    precomplex_name: String,
    records: Vec<StageRecord>,
}

impl<E: ExternalEngine> Pipeline<'_, E> {
    /// Creates the stage directory, imports its inputs, writes its deck, runs the engine and
    /// checks that the expected outputs exist. Returns the stage directory.
    fn execute(&mut self, stage: Stage) -> Result<PathBuf, EngineError> {
        let definition = stage.definition;
        let label = stage.label(&self.precomplex_name);
        self.reporter.report(Progress::StageStart {
            name: definition.name,
            label: label.clone(),
        });
        info!(directory = %stage.directory, "Starting {} ({}).", definition.name, label);

        let dir = self.workspace.create_stage(&stage.directory)?;
        for input in &stage.inputs {
            self.workspace
                .import_artifact(&input.source, &dir, input.rename)?;
        }

        let deck_path = dir.join(definition.deck_file);
        fs::write(&deck_path, stage.deck.render(self.config))?;
        debug!("Wrote input deck {:?}", deck_path);

        let job = self.engine.run(&deck_path, &dir.join(STAGE_LOG), &label)?;

        for output in definition.outputs {
            let path = dir.join(output);
            if !path.is_file() {
                return Err(EngineError::MissingOutput {
                    stage: definition.name,
                    path,
                });
            }
        }

        self.records.push(StageRecord {
            stage: definition.kind,
            label,
            directory: dir.clone(),
            exit_code: job.exit_code,
            elapsed_seconds: job.elapsed.as_secs_f64(),
        });
        self.reporter.report(Progress::StageFinish {
            name: definition.name,
        });
        Ok(dir)
    }
}

/// Runs the full reaction-path pipeline inside `root`.
///
/// Stages execute strictly in sequence; the first failure of any kind is returned
/// immediately and no later stage runs. Stage directories already written stay on disk.
#[instrument(skip_all, name = "reaction_path_workflow")]
pub fn run<E: ExternalEngine>(
    root: &Path,
    inputs: &PipelineInputs,
    config: &PipelineConfig,
    engine: &E,
    reporter: &ProgressReporter,
) -> Result<ReactionPathReport, EngineError> {
    let pair = inputs.active_atoms;
    let precomplex = XyzFile::read_from_path(&inputs.precomplex)?;
    let initial_distance = atom_distance(&precomplex, pair.first(), pair.second())?;
    info!(
        "Precomplex {:?}: {} atoms, active distance {:.3} Å.",
        inputs.precomplex,
        precomplex.atom_count(),
        initial_distance
    );

    let precomplex_name = inputs
        .precomplex
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingInput(inputs.precomplex.clone()))?;

    let mut pipeline = Pipeline {
        workspace: Workspace::new(root),
        config,
        engine,
        reporter,
        precomplex_name: precomplex_name.clone(),
        records: Vec::new(),
    };

    // === Initial optimization of the precomplex ===
    let opt_dir = pipeline.execute(Stage::new(
        StageKind::InitialOptimization,
        vec![StageInput::copy(inputs.precomplex.clone())],
        InputDeck::Optimization {
            structure: precomplex_name,
        },
    ))?;
    let optimized = opt_dir.join(OPTIMIZED_XYZ);

    // === Bond scan away from the optimized geometry ===
    let start_distance = active_distance(&optimized, &pair)?;
    let scan_dir = pipeline.execute(Stage::new(
        StageKind::Scan,
        vec![StageInput::copy(optimized.clone())],
        InputDeck::ConstrainedScan {
            structure: OPTIMIZED_XYZ.to_string(),
            pair,
            start_distance,
            constraints: inputs.constraints.clone(),
        },
    ))?;

    // === NEB from the scan end point to the optimized precomplex ===
    let neb_dir = pipeline.execute(Stage::new(
        StageKind::Neb,
        vec![
            StageInput::renamed(scan_dir.join(SCAN_XYZ), NEB_START_XYZ),
            StageInput::renamed(optimized, NEB_END_XYZ),
        ],
        InputDeck::Neb {
            start: NEB_START_XYZ.to_string(),
            end: NEB_END_XYZ.to_string(),
        },
    ))?;

    // === TS optimization and IRC ===
    let ts_dir = pipeline.execute(Stage::new(
        StageKind::TsIrc,
        vec![StageInput::copy(neb_dir.join(NEB_TS_GUESS_XYZ))],
        InputDeck::TsIrc {
            structure: NEB_TS_GUESS_XYZ.to_string(),
            pair,
        },
    ))?;

    // === Classify each IRC endpoint and optimize it in its branch ===
    let mut branch_dirs: HashMap<EndpointClass, PathBuf> = HashMap::new();
    let mut endpoints = Vec::with_capacity(2);
    for endpoint in [IRC_FORWARD_XYZ, IRC_BACKWARD_XYZ] {
        let path = ts_dir.join(endpoint);
        let distance = active_distance(&path, &pair)?;
        let class = EndpointClass::classify(distance, config.classification_threshold);
        info!(
            "IRC endpoint {} has active distance {:.4} Å -> {}.",
            endpoint, distance, class
        );
        reporter.report(Progress::Message(format!(
            "{} classified as {} ({:.3} Å)",
            endpoint, class, distance
        )));

        let mut stage = Stage::new(
            StageKind::optimization_for(class),
            vec![StageInput::copy(path)],
            InputDeck::OptimizationFrequency {
                structure: endpoint.to_string(),
            },
        );
        if branch_dirs.contains_key(&class) {
            warn!(
                "Both IRC endpoints classified as {}; optimizing {} in a separate directory.",
                class, endpoint
            );
            let directory = format!("{}_2", stage.definition.directory);
            stage = stage.in_directory(directory);
        }

        let dir = pipeline.execute(stage)?;
        endpoints.push(ClassifiedEndpoint {
            endpoint: endpoint.to_string(),
            distance,
            class,
            directory: dir.clone(),
        });
        branch_dirs.entry(class).or_insert(dir);
    }

    // === Solvated single points ===
    pipeline.execute(Stage::new(
        StageKind::TsSinglePoint,
        vec![StageInput::copy(ts_dir.join(TS_XYZ))],
        InputDeck::SolvatedSinglePoint {
            structure: TS_XYZ.to_string(),
        },
    ))?;

    let mut skipped_single_points = Vec::new();
    for class in [EndpointClass::Start, EndpointClass::Product] {
        let kind = StageKind::single_point_for(class);
        match branch_dirs.get(&class) {
            Some(dir) => {
                pipeline.execute(Stage::new(
                    kind,
                    vec![StageInput::copy(dir.join(OPTIMIZED_XYZ))],
                    InputDeck::SolvatedSinglePoint {
                        structure: OPTIMIZED_XYZ.to_string(),
                    },
                ))?;
            }
            None => {
                warn!(
                    "No IRC endpoint was classified as {}; skipping the {} single point.",
                    class, class
                );
                skipped_single_points.push(kind);
            }
        }
    }

    info!(
        "Reaction-path pipeline complete: {} stage(s) run.",
        pipeline.records.len()
    );
    Ok(ReactionPathReport {
        precomplex: inputs.precomplex.clone(),
        active_atoms: [pair.first(), pair.second()],
        skipped_single_points,
        stages: pipeline.records,
        endpoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::structure::{Atom, Structure};
    use crate::engine::config::PipelineConfigBuilder;
    use crate::engine::invoker::JobResult;
    use crate::engine::workspace::WorkspaceError;
    use nalgebra::{Point3, Vector3};
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Stands in for the quantum-chemistry engine: copies the deck's geometry to the
    /// stage's expected outputs and places the IRC endpoints at chosen active distances.
    struct StubEngine {
        fail_label_prefix: Option<&'static str>,
        forward_distance: f64,
        backward_distance: f64,
        skip_outputs: bool,
        calls: RefCell<Vec<String>>,
    }

    impl StubEngine {
        fn new(forward_distance: f64, backward_distance: f64) -> Self {
            Self {
                fail_label_prefix: None,
                forward_distance,
                backward_distance,
                skip_outputs: false,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing_on(mut self, prefix: &'static str) -> Self {
            self.fail_label_prefix = Some(prefix);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn with_active_distance(structure: &Structure, distance: f64) -> Structure {
            let mut moved = structure.clone();
            moved.atoms[5].position = moved.atoms[0].position + Vector3::new(distance, 0.0, 0.0);
            moved
        }
    }

    impl ExternalEngine for StubEngine {
        fn run(&self, input: &Path, output_log: &Path, label: &str) -> Result<JobResult, EngineError> {
            self.calls.borrow_mut().push(label.to_string());
            fs::write(output_log, format!("stub run of {}\n", label)).unwrap();

            if self.fail_label_prefix.is_some_and(|p| label.starts_with(p)) {
                return Err(EngineError::EngineFailure {
                    label: label.to_string(),
                    exit_code: Some(1),
                    log: output_log.to_path_buf(),
                });
            }

            let dir = input.parent().unwrap();
            let deck = fs::read_to_string(input).unwrap();
            let geometry = deck
                .lines()
                .find(|l| l.starts_with("* xyzfile"))
                .and_then(|l| l.split_whitespace().last())
                .unwrap();
            let structure = XyzFile::read_from_path(dir.join(geometry)).unwrap();

            if !self.skip_outputs {
                let deck_name = input.file_name().unwrap().to_str().unwrap();
                match deck_name {
                    "opt.inp" => XyzFile::write_to_path(&structure, dir.join("opt.xyz")).unwrap(),
                    "scan.inp" => XyzFile::write_to_path(&structure, dir.join("scan.xyz")).unwrap(),
                    "neb.inp" => {
                        XyzFile::write_to_path(&structure, dir.join("neb_TSOpt.xyz")).unwrap()
                    }
                    "ts.inp" => {
                        XyzFile::write_to_path(&structure, dir.join("ts.xyz")).unwrap();
                        let forward = Self::with_active_distance(&structure, self.forward_distance);
                        let backward =
                            Self::with_active_distance(&structure, self.backward_distance);
                        XyzFile::write_to_path(&forward, dir.join("ts_IRC_F.xyz")).unwrap();
                        XyzFile::write_to_path(&backward, dir.join("ts_IRC_B.xyz")).unwrap();
                    }
                    _ => {}
                }
            }

            Ok(JobResult {
                exit_code: 0,
                log: output_log.to_path_buf(),
                elapsed: Duration::from_millis(1),
            })
        }
    }

    fn precomplex() -> Structure {
        let atoms = (0..6)
            .map(|i| Atom::new("C", Point3::new(0.0, i as f64 * 1.5, 0.0)))
            .collect();
        Structure::new("precomplex", atoms)
    }

    fn setup_run_dir(constraints: Option<&str>) -> (tempfile::TempDir, PipelineInputs) {
        let tmp = tempdir().unwrap();
        let precomplex_path = tmp.path().join("conf1.xyz");
        XyzFile::write_to_path(&precomplex(), &precomplex_path).unwrap();
        fs::write(tmp.path().join("act_atom.txt"), "0,5\n").unwrap();
        if let Some(text) = constraints {
            fs::write(tmp.path().join("constrain"), text).unwrap();
        }
        let inputs = PipelineInputs::discover(tmp.path(), &InputLocations::default()).unwrap();
        (tmp, inputs)
    }

    fn config() -> PipelineConfig {
        PipelineConfigBuilder::new().build().unwrap()
    }

    fn directories_under(root: &Path) -> BTreeSet<String> {
        fn walk(root: &Path, dir: &Path, out: &mut BTreeSet<String>) {
            for entry in fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    let rel = path.strip_prefix(root).unwrap();
                    out.insert(rel.to_string_lossy().replace('\\', "/"));
                    walk(root, &path, out);
                }
            }
        }
        let mut out = BTreeSet::new();
        walk(root, root, &mut out);
        out
    }

    #[test]
    fn full_run_creates_the_standard_directory_layout() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2);

        run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        let expected: BTreeSet<String> = [
            "initial_precomplex_opt",
            "scan",
            "neb",
            "ts_opt",
            "ts_opt/start",
            "ts_opt/pdt",
            "ts_opt/ts_singlepoint",
            "ts_opt/start/start_singlepoint",
            "ts_opt/pdt/pdt_singlepoint",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(directories_under(tmp.path()), expected);
    }

    #[test]
    fn stages_run_in_order_with_labels() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2);

        let report = run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        assert_eq!(
            engine.calls(),
            vec![
                "opt_conf1.xyz",
                "scan_conf1.xyz",
                "neb_conf1.xyz",
                "ts_irc_conf1.xyz",
                "pdt_conf1.xyz",
                "start_conf1.xyz",
                "ts_sp_conf1.xyz",
                "start_sp_conf1.xyz",
                "pdt_sp_conf1.xyz",
            ]
        );
        assert_eq!(report.stages.len(), 9);
        assert!(report.stages.iter().all(|r| r.exit_code == 0));
        assert!(report.skipped_single_points.is_empty());
        assert_eq!(report.active_atoms, [0, 5]);
    }

    #[test]
    fn both_endpoints_are_classified_and_routed_to_their_branch() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2);

        let report = run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        assert_eq!(report.endpoints.len(), 2);
        let forward = &report.endpoints[0];
        assert_eq!(forward.endpoint, "ts_IRC_F.xyz");
        assert_eq!(forward.class, EndpointClass::Product);
        assert_eq!(forward.directory, tmp.path().join("ts_opt/pdt"));
        assert!((forward.distance - 1.5).abs() < 1e-6);

        let backward = &report.endpoints[1];
        assert_eq!(backward.class, EndpointClass::Start);
        assert_eq!(backward.directory, tmp.path().join("ts_opt/start"));
        assert!(tmp.path().join("ts_opt/start/ts_IRC_B.xyz").is_file());
        assert!(tmp.path().join("ts_opt/pdt/ts_IRC_F.xyz").is_file());
    }

    #[test]
    fn artifacts_are_copied_and_renamed_between_stages() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2);

        run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        let root = tmp.path();
        assert!(root.join("initial_precomplex_opt/conf1.xyz").is_file());
        assert!(root.join("initial_precomplex_opt/opt.xyz").is_file());
        assert!(root.join("scan/opt.xyz").is_file());
        assert!(root.join("neb/start.xyz").is_file());
        assert!(root.join("neb/end.xyz").is_file());
        assert!(!root.join("neb/scan.xyz").exists());
        assert!(root.join("ts_opt/neb_TSOpt.xyz").is_file());
        assert!(root.join("ts_opt/ts_singlepoint/ts.xyz").is_file());
        assert!(root.join("ts_opt/start/start_singlepoint/opt.xyz").is_file());
        assert!(root.join("ts_opt/pdt/pdt_singlepoint/smd.inp").is_file());
    }

    #[test]
    fn scan_deck_uses_measured_distance_and_constraints() {
        let (tmp, inputs) = setup_run_dir(Some("{ B 1 2 C }\n"));
        let engine = StubEngine::new(1.5, 3.2);

        run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        let deck = fs::read_to_string(tmp.path().join("scan/scan.inp")).unwrap();
        assert!(deck.contains("B 0 5 = 7.500, 3.98, 10"));
        assert!(deck.contains("  Constraints\n  { B 1 2 C }\n  end\n"));
    }

    #[test]
    fn ts_deck_is_generated_and_run_once() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2);

        run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        let ts_runs = engine
            .calls()
            .iter()
            .filter(|l| l.starts_with("ts_irc"))
            .count();
        assert_eq!(ts_runs, 1);
        let deck = fs::read_to_string(tmp.path().join("ts_opt/ts.inp")).unwrap();
        assert_eq!(deck.matches("TS_Active_Atoms {0 5}").count(), 1);
    }

    #[test]
    fn scan_failure_aborts_before_neb() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2).failing_on("scan");

        let err = run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap_err();

        match err {
            EngineError::EngineFailure {
                label, exit_code, ..
            } => {
                assert_eq!(label, "scan_conf1.xyz");
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.calls(), vec!["opt_conf1.xyz", "scan_conf1.xyz"]);
        assert!(!tmp.path().join("neb").exists());
        assert!(tmp.path().join("scan/result.out").is_file());
    }

    #[test]
    fn endpoints_in_the_same_class_get_separate_directories() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.4, 1.6);

        let report = run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        assert!(report.endpoints.iter().all(|e| e.class == EndpointClass::Product));
        assert_eq!(report.endpoints[1].directory, tmp.path().join("ts_opt/pdt_2"));
        assert_eq!(report.skipped_single_points, vec![StageKind::StartSinglePoint]);
        assert!(tmp.path().join("ts_opt/pdt/pdt_singlepoint").is_dir());
        assert!(!tmp.path().join("ts_opt/start").exists());
    }

    #[test]
    fn rerun_in_the_same_directory_refuses_to_overwrite() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2);
        run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap();

        let second = StubEngine::new(1.5, 3.2);
        let err = run(tmp.path(), &inputs, &config(), &second, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(
            err,
            EngineError::Workspace(WorkspaceError::DirectoryExists(_))
        ));
        assert!(second.calls().is_empty());
    }

    #[test]
    fn out_of_range_active_atom_fails_before_any_stage() {
        let (tmp, mut inputs) = setup_run_dir(None);
        inputs.active_atoms = ActiveAtomPair::new(0, 6).unwrap();
        let engine = StubEngine::new(1.5, 3.2);

        let err = run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(err, EngineError::Geometry(_)));
        assert!(engine.calls().is_empty());
        assert!(!tmp.path().join("initial_precomplex_opt").exists());
    }

    #[test]
    fn missing_stage_output_is_reported() {
        let (tmp, inputs) = setup_run_dir(None);
        let mut engine = StubEngine::new(1.5, 3.2);
        engine.skip_outputs = true;

        let err = run(tmp.path(), &inputs, &config(), &engine, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(
            err,
            EngineError::MissingOutput {
                stage: "initial optimization",
                ..
            }
        ));
        assert!(!tmp.path().join("scan").exists());
    }

    #[test]
    fn progress_events_bracket_every_stage() {
        let (tmp, inputs) = setup_run_dir(None);
        let engine = StubEngine::new(1.5, 3.2);
        let starts = std::sync::Mutex::new(0usize);
        let finishes = std::sync::Mutex::new(0usize);
        let reporter = ProgressReporter::with_callback(Box::new(|event: Progress| match event {
            Progress::StageStart { .. } => *starts.lock().unwrap() += 1,
            Progress::StageFinish { .. } => *finishes.lock().unwrap() += 1,
            Progress::Message(_) => {}
        }));

        run(tmp.path(), &inputs, &config(), &engine, &reporter).unwrap();
        drop(reporter);

        assert_eq!(starts.into_inner().unwrap(), 9);
        assert_eq!(finishes.into_inner().unwrap(), 9);
    }

    #[test]
    fn discover_reads_inputs_from_run_directory() {
        let (tmp, inputs) = setup_run_dir(Some("{ B 1 2 C }\n"));
        assert_eq!(inputs.precomplex, tmp.path().join("conf1.xyz"));
        assert_eq!(inputs.active_atoms, ActiveAtomPair::new(0, 5).unwrap());
        assert_eq!(inputs.constraints.len(), 1);
    }

    #[test]
    fn discover_without_active_atom_file_is_a_configuration_error() {
        let tmp = tempdir().unwrap();
        XyzFile::write_to_path(&precomplex(), tmp.path().join("conf1.xyz")).unwrap();

        let err = PipelineInputs::discover(tmp.path(), &InputLocations::default()).unwrap_err();

        assert!(matches!(
            err,
            EngineError::Configuration(ConfigError::MissingInput(_))
        ));
    }

    #[test]
    fn discover_with_malformed_active_atoms_is_a_configuration_error() {
        let tmp = tempdir().unwrap();
        XyzFile::write_to_path(&precomplex(), tmp.path().join("conf1.xyz")).unwrap();
        fs::write(tmp.path().join("act_atom.txt"), "5\n").unwrap();

        let err = PipelineInputs::discover(tmp.path(), &InputLocations::default()).unwrap_err();

        assert!(matches!(
            err,
            EngineError::Configuration(ConfigError::ActiveAtoms { .. })
        ));
    }

    #[test]
    fn locate_precomplex_requires_exactly_one_candidate() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            locate_precomplex(tmp.path()),
            Err(ConfigError::MissingPrecomplex(_))
        ));

        fs::write(tmp.path().join("conf2.xyz"), "").unwrap();
        fs::write(tmp.path().join("other.xyz"), "").unwrap();
        assert_eq!(
            locate_precomplex(tmp.path()).unwrap(),
            tmp.path().join("conf2.xyz")
        );

        fs::write(tmp.path().join("conf1.xyz"), "").unwrap();
        match locate_precomplex(tmp.path()) {
            Err(ConfigError::AmbiguousPrecomplex(candidates)) => {
                assert_eq!(
                    candidates,
                    vec![tmp.path().join("conf1.xyz"), tmp.path().join("conf2.xyz")]
                );
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn explicit_precomplex_overrides_discovery() {
        let tmp = tempdir().unwrap();
        XyzFile::write_to_path(&precomplex(), tmp.path().join("conf1.xyz")).unwrap();
        XyzFile::write_to_path(&precomplex(), tmp.path().join("conf2.xyz")).unwrap();
        fs::write(tmp.path().join("act_atom.txt"), "0,5").unwrap();
        let locations = InputLocations {
            precomplex: Some(PathBuf::from("conf2.xyz")),
            ..Default::default()
        };

        let inputs = PipelineInputs::discover(tmp.path(), &locations).unwrap();

        assert_eq!(inputs.precomplex, tmp.path().join("conf2.xyz"));
    }
}
