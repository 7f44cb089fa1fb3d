use crate::cli::PipelineOptions;
use crate::error::{CliError, Result};
use autoreact::engine::config::{PipelineConfig, PipelineConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialChemistryConfig {
    method: Option<String>,
    basis_set: Option<String>,
    frequency_basis_set: Option<String>,
    keywords: Option<String>,
    charge: Option<i32>,
    multiplicity: Option<u32>,
    processors: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialSolvationConfig {
    method: Option<String>,
    basis_set: Option<String>,
    keywords: Option<String>,
    solvent: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialScanConfig {
    target_distance: Option<f64>,
    steps: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialNebConfig {
    images: Option<usize>,
    max_iterations: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialIrcConfig {
    max_iterations: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialClassificationConfig {
    threshold: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialExecutablesConfig {
    orca: Option<PathBuf>,
    crest: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialConformerConfig {
    /// `0` keeps every conformer.
    max_conformers: Option<usize>,
    propagate: Option<Vec<PathBuf>>,
}

/// Command-specific overrides layered on top of [`PipelineOptions`].
#[derive(Debug, Default)]
pub struct CommandOverrides {
    pub scan_target: Option<f64>,
    pub scan_steps: Option<usize>,
    pub orca: Option<PathBuf>,
    pub crest: Option<PathBuf>,
    /// `Some(None)` removes the conformer cap.
    pub max_conformers: Option<Option<usize>>,
    pub propagate: Vec<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialPipelineConfig {
    chemistry: Option<PartialChemistryConfig>,
    solvation: Option<PartialSolvationConfig>,
    scan: Option<PartialScanConfig>,
    neb: Option<PartialNebConfig>,
    irc: Option<PartialIrcConfig>,
    classification: Option<PartialClassificationConfig>,
    executables: Option<PartialExecutablesConfig>,
    conformers: Option<PartialConformerConfig>,
}

impl PartialPipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file named by `--config`, or starts from an empty layer.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(
        mut self,
        options: &PipelineOptions,
        overrides: CommandOverrides,
    ) -> Result<PipelineConfig> {
        self.apply_set_values(&options.set_values)?;

        let chem = self.chemistry.take().unwrap_or_default();
        let solv = self.solvation.take().unwrap_or_default();
        let scan = self.scan.take().unwrap_or_default();
        let neb = self.neb.take().unwrap_or_default();
        let irc = self.irc.take().unwrap_or_default();
        let classification = self.classification.take().unwrap_or_default();
        let executables = self.executables.take().unwrap_or_default();
        let conformers = self.conformers.take().unwrap_or_default();

        let mut builder = PipelineConfigBuilder::new();

        if let Some(v) = options.method.clone().or(chem.method) {
            builder = builder.method(v);
        }
        if let Some(v) = options.basis_set.clone().or(chem.basis_set) {
            builder = builder.basis_set(v);
        }
        if let Some(v) = chem.frequency_basis_set {
            builder = builder.frequency_basis_set(v);
        }
        if let Some(v) = chem.keywords {
            builder = builder.keywords(v);
        }
        if let Some(v) = options.charge.or(chem.charge) {
            builder = builder.charge(v);
        }
        if let Some(v) = options.multiplicity.or(chem.multiplicity) {
            builder = builder.multiplicity(v);
        }
        if let Some(v) = options.processors.or(chem.processors) {
            builder = builder.processors(v);
        }

        if let Some(v) = solv.method {
            builder = builder.solvation_method(v);
        }
        if let Some(v) = solv.basis_set {
            builder = builder.solvation_basis_set(v);
        }
        if let Some(v) = solv.keywords {
            builder = builder.solvation_keywords(v);
        }
        if let Some(v) = options.solvent.clone().or(solv.solvent) {
            builder = builder.solvent(v);
        }

        if let Some(v) = overrides.scan_target.or(scan.target_distance) {
            builder = builder.scan_target_distance(v);
        }
        if let Some(v) = overrides.scan_steps.or(scan.steps) {
            builder = builder.scan_steps(v);
        }
        if let Some(v) = neb.images {
            builder = builder.neb_images(v);
        }
        if let Some(v) = neb.max_iterations {
            builder = builder.neb_max_iterations(v);
        }
        if let Some(v) = irc.max_iterations {
            builder = builder.irc_max_iterations(v);
        }
        if let Some(v) = classification.threshold {
            builder = builder.classification_threshold(v);
        }

        if let Some(v) = overrides.orca.or(executables.orca) {
            builder = builder.quantum_chemistry_executable(v);
        }
        if let Some(v) = overrides.crest.or(executables.crest) {
            builder = builder.conformer_search_executable(v);
        }

        let file_cap = conformers
            .max_conformers
            .map(|n| if n == 0 { None } else { Some(n) });
        if let Some(cap) = overrides.max_conformers.or(file_cap) {
            builder = builder.max_conformers(cap);
        }
        let mut propagate = conformers.propagate.unwrap_or_default();
        propagate.extend(overrides.propagate);
        builder = builder.propagate(propagate);

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "chemistry.method" => {
                    self.chemistry.get_or_insert_with(Default::default).method =
                        Some(value.to_string())
                }
                "chemistry.basis-set" => {
                    self.chemistry.get_or_insert_with(Default::default).basis_set =
                        Some(value.to_string())
                }
                "chemistry.frequency-basis-set" => {
                    self.chemistry
                        .get_or_insert_with(Default::default)
                        .frequency_basis_set = Some(value.to_string())
                }
                "chemistry.keywords" => {
                    self.chemistry.get_or_insert_with(Default::default).keywords =
                        Some(value.to_string())
                }
                "chemistry.charge" => {
                    self.chemistry.get_or_insert_with(Default::default).charge =
                        Some(parse_value(key, value)?)
                }
                "chemistry.multiplicity" => {
                    self.chemistry
                        .get_or_insert_with(Default::default)
                        .multiplicity = Some(parse_value(key, value)?)
                }
                "chemistry.processors" => {
                    self.chemistry.get_or_insert_with(Default::default).processors =
                        Some(parse_value(key, value)?)
                }
                "solvation.method" => {
                    self.solvation.get_or_insert_with(Default::default).method =
                        Some(value.to_string())
                }
                "solvation.basis-set" => {
                    self.solvation.get_or_insert_with(Default::default).basis_set =
                        Some(value.to_string())
                }
                "solvation.keywords" => {
                    self.solvation.get_or_insert_with(Default::default).keywords =
                        Some(value.to_string())
                }
                "solvation.solvent" => {
                    self.solvation.get_or_insert_with(Default::default).solvent =
                        Some(value.to_string())
                }
                "scan.target-distance" => {
                    self.scan.get_or_insert_with(Default::default).target_distance =
                        Some(parse_value(key, value)?)
                }
                "scan.steps" => {
                    self.scan.get_or_insert_with(Default::default).steps =
                        Some(parse_value(key, value)?)
                }
                "neb.images" => {
                    self.neb.get_or_insert_with(Default::default).images =
                        Some(parse_value(key, value)?)
                }
                "neb.max-iterations" => {
                    self.neb.get_or_insert_with(Default::default).max_iterations =
                        Some(parse_value(key, value)?)
                }
                "irc.max-iterations" => {
                    self.irc.get_or_insert_with(Default::default).max_iterations =
                        Some(parse_value(key, value)?)
                }
                "classification.threshold" => {
                    self.classification
                        .get_or_insert_with(Default::default)
                        .threshold = Some(parse_value(key, value)?)
                }
                "executables.orca" => {
                    self.executables.get_or_insert_with(Default::default).orca =
                        Some(PathBuf::from(value))
                }
                "executables.crest" => {
                    self.executables.get_or_insert_with(Default::default).crest =
                        Some(PathBuf::from(value))
                }
                "conformers.max-conformers" => {
                    self.conformers
                        .get_or_insert_with(Default::default)
                        .max_conformers = Some(parse_value(key, value)?)
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}
