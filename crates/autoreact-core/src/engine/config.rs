use crate::core::models::reaction::ActiveAtomsError;
use crate::core::utils::geometry::BOND_FORMED_THRESHOLD_ANGSTROM;
use std::path::PathBuf;
use thiserror::Error;

/// Final active-atom separation (Å) of the constrained bond scan.
pub const DEFAULT_SCAN_TARGET_ANGSTROM: f64 = 3.98;
pub const DEFAULT_SCAN_STEPS: usize = 10;
pub const DEFAULT_NEB_IMAGES: usize = 14;
pub const DEFAULT_NEB_MAX_ITERATIONS: usize = 1000;
pub const DEFAULT_IRC_MAX_ITERATIONS: usize = 15;
/// Frames kept from a conformer-search ensemble.
pub const DEFAULT_MAX_CONFORMERS: usize = 24;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Invalid active-atom specification in {path:?}: {source}")]
    ActiveAtoms {
        path: PathBuf,
        #[source]
        source: ActiveAtomsError,
    },

    #[error("Required input file not found: {0:?}")]
    MissingInput(PathBuf),

    #[error("No precomplex structure matching 'conf*.xyz' found in {0:?}")]
    MissingPrecomplex(PathBuf),

    #[error("Ambiguous precomplex: {} candidates found ({})", .0.len(), display_paths(.0))]
    AmbiguousPrecomplex(Vec<PathBuf>),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Level of theory and resources shared by every gas-phase stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ChemistryConfig {
    pub method: String,
    pub basis_set: String,
    /// Basis used for stages that also compute frequencies (TS/IRC, endpoint optimization).
    pub frequency_basis_set: String,
    pub keywords: String,
    pub charge: i32,
    pub multiplicity: u32,
    pub processors: usize,
}

impl Default for ChemistryConfig {
    fn default() -> Self {
        Self {
            method: "B97-D3".to_string(),
            basis_set: "def2-SVP def2-SVP/C def2/J".to_string(),
            frequency_basis_set: "def2-SVP def2-SVP/C def2/J".to_string(),
            keywords: "RIJCOSX Grid6 NormalSCF NoPop NoFinalGrid".to_string(),
            charge: 0,
            multiplicity: 1,
            processors: 16,
        }
    }
}

/// Level of theory for the implicit-solvent single points.
#[derive(Debug, Clone, PartialEq)]
pub struct SolvationConfig {
    pub method: String,
    pub basis_set: String,
    pub keywords: String,
    pub solvent: String,
}

impl Default for SolvationConfig {
    fn default() -> Self {
        Self {
            method: "M06".to_string(),
            basis_set: "def2-TZVP def2-TZVP/C def2/J".to_string(),
            keywords: "RIJCOSX Grid6 NormalSCF NoPop NoFinalGrid".to_string(),
            solvent: "METHANOL".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub target_distance: f64,
    pub steps: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NebConfig {
    pub images: usize,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrcConfig {
    pub max_iterations: usize,
}

/// External programs, resolved through the search path unless given as a path.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutablesConfig {
    pub quantum_chemistry: PathBuf,
    pub conformer_search: PathBuf,
}

impl Default for ExecutablesConfig {
    fn default() -> Self {
        Self {
            quantum_chemistry: PathBuf::from("orca"),
            conformer_search: PathBuf::from("crest"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConformerConfig {
    /// Maximum number of conformers prepared; `None` keeps every frame.
    pub max_conformers: Option<usize>,
    /// Extra files copied into every conformer directory (config files, driver scripts).
    pub propagate: Vec<PathBuf>,
}

/// Immutable run configuration handed to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub chemistry: ChemistryConfig,
    pub solvation: SolvationConfig,
    pub scan: ScanConfig,
    pub neb: NebConfig,
    pub irc: IrcConfig,
    pub classification_threshold: f64,
    pub executables: ExecutablesConfig,
    pub conformers: ConformerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chemistry: ChemistryConfig::default(),
            solvation: SolvationConfig::default(),
            scan: ScanConfig {
                target_distance: DEFAULT_SCAN_TARGET_ANGSTROM,
                steps: DEFAULT_SCAN_STEPS,
            },
            neb: NebConfig {
                images: DEFAULT_NEB_IMAGES,
                max_iterations: DEFAULT_NEB_MAX_ITERATIONS,
            },
            irc: IrcConfig {
                max_iterations: DEFAULT_IRC_MAX_ITERATIONS,
            },
            classification_threshold: BOND_FORMED_THRESHOLD_ANGSTROM,
            executables: ExecutablesConfig::default(),
            conformers: ConformerConfig {
                max_conformers: Some(DEFAULT_MAX_CONFORMERS),
                propagate: Vec::new(),
            },
        }
    }
}

/// Builds a [`PipelineConfig`], starting from the defaults and validating on `build`.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.config.chemistry.method = method.into();
        self
    }
    pub fn basis_set(mut self, basis: impl Into<String>) -> Self {
        self.config.chemistry.basis_set = basis.into();
        self
    }
    pub fn frequency_basis_set(mut self, basis: impl Into<String>) -> Self {
        self.config.chemistry.frequency_basis_set = basis.into();
        self
    }
    pub fn keywords(mut self, keywords: impl Into<String>) -> Self {
        self.config.chemistry.keywords = keywords.into();
        self
    }
    pub fn charge(mut self, charge: i32) -> Self {
        self.config.chemistry.charge = charge;
        self
    }
    pub fn multiplicity(mut self, multiplicity: u32) -> Self {
        self.config.chemistry.multiplicity = multiplicity;
        self
    }
    pub fn processors(mut self, processors: usize) -> Self {
        self.config.chemistry.processors = processors;
        self
    }
    pub fn solvation_method(mut self, method: impl Into<String>) -> Self {
        self.config.solvation.method = method.into();
        self
    }
    pub fn solvation_basis_set(mut self, basis: impl Into<String>) -> Self {
        self.config.solvation.basis_set = basis.into();
        self
    }
    pub fn solvation_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.config.solvation.keywords = keywords.into();
        self
    }
    pub fn solvent(mut self, solvent: impl Into<String>) -> Self {
        self.config.solvation.solvent = solvent.into();
        self
    }
    pub fn scan_target_distance(mut self, distance: f64) -> Self {
        self.config.scan.target_distance = distance;
        self
    }
    pub fn scan_steps(mut self, steps: usize) -> Self {
        self.config.scan.steps = steps;
        self
    }
    pub fn neb_images(mut self, images: usize) -> Self {
        self.config.neb.images = images;
        self
    }
    pub fn neb_max_iterations(mut self, iterations: usize) -> Self {
        self.config.neb.max_iterations = iterations;
        self
    }
    pub fn irc_max_iterations(mut self, iterations: usize) -> Self {
        self.config.irc.max_iterations = iterations;
        self
    }
    pub fn classification_threshold(mut self, threshold: f64) -> Self {
        self.config.classification_threshold = threshold;
        self
    }
    pub fn quantum_chemistry_executable(mut self, path: PathBuf) -> Self {
        self.config.executables.quantum_chemistry = path;
        self
    }
    pub fn conformer_search_executable(mut self, path: PathBuf) -> Self {
        self.config.executables.conformer_search = path;
        self
    }
    pub fn max_conformers(mut self, max: Option<usize>) -> Self {
        self.config.conformers.max_conformers = max;
        self
    }
    pub fn propagate(mut self, files: Vec<PathBuf>) -> Self {
        self.config.conformers.propagate = files;
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let c = self.config;

        let non_empty = |key: &'static str, value: &str| {
            if value.trim().is_empty() {
                Err(ConfigError::MissingParameter(key))
            } else {
                Ok(())
            }
        };
        non_empty("chemistry.method", &c.chemistry.method)?;
        non_empty("chemistry.basis-set", &c.chemistry.basis_set)?;
        non_empty("chemistry.frequency-basis-set", &c.chemistry.frequency_basis_set)?;
        non_empty("solvation.method", &c.solvation.method)?;
        non_empty("solvation.basis-set", &c.solvation.basis_set)?;
        non_empty("solvation.solvent", &c.solvation.solvent)?;

        let positive = |key: &'static str, value: usize| {
            if value == 0 {
                Err(ConfigError::InvalidValue {
                    key,
                    reason: "must be at least 1".to_string(),
                })
            } else {
                Ok(())
            }
        };
        positive("chemistry.processors", c.chemistry.processors)?;
        positive("chemistry.multiplicity", c.chemistry.multiplicity as usize)?;
        positive("scan.steps", c.scan.steps)?;
        positive("neb.images", c.neb.images)?;
        positive("neb.max-iterations", c.neb.max_iterations)?;
        positive("irc.max-iterations", c.irc.max_iterations)?;
        if let Some(max) = c.conformers.max_conformers {
            positive("conformers.max-conformers", max)?;
        }

        let positive_length = |key: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    key,
                    reason: format!("must be a positive distance, got {}", value),
                })
            }
        };
        positive_length("scan.target-distance", c.scan.target_distance)?;
        positive_length("classification.threshold", c.classification_threshold)?;

        Ok(c)
    }
}
