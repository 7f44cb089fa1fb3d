use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "autoreact - automated reaction-path discovery (optimization, scan, NEB, TS/IRC, solvated single points) driven through ORCA and CREST.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full reaction-path pipeline in a directory holding one precomplex.
    Run(RunArgs),
    /// Search conformers of a structure and prepare one pipeline directory per conformer.
    Conformers(ConformersArgs),
    /// Split a multi-frame XYZ ensemble into numbered single-frame files.
    Split(SplitArgs),
    /// Measure the distance between two atoms and classify it as START or PRODUCT.
    Measure(MeasureArgs),
}

/// Settings shared by every command that drives an external engine.
#[derive(Args, Debug, Default)]
pub struct PipelineOptions {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the gas-phase method (e.g., B97-D3).
    #[arg(long, value_name = "NAME")]
    pub method: Option<String>,

    /// Override the gas-phase basis set string.
    #[arg(long, value_name = "BASIS")]
    pub basis_set: Option<String>,

    /// Override the total charge.
    #[arg(long, value_name = "INT", allow_hyphen_values = true)]
    pub charge: Option<i32>,

    /// Override the spin multiplicity.
    #[arg(long, value_name = "INT")]
    pub multiplicity: Option<u32>,

    /// Override the number of processors handed to each engine run.
    #[arg(short = 'n', long, value_name = "NUM")]
    pub processors: Option<usize>,

    /// Override the SMD solvent of the single points.
    #[arg(long, value_name = "NAME")]
    pub solvent: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S scan.steps=12
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(1))]
    pub set_values: Vec<String>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run directory holding the precomplex, the active-atom file and the optional constraints.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub dir: PathBuf,

    /// Precomplex structure; defaults to the single `conf*.xyz` in the run directory.
    #[arg(short, long, value_name = "PATH")]
    pub precomplex: Option<PathBuf>,

    /// Active-atom file, relative to the run directory.
    #[arg(short = 'r', long, default_value = "act_atom.txt", value_name = "PATH")]
    pub active_atoms: PathBuf,

    /// Constraint file, relative to the run directory; ignored when absent.
    #[arg(long, default_value = "constrain", value_name = "PATH")]
    pub constraints: PathBuf,

    // --- Protocol Overrides ---
    /// Override the final active-atom distance (Å) of the bond scan.
    #[arg(long, value_name = "FLOAT")]
    pub scan_target: Option<f64>,

    /// Override the number of bond-scan steps.
    #[arg(long, value_name = "INT")]
    pub scan_steps: Option<usize>,

    /// Override the quantum-chemistry executable.
    #[arg(long, value_name = "PATH")]
    pub orca: Option<PathBuf>,

    #[command(flatten)]
    pub options: PipelineOptions,
}

/// Arguments for the `conformers` subcommand.
#[derive(Args, Debug)]
pub struct ConformersArgs {
    /// Starting structure for the conformer search.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub molecule: PathBuf,

    /// Directory in which the search and the conformation directories are created.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub dir: PathBuf,

    /// Active-atom file, relative to the working directory.
    #[arg(short = 'r', long, default_value = "act_atom.txt", value_name = "PATH")]
    pub active_atoms: PathBuf,

    /// Constraint file, relative to the working directory; copied only when present.
    #[arg(long, default_value = "constrain", value_name = "PATH")]
    pub constraints: PathBuf,

    /// Override the maximum number of conformers prepared.
    #[arg(long, value_name = "INT", conflicts_with = "all_conformers")]
    pub max_conformers: Option<usize>,

    /// Prepare a directory for every conformer in the ensemble.
    #[arg(long)]
    pub all_conformers: bool,

    /// Additional file copied into every conformation directory. Can be used multiple times.
    #[arg(long, value_name = "PATH")]
    pub propagate: Vec<PathBuf>,

    /// Override the conformer-search executable.
    #[arg(long, value_name = "PATH")]
    pub crest: Option<PathBuf>,

    #[command(flatten)]
    pub options: PipelineOptions,
}

/// Arguments for the `split` subcommand.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Multi-frame XYZ ensemble.
    #[arg(required = true, value_name = "PATH")]
    pub ensemble: PathBuf,

    /// Directory receiving the numbered frames.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Keep at most this many frames.
    #[arg(long = "max", value_name = "INT")]
    pub max_count: Option<usize>,

    /// File-name prefix of the numbered frames.
    #[arg(long, default_value = "conf", value_name = "PREFIX")]
    pub prefix: String,
}

/// Arguments for the `measure` subcommand.
#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// XYZ structure to measure.
    #[arg(required = true, value_name = "PATH")]
    pub structure: PathBuf,

    /// First atom, 0-based.
    #[arg(required = true, value_name = "A")]
    pub first: usize,

    /// Second atom, 0-based.
    #[arg(required = true, value_name = "B")]
    pub second: usize,

    /// Bond-formed threshold (Å).
    #[arg(long, default_value_t = autoreact::core::utils::geometry::BOND_FORMED_THRESHOLD_ANGSTROM, value_name = "FLOAT")]
    pub threshold: f64,
}
