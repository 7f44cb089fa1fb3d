use super::decks::InputDeck;
use crate::core::utils::geometry::EndpointClass;
use serde::Serialize;
use std::path::PathBuf;

pub const STAGE_LOG: &str = "result.out";

pub const OPTIMIZED_XYZ: &str = "opt.xyz";
pub const SCAN_XYZ: &str = "scan.xyz";
pub const NEB_START_XYZ: &str = "start.xyz";
pub const NEB_END_XYZ: &str = "end.xyz";
pub const NEB_TS_GUESS_XYZ: &str = "neb_TSOpt.xyz";
pub const TS_XYZ: &str = "ts.xyz";
pub const IRC_FORWARD_XYZ: &str = "ts_IRC_F.xyz";
pub const IRC_BACKWARD_XYZ: &str = "ts_IRC_B.xyz";

/// Every step of the reaction-path pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    InitialOptimization,
    Scan,
    Neb,
    TsIrc,
    StartOptimization,
    ProductOptimization,
    TsSinglePoint,
    StartSinglePoint,
    ProductSinglePoint,
}

/// Static description of a stage: where it runs, what deck it writes and what it must
/// leave behind for the stages after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinition {
    pub kind: StageKind,
    pub name: &'static str,
    /// Canonical directory, relative to the run root.
    pub directory: &'static str,
    pub deck_file: &'static str,
    pub outputs: &'static [&'static str],
    /// Prefix of the job label, which is completed with the precomplex file name.
    pub label_prefix: &'static str,
}

const OPTIMIZATION_OUTPUTS: &[&str] = &[OPTIMIZED_XYZ];
const SCAN_OUTPUTS: &[&str] = &[SCAN_XYZ];
const NEB_OUTPUTS: &[&str] = &[NEB_TS_GUESS_XYZ];
const TS_IRC_OUTPUTS: &[&str] = &[TS_XYZ, IRC_FORWARD_XYZ, IRC_BACKWARD_XYZ];
const NO_OUTPUTS: &[&str] = &[];

impl StageKind {
    pub fn definition(self) -> StageDefinition {
        let (name, directory, deck_file, outputs, label_prefix) = match self {
            Self::InitialOptimization => (
                "initial optimization",
                "initial_precomplex_opt",
                "opt.inp",
                OPTIMIZATION_OUTPUTS,
                "opt",
            ),
            Self::Scan => ("scan", "scan", "scan.inp", SCAN_OUTPUTS, "scan"),
            Self::Neb => ("neb", "neb", "neb.inp", NEB_OUTPUTS, "neb"),
            Self::TsIrc => (
                "ts optimization + irc",
                "ts_opt",
                "ts.inp",
                TS_IRC_OUTPUTS,
                "ts_irc",
            ),
            Self::StartOptimization => (
                "start optimization",
                "ts_opt/start",
                "opt.inp",
                OPTIMIZATION_OUTPUTS,
                "start",
            ),
            Self::ProductOptimization => (
                "product optimization",
                "ts_opt/pdt",
                "opt.inp",
                OPTIMIZATION_OUTPUTS,
                "pdt",
            ),
            Self::TsSinglePoint => (
                "ts single point",
                "ts_opt/ts_singlepoint",
                "smd.inp",
                NO_OUTPUTS,
                "ts_sp",
            ),
            Self::StartSinglePoint => (
                "start single point",
                "ts_opt/start/start_singlepoint",
                "smd.inp",
                NO_OUTPUTS,
                "start_sp",
            ),
            Self::ProductSinglePoint => (
                "product single point",
                "ts_opt/pdt/pdt_singlepoint",
                "smd.inp",
                NO_OUTPUTS,
                "pdt_sp",
            ),
        };
        StageDefinition {
            kind: self,
            name,
            directory,
            deck_file,
            outputs,
            label_prefix,
        }
    }

    pub fn optimization_for(class: EndpointClass) -> Self {
        match class {
            EndpointClass::Start => Self::StartOptimization,
            EndpointClass::Product => Self::ProductOptimization,
        }
    }

    pub fn single_point_for(class: EndpointClass) -> Self {
        match class {
            EndpointClass::Start => Self::StartSinglePoint,
            EndpointClass::Product => Self::ProductSinglePoint,
        }
    }
}

/// Where an input artifact of a stage comes from, and the name it takes in the stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageInput {
    pub source: PathBuf,
    pub rename: Option<&'static str>,
}

impl StageInput {
    pub fn copy(source: PathBuf) -> Self {
        Self {
            source,
            rename: None,
        }
    }

    pub fn renamed(source: PathBuf, name: &'static str) -> Self {
        Self {
            source,
            rename: Some(name),
        }
    }
}

/// A stage ready to execute: definition plus the concrete directory, inputs and deck.
#[derive(Debug, Clone)]
pub struct Stage {
    pub definition: StageDefinition,
    /// Directory relative to the run root; differs from the canonical one only for a second
    /// IRC endpoint landing in an already occupied branch.
    pub directory: String,
    pub inputs: Vec<StageInput>,
    pub deck: InputDeck,
}

impl Stage {
    pub fn new(kind: StageKind, inputs: Vec<StageInput>, deck: InputDeck) -> Self {
        let definition = kind.definition();
        Self {
            definition,
            directory: definition.directory.to_string(),
            inputs,
            deck,
        }
    }

    pub fn in_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn label(&self, precomplex_name: &str) -> String {
        format!("{}_{}", self.definition.label_prefix, precomplex_name)
    }
}
