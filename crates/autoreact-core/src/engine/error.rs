use thiserror::Error;

use super::config::ConfigError;
use super::workspace::WorkspaceError;
use crate::core::io::xyz::XyzError;
use crate::core::utils::geometry::GeometryError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("{label} failed with {}; see {log:?}", describe_exit(.exit_code))]
    EngineFailure {
        label: String,
        exit_code: Option<i32>,
        log: PathBuf,
    },

    #[error("Failed to launch '{program}' for {label}: {source}", program = .program.display())]
    Launch {
        program: PathBuf,
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stage '{stage}' finished but did not produce {path:?}")]
    MissingOutput { stage: &'static str, path: PathBuf },

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("Malformed artifact: {0}")]
    Artifact(#[from] XyzError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}
