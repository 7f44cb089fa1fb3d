use super::error::EngineError;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Outcome of one successful external invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub exit_code: i32,
    pub log: PathBuf,
    pub elapsed: Duration,
}

/// Runs one external computational step to completion.
///
/// Implementations block until the step is done. A nonzero exit is never reported as a
/// `JobResult`: it is returned as [`EngineError::EngineFailure`], which the workflows
/// propagate straight out so that no later stage runs.
pub trait ExternalEngine {
    fn run(&self, input: &Path, output_log: &Path, label: &str) -> Result<JobResult, EngineError>;
}

/// Invokes an executable as a child process: `<program> <input file name> [args...]`,
/// with the input's directory as working directory and stdout redirected to the log.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments appended after the input file name.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Anchors a relative program path to the current directory, since the child runs in the
/// stage directory. Bare names are left to the search path.
fn resolve_program(program: &Path) -> std::io::Result<PathBuf> {
    if program.is_absolute() || program.components().count() < 2 {
        return Ok(program.to_path_buf());
    }
    std::path::absolute(program)
}

impl ExternalEngine for ProcessEngine {
    fn run(&self, input: &Path, output_log: &Path, label: &str) -> Result<JobResult, EngineError> {
        let launch_error = |source: std::io::Error| EngineError::Launch {
            program: self.program.clone(),
            label: label.to_string(),
            source,
        };

        let program = resolve_program(&self.program).map_err(launch_error)?;
        let log_file = File::create(output_log)?;
        let mut command = Command::new(&program);
        match (input.parent(), input.file_name()) {
            (Some(dir), Some(name)) if !dir.as_os_str().is_empty() => {
                command.current_dir(dir).arg(name);
            }
            _ => {
                command.arg(input);
            }
        }
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file));

        debug!("Launching {:?} for {}", command, label);
        let start = Instant::now();
        let status = command.status().map_err(launch_error)?;
        let elapsed = start.elapsed();

        match status.code() {
            Some(0) => {
                info!(
                    "{} finished successfully in {:.1}s (exit code 0).",
                    label,
                    elapsed.as_secs_f64()
                );
                Ok(JobResult {
                    exit_code: 0,
                    log: output_log.to_path_buf(),
                    elapsed,
                })
            }
            code => {
                warn!(
                    "{} failed with exit code {:?}; aborting the pipeline. Log: {:?}",
                    label, code, output_log
                );
                Err(EngineError::EngineFailure {
                    label: label.to_string(),
                    exit_code: code,
                    log: output_log.to_path_buf(),
                })
            }
        }
    }
}
