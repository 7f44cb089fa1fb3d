use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Stage directory already exists: {0:?}")]
    DirectoryExists(PathBuf),
    #[error("Artifact not found: {0:?}")]
    MissingArtifact(PathBuf),
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Owns the directory tree of one pipeline run.
///
/// Each stage gets a fresh directory under the root; artifacts are copied between stage
/// directories, never moved, so every finished stage stays on disk as a record of its step.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the stage directory `name` (which may be nested, e.g. `ts_opt/start`).
    ///
    /// Fails with [`WorkspaceError::DirectoryExists`] if the directory is already present, so a
    /// rerun never silently overwrites a previous result.
    pub fn create_stage(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        let dir = self.root.join(name);
        if dir.exists() {
            return Err(WorkspaceError::DirectoryExists(dir));
        }
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent).map_err(|source| WorkspaceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::create_dir(&dir).map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                WorkspaceError::DirectoryExists(dir.clone())
            } else {
                WorkspaceError::Io {
                    path: dir.clone(),
                    source,
                }
            }
        })?;
        debug!("Created stage directory {:?}", dir);
        Ok(dir)
    }

    /// Copies `source` into `stage_dir`, under `new_name` if given, and returns the new path.
    pub fn import_artifact(
        &self,
        source: &Path,
        stage_dir: &Path,
        new_name: Option<&str>,
    ) -> Result<PathBuf, WorkspaceError> {
        if !source.is_file() {
            return Err(WorkspaceError::MissingArtifact(source.to_path_buf()));
        }
        let file_name = match new_name {
            Some(name) => OsStr::new(name),
            None => source
                .file_name()
                .ok_or_else(|| WorkspaceError::MissingArtifact(source.to_path_buf()))?,
        };
        let target = stage_dir.join(file_name);
        fs::copy(source, &target).map_err(|source| WorkspaceError::Io {
            path: target.clone(),
            source,
        })?;
        debug!("Imported {:?} -> {:?}", source, target);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_stage_makes_directory_under_root() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::new(tmp.path());

        let dir = ws.create_stage("scan").unwrap();

        assert_eq!(dir, tmp.path().join("scan"));
        assert_eq!(ws.root(), tmp.path());
        assert!(dir.is_dir());
    }

    #[test]
    fn nested_stage_creates_parents() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::new(tmp.path());

        let dir = ws.create_stage("ts_opt/start/start_singlepoint").unwrap();

        assert!(dir.is_dir());
        assert!(tmp.path().join("ts_opt/start").is_dir());
    }

    #[test]
    fn creating_existing_stage_fails_and_keeps_contents() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::new(tmp.path());
        let dir = ws.create_stage("neb").unwrap();
        fs::write(dir.join("result.out"), "previous run").unwrap();

        let err = ws.create_stage("neb").unwrap_err();

        assert!(matches!(err, WorkspaceError::DirectoryExists(p) if p == dir));
        assert_eq!(
            fs::read_to_string(dir.join("result.out")).unwrap(),
            "previous run"
        );
    }

    #[test]
    fn import_copies_and_leaves_source_in_place() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::new(tmp.path());
        let from = ws.create_stage("a").unwrap();
        let to = ws.create_stage("b").unwrap();
        let source = from.join("opt.xyz");
        fs::write(&source, "1\n\nH 0 0 0\n").unwrap();

        let copied = ws.import_artifact(&source, &to, None).unwrap();

        assert_eq!(copied, to.join("opt.xyz"));
        assert!(source.exists());
        assert_eq!(fs::read_to_string(copied).unwrap(), "1\n\nH 0 0 0\n");
    }

    #[test]
    fn import_can_rename() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::new(tmp.path());
        let to = ws.create_stage("neb").unwrap();
        let source = tmp.path().join("scan.xyz");
        fs::write(&source, "x").unwrap();

        let copied = ws.import_artifact(&source, &to, Some("start.xyz")).unwrap();

        assert_eq!(copied, to.join("start.xyz"));
        assert!(!to.join("scan.xyz").exists());
    }

    #[test]
    fn import_of_missing_file_fails() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::new(tmp.path());
        let missing = tmp.path().join("nope.xyz");

        let err = ws.import_artifact(&missing, tmp.path(), None).unwrap_err();

        assert!(matches!(err, WorkspaceError::MissingArtifact(p) if p == missing));
    }
}
