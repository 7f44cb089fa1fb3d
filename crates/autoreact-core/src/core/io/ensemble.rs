use crate::core::io::xyz::{XyzError, XyzParseErrorKind, parse_atom_count};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Splits a multi-frame XYZ ensemble into numbered single-frame files.
///
/// Every frame is `atom_count + 2` lines long (count line, comment line, coordinate
/// records), where `atom_count` is read from the first line of the file. Output files are
/// named `<prefix>1.xyz`, `<prefix>2.xyz`, ... (1-indexed) and are byte-for-byte copies of
/// their frame.
#[derive(Debug, Clone)]
pub struct EnsembleSplitter {
    prefix: String,
    max_count: Option<usize>,
}

impl Default for EnsembleSplitter {
    fn default() -> Self {
        Self {
            prefix: "conf".to_string(),
            max_count: None,
        }
    }
}

impl EnsembleSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of frames written; `None` writes every frame.
    pub fn max_count(mut self, max_count: Option<usize>) -> Self {
        self.max_count = max_count;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Splits `ensemble` into `out_dir` and returns the written paths in frame order.
    ///
    /// The whole file is validated before anything is written: its line count must be an
    /// exact multiple of the frame size and every frame must declare the same atom count
    /// as the first.
    pub fn split(&self, ensemble: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, XyzError> {
        let content = fs::read_to_string(ensemble)?;
        let lines: Vec<&str> = content.lines().collect();

        let first = lines.first().ok_or(XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::Empty,
        })?;
        let atom_count = parse_atom_count(first, 1)?;
        let block_len = atom_count.checked_add(2).ok_or_else(|| XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::InvalidAtomCount {
                value: first.trim().to_string(),
            },
        })?;

        if lines.len() % block_len != 0 {
            return Err(XyzError::MalformedEnsemble {
                total_lines: lines.len(),
                block_len,
            });
        }

        let frames: Vec<&[&str]> = lines.chunks(block_len).collect();
        for (i, frame) in frames.iter().enumerate() {
            let declared = parse_atom_count(frame[0], i * block_len + 1)?;
            if declared != atom_count {
                return Err(XyzError::InconsistentFrame {
                    frame: i + 1,
                    declared,
                    expected: atom_count,
                });
            }
        }

        let limit = self.max_count.unwrap_or(usize::MAX);
        debug!(
            "Ensemble {:?}: {} frame(s) of {} atoms, writing at most {}.",
            ensemble,
            frames.len(),
            atom_count,
            limit.min(frames.len())
        );

        let mut written = Vec::new();
        for (i, frame) in frames.into_iter().take(limit).enumerate() {
            let path = out_dir.join(format!("{}{}.xyz", self.prefix, i + 1));
            let mut writer = BufWriter::new(fs::File::create(&path)?);
            for line in frame {
                writeln!(writer, "{}", line)?;
            }
            writer.flush()?;
            written.push(path);
        }

        info!("Split {:?} into {} structure file(s).", ensemble, written.len());
        Ok(written)
    }
}
