use std::fmt;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ActiveAtomsError {
    #[error("Active-atom record contains no atom indices")]
    Empty,
    #[error("Active-atom record needs at least two indices, found {found}")]
    TooFew { found: usize },
    #[error("Invalid atom index '{value}' in active-atom record (expected a non-negative integer)")]
    InvalidIndex { value: String },
    #[error("Active atoms must be two distinct atoms, got {index} twice")]
    Duplicate { index: usize },
}

/// The two atoms whose separation drives the scan and classifies the IRC endpoints.
///
/// Indices are 0-based and refer to the same physical atoms in every stage. The pair is
/// read once at pipeline start and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveAtomPair {
    first: usize,
    second: usize,
}

impl ActiveAtomPair {
    pub fn new(first: usize, second: usize) -> Result<Self, ActiveAtomsError> {
        if first == second {
            return Err(ActiveAtomsError::Duplicate { index: first });
        }
        Ok(Self { first, second })
    }

    /// Parses an active-atom record: comma-separated integers, possibly spread over
    /// several lines. The first two indices form the pair; any further ones are ignored.
    pub fn parse(text: &str) -> Result<Self, ActiveAtomsError> {
        let mut indices = Vec::new();
        for token in text.lines().flat_map(|line| line.split(',')) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let index: usize = token.parse().map_err(|_| ActiveAtomsError::InvalidIndex {
                value: token.to_string(),
            })?;
            indices.push(index);
        }

        match indices.len() {
            0 => Err(ActiveAtomsError::Empty),
            1 => Err(ActiveAtomsError::TooFew { found: 1 }),
            n => {
                if n > 2 {
                    warn!(
                        "Active-atom record lists {} indices; only the first two ({}, {}) are used.",
                        n, indices[0], indices[1]
                    );
                }
                Self::new(indices[0], indices[1])
            }
        }
    }

    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    #[inline]
    pub fn second(&self) -> usize {
        self.second
    }
}

impl fmt::Display for ActiveAtomPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.second)
    }
}

/// Opaque constraint directives forwarded verbatim into the scan stage.
///
/// `Absent` and an empty directive list are different states: a constraint file that
/// exists but is empty still yields an (empty) constraints block in the scan deck.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConstraintSet {
    #[default]
    Absent,
    Directives(Vec<String>),
}

impl ConstraintSet {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Directives(lines.into_iter().map(Into::into).collect())
    }

    /// Reads the constraint file if it exists; a missing file is a valid "no constraints" state.
    pub fn load_optional(path: &Path) -> io::Result<Self> {
        if !path.is_file() {
            info!("Constraint file {:?} not found; scanning without constraints.", path);
            return Ok(Self::Absent);
        }
        let content = std::fs::read_to_string(path)?;
        let set = Self::from_lines(content.lines());
        debug!("Loaded {} constraint directive(s) from {:?}.", set.len(), path);
        Ok(set)
    }

    pub fn directives(&self) -> Option<&[String]> {
        match self {
            Self::Absent => None,
            Self::Directives(lines) => Some(lines),
        }
    }

    pub fn len(&self) -> usize {
        self.directives().map_or(0, <[String]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
