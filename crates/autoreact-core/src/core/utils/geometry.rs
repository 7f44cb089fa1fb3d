use crate::core::io::traits::StructureFile;
use crate::core::io::xyz::{XyzError, XyzFile};
use crate::core::models::reaction::ActiveAtomPair;
use crate::core::models::structure::Structure;
use nalgebra::distance;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Separation (Å) below which the active bond counts as formed.
///
/// Fixed, non-adaptive domain constant; an endpoint whose active-atom distance is exactly
/// at the threshold is still a START.
pub const BOND_FORMED_THRESHOLD_ANGSTROM: f64 = 1.85;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Atom index {index} is out of range for a structure with {atom_count} atoms")]
    AtomIndexOutOfRange { index: usize, atom_count: usize },
    #[error(transparent)]
    Structure(#[from] XyzError),
}

/// Euclidean distance between two atoms of a structure, by 0-based index.
pub fn atom_distance(structure: &Structure, a: usize, b: usize) -> Result<f64, GeometryError> {
    let lookup = |index: usize| {
        structure
            .atom(index)
            .ok_or(GeometryError::AtomIndexOutOfRange {
                index,
                atom_count: structure.atom_count(),
            })
    };
    let first = lookup(a)?;
    let second = lookup(b)?;
    Ok(distance(&first.position, &second.position))
}

/// Reads an XYZ file and measures the distance between two of its atoms.
pub fn distance_in_file(path: &Path, a: usize, b: usize) -> Result<f64, GeometryError> {
    let structure = XyzFile::read_from_path(path)?;
    atom_distance(&structure, a, b)
}

/// Distance between the active atoms of the structure stored at `path`.
pub fn active_distance(path: &Path, pair: &ActiveAtomPair) -> Result<f64, GeometryError> {
    distance_in_file(path, pair.first(), pair.second())
}

/// Which side of the reaction an IRC endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EndpointClass {
    Start,
    Product,
}

impl EndpointClass {
    /// Applies the bond-formed rule: strictly below `threshold` is a product.
    pub fn classify(distance: f64, threshold: f64) -> Self {
        if distance < threshold {
            Self::Product
        } else {
            Self::Start
        }
    }
}

impl fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Product => write!(f, "PRODUCT"),
        }
    }
}
