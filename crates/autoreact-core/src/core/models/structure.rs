use nalgebra::Point3;

/// A single atom record of an XYZ structure.
///
/// Atoms carry no identity beyond their position in the parent [`Structure`]; the
/// 0-based index of an atom is stable across every stage of the pipeline, so the same
/// physical atom is addressed by the same index from the precomplex to the IRC endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The element label exactly as it appears in the file (e.g., "C", "Pd").
    pub element: String,
    /// The Cartesian coordinates of the atom, in the length unit of the file (Å).
    pub position: Point3<f64>,
}

impl Atom {
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: element.to_string(),
            position,
        }
    }
}

/// An ordered set of atoms with the free-form comment line of its XYZ frame.
///
/// The declared atom count of the file format is not stored separately: it is always
/// `atoms.len()`, which is what the reader validates against the header and what the
/// writer emits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    /// The second line of the XYZ frame (title, energy, or empty).
    pub comment: String,
    /// The coordinate records, in file order.
    pub atoms: Vec<Atom>,
}

impl Structure {
    pub fn new(comment: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Self {
            comment: comment.into(),
            atoms,
        }
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
