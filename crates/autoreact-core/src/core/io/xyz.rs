use crate::core::io::traits::StructureFile;
use crate::core::models::structure::{Atom, Structure};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Declared atom count {declared} does not match the {found} coordinate record(s) present")]
    AtomCountMismatch { declared: usize, found: usize },
    #[error(
        "Malformed ensemble: {total_lines} line(s) is not a multiple of the {block_len}-line frame size"
    )]
    MalformedEnsemble { total_lines: usize, block_len: usize },
    #[error("Malformed ensemble: frame {frame} declares {declared} atoms, expected {expected}")]
    InconsistentFrame {
        frame: usize,
        declared: usize,
        expected: usize,
    },
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("File is empty")]
    Empty,
    #[error("Invalid atom count '{value}'")]
    InvalidAtomCount { value: String },
    #[error("Atom record needs an element and three coordinates")]
    TooFewFields,
    #[error("Invalid coordinate '{value}'")]
    InvalidFloat { value: String },
}

/// Parses the atom-count header line of an XYZ frame.
pub(crate) fn parse_atom_count(line: &str, line_num: usize) -> Result<usize, XyzError> {
    let value = line.trim();
    value.parse().map_err(|_| XyzError::Parse {
        line: line_num,
        kind: XyzParseErrorKind::InvalidAtomCount {
            value: value.to_string(),
        },
    })
}

/// Parses one `element x y z` record. Columns past the fourth are ignored.
pub(crate) fn parse_atom_record(line: &str, line_num: usize) -> Result<Atom, XyzError> {
    let mut fields = line.split_whitespace();
    let element = fields.next().ok_or(XyzError::Parse {
        line: line_num,
        kind: XyzParseErrorKind::TooFewFields,
    })?;

    let mut coords = [0.0f64; 3];
    for coord in coords.iter_mut() {
        let raw = fields.next().ok_or(XyzError::Parse {
            line: line_num,
            kind: XyzParseErrorKind::TooFewFields,
        })?;
        *coord = raw.parse().map_err(|_| XyzError::Parse {
            line: line_num,
            kind: XyzParseErrorKind::InvalidFloat {
                value: raw.to_string(),
            },
        })?;
    }

    Ok(Atom::new(
        element,
        Point3::new(coords[0], coords[1], coords[2]),
    ))
}

const MAX_PREALLOCATED_ATOMS: usize = 4096;

pub struct XyzFile;

impl StructureFile for XyzFile {
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut lines = reader.lines();

        let header = lines.next().transpose()?.ok_or(XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::Empty,
        })?;
        let declared = parse_atom_count(&header, 1)?;
        let comment = lines.next().transpose()?.unwrap_or_default();

        let mut atoms = Vec::with_capacity(declared.min(MAX_PREALLOCATED_ATOMS));
        let mut trailing_records = 0;
        for (offset, line_res) in lines.enumerate() {
            let line = line_res?;
            if line.trim().is_empty() {
                continue;
            }
            if atoms.len() < declared {
                atoms.push(parse_atom_record(&line, offset + 3)?);
            } else {
                trailing_records += 1;
            }
        }

        if atoms.len() != declared || trailing_records > 0 {
            return Err(XyzError::AtomCountMismatch {
                declared,
                found: atoms.len() + trailing_records,
            });
        }

        Ok(Structure::new(comment.trim_end(), atoms))
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        writeln!(writer, "{}", structure.atom_count())?;
        writeln!(writer, "{}", structure.comment)?;
        for atom in &structure.atoms {
            writeln!(
                writer,
                "{:<2} {:>15.8} {:>15.8} {:>15.8}",
                atom.element, atom.position.x, atom.position.y, atom.position.z
            )?;
        }
        Ok(())
    }
}
