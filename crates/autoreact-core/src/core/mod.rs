//! # Core Module
//!
//! Stateless building blocks shared by every stage of the reaction-path pipeline.
//!
//! - **Molecular Representation** ([`models`]) - Atoms, structures, the active atom pair
//!   and the opaque scan constraints.
//! - **File I/O** ([`io`]) - XYZ reading and writing, and splitting of multi-frame
//!   conformer ensembles into single-frame files.
//! - **Geometry** ([`utils`]) - Interatomic distances and the bond-formed threshold rule
//!   used to classify IRC endpoints.

pub mod io;
pub mod models;
pub mod utils;
