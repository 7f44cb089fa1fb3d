//! Provides input/output functionality for atomic-coordinate files.
//!
//! Every artifact handed between pipeline stages is an XYZ file: a declared atom count,
//! a free-form comment line, then one `element x y z` record per atom. This module
//! exposes a trait-based reader/writer and the splitter for multi-frame ensembles.

pub mod ensemble;
pub mod traits;
pub mod xyz;
