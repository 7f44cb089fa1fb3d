//! # Workflows Module
//!
//! Top-level procedures built on the engine layer.
//!
//! - **Reaction path** ([`reaction_path`]): the fixed stage sequence from a precomplex
//!   to solvated single points of the transition state and both reaction sides. Stages
//!   run strictly one after another in isolated directories and the first failure ends
//!   the run.
//! - **Conformers** ([`conformers`]): conformer search on a starting structure followed
//!   by a fan-out into one ready-to-run pipeline directory per conformer.

pub mod conformers;
pub mod reaction_path;
