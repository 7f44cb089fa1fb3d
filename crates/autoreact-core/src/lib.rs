//! # autoreact Core Library
//!
//! Automated reaction-path discovery between a precomplex and its product, driven
//! through external quantum-chemistry and conformer-search engines.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `ActiveAtomPair`,
//!   `ConstraintSet`), XYZ file I/O, ensemble splitting and the geometric measurements
//!   used to classify IRC endpoints.
//!
//! - **[`engine`]: The Machinery.** Pipeline configuration, the error taxonomy, progress
//!   reporting, isolated stage workspaces, stage definitions, input-deck rendering and the
//!   fail-fast invoker for external executables.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the layers below:
//!   the staged reaction-path pipeline and the conformer fan-out that prepares one
//!   pipeline directory per conformer.

pub mod core;
pub mod engine;
pub mod workflows;
