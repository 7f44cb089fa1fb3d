//! # Engine Module
//!
//! The machinery the workflows are assembled from.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The immutable run configuration, its builder and the
//!   named domain constants (scan target, classification threshold, ...)
//! - **Error Handling** ([`error`]) - The error taxonomy surfaced by every workflow
//! - **Progress Monitoring** ([`progress`]) - Stage start/finish events for front ends
//! - **Workspaces** ([`workspace`]) - One fresh directory per stage, artifacts copied in
//! - **Stages** ([`stage`]) - Directory layout, deck names and expected outputs per stage
//! - **Input Decks** ([`decks`]) - Rendering of the engine input text for each stage
//! - **Invocation** ([`invoker`]) - Blocking, fail-fast execution of external programs

pub mod config;
pub mod decks;
pub mod error;
pub mod invoker;
pub mod progress;
pub mod stage;
pub mod workspace;
