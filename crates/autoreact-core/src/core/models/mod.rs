//! Data models for molecular structures and the reaction being searched.

pub mod reaction;
pub mod structure;
