//! Core data structures for the shoal simulation.

pub mod entity;
pub mod environment;
pub mod genotype;
