//! Core data structures for the Genesis simulation.

pub mod behavior;
pub mod capability;
pub mod entity;
pub mod environment;
pub mod event;
pub mod genotype;
pub mod nutrition;
