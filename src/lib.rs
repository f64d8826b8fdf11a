//! # Genesis
//!
//! Digital organisms that eat data, unlock capabilities through frustration,
//! teach and trade with their neighbours and trial changes to their own
//! behavior on their offspring.
//!
//! The engine lives in `genesis_core`; this crate holds the world scheduler
//! ([`model::world::World`]) and the headless runner ([`app::App`]).

pub mod app;
pub mod model;
