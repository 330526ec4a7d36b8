//! Test fixtures for waste-dispatch.
//!
//! Provides:
//! - Real Jaipur collection points (from the city dashboard's seed data)
//! - A deterministic in-process route solver

pub mod fake_solver;
pub mod jaipur_locations;

pub use fake_solver::*;
pub use jaipur_locations::*;
