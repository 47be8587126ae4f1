//! `exo-interior` library crate.
//!
//! Turns measured planetary parameters (optionally with uncertainties) into
//! predictive distributions of interior-structure quantities by driving a
//! fitted probabilistic regression model.
//!
//! The binary (`exo`) is a thin wrapper around this library so that the
//! inference core is testable without spawning processes.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod report;
pub mod scaling;
