//! Feature assembly.
//!
//! Responsibilities:
//!
//! - build the feature matrix from plain or file-shaped batches
//! - expand uncertainty-mode records into Monte Carlo feature rows

pub mod assemble;
pub mod sampling;

pub use assemble::*;
pub use sampling::*;
