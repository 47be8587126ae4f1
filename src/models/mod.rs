//! Distributional regression models.
//!
//! The pipeline only sees the `DistributionalModel` trait; `mixture` provides a
//! concrete mixture-density model that can be loaded from JSON.

pub mod mixture;
pub mod model;

pub use mixture::*;
pub use model::*;
