//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the recognized parameter schema (`ParamSchema`)
//! - request shapes (`InputBatch`, `Measurement`)
//! - run configuration (`InferenceConfig`) and the final `ResultMapping`

pub mod types;

pub use types::*;
