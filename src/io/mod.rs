//! Input/output helpers.
//!
//! - JSON request decoding (`request`)
//! - file-mode matrix ingest (`ingest`)
//! - fitted artifact loading (`artifacts`)
//! - JSON response writing (`export`)

pub mod artifacts;
pub mod export;
pub mod ingest;
pub mod request;

pub use artifacts::*;
pub use export::*;
pub use ingest::*;
pub use request::*;
