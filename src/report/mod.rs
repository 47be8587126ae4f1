//! Post-inference reporting: unit reconciliation, per-record partitioning and
//! terminal summaries.

pub mod format;
pub mod partition;
pub mod units;

pub use format::*;
pub use partition::*;
pub use units::*;
