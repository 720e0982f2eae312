//! Enhancement progression and cost engine.
//!
//! Leaves first: success rates ([`success`]), expected hitting times
//! ([`solver`]), time and coin totals ([`cost`]) and policy comparison
//! ([`strategy`]). Every function here is pure; callers pass in snapshots.

pub mod cost;
pub mod error;
pub mod snapshot;
pub mod solver;
pub mod strategy;
pub mod success;
pub mod types;

pub use cost::*;
pub use error::*;
pub use snapshot::*;
pub use solver::*;
pub use strategy::*;
pub use success::*;
pub use types::*;
