//! Consumers of the engine: the advice table, gear valuation and session
//! predictions, all served from one memoized refresh.

pub mod cache;
pub mod logic;

pub use cache::*;
pub use logic::*;
