//! Item prices supplied by the host: market quotes with vendor fallback.

pub mod logic;
pub mod types;

pub use logic::*;
pub use types::*;
