//! Shared enhancement constants.
//!
//! Game-balance tables (base curves, material lists, prices) are NOT defined
//! here. They arrive with each snapshot so the engine can be exercised
//! against any table.

// =============================================================================
// LEVEL BOUNDS
// =============================================================================

/// Highest enhancement level an item can reach.
pub const MAX_ENHANCEMENT_LEVEL: u8 = 20;

/// Lowest threshold the comparator proposes for continuous protection.
/// Protecting the +1 attempt is equivalent to not protecting it.
pub const MIN_PROTECT_LEVEL: u8 = 2;

// =============================================================================
// PROBABILITIES
// =============================================================================

/// Success probabilities below this floor are treated as zero.
/// Hitting times grow like (1/p)^L, so anything smaller overflows
/// long before it becomes meaningful.
pub const MIN_SUCCESS_PROBABILITY: f64 = 1e-12;

/// Success-rate bonus (percentage points) per character level above the item level.
pub const SUCCESS_PCT_PER_LEVEL_ADVANTAGE: f64 = 0.05;

/// Action-speed bonus (percent) per character level above the item level.
pub const SPEED_PCT_PER_LEVEL_ADVANTAGE: f64 = 1.0;

// =============================================================================
// TIME & PRICES
// =============================================================================

/// Seconds per enhancing action before any speed bonus.
pub const DEFAULT_BASE_ACTION_SECONDS: f64 = 12.0;

/// Item id of the game currency; always worth exactly one coin.
pub const COIN_ITEM_ID: &str = "coin";
