//! Errors raised by the enhancement engine.

pub type Result<T> = std::result::Result<T, EnhanceError>;

/// Errors that can occur while building or solving an enhancement model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnhanceError {
    /// Out-of-range level, missing curve entry or malformed number
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A level on the required path has no chance of success
    #[error("level +{level} is unreachable (success probability {probability})")]
    Unreachable { level: u8, probability: f64 },

    /// No market or vendor price for an item the result depends on
    #[error("no price data for item '{item_id}'")]
    MissingPriceData { item_id: String },
}

impl EnhanceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EnhanceError::InvalidInput(msg.into())
    }

    /// Whether the error means "cannot calculate" rather than "bad call".
    pub fn is_unreachable(&self) -> bool {
        matches!(self, EnhanceError::Unreachable { .. })
    }
}
