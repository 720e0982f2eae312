use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything known about one item's price at snapshot time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Lowest sell listing
    #[serde(default)]
    pub ask: Option<f64>,
    /// Highest buy order
    #[serde(default)]
    pub bid: Option<f64>,
    /// Fixed price the game's vendor pays
    #[serde(default)]
    pub vendor: Option<f64>,
}

impl PriceQuote {
    pub fn market(ask: f64, bid: f64) -> Self {
        Self {
            ask: Some(ask),
            bid: Some(bid),
            vendor: None,
        }
    }

    pub fn vendor_only(vendor: f64) -> Self {
        Self {
            vendor: Some(vendor),
            ..Default::default()
        }
    }
}

/// Which side of the order book to value items at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMode {
    /// Buying instantly from sellers
    #[default]
    Ask,
    /// Filling buy orders
    Bid,
    /// Average of ask and bid
    Mid,
}

/// Source of item prices. Implemented by the host's market cache.
pub trait PriceProvider {
    fn quote(&self, item_id: &str) -> Option<PriceQuote>;
}

impl<F> PriceProvider for F
where
    F: Fn(&str) -> Option<PriceQuote>,
{
    fn quote(&self, item_id: &str) -> Option<PriceQuote> {
        self(item_id)
    }
}

/// In-memory price table, as loaded from a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketPrices {
    quotes: HashMap<String, PriceQuote>,
}

impl MarketPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item_id: impl Into<String>, quote: PriceQuote) {
        self.quotes.insert(item_id.into(), quote);
    }

    pub fn with(mut self, item_id: impl Into<String>, quote: PriceQuote) -> Self {
        self.insert(item_id, quote);
        self
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl PriceProvider for MarketPrices {
    fn quote(&self, item_id: &str) -> Option<PriceQuote> {
        self.quotes.get(item_id).copied()
    }
}

impl<K: Into<String>> FromIterator<(K, PriceQuote)> for MarketPrices {
    fn from_iter<I: IntoIterator<Item = (K, PriceQuote)>>(iter: I) -> Self {
        Self {
            quotes: iter.into_iter().map(|(k, q)| (k.into(), q)).collect(),
        }
    }
}

/// How a single price was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedPrice {
    Market(f64),
    Vendor(f64),
    Missing,
}

impl ResolvedPrice {
    /// Price usable in a partial total; `Missing` contributes nothing.
    pub fn value(&self) -> Option<f64> {
        match self {
            ResolvedPrice::Market(p) | ResolvedPrice::Vendor(p) => Some(*p),
            ResolvedPrice::Missing => None,
        }
    }
}

/// A price the totals could not take from the market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceGap {
    pub item_id: String,
    /// Vendor price used instead, if any; None means left out of the total
    pub vendor_fallback: Option<f64>,
}
