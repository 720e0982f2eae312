use super::types::{PriceGap, PriceMode, PriceProvider, PriceQuote, ResolvedPrice};
use crate::constants::COIN_ITEM_ID;

/// Market listings use non-positive values for "no listing".
fn listed(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

/// Pick the market price for `mode`, if the quote has one.
pub fn market_price(quote: &PriceQuote, mode: PriceMode) -> Option<f64> {
    let ask = listed(quote.ask);
    let bid = listed(quote.bid);
    match mode {
        PriceMode::Ask => ask,
        PriceMode::Bid => bid,
        PriceMode::Mid => match (ask, bid) {
            (Some(a), Some(b)) => Some((a + b) / 2.0),
            (a, b) => a.or(b),
        },
    }
}

/// Resolve one item's price: market first, then vendor.
pub fn resolve_price<P: PriceProvider + ?Sized>(
    provider: &P,
    item_id: &str,
    mode: PriceMode,
) -> ResolvedPrice {
    if item_id == COIN_ITEM_ID {
        return ResolvedPrice::Market(1.0);
    }
    let Some(quote) = provider.quote(item_id) else {
        return ResolvedPrice::Missing;
    };
    if let Some(price) = market_price(&quote, mode) {
        return ResolvedPrice::Market(price);
    }
    match quote.vendor.filter(|v| v.is_finite() && *v >= 0.0) {
        Some(vendor) => ResolvedPrice::Vendor(vendor),
        None => ResolvedPrice::Missing,
    }
}

/// Resolve a price and record a gap when it did not come from the market.
/// Returns the value to add to a partial total, or None to leave it out.
pub fn price_with_gaps<P: PriceProvider + ?Sized>(
    provider: &P,
    item_id: &str,
    mode: PriceMode,
    gaps: &mut Vec<PriceGap>,
) -> Option<f64> {
    let resolved = resolve_price(provider, item_id, mode);
    let vendor_fallback = match resolved {
        ResolvedPrice::Market(price) => return Some(price),
        ResolvedPrice::Vendor(price) => Some(price),
        ResolvedPrice::Missing => None,
    };
    tracing::warn!(item = item_id, ?vendor_fallback, "no market price");
    if !gaps.iter().any(|g| g.item_id == item_id) {
        gaps.push(PriceGap {
            item_id: item_id.to_string(),
            vendor_fallback,
        });
    }
    resolved.value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::MarketPrices;

    fn prices() -> MarketPrices {
        MarketPrices::new()
            .with("holy_cheese", PriceQuote::market(1200.0, 1000.0))
            .with(
                "only_ask",
                PriceQuote {
                    ask: Some(50.0),
                    bid: Some(-1.0),
                    vendor: Some(5.0),
                },
            )
            .with("vendor_only", PriceQuote::vendor_only(80.0))
            .with("nothing", PriceQuote::default())
    }

    #[test]
    fn test_modes() {
        let p = prices();
        assert_eq!(resolve_price(&p, "holy_cheese", PriceMode::Ask), ResolvedPrice::Market(1200.0));
        assert_eq!(resolve_price(&p, "holy_cheese", PriceMode::Bid), ResolvedPrice::Market(1000.0));
        assert_eq!(resolve_price(&p, "holy_cheese", PriceMode::Mid), ResolvedPrice::Market(1100.0));
    }

    #[test]
    fn test_unlisted_side_falls_back() {
        let p = prices();
        assert_eq!(resolve_price(&p, "only_ask", PriceMode::Bid), ResolvedPrice::Vendor(5.0));
        assert_eq!(resolve_price(&p, "only_ask", PriceMode::Mid), ResolvedPrice::Market(50.0));
        assert_eq!(resolve_price(&p, "vendor_only", PriceMode::Ask), ResolvedPrice::Vendor(80.0));
    }

    #[test]
    fn test_missing() {
        let p = prices();
        assert_eq!(resolve_price(&p, "nothing", PriceMode::Ask), ResolvedPrice::Missing);
        assert_eq!(resolve_price(&p, "unknown", PriceMode::Ask), ResolvedPrice::Missing);
    }

    #[test]
    fn test_coin_needs_no_quote() {
        let empty = MarketPrices::new();
        assert_eq!(resolve_price(&empty, COIN_ITEM_ID, PriceMode::Bid), ResolvedPrice::Market(1.0));
    }

    #[test]
    fn test_gaps_recorded_once() {
        let p = prices();
        let mut gaps = Vec::new();
        assert_eq!(price_with_gaps(&p, "holy_cheese", PriceMode::Ask, &mut gaps), Some(1200.0));
        assert!(gaps.is_empty());
        assert_eq!(price_with_gaps(&p, "vendor_only", PriceMode::Ask, &mut gaps), Some(80.0));
        assert_eq!(price_with_gaps(&p, "unknown", PriceMode::Ask, &mut gaps), None);
        assert_eq!(price_with_gaps(&p, "unknown", PriceMode::Ask, &mut gaps), None);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].vendor_fallback, Some(80.0));
        assert_eq!(gaps[1].vendor_fallback, None);
    }

    #[test]
    fn test_closure_provider() {
        let provider = |id: &str| (id == "gear").then(|| PriceQuote::market(10.0, 9.0));
        assert_eq!(resolve_price(&provider, "gear", PriceMode::Ask), ResolvedPrice::Market(10.0));
        assert_eq!(resolve_price(&provider, "other", PriceMode::Ask), ResolvedPrice::Missing);
    }

    #[test]
    fn test_prices_from_json() {
        let p: MarketPrices =
            serde_json::from_str(r#"{"holy_cheese": {"ask": 1200.0, "bid": 1000.0}}"#).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(market_price(&p.quote("holy_cheese").unwrap(), PriceMode::Ask), Some(1200.0));
    }
}
