//! Text and JSON rendering. Rounding happens here and nowhere else.

use crate::advisor::{GearValuation, SessionPrediction};
use crate::enhancement::{CostTable, ProgressionResult, StrategyComparison};
use serde::Serialize;

/// Shown where a number cannot be calculated.
pub const UNAVAILABLE: &str = "unavailable";

/// Appended to totals that miss a market price.
pub const INCOMPLETE_MARK: &str = "*";

/// Coins with K/M/B suffixes, e.g. 1.25M.
pub fn format_coins(coins: f64) -> String {
    if !coins.is_finite() {
        return UNAVAILABLE.to_string();
    }
    let abs = coins.abs();
    if abs >= 1e9 {
        format!("{:.2}B", coins / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", coins / 1e6)
    } else if abs >= 1e4 {
        format!("{:.1}K", coins / 1e3)
    } else {
        format!("{:.0}", coins)
    }
}

/// Seconds as "1d 2h 3m", "2h 3m", "3m 4s" or "4s".
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return UNAVAILABLE.to_string();
    }
    let d = chrono::Duration::seconds(seconds.round() as i64);
    let days = d.num_days();
    let hours = d.num_hours() % 24;
    let minutes = d.num_minutes() % 60;
    let secs = d.num_seconds() % 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

fn total_cell(result: &ProgressionResult) -> String {
    let mark = if result.is_complete() { "" } else { INCOMPLETE_MARK };
    format!("{}{}", format_coins(result.total_cost), mark)
}

/// Advice-panel table for one policy.
pub fn table_text(item_id: &str, table: &CostTable) -> String {
    let mut report = String::new();

    report.push_str("═══════════════════════════════════════════════════════════════\n");
    report.push_str(&format!("  {}: {}\n", item_id, table.policy.id()));
    report.push_str("═══════════════════════════════════════════════════════════════\n");
    report.push_str("  Level   Attempts   Protects        Time       Total\n");
    report.push_str("  ─────   ────────   ────────   ─────────   ─────────\n");
    for row in &table.rows {
        report.push_str(&format!(
            "  +{:<4}   {:>8.1}   {:>8.1}   {:>9}   {:>9}\n",
            row.target_level,
            row.expected_attempts,
            row.expected_protection_uses,
            format_duration(row.expected_time),
            total_cell(row)
        ));
    }
    if let Some(unavailable) = &table.unavailable {
        report.push_str(&format!(
            "  +{:<4}   {}: {}\n",
            unavailable.level, UNAVAILABLE, unavailable.reason
        ));
    }
    if table.rows.iter().any(|r| !r.is_complete()) {
        report.push_str(&format!(
            "\n  {} incomplete: some prices are missing or vendor-only\n",
            INCOMPLETE_MARK
        ));
    }
    report
}

/// Strategy advisory: best policy per level and the recovery-item crossover.
pub fn comparison_text(comparison: &StrategyComparison) -> String {
    let mut report = String::new();

    report.push_str("── CHEAPEST STRATEGY ────────────────────────────────────────────\n");
    for choice in &comparison.levels {
        match &choice.best {
            Some(best) => {
                let mark = if best.complete { "" } else { INCOMPLETE_MARK };
                report.push_str(&format!(
                    "  +{:<4} {:<20} {:>10}{}",
                    choice.level,
                    best.policy.to_string(),
                    format_coins(best.total_cost),
                    mark
                ));
            }
            None => report.push_str(&format!(
                "  +{:<4} {:<20} {:>10}",
                choice.level, "-", UNAVAILABLE
            )),
        }
        if let Some(step) = choice.recovery.as_ref().filter(|s| s.uses_recovery) {
            let mark = if step.complete { "" } else { INCOMPLETE_MARK };
            report.push_str(&format!("   recovery {}{}", format_coins(step.path_cost), mark));
        }
        report.push('\n');
    }

    if !comparison.excluded.is_empty() {
        let names: Vec<String> = comparison.excluded.iter().map(|p| p.to_string()).collect();
        report.push_str(&format!("\n  Excluded (unreachable): {}\n", names.join(", ")));
    }

    for gap in &comparison.recovery_gaps {
        report.push_str(&format!(
            "\n  {} '{}' has no market price\n",
            INCOMPLETE_MARK, gap.item_id
        ));
    }
    let mark = if comparison.recovery_complete { "" } else { INCOMPLETE_MARK };
    match (comparison.crossover_level, comparison.cumulative_savings) {
        (Some(level), Some(savings)) => report.push_str(&format!(
            "\n  Switch to the recovery item at +{}, saving {}{} by the last level\n",
            level,
            format_coins(savings),
            mark
        )),
        (Some(level), None) => report.push_str(&format!(
            "\n  Recovery item is cheaper from +{}{}\n",
            level, mark
        )),
        (None, _) => {}
    }
    if !comparison.recovery_complete {
        report.push_str(&format!(
            "  {} recovery advice rests on incomplete prices\n",
            INCOMPLETE_MARK
        ));
    }
    report
}

/// One (start → target) estimate.
pub fn progression_text(result: &ProgressionResult) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "+{} → +{} ({})\n",
        result.start_level,
        result.target_level,
        result.policy.id()
    ));
    report.push_str(&format!("  Attempts:     {:.2}\n", result.expected_attempts));
    report.push_str(&format!("  Protections:  {:.2}\n", result.expected_protection_uses));
    report.push_str(&format!("  Time:         {}\n", format_duration(result.expected_time)));
    report.push_str(&format!("  Materials:    {}\n", format_coins(result.material_cost)));
    report.push_str(&format!("  Protection:   {}\n", format_coins(result.protection_cost)));
    report.push_str(&format!("  Total:        {}\n", total_cell(result)));
    for gap in &result.price_gaps {
        match gap.vendor_fallback {
            Some(vendor) => report.push_str(&format!(
                "  {} {} priced at vendor value {}\n",
                INCOMPLETE_MARK,
                gap.item_id,
                format_coins(vendor)
            )),
            None => report.push_str(&format!(
                "  {} {} has no price\n",
                INCOMPLETE_MARK, gap.item_id
            )),
        }
    }
    report
}

pub fn valuation_text(item_id: &str, valuation: &GearValuation) -> String {
    let mark = if valuation.complete { "" } else { INCOMPLETE_MARK };
    let mut report = format!(
        "{} +{}: {}{} (base {} + enhancing {}, {})\n",
        item_id,
        valuation.level,
        format_coins(valuation.total_value),
        mark,
        format_coins(valuation.base_item_value),
        format_coins(valuation.enhancement_cost),
        valuation.policy
    );
    if let Some(gap) = &valuation.base_gap {
        report.push_str(&format!(
            "  {} base item '{}' has no market price\n",
            INCOMPLETE_MARK, gap.item_id
        ));
    }
    report
}

pub fn prediction_text(prediction: &SessionPrediction) -> String {
    let mut report = progression_text(&prediction.remaining);
    report.push_str(&format!("  Progress:     {:.1}%\n", prediction.progress * 100.0));
    report
}

/// Pretty JSON for any report payload.
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
