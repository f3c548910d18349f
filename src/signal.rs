// =============================================================================
// Signal Classifier
// =============================================================================
//
// Buy when, on the latest row:
//   stochrsi < threshold  AND  macd > macds  AND  close > sar
//
// Any indicator that has not warmed up makes the predicate false. The result
// is then gated on freshness: a row whose candle is older than
// `now - freshness` never produces a buy.
// =============================================================================

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::analysis::{AnalyzedSeries, SignalRow};
use crate::decision::SignalDecision;
use crate::types::Pair;

/// The buy predicate. Total: missing inputs evaluate to `false`.
pub fn buy_predicate(row: &SignalRow, stochrsi_buy_below: f64) -> bool {
    match (row.stochrsi, row.macd, row.macds, row.sar) {
        (Some(stochrsi), Some(macd), Some(macds), Some(sar)) => {
            stochrsi < stochrsi_buy_below && macd > macds && row.close > sar
        }
        _ => false,
    }
}

/// A candle is fresh when it is not older than `now - freshness`.
pub fn is_fresh(candle_time: DateTime<Utc>, now: DateTime<Utc>, freshness: Duration) -> bool {
    candle_time >= now - freshness
}

/// Classify a single row (the latest of a series, or `None` for an empty one).
pub fn classify_row(
    pair: &Pair,
    row: Option<&SignalRow>,
    stochrsi_buy_below: f64,
    now: DateTime<Utc>,
    freshness: Duration,
) -> SignalDecision {
    let Some(row) = row else {
        debug!(pair = %pair, "empty series, no signal");
        return SignalDecision::insufficient_data(pair, now);
    };

    let predicate = buy_predicate(row, stochrsi_buy_below);

    if !is_fresh(row.timestamp, now, freshness) {
        let age = now - row.timestamp;
        warn!(
            pair = %pair,
            candle_time = %row.timestamp,
            age_minutes = age.num_minutes(),
            predicate,
            "latest candle is stale, forcing no-buy"
        );
        return SignalDecision::stale(pair, row, predicate, age, now);
    }

    let decision = SignalDecision::evaluated(pair, row, predicate, now);
    info!(
        timestamp = %row.timestamp,
        pair = %pair,
        signal = predicate,
        buy_price = ?decision.buy_price(),
        "buy_trigger"
    );
    decision
}

/// Classify the latest row of an analysed series.
pub fn classify(
    pair: &Pair,
    series: &AnalyzedSeries,
    stochrsi_buy_below: f64,
    now: DateTime<Utc>,
    freshness: Duration,
) -> SignalDecision {
    classify_row(pair, series.latest().as_ref(), stochrsi_buy_below, now, freshness)
}
