use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bittrex::RawTick;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single one-minute OHLCV candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl From<RawTick> for Candle {
    fn from(tick: RawTick) -> Self {
        Self::new(tick.time, tick.open, tick.high, tick.low, tick.close, tick.volume)
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Turn provider ticks into the canonical candle sequence.
///
/// * Auxiliary fields (`BV`) are dropped.
/// * Output is sorted ascending by timestamp.
/// * Only candles strictly newer than `minimum_date` are kept.
/// * Duplicate timestamps collapse to the record that arrived last, so the
///   output timestamps are strictly increasing.
///
/// Empty input, or input entirely at or before the cutoff, yields an empty
/// vector.
pub fn normalize(ticks: Vec<RawTick>, minimum_date: DateTime<Utc>) -> Vec<Candle> {
    let received = ticks.len();

    let mut candles: Vec<Candle> = ticks
        .into_iter()
        .map(Candle::from)
        .filter(|c| c.timestamp > minimum_date)
        .collect();

    // Stable sort keeps arrival order among equal timestamps.
    candles.sort_by_key(|c| c.timestamp);

    let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        match deduped.last_mut() {
            Some(last) if last.timestamp == candle.timestamp => *last = candle,
            _ => deduped.push(candle),
        }
    }

    debug!(
        received,
        kept = deduped.len(),
        minimum_date = %minimum_date,
        "ticks normalized"
    );
    deduped
}

/// Close prices, oldest first.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
