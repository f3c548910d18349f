// =============================================================================
// Signal Decision — auditable record of one buy / no-buy evaluation
// =============================================================================
//
// One record per (pair, invocation). `buy` is the signal itself; `predicate`
// keeps the raw indicator verdict so a stale-but-favourable row stays
// visible after the freshness gate forced the signal off.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::SignalRow;
use crate::types::{Pair, SignalOutcome};

#[derive(Debug, Clone, Serialize)]
pub struct SignalDecision {
    /// Unique identifier for this decision (UUID v4).
    pub id: String,

    pub pair: Pair,

    /// The signal.
    pub buy: bool,

    /// Whether the indicator predicate held, before the freshness gate.
    pub predicate: bool,

    pub outcome: SignalOutcome,

    /// Timestamp of the candle the decision was derived from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candle_time: Option<DateTime<Utc>>,

    /// Close of that candle; the buy price when `buy` holds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<f64>,

    /// Human-readable reason for a no-buy that was not a plain predicate miss.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Wall-clock time of the evaluation.
    pub evaluated_at: DateTime<Utc>,
}

impl SignalDecision {
    fn base(pair: &Pair, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pair: pair.clone(),
            buy: false,
            predicate: false,
            outcome: SignalOutcome::InsufficientData,
            candle_time: None,
            close: None,
            reason: None,
            evaluated_at,
        }
    }

    /// The series had no candle to evaluate.
    pub fn insufficient_data(pair: &Pair, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            reason: Some("no candles newer than the minimum date".to_string()),
            ..Self::base(pair, evaluated_at)
        }
    }

    /// The latest candle is too old; the signal is forced off.
    pub fn stale(
        pair: &Pair,
        row: &SignalRow,
        predicate: bool,
        age: chrono::Duration,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            predicate,
            outcome: SignalOutcome::Stale,
            candle_time: Some(row.timestamp),
            close: Some(row.close),
            reason: Some(format!("latest candle is {} minutes old", age.num_minutes())),
            ..Self::base(pair, evaluated_at)
        }
    }

    /// A fresh row: the signal is the predicate.
    pub fn evaluated(
        pair: &Pair,
        row: &SignalRow,
        predicate: bool,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            buy: predicate,
            predicate,
            outcome: if predicate {
                SignalOutcome::Buy
            } else {
                SignalOutcome::NoBuy
            },
            candle_time: Some(row.timestamp),
            close: Some(row.close),
            ..Self::base(pair, evaluated_at)
        }
    }

    /// Buy price for downstream inspection; only present on a buy.
    pub fn buy_price(&self) -> Option<f64> {
        if self.buy {
            self.close
        } else {
            None
        }
    }
}
