// =============================================================================
// GetTicks wire model
// =============================================================================
//
// Envelope:
//   { "success": true, "message": "", "result": [ { "O": .., "H": .., "L": ..,
//     "C": .., "V": .., "T": "2017-08-30T10:40:00", "BV": .. }, ... ] }
//
// `T` carries no zone designator; it is UTC.
// =============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::error::RemoteDataError;

/// One-minute tick exactly as the provider reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTick {
    #[serde(rename = "O")]
    pub open: f64,
    #[serde(rename = "H")]
    pub high: f64,
    #[serde(rename = "L")]
    pub low: f64,
    #[serde(rename = "C")]
    pub close: f64,
    #[serde(rename = "V")]
    pub volume: f64,
    #[serde(rename = "T", deserialize_with = "deserialize_tick_time")]
    pub time: DateTime<Utc>,
    /// Volume in the base currency. Not used downstream.
    #[serde(rename = "BV", default)]
    pub base_volume: Option<f64>,
}

impl RawTick {
    fn validate(&self) -> Result<(), String> {
        let fields = [
            ("O", self.open),
            ("H", self.high),
            ("L", self.low),
            ("C", self.close),
            ("V", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "field {name} must be a non-negative finite number, got {value}"
                ));
            }
        }
        if self.low > self.high {
            return Err(format!("low {} above high {}", self.low, self.high));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TicksEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Vec<serde_json::Value>>,
}

/// Decode and validate a GetTicks response body.
///
/// A `success: false` envelope becomes [`RemoteDataError::Provider`]; a record
/// that is missing a field or carries a negative / non-finite price becomes
/// [`RemoteDataError::Malformed`]. A `null` result on success is an empty
/// list.
pub fn parse_ticks_response(body: &str) -> Result<Vec<RawTick>, RemoteDataError> {
    let envelope: TicksEnvelope =
        serde_json::from_str(body).map_err(|error| RemoteDataError::Decode {
            error,
            payload: truncate(body, 256),
        })?;

    if !envelope.success {
        return Err(RemoteDataError::Provider(
            envelope.message.unwrap_or_default(),
        ));
    }

    let records = envelope.result.unwrap_or_default();
    let mut ticks = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let tick: RawTick = serde_json::from_value(record).map_err(|e| {
            RemoteDataError::Malformed {
                index,
                reason: e.to_string(),
            }
        })?;
        tick.validate()
            .map_err(|reason| RemoteDataError::Malformed { index, reason })?;
        ticks.push(tick);
    }

    Ok(ticks)
}

fn deserialize_tick_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_tick_time(&raw).map_err(serde::de::Error::custom)
}

/// Accepts the provider's naive `2017-08-30T10:40:00` form (with optional
/// fractional seconds) as well as full RFC 3339.
pub fn parse_tick_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid tick timestamp '{raw}': {e}"))
}

fn truncate(body: &str, max: usize) -> String {
    body.chars().take(max).collect()
}
