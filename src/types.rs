// =============================================================================
// Shared types used across the signal engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// A currency pair such as `BTC_ANT`.
///
/// Stored upper-case with `_` as the separator. The provider expects the
/// dash form (`BTC-ANT`), see [`Pair::market_name`]. Both forms are accepted
/// on input.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Pair(String);

impl Pair {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase().replace('-', "_"))
    }

    /// Provider market symbol, e.g. `BTC-ANT`.
    pub fn market_name(&self) -> String {
        self.0.replace('_', "-")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Pair {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for Pair {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.0
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalOutcome {
    /// Predicate held on a fresh candle.
    Buy,
    /// Predicate did not hold.
    NoBuy,
    /// Latest candle is older than the freshness threshold.
    Stale,
    /// The normalized series had no candles.
    #[default]
    InsufficientData,
}

impl std::fmt::Display for SignalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::NoBuy => write!(f, "NoBuy"),
            Self::Stale => write!(f, "Stale"),
            Self::InsufficientData => write!(f, "InsufficientData"),
        }
    }
}
