// =============================================================================
// Runtime Configuration — pairs, polling cadence and indicator parameters
// =============================================================================
//
// Every tunable lives here so the polling driver can hand an explicit
// configuration to the stateless per-cycle evaluation. All fields carry
// `#[serde(default)]` so that a partial (or empty) JSON file still loads.
//
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Pair;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_pairs() -> Vec<Pair> {
    vec![Pair::new("BTC_ANT")]
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_lookback_hours() -> i64 {
    6
}

fn default_freshness_minutes() -> i64 {
    10
}

fn default_base_url() -> String {
    "https://bittrex.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_stochrsi_buy_below() -> f64 {
    20.0
}

fn default_ema_fast() -> usize {
    30
}

fn default_ema_slow() -> usize {
    90
}

fn default_sar_step() -> f64 {
    0.02
}

fn default_sar_max() -> f64 {
    0.2
}

fn default_rsi_period() -> usize {
    14
}

fn default_stoch_fastk() -> usize {
    5
}

fn default_stoch_fastd() -> usize {
    3
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Window sizes and factors for every indicator column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Short EMA window (column `ema30`).
    #[serde(default = "default_ema_fast")]
    pub ema_fast: usize,

    /// Long EMA window (column `ema90`).
    #[serde(default = "default_ema_slow")]
    pub ema_slow: usize,

    /// Parabolic SAR acceleration step.
    #[serde(default = "default_sar_step")]
    pub sar_step: f64,

    /// Parabolic SAR maximum acceleration.
    #[serde(default = "default_sar_max")]
    pub sar_max: f64,

    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// StochRSI %K look-back over RSI values.
    #[serde(default = "default_stoch_fastk")]
    pub stoch_fastk: usize,

    /// StochRSI %D smoothing.
    #[serde(default = "default_stoch_fastd")]
    pub stoch_fastd: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: default_ema_fast(),
            ema_slow: default_ema_slow(),
            sar_step: default_sar_step(),
            sar_max: default_sar_max(),
            rsi_period: default_rsi_period(),
            stoch_fastk: default_stoch_fastk(),
            stoch_fastd: default_stoch_fastd(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
        }
    }
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.ema_fast > 0 && self.ema_fast < self.ema_slow,
            "EMA needs 0 < fast < slow"
        );
        ensure!(
            self.sar_step > 0.0 && self.sar_max >= self.sar_step,
            "SAR step must be positive and not above the maximum acceleration"
        );
        ensure!(
            self.rsi_period > 0 && self.stoch_fastk > 0 && self.stoch_fastd > 0,
            "StochRSI periods must be positive"
        );
        ensure!(
            self.macd_fast > 0 && self.macd_signal > 0 && self.macd_fast < self.macd_slow,
            "MACD needs 0 < fast < slow and a positive signal period"
        );
        Ok(())
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the signal engine.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Polling ------------------------------------------------------------

    /// Pairs evaluated on every cycle, in order.
    #[serde(default = "default_pairs")]
    pub pairs: Vec<Pair>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// How far back the minimum date cutoff reaches.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,

    /// Signals derived from a candle older than this are forced to no-buy.
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: i64,

    // --- Data source --------------------------------------------------------

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra attempts after a transient fetch failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // --- Signal -------------------------------------------------------------

    /// StochRSI must be strictly below this for a buy.
    #[serde(default = "default_stochrsi_buy_below")]
    pub stochrsi_buy_below: f64,

    #[serde(default)]
    pub indicators: IndicatorParams,

    // --- Optional sinks -----------------------------------------------------

    /// Address for the read-only status API; disabled when absent.
    #[serde(default)]
    pub api_bind_addr: Option<String>,

    /// Directory for chart exports; disabled when absent.
    #[serde(default)]
    pub plot_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pairs: default_pairs(),
            poll_interval_secs: default_poll_interval_secs(),
            lookback_hours: default_lookback_hours(),
            freshness_minutes: default_freshness_minutes(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            stochrsi_buy_below: default_stochrsi_buy_below(),
            indicators: IndicatorParams::default(),
            api_bind_addr: None,
            plot_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            pairs = ?config.pairs,
            poll_interval_secs = config.poll_interval_secs,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply a comma-separated pair list (e.g. from `CANDLE_SIGNAL_PAIRS`).
    /// Blank entries are ignored; an all-blank list leaves the pairs as is.
    pub fn override_pairs(&mut self, raw: &str) {
        let pairs: Vec<Pair> = raw
            .split(',')
            .map(Pair::new)
            .filter(|p| !p.is_empty())
            .collect();
        if !pairs.is_empty() {
            self.pairs = pairs;
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.pairs.is_empty(), "at least one pair must be configured");
        ensure!(self.poll_interval_secs > 0, "poll interval must be positive");
        ensure!(self.lookback_hours > 0, "lookback must be positive");
        ensure!(self.freshness_minutes > 0, "freshness threshold must be positive");
        ensure!(self.request_timeout_secs > 0, "request timeout must be positive");
        self.indicators.validate()
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::hours(self.lookback_hours)
    }

    pub fn freshness(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.freshness_minutes)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.pairs, vec![Pair::new("BTC_ANT")]);
        assert_eq!(cfg.poll_interval_secs, 60);
        assert_eq!(cfg.lookback_hours, 6);
        assert_eq!(cfg.freshness_minutes, 10);
        assert_eq!(cfg.request_timeout_secs, 10);
        assert!(cfg.api_bind_addr.is_none());
        assert!((cfg.stochrsi_buy_below - 20.0).abs() < f64::EPSILON);
        assert_eq!(cfg.indicators.macd_fast, 12);
        assert_eq!(cfg.indicators.macd_slow, 26);
        assert_eq!(cfg.indicators.macd_signal, 9);
        assert_eq!(cfg.indicators.rsi_period, 14);
        assert!((cfg.indicators.sar_step - 0.02).abs() < f64::EPSILON);
        assert!((cfg.indicators.sar_max - 0.2).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.pairs.len(), 1);
        assert_eq!(cfg.indicators, IndicatorParams::default());
        assert_eq!(cfg.max_retries, 2);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "pairs": ["btc-eth", "BTC_GNT"], "indicators": { "ema_fast": 20 } }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.pairs, vec![Pair::new("BTC_ETH"), Pair::new("BTC_GNT")]);
        assert_eq!(cfg.indicators.ema_fast, 20);
        assert_eq!(cfg.indicators.ema_slow, 90);
        assert_eq!(cfg.poll_interval_secs, 60);
    }

    #[test]
    fn load_reads_file_and_missing_file_errors() {
        let dir = std::env::temp_dir().join(format!("candle-signal-cfg-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("signal_config.json");
        std::fs::write(&path, r#"{ "poll_interval_secs": 25 }"#).unwrap();

        let cfg = RuntimeConfig::load(&path).unwrap();
        assert_eq!(cfg.poll_interval_secs, 25);
        assert!(RuntimeConfig::load(dir.join("missing.json")).is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn override_pairs_from_env_style_list() {
        let mut cfg = RuntimeConfig::default();
        cfg.override_pairs("btc_eth, BTC-ETC ,,");
        assert_eq!(cfg.pairs, vec![Pair::new("BTC_ETH"), Pair::new("BTC_ETC")]);

        cfg.override_pairs(" , ");
        assert_eq!(cfg.pairs.len(), 2);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = RuntimeConfig::default();
        cfg.pairs.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.indicators.macd_fast = 26;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.indicators.ema_fast = 90;
        cfg.indicators.ema_slow = 30;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.indicators.ema_fast = 90;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.indicators.sar_step = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = RuntimeConfig::default();
        cfg.freshness_minutes = 0;
        assert!(cfg.validate().is_err());
    }
}
