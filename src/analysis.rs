// =============================================================================
// Indicator Engine — candles in, aligned indicator columns out
// =============================================================================
//
// Pipeline:
//   1. EMA(fast) and EMA(slow) of close
//   2. Parabolic SAR from high / low
//   3. Fast %D of the stochastic RSI
//   4. MACD line, signal and histogram
//   5. Per-row buy predicate (`populate_buy_trend`)
//
// Every column has exactly as many entries as there are candles; `None`
// marks positions where the indicator has not warmed up yet.
// =============================================================================

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::indicators::ema::ema_column;
use crate::indicators::macd::calculate_macd;
use crate::indicators::sar::sar_column;
use crate::indicators::stoch_rsi::stoch_rsi_column;
use crate::indicators::Column;
use crate::market_data::{closes, Candle};
use crate::runtime_config::IndicatorParams;
use crate::signal::buy_predicate;

/// Indicator columns parallel to the candle sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorColumns {
    pub ema_fast: Column,
    pub ema_slow: Column,
    pub sar: Column,
    pub stochrsi: Column,
    pub macd: Column,
    pub macds: Column,
    pub macdh: Column,
}

impl IndicatorColumns {
    /// Column names paired with their values, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Column)> {
        [
            ("ema_fast", &self.ema_fast),
            ("ema_slow", &self.ema_slow),
            ("sar", &self.sar),
            ("stochrsi", &self.stochrsi),
            ("macd", &self.macd),
            ("macds", &self.macds),
            ("macdh", &self.macdh),
        ]
        .into_iter()
    }
}

/// The latest (or any) row of a series, reduced to what the buy predicate
/// reads.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub sar: Option<f64>,
    pub stochrsi: Option<f64>,
    pub macd: Option<f64>,
    pub macds: Option<f64>,
}

/// Candles plus everything derived from them for one evaluation.
#[derive(Debug, Clone, Default)]
pub struct AnalyzedSeries {
    pub candles: Vec<Candle>,
    pub indicators: IndicatorColumns,
    /// Predicate result per row.
    pub buy: Vec<bool>,
    /// Close price on rows where `buy` holds.
    pub buy_price: Column,
}

impl AnalyzedSeries {
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<SignalRow> {
        let candle = self.candles.get(index)?;
        let at = |column: &Column| column.get(index).copied().flatten();
        Some(SignalRow {
            timestamp: candle.timestamp,
            close: candle.close,
            sar: at(&self.indicators.sar),
            stochrsi: at(&self.indicators.stochrsi),
            macd: at(&self.indicators.macd),
            macds: at(&self.indicators.macds),
        })
    }

    pub fn latest(&self) -> Option<SignalRow> {
        self.row(self.candles.len().checked_sub(1)?)
    }
}

/// Compute every indicator column over `candles`.
pub fn populate_indicators(candles: Vec<Candle>, params: &IndicatorParams) -> AnalyzedSeries {
    let close = closes(&candles);

    let macd = calculate_macd(&close, params.macd_fast, params.macd_slow, params.macd_signal);
    let indicators = IndicatorColumns {
        ema_fast: ema_column(&close, params.ema_fast),
        ema_slow: ema_column(&close, params.ema_slow),
        sar: sar_column(&candles, params.sar_step, params.sar_max),
        stochrsi: stoch_rsi_column(
            &close,
            params.rsi_period,
            params.stoch_fastk,
            params.stoch_fastd,
        ),
        macd: macd.macd,
        macds: macd.signal,
        macdh: macd.histogram,
    };

    let defined: Vec<(&str, usize)> = indicators
        .iter()
        .map(|(name, column)| (name, column.iter().flatten().count()))
        .collect();
    debug!(candles = candles.len(), ?defined, "indicators populated");

    let len = candles.len();
    AnalyzedSeries {
        candles,
        indicators,
        buy: vec![false; len],
        buy_price: vec![None; len],
    }
}

/// Evaluate the buy predicate on every row and fill `buy` / `buy_price`.
pub fn populate_buy_trend(series: &mut AnalyzedSeries, stochrsi_buy_below: f64) {
    let len = series.len();
    let mut buy = Vec::with_capacity(len);
    let mut buy_price = Vec::with_capacity(len);

    for index in 0..len {
        let hit = series
            .row(index)
            .is_some_and(|row| buy_predicate(&row, stochrsi_buy_below));
        buy.push(hit);
        buy_price.push(hit.then(|| series.candles[index].close));
    }

    series.buy = buy;
    series.buy_price = buy_price;
}

/// Indicators plus buy trend in one go.
pub fn analyze(
    candles: Vec<Candle>,
    params: &IndicatorParams,
    stochrsi_buy_below: f64,
) -> AnalyzedSeries {
    let mut series = populate_indicators(candles, params);
    populate_buy_trend(&mut series, stochrsi_buy_below);
    series
}
