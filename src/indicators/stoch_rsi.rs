// =============================================================================
// Stochastic RSI (fast)
// =============================================================================
//
// Applies the fast stochastic oscillator to the RSI series instead of price:
//
//   %K_t = 100 * (RSI_t - min(RSI, k)) / (max(RSI, k) - min(RSI, k))
//   %D_t = SMA(%K, d)
//
// A window where RSI did not move at all (max == min) yields %K = 0.
// Only the smoothed fast %D line is returned, on a 0..100 scale.
//
// Warm-up: RSI needs `rsi_period` closes, %K another `k - 1` RSI values, %D
// another `d - 1` %K values. With 14/5/3 the first value lands on index 20.
// =============================================================================

use super::rsi::calculate_rsi;
use super::{align, Column};

/// Number of leading closes with no StochRSI value.
pub fn warmup(rsi_period: usize, fastk_period: usize, fastd_period: usize) -> usize {
    rsi_period + fastk_period.saturating_sub(1) + fastd_period.saturating_sub(1)
}

/// Fast %D of the stochastic RSI, compact (first value belongs to close index
/// [`warmup`]). Empty when any period is zero or the input is too short.
pub fn calculate_stoch_rsi(
    closes: &[f64],
    rsi_period: usize,
    fastk_period: usize,
    fastd_period: usize,
) -> Vec<f64> {
    if rsi_period == 0 || fastk_period == 0 || fastd_period == 0 {
        return Vec::new();
    }

    let rsi = calculate_rsi(closes, rsi_period);
    if rsi.len() < fastk_period {
        return Vec::new();
    }

    let fast_k: Vec<f64> = rsi
        .windows(fastk_period)
        .map(|window| {
            let lowest = window.iter().copied().fold(f64::INFINITY, f64::min);
            let highest = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let current = window[window.len() - 1];
            let range = highest - lowest;
            if range > 0.0 {
                (100.0 * (current - lowest) / range).clamp(0.0, 100.0)
            } else {
                0.0
            }
        })
        .collect();

    if fast_k.len() < fastd_period {
        return Vec::new();
    }

    fast_k
        .windows(fastd_period)
        .map(|window| {
            let mean = window.iter().sum::<f64>() / fastd_period as f64;
            mean.clamp(0.0, 100.0)
        })
        .collect()
}

/// StochRSI %D aligned 1:1 with `closes`.
pub fn stoch_rsi_column(
    closes: &[f64],
    rsi_period: usize,
    fastk_period: usize,
    fastd_period: usize,
) -> Column {
    align(
        calculate_stoch_rsi(closes, rsi_period, fastk_period, fastd_period),
        warmup(rsi_period, fastk_period, fastd_period),
        closes.len(),
    )
}
