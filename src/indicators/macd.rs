// =============================================================================
// Moving Average Convergence / Divergence (MACD)
// =============================================================================
//
//   MACD      = EMA(close, fast) - EMA(close, slow)
//   Signal    = EMA(MACD, signal)
//   Histogram = MACD - Signal
//
// Defaults are the conventional 12 / 26 / 9. The MACD line is computable from
// index `slow - 1` but, like TA-Lib, all three lines are only reported from
// `slow + signal - 2` (33 with the defaults).
// =============================================================================

use super::ema::calculate_ema;
use super::{align, Column};

/// The three MACD lines, each aligned 1:1 with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdColumns {
    pub macd: Column,
    pub signal: Column,
    pub histogram: Column,
}

/// Compute MACD, signal and histogram for `closes`.
///
/// Requires `0 < fast < slow` and `signal > 0`; anything else yields columns
/// that are entirely `None`.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdColumns {
    let len = closes.len();
    let empty = || MacdColumns {
        macd: vec![None; len],
        signal: vec![None; len],
        histogram: vec![None; len],
    };

    if fast == 0 || signal == 0 || fast >= slow {
        return empty();
    }

    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);
    if slow_ema.is_empty() {
        return empty();
    }

    // fast_ema[0] belongs to index fast-1, slow_ema[0] to slow-1.
    let skip = slow - fast;
    let macd_line: Vec<f64> = fast_ema
        .iter()
        .skip(skip)
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    let signal_line = calculate_ema(&macd_line, signal);
    let histogram: Vec<f64> = macd_line
        .iter()
        .skip(signal - 1)
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    // All three lines start together, once the signal has warmed up.
    let offset = slow + signal - 2;
    let shown: Vec<f64> = macd_line
        .iter()
        .skip(signal - 1)
        .take(signal_line.len())
        .copied()
        .collect();

    MacdColumns {
        macd: align(shown, offset, len),
        signal: align(signal_line, offset, len),
        histogram: align(histogram, offset, len),
    }
}
