// =============================================================================
// Exponential Moving Average
// =============================================================================
//
//   alpha = 2 / (period + 1)
//   ema_t = ema_{t-1} + alpha * (x_t - ema_{t-1})
//
// Seeded with the simple mean of the first `period` inputs, so the first
// value belongs to input index `period - 1`. Used directly for the price
// EMAs and, over the MACD line, for the MACD signal.
// =============================================================================

use super::{align, Column};

/// EMA of `values` from index `period - 1` onwards.
///
/// Empty when `period == 0`, when there are fewer than `period` inputs or
/// when the seed window holds a non-finite value. Stops at the first
/// non-finite value after that.
pub fn calculate_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let (seed, rest) = values.split_at(period);
    let mut ema = seed.iter().sum::<f64>() / period as f64;
    if !ema.is_finite() {
        return Vec::new();
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(rest.len() + 1);
    out.push(ema);
    for &x in rest {
        ema += alpha * (x - ema);
        if !ema.is_finite() {
            break;
        }
        out.push(ema);
    }
    out
}

/// EMA aligned 1:1 with `closes`.
pub fn ema_column(closes: &[f64], period: usize) -> Column {
    align(calculate_ema(closes, period), period.saturating_sub(1), closes.len())
}
