// =============================================================================
// Parabolic SAR (Stop And Reverse)
// =============================================================================
//
// Trailing stop that accelerates towards price while a trend persists and
// flips to the other side of price on a reversal.
//
//   SAR_{t+1} = SAR_t + AF * (EP - SAR_t)
//
// EP is the extreme point of the current trend (highest high when long,
// lowest low when short). AF starts at `step` and grows by `step` every time
// a new EP is made, capped at `max`. In a long trend SAR may never rise above
// the previous or current low (mirrored for short trends). When price pierces
// SAR the trend reverses, SAR jumps to the old EP and AF resets.
//
// The first bar only seeds the state; the initial direction is short when the
// second bar shows a dominant down move (-DM) and long otherwise.
// =============================================================================

use super::{align, Column};
use crate::market_data::Candle;

/// Compute the SAR series for `candles` (oldest first).
///
/// The returned vector starts at candle index 1. Empty when fewer than two
/// candles are supplied or when `step` / `max` are not positive.
pub fn calculate_sar(candles: &[Candle], step: f64, max: f64) -> Vec<f64> {
    if candles.len() < 2 || step <= 0.0 || max <= 0.0 {
        return Vec::new();
    }

    let mut af = step.min(max);

    // Initial direction from the directional movement of bar 1 vs bar 0.
    let up_move = candles[1].high - candles[0].high;
    let down_move = candles[0].low - candles[1].low;
    let mut is_long = !(down_move > 0.0 && up_move < down_move);

    let (mut ep, mut sar) = if is_long {
        (candles[1].high, candles[0].low)
    } else {
        (candles[1].low, candles[0].high)
    };

    let mut new_low = candles[1].low;
    let mut new_high = candles[1].high;

    let mut result = Vec::with_capacity(candles.len() - 1);

    for candle in &candles[1..] {
        let prev_low = new_low;
        let prev_high = new_high;
        new_low = candle.low;
        new_high = candle.high;

        let output;
        if is_long {
            if new_low <= sar {
                // Reverse to short.
                is_long = false;
                sar = ep.max(prev_high).max(new_high);
                output = sar;

                af = step.min(max);
                ep = new_low;
                sar = (sar + af * (ep - sar)).max(prev_high).max(new_high);
            } else {
                output = sar;
                if new_high > ep {
                    ep = new_high;
                    af = (af + step).min(max);
                }
                sar = (sar + af * (ep - sar)).min(prev_low).min(new_low);
            }
        } else if new_high >= sar {
            // Reverse to long.
            is_long = true;
            sar = ep.min(prev_low).min(new_low);
            output = sar;

            af = step.min(max);
            ep = new_high;
            sar = (sar + af * (ep - sar)).min(prev_low).min(new_low);
        } else {
            output = sar;
            if new_low < ep {
                ep = new_low;
                af = (af + step).min(max);
            }
            sar = (sar + af * (ep - sar)).max(prev_high).max(new_high);
        }

        if !output.is_finite() {
            break;
        }
        result.push(output);
    }

    result
}

/// SAR aligned 1:1 with `candles`; position 0 is `None`.
pub fn sar_column(candles: &[Candle], step: f64, max: f64) -> Column {
    align(calculate_sar(candles, step, max), 1, candles.len())
}
