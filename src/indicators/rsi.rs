// =============================================================================
// Relative Strength Index — Wilder smoothing
// =============================================================================
//
// Input of the stochastic RSI. Averages are seeded with the plain mean of the
// first `period` gains / losses and then smoothed as
//
//   avg = (prev_avg * (period - 1) + current) / period
//
// RSI = 100 - 100 / (1 + avg_gain / avg_loss). The first value lands on close
// index `period`.
// =============================================================================

/// RSI values from close index `period` onwards.
///
/// Empty when `period == 0` or there are fewer than `period + 1` closes. A
/// window without any movement reads 0, as in TA-Lib; a window with gains
/// only reads 100.
/// The series stops at the first non-finite value.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() <= period {
        return Vec::new();
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let (seed, rest) = deltas.split_at(period);

    let mut out = Vec::with_capacity(deltas.len() - period + 1);
    if seed.iter().any(|d| !d.is_finite()) {
        return out;
    }

    let n = period as f64;
    let (mut avg_gain, mut avg_loss) = seed
        .iter()
        .map(|&d| split(d))
        .fold((0.0, 0.0), |(g, l), (gain, loss)| (g + gain, l + loss));
    avg_gain /= n;
    avg_loss /= n;

    let Some(first) = rsi_from_averages(avg_gain, avg_loss) else {
        return out;
    };
    out.push(first);

    for &delta in rest {
        if !delta.is_finite() {
            break;
        }
        let (gain, loss) = split(delta);
        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        match rsi_from_averages(avg_gain, avg_loss) {
            Some(rsi) => out.push(rsi),
            None => break,
        }
    }

    out
}

/// (gain, loss) of one close-to-close move.
fn split(delta: f64) -> (f64, f64) {
    (delta.max(0.0), (-delta).max(0.0))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 0.0,
        (_, true) => 100.0,
        _ => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    };
    rsi.is_finite().then_some(rsi)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wilder's worked example.
    const WILDER: [f64; 20] = [
        44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
        45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
    ];

    #[test]
    fn wilder_reference_values() {
        let rsi = calculate_rsi(&WILDER, 14);
        let expected = [70.4641, 66.2496, 66.4809, 69.3469, 66.2947, 57.9150];
        assert_eq!(rsi.len(), expected.len());
        for (got, want) in rsi.iter().zip(expected) {
            assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
        }
    }

    #[test]
    fn too_little_history() {
        assert!(calculate_rsi(&[], 14).is_empty());
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).is_empty());
        assert!(calculate_rsi(&WILDER[..14], 14).is_empty());
        assert_eq!(calculate_rsi(&WILDER[..15], 14).len(), 1);
    }

    #[test]
    fn one_sided_markets_hit_the_bounds() {
        let up: Vec<f64> = (1..=30).map(f64::from).collect();
        assert!(calculate_rsi(&up, 14).iter().all(|v| *v == 100.0));

        let down: Vec<f64> = up.iter().rev().copied().collect();
        assert!(calculate_rsi(&down, 14).iter().all(|v| v.abs() < 1e-10));
    }

    #[test]
    fn flat_market_reads_zero() {
        assert!(calculate_rsi(&[100.0; 30], 14).iter().all(|v| *v == 0.0));

        // Movement after a flat start lifts RSI off zero.
        let mut closes = vec![100.0; 15];
        closes.push(101.0);
        assert_eq!(calculate_rsi(&closes, 14), vec![0.0, 100.0]);
    }

    #[test]
    fn non_finite_close_truncates() {
        let mut closes = WILDER.to_vec();
        closes[16] = f64::NAN;
        // Index 15 is the last value computed from finite deltas only.
        assert_eq!(calculate_rsi(&closes, 14).len(), 2);
    }
}
