// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the buy signal is
// built from. The `calculate_*` functions return compact series that start at
// the end of the indicator's warm-up window; the `*_column` helpers realign
// them 1:1 with the candle sequence, marking warm-up positions as `None`.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sar;
pub mod stoch_rsi;

/// One indicator value per candle; `None` while the indicator is warming up.
pub type Column = Vec<Option<f64>>;

/// Place a compact series at `offset` inside a column of length `len`.
///
/// Positions before `offset`, and positions past the end of `values` (a
/// series truncated by a non-finite value), are `None`.
pub fn align(values: Vec<f64>, offset: usize, len: usize) -> Column {
    let mut column: Column = Vec::with_capacity(len);
    column.extend(std::iter::repeat(None).take(offset.min(len)));
    column.extend(values.into_iter().map(Some));
    column.resize(len, None);
    column
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_pads_front_and_back() {
        let col = align(vec![1.0, 2.0], 2, 6);
        assert_eq!(col, vec![None, None, Some(1.0), Some(2.0), None, None]);
    }

    #[test]
    fn align_empty_values() {
        assert_eq!(align(Vec::new(), 3, 2), vec![None, None]);
    }

    #[test]
    fn align_never_exceeds_len() {
        let col = align(vec![1.0, 2.0, 3.0], 1, 3);
        assert_eq!(col, vec![None, Some(1.0), Some(2.0)]);
    }
}
