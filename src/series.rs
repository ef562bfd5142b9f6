// Cumulative-to-delta conversion and the explicit "latest vs yesterday" row
// selection used by day-keyed series.

use crate::error::{Error, Result};

/// Convert an ascending cumulative sequence into per-period deltas.
/// `out[0]` is 0: there is no prior point to diff against.
pub fn daily_deltas(values: &[i64]) -> Vec<i64> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| if i == 0 { 0 } else { v - values[i - 1] })
        .collect()
}

/// A cumulative source that decreases is corrupt input, not a zero-change
/// day. Must be checked before `daily_deltas` on any relative metric.
pub fn ensure_monotonic(values: &[i64]) -> Result<()> {
    for w in values.windows(2) {
        if w[1] < w[0] {
            return Err(Error::DataIntegrity(format!(
                "cumulative counter decreased: {} -> {}",
                w[0], w[1]
            )));
        }
    }
    Ok(())
}

/// Last and second-to-last rows of an ascending daily series. The one place
/// that decides what "yesterday" means for day-keyed data.
pub fn latest_pair<T>(rows: &[T]) -> Result<(&T, &T)> {
    match rows {
        [.., prev, last] => Ok((last, prev)),
        _ => Err(Error::InsufficientHistory),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_empty_and_single() {
        assert_eq!(daily_deltas(&[]), Vec::<i64>::new());
        assert_eq!(daily_deltas(&[42]), vec![0]);
    }

    #[test]
    fn deltas_first_is_zero_and_sum_telescopes() {
        let input = vec![100, 150, 150, 230, 500];
        let out = daily_deltas(&input);
        assert_eq!(out.len(), input.len());
        assert_eq!(out[0], 0);
        assert_eq!(out, vec![0, 50, 0, 80, 270]);
        assert_eq!(
            out.iter().sum::<i64>(),
            input[input.len() - 1] - input[0]
        );
    }

    #[test]
    fn monotonic_guard_accepts_flat_and_rising() {
        assert!(ensure_monotonic(&[1, 1, 2, 5]).is_ok());
        assert!(ensure_monotonic(&[]).is_ok());
    }

    #[test]
    fn monotonic_guard_rejects_decrease() {
        let err = ensure_monotonic(&[100, 150, 120]).unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    #[test]
    fn latest_pair_needs_two_rows() {
        assert!(matches!(
            latest_pair::<i64>(&[]),
            Err(Error::InsufficientHistory)
        ));
        assert!(matches!(
            latest_pair(&[1]),
            Err(Error::InsufficientHistory)
        ));
        let (last, prev) = latest_pair(&[1, 2, 3]).unwrap();
        assert_eq!((*last, *prev), (3, 2));
    }
}
