//! Pure arithmetic behind every calculator RPC.
//!
//! Nothing in here performs I/O or keeps state between calls. The streaming accumulators in
//! [`state_machine`](crate::state_machine) are built from the step functions
//! ([`accumulate_total`], [`mean`], [`raise_maximum`], [`lower_minimum`]); the batch forms
//! ([`average`], [`running_maximum`], [`running_minimum`], [`running_total`]) compute the same
//! results over a complete input.

pub mod error;
pub mod sequence;

pub use self::error::OperationError;
pub use self::sequence::{PerfectNumbers, PrimeFactors, Search, Step, is_perfect};

/// Integer addition. Overflowing `i64` is rejected as an invalid argument.
pub fn sum(a: i64, b: i64) -> Result<i64, OperationError> {
    a.checked_add(b).ok_or_else(|| {
        OperationError::InvalidArgument(format!("{a} + {b} overflows a 64-bit integer"))
    })
}

/// Integer addition, exposed under its own RPC name. Same semantics as [`sum`].
pub fn add(a: i64, b: i64) -> Result<i64, OperationError> {
    sum(a, b)
}

/// Non-negative square root. Negative and NaN inputs are invalid.
pub fn square_root(number: f64) -> Result<f64, OperationError> {
    if number.is_nan() || number < 0.0 {
        return Err(OperationError::InvalidArgument(format!(
            "cannot calculate square root of a negative number: {number}"
        )));
    }

    Ok(number.sqrt())
}

pub fn prime_factors(number: i64) -> PrimeFactors {
    PrimeFactors::new(number)
}

pub fn perfect_numbers_in_range(min: i64, max: i64) -> PerfectNumbers {
    PerfectNumbers::new(min, max)
}

/// Add `number` to a running `total`.
pub fn accumulate_total(total: i64, number: i64) -> Result<i64, OperationError> {
    total.checked_add(number).ok_or_else(|| {
        OperationError::InvalidArgument(format!(
            "running total overflows a 64-bit integer after adding {number}"
        ))
    })
}

/// Arithmetic mean of `count` elements summing to `sum`.
pub fn mean(sum: i128, count: u64) -> Result<f64, OperationError> {
    if count == 0 {
        return Err(OperationError::DivisionByZero(
            "cannot average an empty stream".to_string(),
        ));
    }

    Ok(sum as f64 / count as f64)
}

/// Returns the new maximum if `candidate` is strictly greater than `current`.
///
/// An unset `current` behaves as negative infinity, so the first candidate always raises it.
pub fn raise_maximum(current: Option<i64>, candidate: i64) -> Option<i64> {
    current
        .is_none_or(|maximum| candidate > maximum)
        .then_some(candidate)
}

/// The minimum of `current` and `candidate`; an unset `current` yields `candidate`.
pub fn lower_minimum(current: Option<i64>, candidate: i64) -> i64 {
    current.map_or(candidate, |minimum| minimum.min(candidate))
}

pub fn average(numbers: impl IntoIterator<Item = i64>) -> Result<f64, OperationError> {
    let (sum, count) = numbers
        .into_iter()
        .fold((0i128, 0u64), |(sum, count), n| (sum + i128::from(n), count + 1));
    mean(sum, count)
}

/// Every strict increase of the maximum, in input order.
pub fn running_maximum(numbers: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut maximum = None;
    numbers
        .into_iter()
        .filter_map(|n| {
            let raised = raise_maximum(maximum, n);
            if raised.is_some() {
                maximum = raised;
            }
            raised
        })
        .collect()
}

/// The minimum observed so far, once per input element.
pub fn running_minimum(numbers: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut minimum = None;
    numbers
        .into_iter()
        .map(|n| {
            let lowered = lower_minimum(minimum, n);
            minimum = Some(lowered);
            lowered
        })
        .collect()
}

pub fn running_total(numbers: impl IntoIterator<Item = i64>) -> Result<i64, OperationError> {
    numbers.into_iter().try_fold(0, accumulate_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [i64; 7] = [2, 6, 1, 9, 2, 8, 5];

    #[test]
    fn test_sum_and_add_agree() {
        for a in [0, 1, 10, 30, 1_000_000] {
            for b in [0, 2, 20, 40, 7_777_777] {
                assert_eq!(sum(a, b), Ok(a + b));
                assert_eq!(add(a, b), sum(a, b));
            }
        }
    }

    #[test]
    fn test_sum_overflow_is_invalid_argument() {
        let result = sum(i64::MAX, 1);
        assert!(matches!(result, Err(OperationError::InvalidArgument(_))));
    }

    #[test]
    fn test_square_root() {
        assert_eq!(square_root(25.0), Ok(5.0));
        assert_eq!(square_root(0.0), Ok(0.0));
        assert!(matches!(
            square_root(-1.0),
            Err(OperationError::InvalidArgument(_))
        ));
        assert!(matches!(
            square_root(f64::NAN),
            Err(OperationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_average() {
        let result = average(SAMPLE).unwrap();
        assert!((result - 33.0 / 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_of_empty_stream() {
        assert!(matches!(
            average([]),
            Err(OperationError::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_running_maximum() {
        assert_eq!(running_maximum(SAMPLE), vec![2, 6, 9]);
    }

    #[test]
    fn test_running_maximum_all_negative() {
        assert_eq!(running_maximum([-5, -7, -3, -3, -9]), vec![-5, -3]);
    }

    #[test]
    fn test_running_minimum() {
        assert_eq!(running_minimum(SAMPLE), vec![2, 2, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_running_total() {
        assert_eq!(running_total(SAMPLE), Ok(33));
        assert_eq!(running_total([]), Ok(0));
    }

    #[test]
    fn test_running_total_overflow() {
        assert!(matches!(
            running_total([i64::MAX, 1]),
            Err(OperationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_raise_maximum_requires_strict_increase() {
        assert_eq!(raise_maximum(None, -100), Some(-100));
        assert_eq!(raise_maximum(Some(4), 4), None);
        assert_eq!(raise_maximum(Some(4), 5), Some(5));
    }
}
