use std::ops::RangeInclusive;

/// Outcome of examining one candidate of a [`Search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<T> {
    Found(T),
    /// The candidate was rejected; the search has more to examine.
    Skipped,
    Exhausted,
}

/// A sequence computed one candidate at a time.
///
/// Examining a single candidate is cheap and bounded, while the gap between two items can be
/// arbitrarily long. Callers that must stay responsive (to cancellation, for instance) step the
/// search themselves instead of iterating.
pub trait Search {
    type Item;

    fn step(&mut self) -> Step<Self::Item>;
}

/// Lazy ascending sequence of the prime factors of a number, one item per multiplicity.
///
/// Candidate divisors start at 2 and advance by one without any primality check. A candidate is
/// only advanced once it no longer divides the remainder, so every yielded divisor is prime.
#[derive(Debug, Clone)]
pub struct PrimeFactors {
    remaining: i64,
    divisor: i64,
}

impl PrimeFactors {
    pub fn new(number: i64) -> Self {
        Self {
            remaining: number,
            divisor: 2,
        }
    }
}

impl Search for PrimeFactors {
    type Item = i64;

    fn step(&mut self) -> Step<i64> {
        if self.remaining <= 1 {
            return Step::Exhausted;
        }
        if self.remaining % self.divisor == 0 {
            self.remaining /= self.divisor;
            return Step::Found(self.divisor);
        }
        self.divisor += 1;
        Step::Skipped
    }
}

impl Iterator for PrimeFactors {
    type Item = i64;

    fn next(&mut self) -> Option<Self::Item> {
        next_found(self)
    }
}

/// Lazy ascending sequence of the perfect numbers inside an inclusive range.
#[derive(Debug, Clone)]
pub struct PerfectNumbers {
    candidates: RangeInclusive<i64>,
}

impl PerfectNumbers {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            candidates: min..=max,
        }
    }
}

impl Search for PerfectNumbers {
    type Item = i64;

    fn step(&mut self) -> Step<i64> {
        match self.candidates.next() {
            Some(candidate) if is_perfect(candidate) => Step::Found(candidate),
            Some(_) => Step::Skipped,
            None => Step::Exhausted,
        }
    }
}

impl Iterator for PerfectNumbers {
    type Item = i64;

    fn next(&mut self) -> Option<Self::Item> {
        next_found(self)
    }
}

fn next_found<S: Search>(search: &mut S) -> Option<S::Item> {
    loop {
        match search.step() {
            Step::Found(item) => return Some(item),
            Step::Skipped => {}
            Step::Exhausted => return None,
        }
    }
}

/// Returns `true` when the proper divisors of `number` sum to `number`.
///
/// Zero and negative numbers are never perfect.
pub fn is_perfect(number: i64) -> bool {
    if number < 2 {
        return false;
    }

    let divisor_sum: i128 = (1..number)
        .filter(|divisor| number % divisor == 0)
        .map(i128::from)
        .sum();

    divisor_sum == i128::from(number)
}
