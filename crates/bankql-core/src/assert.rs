//! Assertion helpers for scenario tests.
//!
//! Monetary values computed by the database (`AVG`, `SUM` over divisions)
//! often carry more fractional digits than the hand-written expectation, so
//! decimals are compared within a precision rather than exactly.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::row::QueryResult;

/// Parse a decimal literal.
///
/// # Panics
///
/// Panics if `literal` is not a valid decimal. Intended for test literals.
#[track_caller]
pub fn dec(literal: &str) -> Decimal {
    match Decimal::from_str(literal) {
        Ok(value) => value,
        Err(e) => panic!("invalid decimal literal {literal:?}: {e}"),
    }
}

/// `|actual - expected| < precision`.
pub fn approx_eq(actual: Decimal, expected: Decimal, precision: Decimal) -> bool {
    (actual - expected).abs() < precision
}

/// Assert that two decimals agree within `precision`.
#[track_caller]
pub fn assert_decimal_eq(actual: Decimal, expected: Decimal, precision: Decimal) {
    assert!(
        approx_eq(actual, expected, precision),
        "decimal mismatch: actual {actual}, expected {expected}, difference {} is not below {precision}",
        (actual - expected).abs(),
    );
}

/// Assert the exact number of rows in a result.
#[track_caller]
pub fn assert_row_count(result: &QueryResult, expected: usize) {
    assert_eq!(
        result.len(),
        expected,
        "expected {expected} rows, got {} (columns: {:?})",
        result.len(),
        result.columns(),
    );
}

/// Assert that every name in `expected` is a result column, in any order.
#[track_caller]
pub fn assert_columns_contain(result: &QueryResult, expected: &[&str]) {
    let missing: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|name| !result.has_column(name))
        .collect();
    assert!(
        missing.is_empty(),
        "missing columns {missing:?}; result has {:?}",
        result.columns(),
    );
}

/// Assert that `actual` holds exactly the values of `expected`, in any
/// order and without repeats.
#[track_caller]
pub fn assert_same_set<T, I>(actual: I, expected: &[T])
where
    T: Ord + Debug,
    I: IntoIterator<Item = T>,
{
    let actual: Vec<T> = actual.into_iter().collect();
    let count = actual.len();
    let actual: BTreeSet<T> = actual.into_iter().collect();
    assert_eq!(actual.len(), count, "repeated values in {actual:?}");

    let expected: BTreeSet<&T> = expected.iter().collect();
    let actual: BTreeSet<&T> = actual.iter().collect();
    assert_eq!(actual, expected, "value sets differ");
}
