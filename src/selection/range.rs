//! Range expression parsing.
//!
//! Turns operator input such as `20-50` into the set of 0-based row indices it
//! names. The parser only looks at the dataset length, never at row content, so the
//! same expression always yields the same set for the same length.

use std::collections::BTreeSet;
use std::fmt;

/// Separator between the start and end of a range.
pub const RANGE_SEPARATOR: char = '-';

/// Why a range expression was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Nothing but whitespace was entered
    EmptyExpression,
    /// The part before the separator is not a positive integer
    InvalidStart,
    /// The part after the separator is not an integer, or ends before the start
    InvalidEnd,
    /// A single row number is not an integer or lies outside the dataset
    InvalidRow,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyExpression => write!(f, "Please enter a row range"),
            Self::InvalidStart => write!(f, "Invalid start row number"),
            Self::InvalidEnd => write!(f, "Invalid end row number"),
            Self::InvalidRow => write!(f, "Invalid row number"),
        }
    }
}

impl std::error::Error for RangeError {}

/// Parse a 1-based range expression into 0-based row indices.
///
/// An end past the dataset is clamped silently, while a single row past the
/// dataset is rejected. `N-` with `N` past the end yields an empty set.
///
/// ```
/// use sms_format::selection::parse_range;
///
/// let rows = parse_range("3-5", 4)?;
/// assert_eq!(rows.into_iter().collect::<Vec<_>>(), vec![2, 3]);
/// # Ok::<(), sms_format::selection::RangeError>(())
/// ```
///
/// # Errors
///
/// Returns a [`RangeError`] naming the part of the expression that is invalid.
pub fn parse_range(expr: &str, dataset_len: usize) -> Result<BTreeSet<usize>, RangeError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(RangeError::EmptyExpression);
    }

    let Some((start, end)) = trimmed.split_once(RANGE_SEPARATOR) else {
        let row = parse_row_number(trimmed).ok_or(RangeError::InvalidRow)?;
        if row > dataset_len {
            return Err(RangeError::InvalidRow);
        }
        return Ok(BTreeSet::from([row - 1]));
    };

    let start = parse_row_number(start).ok_or(RangeError::InvalidStart)?;
    let end = end.trim();

    let last = if end.is_empty() {
        dataset_len
    } else {
        let end = parse_row_number(end).ok_or(RangeError::InvalidEnd)?;
        if end < start {
            return Err(RangeError::InvalidEnd);
        }
        end.min(dataset_len)
    };

    Ok((start - 1..last).collect())
}

/// A 1-based row number; zero, negatives and non-digits are rejected.
fn parse_row_number(part: &str) -> Option<usize> {
    part.trim().parse::<usize>().ok().filter(|n| *n >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(expr: &str, len: usize) -> Vec<usize> {
        parse_range(expr, len)
            .expect("expression should parse")
            .into_iter()
            .collect()
    }

    #[test]
    fn test_single_row_within_dataset() {
        for n in 1..=10 {
            assert_eq!(rows(&n.to_string(), 10), vec![n - 1]);
        }
    }

    #[test]
    fn test_single_row_out_of_bounds() {
        assert_eq!(parse_range("11", 10), Err(RangeError::InvalidRow));
        assert_eq!(parse_range("0", 10), Err(RangeError::InvalidRow));
        assert_eq!(parse_range("1", 0), Err(RangeError::InvalidRow));
    }

    #[test]
    fn test_closed_range_is_inclusive() {
        assert_eq!(rows("20-50", 100), (19..50).collect::<Vec<_>>());
        assert_eq!(rows("20-50", 100).len(), 31);
        assert_eq!(rows("7-7", 10), vec![6]);
    }

    #[test]
    fn test_closed_range_end_is_clamped() {
        assert_eq!(rows("8-500", 10), vec![7, 8, 9]);
        assert!(rows("11-20", 10).is_empty());
    }

    #[test]
    fn test_open_range_runs_to_end() {
        assert_eq!(rows("48-", 50), vec![47, 48, 49]);
        assert_eq!(rows("1-", 3), vec![0, 1, 2]);
    }

    #[test]
    fn test_open_range_past_end_is_empty() {
        assert!(rows("60-", 50).is_empty());
        assert!(rows("51-", 50).is_empty());
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(rows("  3 ", 5), vec![2]);
        assert_eq!(rows(" 2 - 4 ", 5), vec![1, 2, 3]);
        assert_eq!(rows("4 -", 5), vec![3, 4]);
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(parse_range("", 5), Err(RangeError::EmptyExpression));
        assert_eq!(parse_range("   ", 5), Err(RangeError::EmptyExpression));
    }

    #[test]
    fn test_invalid_start() {
        assert_eq!(parse_range("abc-5", 10), Err(RangeError::InvalidStart));
        assert_eq!(parse_range("0-5", 10), Err(RangeError::InvalidStart));
        assert_eq!(parse_range("-5", 10), Err(RangeError::InvalidStart));
        assert_eq!(parse_range("-", 10), Err(RangeError::InvalidStart));
    }

    #[test]
    fn test_invalid_end() {
        assert_eq!(parse_range("5-3", 10), Err(RangeError::InvalidEnd));
        assert_eq!(parse_range("5-x", 10), Err(RangeError::InvalidEnd));
        assert_eq!(parse_range("1-2-3", 10), Err(RangeError::InvalidEnd));
    }

    #[test]
    fn test_non_numeric_single_row() {
        assert_eq!(parse_range("abc", 10), Err(RangeError::InvalidRow));
        assert_eq!(parse_range("2.5", 10), Err(RangeError::InvalidRow));
    }
}
