//! calendar.rs
//! Month arithmetic on `NaiveDate`. Every date that enters the engine is
//! normalized to the first day of its month.

use chrono::{Datelike, Months, NaiveDate};

/// Returns the first day of the month containing `date`.
#[inline]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month, so `with_day(1)` cannot fail.
    date.with_day(1).unwrap_or(date)
}

/// Shifts a date by a signed number of calendar months and normalizes the
/// result. Returns `None` if the shift leaves chrono's representable range.
pub fn shift_months(date: NaiveDate, offset: i32) -> Option<NaiveDate> {
    let base = first_of_month(date);
    let delta = Months::new(offset.unsigned_abs());
    if offset >= 0 {
        base.checked_add_months(delta)
    } else {
        base.checked_sub_months(delta)
    }
}

/// Whole months from `start` to `end` (negative if `end` precedes `start`).
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

/// Inclusive, ordered list of month starts between `start` and `end`.
/// Empty when `end` precedes `start`.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let span = months_between(start, end);
    if span < 0 {
        return Vec::new();
    }
    let first = first_of_month(start);
    (0..=span).filter_map(|i| shift_months(first, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case(d(2024, 3, 31), 0, d(2024, 3, 1))]
    #[case(d(2024, 3, 15), -1, d(2024, 2, 1))]
    #[case(d(2024, 1, 31), -1, d(2023, 12, 1))]
    #[case(d(2023, 11, 2), 3, d(2024, 2, 1))]
    #[case(d(2024, 1, 1), -13, d(2022, 12, 1))]
    fn test_shift_months(
        #[case] input: NaiveDate,
        #[case] offset: i32,
        #[case] expected: NaiveDate,
    ) {
        assert_eq!(shift_months(input, offset), Some(expected));
    }

    #[test]
    fn test_month_range_is_inclusive_and_normalized() {
        let range = month_range(d(2023, 11, 20), d(2024, 2, 3));
        assert_eq!(range, vec![d(2023, 11, 1), d(2023, 12, 1), d(2024, 1, 1), d(2024, 2, 1)]);
        assert_eq!(range.len() as i32, months_between(d(2023, 11, 20), d(2024, 2, 3)) + 1);
    }

    #[test]
    fn test_month_range_reversed_is_empty() {
        assert!(month_range(d(2024, 2, 1), d(2024, 1, 1)).is_empty());
        assert_eq!(months_between(d(2024, 2, 1), d(2024, 1, 1)), -1);
    }
}
