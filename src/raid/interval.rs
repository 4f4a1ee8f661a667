//! Lookup of reporting intervals.

use chrono::NaiveDateTime;

use crate::database::RaidsInterval;

/// The most recent interval containing `date`, then `offset` intervals back
/// in primary-key order.
///
/// "Most recent" means the latest `start_date` (ties broken by id). Returns
/// `None` if no interval contains `date` or the walk runs past the first one.
pub fn interval_by_date(
    intervals: &[RaidsInterval],
    date: NaiveDateTime,
    offset: usize,
) -> Option<&RaidsInterval> {
    let current = intervals
        .iter()
        .filter(|i| i.contains(date))
        .max_by_key(|i| (i.start_date, i.id))?;

    let mut by_id: Vec<&RaidsInterval> = intervals.iter().collect();
    by_id.sort_by_key(|i| i.id);

    let position = by_id.iter().position(|i| i.id == current.id)?;
    position.checked_sub(offset).map(|idx| by_id[idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn interval(id: i64, start: u32, last: u32) -> RaidsInterval {
        RaidsInterval {
            id,
            start_date: day(start),
            last_date: day(last),
        }
    }

    fn sample() -> Vec<RaidsInterval> {
        // Deliberately unsorted.
        vec![interval(3, 15, 21), interval(1, 1, 7), interval(2, 8, 14)]
    }

    #[test]
    fn finds_containing_interval() {
        let intervals = sample();
        assert_eq!(interval_by_date(&intervals, day(10), 0).map(|i| i.id), Some(2));
        assert_eq!(interval_by_date(&intervals, day(21), 0).map(|i| i.id), Some(3));
    }

    #[test]
    fn walks_back_by_id() {
        let intervals = sample();
        assert_eq!(interval_by_date(&intervals, day(16), 1).map(|i| i.id), Some(2));
        assert_eq!(interval_by_date(&intervals, day(16), 2).map(|i| i.id), Some(1));
        assert!(interval_by_date(&intervals, day(16), 3).is_none());
    }

    #[test]
    fn prefers_latest_start_when_overlapping() {
        let intervals = vec![interval(1, 1, 20), interval(2, 10, 30)];
        assert_eq!(interval_by_date(&intervals, day(12), 0).map(|i| i.id), Some(2));
        assert_eq!(interval_by_date(&intervals, day(12), 1).map(|i| i.id), Some(1));
    }

    #[test]
    fn none_outside_all_intervals() {
        assert!(interval_by_date(&sample(), day(25), 0).is_none());
        assert!(interval_by_date(&[], day(1), 0).is_none());
    }
}
