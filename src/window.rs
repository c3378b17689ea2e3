//! Windowing and bucketing
//!
//! This module selects the records that fall inside an aggregation window and
//! groups them into calendar buckets:
//! - Trailing week: seven day buckets, zero-filled
//! - Current month: four week-of-month buckets, the last absorbing days 29-31
//!
//! Windows have a lower bound only. A record dated after the reference instant
//! still qualifies; it just has no day bucket to land in. The same holds for
//! the cutoff day itself when the reference instant is exactly midnight.

use crate::aggregator::mean_pain;
use crate::error::ComputeError;
use crate::extractor::FieldExtractor;
use crate::types::{DayBucket, RawRecord, WeekBucket};
use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeSet;

/// Length of the trailing weekly window
pub const WEEK_LENGTH_DAYS: u32 = 7;

/// Highest week-of-month bucket; later days fold into it
pub const MAX_WEEK_OF_MONTH: u32 = 4;

/// A bounded-below time range over which one aggregation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Earliest qualifying instant (inclusive)
    pub cutoff: NaiveDateTime,
    /// First calendar day of the window
    pub first_day: NaiveDate,
    /// Last calendar day of the window
    pub last_day: NaiveDate,
    /// Consistency denominator: 7, or the number of days in the month
    pub length_days: u32,
}

impl Window {
    /// Trailing seven days ending at `now`.
    ///
    /// The day buckets run from six days before `now`'s date through that
    /// date. When `now` is exactly midnight the cutoff day itself qualifies
    /// but has no bucket.
    pub fn trailing_week(now: NaiveDateTime) -> Result<Self, ComputeError> {
        let cutoff = now
            .checked_sub_signed(Duration::days(i64::from(WEEK_LENGTH_DAYS)))
            .ok_or_else(|| {
                ComputeError::WindowArithmetic(format!("{now} minus {WEEK_LENGTH_DAYS} days"))
            })?;

        let last_day = now.date();
        let first_day = last_day
            .checked_sub_days(Days::new(u64::from(WEEK_LENGTH_DAYS - 1)))
            .ok_or_else(|| {
                ComputeError::WindowArithmetic(format!("{last_day} minus six days"))
            })?;

        Ok(Self {
            cutoff,
            first_day,
            last_day,
            length_days: WEEK_LENGTH_DAYS,
        })
    }

    /// Current calendar month, from its first day
    pub fn month_to_date(now: NaiveDateTime) -> Result<Self, ComputeError> {
        let first_day = now
            .date()
            .with_day(1)
            .ok_or_else(|| ComputeError::WindowArithmetic(format!("first of month for {now}")))?;
        let length_days = days_in_month(first_day)?;
        let last_day = add_days(first_day, length_days - 1)?;

        Ok(Self {
            cutoff: first_day.and_time(NaiveTime::MIN),
            first_day,
            last_day,
            length_days,
        })
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.cutoff
    }
}

/// Number of days in the month starting at `month_start`
pub fn days_in_month(month_start: NaiveDate) -> Result<u32, ComputeError> {
    let (year, month) = if month_start.month() == 12 {
        (month_start.year() + 1, 1)
    } else {
        (month_start.year(), month_start.month() + 1)
    };

    let next_month = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ComputeError::WindowArithmetic(format!("month after {month_start}"))
    })?;

    Ok(next_month.signed_duration_since(month_start).num_days() as u32)
}

/// 1-based week of the month, clamped to [`MAX_WEEK_OF_MONTH`]
pub fn week_of_month(date: NaiveDate, month_start: NaiveDate) -> u32 {
    let offset = date.signed_duration_since(month_start).num_days().max(0);
    (offset / 7 + 1).min(i64::from(MAX_WEEK_OF_MONTH)) as u32
}

/// A record that qualified for a window, reduced to what aggregation reads
#[derive(Debug, Clone, PartialEq)]
pub struct WindowEntry {
    pub date: NaiveDate,
    pub pain_level: Option<f64>,
    pub drug: Option<String>,
}

/// Extract every record and keep those dated inside the window.
///
/// Records without a resolvable date never qualify.
pub fn select(records: &[RawRecord], window: &Window) -> Vec<WindowEntry> {
    records
        .iter()
        .map(FieldExtractor::extract)
        .filter_map(|fields| {
            let date = fields.date?;
            window.contains(date).then(|| WindowEntry {
                date: date.date(),
                pain_level: fields.pain_level,
                drug: fields.drug,
            })
        })
        .collect()
}

/// One bucket per window day, oldest first, empty days included
pub fn bucket_by_day(entries: &[WindowEntry], window: &Window) -> Vec<DayBucket> {
    window
        .first_day
        .iter_days()
        .take_while(|day| *day <= window.last_day)
        .map(|day| {
            let on_day: Vec<&WindowEntry> = entries.iter().filter(|e| e.date == day).collect();
            let pain_levels: Vec<f64> = on_day.iter().filter_map(|e| e.pain_level).collect();
            let count = on_day.len() as u32;

            DayBucket {
                date: day,
                day: day.format("%a").to_string(),
                count,
                has_headache: count > 0,
                drug_count: on_day.iter().filter(|e| e.drug.is_some()).count() as u32,
                avg_pain: mean_pain(&pain_levels),
                pain_levels,
            }
        })
        .collect()
}

/// Buckets for weeks 1-4 of the month starting at `month_start`
pub fn bucket_by_week(entries: &[WindowEntry], month_start: NaiveDate) -> Vec<WeekBucket> {
    (1..=MAX_WEEK_OF_MONTH)
        .map(|week| {
            let in_week: Vec<&WindowEntry> = entries
                .iter()
                .filter(|e| week_of_month(e.date, month_start) == week)
                .collect();
            let days: BTreeSet<NaiveDate> = in_week.iter().map(|e| e.date).collect();
            let pain_levels: Vec<f64> = in_week.iter().filter_map(|e| e.pain_level).collect();

            WeekBucket {
                week,
                label: format!("Week {week}"),
                count: in_week.len() as u32,
                headache_days: days.len() as u32,
                drug_count: in_week.iter().filter(|e| e.drug.is_some()).count() as u32,
                avg_pain: mean_pain(&pain_levels),
            }
        })
        .collect()
}

fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate, ComputeError> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| ComputeError::WindowArithmetic(format!("{date} plus {days} days")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(d: NaiveDate, pain: Option<f64>, drug: Option<&str>) -> WindowEntry {
        WindowEntry {
            date: d,
            pain_level: pain,
            drug: drug.map(str::to_string),
        }
    }

    #[test]
    fn test_trailing_week_bounds() {
        let window = Window::trailing_week(at(2025, 11, 12, 15)).unwrap();
        assert_eq!(window.cutoff, at(2025, 11, 5, 15));
        assert_eq!(window.first_day, date(2025, 11, 6));
        assert_eq!(window.last_day, date(2025, 11, 12));
        assert_eq!(window.length_days, 7);
    }

    #[test]
    fn test_trailing_week_at_midnight_ends_on_today() {
        let window = Window::trailing_week(at(2025, 11, 12, 0)).unwrap();
        assert_eq!(window.first_day, date(2025, 11, 6));
        assert_eq!(window.last_day, date(2025, 11, 12));
        assert!(window.contains(at(2025, 11, 12, 0)));
        assert!(window.contains(at(2025, 11, 5, 0)));
        assert!(!window.contains(at(2025, 11, 4, 0)));

        let records: Vec<RawRecord> = vec![[("Date", "11/12/2025"), ("Pain", "5")]
            .into_iter()
            .collect()];
        let entries = select(&records, &window);
        let buckets = bucket_by_day(&entries, &window);
        let bucket_total: u32 = buckets.iter().map(|b| b.count).sum();
        assert_eq!(bucket_total, entries.len() as u32);
        assert_eq!(buckets[6].count, 1);
    }

    #[test]
    fn test_window_has_no_upper_bound() {
        let window = Window::trailing_week(at(2025, 11, 12, 15)).unwrap();
        assert!(window.contains(at(2026, 1, 1, 0)));
    }

    #[test]
    fn test_week_arithmetic_overflow_is_an_error() {
        let result = Window::trailing_week(NaiveDateTime::MIN);
        assert!(matches!(result, Err(ComputeError::WindowArithmetic(_))));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date(2025, 1, 1)).unwrap(), 31);
        assert_eq!(days_in_month(date(2025, 2, 1)).unwrap(), 28);
        assert_eq!(days_in_month(date(2024, 2, 1)).unwrap(), 29);
        assert_eq!(days_in_month(date(2025, 4, 1)).unwrap(), 30);
        assert_eq!(days_in_month(date(2025, 12, 1)).unwrap(), 31);
    }

    #[test]
    fn test_month_to_date_wraps_december() {
        let window = Window::month_to_date(at(2025, 12, 20, 9)).unwrap();
        assert_eq!(window.first_day, date(2025, 12, 1));
        assert_eq!(window.last_day, date(2025, 12, 31));
        assert_eq!(window.length_days, 31);
    }

    #[test]
    fn test_week_of_month_clamps_to_four() {
        let start = date(2025, 10, 1);
        assert_eq!(week_of_month(date(2025, 10, 1), start), 1);
        assert_eq!(week_of_month(date(2025, 10, 7), start), 1);
        assert_eq!(week_of_month(date(2025, 10, 8), start), 2);
        assert_eq!(week_of_month(date(2025, 10, 22), start), 4);
        assert_eq!(week_of_month(date(2025, 10, 29), start), 4);
        assert_eq!(week_of_month(date(2025, 10, 31), start), 4);
    }

    #[test]
    fn test_select_drops_undated_and_early_records() {
        let records: Vec<RawRecord> = vec![
            [("Date", "11/10/2025"), ("Pain", "4")].into_iter().collect(),
            [("Date", "11/1/2025"), ("Pain", "9")].into_iter().collect(),
            [("Date", "sometime"), ("Pain", "2")].into_iter().collect(),
            [("Pain", "2")].into_iter().collect(),
        ];
        let window = Window::trailing_week(at(2025, 11, 12, 15)).unwrap();
        let entries = select(&records, &window);

        assert_eq!(entries, vec![entry(date(2025, 11, 10), Some(4.0), None)]);
    }

    #[test]
    fn test_day_buckets_zero_filled_and_ordered() {
        let window = Window::trailing_week(at(2025, 11, 12, 15)).unwrap();
        let entries = vec![
            entry(date(2025, 11, 12), Some(8.0), Some("Tylenol")),
            entry(date(2025, 11, 6), Some(3.0), None),
            entry(date(2025, 11, 6), Some(4.0), Some("Ibuprofen")),
        ];
        let buckets = bucket_by_day(&entries, &window);

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, date(2025, 11, 6));
        assert_eq!(buckets[0].day, "Thu");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].drug_count, 1);
        assert_eq!(buckets[0].pain_levels, vec![3.0, 4.0]);
        assert_eq!(buckets[0].avg_pain, 3.5);

        assert_eq!(buckets[3].count, 0);
        assert!(!buckets[3].has_headache);
        assert_eq!(buckets[3].avg_pain, 0.0);

        assert_eq!(buckets[6].date, date(2025, 11, 12));
        assert!(buckets[6].has_headache);
    }

    #[test]
    fn test_week_buckets_count_distinct_days() {
        let start = date(2025, 10, 1);
        let entries = vec![
            entry(date(2025, 10, 2), Some(5.0), None),
            entry(date(2025, 10, 2), Some(7.0), Some("Aspirin")),
            entry(date(2025, 10, 30), None, None),
        ];
        let buckets = bucket_by_week(&entries, start);

        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].label, "Week 1");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].headache_days, 1);
        assert_eq!(buckets[0].drug_count, 1);
        assert_eq!(buckets[0].avg_pain, 6.0);
        assert_eq!(buckets[1].count, 0);
        assert_eq!(buckets[3].count, 1);
        assert_eq!(buckets[3].avg_pain, 0.0);
    }
}
